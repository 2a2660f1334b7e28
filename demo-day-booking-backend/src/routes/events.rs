use headers::{CacheControl, ContentType};
use http::{Response, StatusCode};
use http_body_util::{BodyExt as _, StreamBody};

use crate::error::AppError;
use crate::{AppState, ResponseBody, ResponseTypedHeaderExt as _};

/// Tells open pages to reload when rooms or bookings changed.
pub fn events(state: &AppState) -> Result<Response<ResponseBody>, AppError> {
    let stream = state.board.events(state.shutdown.subscribe());
    Ok(Response::builder()
        .status(StatusCode::OK)
        .typed_header(ContentType::from(mime::TEXT_EVENT_STREAM))
        .typed_header(CacheControl::new().with_no_cache())
        .body(StreamBody::new(stream).boxed_unsync())?)
}
