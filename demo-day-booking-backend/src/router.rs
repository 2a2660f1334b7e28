use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::header::LOCATION;
use http::{Method, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt as _, Limited};
use tracing::{debug, info_span, Instrument as _};

use crate::error::AppError;
use crate::routes::events::events;
use crate::routes::index::index;
use crate::routes::{admin, booking};
use crate::session::{ResponseSessionExt as _, Session};
use crate::{empty, AppState, ResponseBody};

/// Forms are tiny, anything bigger is not ours.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Entry point for every request, never fails. Errors are turned into error
/// pages here.
pub async fn handle<B>(
    state: Arc<AppState>,
    request: Request<B>,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let span = info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path()
    );
    async move {
        let mut session = Session::new(&request, &state.key);
        let response = match dispatch(&state, &mut session, request).await {
            Ok(response) => response,
            Err(err) => err.build_error_response(&state.templates, &session, &state.key),
        };
        debug!(status = response.status().as_u16(), "responded");
        Ok(response)
    }
    .instrument(span)
    .await
}

async fn dispatch<B>(
    state: &AppState,
    session: &mut Session,
    request: Request<B>,
) -> Result<Response<ResponseBody>, AppError>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = request.uri().path().to_owned();
    match *request.method() {
        Method::GET => match path.as_str() {
            "/" => index(state, session),
            "/index.css" => state.css.respond(&request),
            "/events" => events(state),
            _ => Err(AppError::NotFound),
        },
        Method::POST => {
            let body = Limited::new(request.into_body(), MAX_BODY_SIZE)
                .collect()
                .await
                .map_err(AppError::Body)?
                .to_bytes();
            match path.as_str() {
                "/room" => booking::select_room(state, session, &body)?,
                "/rooms/back" => booking::back_to_rooms(session, &body)?,
                "/toggle" => booking::toggle(state, session, &body)?,
                "/confirm" => booking::confirm(session, &body)?,
                "/booking/back" => booking::back_from_form(session, &body)?,
                "/book" => booking::book(state, session, &body).await?,
                "/admin/open" => admin::open_login(session, &body)?,
                "/admin/cancel" => admin::cancel_login(session, &body)?,
                "/admin/login" => admin::login(state, session, &body)?,
                "/admin/leave" => admin::leave(session, &body)?,
                "/admin/reset/ask" => admin::ask_reset(session, &body)?,
                "/admin/reset/cancel" => admin::cancel_reset(session, &body)?,
                "/admin/reset" => admin::reset(state, session, &body).await?,
                _ => return Err(AppError::NotFound),
            }
            see_other(state, session)
        }
        _ => Err(AppError::NotFound),
    }
}

/// Every form post ends with a redirect to the page, reloading never posts twice.
fn see_other(state: &AppState, session: &Session) -> Result<Response<ResponseBody>, AppError> {
    Ok(Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(LOCATION, "/")
        .with_session(session, &state.key)
        .body(empty())?)
}
