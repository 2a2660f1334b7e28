use std::fmt::Write as _;
use std::time::Duration;

use bytes::Bytes;
use headers::{CacheControl, ContentType, ETag, Header as _, HeaderMapExt as _, IfNoneMatch};
use http::{HeaderValue, Request, Response, StatusCode};
use sha2::{Digest as _, Sha256};

use crate::error::AppError;
use crate::{empty, full, ResponseBody, ResponseTypedHeaderExt as _};

const INDEX_CSS: &str = include_str!("../../../frontend/index.css");

/// The embedded stylesheet and the hash it is cached under.
pub struct IndexCss {
    version: String,
    etag: ETag,
}

impl IndexCss {
    pub fn new() -> Result<Self, AppError> {
        let digest = Sha256::digest(INDEX_CSS.as_bytes());
        let version = digest.iter().take(8).fold(String::new(), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        });
        let value = HeaderValue::from_str(&format!("\"{version}\"")).map_err(http::Error::from)?;
        let etag = ETag::decode(&mut std::iter::once(&value))?;
        Ok(Self { version, etag })
    }

    /// Appended to the stylesheet url so a changed file is fetched again.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn respond<T>(&self, request: &Request<T>) -> Result<Response<ResponseBody>, AppError> {
        let if_none_match: Option<IfNoneMatch> = request.headers().typed_get();
        if if_none_match.map_or(true, |header| header.precondition_passes(&self.etag)) {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .typed_header(ContentType::from(mime::TEXT_CSS_UTF_8))
                .typed_header(self.etag.clone())
                .typed_header(
                    CacheControl::new()
                        .with_immutable()
                        .with_public()
                        .with_max_age(Duration::from_secs(31_536_000)),
                )
                .body(full(Bytes::from_static(INDEX_CSS.as_bytes())))?)
        } else {
            Ok(Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .typed_header(self.etag.clone())
                .body(empty())?)
        }
    }
}
