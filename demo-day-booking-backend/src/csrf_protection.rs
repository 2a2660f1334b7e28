use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AppError;
use crate::session::Session;

pub trait CsrfToken {
    fn csrf_token(&self) -> &str;
}

/// A form with nothing but the token.
#[derive(Deserialize)]
pub struct CsrfOnly {
    csrf_token: String,
}

impl CsrfToken for CsrfOnly {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

/// Adds the token field to any form payload.
#[derive(Deserialize)]
pub struct WithCsrfToken<T> {
    csrf_token: String,
    #[serde(flatten)]
    pub inner: T,
}

impl<T> CsrfToken for WithCsrfToken<T> {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

/// The only way to read a posted form. Decoding fails unless the form
/// carries the token of the session.
pub struct CsrfSafeForm<T: CsrfToken> {
    pub value: T,
}

impl<T: DeserializeOwned + CsrfToken> CsrfSafeForm<T> {
    pub fn from_body(body: &Bytes, session: &Session) -> Result<Self, AppError> {
        let value: T = serde_urlencoded::from_bytes(body)?;
        if value.csrf_token() != session.csrf_token() {
            return Err(AppError::WrongCsrfToken);
        }
        Ok(Self { value })
    }
}
