use std::convert::Infallible;

use demo_day_booking_config::ConfigError;
use demo_day_booking_database::DatabaseError;
use handlebars::Handlebars;
use headers::ContentType;
use http::{Response, StatusCode};
use serde::Serialize;
use tracing::{error, warn};

use crate::session::{ResponseSessionExt as _, Session};
use crate::{full, ResponseBody, ResponseTypedHeaderExt as _};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("http error: {0}")]
    Http(#[from] http::Error),
    #[error("header error: {0}")]
    Header(#[from] headers::Error),
    #[error("webserver error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("IO error: {0}")]
    File(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("form submission error: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
    #[error("request body error: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("wrong csrf token")]
    WrongCsrfToken,
    #[error("this action is only available to the admin")]
    NotAdmin,
    #[error("page not found")]
    NotFound,
}

impl From<Infallible> for AppError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

#[derive(Serialize)]
pub struct ErrorTemplate {
    status: u16,
    reason: &'static str,
    error: String,
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::WrongCsrfToken | Self::Form(_) | Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::NotAdmin => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Http(_)
            | Self::Header(_)
            | Self::Hyper(_)
            | Self::File(_)
            | Self::Json(_)
            | Self::Template(_)
            | Self::Render(_)
            | Self::Config(_)
            | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Never fails. If even the error page can't be rendered a plain text
    /// response is sent.
    pub fn build_error_response(
        self,
        templates: &Handlebars<'_>,
        session: &Session,
        key: &cookie::Key,
    ) -> Response<ResponseBody> {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        } else {
            warn!("{self}");
        }

        let template = ErrorTemplate {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error"),
            error: self.to_string(),
        };
        let response = templates
            .render("error", &template)
            .map_err(AppError::from)
            .and_then(|html| {
                Ok(Response::builder()
                    .status(status)
                    .typed_header(ContentType::html())
                    .with_session(session, key)
                    .body(full(html))?)
            });
        match response {
            Ok(response) => response,
            Err(err) => {
                error!("failed to render error page: {err}");
                let mut response = Response::new(full(format!(
                    "an unexpected internal error occured: {}",
                    template.error
                )));
                *response.status_mut() = status;
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::WrongCsrfToken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotAdmin.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Database(DatabaseError::Unavailable("test")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn broken_templates_still_produce_a_response() {
        let templates = Handlebars::new();
        let session = Session::default();
        let response = AppError::NotAdmin.build_error_response(
            &templates,
            &session,
            &cookie::Key::generate(),
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
