use bytes::Bytes;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::csrf_protection::{CsrfOnly, CsrfSafeForm, WithCsrfToken};
use crate::error::AppError;
use crate::session::Session;
use crate::view::Action;
use crate::workflow::reset_all;
use crate::AppState;

pub const RESET_FAILED: &str = "Reset failed. Please try again.";

#[derive(Deserialize)]
pub struct LoginPayload {
    password: String,
}

/// A shared secret to keep attendees out of the dashboard, nothing more.
#[must_use]
pub fn check_admin_password(expected: &str, given: &str) -> bool {
    !expected.is_empty() && expected == given
}

fn require_admin(session: &Session) -> Result<(), AppError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(AppError::NotAdmin)
    }
}

pub fn open_login(session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    session.apply(Action::OpenAdminLogin);
    Ok(())
}

pub fn cancel_login(session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    session.apply(Action::CancelAdminLogin);
    Ok(())
}

pub fn login(state: &AppState, session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    let form = CsrfSafeForm::<WithCsrfToken<LoginPayload>>::from_body(body, session)?;
    let granted = check_admin_password(&state.config.admin_password, &form.value.inner.password);
    if granted {
        info!("admin logged in");
    } else {
        warn!("rejected admin login");
    }
    session.apply(Action::AdminLogin { granted });
    Ok(())
}

pub fn leave(session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    session.apply(Action::LeaveAdmin);
    Ok(())
}

pub fn ask_reset(session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    require_admin(session)?;
    session.apply(Action::AskResetConfirm);
    Ok(())
}

pub fn cancel_reset(session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    require_admin(session)?;
    session.apply(Action::CancelReset);
    Ok(())
}

pub async fn reset(state: &AppState, session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    require_admin(session)?;
    match reset_all(&*state.store).await {
        Ok(()) => {
            info!("admin reset all bookings");
            session.apply(Action::ResetDone);
        }
        Err(err) => {
            error!("reset failed: {err}");
            session.apply(Action::ResetFailed(RESET_FAILED.to_owned()));
        }
    }
    if let Err(err) = state.board.refresh_all(&*state.store).await {
        warn!("failed to refresh snapshot: {err}");
    }
    Ok(())
}
