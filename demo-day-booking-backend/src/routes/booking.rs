use bytes::Bytes;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::index::{MAX_NAME_LEN, MAX_PHONE_LEN};
use crate::csrf_protection::{CsrfOnly, CsrfSafeForm, WithCsrfToken};
use crate::error::AppError;
use crate::session::Session;
use crate::view::{Action, Screen};
use crate::workflow::{self, normalize_phone, BookingDraft, SubmitError};
use crate::AppState;

pub const BOOKING_FAILED: &str = "Booking failed. Please try again.";

#[derive(Deserialize)]
pub struct RoomPayload {
    room_id: String,
}

#[derive(Deserialize)]
pub struct StartupPayload {
    startup_id: String,
}

#[derive(Deserialize)]
pub struct BookingPayload {
    name: String,
    phone: String,
    country_code: String,
}

pub fn select_room(state: &AppState, session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    let form = CsrfSafeForm::<WithCsrfToken<RoomPayload>>::from_body(body, session)?;
    let room_id = form.value.inner.room_id;
    if state.board.room(&room_id).is_none() {
        return Err(AppError::NotFound);
    }
    session.apply(Action::SelectRoom(room_id));
    Ok(())
}

pub fn back_to_rooms(session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    session.apply(Action::BackToRooms);
    Ok(())
}

/// Uses the spot count of the latest snapshot.
pub fn toggle(state: &AppState, session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    let form = CsrfSafeForm::<WithCsrfToken<StartupPayload>>::from_body(body, session)?;
    let startup = state
        .board
        .startup(&form.value.inner.startup_id)
        .filter(|startup| session.view().room.as_ref() == Some(&startup.room_id))
        .ok_or(AppError::NotFound)?;
    session.apply(Action::Toggle {
        startup_id: startup.id,
        spots: startup.spots,
    });
    Ok(())
}

pub fn confirm(session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    session.apply(Action::Confirm);
    Ok(())
}

pub fn back_from_form(session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    CsrfSafeForm::<CsrfOnly>::from_body(body, session)?;
    session.apply(Action::BackFromForm);
    Ok(())
}

/// Validation and store failures end up as a notice on the form, only a
/// bad request is an error. Only the form screen can book.
pub async fn book(state: &AppState, session: &mut Session, body: &Bytes) -> Result<(), AppError> {
    let form = CsrfSafeForm::<WithCsrfToken<BookingPayload>>::from_body(body, session)?;
    if Screen::select(session.view()) != Screen::BookingForm {
        return Err(AppError::NotFound);
    }
    let BookingPayload {
        name,
        phone,
        country_code,
    } = form.value.inner;
    session.apply(Action::EditDraft {
        name: name.chars().take(MAX_NAME_LEN).collect(),
        phone: normalize_phone(&phone).chars().take(MAX_PHONE_LEN).collect(),
        country_code,
    });

    let view = session.view().clone();
    let Some(room) = view.room.as_deref().and_then(|room_id| state.board.room(room_id)) else {
        session.apply(Action::BackToRooms);
        return Ok(());
    };
    // the view cookie is not signed, ids of other rooms are dropped
    let selection = view.selection.within(&room);
    let draft = BookingDraft {
        name: &view.name,
        phone: &view.phone,
        country_code: &view.country_code,
    };

    match workflow::submit(&*state.store, &room.id, &selection, &draft).await {
        Ok(booking) => {
            info!("booking {} created", booking.id);
            session.apply(Action::Submitted);
        }
        Err(SubmitError::Invalid(err)) => {
            warn!("rejected booking: {err}");
            session.apply(Action::SubmitFailed(err.to_string()));
        }
        Err(SubmitError::Store(err)) => {
            error!("booking failed: {err}");
            session.apply(Action::SubmitFailed(BOOKING_FAILED.to_owned()));
        }
    }

    // the feed refreshes it as well, this makes the redirect see the write
    if let Err(err) = state.board.refresh_all(&*state.store).await {
        warn!("failed to refresh snapshot: {err}");
    }
    Ok(())
}
