//! Choosing startups and turning the choice into a booking.

use demo_day_booking_database::models::{Booking, NewBooking, Room};
use demo_day_booking_database::{DatabaseError, Store};
use futures_util::future::{join, join_all};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How many startups one attendee may sit with.
pub const MAX_SELECTIONS: usize = 2;

pub const DEFAULT_COUNTRY_CODE: &str = "973";

/// Country calling codes offered in the booking form.
pub const COUNTRY_CODES: &[(&str, &str)] = &[
    ("973", "🇧🇭 +973 (Bahrain)"),
    ("966", "🇸🇦 +966 (Saudi Arabia)"),
    ("971", "🇦🇪 +971 (UAE)"),
    ("965", "🇰🇼 +965 (Kuwait)"),
    ("974", "🇶🇦 +974 (Qatar)"),
    ("968", "🇴🇲 +968 (Oman)"),
];

/// The startups picked in the current session, in the order they were picked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Selection(Vec<String>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// Already [`MAX_SELECTIONS`] startups are selected.
    SelectionFull,
    /// The startup has no spots left.
    StartupFull,
}

impl From<Vec<String>> for Selection {
    /// Drops duplicates and everything beyond [`MAX_SELECTIONS`], cookies can be edited.
    fn from(ids: Vec<String>) -> Self {
        let mut selection = Self::default();
        for id in ids {
            if selection.0.len() == MAX_SELECTIONS {
                break;
            }
            if !selection.contains(&id) {
                selection.0.push(id);
            }
        }
        selection
    }
}

impl From<Selection> for Vec<String> {
    fn from(selection: Selection) -> Self {
        selection.0
    }
}

impl Selection {
    #[must_use]
    pub fn contains(&self, startup_id: &str) -> bool {
        self.0.iter().any(|id| id == startup_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn can_select_more(&self) -> bool {
        self.0.len() < MAX_SELECTIONS
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Only the ids of startups in `room`, in room order.
    #[must_use]
    pub fn within(&self, room: &Room) -> Self {
        Self(
            room.startups
                .iter()
                .filter(|startup| self.contains(&startup.id))
                .map(|startup| startup.id.clone())
                .collect(),
        )
    }

    /// Removing always works, adding only while there is room in the
    /// selection and a spot left at the startup.
    pub fn toggle(&mut self, startup_id: &str, spots: i32) -> Toggle {
        if self.contains(startup_id) {
            self.0.retain(|id| id != startup_id);
            Toggle::Removed
        } else if is_full(spots, false) {
            Toggle::StartupFull
        } else if self.can_select_more() {
            self.0.push(startup_id.to_owned());
            Toggle::Added
        } else {
            Toggle::SelectionFull
        }
    }
}

/// Spots shown for a startup, counting the current selection as taken.
#[must_use]
pub fn spots_left(spots: i32, selected: bool) -> i32 {
    (spots - i32::from(selected)).max(0)
}

#[must_use]
pub const fn is_full(spots: i32, selected: bool) -> bool {
    spots <= 0 && !selected
}

#[must_use]
pub fn normalize_phone(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

#[must_use]
pub fn is_known_country_code(code: &str) -> bool {
    COUNTRY_CODES.iter().any(|(known, _)| *known == code)
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your name.")]
    EmptyName,
    #[error("Please enter your phone number.")]
    EmptyPhone,
    #[error("Please choose a country code from the list.")]
    UnknownCountryCode,
    #[error("Please select at least one startup.")]
    NoSelection,
}

/// What the attendee typed into the booking form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingDraft<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub country_code: &'a str,
}

impl BookingDraft<'_> {
    pub fn to_new_booking(
        &self,
        room_id: &str,
        selection: &Selection,
    ) -> Result<NewBooking, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let digits = normalize_phone(self.phone);
        if digits.is_empty() {
            return Err(ValidationError::EmptyPhone);
        }
        if !is_known_country_code(self.country_code) {
            return Err(ValidationError::UnknownCountryCode);
        }
        if selection.is_empty() {
            return Err(ValidationError::NoSelection);
        }
        Ok(NewBooking {
            name: name.to_owned(),
            phone: format!("+{}{digits}", self.country_code),
            startups: selection.ids().to_vec(),
            room_id: room_id.to_owned(),
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),
    #[error("{0}")]
    Store(#[from] DatabaseError),
}

async fn take_spot(store: &dyn Store, startup_id: &str) -> Result<(), DatabaseError> {
    let startup = store
        .startup(startup_id)
        .await?
        .ok_or_else(|| DatabaseError::UnknownStartup(startup_id.to_owned()))?;
    store
        .set_startup_spots(startup_id, (startup.spots - 1).max(0))
        .await
}

/// Stores the booking and then takes one spot from every selected startup.
///
/// The spot updates run concurrently and independently of each other. If
/// one of them fails the booking and the other updates stay as they are.
pub async fn submit(
    store: &dyn Store,
    room_id: &str,
    selection: &Selection,
    draft: &BookingDraft<'_>,
) -> Result<Booking, SubmitError> {
    let new_booking = draft.to_new_booking(room_id, selection)?;
    let booking = store.create_booking(new_booking).await?;
    info!(
        "booking {} for {} startups stored",
        booking.id,
        booking.startups.len()
    );

    let updates = join_all(
        booking
            .startups
            .iter()
            .map(|startup_id| take_spot(store, startup_id)),
    )
    .await;
    for result in updates {
        if let Err(err) = result {
            warn!("booking {} stored but taking a spot failed: {err}", booking.id);
            return Err(err.into());
        }
    }
    Ok(booking)
}

/// Deletes all bookings and puts back all spots. Both happen even if the
/// other one fails.
pub async fn reset_all(store: &dyn Store) -> Result<(), DatabaseError> {
    let (bookings, spots) = join(store.delete_all_bookings(), store.reset_all_spots()).await;
    bookings?;
    spots?;
    info!("all bookings and spots reset");
    Ok(())
}
