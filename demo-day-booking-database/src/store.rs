use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::models::{Booking, NewBooking, Room, Startup};

/// Data access used by the booking workflow.
///
/// Every method is a single round trip to the backing store. Nothing is
/// retried, failures are handed to the caller as they are.
#[async_trait]
pub trait Store: Send + Sync {
    /// All bookings, newest first.
    async fn list_bookings(&self) -> Result<Vec<Booking>, DatabaseError>;

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, DatabaseError>;

    async fn delete_all_bookings(&self) -> Result<(), DatabaseError>;

    /// Rooms ordered by id, each with its startups ordered by id.
    async fn list_rooms_with_startups(&self) -> Result<Vec<Room>, DatabaseError>;

    async fn startup(&self, startup_id: &str) -> Result<Option<Startup>, DatabaseError>;

    /// Updating a startup that does not exist is not an error.
    async fn set_startup_spots(&self, startup_id: &str, spots: i32) -> Result<(), DatabaseError>;

    /// Puts every startup back to [`crate::models::DEFAULT_SPOTS`].
    async fn reset_all_spots(&self) -> Result<(), DatabaseError>;

    /// Inserts the default room and startups unless a room already exists.
    async fn ensure_seed_data(&self) -> Result<(), DatabaseError>;
}
