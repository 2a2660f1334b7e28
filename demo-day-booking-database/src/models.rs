use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::{bookings, rooms, startups};

/// Every startup starts out with and is reset to this many spots.
pub const DEFAULT_SPOTS: i32 = 4;

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq, Eq)]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoomRow {
    pub id: String,
    pub name: String,
}

#[derive(
    Queryable,
    Selectable,
    Identifiable,
    Insertable,
    Associations,
    Serialize,
    Clone,
    Debug,
    PartialEq,
    Eq,
)]
#[diesel(table_name = startups)]
#[diesel(belongs_to(RoomRow, foreign_key = room_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Startup {
    pub id: String,
    pub name: String,
    pub spots: i32,
    pub room_id: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub startups: Vec<Startup>,
}

impl Room {
    #[must_use]
    pub fn from_row(row: RoomRow, startups: Vec<Startup>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            startups,
        }
    }

    #[must_use]
    pub fn startup(&self, startup_id: &str) -> Option<&Startup> {
        self.startups.iter().find(|startup| startup.id == startup_id)
    }
}

#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq, Eq)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Booking {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub startups: Vec<String>,
    pub room_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug, PartialEq, Eq)]
#[diesel(table_name = bookings)]
pub struct NewBooking {
    pub name: String,
    pub phone: String,
    pub startups: Vec<String>,
    pub room_id: String,
}
