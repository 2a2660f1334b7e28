use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::DatabaseError;
use crate::models::{Booking, NewBooking, Room, RoomRow, Startup, DEFAULT_SPOTS};
use crate::seed::{default_rooms, default_startups};
use crate::store::Store;

#[derive(Default)]
struct Tables {
    rooms: Vec<RoomRow>,
    startups: Vec<Startup>,
    bookings: Vec<Booking>,
    next_booking_id: i64,
}

/// Keeps everything in process memory, used when no database is configured
/// and in tests. Writes can be made to fail on purpose.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_inserts: AtomicBool,
    fail_spot_updates: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already contains the default room and startups.
    #[must_use]
    pub fn seeded() -> Self {
        Self::with_rooms(default_rooms(), default_startups())
    }

    #[must_use]
    pub fn with_rooms(rooms: Vec<RoomRow>, startups: Vec<Startup>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                rooms,
                startups,
                bookings: Vec::new(),
                next_booking_id: 1,
            }),
            ..Self::default()
        }
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_spot_updates(&self, fail: bool) {
        self.fail_spot_updates.store(fail, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, DatabaseError> {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::Unavailable("memory store lock poisoned"))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_bookings(&self) -> Result<Vec<Booking>, DatabaseError> {
        let tables = self.tables()?;
        let mut bookings = tables.bookings.clone();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, DatabaseError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DatabaseError::Unavailable("inserts are failing"));
        }
        let mut tables = self.tables()?;
        if !tables.rooms.iter().any(|room| room.id == booking.room_id) {
            return Err(DatabaseError::UnknownRoom(booking.room_id));
        }
        let id = tables.next_booking_id.max(1);
        tables.next_booking_id = id + 1;
        let booking = Booking {
            id,
            name: booking.name,
            phone: booking.phone,
            startups: booking.startups,
            room_id: booking.room_id,
            created_at: Utc::now(),
        };
        tables.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn delete_all_bookings(&self) -> Result<(), DatabaseError> {
        self.tables()?.bookings.clear();
        Ok(())
    }

    async fn list_rooms_with_startups(&self) -> Result<Vec<Room>, DatabaseError> {
        let tables = self.tables()?;
        let mut rooms = tables.rooms.clone();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rooms
            .into_iter()
            .map(|row| {
                let mut startups: Vec<Startup> = tables
                    .startups
                    .iter()
                    .filter(|startup| startup.room_id == row.id)
                    .cloned()
                    .collect();
                startups.sort_by(|a, b| a.id.cmp(&b.id));
                Room::from_row(row, startups)
            })
            .collect())
    }

    async fn startup(&self, startup_id: &str) -> Result<Option<Startup>, DatabaseError> {
        Ok(self
            .tables()?
            .startups
            .iter()
            .find(|startup| startup.id == startup_id)
            .cloned())
    }

    async fn set_startup_spots(&self, startup_id: &str, spots: i32) -> Result<(), DatabaseError> {
        if self.fail_spot_updates.load(Ordering::SeqCst) {
            return Err(DatabaseError::Unavailable("spot updates are failing"));
        }
        if let Some(startup) = self
            .tables()?
            .startups
            .iter_mut()
            .find(|startup| startup.id == startup_id)
        {
            startup.spots = spots;
        }
        Ok(())
    }

    async fn reset_all_spots(&self) -> Result<(), DatabaseError> {
        if self.fail_spot_updates.load(Ordering::SeqCst) {
            return Err(DatabaseError::Unavailable("spot updates are failing"));
        }
        for startup in &mut self.tables()?.startups {
            startup.spots = DEFAULT_SPOTS;
        }
        Ok(())
    }

    async fn ensure_seed_data(&self) -> Result<(), DatabaseError> {
        let mut tables = self.tables()?;
        if !tables.rooms.is_empty() {
            return Ok(());
        }
        tables.rooms = default_rooms();
        tables.startups = default_startups();
        Ok(())
    }
}
