use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection as _};
use tracing::{error, info};

use crate::error::DatabaseError;
use crate::models::{Booking, NewBooking, Room, RoomRow, Startup, DEFAULT_SPOTS};
use crate::schema::{bookings, rooms, startups};
use crate::seed::{default_rooms, default_startups};
use crate::store::Store;
use crate::Pool;

const CREATE_TABLES: &str = include_str!("../migrations/2025-05-01-000000_create_tables/up.sql");

/// Logs a failed query the same way for every operation.
fn logged<T>(operation: &str, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
    if let Err(err) = &result {
        error!("Error {operation}: {err}");
    }
    result
}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Creates the tables if they don't exist yet.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let mut connection = self.pool.get().await?;
        connection
            .batch_execute(CREATE_TABLES)
            .await
            .map_err(|err| DatabaseError::Migration(err.to_string()))?;
        info!("database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_bookings(&self) -> Result<Vec<Booking>, DatabaseError> {
        logged("fetching bookings", async {
            let mut connection = self.pool.get().await?;
            Ok(bookings::table
                .order((bookings::created_at.desc(), bookings::id.desc()))
                .select(Booking::as_select())
                .load(&mut connection)
                .await?)
        }
        .await)
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, DatabaseError> {
        logged("creating booking", async {
            let mut connection = self.pool.get().await?;
            Ok(diesel::insert_into(bookings::table)
                .values(booking)
                .returning(Booking::as_returning())
                .get_result(&mut connection)
                .await?)
        }
        .await)
    }

    async fn delete_all_bookings(&self) -> Result<(), DatabaseError> {
        logged("deleting bookings", async {
            let mut connection = self.pool.get().await?;
            diesel::delete(bookings::table)
                .execute(&mut connection)
                .await?;
            Ok(())
        }
        .await)
    }

    async fn list_rooms_with_startups(&self) -> Result<Vec<Room>, DatabaseError> {
        logged("fetching rooms", async {
            let mut connection = self.pool.get().await?;
            let rooms = rooms::table
                .order(rooms::id.asc())
                .select(RoomRow::as_select())
                .load(&mut connection)
                .await?;
            let startups = Startup::belonging_to(&rooms)
                .order(startups::id.asc())
                .select(Startup::as_select())
                .load(&mut connection)
                .await?;
            Ok(startups
                .grouped_by(&rooms)
                .into_iter()
                .zip(rooms)
                .map(|(startups, room)| Room::from_row(room, startups))
                .collect())
        }
        .await)
    }

    async fn startup(&self, startup_id: &str) -> Result<Option<Startup>, DatabaseError> {
        logged("fetching startup", async {
            let mut connection = self.pool.get().await?;
            Ok(startups::table
                .find(startup_id)
                .select(Startup::as_select())
                .first(&mut connection)
                .await
                .optional()?)
        }
        .await)
    }

    async fn set_startup_spots(&self, startup_id: &str, spots: i32) -> Result<(), DatabaseError> {
        logged("updating startup spots", async {
            let mut connection = self.pool.get().await?;
            diesel::update(startups::table.find(startup_id))
                .set(startups::spots.eq(spots))
                .execute(&mut connection)
                .await?;
            Ok(())
        }
        .await)
    }

    async fn reset_all_spots(&self) -> Result<(), DatabaseError> {
        logged("resetting startup spots", async {
            let mut connection = self.pool.get().await?;
            diesel::update(startups::table)
                .set(startups::spots.eq(DEFAULT_SPOTS))
                .execute(&mut connection)
                .await?;
            Ok(())
        }
        .await)
    }

    async fn ensure_seed_data(&self) -> Result<(), DatabaseError> {
        logged("creating default data", async {
            let mut connection = self.pool.get().await?;
            let existing: Option<String> = rooms::table
                .select(rooms::id)
                .first(&mut connection)
                .await
                .optional()?;
            if existing.is_some() {
                return Ok(());
            }
            diesel::insert_into(rooms::table)
                .values(default_rooms())
                .on_conflict_do_nothing()
                .execute(&mut connection)
                .await?;
            diesel::insert_into(startups::table)
                .values(default_startups())
                .on_conflict_do_nothing()
                .execute(&mut connection)
                .await?;
            info!("inserted default rooms and startups");
            Ok(())
        }
        .await)
    }
}
