pub mod error;
pub mod memory;
pub mod models;
pub mod notify;
pub mod postgres;
pub mod schema;
pub mod seed;
pub mod store;

use diesel_async::pooled_connection::deadpool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
pub use error::DatabaseError;
pub use memory::MemoryStore;
pub use notify::{ChangeFeed, NotifyingStore, Subscription, Table};
pub use postgres::PgStore;
pub use store::Store;

pub type Pool = deadpool::Pool<AsyncPgConnection>;

// https://github.com/tokio-rs/axum/tree/main/examples/diesel-async-postgres

pub fn get_database_connection(database_url: &str) -> Result<Pool, DatabaseError> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Ok(Pool::builder(config).build()?)
}
