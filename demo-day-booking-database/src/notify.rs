use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::DatabaseError;
use crate::models::{Booking, NewBooking, Room, Startup};
use crate::store::Store;

const FEED_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Rooms,
    Startups,
    Bookings,
}

impl Table {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rooms => "rooms",
            Self::Startups => "startups",
            Self::Bookings => "bookings",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Change {
    pub table: Table,
    pub kind: ChangeKind,
}

/// Fan-out of table mutations to everyone who subscribed.
#[derive(Clone, Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Change>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, table: Table, kind: ChangeKind) {
        trace!("{kind:?} on {}", table.name());
        // only fails when nobody listens
        let _ = self.sender.send(Change { table, kind });
    }

    /// Calls `on_change` for every insert, update or delete on `table` until
    /// the returned handle is dropped. Must be called inside a tokio runtime.
    pub fn subscribe<F>(&self, table: Table, on_change: F) -> Subscription
    where
        F: Fn() + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(change) if change.table == table => on_change(),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("subscriber of {} lagged by {skipped} changes", table.name());
                        on_change();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription { task }
    }
}

#[must_use = "dropping the subscription unsubscribes"]
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Publishes a change on the feed after every successful write of the inner store.
pub struct NotifyingStore<S> {
    inner: S,
    feed: ChangeFeed,
}

impl<S: Store> NotifyingStore<S> {
    pub const fn new(inner: S, feed: ChangeFeed) -> Self {
        Self { inner, feed }
    }
}

#[async_trait]
impl<S: Store> Store for NotifyingStore<S> {
    async fn list_bookings(&self) -> Result<Vec<Booking>, DatabaseError> {
        self.inner.list_bookings().await
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, DatabaseError> {
        let booking = self.inner.create_booking(booking).await?;
        self.feed.publish(Table::Bookings, ChangeKind::Insert);
        Ok(booking)
    }

    async fn delete_all_bookings(&self) -> Result<(), DatabaseError> {
        self.inner.delete_all_bookings().await?;
        self.feed.publish(Table::Bookings, ChangeKind::Delete);
        Ok(())
    }

    async fn list_rooms_with_startups(&self) -> Result<Vec<Room>, DatabaseError> {
        self.inner.list_rooms_with_startups().await
    }

    async fn startup(&self, startup_id: &str) -> Result<Option<Startup>, DatabaseError> {
        self.inner.startup(startup_id).await
    }

    async fn set_startup_spots(&self, startup_id: &str, spots: i32) -> Result<(), DatabaseError> {
        self.inner.set_startup_spots(startup_id, spots).await?;
        self.feed.publish(Table::Startups, ChangeKind::Update);
        Ok(())
    }

    async fn reset_all_spots(&self) -> Result<(), DatabaseError> {
        self.inner.reset_all_spots().await?;
        self.feed.publish(Table::Startups, ChangeKind::Update);
        Ok(())
    }

    async fn ensure_seed_data(&self) -> Result<(), DatabaseError> {
        self.inner.ensure_seed_data().await?;
        self.feed.publish(Table::Rooms, ChangeKind::Insert);
        self.feed.publish(Table::Startups, ChangeKind::Insert);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::memory::MemoryStore;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn subscriber_only_sees_its_table() {
        let feed = ChangeFeed::new();
        let bookings = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&bookings);
        let _subscription = feed.subscribe(Table::Bookings, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;

        let store = NotifyingStore::new(MemoryStore::seeded(), feed.clone());
        store.set_startup_spots("1", 2).await.unwrap();
        store
            .create_booking(NewBooking {
                name: "Aisha".to_owned(),
                phone: "+97333123456".to_owned(),
                startups: vec!["1".to_owned()],
                room_id: "room1".to_owned(),
            })
            .await
            .unwrap();
        settle().await;

        assert_eq!(bookings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let feed = ChangeFeed::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = feed.subscribe(Table::Startups, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;
        feed.publish(Table::Startups, ChangeKind::Update);
        settle().await;
        subscription.unsubscribe();
        feed.publish(Table::Startups, ChangeKind::Update);
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_writes_are_not_published() {
        let feed = ChangeFeed::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _subscription = feed.subscribe(Table::Startups, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;

        let memory = MemoryStore::seeded();
        memory.fail_spot_updates(true);
        let store = NotifyingStore::new(memory, feed);
        assert!(store.set_startup_spots("1", 3).await.is_err());
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
