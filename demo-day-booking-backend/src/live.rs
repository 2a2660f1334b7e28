//! Keeps a snapshot of rooms and bookings current while the store changes.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use demo_day_booking_database::models::{Booking, Room, Startup};
use demo_day_booking_database::{ChangeFeed, DatabaseError, Store, Subscription, Table};
use futures_util::stream;
use http_body::Frame;
use tokio::select;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// The last fetched rooms and bookings. Replaced as a whole on every refresh.
#[derive(Clone)]
pub struct LiveBoard {
    rooms: Arc<watch::Sender<Arc<Vec<Room>>>>,
    bookings: Arc<watch::Sender<Arc<Vec<Booking>>>>,
}

impl Default for LiveBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveBoard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(watch::Sender::new(Arc::default())),
            bookings: Arc::new(watch::Sender::new(Arc::default())),
        }
    }

    #[must_use]
    pub fn rooms(&self) -> Arc<Vec<Room>> {
        self.rooms.borrow().clone()
    }

    #[must_use]
    pub fn bookings(&self) -> Arc<Vec<Booking>> {
        self.bookings.borrow().clone()
    }

    #[must_use]
    pub fn room(&self, room_id: &str) -> Option<Room> {
        self.rooms
            .borrow()
            .iter()
            .find(|room| room.id == room_id)
            .cloned()
    }

    #[must_use]
    pub fn startup(&self, startup_id: &str) -> Option<Startup> {
        self.rooms
            .borrow()
            .iter()
            .find_map(|room| room.startup(startup_id))
            .cloned()
    }

    pub async fn refresh_rooms(&self, store: &dyn Store) -> Result<(), DatabaseError> {
        let rooms = store.list_rooms_with_startups().await?;
        self.rooms.send_replace(Arc::new(rooms));
        Ok(())
    }

    pub async fn refresh_bookings(&self, store: &dyn Store) -> Result<(), DatabaseError> {
        let bookings = store.list_bookings().await?;
        self.bookings.send_replace(Arc::new(bookings));
        Ok(())
    }

    pub async fn refresh_all(&self, store: &dyn Store) -> Result<(), DatabaseError> {
        self.refresh_rooms(store).await?;
        self.refresh_bookings(store).await
    }

    /// Server-sent events: one `change` event per replaced snapshot and a
    /// comment every few seconds so proxies keep the connection open. Ends
    /// when `shutdown` turns true.
    pub fn events(
        &self,
        shutdown: watch::Receiver<bool>,
    ) -> impl futures_util::Stream<Item = Result<Frame<Bytes>, Infallible>> + Send + 'static {
        let receivers = (self.rooms.subscribe(), self.bookings.subscribe(), shutdown);
        stream::unfold(receivers, |(mut rooms, mut bookings, mut shutdown)| async move {
            if *shutdown.borrow_and_update() {
                return None;
            }
            let event: &'static [u8] = select! {
                Ok(()) = rooms.changed() => b"event: change\ndata: rooms\n\n",
                Ok(()) = bookings.changed() => b"event: change\ndata: bookings\n\n",
                _ = shutdown.changed() => return None,
                () = tokio::time::sleep(KEEP_ALIVE) => b": keep-alive\n\n",
            };
            Some((
                Ok(Frame::data(Bytes::from_static(event))),
                (rooms, bookings, shutdown),
            ))
        })
    }
}

/// Refetches the snapshot whenever the feed reports a change. Stops when
/// dropped.
pub struct Bridge {
    _subscriptions: [Subscription; 2],
    task: JoinHandle<()>,
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn spawn_bridge(board: LiveBoard, store: Arc<dyn Store>, feed: &ChangeFeed) -> Bridge {
    let bookings_changed = Arc::new(Notify::new());
    let startups_changed = Arc::new(Notify::new());

    // notify_one keeps a permit, so changes during a refetch are not lost
    let subscriptions = [
        feed.subscribe(Table::Bookings, {
            let bookings_changed = Arc::clone(&bookings_changed);
            move || bookings_changed.notify_one()
        }),
        feed.subscribe(Table::Startups, {
            let startups_changed = Arc::clone(&startups_changed);
            move || startups_changed.notify_one()
        }),
    ];

    let task = tokio::spawn(async move {
        loop {
            select! {
                () = bookings_changed.notified() => {
                    debug!("bookings changed, refetching");
                    if let Err(err) = board.refresh_bookings(&*store).await {
                        warn!("failed to refetch bookings: {err}");
                    }
                }
                () = startups_changed.notified() => {
                    debug!("startups changed, refetching");
                    if let Err(err) = board.refresh_rooms(&*store).await {
                        warn!("failed to refetch rooms: {err}");
                    }
                }
            }
        }
    });

    Bridge {
        _subscriptions: subscriptions,
        task,
    }
}
