pub mod csrf_protection;
pub mod error;
pub mod live;
pub mod report;
pub mod router;
pub mod routes;
pub mod session;
pub mod templates;
pub mod view;
pub mod workflow;

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use cookie::Key;
use demo_day_booking_config::Config;
use demo_day_booking_database::{
    get_database_connection, ChangeFeed, MemoryStore, NotifyingStore, PgStore, Store,
};
use error::AppError;
use futures_util::pin_mut;
use handlebars::Handlebars;
use headers::{Header, HeaderMapExt as _};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt as _, Empty, Full};
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use live::{spawn_bridge, Bridge, LiveBoard};
use routes::indexcss::IndexCss;
use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument as _};

pub type ResponseBody = UnsyncBoxBody<Bytes, Infallible>;

#[must_use]
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).boxed_unsync()
}

#[must_use]
pub fn empty() -> ResponseBody {
    Empty::new().boxed_unsync()
}

pub trait ResponseTypedHeaderExt {
    #[must_use]
    fn typed_header<H: Header>(self, header: H) -> Self;
}

impl ResponseTypedHeaderExt for http::response::Builder {
    fn typed_header<H: Header>(mut self, header: H) -> Self {
        if let Some(headers) = self.headers_mut() {
            headers.typed_insert(header);
        }
        self
    }
}

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub board: LiveBoard,
    pub templates: Handlebars<'static>,
    pub key: Key,
    pub css: IndexCss,
    /// Turns true once the server shuts down.
    pub shutdown: watch::Sender<bool>,
    _bridge: Bridge,
}

impl AppState {
    /// `store` must publish its writes on `feed`, otherwise the pages only
    /// update after a request of the same browser.
    pub async fn new(
        config: Config,
        store: Arc<dyn Store>,
        feed: &ChangeFeed,
    ) -> Result<Arc<Self>, AppError> {
        store.ensure_seed_data().await?;

        let key = match &config.cookie_secret {
            Some(secret) => Key::derive_from(secret.as_bytes()),
            None => {
                info!("no cookie_secret configured, admin logins end with a restart");
                Key::generate()
            }
        };

        let board = LiveBoard::new();
        board.refresh_all(&*store).await?;
        let bridge = spawn_bridge(board.clone(), Arc::clone(&store), feed);

        Ok(Arc::new(Self {
            templates: templates::load_templates()?,
            css: IndexCss::new()?,
            shutdown: watch::Sender::new(false),
            config,
            store,
            board,
            key,
            _bridge: bridge,
        }))
    }
}

async fn connect_store(config: &Config, feed: &ChangeFeed) -> Result<Arc<dyn Store>, AppError> {
    Ok(if let Some(database_url) = &config.database_url {
        let store = PgStore::new(get_database_connection(database_url)?);
        store.run_migrations().await?;
        Arc::new(NotifyingStore::new(store, feed.clone()))
    } else {
        warn!("no database_url configured, bookings are only kept in memory");
        Arc::new(NotifyingStore::new(MemoryStore::new(), feed.clone()))
    })
}

pub async fn setup_server(config: Config) -> Result<Arc<AppState>, AppError> {
    info!("starting up server...");
    let feed = ChangeFeed::new();
    let store = connect_store(&config, &feed).await?;
    AppState::new(config, store, &feed).await
}

pub async fn run_server(
    config: Config,
) -> Result<impl Future<Output = Result<(), AppError>>, AppError> {
    let listen = config.listen;
    let state = setup_server(config).await?;
    let listener = TcpListener::bind(listen).await?;
    info!("listening on http://{}", listener.local_addr()?);
    Ok(serve(listener, state, shutdown_signal()))
}

/// Accepts connections until `signal` completes, then waits for all
/// connections to finish.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    signal: impl Future<Output = ()>,
) -> Result<(), AppError> {
    // wait for the connections to finish shutdown
    let (closed_tx, closed_rx) = watch::channel(());
    pin_mut!(signal);

    loop {
        select! {
            accept = listener.accept() => {
                let (socket, remote_addr) = match accept {
                    Ok(accept) => accept,
                    Err(err) => {
                        warn!("failed to accept connection: {err}");
                        continue;
                    }
                };
                let state = Arc::clone(&state);
                let closed_rx = closed_rx.clone();

                let fut = async move {
                    let shutdown = state.shutdown.subscribe();
                    let hyper_service = hyper::service::service_fn(move |request: Request<Incoming>| {
                        router::handle(Arc::clone(&state), request)
                    });

                    let builder = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
                    let connection = builder.serve_connection_with_upgrades(TokioIo::new(socket), hyper_service);
                    pin_mut!(connection);

                    select! {
                        connection_result = connection.as_mut() => {
                            if let Err(err) = connection_result {
                                debug!("failed to serve connection: {err:#}");
                            }
                        }
                        () = stopped(shutdown) => {
                            connection.as_mut().graceful_shutdown();
                            if let Err(err) = connection.await {
                                debug!("failed to finish connection: {err:#}");
                            }
                        }
                    }

                    drop(closed_rx);
                };
                tokio::spawn(fut.instrument(info_span!("connection", %remote_addr)));
            }
            () = &mut signal => {
                warn!("shutting down, waiting for open connections");
                state.shutdown.send_replace(true);
                break;
            }
        }
    }

    drop(listener);
    drop(closed_rx);
    closed_tx.closed().await;
    info!("all connections closed");
    Ok(())
}

async fn stopped(mut shutdown: watch::Receiver<bool>) {
    // also resolves if shutdown started before this connection subscribed
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        debug!("shutdown sender dropped");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
