//! `Server` builder and serve loop.
//!
//! This is the entry point for running a relay. It ties the layers
//! together: HTTP router → session registry → store.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use contestguard_session::{
    Clock, MemoryStore, SessionConfig, SessionRegistry, SessionStore, SystemClock,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ServerError;
use crate::routes::router;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// How often the eviction sweeper runs when a retention is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,no_run
/// use contestguard::prelude::*;
///
/// # async fn run() -> Result<(), ServerError> {
/// let server = Server::builder()
///     .bind("127.0.0.1:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    sweep_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_config: SessionConfig::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the address to bind the server to. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets how often ended sessions are checked for eviction. Only used
    /// when [`SessionConfig::ended_retention`] is set. Clamped to at
    /// least one second.
    pub fn sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = every.max(Duration::from_secs(1));
        self
    }

    /// Sets the clock that stamps records and decides expiry.
    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Binds the listener over a fresh in-memory store.
    pub async fn build(self) -> Result<Server<MemoryStore>, ServerError> {
        self.build_with_store(MemoryStore::new()).await
    }

    /// Binds the listener over the given store.
    pub async fn build_with_store<S: SessionStore>(
        self,
        store: S,
    ) -> Result<Server<S>, ServerError> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.bind_addr.clone(),
                source,
            })?;

        let registry = Arc::new(SessionRegistry::with_clock(
            store,
            self.session_config,
            self.clock,
        ));

        Ok(Server {
            listener,
            registry,
            sweep_interval: self.sweep_interval,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound relay server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// serving. All session state lives in this value's registry and is gone
/// once the server stops.
pub struct Server<S: SessionStore = MemoryStore> {
    listener: TcpListener,
    registry: Arc<SessionRegistry<S>>,
    sweep_interval: Duration,
}

impl Server<MemoryStore> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<S: SessionStore> Server<S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The registry this server serves.
    pub fn registry(&self) -> Arc<SessionRegistry<S>> {
        Arc::clone(&self.registry)
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(ctrl_c()).await
    }

    /// Serves until `shutdown` completes, then finishes in-flight requests
    /// and returns.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr().map_err(ServerError::Serve)?;
        let sweeper = self
            .registry
            .config()
            .ended_retention
            .map(|_| spawn_sweeper(Arc::clone(&self.registry), self.sweep_interval));

        tracing::info!(%addr, "ContestGuard relay listening");

        let app = router(Arc::clone(&self.registry));
        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve);

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        tracing::info!("ContestGuard relay stopped");
        result
    }
}

/// Periodically evicts sessions that ended longer ago than the retention.
fn spawn_sweeper<S: SessionStore>(
    registry: Arc<SessionRegistry<S>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can have expired yet.
        interval.tick().await;

        loop {
            interval.tick().await;
            let evicted = registry.evict_expired().await;
            if !evicted.is_empty() {
                tracing::info!(count = evicted.len(), "evicted ended sessions");
            }
        }
    })
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
