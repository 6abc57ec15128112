//! # ContestGuard
//!
//! Relay server coordinating a contest lockdown policy between a proctoring
//! admin and a room of student clients.
//!
//! The admin creates a session, pushes the list of allowed network
//! destinations, and eventually ends the session. Students, authenticated
//! by a 4-digit session code, poll the policy and report activity logs.
//! Everything lives in process memory; the relay is meant to run as a
//! single instance for the duration of a contest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contestguard::prelude::*;
//!
//! # async fn run() -> Result<(), ServerError> {
//! let server = Server::builder()
//!     .bind("0.0.0.0:5000")
//!     .session_config(SessionConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod credentials;
mod error;
pub mod handlers;
mod routes;
mod server;

pub use error::{ApiError, ServerError};
pub use routes::router;
pub use server::{DEFAULT_BIND_ADDR, DEFAULT_SWEEP_INTERVAL, Server, ServerBuilder};

use tracing_subscriber::EnvFilter;

/// Commonly used types, for `use contestguard::prelude::*`.
pub mod prelude {
    pub use crate::{ApiError, Server, ServerBuilder, ServerError, router};
    pub use contestguard_protocol::{LogEntry, LogSubmission, SessionId, SessionStatus};
    pub use contestguard_session::{
        MemoryStore, SessionConfig, SessionError, SessionRegistry, SessionStore,
    };
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to the relay's own
/// crates and to request tracing.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "contestguard={level},contestguard_session={level},tower_http={level}"
        ))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
