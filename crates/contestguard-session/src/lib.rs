//! Contest session management for ContestGuard.
//!
//! This crate is the core of the relay server:
//!
//! 1. **Secrets**: session ids, admin tokens, and student codes
//!    ([`SessionSecrets`])
//! 2. **Authorization**: constant-time checks of a presented credential
//!    against a record ([`authorize_admin`], [`authorize_student`])
//! 3. **Registry**: every session and every rule about how it changes
//!    ([`SessionRegistry`]), on top of a swappable [`SessionStore`]
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP layer (above)  ← extracts credentials, maps errors to status codes
//!     ↕
//! Session layer (this crate)  ← owns records, checks credentials
//!     ↕
//! Protocol layer (below)  ← wire types, payload parsing
//! ```

mod auth;
mod clock;
mod error;
mod record;
mod registry;
pub mod secrets;
mod store;

pub use auth::{Role, authorize_admin, authorize_student, constant_time_eq};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use record::{SessionConfig, SessionRecord};
pub use registry::SessionRegistry;
pub use secrets::SessionSecrets;
pub use store::{MemoryStore, SessionStore};
