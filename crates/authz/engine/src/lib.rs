//! Treasury Authorization Engine
//!
//! The runtime behind multi-signature treasury authorization: credential
//! verification against hashed secrets, per-session rate limiting, the
//! session state machine, keyed session storage with an expiry sweep, and
//! the domain event bus the ledger service subscribes to.
//!
//! The engine is a single-writer state machine. Callers that need
//! concurrent access serialize state-changing calls behind a lock (see
//! `authz-service`); reads hand out cloned snapshots.

#![deny(unsafe_code)]

mod engine;
mod event_bus;
mod rate_limit;
mod store;
mod verifier;

pub use engine::*;
pub use event_bus::*;
pub use rate_limit::*;
pub use store::*;
pub use verifier::*;
