//! Treasury Authorization Domain Types
//!
//! This crate defines the domain types for multi-signature treasury
//! authorization: the officer directory, transaction descriptors,
//! signatory requirements, and the authorization session aggregate.
//!
//! # Key Concepts
//!
//! - **Officer**: a named individual holding one authorization role
//!   (president, treasurer, secretary, financial secretary).
//! - **Authorization Requirement**: declarative policy per transaction
//!   class, snapshotted into each session at creation so policy changes
//!   never retroactively affect in-flight sessions.
//! - **Authorization Session**: one pending workflow instance tied to a
//!   single transaction attempt. Collects at most one authorization per
//!   role and moves to exactly one terminal state.
//! - **Audit Log**: receipt-based accountability. Every lifecycle action
//!   produces a receipt.
//!
//! # Architecture
//!
//! This is a pure types crate with no runtime dependencies. All types
//! implement `Clone`, `Debug`, `Serialize`, `Deserialize`. IDs use the
//! newtype pattern and implement `Display`, `generate()`, and `new()`.

#![deny(unsafe_code)]

mod audit;
mod errors;
mod events;
mod officer;
mod requirement;
mod session;
mod transaction;

pub use audit::*;
pub use errors::*;
pub use events::*;
pub use officer::*;
pub use requirement::*;
pub use session::*;
pub use transaction::*;
