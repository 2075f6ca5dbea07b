//! # rancho-sync
//!
//! Synchronization layer of the Rancho check-in application: the incremental
//! reference-data pull and the outbound batch upload of locally recorded
//! check-ins.
//!
//! Both engines talk to one remote endpoint (`catering.php`), authenticate
//! with a bearer [`Session`], and own a single-flight guard so that at most
//! one operation of each class is in progress.  The local [`Database`] is
//! borrowed mutably for the duration of a call, which keeps the device a
//! single writer by construction.
//!
//! [`Database`]: rancho_store::Database

pub mod client;
pub mod loader;
pub mod outbound;
pub mod protocol;
pub mod session;

mod error;

pub use client::SyncClient;
pub use error::SyncError;
pub use loader::{PullOutcome, ReferenceLoader};
pub use outbound::{SyncEngine, SyncOutcome};
pub use session::Session;
