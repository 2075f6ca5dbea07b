//! # rancho-store
//!
//! Local storage for the Rancho meal-service check-in application, backed by
//! SQLite.
//!
//! The device mirrors organizational reference data (companies, personnel,
//! credentials, service definitions) pulled from the remote authority, and is
//! the single writer of attendance check-ins, which are held locally until an
//! outbound sync confirms them.  The crate exposes a synchronous [`Database`]
//! handle that wraps a `rusqlite::Connection` and provides typed helpers for
//! every operation of the data layer.

pub mod checkins;
pub mod database;
pub mod meta;
pub mod migrations;
pub mod models;
pub mod reference;
pub mod reports;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;

#[cfg(test)]
pub(crate) mod testutil;
