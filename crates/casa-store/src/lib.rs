//! Persistence collaborator for the Casa hub
//!
//! The automation engine and gateway link only see the [`Store`] trait.
//! [`SqliteStore`] is the production implementation; it also carries the
//! seeding helpers used by the CRUD layer and by tests.

mod error;
mod schema;
mod sqlite;
mod store;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
pub use store::Store;
