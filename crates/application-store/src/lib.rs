//! Persistence gateway for loan applications.
//!
//! [`ApplicationStore`] is the port the domain layer talks to. Two adapters
//! implement it: [`PostgresApplicationStore`] for production and
//! [`InMemoryApplicationStore`] for tests and local runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{ApplicantId, ApplicationId};
pub use error::{Result, StoreError};
pub use memory::InMemoryApplicationStore;
pub use postgres::PostgresApplicationStore;
pub use store::{ApplicationStore, ApplicationStoreExt};
