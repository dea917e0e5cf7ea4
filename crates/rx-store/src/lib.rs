//! # rx-store
//!
//! In-memory record source for `rx-resolver`.
//!
//! The store holds visits, encounters and orders behind a read/write lock and
//! implements [`rx_resolver::RecordSource`], so it can back an
//! [`rx_resolver::OrderResolver`] directly. Datasets are plain JSON files.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rx_resolver::OrderResolver;
//! use rx_store::InMemoryRecordSource;
//!
//! let store = InMemoryRecordSource::load("patient_with_orders.json")?;
//! let resolver = OrderResolver::new(&store);
//!
//! let prescriptions = resolver.resolve_prescribed_orders(1001, Some(true), Some(2))?;
//!
//! // Identifier lookups stay on the store
//! let visits = store.visits_by_uuids(&["1e5d5d48-6b78-11e0-93c3-18a97ba044dc"]);
//! ```

pub mod dataset;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use dataset::Dataset;
pub use error::{StoreError, StoreResult};
pub use store::InMemoryRecordSource;
