//! # rx-resolver
//!
//! Resolves the clinically active prescriptions of a patient across a bounded
//! window of visits.
//!
//! The engine consumes already-materialised records through the
//! [`RecordSource`] trait; it owns no storage and performs no I/O of its own.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rx_resolver::OrderResolver;
//!
//! // Assumes store implements RecordSource
//! let resolver = OrderResolver::new(&store);
//!
//! // Everything prescribed in closed visits
//! let result = resolver.resolve_prescribed_orders(1001, None, None)?;
//!
//! // Only the last visit, active visit included, for two drug concepts
//! let result = resolver.resolve_prescribed_orders_for_concepts(
//!     1001,
//!     Some(true),
//!     Some(1),
//!     Some(&[24, 27]),
//! )?;
//! ```
//!
//! ## Revision Rules
//!
//! | Pair A ← B | Outcome |
//! |------------|---------|
//! | B discontinues A | A and B dropped |
//! | B revises A, same encounter | A dropped |
//! | B revises A, different encounter | both kept |
//! | B's predecessor outside the window | B standalone |
//!
//! ## Feature Flags
//!
//! - `parallel` - Resolves patient batches on the rayon thread pool
//! - `serde` - Enables `serde` on the record types
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        rx-resolver                           │
//! │                                                              │
//! │  OrderResolver                                               │
//! │  ├── fetch visits (via RecordSource)                         │
//! │  ├── select_visits    → ordered, bounded visit window        │
//! │  ├── fetch orders for the window (via RecordSource)          │
//! │  ├── collect_orders   → candidates by type / concept         │
//! │  ├── resolve_revisions → collapse chains, drop stop records  │
//! │  └── return ResolvedOrders / ResolvedVisits with stats       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod collector;
mod config;
mod engine;
mod error;
mod resolver;
mod result;
mod selector;
mod traits;

// Public re-exports
pub use collector::collect_orders;
pub use config::{ResolverConfig, ResolverConfigBuilder, WindowSpec};
pub use engine::OrderResolver;
pub use error::{ResolverError, ResolverResult};
pub use resolver::{resolve_revisions, Disposition, RevisionIndex};
pub use result::{ResolutionStats, ResolvedOrders, ResolvedVisits};
pub use selector::{recency_cmp, select_visits, visit_ranks};
pub use traits::{RecordSource, SourceError};

// Re-export the record types for convenience
pub use rx_model::{
    ConceptId, EncounterId, Order, OrderAction, OrderId, OrderType, PatientId, Visit, VisitId,
};
