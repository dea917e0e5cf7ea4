//! # rx-model
//!
//! Record types consumed by the prescription resolution engine.
//!
//! A patient owns visits, a visit groups encounters, and an encounter groups
//! the orders written during one clinical interaction. Orders that revise or
//! discontinue an earlier order point back at it through
//! [`Order::previous_order`], forming revision chains.
//!
//! ```text
//! Patient ──< Visit ──< Encounter ──< Order
//!                                       │
//!                                       └── previous_order ──> Order
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use rx_model::{Order, OrderAction, OrderType, Visit};
//!
//! let started = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
//! let visit = Visit::new(1, 1001, started);
//! assert!(visit.is_active());
//!
//! let order = Order::builder(15, 1001, 1, 100, 7)
//!     .order_type(OrderType::drug_order())
//!     .action(OrderAction::New)
//!     .created_at(started)
//!     .build();
//! assert!(order.previous_order.is_none());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Derives `Serialize`/`Deserialize` for every record type

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod order;
mod visit;

pub use error::{ModelError, ModelResult};
pub use order::{DrugDosing, Order, OrderAction, OrderBuilder, OrderType, DRUG_ORDER_TYPE};
pub use visit::{Encounter, Visit};

/// Patient identifier.
pub type PatientId = u64;

/// Visit identifier.
pub type VisitId = u64;

/// Encounter identifier.
pub type EncounterId = u64;

/// Concept identifier (the orderable item, e.g. a drug concept).
pub type ConceptId = u64;

/// Order identifier.
pub type OrderId = u64;
