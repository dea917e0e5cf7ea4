//! Traits for fetching the records a resolution runs over.
//!
//! This module defines the [`RecordSource`] trait that must be implemented by
//! any store that wants to feed the resolver.
//!
//! # Architecture Note
//!
//! This crate intentionally does NOT depend on a storage crate. The trait is
//! defined here; implementations for concrete stores live in the consuming
//! crate (see `rx-store` for an in-memory one).
//!
//! # Example: Implementing RecordSource over a SQL repository
//!
//! ```ignore
//! use rx_model::{Order, OrderType, PatientId, Visit, VisitId};
//! use rx_resolver::{RecordSource, SourceError};
//!
//! impl RecordSource for SqlRepository {
//!     fn visits_for_patient(&self, patient: PatientId) -> Result<Vec<Visit>, SourceError> {
//!         Ok(self.query_visits(patient)?)
//!     }
//!
//!     fn orders_for_visits(
//!         &self,
//!         patient: PatientId,
//!         visits: &[VisitId],
//!         order_type: Option<&OrderType>,
//!     ) -> Result<Vec<Order>, SourceError> {
//!         Ok(self.query_orders(patient, visits, order_type.map(|t| t.as_str()))?)
//!     }
//! }
//! ```

use rx_model::{Order, OrderType, PatientId, Visit, VisitId};

/// Failure reported by a record source.
///
/// Kept boxed so the resolver can hand it back to the caller unchanged.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Trait for stores that can supply visits and orders for one patient.
///
/// Implementations are responsible for returning a consistent snapshot for
/// the duration of a call; the resolver never re-reads a record.
pub trait RecordSource: Send + Sync {
    /// Gets every visit of the patient, in any order.
    ///
    /// Returns an empty Vec if the patient has no visits or doesn't exist.
    fn visits_for_patient(&self, patient: PatientId) -> Result<Vec<Visit>, SourceError>;

    /// Gets the patient's orders placed in any of the given visits.
    ///
    /// When `order_type` is given only orders of that type are returned.
    /// Orders of every action, including discontinuations, must be returned.
    fn orders_for_visits(
        &self,
        patient: PatientId,
        visits: &[VisitId],
        order_type: Option<&OrderType>,
    ) -> Result<Vec<Order>, SourceError>;
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn visits_for_patient(&self, patient: PatientId) -> Result<Vec<Visit>, SourceError> {
        (**self).visits_for_patient(patient)
    }

    fn orders_for_visits(
        &self,
        patient: PatientId,
        visits: &[VisitId],
        order_type: Option<&OrderType>,
    ) -> Result<Vec<Order>, SourceError> {
        (**self).orders_for_visits(patient, visits, order_type)
    }
}
