//! Visit and encounter records.

use chrono::{DateTime, Utc};

use crate::{EncounterId, PatientId, VisitId};

/// A bounded, or still open, period of care for one patient.
///
/// A visit without a stop timestamp is *active*. Callers are expected to keep
/// at most one active visit per patient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Visit {
    /// Visit identifier.
    pub id: VisitId,
    /// External UUID of the visit.
    #[cfg_attr(feature = "serde", serde(default))]
    pub uuid: String,
    /// Owning patient.
    pub patient_id: PatientId,
    /// When the visit started.
    pub started_at: DateTime<Utc>,
    /// When the visit ended (None = still active).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub stopped_at: Option<DateTime<Utc>>,
}

impl Visit {
    /// Creates an active visit.
    pub fn new(id: VisitId, patient_id: PatientId, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            uuid: String::new(),
            patient_id,
            started_at,
            stopped_at: None,
        }
    }

    /// Sets the stop timestamp, closing the visit.
    pub fn stopped(mut self, stopped_at: DateTime<Utc>) -> Self {
        self.stopped_at = Some(stopped_at);
        self
    }

    /// Sets the external UUID.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    /// Returns true while the visit has no stop timestamp.
    pub fn is_active(&self) -> bool {
        self.stopped_at.is_none()
    }
}

/// A single clinical interaction inside a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encounter {
    /// Encounter identifier.
    pub id: EncounterId,
    /// Visit the encounter belongs to.
    pub visit_id: VisitId,
}

impl Encounter {
    /// Creates an encounter inside the given visit.
    pub fn new(id: EncounterId, visit_id: VisitId) -> Self {
        Self { id, visit_id }
    }
}
