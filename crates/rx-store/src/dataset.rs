//! Serialisable snapshot of clinical records.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rx_model::{Encounter, EncounterId, Order, Visit, VisitId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A set of visits, encounters and orders, as stored in a JSON file.
///
/// ```json
/// {
///   "name": "patient with orders",
///   "visits": [{ "id": 1, "patient_id": 1001, "started_at": "2024-01-01T09:00:00Z" }],
///   "encounters": [{ "id": 10, "visit_id": 1 }],
///   "orders": [{
///     "id": 15, "patient_id": 1001, "visit_id": 1, "encounter_id": 10,
///     "concept_id": 100, "action": "NEW", "created_at": "2024-01-01T09:10:00Z"
///   }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Free-form label for the dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Visits of every patient.
    #[serde(default)]
    pub visits: Vec<Visit>,
    /// Encounters of every visit.
    #[serde(default)]
    pub encounters: Vec<Encounter>,
    /// Orders of every encounter.
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl Dataset {
    /// Total number of records.
    pub fn len(&self) -> usize {
        self.visits.len() + self.encounters.len() + self.orders.len()
    }

    /// Returns true if the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks identifiers and references.
    ///
    /// Each encounter must sit in a known visit; each order must sit in a
    /// known encounter of the visit and patient it claims. A `previous_order`
    /// that points nowhere is allowed: it is treated as standalone during
    /// resolution.
    pub fn validate(&self) -> StoreResult<()> {
        let mut visits: HashMap<VisitId, &Visit> = HashMap::with_capacity(self.visits.len());
        for visit in &self.visits {
            if visits.insert(visit.id, visit).is_some() {
                return Err(StoreError::duplicate("visit", visit.id));
            }
        }

        let mut encounters: HashMap<EncounterId, &Encounter> =
            HashMap::with_capacity(self.encounters.len());
        for encounter in &self.encounters {
            if !visits.contains_key(&encounter.visit_id) {
                return Err(StoreError::dangling("visit", encounter.visit_id));
            }
            if encounters.insert(encounter.id, encounter).is_some() {
                return Err(StoreError::duplicate("encounter", encounter.id));
            }
        }

        let mut order_ids = HashSet::with_capacity(self.orders.len());
        for order in &self.orders {
            if !order_ids.insert(order.id) {
                return Err(StoreError::duplicate("order", order.id));
            }
            let encounter = encounters
                .get(&order.encounter_id)
                .ok_or_else(|| StoreError::dangling("encounter", order.encounter_id))?;
            if encounter.visit_id != order.visit_id {
                return Err(StoreError::Inconsistent {
                    order_id: order.id,
                    reason: format!(
                        "visit {} but encounter {} belongs to visit {}",
                        order.visit_id, encounter.id, encounter.visit_id
                    ),
                });
            }
            let visit = visits
                .get(&order.visit_id)
                .ok_or_else(|| StoreError::dangling("visit", order.visit_id))?;
            if visit.patient_id != order.patient_id {
                return Err(StoreError::Inconsistent {
                    order_id: order.id,
                    reason: format!(
                        "patient {} but visit {} belongs to patient {}",
                        order.patient_id, visit.id, visit.patient_id
                    ),
                });
            }
        }

        Ok(())
    }

    /// Saves the dataset to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> StoreResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| StoreError::io_error(path, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(())
    }

    /// Loads a dataset from a JSON file.
    ///
    /// The dataset is not validated here; see [`Dataset::validate`].
    pub fn load<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StoreError::io_error(path, e))?;
        let reader = BufReader::new(file);
        let dataset: Self = serde_json::from_reader(reader)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
        Ok(dataset)
    }

    /// Parses a dataset from a JSON string.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}
