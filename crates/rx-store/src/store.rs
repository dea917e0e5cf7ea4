//! In-memory record source.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use parking_lot::RwLock;
use rx_model::{Encounter, EncounterId, Order, OrderId, OrderType, PatientId, Visit, VisitId};
use rx_resolver::{RecordSource, SourceError};

use crate::dataset::Dataset;
use crate::error::{StoreError, StoreResult};

/// Record tables plus the secondary indexes the resolver queries by.
#[derive(Debug, Default)]
struct Tables {
    visits: BTreeMap<VisitId, Visit>,
    encounters: BTreeMap<EncounterId, Encounter>,
    orders: BTreeMap<OrderId, Order>,
    visits_by_patient: HashMap<PatientId, Vec<VisitId>>,
    orders_by_visit: HashMap<VisitId, Vec<OrderId>>,
}

impl Tables {
    fn insert_visit(&mut self, visit: Visit) -> StoreResult<()> {
        if self.visits.contains_key(&visit.id) {
            return Err(StoreError::duplicate("visit", visit.id));
        }
        self.visits_by_patient
            .entry(visit.patient_id)
            .or_default()
            .push(visit.id);
        self.visits.insert(visit.id, visit);
        Ok(())
    }

    fn insert_encounter(&mut self, encounter: Encounter) -> StoreResult<()> {
        if !self.visits.contains_key(&encounter.visit_id) {
            return Err(StoreError::dangling("visit", encounter.visit_id));
        }
        if self.encounters.contains_key(&encounter.id) {
            return Err(StoreError::duplicate("encounter", encounter.id));
        }
        self.encounters.insert(encounter.id, encounter);
        Ok(())
    }

    fn insert_order(&mut self, order: Order) -> StoreResult<()> {
        if self.orders.contains_key(&order.id) {
            return Err(StoreError::duplicate("order", order.id));
        }
        let encounter = self
            .encounters
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
        let visit = self
            .visits
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

        self.orders_by_visit
            .entry(order.visit_id)
            .or_default()
            .push(order.id);
        self.orders.insert(order.id, order);
        Ok(())
    }
}

/// Thread-safe, in-memory [`RecordSource`].
///
/// Every fetch is answered from a single read guard, so a resolution call
/// never observes a half-applied insert.
///
/// # Example
///
/// ```ignore
/// use rx_resolver::OrderResolver;
/// use rx_store::InMemoryRecordSource;
///
/// let store = InMemoryRecordSource::load("fixtures/patient_with_orders.json")?;
/// let resolver = OrderResolver::new(&store);
///
/// let result = resolver.resolve_prescribed_orders(1001, Some(true), None)?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRecordSource {
    tables: RwLock<Tables>,
}

impl InMemoryRecordSource {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a dataset.
    ///
    /// Visits, encounters and orders are inserted in that order with the same
    /// checks as [`Dataset::validate`].
    pub fn from_dataset(dataset: Dataset) -> StoreResult<Self> {
        let mut tables = Tables::default();
        for visit in dataset.visits {
            tables.insert_visit(visit)?;
        }
        for encounter in dataset.encounters {
            tables.insert_encounter(encounter)?;
        }
        for order in dataset.orders {
            tables.insert_order(order)?;
        }

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Loads and validates a JSON dataset file.
    pub fn load<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let dataset = Dataset::load(path)?;
        let store = Self::from_dataset(dataset)?;

        let tables = store.tables.read();
        tracing::info!(
            path = %path.display(),
            visits = tables.visits.len(),
            encounters = tables.encounters.len(),
            orders = tables.orders.len(),
            "loaded clinical dataset"
        );
        drop(tables);

        Ok(store)
    }

    /// Writes the current contents to a JSON dataset file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> StoreResult<()> {
        self.snapshot().save(path)
    }

    /// Copies the current contents into a dataset.
    pub fn snapshot(&self) -> Dataset {
        let tables = self.tables.read();
        Dataset {
            name: None,
            visits: tables.visits.values().cloned().collect(),
            encounters: tables.encounters.values().copied().collect(),
            orders: tables.orders.values().cloned().collect(),
        }
    }

    /// Adds a visit.
    pub fn insert_visit(&self, visit: Visit) -> StoreResult<()> {
        self.tables.write().insert_visit(visit)
    }

    /// Adds an encounter; its visit must already be present.
    pub fn insert_encounter(&self, encounter: Encounter) -> StoreResult<()> {
        self.tables.write().insert_encounter(encounter)
    }

    /// Adds an order; its encounter must already be present.
    pub fn insert_order(&self, order: Order) -> StoreResult<()> {
        self.tables.write().insert_order(order)
    }

    /// Looks up a visit by identifier.
    pub fn visit(&self, id: VisitId) -> Option<Visit> {
        self.tables.read().visits.get(&id).cloned()
    }

    /// Looks up an order by identifier.
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.tables.read().orders.get(&id).cloned()
    }

    /// Looks up an order by UUID.
    pub fn order_by_uuid(&self, uuid: &str) -> Option<Order> {
        self.tables
            .read()
            .orders
            .values()
            .find(|order| order.uuid == uuid)
            .cloned()
    }

    /// Returns the visits with the given UUIDs, in request order.
    ///
    /// Unknown UUIDs are skipped.
    pub fn visits_by_uuids(&self, uuids: &[&str]) -> Vec<Visit> {
        let tables = self.tables.read();
        let by_uuid: HashMap<&str, &Visit> = tables
            .visits
            .values()
            .filter(|visit| !visit.uuid.is_empty())
            .map(|visit| (visit.uuid.as_str(), visit))
            .collect();

        uuids
            .iter()
            .filter_map(|uuid| by_uuid.get(uuid).map(|visit| (*visit).clone()))
            .collect()
    }

    /// Number of visits, encounters and orders held.
    pub fn counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.read();
        (
            tables.visits.len(),
            tables.encounters.len(),
            tables.orders.len(),
        )
    }
}

impl RecordSource for InMemoryRecordSource {
    fn visits_for_patient(&self, patient: PatientId) -> Result<Vec<Visit>, SourceError> {
        let tables = self.tables.read();
        Ok(tables
            .visits_by_patient
            .get(&patient)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.visits.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn orders_for_visits(
        &self,
        patient: PatientId,
        visits: &[VisitId],
        order_type: Option<&OrderType>,
    ) -> Result<Vec<Order>, SourceError> {
        let tables = self.tables.read();
        let orders = visits
            .iter()
            .filter_map(|visit| tables.orders_by_visit.get(visit))
            .flatten()
            .filter_map(|id| tables.orders.get(id))
            .filter(|order| order.patient_id == patient)
            .filter(|order| order_type.map_or(true, |t| &order.order_type == t))
            .cloned()
            .collect();
        Ok(orders)
    }
}
