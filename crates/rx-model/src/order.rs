//! Order records and their action/type discriminators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{ModelError, ModelResult};
use crate::{ConceptId, EncounterId, OrderId, PatientId, VisitId};

/// Discriminator of the default drug order type.
pub const DRUG_ORDER_TYPE: &str = "Drug Order";

// =============================================================================
// Order Type
// =============================================================================

/// Order type discriminator (e.g. `"Drug Order"`, `"Lab Order"`).
///
/// Compared exactly; no case folding is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OrderType(String);

impl OrderType {
    /// Creates an order type from its discriminator text.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The drug order type.
    pub fn drug_order() -> Self {
        Self::new(DRUG_ORDER_TYPE)
    }

    /// Returns the discriminator text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderType {
    fn default() -> Self {
        Self::drug_order()
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// =============================================================================
// Order Action
// =============================================================================

/// What an order does to the therapy line it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum OrderAction {
    /// Starts a new therapy line.
    #[default]
    New,
    /// Replaces the previous order with changed instructions.
    Revise,
    /// Stops the previous order. Never a prescription itself.
    Discontinue,
}

impl OrderAction {
    /// Returns the canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::New => "NEW",
            OrderAction::Revise => "REVISE",
            OrderAction::Discontinue => "DISCONTINUE",
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderAction {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(OrderAction::New),
            "REVISE" => Ok(OrderAction::Revise),
            "DISCONTINUE" => Ok(OrderAction::Discontinue),
            _ => Err(ModelError::UnknownOrderAction(s.to_string())),
        }
    }
}

// =============================================================================
// Dosing
// =============================================================================

/// Dosing instructions carried by drug orders.
///
/// The engine never inspects these; they travel with the order so callers can
/// render the resolved prescriptions.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrugDosing {
    /// Drug display name.
    pub drug_name: String,
    /// Dose per administration.
    pub dose: Option<f64>,
    /// Units of the dose (e.g. "mg").
    pub dose_units: Option<String>,
    /// Administration frequency (e.g. "Twice a day").
    pub frequency: Option<String>,
    /// Route of administration (e.g. "Oral").
    pub route: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// A clinical order placed in an encounter.
///
/// `previous_order` is a weak back-reference by identifier: it records which
/// order this one revises or discontinues and never owns it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    /// Order identifier.
    pub id: OrderId,
    /// External UUID of the order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub uuid: String,
    /// Patient the order was written for.
    pub patient_id: PatientId,
    /// Visit of the order's encounter.
    pub visit_id: VisitId,
    /// Encounter the order was written in.
    pub encounter_id: EncounterId,
    /// Ordered concept.
    pub concept_id: ConceptId,
    /// Order type discriminator.
    #[cfg_attr(feature = "serde", serde(default))]
    pub order_type: OrderType,
    /// Order action.
    #[cfg_attr(feature = "serde", serde(default))]
    pub action: OrderAction,
    /// Order this one revises or discontinues.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub previous_order: Option<OrderId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Start of the activation window.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub activated_at: Option<DateTime<Utc>>,
    /// End of the activation window.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub stopped_at: Option<DateTime<Utc>>,
    /// Dosing instructions for drug orders.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub dosing: Option<DrugDosing>,
}

impl Order {
    /// Starts building an order with its identity and placement.
    pub fn builder(
        id: OrderId,
        patient_id: PatientId,
        visit_id: VisitId,
        encounter_id: EncounterId,
        concept_id: ConceptId,
    ) -> OrderBuilder {
        OrderBuilder {
            order: Order {
                id,
                uuid: String::new(),
                patient_id,
                visit_id,
                encounter_id,
                concept_id,
                order_type: OrderType::drug_order(),
                action: OrderAction::New,
                previous_order: None,
                created_at: DateTime::<Utc>::default(),
                activated_at: None,
                stopped_at: None,
                dosing: None,
            },
        }
    }

    /// Returns true for discontinuation records.
    pub fn is_discontinue(&self) -> bool {
        self.action == OrderAction::Discontinue
    }

    /// Returns true if this order points back at `other`.
    pub fn follows(&self, other: &Order) -> bool {
        self.previous_order == Some(other.id)
    }

    /// Returns true if both orders were written in the same encounter.
    pub fn same_encounter(&self, other: &Order) -> bool {
        self.encounter_id == other.encounter_id
    }
}

/// Builder for [`Order`].
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    order: Order,
}

impl OrderBuilder {
    /// Sets the external UUID.
    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.order.uuid = uuid.into();
        self
    }

    /// Sets the order type (defaults to the drug order type).
    pub fn order_type(mut self, order_type: OrderType) -> Self {
        self.order.order_type = order_type;
        self
    }

    /// Sets the action (defaults to NEW).
    pub fn action(mut self, action: OrderAction) -> Self {
        self.order.action = action;
        self
    }

    /// Links the order to the one it revises or discontinues.
    pub fn previous_order(mut self, previous: OrderId) -> Self {
        self.order.previous_order = Some(previous);
        self
    }

    /// Sets the creation timestamp.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.order.created_at = created_at;
        self
    }

    /// Sets the activation window.
    pub fn active_between(
        mut self,
        activated_at: DateTime<Utc>,
        stopped_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.order.activated_at = Some(activated_at);
        self.order.stopped_at = stopped_at;
        self
    }

    /// Attaches dosing instructions.
    pub fn dosing(mut self, dosing: DrugDosing) -> Self {
        self.order.dosing = Some(dosing);
        self
    }

    /// Builds the order.
    pub fn build(self) -> Order {
        self.order
    }
}
