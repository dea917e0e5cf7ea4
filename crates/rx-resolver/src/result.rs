//! Result types for order resolution.

use std::fmt;
use std::time::Duration;

use rx_model::{Order, OrderId, Visit, VisitId};

/// Reportable orders, most recent visit first, with resolution statistics.
///
/// # Example
///
/// ```ignore
/// let result = resolver.resolve_prescribed_orders(1001, Some(true), None)?;
///
/// println!("{} active prescriptions", result.count());
/// for order in result.iter() {
///     println!("order {} for concept {}", order.id, order.concept_id);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolvedOrders {
    /// Reportable orders in deterministic order.
    pub orders: Vec<Order>,
    /// Resolution statistics.
    pub stats: ResolutionStats,
}

impl ResolvedOrders {
    /// Creates a new result.
    pub fn new(orders: Vec<Order>, stats: ResolutionStats) -> Self {
        Self { orders, stats }
    }

    /// Returns the number of reportable orders.
    pub fn count(&self) -> usize {
        self.orders.len()
    }

    /// Returns true if nothing is reportable.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Checks if an order is in the result.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.iter().any(|o| o.id == order_id)
    }

    /// Returns an iterator over the orders.
    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    /// Identifiers of the orders, in result order.
    pub fn ids(&self) -> Vec<OrderId> {
        self.orders.iter().map(|o| o.id).collect()
    }

    /// Drops the statistics.
    pub fn into_orders(self) -> Vec<Order> {
        self.orders
    }
}

impl IntoIterator for ResolvedOrders {
    type Item = Order;
    type IntoIter = std::vec::IntoIter<Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResolvedOrders {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

/// Visits that hold at least one reportable order, most recent first.
#[derive(Debug, Clone, Default)]
pub struct ResolvedVisits {
    /// Qualifying visits.
    pub visits: Vec<Visit>,
    /// Resolution statistics.
    pub stats: ResolutionStats,
}

impl ResolvedVisits {
    /// Creates a new result.
    pub fn new(visits: Vec<Visit>, stats: ResolutionStats) -> Self {
        Self { visits, stats }
    }

    /// Returns the number of visits.
    pub fn count(&self) -> usize {
        self.visits.len()
    }

    /// Returns true if no visit qualified.
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Identifiers of the visits, in result order.
    pub fn ids(&self) -> Vec<VisitId> {
        self.visits.iter().map(|v| v.id).collect()
    }

    /// Drops the statistics.
    pub fn into_visits(self) -> Vec<Visit> {
        self.visits
    }
}

impl IntoIterator for ResolvedVisits {
    type Item = Visit;
    type IntoIter = std::vec::IntoIter<Visit>;

    fn into_iter(self) -> Self::IntoIter {
        self.visits.into_iter()
    }
}

/// Statistics from one resolution call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Visits in the window the orders were collected from.
    pub visits_in_window: usize,
    /// Distinct candidate orders handed to the revision resolver.
    pub candidates: usize,
    /// Orders replaced by a same-encounter revision.
    pub revised_in_encounter: usize,
    /// Orders stopped by a discontinuation.
    pub discontinued: usize,
    /// Discontinuation records removed.
    pub discontinue_records: usize,
    /// Records returned to the caller.
    pub returned: usize,
    /// Total call duration.
    pub duration: Duration,
}

impl ResolutionStats {
    /// Number of candidates that did not make it into the result.
    pub fn dropped(&self) -> usize {
        self.revised_in_encounter + self.discontinued + self.discontinue_records
    }
}

impl fmt::Display for ResolutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} visits, {} candidates, {} returned ({} revised, {} discontinued, {} stop records) in {:?}",
            self.visits_in_window,
            self.candidates,
            self.returned,
            self.revised_in_encounter,
            self.discontinued,
            self.discontinue_records,
            self.duration
        )
    }
}
