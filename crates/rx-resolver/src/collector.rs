//! Candidate order collection within a visit window.

use std::collections::HashSet;

use rx_model::{ConceptId, Order, OrderType, Visit, VisitId};

/// Gathers the candidate orders that fall inside a visit window.
///
/// Keeps orders placed in one of the window's visits, optionally of a single
/// order type and for a set of concepts. Actions are never filtered here:
/// a DISCONTINUE record is still needed as a chain node downstream.
pub fn collect_orders<I>(
    window: &[Visit],
    orders: I,
    order_type: Option<&OrderType>,
    concepts: Option<&HashSet<ConceptId>>,
) -> Vec<Order>
where
    I: IntoIterator<Item = Order>,
{
    let visit_ids: HashSet<VisitId> = window.iter().map(|v| v.id).collect();

    orders
        .into_iter()
        .filter(|order| visit_ids.contains(&order.visit_id))
        .filter(|order| order_type.map_or(true, |t| &order.order_type == t))
        .filter(|order| concepts.map_or(true, |set| set.contains(&order.concept_id)))
        .collect()
}
