//! Revision chain resolution.
//!
//! Orders form chains through their `previous_order` back-reference. This
//! module indexes a set of candidate orders by identifier, builds the reverse
//! (successor) index, and decides which orders are still reportable
//! prescriptions.
//!
//! Rules, applied to every adjacent pair A ← B (B.previous_order == A) whose
//! members are both present:
//!
//! | Successor B | Encounter | Outcome |
//! |-------------|-----------|---------|
//! | DISCONTINUE | any | A dropped |
//! | REVISE | same as A | A dropped, B kept |
//! | REVISE | different | both kept |
//!
//! DISCONTINUE orders are never reported. A predecessor that is not among
//! the candidates is simply absent; its successor is treated as standalone.

use std::collections::{HashMap, HashSet};

use rx_model::{Order, OrderAction, OrderId, Visit};

use crate::result::{ResolutionStats, ResolvedOrders};
use crate::selector::visit_ranks;

/// Why an order is, or is not, reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Still an active prescription within the window.
    Reportable,
    /// A discontinuation record; never a prescription itself.
    DiscontinueRecord,
    /// Stopped by a later DISCONTINUE order.
    Discontinued {
        /// The discontinuing order.
        by: OrderId,
    },
    /// Replaced by a revision written in the same encounter.
    RevisedInEncounter {
        /// The revising order.
        by: OrderId,
    },
}

impl Disposition {
    /// Returns true if the order belongs in the result.
    pub fn is_reportable(&self) -> bool {
        matches!(self, Disposition::Reportable)
    }
}

/// Identifier arena plus successor index over one set of candidate orders.
///
/// Duplicate identities collapse to the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct RevisionIndex {
    arena: HashMap<OrderId, Order>,
    successors: HashMap<OrderId, Vec<OrderId>>,
}

impl RevisionIndex {
    /// Builds the index from candidate orders.
    pub fn build<I>(orders: I) -> Self
    where
        I: IntoIterator<Item = Order>,
    {
        let mut arena: HashMap<OrderId, Order> = HashMap::new();
        for order in orders {
            arena.entry(order.id).or_insert(order);
        }

        let mut successors: HashMap<OrderId, Vec<OrderId>> = HashMap::new();
        for order in arena.values() {
            if let Some(previous) = order.previous_order {
                if previous != order.id && arena.contains_key(&previous) {
                    successors.entry(previous).or_default().push(order.id);
                }
            }
        }
        for ids in successors.values_mut() {
            ids.sort_unstable();
        }

        Self { arena, successors }
    }

    /// Returns the number of distinct orders indexed.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns true if nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Looks up an order by identifier.
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.arena.get(&id)
    }

    /// Orders that name `id` as their predecessor.
    pub fn successors(&self, id: OrderId) -> &[OrderId] {
        self.successors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The indexed predecessor of `id`, if it is among the candidates.
    pub fn predecessor(&self, id: OrderId) -> Option<&Order> {
        self.arena
            .get(&id)
            .and_then(|order| order.previous_order)
            .filter(|previous| *previous != id)
            .and_then(|previous| self.arena.get(&previous))
    }

    /// Returns true if no indexed order supersedes `id`.
    pub fn is_terminal(&self, id: OrderId) -> bool {
        self.successors(id).is_empty()
    }

    /// Partitions the indexed orders into revision chains, each oldest first.
    ///
    /// Chains are listed by their root identifier.
    pub fn chains(&self) -> Vec<Vec<OrderId>> {
        let mut starts: Vec<OrderId> = self
            .arena
            .keys()
            .copied()
            .filter(|id| self.predecessor(*id).is_none())
            .collect();
        starts.sort_unstable();

        let mut remaining: Vec<OrderId> = self.arena.keys().copied().collect();
        remaining.sort_unstable();

        let mut visited: HashSet<OrderId> = HashSet::with_capacity(self.arena.len());
        let mut chains = Vec::new();

        // Orders on a malformed loop have no root; they are picked up last.
        for start in starts.into_iter().chain(remaining) {
            if visited.contains(&start) {
                continue;
            }
            let mut chain = Vec::new();
            let mut stack = vec![start];
            while let Some(current) = stack.pop() {
                if !visited.insert(current) {
                    continue;
                }
                chain.push(current);
                stack.extend(self.successors(current).iter().rev().copied());
            }
            chains.push(chain);
        }

        chains
    }

    /// Decides whether an indexed order is reportable.
    pub fn disposition(&self, order: &Order) -> Disposition {
        if order.is_discontinue() {
            return Disposition::DiscontinueRecord;
        }

        let successors = self.successors(order.id);
        if successors.len() > 1 {
            tracing::warn!(
                order_id = order.id,
                successors = ?successors,
                "order has more than one direct successor"
            );
        }

        for successor in successors.iter().filter_map(|id| self.arena.get(id)) {
            match successor.action {
                OrderAction::Discontinue => {
                    return Disposition::Discontinued { by: successor.id };
                }
                OrderAction::Revise | OrderAction::New => {
                    if successor.same_encounter(order) {
                        return Disposition::RevisedInEncounter { by: successor.id };
                    }
                }
            }
        }

        Disposition::Reportable
    }
}

/// Resolves candidate orders into the reportable prescription set.
///
/// The result is sorted by the recency of each order's visit within `window`
/// (orders outside it last), then creation time, then identifier.
pub fn resolve_revisions<I>(orders: I, window: &[Visit]) -> ResolvedOrders
where
    I: IntoIterator<Item = Order>,
{
    let index = RevisionIndex::build(orders);
    let mut stats = ResolutionStats {
        visits_in_window: window.len(),
        candidates: index.len(),
        ..ResolutionStats::default()
    };

    let mut reportable: Vec<&Order> = Vec::with_capacity(index.len());
    for order in index.arena.values() {
        match index.disposition(order) {
            Disposition::Reportable => reportable.push(order),
            Disposition::DiscontinueRecord => stats.discontinue_records += 1,
            Disposition::Discontinued { by } => {
                tracing::trace!(order_id = order.id, by, "dropping discontinued order");
                stats.discontinued += 1;
            }
            Disposition::RevisedInEncounter { by } => {
                tracing::trace!(order_id = order.id, by, "dropping same-encounter revision");
                stats.revised_in_encounter += 1;
            }
        }
    }

    let ranks = visit_ranks(window);
    reportable.sort_by_key(|order| {
        (
            ranks.get(&order.visit_id).copied().unwrap_or(usize::MAX),
            order.created_at,
            order.id,
        )
    });

    let orders: Vec<Order> = reportable.into_iter().cloned().collect();
    stats.returned = orders.len();
    ResolvedOrders::new(orders, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn ts(day: u32, minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn new_order(id: OrderId, visit: u64, encounter: u64, day: u32, minute: i64) -> Order {
        Order::builder(id, 1001, visit, encounter, 100 + id)
            .created_at(ts(day, minute))
            .build()
    }

    fn follow_up(
        id: OrderId,
        previous: OrderId,
        action: OrderAction,
        visit: u64,
        encounter: u64,
        day: u32,
        minute: i64,
    ) -> Order {
        Order::builder(id, 1001, visit, encounter, 100 + previous)
            .action(action)
            .previous_order(previous)
            .created_at(ts(day, minute))
            .build()
    }

    fn window() -> Vec<Visit> {
        vec![
            Visit::new(3, 1001, ts(9, 0)),
            Visit::new(2, 1001, ts(5, 0)).stopped(ts(6, 0)),
            Visit::new(1, 1001, ts(1, 0)).stopped(ts(2, 0)),
        ]
    }

    fn resolved_ids(orders: Vec<Order>) -> Vec<OrderId> {
        resolve_revisions(orders, &window())
            .orders
            .iter()
            .map(|o| o.id)
            .collect()
    }

    #[test]
    fn test_same_encounter_revision_collapses() {
        let orders = vec![
            new_order(15, 1, 10, 1, 0),
            follow_up(16, 15, OrderAction::Revise, 1, 10, 1, 5),
        ];
        assert_eq!(resolved_ids(orders), vec![16]);
    }

    #[test]
    fn test_cross_encounter_revision_keeps_both() {
        let orders = vec![
            new_order(15, 1, 10, 1, 0),
            follow_up(16, 15, OrderAction::Revise, 2, 20, 5, 0),
        ];
        assert_eq!(resolved_ids(orders), vec![16, 15]);
    }

    #[test]
    fn test_discontinue_drops_predecessor_and_itself() {
        let orders = vec![
            new_order(14, 1, 10, 1, 0),
            new_order(15, 1, 10, 1, 1),
            follow_up(17, 14, OrderAction::Discontinue, 2, 20, 5, 0),
            new_order(18, 2, 20, 5, 1),
        ];
        let result = resolve_revisions(orders, &window());

        let ids: Vec<OrderId> = result.orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![18, 15]);
        assert_eq!(result.stats.discontinued, 1);
        assert_eq!(result.stats.discontinue_records, 1);
        assert_eq!(result.stats.returned, 2);
        assert_eq!(result.stats.candidates, 4);
    }

    #[test]
    fn test_discontinue_with_missing_predecessor_is_still_excluded() {
        let orders = vec![follow_up(17, 4, OrderAction::Discontinue, 2, 20, 5, 0)];
        assert!(resolved_ids(orders).is_empty());
    }

    #[test]
    fn test_revision_with_missing_predecessor_is_standalone() {
        let orders = vec![follow_up(16, 4, OrderAction::Revise, 2, 20, 5, 0)];
        assert_eq!(resolved_ids(orders), vec![16]);
    }

    #[test]
    fn test_long_chain_evaluates_each_pair() {
        // 20 -> 21 same encounter, 21 -> 22 next visit, 22 -> 23 same encounter
        let orders = vec![
            new_order(20, 1, 10, 1, 0),
            follow_up(21, 20, OrderAction::Revise, 1, 10, 1, 1),
            follow_up(22, 21, OrderAction::Revise, 2, 20, 5, 0),
            follow_up(23, 22, OrderAction::Revise, 2, 20, 5, 1),
        ];
        assert_eq!(resolved_ids(orders), vec![23, 21]);
    }

    #[test]
    fn test_represcribed_after_discontinue_is_separate_chain() {
        let orders = vec![
            new_order(30, 1, 10, 1, 0),
            follow_up(31, 30, OrderAction::Discontinue, 2, 20, 5, 0),
            new_order(32, 3, 30, 9, 0),
        ];
        let index = RevisionIndex::build(orders.clone());
        assert_eq!(index.chains(), vec![vec![30, 31], vec![32]]);
        assert_eq!(resolved_ids(orders), vec![32]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let order = new_order(15, 1, 10, 1, 0);
        let result = resolve_revisions(vec![order.clone(), order], &window());
        assert_eq!(result.orders.len(), 1);
        assert_eq!(result.stats.candidates, 1);
    }

    #[test]
    fn test_sorted_by_visit_then_created_then_id() {
        let orders = vec![
            new_order(40, 1, 10, 1, 0),
            new_order(42, 3, 30, 9, 5),
            new_order(41, 3, 30, 9, 5),
            new_order(43, 3, 30, 9, 1),
            new_order(44, 2, 20, 5, 0),
            new_order(45, 8, 80, 1, 0),
        ];
        assert_eq!(resolved_ids(orders), vec![43, 41, 42, 44, 40, 45]);
    }

    #[test]
    fn test_deterministic() {
        let orders = vec![
            new_order(15, 1, 10, 1, 0),
            follow_up(16, 15, OrderAction::Revise, 2, 20, 5, 0),
            new_order(17, 2, 20, 5, 0),
            new_order(19, 3, 30, 9, 0),
        ];
        let mut reversed = orders.clone();
        reversed.reverse();
        assert_eq!(resolved_ids(orders), resolved_ids(reversed));
    }

    #[test]
    fn test_branching_successors_drop_predecessor() {
        let orders = vec![
            new_order(50, 1, 10, 1, 0),
            follow_up(51, 50, OrderAction::Revise, 2, 20, 5, 0),
            follow_up(52, 50, OrderAction::Discontinue, 2, 20, 5, 1),
        ];
        let index = RevisionIndex::build(orders.clone());
        assert_eq!(index.successors(50), &[51, 52]);
        assert_eq!(resolved_ids(orders), vec![51]);
    }

    #[test]
    fn test_index_accessors() {
        let orders = vec![
            new_order(15, 1, 10, 1, 0),
            follow_up(16, 15, OrderAction::Revise, 1, 10, 1, 5),
        ];
        let index = RevisionIndex::build(orders);

        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert!(index.is_terminal(16));
        assert!(!index.is_terminal(15));
        assert_eq!(index.predecessor(16).map(|o| o.id), Some(15));
        assert!(index.predecessor(15).is_none());
        assert_eq!(
            index.disposition(index.get(15).unwrap()),
            Disposition::RevisedInEncounter { by: 16 }
        );
        assert!(index.disposition(index.get(16).unwrap()).is_reportable());
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let order = Order::builder(60, 1001, 1, 10, 100)
            .action(OrderAction::Revise)
            .previous_order(60)
            .build();
        let index = RevisionIndex::build(vec![order]);
        assert!(index.is_terminal(60));
        assert_eq!(index.chains(), vec![vec![60]]);
    }
}
