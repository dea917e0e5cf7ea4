//! Visit window selection.
//!
//! Orders a patient's visit history most-recent first and cuts it down to
//! the window a query runs over.

use std::cmp::Ordering;
use std::collections::HashMap;

use rx_model::{Visit, VisitId};

use crate::config::WindowSpec;

/// Orders visits most-recent first.
///
/// An active visit is still ongoing, so it ranks ahead of every closed one.
/// Otherwise later start timestamps come first, and the higher identifier
/// wins a tie.
pub fn recency_cmp(a: &Visit, b: &Visit) -> Ordering {
    b.is_active()
        .cmp(&a.is_active())
        .then_with(|| b.started_at.cmp(&a.started_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Selects the visit window for a query.
///
/// Active visits are dropped unless `window.include_active` is set, the rest
/// are sorted with [`recency_cmp`], then truncated to `window.visit_limit`.
/// Empty input yields an empty window.
pub fn select_visits<I>(visits: I, window: WindowSpec) -> Vec<Visit>
where
    I: IntoIterator<Item = Visit>,
{
    let mut selected: Vec<Visit> = visits
        .into_iter()
        .filter(|visit| window.include_active || !visit.is_active())
        .collect();

    selected.sort_by(recency_cmp);

    if let Some(limit) = window.visit_limit {
        selected.truncate(limit);
    }

    selected
}

/// Maps each visit in an ordered window to its position (0 = most recent).
pub fn visit_ranks(window: &[Visit]) -> HashMap<VisitId, usize> {
    window
        .iter()
        .enumerate()
        .map(|(rank, visit)| (visit.id, rank))
        .collect()
}
