//! Order resolver implementation.

use std::collections::HashSet;
use std::time::Instant;

use rx_model::{ConceptId, Order, OrderType, PatientId, Visit, VisitId};

use crate::collector::collect_orders;
use crate::config::{ResolverConfig, WindowSpec};
use crate::error::{ResolverError, ResolverResult};
use crate::resolver::resolve_revisions;
use crate::result::{ResolutionStats, ResolvedOrders, ResolvedVisits};
use crate::selector::{recency_cmp, select_visits};
use crate::traits::RecordSource;

/// Main resolution engine.
///
/// The resolver fetches a patient's records through any [`RecordSource`],
/// cuts them down to a visit window, and resolves revision chains into the
/// reportable prescription set.
///
/// Every call works on call-local state only, so one resolver can serve many
/// threads at once.
///
/// # Example
///
/// ```ignore
/// use rx_resolver::OrderResolver;
///
/// // Assumes store implements RecordSource
/// let resolver = OrderResolver::new(&store);
///
/// // Prescriptions from the two most recent closed visits
/// let result = resolver.resolve_prescribed_orders(1001, Some(false), Some(2))?;
/// println!("{} prescriptions ({})", result.count(), result.stats);
///
/// // Most recent visit with lab orders, active visit included
/// let visits = resolver.resolve_visits_with_orders(1001, &"Lab Order".into(), Some(true), Some(1))?;
/// ```
pub struct OrderResolver<'a> {
    /// Reference to the record source.
    source: &'a dyn RecordSource,
    /// Resolver configuration.
    config: ResolverConfig,
}

impl<'a> OrderResolver<'a> {
    /// Creates a new resolver with default configuration.
    pub fn new(source: &'a dyn RecordSource) -> Self {
        Self {
            source,
            config: ResolverConfig::default(),
        }
    }

    /// Creates a resolver with custom configuration.
    pub fn with_config(source: &'a dyn RecordSource, config: ResolverConfig) -> Self {
        Self { source, config }
    }

    /// Returns a reference to the resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves the patient's prescribed drug orders within a visit window.
    ///
    /// # Arguments
    ///
    /// * `patient` - Patient to resolve for
    /// * `include_active` - Include the active visit (`None` behaves as `false`)
    /// * `visit_limit` - Keep only the N most recent visits (`None` = all)
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `visit_limit` is zero or negative
    /// * `UpstreamFetchFailure` - the record source failed
    pub fn resolve_prescribed_orders(
        &self,
        patient: PatientId,
        include_active: Option<bool>,
        visit_limit: Option<i64>,
    ) -> ResolverResult<ResolvedOrders> {
        let window = WindowSpec::from_request(include_active, visit_limit)?;
        self.resolve_in_window(patient, window, None)
    }

    /// Resolves prescribed drug orders restricted to a set of concepts.
    ///
    /// The concept filter is applied before revision chains are resolved, so
    /// a revision whose predecessor was ordered for another concept counts as
    /// standalone. `None` means no concept filter.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `visit_limit` is zero or negative, or `concepts`
    ///   is an empty slice
    /// * `UpstreamFetchFailure` - the record source failed
    pub fn resolve_prescribed_orders_for_concepts(
        &self,
        patient: PatientId,
        include_active: Option<bool>,
        visit_limit: Option<i64>,
        concepts: Option<&[ConceptId]>,
    ) -> ResolverResult<ResolvedOrders> {
        let window = WindowSpec::from_request(include_active, visit_limit)?;
        let concepts: Option<HashSet<ConceptId>> = match concepts {
            None => None,
            Some([]) => {
                return Err(ResolverError::invalid_argument(
                    "concepts",
                    "must not be empty; pass None to disable the concept filter",
                ));
            }
            Some(ids) => Some(ids.iter().copied().collect()),
        };
        self.resolve_in_window(patient, window, concepts.as_ref())
    }

    /// Resolves the most recent visits that hold orders of `order_type`.
    ///
    /// Visits are filtered on "has at least one reportable order" before the
    /// count limit is applied, so the result is the N most recent visits
    /// *with* such orders rather than the N most recent visits overall.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `visit_limit` is zero or negative
    /// * `UpstreamFetchFailure` - the record source failed
    pub fn resolve_visits_with_orders(
        &self,
        patient: PatientId,
        order_type: &OrderType,
        include_active: Option<bool>,
        visit_limit: Option<i64>,
    ) -> ResolverResult<ResolvedVisits> {
        let start = Instant::now();
        let window = WindowSpec::from_request(include_active, visit_limit)?;

        let history = select_visits(self.fetch_visits(patient)?, window.unbounded());
        let orders = self.fetch_orders(patient, &history, order_type)?;
        let candidates = collect_orders(&history, orders, Some(order_type), None);
        let resolved = resolve_revisions(candidates, &history);

        let with_orders: HashSet<VisitId> = resolved.orders.iter().map(|o| o.visit_id).collect();
        let mut visits: Vec<Visit> = history
            .into_iter()
            .filter(|visit| with_orders.contains(&visit.id))
            .collect();
        visits.sort_by(recency_cmp);
        if let Some(limit) = window.visit_limit {
            visits.truncate(limit);
        }

        let stats = ResolutionStats {
            returned: visits.len(),
            duration: start.elapsed(),
            ..resolved.stats
        };
        tracing::debug!(
            patient,
            order_type = %order_type,
            visits_in_window = stats.visits_in_window,
            candidates = stats.candidates,
            returned = stats.returned,
            "resolved visits with orders"
        );

        Ok(ResolvedVisits::new(visits, stats))
    }

    /// Resolves prescribed drug orders for several patients.
    ///
    /// Parameters are validated once for the whole batch. Each patient gets
    /// its own result, in input order, so one failing fetch does not hide the
    /// others. With the `parallel` feature and `config.parallel` set, patients
    /// are resolved on the rayon thread pool.
    pub fn resolve_prescribed_orders_for_patients(
        &self,
        patients: &[PatientId],
        include_active: Option<bool>,
        visit_limit: Option<i64>,
    ) -> ResolverResult<Vec<(PatientId, ResolverResult<ResolvedOrders>)>> {
        let window = WindowSpec::from_request(include_active, visit_limit)?;

        #[cfg(feature = "parallel")]
        {
            if self.config.parallel {
                use rayon::prelude::*;
                return Ok(patients
                    .par_iter()
                    .map(|&patient| (patient, self.resolve_in_window(patient, window, None)))
                    .collect());
            }
        }

        Ok(patients
            .iter()
            .map(|&patient| (patient, self.resolve_in_window(patient, window, None)))
            .collect())
    }

    /// Runs selector, collector and revision resolver for drug orders.
    fn resolve_in_window(
        &self,
        patient: PatientId,
        window: WindowSpec,
        concepts: Option<&HashSet<ConceptId>>,
    ) -> ResolverResult<ResolvedOrders> {
        let start = Instant::now();
        let drug_order_type = &self.config.drug_order_type;

        let visits = select_visits(self.fetch_visits(patient)?, window);
        let orders = self.fetch_orders(patient, &visits, drug_order_type)?;
        let candidates = collect_orders(&visits, orders, Some(drug_order_type), concepts);

        let mut resolved = resolve_revisions(candidates, &visits);
        resolved.stats.duration = start.elapsed();

        tracing::debug!(
            patient,
            include_active = window.include_active,
            visit_limit = ?window.visit_limit,
            concept_filter = ?concepts.map(HashSet::len),
            visits_in_window = resolved.stats.visits_in_window,
            candidates = resolved.stats.candidates,
            returned = resolved.stats.returned,
            "resolved prescribed orders"
        );

        Ok(resolved)
    }

    fn fetch_visits(&self, patient: PatientId) -> ResolverResult<Vec<Visit>> {
        self.source
            .visits_for_patient(patient)
            .map_err(ResolverError::UpstreamFetchFailure)
    }

    fn fetch_orders(
        &self,
        patient: PatientId,
        window: &[Visit],
        order_type: &OrderType,
    ) -> ResolverResult<Vec<Order>> {
        if window.is_empty() {
            return Ok(Vec::new());
        }
        let visit_ids: Vec<VisitId> = window.iter().map(|v| v.id).collect();
        self.source
            .orders_for_visits(patient, &visit_ids, Some(order_type))
            .map_err(ResolverError::UpstreamFetchFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SourceError;
    use chrono::{DateTime, TimeZone, Utc};
    use rx_model::OrderAction;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap()
    }

    /// Mock source holding one patient's records.
    struct MockSource {
        visits: Vec<Visit>,
        orders: Vec<Order>,
        order_fetches: AtomicUsize,
    }

    impl MockSource {
        fn new() -> Self {
            let visits = vec![
                Visit::new(1, 1001, ts(1)).stopped(ts(2)),
                Visit::new(2, 1001, ts(5)).stopped(ts(6)),
                Visit::new(3, 1001, ts(9)),
            ];
            let orders = vec![
                Order::builder(15, 1001, 1, 10, 24).created_at(ts(1)).build(),
                Order::builder(16, 1001, 1, 10, 24)
                    .action(OrderAction::Revise)
                    .previous_order(15)
                    .created_at(ts(1))
                    .build(),
                Order::builder(17, 1001, 2, 20, 25).created_at(ts(5)).build(),
                Order::builder(19, 1001, 3, 30, 27).created_at(ts(9)).build(),
                Order::builder(20, 1001, 1, 10, 40)
                    .order_type(OrderType::new("Lab Order"))
                    .created_at(ts(1))
                    .build(),
            ];
            Self {
                visits,
                orders,
                order_fetches: AtomicUsize::new(0),
            }
        }
    }

    impl RecordSource for MockSource {
        fn visits_for_patient(&self, patient: PatientId) -> Result<Vec<Visit>, SourceError> {
            Ok(self
                .visits
                .iter()
                .filter(|v| v.patient_id == patient)
                .cloned()
                .collect())
        }

        fn orders_for_visits(
            &self,
            patient: PatientId,
            visits: &[VisitId],
            order_type: Option<&OrderType>,
        ) -> Result<Vec<Order>, SourceError> {
            self.order_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .orders
                .iter()
                .filter(|o| o.patient_id == patient && visits.contains(&o.visit_id))
                .filter(|o| order_type.map_or(true, |t| &o.order_type == t))
                .cloned()
                .collect())
        }
    }

    /// Source whose every fetch fails.
    struct FailingSource;

    impl RecordSource for FailingSource {
        fn visits_for_patient(&self, _patient: PatientId) -> Result<Vec<Visit>, SourceError> {
            Err("connection refused".into())
        }

        fn orders_for_visits(
            &self,
            _patient: PatientId,
            _visits: &[VisitId],
            _order_type: Option<&OrderType>,
        ) -> Result<Vec<Order>, SourceError> {
            Err("connection refused".into())
        }
    }

    #[test]
    fn test_prescribed_orders_exclude_active_visit() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let result = resolver.resolve_prescribed_orders(1001, Some(false), None).unwrap();
        assert_eq!(result.ids(), vec![17, 16]);
        assert_eq!(result.stats.visits_in_window, 2);
        assert_eq!(result.stats.revised_in_encounter, 1);
    }

    #[test]
    fn test_prescribed_orders_include_active_visit() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let result = resolver.resolve_prescribed_orders(1001, Some(true), None).unwrap();
        assert_eq!(result.ids(), vec![19, 17, 16]);
    }

    #[test]
    fn test_prescribed_orders_limit() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let result = resolver.resolve_prescribed_orders(1001, None, Some(1)).unwrap();
        assert_eq!(result.ids(), vec![17]);
    }

    #[test]
    fn test_invalid_limit_rejected_before_fetch() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let err = resolver.resolve_prescribed_orders(1001, None, Some(0)).unwrap_err();
        assert!(matches!(err, ResolverError::InvalidArgument { .. }));
        assert_eq!(source.order_fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_concepts_rejected() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let err = resolver
            .resolve_prescribed_orders_for_concepts(1001, Some(true), None, Some(&[]))
            .unwrap_err();
        assert!(matches!(
            err,
            ResolverError::InvalidArgument {
                parameter: "concepts",
                ..
            }
        ));
    }

    #[test]
    fn test_concepts_none_means_no_filter() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let filtered = resolver
            .resolve_prescribed_orders_for_concepts(1001, Some(true), None, None)
            .unwrap();
        let unfiltered = resolver.resolve_prescribed_orders(1001, Some(true), None).unwrap();
        assert_eq!(filtered.ids(), unfiltered.ids());
    }

    #[test]
    fn test_concepts_filter() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let result = resolver
            .resolve_prescribed_orders_for_concepts(1001, Some(true), None, Some(&[24, 27]))
            .unwrap();
        assert_eq!(result.ids(), vec![19, 16]);
    }

    #[test]
    fn test_visits_with_orders() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let lab = OrderType::new("Lab Order");
        let visits = resolver
            .resolve_visits_with_orders(1001, &lab, Some(true), Some(1))
            .unwrap();
        assert_eq!(visits.ids(), vec![1]);

        let drug = OrderType::drug_order();
        let visits = resolver
            .resolve_visits_with_orders(1001, &drug, Some(true), Some(1))
            .unwrap();
        assert_eq!(visits.ids(), vec![3]);
        assert_eq!(visits.stats.returned, 1);
    }

    #[test]
    fn test_unknown_patient_is_empty() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let result = resolver.resolve_prescribed_orders(4242, Some(true), None).unwrap();
        assert!(result.is_empty());
        assert_eq!(source.order_fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_upstream_failure_propagates() {
        let resolver = OrderResolver::new(&FailingSource);

        let err = resolver.resolve_prescribed_orders(1001, None, None).unwrap_err();
        match err {
            ResolverError::UpstreamFetchFailure(source) => {
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_custom_drug_order_type() {
        let source = MockSource::new();
        let config = ResolverConfig::builder()
            .with_drug_order_type(OrderType::new("Lab Order"))
            .build();
        let resolver = OrderResolver::with_config(&source, config);

        let result = resolver.resolve_prescribed_orders(1001, Some(true), None).unwrap();
        assert_eq!(result.ids(), vec![20]);
        assert_eq!(resolver.config().drug_order_type.as_str(), "Lab Order");
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let results = resolver
            .resolve_prescribed_orders_for_patients(&[4242, 1001], Some(true), None)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 4242);
        assert!(results[0].1.as_ref().unwrap().is_empty());
        assert_eq!(results[1].1.as_ref().unwrap().ids(), vec![19, 17, 16]);
    }

    #[test]
    fn test_batch_rejects_invalid_limit() {
        let source = MockSource::new();
        let resolver = OrderResolver::new(&source);

        let err = resolver
            .resolve_prescribed_orders_for_patients(&[1001], None, Some(-3))
            .unwrap_err();
        assert!(matches!(err, ResolverError::InvalidArgument { .. }));
    }
}
