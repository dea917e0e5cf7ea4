//! Configuration types for the order resolver.

use rx_model::OrderType;

use crate::error::{ResolverError, ResolverResult};

/// Configuration for the order resolver.
///
/// # Example
///
/// ```rust
/// use rx_model::OrderType;
/// use rx_resolver::ResolverConfig;
///
/// let config = ResolverConfig::builder()
///     .with_drug_order_type(OrderType::new("Medication Order"))
///     .with_parallel(true)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Order type treated as "prescribed drug order".
    pub drug_order_type: OrderType,
    /// Resolve patient batches in parallel (requires `parallel` feature).
    pub parallel: bool,
}

impl ResolverConfig {
    /// Creates a new builder for ResolverConfig.
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }
}

/// Builder for ResolverConfig.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfigBuilder {
    drug_order_type: Option<OrderType>,
    parallel: bool,
}

impl ResolverConfigBuilder {
    /// Sets the order type used for prescription queries.
    pub fn with_drug_order_type(mut self, order_type: OrderType) -> Self {
        self.drug_order_type = Some(order_type);
        self
    }

    /// Enables or disables parallel batch resolution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builds the ResolverConfig.
    pub fn build(self) -> ResolverConfig {
        ResolverConfig {
            drug_order_type: self.drug_order_type.unwrap_or_default(),
            parallel: self.parallel,
        }
    }
}

/// Validated visit window parameters.
///
/// The active-visit flag arrives as a tri-state from callers; "unspecified"
/// behaves exactly like `false`, so it is collapsed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSpec {
    /// Include the patient's active visit in the window.
    pub include_active: bool,
    /// Keep only the N most recent visits (None = unbounded).
    pub visit_limit: Option<usize>,
}

impl WindowSpec {
    /// Creates a window spec from already-validated values.
    pub fn new(include_active: bool, visit_limit: Option<usize>) -> Self {
        Self {
            include_active,
            visit_limit,
        }
    }

    /// Validates raw caller parameters.
    ///
    /// A zero or negative `visit_limit` is rejected; `None` means unbounded.
    pub fn from_request(
        include_active: Option<bool>,
        visit_limit: Option<i64>,
    ) -> ResolverResult<Self> {
        let visit_limit = match visit_limit {
            None => None,
            Some(limit) if limit <= 0 => {
                return Err(ResolverError::invalid_argument(
                    "visit_limit",
                    format!("must be positive, got {limit}"),
                ));
            }
            Some(limit) => Some(usize::try_from(limit).unwrap_or(usize::MAX)),
        };

        Ok(Self {
            include_active: include_active.unwrap_or(false),
            visit_limit,
        })
    }

    /// Same window without the count limit.
    pub fn unbounded(self) -> Self {
        Self {
            visit_limit: None,
            ..self
        }
    }
}
