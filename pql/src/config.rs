//! Configuration for query evaluation.

/// Configuration for a [`QueryEvaluator`](crate::evaluator::QueryEvaluator).
///
/// # Example
///
/// ```rust
/// use pql::config::EvaluatorConfig;
///
/// let config = EvaluatorConfig::builder()
///     .with_cache_capacity(4096)
///     .build();
/// assert_eq!(config.cache_capacity, 4096);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    /// Maximum number of memoised lookups each on-demand evaluator keeps.
    pub cache_capacity: usize,
}

impl EvaluatorConfig {
    pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

    /// Creates a new builder for EvaluatorConfig.
    pub fn builder() -> EvaluatorConfigBuilder {
        EvaluatorConfigBuilder::default()
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Builder for EvaluatorConfig.
#[derive(Debug, Clone, Default)]
pub struct EvaluatorConfigBuilder {
    cache_capacity: Option<usize>,
}

impl EvaluatorConfigBuilder {
    /// Sets the per-evaluator cache capacity. Zero is raised to one.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Builds the EvaluatorConfig.
    pub fn build(self) -> EvaluatorConfig {
        EvaluatorConfig {
            cache_capacity: self
                .cache_capacity
                .unwrap_or(EvaluatorConfig::DEFAULT_CACHE_CAPACITY),
        }
    }
}
