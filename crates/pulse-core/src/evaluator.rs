use crate::error::QueryError;
use crate::metric::{MetricId, MetricValue};
use crate::source::QuerySource;

/// Computes one metric from one logical query.
///
/// Evaluators are stateless: the only side effect of
/// [`evaluate`](Evaluator::evaluate) is the query it sends. They must not
/// retry or swallow failures; the collector decides what a failure means.
///
/// Evaluators are registered with [`crate::registry::MetricRegistry`], which
/// tags any error with the metric id.
pub trait Evaluator {
    /// The metric this evaluator produces.
    fn id(&self) -> MetricId;

    /// Run the query and shape its rows into the metric's declared value.
    fn evaluate(&self, source: &mut dyn QuerySource) -> Result<MetricValue, QueryError>;
}
