use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::error::CollectionError;
use crate::evaluator::Evaluator;
use crate::metric::{MetricId, MetricValue};
use crate::metrics::builtin_evaluators;
use crate::source::QuerySource;

/// Maps metric ids to their evaluators, keeping registration order.
pub struct MetricRegistry {
    evaluators: Vec<Box<dyn Evaluator>>,
    index: HashMap<MetricId, usize>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            evaluators: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// A registry holding every built-in metric in display order.
    pub fn builtin() -> Result<Self> {
        Self::from_evaluators(builtin_evaluators())
    }

    /// Register each evaluator in turn; fails on the first duplicate id.
    pub fn from_evaluators(
        evaluators: impl IntoIterator<Item = Box<dyn Evaluator>>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for evaluator in evaluators {
            registry.register(evaluator)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, evaluator: Box<dyn Evaluator>) -> Result<()> {
        let id = evaluator.id();
        if self.index.contains_key(&id) {
            bail!("duplicate metric id: {}", id);
        }
        let idx = self.evaluators.len();
        self.index.insert(id, idx);
        self.evaluators.push(evaluator);
        Ok(())
    }

    pub fn get(&self, id: MetricId) -> Option<&dyn Evaluator> {
        self.index.get(&id).map(|&i| &*self.evaluators[i])
    }

    pub fn contains(&self, id: MetricId) -> bool {
        self.index.contains_key(&id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<MetricId> {
        self.evaluators.iter().map(|e| e.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Evaluate one metric, tagging any failure with its id.
    pub fn evaluate(
        &self,
        id: MetricId,
        source: &mut dyn QuerySource,
    ) -> Result<MetricValue, CollectionError> {
        let evaluator = self.get(id).ok_or(CollectionError::Unregistered(id))?;
        evaluator
            .evaluate(source)
            .map_err(|cause| CollectionError::Query { metric: id, cause })
    }
}
