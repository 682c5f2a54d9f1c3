//! Metrics engine: load -> resolve -> coerce -> aggregate
//!
//! Stateless between calls. Each [`MetricsEngine::compute`] loads its own
//! dataset snapshot, so concurrent callers share nothing mutable.

use crate::aggregate::{RegionAggregator, RegionReport};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::loader::{DatasetLoader, LoaderConfig};
use crate::request::MetricsRequest;
use crate::schema::{ResolvedSchema, SchemaResolver};

#[derive(Debug, Clone)]
pub struct MetricsEngine {
    loader: DatasetLoader,
    resolver: SchemaResolver,
}

impl MetricsEngine {
    pub fn new(loader: DatasetLoader, resolver: SchemaResolver) -> Self {
        Self { loader, resolver }
    }

    /// Engine over `config` with the built-in field rules
    pub fn with_default_rules(config: LoaderConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            DatasetLoader::new(config),
            SchemaResolver::with_default_rules()?,
        ))
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    pub fn resolver(&self) -> &SchemaResolver {
        &self.resolver
    }

    /// Full request: a mapping for every requested region, or one error
    ///
    /// # Errors
    /// `InvalidRequest` for a non-finite threshold, `Load` and `Schema` as
    /// raised by the loader and resolver. Nothing is retried.
    pub fn compute(&self, request: &MetricsRequest) -> Result<RegionReport> {
        request.validate()?;
        let dataset = self.loader.load()?;
        self.compute_on(&dataset, request)
    }

    /// Same as [`compute`](Self::compute) over an already-loaded dataset
    pub fn compute_on(&self, dataset: &Dataset, request: &MetricsRequest) -> Result<RegionReport> {
        request.validate()?;
        let schema = self.resolver.resolve(dataset)?;
        let report = RegionAggregator::new(request.threshold_ms).aggregate_dataset(
            dataset,
            &schema,
            &request.regions,
        );

        tracing::info!(
            "Computed metrics for {} regions over {} records (threshold {}ms)",
            report.len(),
            dataset.len(),
            request.threshold_ms
        );
        Ok(report)
    }

    /// Load the dataset and report which fields were chosen
    pub fn inspect(&self) -> Result<(ResolvedSchema, usize)> {
        let dataset = self.loader.load()?;
        let schema = self.resolver.resolve(&dataset)?;
        Ok((schema, dataset.len()))
    }
}
