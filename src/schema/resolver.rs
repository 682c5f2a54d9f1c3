use crate::dataset::{Dataset, Value};
use crate::error::{RuleError, SchemaError};
use crate::schema::rules::{FieldRole, RulePack};
use serde::Serialize;
use std::fmt;

/// Uptime assumed for every record when the dataset has no uptime field
pub const DEFAULT_UPTIME: f64 = 1.0;

/// Where uptime values come from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UptimeSource {
    /// A real dataset field
    Field(String),
    /// No uptime-like field exists; every record gets this constant
    Synthesized(f64),
}

/// Typed result of field discovery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSchema {
    pub region: String,
    pub latency: String,
    pub uptime: UptimeSource,
}

impl fmt::Display for ResolvedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "region:  {}", self.region)?;
        writeln!(f, "latency: {}", self.latency)?;
        match &self.uptime {
            UptimeSource::Field(name) => write!(f, "uptime:  {}", name),
            UptimeSource::Synthesized(v) => write!(f, "uptime:  <synthesized {}>", v),
        }
    }
}

/// Resolved fields after coercion, one entry per record
///
/// Missing values are `None`; they are never substituted with zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryColumns {
    pub region: Vec<Option<String>>,
    pub latency: Vec<Option<f64>>,
    pub uptime: Vec<Option<f64>>,
}

impl TelemetryColumns {
    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }
}

impl ResolvedSchema {
    /// Extract and coerce the resolved fields
    ///
    /// Total: unparsable latency/uptime cells become `None`, null regions
    /// become `None` (and never match a requested region).
    pub fn columns(&self, dataset: &Dataset) -> TelemetryColumns {
        let region = dataset.column(&self.region).map(Value::as_text).collect();
        let latency = dataset.column(&self.latency).map(Value::as_f64).collect();
        let uptime = match &self.uptime {
            UptimeSource::Field(name) => dataset.column(name).map(Value::as_f64).collect(),
            UptimeSource::Synthesized(v) => vec![Some(*v); dataset.len()],
        };

        TelemetryColumns {
            region,
            latency,
            uptime,
        }
    }
}

/// Locates region, latency and uptime fields by naming heuristics
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    rules: RulePack,
}

impl SchemaResolver {
    pub fn new(rules: RulePack) -> Self {
        Self { rules }
    }

    /// Resolver backed by the embedded field-rules.toml
    pub fn with_default_rules() -> Result<Self, RuleError> {
        Ok(Self::new(RulePack::default_rules()?))
    }

    pub fn rules(&self) -> &RulePack {
        &self.rules
    }

    /// Resolve the dataset's fields
    ///
    /// # Errors
    /// [`SchemaError::NoRegionField`] / [`SchemaError::NoLatencyField`] when a
    /// required role has no matching field. A missing uptime field is not an
    /// error; it resolves to [`UptimeSource::Synthesized`].
    pub fn resolve(&self, dataset: &Dataset) -> Result<ResolvedSchema, SchemaError> {
        let fields = dataset.fields();

        let region = self
            .rules
            .first_match(FieldRole::Region, fields)
            .ok_or(SchemaError::NoRegionField)?;
        let latency = self
            .rules
            .first_match(FieldRole::Latency, fields)
            .ok_or(SchemaError::NoLatencyField)?;
        let uptime = match self.rules.first_match(FieldRole::Uptime, fields) {
            Some(name) => UptimeSource::Field(name.to_string()),
            None => {
                tracing::info!(
                    "No uptime field among {:?}; assuming uptime {}",
                    fields,
                    DEFAULT_UPTIME
                );
                UptimeSource::Synthesized(DEFAULT_UPTIME)
            }
        };

        let schema = ResolvedSchema {
            region: region.to_string(),
            latency: latency.to_string(),
            uptime,
        };
        tracing::debug!(
            "Resolved schema: region={} latency={} uptime={:?}",
            schema.region,
            schema.latency,
            schema.uptime
        );
        Ok(schema)
    }
}
