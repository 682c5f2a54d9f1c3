// Schema resolution for loosely-named telemetry
//
// Producers disagree on field names ("region" vs "zone", "latency_ms" vs
// "latencyMs"). Discovery is an explicit ordered list of (role, matcher)
// rules evaluated once per dataset, yielding a typed ResolvedSchema.
//
// Region and latency are required. Uptime is optional: when absent every
// record counts as fully available.

mod resolver;
mod rules;

pub use resolver::{
    ResolvedSchema, SchemaResolver, TelemetryColumns, UptimeSource, DEFAULT_UPTIME,
};
pub use rules::{FieldRole, FieldRule, RulePack};
