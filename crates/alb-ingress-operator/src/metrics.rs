//! Metric counter helpers
//!
//! Counters are recorded through the `metrics` facade. Without an installed
//! recorder they are no-ops.

use metrics::counter;

/// Outcome of a cache lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
        }
    }
}

/// Record a remote API cache lookup
pub fn record_cache_lookup(cache: &str, outcome: CacheOutcome) {
    counter!("alb_ingress_api_cache_total", "cache" => cache.to_string(), "action" => outcome.as_str())
        .increment(1);
}

/// Record a rule transition against the remote API
pub fn record_rule_operation(operation: &str, status: &str) {
    counter!("alb_ingress_rule_operations_total", "operation" => operation.to_string(), "status" => status.to_string())
        .increment(1);
}
