//! Target group resolution
//!
//! Maps a backend service name to the target group that should receive a
//! rule's forwarded traffic. A listener always has at least one target group,
//! so an unknown service falls back to the first registered group.

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No target groups registered on load balancer")]
    NoTargetGroups,
}

/// Target group known to the owning load balancer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetGroup {
    pub service_name: String,
    pub arn: String,
}

impl TargetGroup {
    pub fn new(service_name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            arn: arn.into(),
        }
    }
}

/// Target groups of a load balancer, in registration order
#[derive(Clone, Debug, Default)]
pub struct TargetGroups {
    groups: Vec<TargetGroup>,
}

impl TargetGroups {
    pub fn new(groups: Vec<TargetGroup>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Exact service name match
    pub fn lookup_by_service(&self, service_name: &str) -> Option<&TargetGroup> {
        self.groups.iter().find(|g| g.service_name == service_name)
    }

    /// Resolve the target group for a service, falling back to the first
    /// registered group when no group matches.
    pub fn resolve(&self, service_name: &str) -> Result<&TargetGroup, ResolveError> {
        if let Some(group) = self.lookup_by_service(service_name) {
            debug!(service = %service_name, target_group = %group.arn, "Resolved target group");
            return Ok(group);
        }

        let fallback = self.groups.first().ok_or(ResolveError::NoTargetGroups)?;
        warn!(
            service = %service_name,
            target_group = %fallback.arn,
            "Failed to locate target group for service, defaulting to first target group"
        );
        Ok(fallback)
    }
}

impl FromIterator<TargetGroup> for TargetGroups {
    fn from_iter<I: IntoIterator<Item = TargetGroup>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
