//! Listener aggregate

use super::{PriorityAllocator, RuleSnapshot, TargetGroups};

/// A load balancer listener as seen by rule reconciliation.
///
/// Owns the priority counter for its rules. Only the reconciler working on
/// this listener during a pass may create rules on it.
#[derive(Debug)]
pub struct Listener {
    arn: String,
    target_groups: TargetGroups,
    priorities: PriorityAllocator,
}

impl Listener {
    pub fn new(
        arn: impl Into<String>,
        target_groups: TargetGroups,
        priorities: PriorityAllocator,
    ) -> Self {
        Self {
            arn: arn.into(),
            target_groups,
            priorities,
        }
    }

    /// Listener whose next rule priority follows the highest priority among
    /// the rules currently observed on it
    pub fn from_current_rules(
        arn: impl Into<String>,
        target_groups: TargetGroups,
        current: &[RuleSnapshot],
    ) -> Self {
        Self::new(arn, target_groups, PriorityAllocator::from_rules(current))
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }

    pub fn target_groups(&self) -> &TargetGroups {
        &self.target_groups
    }

    pub fn priorities(&self) -> &PriorityAllocator {
        &self.priorities
    }
}
