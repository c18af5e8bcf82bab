//! Listener rule reconciliation
//!
//! Each pass pairs the rules observed on a listener with the rules the
//! ingress asks for, then drives every pair towards the desired state with
//! at most one remote mutation per rule.

pub mod compare;
pub mod listener;
pub mod priority;
pub mod rule;
pub mod rules;
pub mod target_group;
pub mod types;

use std::sync::Arc;

use crate::client::RuleClient;
use crate::events::EventSink;

pub use listener::Listener;
pub use priority::{PrioritiesExhausted, PriorityAllocator, PriorityReservation};
pub use rule::{Rule, RuleError, Transition};
pub use rules::{ReconcileSummary, RuleSet};
pub use target_group::{ResolveError, TargetGroup, TargetGroups};
pub use types::{ForwardAction, InvalidPriority, Priority, RuleCondition, RuleSnapshot};

/// Presence of a resource on one side of a reconciliation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Snapshot<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Snapshot<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Snapshot::Present(_))
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Snapshot::Absent => None,
            Snapshot::Present(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Snapshot<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Snapshot::Present(value),
            None => Snapshot::Absent,
        }
    }
}

/// Collaborators shared by all rule reconciliations
#[derive(Clone)]
pub struct ReconcileContext {
    /// Remote load balancer API
    pub client: Arc<dyn RuleClient>,
    /// Event notifications
    pub events: Arc<dyn EventSink>,
}

impl ReconcileContext {
    pub fn new(client: Arc<dyn RuleClient>, events: Arc<dyn EventSink>) -> Self {
        Self { client, events }
    }
}
