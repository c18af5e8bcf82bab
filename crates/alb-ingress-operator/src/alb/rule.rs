//! Single rule reconciliation
//!
//! A [`Rule`] pairs what is observed on the listener with what the ingress
//! asks for. [`Rule::plan`] picks exactly one transition from a priority
//! ordered decision table and [`Rule::reconcile`] carries it out against the
//! remote API.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::client::ClientError;
use crate::events::{reasons, Severity};
use crate::metrics::record_rule_operation;

use super::compare;
use super::{
    Listener, PrioritiesExhausted, Priority, ReconcileContext, ResolveError, RuleSnapshot,
    Snapshot,
};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Error creating {priority} rule: {source}")]
    Create {
        priority: Priority,
        #[source]
        source: ClientError,
    },
    #[error("Error modifying {priority} rule: {source}")]
    Modify {
        priority: String,
        #[source]
        source: ClientError,
    },
    #[error("Error deleting {priority} rule: {source}")]
    Delete {
        priority: String,
        #[source]
        source: ClientError,
    },
    #[error("Target group resolution failed: {0}")]
    TargetGroup(#[from] ResolveError),
    #[error(transparent)]
    PrioritiesExhausted(#[from] PrioritiesExhausted),
    #[error("Rule is missing required field: {0}")]
    MissingField(&'static str),
}

/// Outcome of the reconciliation decision table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Remove a rule that is no longer wanted
    Delete,
    /// Take over the listener's default rule without a remote call
    AdoptDefault,
    /// Create a missing rule
    Create,
    /// Replace the conditions of a stale rule
    Modify,
    NoOp,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Delete => "delete",
            Transition::AdoptDefault => "adopt-default",
            Transition::Create => "create",
            Transition::Modify => "modify",
            Transition::NoOp => "no-op",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A listener rule with its current and desired state
#[derive(Clone, Debug)]
pub struct Rule {
    service_name: String,
    current: Snapshot<RuleSnapshot>,
    desired: Snapshot<RuleSnapshot>,
    deleted: bool,
}

impl Rule {
    /// Desired rule forwarding `path` to `service_name`.
    ///
    /// An empty or root path is the listener's default rule.
    pub fn new(path: &str, service_name: impl Into<String>) -> Self {
        Self::from_parts(
            service_name,
            Snapshot::Absent,
            Snapshot::Present(RuleSnapshot::for_path(path)),
        )
    }

    pub fn from_parts(
        service_name: impl Into<String>,
        current: Snapshot<RuleSnapshot>,
        desired: Snapshot<RuleSnapshot>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            current,
            desired,
            deleted: false,
        }
    }

    /// Rule observed on the listener that nothing asks for anymore
    pub fn observed(snapshot: RuleSnapshot) -> Self {
        Self::from_parts(String::new(), Snapshot::Present(snapshot), Snapshot::Absent)
    }

    /// Attach the remote rule observed for this desired rule
    pub fn with_current(mut self, snapshot: RuleSnapshot) -> Self {
        self.observe(snapshot);
        self
    }

    pub(crate) fn observe(&mut self, snapshot: RuleSnapshot) {
        self.current = Snapshot::Present(snapshot);
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn current(&self) -> &Snapshot<RuleSnapshot> {
        &self.current
    }

    pub fn desired(&self) -> &Snapshot<RuleSnapshot> {
        &self.desired
    }

    /// Whether a delete of this rule succeeded
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Whether this is the listener's default rule
    pub fn is_default(&self) -> bool {
        self.desired
            .as_present()
            .or_else(|| self.current.as_present())
            .is_some_and(|r| r.is_default)
    }

    /// Whether the current rule differs from the desired one
    pub fn needs_modification(&self) -> bool {
        match &self.desired {
            Snapshot::Present(desired) => compare::needs_modification(&self.current, desired),
            Snapshot::Absent => false,
        }
    }

    /// Whether the current rule is the same rule as `target`, ignoring priority
    pub fn equals(&self, target: Option<&RuleSnapshot>) -> bool {
        compare::equals(&self.current, target)
    }

    /// Select the transition for this rule. The first matching case wins.
    pub fn plan(&self) -> Transition {
        match (&self.desired, &self.current) {
            (Snapshot::Absent, Snapshot::Present(current)) if !current.is_default => {
                Transition::Delete
            }
            // Already gone, or the default rule which lives with its listener
            (Snapshot::Absent, _) => Transition::NoOp,
            (Snapshot::Present(desired), _) if desired.is_default => Transition::AdoptDefault,
            (Snapshot::Present(_), Snapshot::Absent) => Transition::Create,
            (Snapshot::Present(desired), current)
                if compare::needs_modification(current, desired) =>
            {
                Transition::Modify
            }
            (Snapshot::Present(_), Snapshot::Present(_)) => Transition::NoOp,
        }
    }

    /// Drive the remote rule towards the desired state.
    ///
    /// On failure `current` is left untouched and the error is returned; the
    /// next pass retries.
    #[instrument(skip(self, listener, ctx), fields(
        service = %self.service_name,
        listener = %listener.arn(),
    ))]
    pub async fn reconcile(
        &mut self,
        listener: &Listener,
        ctx: &ReconcileContext,
    ) -> Result<Transition, RuleError> {
        let transition = self.plan();
        match transition {
            Transition::Delete => {
                info!("Start rule deletion");
                self.delete(ctx).await?;
            }
            Transition::AdoptDefault => {
                debug!("Desired rule is the listener default, already created with its listener");
                self.current = self.desired.clone();
            }
            Transition::Create => {
                info!("Start rule creation");
                self.create(listener, ctx).await?;
            }
            Transition::Modify => {
                info!("Start rule modification");
                self.modify(ctx).await?;
            }
            Transition::NoOp => {
                debug!("No rule modification required");
            }
        }
        Ok(transition)
    }

    async fn create(
        &mut self,
        listener: &Listener,
        ctx: &ReconcileContext,
    ) -> Result<(), RuleError> {
        let desired = self
            .desired
            .as_present()
            .ok_or(RuleError::MissingField("desired rule"))?;
        let target_group = listener.target_groups().resolve(&self.service_name)?;

        // Held until the create call returns so concurrent creates on this
        // listener never share a priority
        let reservation = listener.priorities().reserve().await?;
        let priority = reservation.priority();

        let result = ctx
            .client
            .create_rule(
                listener.arn(),
                priority,
                desired.conditions.clone(),
                &target_group.arn,
            )
            .await;

        match result {
            Ok(created) => {
                reservation.commit();
                record_rule_operation("create", "success");
                ctx.events.emit(
                    Severity::Normal,
                    reasons::CREATE,
                    format!(
                        "{} rule created {}",
                        created.priority_label(),
                        created.condition_summary()
                    ),
                );
                info!(
                    priority = %created.priority_label(),
                    target_group = %target_group.arn,
                    conditions = %created.condition_summary(),
                    "Completed rule creation"
                );
                self.current = Snapshot::Present(created);
                Ok(())
            }
            Err(e) => {
                drop(reservation);
                record_rule_operation("create", "error");
                ctx.events.emit(
                    Severity::Warning,
                    reasons::ERROR,
                    format!("Error creating {priority} rule: {e}"),
                );
                warn!(
                    priority = %priority,
                    conditions = %desired.condition_summary(),
                    error = %e,
                    "Failed rule creation"
                );
                Err(RuleError::Create {
                    priority,
                    source: e,
                })
            }
        }
    }

    async fn modify(&mut self, ctx: &ReconcileContext) -> Result<(), RuleError> {
        let desired = self
            .desired
            .as_present()
            .ok_or(RuleError::MissingField("desired rule"))?;
        let current = self
            .current
            .as_present()
            .ok_or(RuleError::MissingField("current rule"))?;
        let arn = current
            .arn
            .as_deref()
            .ok_or(RuleError::MissingField("rule arn"))?;
        let priority = current.priority_label();

        let result = ctx.client.modify_rule(arn, desired.conditions.clone()).await;

        match result {
            Ok(modified) => {
                record_rule_operation("modify", "success");
                ctx.events.emit(
                    Severity::Normal,
                    reasons::MODIFY,
                    format!("{priority} rule modified {}", modified.condition_summary()),
                );
                info!(
                    priority = %priority,
                    conditions = %modified.condition_summary(),
                    "Completed rule modification"
                );
                self.current = Snapshot::Present(modified);
                Ok(())
            }
            Err(e) => {
                record_rule_operation("modify", "error");
                ctx.events.emit(
                    Severity::Warning,
                    reasons::ERROR,
                    format!("Error modifying {priority} rule: {e}"),
                );
                warn!(priority = %priority, error = %e, "Failed rule modification");
                Err(RuleError::Modify {
                    priority,
                    source: e,
                })
            }
        }
    }

    async fn delete(&mut self, ctx: &ReconcileContext) -> Result<(), RuleError> {
        let current = self
            .current
            .as_present()
            .ok_or(RuleError::MissingField("current rule"))?;
        let arn = current
            .arn
            .as_deref()
            .ok_or(RuleError::MissingField("rule arn"))?;
        let priority = current.priority_label();
        let conditions = current.condition_summary();

        let result = ctx.client.delete_rule(arn).await;

        match result {
            Ok(()) => {
                record_rule_operation("delete", "success");
                ctx.events.emit(
                    Severity::Normal,
                    reasons::DELETE,
                    format!("{priority} rule deleted {conditions}"),
                );
                info!(priority = %priority, conditions = %conditions, "Completed rule deletion");
                self.deleted = true;
                self.current = Snapshot::Absent;
                Ok(())
            }
            Err(e) => {
                record_rule_operation("delete", "error");
                ctx.events.emit(
                    Severity::Warning,
                    reasons::ERROR,
                    format!("Error deleting {priority} rule: {e}"),
                );
                warn!(priority = %priority, error = %e, "Failed rule deletion");
                Err(RuleError::Delete {
                    priority,
                    source: e,
                })
            }
        }
    }
}
