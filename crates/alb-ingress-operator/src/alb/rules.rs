//! Rule collection for one listener

use tracing::{info, warn};

use super::compare::same_rule;
use super::{Listener, ReconcileContext, Rule, RuleError, RuleSnapshot, Snapshot, Transition};

/// Result of reconciling every rule on a listener
#[derive(Debug, Default)]
pub struct ReconcileSummary {
    pub created: usize,
    pub modified: usize,
    pub deleted: usize,
    pub adopted: usize,
    pub unchanged: usize,
    pub errors: Vec<RuleError>,
}

impl ReconcileSummary {
    fn record(&mut self, transition: Transition) {
        match transition {
            Transition::Create => self.created += 1,
            Transition::Modify => self.modified += 1,
            Transition::Delete => self.deleted += 1,
            Transition::AdoptDefault => self.adopted += 1,
            Transition::NoOp => self.unchanged += 1,
        }
    }

    /// Whether every rule reconciled without error
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Desired rules of a listener paired with the rules observed on it
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Pair observed rules with the desired rules they match.
    ///
    /// Matching ignores priority. An observed rule nothing asks for is kept
    /// with an absent desired state so the next reconcile deletes it.
    pub fn merge_current(&mut self, current: impl IntoIterator<Item = RuleSnapshot>) {
        for snapshot in current {
            let paired = self.rules.iter_mut().find(|rule| {
                !rule.current().is_present()
                    && rule
                        .desired()
                        .as_present()
                        .is_some_and(|desired| same_rule(desired, &snapshot))
            });

            match paired {
                Some(rule) => rule.observe(snapshot),
                None => self.rules.push(Rule::observed(snapshot)),
            }
        }
    }

    /// Reconcile every rule in order.
    ///
    /// A failing rule does not stop its siblings; its error is collected in
    /// the summary and the rule is retried on the next pass.
    pub async fn reconcile(
        &mut self,
        listener: &Listener,
        ctx: &ReconcileContext,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for rule in &mut self.rules {
            match rule.reconcile(listener, ctx).await {
                Ok(transition) => summary.record(transition),
                Err(e) => {
                    warn!(
                        listener = %listener.arn(),
                        service = %rule.service_name(),
                        error = %e,
                        "Rule reconciliation failed"
                    );
                    summary.errors.push(e);
                }
            }
        }

        info!(
            listener = %listener.arn(),
            created = summary.created,
            modified = summary.modified,
            deleted = summary.deleted,
            errors = summary.errors.len(),
            "Listener rules reconciled"
        );
        summary
    }

    /// Drop rules whose delete succeeded, returning how many were removed
    pub fn prune_deleted(&mut self) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| !rule.is_deleted());
        before - self.rules.len()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules still present on the listener after the last pass
    pub fn current_rules(&self) -> impl Iterator<Item = &RuleSnapshot> {
        self.rules.iter().filter_map(|rule| match rule.current() {
            Snapshot::Present(snapshot) => Some(snapshot),
            Snapshot::Absent => None,
        })
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
