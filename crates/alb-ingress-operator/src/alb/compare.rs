//! Rule equivalence
//!
//! Priority is never compared: ingress declarations cannot express it, so two
//! rules that differ only in priority are the same rule. The forward action
//! is not compared either. A rule is bound to its listener's target group
//! pairing and cannot have its action changed without being recreated.

use super::{RuleSnapshot, Snapshot};

/// Whether the current rule must be modified to match the desired one.
///
/// An absent current rule always needs work, but that case is handled as a
/// create by the reconciler before this is consulted.
pub fn needs_modification(current: &Snapshot<RuleSnapshot>, desired: &RuleSnapshot) -> bool {
    match current {
        Snapshot::Absent => true,
        Snapshot::Present(current) => current.conditions != desired.conditions,
    }
}

/// Whether the current rule and `target` describe the same rule.
///
/// Both sides must be present.
pub fn equals(current: &Snapshot<RuleSnapshot>, target: Option<&RuleSnapshot>) -> bool {
    match (current, target) {
        (Snapshot::Present(current), Some(target)) => same_rule(current, target),
        _ => false,
    }
}

pub(crate) fn same_rule(a: &RuleSnapshot, b: &RuleSnapshot) -> bool {
    a.is_default == b.is_default && a.conditions == b.conditions
}
