//! Rule representations shared by the reconciler and the remote client

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Condition field used for path based routing
pub const PATH_PATTERN: &str = "path-pattern";

/// Remote rule priority.
///
/// The remote API reports the listener's default rule with the literal
/// priority `default`; every other rule carries a unique positive integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Priority {
    Default,
    Value(u32),
}

impl Priority {
    /// Numeric value, `None` for the default rule
    pub fn value(&self) -> Option<u32> {
        match self {
            Priority::Default => None,
            Priority::Value(v) => Some(*v),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Default => f.write_str("default"),
            Priority::Value(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid rule priority: {0:?}")]
pub struct InvalidPriority(pub String);

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(Priority::Default);
        }
        match s.parse::<u32>() {
            Ok(v) if v > 0 => Ok(Priority::Value(v)),
            _ => Err(InvalidPriority(s.to_string())),
        }
    }
}

/// A single match predicate of a rule
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleCondition {
    pub field: String,
    pub values: Vec<String>,
}

impl RuleCondition {
    pub fn path_pattern(path: impl Into<String>) -> Self {
        Self {
            field: PATH_PATTERN.to_string(),
            values: vec![path.into()],
        }
    }
}

impl fmt::Display for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.values.join(","))
    }
}

/// Forward action of a rule. Exactly one per rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForwardAction {
    /// Filled in from the target group resolver when the rule is created
    pub target_group_arn: Option<String>,
}

/// Snapshot of a rule, either as observed remotely or as intended
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSnapshot {
    /// Remote identifier; absent on desired snapshots
    pub arn: Option<String>,
    /// Assigned by the remote API; unset on desired non-default rules
    pub priority: Option<Priority>,
    pub is_default: bool,
    pub conditions: Vec<RuleCondition>,
    pub action: ForwardAction,
}

impl RuleSnapshot {
    /// Desired snapshot for an ingress path.
    ///
    /// An empty or root path maps to the listener's default rule, which has
    /// no conditions of its own.
    pub fn for_path(path: &str) -> Self {
        if path.is_empty() || path == "/" {
            Self {
                arn: None,
                priority: Some(Priority::Default),
                is_default: true,
                conditions: Vec::new(),
                action: ForwardAction::default(),
            }
        } else {
            Self {
                arn: None,
                priority: None,
                is_default: false,
                conditions: vec![RuleCondition::path_pattern(path)],
                action: ForwardAction::default(),
            }
        }
    }

    /// Priority as shown in events, `unassigned` before creation
    pub fn priority_label(&self) -> String {
        self.priority
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unassigned".to_string())
    }

    /// Human readable condition list for events and logs
    pub fn condition_summary(&self) -> String {
        if self.conditions.is_empty() {
            return "[]".to_string();
        }
        let parts: Vec<String> = self.conditions.iter().map(ToString::to_string).collect();
        format!("[{}]", parts.join(" "))
    }
}
