//! Remote load balancer and network API interfaces
//!
//! The concrete API clients live outside this crate. Reconciliation only
//! depends on these traits, which keeps it testable with mocks.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::alb::{Priority, RuleCondition, RuleSnapshot};

/// Trait for remote listener rule operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleClient: Send + Sync {
    /// Create a rule on a listener with the given priority, conditions and
    /// forward target. Returns the rule as created remotely.
    async fn create_rule(
        &self,
        listener_arn: &str,
        priority: Priority,
        conditions: Vec<RuleCondition>,
        target_group_arn: &str,
    ) -> Result<RuleSnapshot, ClientError>;

    /// Replace the conditions of an existing rule in place.
    ///
    /// The rule keeps its ARN, priority and forward action.
    async fn modify_rule(
        &self,
        rule_arn: &str,
        conditions: Vec<RuleCondition>,
    ) -> Result<RuleSnapshot, ClientError>;

    /// Delete a rule
    async fn delete_rule(&self, rule_arn: &str) -> Result<(), ClientError>;
}

/// Trait for remote network lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubnetClient: Send + Sync {
    /// Describe the given subnets
    async fn describe_subnets(&self, subnet_ids: &[String]) -> Result<Vec<Subnet>, ClientError>;
}

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Server response missing required field: {0}")]
    MissingResponseField(String),
}

impl ClientError {
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Subnet as reported by the network API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub subnet_id: String,
    pub vpc_id: String,
}

/// Implement trait for Arc-wrapped clients to support shared ownership
#[async_trait]
impl<T: RuleClient + ?Sized> RuleClient for Arc<T> {
    async fn create_rule(
        &self,
        listener_arn: &str,
        priority: Priority,
        conditions: Vec<RuleCondition>,
        target_group_arn: &str,
    ) -> Result<RuleSnapshot, ClientError> {
        (**self)
            .create_rule(listener_arn, priority, conditions, target_group_arn)
            .await
    }

    async fn modify_rule(
        &self,
        rule_arn: &str,
        conditions: Vec<RuleCondition>,
    ) -> Result<RuleSnapshot, ClientError> {
        (**self).modify_rule(rule_arn, conditions).await
    }

    async fn delete_rule(&self, rule_arn: &str) -> Result<(), ClientError> {
        (**self).delete_rule(rule_arn).await
    }
}

#[async_trait]
impl<T: SubnetClient + ?Sized> SubnetClient for Arc<T> {
    async fn describe_subnets(&self, subnet_ids: &[String]) -> Result<Vec<Subnet>, ClientError> {
        (**self).describe_subnets(subnet_ids).await
    }
}
