//! In-memory fakes shared by the integration tests
//!
//! `FakeLoadBalancer` keeps listener rules in memory and rejects a create
//! whose priority is already taken on the listener, like the real API does.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use alb_ingress_operator::alb::{ForwardAction, Priority, RuleCondition, RuleSnapshot};
use alb_ingress_operator::client::{ClientError, RuleClient, Subnet, SubnetClient};
use alb_ingress_operator::events::{EventSink, Severity};
use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Create { priority: Priority, path: String },
    Modify { arn: String },
    Delete { arn: String },
}

#[derive(Default)]
struct LoadBalancerState {
    // rule arn -> (listener arn, rule)
    rules: BTreeMap<String, (String, RuleSnapshot)>,
    next_id: u32,
    failing_paths: HashSet<String>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeLoadBalancer {
    state: Mutex<LoadBalancerState>,
}

impl FakeLoadBalancer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a rule as if it already existed on the listener
    pub fn seed(
        &self,
        listener_arn: &str,
        priority: u32,
        path: &str,
        target_group_arn: &str,
    ) -> RuleSnapshot {
        let mut state = self.state.lock().unwrap();
        let snapshot = RuleSnapshot {
            arn: Some(format!("arn:rule/seeded-{priority}")),
            priority: Some(Priority::Value(priority)),
            is_default: false,
            conditions: vec![RuleCondition::path_pattern(path)],
            action: ForwardAction {
                target_group_arn: Some(target_group_arn.to_string()),
            },
        };
        state.rules.insert(
            format!("arn:rule/seeded-{priority}"),
            (listener_arn.to_string(), snapshot.clone()),
        );
        snapshot
    }

    /// Make every create or modify for `path` fail
    pub fn fail_path(&self, path: &str) {
        self.state.lock().unwrap().failing_paths.insert(path.to_string());
    }

    pub fn heal_path(&self, path: &str) {
        self.state.lock().unwrap().failing_paths.remove(path);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Rules on a listener ordered by priority
    pub fn rules(&self, listener_arn: &str) -> Vec<RuleSnapshot> {
        let state = self.state.lock().unwrap();
        let mut rules: Vec<RuleSnapshot> = state
            .rules
            .values()
            .filter(|(listener, _)| listener == listener_arn)
            .map(|(_, rule)| rule.clone())
            .collect();
        rules.sort_by_key(|rule| rule.priority.and_then(|p| p.value()));
        rules
    }

    fn failing(state: &LoadBalancerState, conditions: &[RuleCondition]) -> bool {
        conditions
            .iter()
            .flat_map(|c| c.values.iter())
            .any(|v| state.failing_paths.contains(v))
    }
}

fn first_path(conditions: &[RuleCondition]) -> String {
    conditions
        .first()
        .and_then(|c| c.values.first())
        .cloned()
        .unwrap_or_default()
}

#[async_trait]
impl RuleClient for FakeLoadBalancer {
    async fn create_rule(
        &self,
        listener_arn: &str,
        priority: Priority,
        conditions: Vec<RuleCondition>,
        target_group_arn: &str,
    ) -> Result<RuleSnapshot, ClientError> {
        // Let concurrent reconcilers interleave
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            priority,
            path: first_path(&conditions),
        });

        if Self::failing(&state, &conditions) {
            return Err(ClientError::api("ValidationError", "injected failure"));
        }
        let taken = state
            .rules
            .values()
            .any(|(listener, rule)| listener == listener_arn && rule.priority == Some(priority));
        if taken {
            return Err(ClientError::api(
                "PriorityInUse",
                format!("Priority '{priority}' is currently in use"),
            ));
        }

        state.next_id += 1;
        let arn = format!("arn:rule/{}", state.next_id);
        let snapshot = RuleSnapshot {
            arn: Some(arn.clone()),
            priority: Some(priority),
            is_default: false,
            conditions,
            action: ForwardAction {
                target_group_arn: Some(target_group_arn.to_string()),
            },
        };
        state
            .rules
            .insert(arn, (listener_arn.to_string(), snapshot.clone()));
        Ok(snapshot)
    }

    async fn modify_rule(
        &self,
        rule_arn: &str,
        conditions: Vec<RuleCondition>,
    ) -> Result<RuleSnapshot, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Modify {
            arn: rule_arn.to_string(),
        });

        if Self::failing(&state, &conditions) {
            return Err(ClientError::api("ValidationError", "injected failure"));
        }
        let (_, rule) = state
            .rules
            .get_mut(rule_arn)
            .ok_or_else(|| ClientError::api("RuleNotFound", rule_arn))?;
        rule.conditions = conditions;
        Ok(rule.clone())
    }

    async fn delete_rule(&self, rule_arn: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete {
            arn: rule_arn.to_string(),
        });
        state
            .rules
            .remove(rule_arn)
            .map(|_| ())
            .ok_or_else(|| ClientError::api("RuleNotFound", rule_arn))
    }
}

/// Subnet client answering from a fixed subnet to VPC table
pub struct FakeSubnets {
    vpcs: BTreeMap<String, String>,
    calls: Mutex<usize>,
}

impl FakeSubnets {
    pub fn new(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            vpcs: entries
                .iter()
                .map(|(subnet, vpc)| (subnet.to_string(), vpc.to_string()))
                .collect(),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SubnetClient for FakeSubnets {
    async fn describe_subnets(&self, subnet_ids: &[String]) -> Result<Vec<Subnet>, ClientError> {
        *self.calls.lock().unwrap() += 1;
        Ok(subnet_ids
            .iter()
            .filter_map(|id| {
                self.vpcs.get(id).map(|vpc| Subnet {
                    subnet_id: id.clone(),
                    vpc_id: vpc.clone(),
                })
            })
            .collect())
    }
}

/// Event sink that keeps every event it receives
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<(Severity, String, String)>>,
}

impl RecordingEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(Severity, String, String)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, severity: Severity, reason: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, r, _)| *s == severity && r == reason)
            .count()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, severity: Severity, reason: &str, note: String) {
        self.events
            .lock()
            .unwrap()
            .push((severity, reason.to_string(), note));
    }
}
