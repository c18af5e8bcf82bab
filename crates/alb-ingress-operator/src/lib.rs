//! alb-ingress-operator: declarative reconciliation of load balancer listener rules

pub mod alb;
pub mod cache;
pub mod client;
pub mod config;
pub mod events;
pub mod metrics;
pub mod network;
pub mod telemetry;

pub use alb::{Listener, ReconcileContext, Rule, RuleError, RuleSet, Snapshot, Transition};
pub use config::OperatorConfig;
pub use network::VpcResolver;
