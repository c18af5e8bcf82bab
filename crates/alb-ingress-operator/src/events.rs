//! Reconciliation event notifications
//!
//! Events are fire-and-forget: emitting never blocks reconciliation and a
//! failure to publish is only logged.

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};
use tracing::{info, warn};

use crate::config::EventsConfig;

/// Event reason codes
pub mod reasons {
    pub const CREATE: &str = "CREATE";
    pub const MODIFY: &str = "MODIFY";
    pub const DELETE: &str = "DELETE";
    pub const ERROR: &str = "ERROR";
}

/// Event severity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
}

impl From<Severity> for EventType {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Normal => EventType::Normal,
            Severity::Warning => EventType::Warning,
        }
    }
}

/// Sink for reconciliation events
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    fn emit(&self, severity: Severity, reason: &str, note: String);
}

/// Sink that only writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, severity: Severity, reason: &str, note: String) {
        match severity {
            Severity::Normal => info!(reason = %reason, "{note}"),
            Severity::Warning => warn!(reason = %reason, "{note}"),
        }
    }
}

/// Publishes events to Kubernetes against the owning Ingress
#[derive(Clone)]
pub struct KubeEventSink {
    recorder: Recorder,
    reference: ObjectReference,
}

impl KubeEventSink {
    pub fn new(client: Client, config: &EventsConfig, reference: ObjectReference) -> Self {
        let reporter = Reporter {
            controller: config.reporter.clone(),
            instance: config.instance.clone(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
            reference,
        }
    }

    /// Sink attached to an Ingress object
    pub fn for_ingress(client: Client, config: &EventsConfig, ingress: &Ingress) -> Self {
        Self::new(client, config, ingress.object_ref(&()))
    }
}

impl EventSink for KubeEventSink {
    fn emit(&self, severity: Severity, reason: &str, note: String) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(reason = %reason, note = %note, "No runtime available, dropping event");
            return;
        };

        let recorder = self.recorder.clone();
        let reference = self.reference.clone();
        let event = Event {
            type_: severity.into(),
            reason: reason.to_string(),
            note: Some(note),
            action: "Reconcile".to_string(),
            secondary: None,
        };

        runtime.spawn(async move {
            if let Err(e) = recorder.publish(&event, &reference).await {
                warn!(reason = %event.reason, error = %e, "Failed to publish event");
            }
        });
    }
}
