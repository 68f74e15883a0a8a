//! Fire-and-forget alert sink.
//!
//! The accuser and the engines surface high-severity findings through this
//! port so a UI shim can subscribe; the default sink forwards to `tracing`.

use chrono::{DateTime, Utc};

/// Alert severity levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertSeverity {
    /// Informational
    Info,
    /// Needs operator attention
    Warning,
    /// Potential slashing or protocol-compliance problem
    High,
}

/// One alert record.
#[derive(Clone, Debug)]
pub struct Alert {
    /// Severity of the finding
    pub severity: AlertSeverity,
    /// Component that raised it
    pub origin: &'static str,
    /// Human-readable description
    pub message: String,
    /// When the alert was raised
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Build an alert stamped with the current time.
    pub fn new(severity: AlertSeverity, origin: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            origin,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Alert consumer. Must never block the caller.
pub trait AlertSink: Send + Sync {
    /// Deliver one alert. Fire-and-forget.
    fn alert(&self, alert: Alert);
}

/// Default sink: forwards alerts to the tracing subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, alert: Alert) {
        match alert.severity {
            AlertSeverity::Info => tracing::info!("[{}] {}", alert.origin, alert.message),
            AlertSeverity::Warning => tracing::warn!("[{}] {}", alert.origin, alert.message),
            AlertSeverity::High => tracing::error!("[{}] {}", alert.origin, alert.message),
        }
    }
}
