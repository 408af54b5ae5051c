//! Access Event Logger
//!
//! Structured guard decisions and permission-load outcomes, emitted on the
//! `access_events` tracing target so they land in the NDJSON file layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessEvent {
    Allowed {
        url: String,
        guard: String,
    },
    Denied {
        url: String,
        guard: String,
        required: Vec<String>,
        redirect: String,
    },
    Redirected {
        from: String,
        to: String,
    },
    LoadFailed {
        scope: String,
        scope_id: String,
        error: String,
    },
    LoadSuperseded {
        scope: String,
        scope_id: String,
    },
}

impl AccessEvent {
    fn is_negative(&self) -> bool {
        matches!(self, AccessEvent::Denied { .. } | AccessEvent::LoadFailed { .. })
    }

    fn redact(&mut self) {
        match self {
            AccessEvent::Allowed { url, .. } => *url = redact_sensitive_data(url),
            AccessEvent::Denied { url, redirect, .. } => {
                *url = redact_sensitive_data(url);
                *redirect = redact_sensitive_data(redirect);
            }
            AccessEvent::Redirected { from, to } => {
                *from = redact_sensitive_data(from);
                *to = redact_sensitive_data(to);
            }
            AccessEvent::LoadFailed { error, .. } => *error = redact_sensitive_data(error),
            AccessEvent::LoadSuperseded { .. } => {}
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccessLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AccessEvent,
}

pub struct AccessLogger;

impl AccessLogger {
    /// Build the redacted entry for an event without emitting it.
    pub fn entry(session_id: &str, mut event: AccessEvent) -> AccessLogEntry {
        event.redact();
        AccessLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Redact and emit an access event.
    pub fn log_event(session_id: &str, event: AccessEvent) {
        let negative = event.is_negative();
        let entry = Self::entry(session_id, event);
        if negative {
            warn!(target: "access_events", event = ?entry, "Access event");
        } else {
            info!(target: "access_events", event = ?entry, "Access event");
        }
    }
}
