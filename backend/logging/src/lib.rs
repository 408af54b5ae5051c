//! Telemetry and structured logging for Portcullis.
//!
//! Handles subscriber setup (console + optional NDJSON file rotation), log
//! redaction, and structured access-decision events.

pub mod access_logger;
pub mod logger;
pub mod redact;

pub use access_logger::{AccessEvent, AccessLogEntry, AccessLogger};
pub use logger::{init_logger, LoggerOptions};
pub use redact::redact_sensitive_data;
