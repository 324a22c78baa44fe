//! Outbound collaborators: structured events, error reporting and routing.
//!
//! The orchestrator calls into these but does not own them. Tracing-backed
//! implementations are provided for hosts that have nothing better.

use crate::error::VerificationError;

/// Severity of an emitted event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for EventLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable event codes understood by host event handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventCode {
    ComponentInit,
    DataError,
    KycRejected,
    CustomerFrozen,
    KycSubmitted,
    PersonaSdkCancel,
    PersonaSdkError,
}

impl EventCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComponentInit => "COMPONENT_INIT",
            Self::DataError => "DATA_ERROR",
            Self::KycRejected => "KYC_REJECTED",
            Self::CustomerFrozen => "CUSTOMER_FROZEN",
            Self::KycSubmitted => "KYC_SUBMITTED",
            Self::PersonaSdkCancel => "PERSONA_SDK_CANCEL",
            Self::PersonaSdkError => "PERSONA_SDK_ERROR",
        }
    }
}

impl std::fmt::Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait EventSink: Send + Sync {
    fn handle_event(&self, level: EventLevel, code: EventCode, message: &str, context: Option<&str>);
}

pub trait ErrorSink: Send + Sync {
    fn handle_error(&self, error: &VerificationError);
}

/// A navigation request for the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRequest {
    pub origin: String,
    pub route: String,
}

pub trait RoutingSink: Send + Sync {
    fn handle_route(&self, request: RouteRequest);
}

/// Forwards events to `tracing` at the matching level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn handle_event(&self, level: EventLevel, code: EventCode, message: &str, context: Option<&str>) {
        let context = context.unwrap_or("");
        match level {
            EventLevel::Info => tracing::info!(code = %code, context, "{message}"),
            EventLevel::Warning => tracing::warn!(code = %code, context, "{message}"),
            EventLevel::Error => tracing::error!(code = %code, context, "{message}"),
        }
    }
}

/// Logs reported errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn handle_error(&self, error: &VerificationError) {
        tracing::error!(error = %error, "verification error reported");
    }
}
