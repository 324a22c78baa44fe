//! Shared reporting path for the orchestrator and the widget bridge.

use std::sync::Arc;

use crate::error::{FlowLevel, VerificationError};
use crate::outputs::VerificationOutputs;
use crate::sinks::{ErrorSink, EventCode, EventLevel, EventSink};

/// Bundles the outbound sinks with the host-visible outputs.
#[derive(Clone)]
pub struct Reporter {
    events: Arc<dyn EventSink>,
    errors: Arc<dyn ErrorSink>,
    outputs: Arc<VerificationOutputs>,
}

impl Reporter {
    pub fn new(
        events: Arc<dyn EventSink>,
        errors: Arc<dyn ErrorSink>,
        outputs: Arc<VerificationOutputs>,
    ) -> Self {
        Self {
            events,
            errors,
            outputs,
        }
    }

    pub fn outputs(&self) -> &VerificationOutputs {
        &self.outputs
    }

    pub fn event(&self, level: EventLevel, code: EventCode, message: &str) {
        self.events.handle_event(level, code, message, None);
    }

    pub fn event_with_context(
        &self,
        level: EventLevel,
        code: EventCode,
        message: &str,
        context: &str,
    ) {
        self.events.handle_event(level, code, message, Some(context));
    }

    /// Handle a failure at `level`: raise the error flag, emit a DATA_ERROR
    /// event and forward the error to the error sink.
    pub fn fail(&self, level: FlowLevel, error: &VerificationError) {
        tracing::error!(level = %level, error = %error, "verification flow failed");
        self.outputs.set_error();
        self.events.handle_event(
            EventLevel::Error,
            EventCode::DataError,
            level.failure_message(),
            None,
        );
        self.errors.handle_error(error);
    }

    /// Handle an error reported by the widget itself.
    pub fn sdk_error(&self, detail: &str, error: &VerificationError) {
        self.outputs.set_error();
        self.event_with_context(
            EventLevel::Error,
            EventCode::PersonaSdkError,
            "There was an error in the Persona SDK",
            detail,
        );
        self.errors.handle_error(error);
    }
}
