//! Nullable sinks and config source: record instead of acting.

use std::sync::Mutex;

use kyc_verification::{
    ConfigSource, ErrorSink, EventCode, EventLevel, EventSink, HostConfig, RouteRequest,
    RoutingSink, VerificationError,
};

/// An event captured by [`NullEventSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub level: EventLevel,
    pub code: EventCode,
    pub message: String,
    pub context: Option<String>,
}

#[derive(Default)]
pub struct NullEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl NullEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Whether an event with this level and code was emitted.
    pub fn has(&self, level: EventLevel, code: EventCode) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.level == level && e.code == code)
    }

    pub fn count_level(&self, level: EventLevel) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.level == level)
            .count()
    }
}

impl EventSink for NullEventSink {
    fn handle_event(&self, level: EventLevel, code: EventCode, message: &str, context: Option<&str>) {
        self.events.lock().unwrap().push(RecordedEvent {
            level,
            code,
            message: message.to_string(),
            context: context.map(str::to_string),
        });
    }
}

/// Records the rendered message of every reported error.
#[derive(Default)]
pub struct NullErrorSink {
    errors: Mutex<Vec<String>>,
}

impl NullErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl ErrorSink for NullErrorSink {
    fn handle_error(&self, error: &VerificationError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

#[derive(Default)]
pub struct NullRouter {
    routes: Mutex<Vec<RouteRequest>>,
}

impl NullRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<RouteRequest> {
        self.routes.lock().unwrap().clone()
    }
}

impl RoutingSink for NullRouter {
    fn handle_route(&self, request: RouteRequest) {
        self.routes.lock().unwrap().push(request);
    }
}

/// Serves a fixed host config.
pub struct NullConfigSource {
    config: HostConfig,
}

impl NullConfigSource {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            config: HostConfig {
                locale: locale.into(),
            },
        }
    }
}

impl Default for NullConfigSource {
    fn default() -> Self {
        Self {
            config: HostConfig::default(),
        }
    }
}

impl ConfigSource for NullConfigSource {
    fn get_config(&self) -> HostConfig {
        self.config.clone()
    }
}
