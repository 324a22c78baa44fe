//! KYC identity-verification orchestration.
//!
//! Three nested state machines resolve a user's verification status:
//! 1. **Customer**: poll the customer until it leaves `storing`.
//! 2. **Identity verification**: pick or create an attempt, then poll it until
//!    it leaves `storing`.
//! 3. **Persona**: while the attempt is `waiting`, hand off to the third-party
//!    widget through the [`SdkBridge`] and react to its callbacks.
//!
//! Remote reads, widget loading and host notifications are all collaborator
//! traits, so hosts plug in their own transport and UI.

pub mod bridge;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod outputs;
pub mod report;
pub mod service;
pub mod sinks;

pub use bridge::{
    Bootstrap, BridgeOutcome, ClientOptions, OptionsPatch, PersonaClient, PersonaClientFactory,
    ScriptLease, ScriptLoader, ScriptRegistry, SdkBridge, SdkCallbacks, SdkEvent,
    PERSONA_SCRIPT_SRC,
};
pub use context::VerificationContext;
pub use error::{FlowLevel, RemoteCallError, VerificationError};
pub use orchestrator::{
    default_poll_config, Collaborators, FlowOutcome, VerificationOrchestrator, POLL_DURATION,
    POLL_INTERVAL,
};
pub use outputs::VerificationOutputs;
pub use report::Reporter;
pub use service::{ConfigSource, HostConfig, VerificationService};
pub use sinks::{
    ErrorSink, EventCode, EventLevel, EventSink, RouteRequest, RoutingSink, TracingErrorSink,
    TracingEventSink,
};
