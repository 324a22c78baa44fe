//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the orchestrator consumes (remote service, event and
//! error sinks, router, config source, script loader and persona widget) has
//! a test-friendly implementation here that:
//! - Returns scripted values in order
//! - Records every call for assertions
//! - Never touches the network or a real widget
//!
//! [`NullCollaborators`] bundles one of each; [`Scenario`] builds them from a
//! JSON description.

pub mod persona;
pub mod scenario;
pub mod service;
pub mod sinks;

pub use persona::{NullPersonaClient, NullPersonaFactory, NullScriptLoader};
pub use scenario::{NullCollaborators, Scenario, ScenarioError};
pub use service::{NullVerificationService, ServiceCall};
pub use sinks::{NullConfigSource, NullErrorSink, NullEventSink, NullRouter, RecordedEvent};
