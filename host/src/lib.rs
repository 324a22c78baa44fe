//! Host shell around the verification orchestrator.
//!
//! Loads [`HostSettings`] from TOML, installs the tracing subscriber, owns the
//! teardown signal and turns the two host outcomes into route requests.

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod teardown;

pub use config::{HostSettings, RouteSettings};
pub use error::HostError;
pub use host::{HostOutcome, StaticConfigSource, VerificationHost};
pub use logging::{init_logging, LogFormat};
pub use teardown::TeardownController;
