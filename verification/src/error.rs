use kyc_poll::SessionEnd;
use thiserror::Error;

/// Which part of the flow an error was raised in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowLevel {
    Customer,
    IdentityVerification,
    Persona,
    Sdk,
}

impl FlowLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::IdentityVerification => "identity verification",
            Self::Persona => "persona",
            Self::Sdk => "persona sdk",
        }
    }

    /// Message attached to the ERROR event when this level fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Customer => "There was an error fetching customer kyc status",
            Self::IdentityVerification => "There was an error fetching identity verification",
            Self::Persona => "There was an error resolving the persona state",
            Self::Sdk => "There was an error launching the Persona SDK",
        }
    }
}

impl std::fmt::Display for FlowLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call to the remote verification service failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("remote call failed: {message}")]
pub struct RemoteCallError {
    pub message: String,
}

impl RemoteCallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error(transparent)]
    Remote(#[from] RemoteCallError),

    #[error("unrecognized {level} state: {value}")]
    UnrecognizedState { level: FlowLevel, value: String },

    #[error("persona sdk error: {0}")]
    Sdk(String),

    #[error("{level} polling ended without a terminal state ({end:?})")]
    Timeout { level: FlowLevel, end: SessionEnd },

    #[error("failed to load persona script: {0}")]
    ScriptLoad(String),

    #[error("no identity verification is active")]
    NoActiveVerification,
}

impl VerificationError {
    pub fn unrecognized(level: FlowLevel, value: impl Into<String>) -> Self {
        Self::UnrecognizedState {
            level,
            value: value.into(),
        }
    }
}
