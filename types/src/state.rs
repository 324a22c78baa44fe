//! State enums for customers, identity verifications and persona sessions.
//!
//! The remote service reports states as lowercase strings. Any string outside
//! the known set decodes to the `Unknown` variant so the orchestrator can treat
//! it as an unrecognized state instead of failing to parse the whole record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// KYC state of a customer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerState {
    /// The service is still persisting the customer; keep polling.
    Storing,
    /// Customer exists but has not passed identity verification.
    Unverified,
    /// Customer passed identity verification.
    Verified,
    /// Identity verification was rejected.
    Rejected,
    /// Customer account is frozen.
    Frozen,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CustomerState {
    /// Whether the customer level stops here without entering identity verification.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Rejected | Self::Frozen)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storing => "storing",
            Self::Unverified => "unverified",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Frozen => "frozen",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CustomerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an identity-verification record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityState {
    /// The service is still persisting the record; keep polling.
    Storing,
    /// Waiting on the persona session; inspect the persona state.
    Waiting,
    /// Verification has finished.
    Completed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl IdentityState {
    /// Whether an existing record can be reused instead of creating a new one.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Waiting | Self::Storing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storing => "storing",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IdentityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-state of the third-party persona session backing an identity verification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaState {
    /// The inquiry is open and the widget should be shown.
    Waiting,
    Pending,
    Reviewing,
    Processing,
    /// The inquiry expired; the whole flow starts over.
    Expired,
    Completed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PersonaState {
    /// Whether a persona session in this state can still be resumed.
    ///
    /// Anything else has been closed out by the third party and needs a fresh
    /// identity-verification record.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::Waiting | Self::Reviewing)
    }

    /// Whether this state ends the current cycle with a result for the host.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Reviewing | Self::Processing | Self::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Processing => "processing",
            Self::Expired => "expired",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PersonaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
