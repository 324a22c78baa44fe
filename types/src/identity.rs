//! Identity-verification records and the paged listing returned by the service.

use crate::{Guid, IdentityState, PersonaState};
use serde::{Deserialize, Serialize};

/// One identity-verification attempt.
///
/// Listing endpoints return summaries without persona detail; those decode
/// with `persona_state` set to [`PersonaState::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityVerificationRecord {
    pub guid: Guid,
    pub state: IdentityState,
    #[serde(default)]
    pub persona_state: PersonaState,
    #[serde(default)]
    pub persona_inquiry_id: Option<String>,
}

impl IdentityVerificationRecord {
    pub fn new(guid: impl Into<Guid>, state: IdentityState, persona_state: PersonaState) -> Self {
        Self {
            guid: guid.into(),
            state,
            persona_state,
            persona_inquiry_id: None,
        }
    }

    pub fn with_inquiry_id(mut self, inquiry_id: impl Into<String>) -> Self {
        self.persona_inquiry_id = Some(inquiry_id.into());
        self
    }
}

/// A page of identity-verification records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityVerificationPage {
    pub objects: Vec<IdentityVerificationRecord>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

impl IdentityVerificationPage {
    pub fn new(objects: Vec<IdentityVerificationRecord>) -> Self {
        Self {
            total: Some(objects.len() as u64),
            objects,
            page: None,
            per_page: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The most recent record, if the page holds any.
    pub fn first(&self) -> Option<&IdentityVerificationRecord> {
        self.objects.first()
    }
}
