//! Customer record as returned by the verification service.

use crate::{CustomerState, Guid};
use serde::{Deserialize, Serialize};

/// Read-only snapshot of the customer owned by the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(default)]
    pub guid: Option<Guid>,
    pub state: CustomerState,
}

impl CustomerRecord {
    pub fn new(state: CustomerState) -> Self {
        Self { guid: None, state }
    }

    pub fn with_guid(mut self, guid: impl Into<Guid>) -> Self {
        self.guid = Some(guid.into());
        self
    }
}
