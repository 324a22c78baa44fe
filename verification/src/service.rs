//! Inbound collaborators: the remote verification service and host config.

use async_trait::async_trait;
use kyc_types::{CustomerRecord, Guid, IdentityVerificationPage, IdentityVerificationRecord};

use crate::error::RemoteCallError;

/// Remote KYC API. Only the operations are contracted, not the wire format.
#[async_trait]
pub trait VerificationService: Send + Sync {
    async fn get_customer(&self) -> Result<CustomerRecord, RemoteCallError>;

    async fn list_identity_verifications(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<IdentityVerificationPage, RemoteCallError>;

    async fn create_identity_verification(
        &self,
    ) -> Result<IdentityVerificationRecord, RemoteCallError>;

    async fn get_identity_verification(
        &self,
        guid: &Guid,
    ) -> Result<IdentityVerificationRecord, RemoteCallError>;
}

/// Host configuration read when the widget is bootstrapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    /// User locale, e.g. `en-US` or `fr-CA`.
    pub locale: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
        }
    }
}

pub trait ConfigSource: Send + Sync {
    fn get_config(&self) -> HostConfig;
}
