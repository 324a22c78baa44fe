//! Per-flow state owned by the orchestrator.

use kyc_types::Guid;

use crate::bridge::SdkBridge;
use crate::error::VerificationError;

/// Holds the active identity-verification guid and the widget bridge.
///
/// The guid has a single writer (the orchestrator) and is replaced whenever a
/// new identity-verification record is resolved.
pub struct VerificationContext {
    guid: Option<Guid>,
    pub(crate) bridge: SdkBridge,
}

impl VerificationContext {
    pub fn new(bridge: SdkBridge) -> Self {
        Self { guid: None, bridge }
    }

    pub fn set_active_guid(&mut self, guid: Guid) {
        tracing::debug!(guid = %guid, "active identity verification set");
        self.guid = Some(guid);
    }

    /// The active guid. Reading it before it was set is an error.
    pub fn active_guid(&self) -> Result<&Guid, VerificationError> {
        self.guid.as_ref().ok_or(VerificationError::NoActiveVerification)
    }

    pub fn bridge(&self) -> &SdkBridge {
        &self.bridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{
        ClientOptions, PersonaClient, PersonaClientFactory, ScriptLoader, ScriptRegistry,
        SdkCallbacks,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoLoader;

    #[async_trait]
    impl ScriptLoader for NoLoader {
        async fn load(&self, _src: &str) -> Result<(), VerificationError> {
            Ok(())
        }
    }

    struct NoFactory;

    impl PersonaClientFactory for NoFactory {
        fn construct(
            &self,
            _options: ClientOptions,
            _callbacks: SdkCallbacks,
        ) -> Result<Box<dyn PersonaClient>, VerificationError> {
            Err(VerificationError::Sdk("unused".into()))
        }
    }

    fn context() -> VerificationContext {
        let bridge = SdkBridge::new(
            ScriptRegistry::new("test://persona.js"),
            Arc::new(NoLoader),
            Arc::new(NoFactory),
        );
        VerificationContext::new(bridge)
    }

    #[test]
    fn guid_must_be_set_before_read() {
        let ctx = context();
        assert!(matches!(
            ctx.active_guid(),
            Err(VerificationError::NoActiveVerification)
        ));
    }

    #[test]
    fn newest_guid_replaces_previous() {
        let mut ctx = context();
        ctx.set_active_guid(Guid::new("idv-1"));
        ctx.set_active_guid(Guid::new("idv-2"));
        assert_eq!(ctx.active_guid().unwrap().as_str(), "idv-2");
    }
}
