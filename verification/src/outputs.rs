//! Last-value channels the host observes.
//!
//! Each output is a `watch` channel: any number of subscribers, each seeing
//! the most recent value on subscribe.

use kyc_types::{CustomerRecord, IdentityVerificationRecord};
use tokio::sync::watch;

use crate::bridge::ClientOptions;

pub struct VerificationOutputs {
    identity: watch::Sender<Option<IdentityVerificationRecord>>,
    customer: watch::Sender<Option<CustomerRecord>>,
    client: watch::Sender<Option<ClientOptions>>,
    loading: watch::Sender<bool>,
    error: watch::Sender<bool>,
    canceled: watch::Sender<bool>,
}

impl VerificationOutputs {
    pub fn new() -> Self {
        Self {
            identity: watch::channel(None).0,
            customer: watch::channel(None).0,
            client: watch::channel(None).0,
            loading: watch::channel(true).0,
            error: watch::channel(false).0,
            canceled: watch::channel(false).0,
        }
    }

    /// Put every flag back to its initial value ahead of a new run.
    ///
    /// Records and the client snapshot are kept so observers still see the
    /// last known state.
    pub fn reset_flags(&self) {
        self.loading.send_replace(true);
        self.error.send_replace(false);
        self.canceled.send_replace(false);
    }

    pub fn subscribe_identity(&self) -> watch::Receiver<Option<IdentityVerificationRecord>> {
        self.identity.subscribe()
    }

    pub fn subscribe_customer(&self) -> watch::Receiver<Option<CustomerRecord>> {
        self.customer.subscribe()
    }

    pub fn subscribe_client(&self) -> watch::Receiver<Option<ClientOptions>> {
        self.client.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<bool> {
        self.error.subscribe()
    }

    pub fn subscribe_canceled(&self) -> watch::Receiver<bool> {
        self.canceled.subscribe()
    }

    pub fn identity(&self) -> Option<IdentityVerificationRecord> {
        self.identity.borrow().clone()
    }

    pub fn customer(&self) -> Option<CustomerRecord> {
        self.customer.borrow().clone()
    }

    pub fn client(&self) -> Option<ClientOptions> {
        self.client.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn is_error(&self) -> bool {
        *self.error.borrow()
    }

    pub fn is_canceled(&self) -> bool {
        *self.canceled.borrow()
    }

    pub(crate) fn publish_identity(&self, record: IdentityVerificationRecord) {
        self.identity.send_replace(Some(record));
    }

    pub(crate) fn publish_customer(&self, record: CustomerRecord) {
        self.customer.send_replace(Some(record));
    }

    pub(crate) fn publish_client(&self, options: ClientOptions) {
        self.client.send_replace(Some(options));
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.loading.send_replace(loading);
    }

    pub(crate) fn set_error(&self) {
        self.error.send_replace(true);
    }

    pub(crate) fn set_canceled(&self) {
        self.canceled.send_replace(true);
    }
}

impl Default for VerificationOutputs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_types::CustomerState;

    #[test]
    fn initial_values() {
        let outputs = VerificationOutputs::new();
        assert!(outputs.is_loading());
        assert!(!outputs.is_error());
        assert!(!outputs.is_canceled());
        assert!(outputs.identity().is_none());
        assert!(outputs.customer().is_none());
    }

    #[test]
    fn late_subscribers_see_latest_value() {
        let outputs = VerificationOutputs::new();
        outputs.publish_customer(CustomerRecord::new(CustomerState::Verified));
        outputs.set_loading(false);

        let customer = outputs.subscribe_customer();
        let loading = outputs.subscribe_loading();
        assert_eq!(
            customer.borrow().as_ref().map(|c| c.state),
            Some(CustomerState::Verified)
        );
        assert!(!*loading.borrow());
    }

    #[test]
    fn reset_flags_keeps_records() {
        let outputs = VerificationOutputs::new();
        outputs.publish_customer(CustomerRecord::new(CustomerState::Frozen));
        outputs.set_error();
        outputs.set_canceled();
        outputs.set_loading(false);

        outputs.reset_flags();
        assert!(outputs.is_loading());
        assert!(!outputs.is_error());
        assert!(!outputs.is_canceled());
        assert!(outputs.customer().is_some());
    }
}
