//! Nullable verification service: scripted responses, recorded calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use kyc_types::{CustomerRecord, Guid, IdentityVerificationPage, IdentityVerificationRecord};
use kyc_verification::{RemoteCallError, VerificationService};

/// A call received by [`NullVerificationService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceCall {
    GetCustomer,
    ListIdentityVerifications { page: u32, per_page: u32 },
    CreateIdentityVerification,
    GetIdentityVerification(Guid),
}

type Scripted<T> = Result<T, RemoteCallError>;

/// A verification service that replays scripted responses.
///
/// Each operation has its own queue. Responses are consumed in order and the
/// last one repeats forever, so a single `storing` customer keeps the poll
/// spinning. An operation with nothing scripted fails with a remote error.
/// Identity-verification reads are queued per guid.
#[derive(Default)]
pub struct NullVerificationService {
    customers: Mutex<VecDeque<Scripted<CustomerRecord>>>,
    lists: Mutex<VecDeque<Scripted<IdentityVerificationPage>>>,
    creates: Mutex<VecDeque<Scripted<IdentityVerificationRecord>>>,
    records: Mutex<HashMap<Guid, VecDeque<Scripted<IdentityVerificationRecord>>>>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl NullVerificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_customer(&self, record: CustomerRecord) {
        self.customers.lock().unwrap().push_back(Ok(record));
    }

    pub fn push_customer_error(&self, message: &str) {
        self.customers
            .lock()
            .unwrap()
            .push_back(Err(RemoteCallError::new(message)));
    }

    pub fn push_list(&self, page: IdentityVerificationPage) {
        self.lists.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_list_error(&self, message: &str) {
        self.lists
            .lock()
            .unwrap()
            .push_back(Err(RemoteCallError::new(message)));
    }

    pub fn push_create(&self, record: IdentityVerificationRecord) {
        self.creates.lock().unwrap().push_back(Ok(record));
    }

    pub fn push_create_error(&self, message: &str) {
        self.creates
            .lock()
            .unwrap()
            .push_back(Err(RemoteCallError::new(message)));
    }

    /// Queue a read result for the record's guid.
    pub fn push_record(&self, record: IdentityVerificationRecord) {
        self.records
            .lock()
            .unwrap()
            .entry(record.guid.clone())
            .or_default()
            .push_back(Ok(record));
    }

    pub fn push_record_error(&self, guid: impl Into<Guid>, message: &str) {
        self.records
            .lock()
            .unwrap()
            .entry(guid.into())
            .or_default()
            .push_back(Err(RemoteCallError::new(message)));
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count(&self, matches: impl Fn(&ServiceCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    fn record_call(&self, call: ServiceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next_response<T: Clone>(queue: &mut VecDeque<Scripted<T>>, operation: &str) -> Scripted<T> {
    if queue.len() > 1 {
        if let Some(response) = queue.pop_front() {
            return response;
        }
    }
    queue
        .front()
        .cloned()
        .unwrap_or_else(|| Err(RemoteCallError::new(format!("no scripted response for {operation}"))))
}

#[async_trait]
impl VerificationService for NullVerificationService {
    async fn get_customer(&self) -> Result<CustomerRecord, RemoteCallError> {
        self.record_call(ServiceCall::GetCustomer);
        next_response(&mut self.customers.lock().unwrap(), "get_customer")
    }

    async fn list_identity_verifications(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<IdentityVerificationPage, RemoteCallError> {
        self.record_call(ServiceCall::ListIdentityVerifications { page, per_page });
        next_response(&mut self.lists.lock().unwrap(), "list_identity_verifications")
    }

    async fn create_identity_verification(
        &self,
    ) -> Result<IdentityVerificationRecord, RemoteCallError> {
        self.record_call(ServiceCall::CreateIdentityVerification);
        next_response(&mut self.creates.lock().unwrap(), "create_identity_verification")
    }

    async fn get_identity_verification(
        &self,
        guid: &Guid,
    ) -> Result<IdentityVerificationRecord, RemoteCallError> {
        self.record_call(ServiceCall::GetIdentityVerification(guid.clone()));
        let mut records = self.records.lock().unwrap();
        let queue = records.entry(guid.clone()).or_default();
        next_response(queue, "get_identity_verification")
    }
}
