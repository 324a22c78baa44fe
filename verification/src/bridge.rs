//! Bridge to the third-party persona widget.
//!
//! The widget is loaded from a script exactly once per process
//! ([`ScriptRegistry`]) and constructed at most once per verification context.
//! Later bootstraps reconfigure the existing client in place and reopen it.
//!
//! Widget callbacks never call back into the orchestrator directly. They are
//! delivered as [`SdkEvent`]s over a channel, each stamped with the
//! generation of the wiring that produced them. Rewiring bumps the
//! generation, so a callback bound to an older wiring is dropped on receipt.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use kyc_types::persona_language_alias;
use tokio::sync::{mpsc, OnceCell};

use crate::error::{FlowLevel, VerificationError};
use crate::report::Reporter;
use crate::sinks::{EventCode, EventLevel};

/// Default location of the persona widget script.
pub const PERSONA_SCRIPT_SRC: &str = "https://cdn.withpersona.com/dist/persona-v4.8.0.js";

/// Lifecycle callbacks reported by the widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SdkEvent {
    Ready,
    Complete,
    Cancel,
    Error(String),
}

struct SdkSignal {
    generation: u64,
    event: SdkEvent,
}

/// Callback set handed to the widget. Cloning is cheap.
#[derive(Clone)]
pub struct SdkCallbacks {
    generation: u64,
    tx: mpsc::UnboundedSender<SdkSignal>,
}

impl SdkCallbacks {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn on_ready(&self) {
        self.emit(SdkEvent::Ready);
    }

    pub fn on_complete(&self) {
        self.emit(SdkEvent::Complete);
    }

    pub fn on_cancel(&self) {
        self.emit(SdkEvent::Cancel);
    }

    pub fn on_error(&self, detail: impl Into<String>) {
        self.emit(SdkEvent::Error(detail.into()));
    }

    pub fn emit(&self, event: SdkEvent) {
        let signal = SdkSignal {
            generation: self.generation,
            event,
        };
        if self.tx.send(signal).is_err() {
            tracing::debug!(generation = self.generation, "widget callback after bridge dropped");
        }
    }
}

impl std::fmt::Debug for SdkCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkCallbacks")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Mutable widget configuration visible to the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// `None` after a cancel; a reopen must supply a fresh inquiry.
    pub inquiry_id: Option<String>,
    pub language: String,
}

/// Partial update of a client's options. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct OptionsPatch {
    pub inquiry_id: Option<Option<String>>,
    pub language: Option<String>,
    pub callbacks: Option<SdkCallbacks>,
}

/// Narrow view of the widget client.
pub trait PersonaClient: Send + Sync {
    fn options(&self) -> ClientOptions;

    fn set_options(&mut self, patch: OptionsPatch);

    fn open(&mut self) -> Result<(), VerificationError>;
}

/// Constructs widget clients once the script is available.
pub trait PersonaClientFactory: Send + Sync {
    fn construct(
        &self,
        options: ClientOptions,
        callbacks: SdkCallbacks,
    ) -> Result<Box<dyn PersonaClient>, VerificationError>;
}

/// Injects the widget script into the host environment.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    async fn load(&self, src: &str) -> Result<(), VerificationError>;
}

/// Process-wide handle on the widget script.
///
/// The first successful [`acquire`](Self::acquire) loads the script; later
/// acquires reuse it. A failed load leaves the registry unloaded so the next
/// acquire tries again. The script is never unloaded.
pub struct ScriptRegistry {
    src: String,
    loaded: OnceCell<()>,
    holders: AtomicUsize,
}

impl ScriptRegistry {
    pub fn new(src: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            src: src.into(),
            loaded: OnceCell::new(),
            holders: AtomicUsize::new(0),
        })
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Number of live leases.
    pub fn holders(&self) -> usize {
        self.holders.load(Ordering::Acquire)
    }

    pub async fn acquire(
        self: &Arc<Self>,
        loader: &dyn ScriptLoader,
    ) -> Result<ScriptLease, VerificationError> {
        self.loaded
            .get_or_try_init(|| async {
                tracing::info!(src = %self.src, "loading persona script");
                loader.load(&self.src).await
            })
            .await?;

        self.holders.fetch_add(1, Ordering::AcqRel);
        Ok(ScriptLease {
            registry: Arc::clone(self),
        })
    }
}

/// Keeps the registry's holder count while alive.
pub struct ScriptLease {
    registry: Arc<ScriptRegistry>,
}

impl Drop for ScriptLease {
    fn drop(&mut self) {
        self.registry.holders.fetch_sub(1, Ordering::AcqRel);
    }
}

/// How a bootstrap reached an open widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bootstrap {
    /// Script acquired and a new client constructed; it opens once ready.
    Constructed,
    /// Existing client reconfigured and reopened.
    Reopened,
}

/// What the orchestrator should do after a widget event.
#[derive(Debug)]
pub enum BridgeOutcome {
    /// Keep waiting for widget events.
    Continue,
    /// The user submitted; re-check the identity verification once.
    CheckIdentity,
    Canceled,
    Failed(VerificationError),
}

/// Owns the single widget client of one verification context.
pub struct SdkBridge {
    registry: Arc<ScriptRegistry>,
    loader: Arc<dyn ScriptLoader>,
    factory: Arc<dyn PersonaClientFactory>,
    client: Option<Box<dyn PersonaClient>>,
    lease: Option<ScriptLease>,
    generation: u64,
    events_tx: mpsc::UnboundedSender<SdkSignal>,
    events_rx: mpsc::UnboundedReceiver<SdkSignal>,
}

impl SdkBridge {
    pub fn new(
        registry: Arc<ScriptRegistry>,
        loader: Arc<dyn ScriptLoader>,
        factory: Arc<dyn PersonaClientFactory>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            loader,
            factory,
            client: None,
            lease: None,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn client_options(&self) -> Option<ClientOptions> {
        self.client.as_ref().map(|client| client.options())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Show the widget for `inquiry_id`.
    ///
    /// Reconfiguration (options and callbacks) always completes before
    /// `open()` is invoked on an existing client.
    pub async fn bootstrap(
        &mut self,
        inquiry_id: &str,
        locale: &str,
    ) -> Result<Bootstrap, VerificationError> {
        let language = persona_language_alias(locale);
        let callbacks = self.rewire();

        if let Some(client) = self.client.as_mut() {
            client.set_options(OptionsPatch {
                inquiry_id: Some(Some(inquiry_id.to_string())),
                language: Some(language),
                callbacks: Some(callbacks),
            });
            client.open()?;
            tracing::info!(inquiry_id, generation = self.generation, "persona client reopened");
            return Ok(Bootstrap::Reopened);
        }

        if self.lease.is_none() {
            let lease = self.registry.acquire(self.loader.as_ref()).await?;
            self.lease = Some(lease);
        }

        let options = ClientOptions {
            inquiry_id: Some(inquiry_id.to_string()),
            language,
        };
        let client = self.factory.construct(options, callbacks)?;
        self.client = Some(client);
        tracing::info!(inquiry_id, generation = self.generation, "persona client constructed");
        Ok(Bootstrap::Constructed)
    }

    /// Wait for the next event from the current wiring.
    pub async fn next_event(&mut self) -> Option<SdkEvent> {
        loop {
            let signal = self.events_rx.recv().await?;
            if signal.generation == self.generation {
                return Some(signal.event);
            }
            tracing::debug!(
                stale = signal.generation,
                current = self.generation,
                event = ?signal.event,
                "dropping stale widget callback"
            );
        }
    }

    /// Apply a widget event to the client and the host-visible outputs.
    pub fn handle_event(&mut self, event: SdkEvent, reporter: &Reporter) -> BridgeOutcome {
        match event {
            SdkEvent::Ready => {
                let Some(client) = self.client.as_mut() else {
                    return BridgeOutcome::Continue;
                };
                reporter.outputs().publish_client(client.options());
                match client.open() {
                    Ok(()) => BridgeOutcome::Continue,
                    Err(e) => {
                        reporter.fail(FlowLevel::Sdk, &e);
                        BridgeOutcome::Failed(e)
                    }
                }
            }
            SdkEvent::Complete => {
                reporter.event(EventLevel::Info, EventCode::KycSubmitted, "KYC has been submitted");
                BridgeOutcome::CheckIdentity
            }
            SdkEvent::Cancel => {
                reporter.event(
                    EventLevel::Warning,
                    EventCode::PersonaSdkCancel,
                    "Persona SDK has been canceled",
                );
                if let Some(client) = self.client.as_mut() {
                    client.set_options(OptionsPatch {
                        inquiry_id: Some(None),
                        ..OptionsPatch::default()
                    });
                    reporter.outputs().publish_client(client.options());
                }
                reporter.outputs().set_canceled();
                reporter.outputs().set_loading(false);
                BridgeOutcome::Canceled
            }
            SdkEvent::Error(detail) => {
                let error = VerificationError::Sdk(detail.clone());
                reporter.sdk_error(&detail, &error);
                BridgeOutcome::Failed(error)
            }
        }
    }

    /// Invalidate every callback handed out so far and discard queued events.
    pub fn invalidate_callbacks(&mut self) {
        self.generation += 1;
        while self.events_rx.try_recv().is_ok() {}
    }

    fn rewire(&mut self) -> SdkCallbacks {
        self.generation += 1;
        SdkCallbacks {
            generation: self.generation,
            tx: self.events_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::VerificationOutputs;
    use crate::sinks::{ErrorSink, EventSink};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ScriptLoader for CountingLoader {
        async fn load(&self, src: &str) -> Result<(), VerificationError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(VerificationError::ScriptLoad(src.to_string()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorded {
        constructed: usize,
        opens: usize,
        options: ClientOptions,
        callbacks: Option<SdkCallbacks>,
    }

    struct FakeClient {
        shared: Arc<Mutex<Recorded>>,
    }

    impl PersonaClient for FakeClient {
        fn options(&self) -> ClientOptions {
            self.shared.lock().unwrap().options.clone()
        }

        fn set_options(&mut self, patch: OptionsPatch) {
            let mut shared = self.shared.lock().unwrap();
            if let Some(inquiry_id) = patch.inquiry_id {
                shared.options.inquiry_id = inquiry_id;
            }
            if let Some(language) = patch.language {
                shared.options.language = language;
            }
            if let Some(callbacks) = patch.callbacks {
                shared.callbacks = Some(callbacks);
            }
        }

        fn open(&mut self) -> Result<(), VerificationError> {
            self.shared.lock().unwrap().opens += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeFactory {
        shared: Arc<Mutex<Recorded>>,
    }

    impl PersonaClientFactory for FakeFactory {
        fn construct(
            &self,
            options: ClientOptions,
            callbacks: SdkCallbacks,
        ) -> Result<Box<dyn PersonaClient>, VerificationError> {
            let mut shared = self.shared.lock().unwrap();
            shared.constructed += 1;
            shared.options = options;
            shared.callbacks = Some(callbacks);
            Ok(Box::new(FakeClient {
                shared: Arc::clone(&self.shared),
            }))
        }
    }

    #[derive(Default)]
    struct Events(Mutex<Vec<(EventLevel, EventCode)>>);

    impl EventSink for Events {
        fn handle_event(&self, level: EventLevel, code: EventCode, _: &str, _: Option<&str>) {
            self.0.lock().unwrap().push((level, code));
        }
    }

    #[derive(Default)]
    struct Errors(Mutex<Vec<String>>);

    impl ErrorSink for Errors {
        fn handle_error(&self, error: &VerificationError) {
            self.0.lock().unwrap().push(error.to_string());
        }
    }

    struct Harness {
        loader: Arc<CountingLoader>,
        factory: Arc<FakeFactory>,
        registry: Arc<ScriptRegistry>,
        events: Arc<Events>,
        errors: Arc<Errors>,
        outputs: Arc<VerificationOutputs>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                loader: Arc::new(CountingLoader::default()),
                factory: Arc::new(FakeFactory::default()),
                registry: ScriptRegistry::new(PERSONA_SCRIPT_SRC),
                events: Arc::new(Events::default()),
                errors: Arc::new(Errors::default()),
                outputs: Arc::new(VerificationOutputs::new()),
            }
        }

        fn bridge(&self) -> SdkBridge {
            SdkBridge::new(
                Arc::clone(&self.registry),
                self.loader.clone(),
                self.factory.clone(),
            )
        }

        fn reporter(&self) -> Reporter {
            Reporter::new(self.events.clone(), self.errors.clone(), Arc::clone(&self.outputs))
        }

        fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
            self.factory.shared.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn second_bootstrap_reuses_client_without_reloading() {
        let h = Harness::new();
        let mut bridge = h.bridge();

        let first = bridge.bootstrap("inq_1", "en-US").await.unwrap();
        assert_eq!(first, Bootstrap::Constructed);
        let second = bridge.bootstrap("inq_2", "fr-CA").await.unwrap();
        assert_eq!(second, Bootstrap::Reopened);

        assert_eq!(h.loader.loads.load(Ordering::SeqCst), 1);
        let recorded = h.recorded();
        assert_eq!(recorded.constructed, 1);
        assert_eq!(recorded.opens, 1);
        assert_eq!(recorded.options.inquiry_id.as_deref(), Some("inq_2"));
        assert_eq!(recorded.options.language, "fr");
        assert_eq!(recorded.callbacks.as_ref().unwrap().generation(), bridge.generation());
    }

    #[tokio::test]
    async fn script_is_loaded_once_per_process() {
        let h = Harness::new();
        let mut a = h.bridge();
        let mut b = h.bridge();

        a.bootstrap("inq_a", "en-US").await.unwrap();
        b.bootstrap("inq_b", "en-US").await.unwrap();

        assert_eq!(h.loader.loads.load(Ordering::SeqCst), 1);
        assert!(h.registry.is_loaded());
        assert_eq!(h.registry.holders(), 2);

        drop(a);
        assert_eq!(h.registry.holders(), 1);
    }

    #[tokio::test]
    async fn failed_script_load_is_retried_on_next_bootstrap() {
        let mut h = Harness::new();
        h.loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
            fail: true,
        });
        let mut bridge = h.bridge();

        let err = bridge.bootstrap("inq_1", "en-US").await.unwrap_err();
        assert!(matches!(err, VerificationError::ScriptLoad(_)));
        assert!(!bridge.has_client());

        bridge.bootstrap("inq_1", "en-US").await.unwrap_err();
        assert_eq!(h.loader.loads.load(Ordering::SeqCst), 2);
        assert!(!h.registry.is_loaded());
    }

    #[tokio::test]
    async fn ready_publishes_client_then_opens() {
        let h = Harness::new();
        let mut bridge = h.bridge();
        bridge.bootstrap("inq_1", "fr-CA").await.unwrap();

        let callbacks = h.recorded().callbacks.clone().unwrap();
        callbacks.on_ready();

        let event = bridge.next_event().await.unwrap();
        assert_eq!(event, SdkEvent::Ready);
        let outcome = bridge.handle_event(event, &h.reporter());
        assert!(matches!(outcome, BridgeOutcome::Continue));

        assert_eq!(h.recorded().opens, 1);
        let published = h.outputs.client().unwrap();
        assert_eq!(published.inquiry_id.as_deref(), Some("inq_1"));
        assert_eq!(published.language, "fr");
    }

    #[tokio::test]
    async fn callbacks_from_old_wiring_are_dropped() {
        let h = Harness::new();
        let mut bridge = h.bridge();
        bridge.bootstrap("inq_1", "en-US").await.unwrap();
        let stale = h.recorded().callbacks.clone().unwrap();

        bridge.bootstrap("inq_2", "en-US").await.unwrap();
        let current = h.recorded().callbacks.clone().unwrap();

        stale.on_cancel();
        current.on_complete();

        assert_eq!(bridge.next_event().await, Some(SdkEvent::Complete));
    }

    #[tokio::test]
    async fn invalidated_callbacks_are_suppressed() {
        let h = Harness::new();
        let mut bridge = h.bridge();
        bridge.bootstrap("inq_1", "en-US").await.unwrap();
        let callbacks = h.recorded().callbacks.clone().unwrap();

        callbacks.on_complete();
        bridge.invalidate_callbacks();
        callbacks.on_cancel();

        let next = tokio::time::timeout(std::time::Duration::from_millis(10), bridge.next_event()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn cancel_clears_inquiry_and_sets_flags() {
        let h = Harness::new();
        let mut bridge = h.bridge();
        bridge.bootstrap("inq_1", "en-US").await.unwrap();

        let outcome = bridge.handle_event(SdkEvent::Cancel, &h.reporter());
        assert!(matches!(outcome, BridgeOutcome::Canceled));

        assert_eq!(h.recorded().options.inquiry_id, None);
        assert!(h.outputs.is_canceled());
        assert!(!h.outputs.is_loading());
        assert_eq!(
            h.events.0.lock().unwrap().as_slice(),
            &[(EventLevel::Warning, EventCode::PersonaSdkCancel)]
        );
    }

    #[tokio::test]
    async fn widget_error_sets_error_flag_and_reports() {
        let h = Harness::new();
        let mut bridge = h.bridge();
        bridge.bootstrap("inq_1", "en-US").await.unwrap();

        let outcome = bridge.handle_event(SdkEvent::Error("camera denied".into()), &h.reporter());
        assert!(matches!(outcome, BridgeOutcome::Failed(VerificationError::Sdk(_))));
        assert!(h.outputs.is_error());
        assert_eq!(
            h.events.0.lock().unwrap().as_slice(),
            &[(EventLevel::Error, EventCode::PersonaSdkError)]
        );
        assert_eq!(h.errors.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn complete_requests_identity_check() {
        let h = Harness::new();
        let mut bridge = h.bridge();
        let outcome = bridge.handle_event(SdkEvent::Complete, &h.reporter());
        assert!(matches!(outcome, BridgeOutcome::CheckIdentity));
        assert_eq!(
            h.events.0.lock().unwrap().as_slice(),
            &[(EventLevel::Info, EventCode::KycSubmitted)]
        );
    }
}
