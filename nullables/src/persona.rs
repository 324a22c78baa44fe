//! Nullable persona widget: a scripted client and a counting script loader.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kyc_verification::{
    ClientOptions, OptionsPatch, PersonaClient, PersonaClientFactory, ScriptLoader, SdkCallbacks,
    SdkEvent, VerificationError,
};

/// Records script injections instead of touching a document.
#[derive(Default)]
pub struct NullScriptLoader {
    loads: AtomicUsize,
    sources: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl NullScriptLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader whose every load fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptLoader for NullScriptLoader {
    async fn load(&self, src: &str) -> Result<(), VerificationError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().unwrap().push(src.to_string());
        match &self.failure {
            Some(message) => Err(VerificationError::ScriptLoad(message.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct WidgetState {
    constructed: usize,
    opens: usize,
    options: ClientOptions,
    callbacks: Option<SdkCallbacks>,
    on_open: VecDeque<Vec<SdkEvent>>,
}

/// Builds [`NullPersonaClient`]s that fire scripted callbacks.
///
/// By default a freshly constructed client reports `Ready`, the way the real
/// widget does once it has loaded. Reactions queued with
/// [`react_on_open`](Self::react_on_open) fire, one batch per call, whenever
/// the client is opened.
pub struct NullPersonaFactory {
    state: Arc<Mutex<WidgetState>>,
    on_construct: Vec<SdkEvent>,
    failure: Option<String>,
}

impl NullPersonaFactory {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(WidgetState::default())),
            on_construct: vec![SdkEvent::Ready],
            failure: None,
        }
    }

    /// A factory whose clients never report anything on their own.
    pub fn silent() -> Self {
        Self {
            on_construct: Vec::new(),
            ..Self::new()
        }
    }

    /// A factory that refuses to construct clients.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Fire `events` the next time the client is opened.
    pub fn react_on_open(&self, events: Vec<SdkEvent>) {
        self.state.lock().unwrap().on_open.push_back(events);
    }

    pub fn constructed(&self) -> usize {
        self.state.lock().unwrap().constructed
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn options(&self) -> ClientOptions {
        self.state.lock().unwrap().options.clone()
    }

    /// The callbacks currently wired into the client.
    pub fn callbacks(&self) -> Option<SdkCallbacks> {
        self.state.lock().unwrap().callbacks.clone()
    }
}

impl Default for NullPersonaFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaClientFactory for NullPersonaFactory {
    fn construct(
        &self,
        options: ClientOptions,
        callbacks: SdkCallbacks,
    ) -> Result<Box<dyn PersonaClient>, VerificationError> {
        if let Some(message) = &self.failure {
            return Err(VerificationError::Sdk(message.clone()));
        }

        {
            let mut state = self.state.lock().unwrap();
            state.constructed += 1;
            state.options = options;
            state.callbacks = Some(callbacks.clone());
        }
        for event in &self.on_construct {
            callbacks.emit(event.clone());
        }

        Ok(Box::new(NullPersonaClient {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Client handed out by [`NullPersonaFactory`]; shares its state.
pub struct NullPersonaClient {
    state: Arc<Mutex<WidgetState>>,
}

impl PersonaClient for NullPersonaClient {
    fn options(&self) -> ClientOptions {
        self.state.lock().unwrap().options.clone()
    }

    fn set_options(&mut self, patch: OptionsPatch) {
        let mut state = self.state.lock().unwrap();
        if let Some(inquiry_id) = patch.inquiry_id {
            state.options.inquiry_id = inquiry_id;
        }
        if let Some(language) = patch.language {
            state.options.language = language;
        }
        if let Some(callbacks) = patch.callbacks {
            state.callbacks = Some(callbacks);
        }
    }

    fn open(&mut self) -> Result<(), VerificationError> {
        let (callbacks, reaction) = {
            let mut state = self.state.lock().unwrap();
            state.opens += 1;
            (state.callbacks.clone(), state.on_open.pop_front())
        };

        if let (Some(callbacks), Some(events)) = (callbacks, reaction) {
            for event in events {
                callbacks.emit(event);
            }
        }
        Ok(())
    }
}
