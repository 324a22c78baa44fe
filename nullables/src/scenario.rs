//! Scripted scenarios: a JSON description of everything the collaborators
//! should answer, and the bundle of nullables built from it.

use std::path::Path;
use std::sync::Arc;

use kyc_types::{CustomerRecord, Guid, IdentityVerificationPage, IdentityVerificationRecord};
use kyc_verification::{Collaborators, ScriptRegistry, SdkEvent, PERSONA_SCRIPT_SRC};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persona::{NullPersonaFactory, NullScriptLoader};
use crate::service::NullVerificationService;
use crate::sinks::{NullConfigSource, NullErrorSink, NullEventSink, NullRouter};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One of the nullable collaborators, shared with the test or runner that
/// built it so calls can be inspected afterwards.
pub struct NullCollaborators {
    pub service: Arc<NullVerificationService>,
    pub config: Arc<NullConfigSource>,
    pub events: Arc<NullEventSink>,
    pub errors: Arc<NullErrorSink>,
    pub router: Arc<NullRouter>,
    pub loader: Arc<NullScriptLoader>,
    pub factory: Arc<NullPersonaFactory>,
    pub scripts: Arc<ScriptRegistry>,
}

impl NullCollaborators {
    pub fn new() -> Self {
        Self {
            service: Arc::new(NullVerificationService::new()),
            config: Arc::new(NullConfigSource::default()),
            events: Arc::new(NullEventSink::new()),
            errors: Arc::new(NullErrorSink::new()),
            router: Arc::new(NullRouter::new()),
            loader: Arc::new(NullScriptLoader::new()),
            factory: Arc::new(NullPersonaFactory::new()),
            scripts: ScriptRegistry::new(PERSONA_SCRIPT_SRC),
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.config = Arc::new(NullConfigSource::new(locale));
        self
    }

    pub fn with_factory(mut self, factory: NullPersonaFactory) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn with_loader(mut self, loader: NullScriptLoader) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Share a script registry with other contexts in the same process.
    pub fn with_scripts(mut self, scripts: Arc<ScriptRegistry>) -> Self {
        self.scripts = scripts;
        self
    }

    /// The collaborator set the orchestrator consumes.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            service: self.service.clone(),
            config: self.config.clone(),
            events: self.events.clone(),
            errors: self.errors.clone(),
            script_loader: self.loader.clone(),
            client_factory: self.factory.clone(),
            scripts: Arc::clone(&self.scripts),
        }
    }
}

impl Default for NullCollaborators {
    fn default() -> Self {
        Self::new()
    }
}

/// A scripted response: the value, or `{"error": "..."}`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scripted<T> {
    Err { error: String },
    Ok(T),
}

/// A scripted identity-verification read. Errors name the guid they answer.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScriptedRecord {
    Err { guid: Guid, error: String },
    Ok(IdentityVerificationRecord),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetEvent {
    Ready,
    Complete,
    Cancel,
    Error(String),
}

impl From<WidgetEvent> for SdkEvent {
    fn from(event: WidgetEvent) -> Self {
        match event {
            WidgetEvent::Ready => SdkEvent::Ready,
            WidgetEvent::Complete => SdkEvent::Complete,
            WidgetEvent::Cancel => SdkEvent::Cancel,
            WidgetEvent::Error(detail) => SdkEvent::Error(detail),
        }
    }
}

/// How the scripted widget behaves.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WidgetScript {
    /// Report `Ready` as soon as the client is constructed.
    #[serde(default = "default_true")]
    pub ready_on_construct: bool,
    /// One batch of events per `open()`.
    #[serde(default)]
    pub on_open: Vec<Vec<WidgetEvent>>,
    /// Fail every script load with this message.
    #[serde(default)]
    pub script_error: Option<String>,
}

impl Default for WidgetScript {
    fn default() -> Self {
        Self {
            ready_on_construct: true,
            on_open: Vec::new(),
            script_error: None,
        }
    }
}

/// A complete scripted run.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Scenario {
    /// Overrides the default `en-US` config source when set.
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub customers: Vec<Scripted<CustomerRecord>>,
    #[serde(default)]
    pub identity_lists: Vec<Scripted<IdentityVerificationPage>>,
    #[serde(default)]
    pub creates: Vec<Scripted<IdentityVerificationRecord>>,
    #[serde(default)]
    pub records: Vec<ScriptedRecord>,
    #[serde(default)]
    pub widget: WidgetScript,
}

fn default_true() -> bool {
    true
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build the nullables that replay this scenario.
    pub fn into_collaborators(self) -> NullCollaborators {
        let service = NullVerificationService::new();
        for customer in self.customers {
            match customer {
                Scripted::Ok(record) => service.push_customer(record),
                Scripted::Err { error } => service.push_customer_error(&error),
            }
        }
        if self.identity_lists.is_empty() {
            service.push_list(IdentityVerificationPage::empty());
        }
        for page in self.identity_lists {
            match page {
                Scripted::Ok(page) => service.push_list(page),
                Scripted::Err { error } => service.push_list_error(&error),
            }
        }
        for created in self.creates {
            match created {
                Scripted::Ok(record) => service.push_create(record),
                Scripted::Err { error } => service.push_create_error(&error),
            }
        }
        for read in self.records {
            match read {
                ScriptedRecord::Ok(record) => service.push_record(record),
                ScriptedRecord::Err { guid, error } => service.push_record_error(guid, &error),
            }
        }

        let factory = if self.widget.ready_on_construct {
            NullPersonaFactory::new()
        } else {
            NullPersonaFactory::silent()
        };
        for batch in self.widget.on_open {
            factory.react_on_open(batch.into_iter().map(SdkEvent::from).collect());
        }

        let loader = match self.widget.script_error {
            Some(message) => NullScriptLoader::failing(message),
            None => NullScriptLoader::new(),
        };

        let mut collaborators = NullCollaborators::new()
            .with_factory(factory)
            .with_loader(loader);
        if let Some(locale) = &self.locale {
            collaborators = collaborators.with_locale(locale);
        }
        collaborators.service = Arc::new(service);
        collaborators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceCall;
    use kyc_types::{CustomerState, IdentityState, PersonaState};
    use kyc_verification::VerificationService;

    const SCENARIO: &str = r#"{
        "locale": "fr-CA",
        "customers": [{"state": "storing"}, {"state": "unverified"}],
        "creates": [{"guid": "idv-1", "state": "waiting", "persona_state": "waiting", "persona_inquiry_id": "inq_1"}],
        "records": [
            {"guid": "idv-1", "state": "waiting", "persona_state": "waiting", "persona_inquiry_id": "inq_1"},
            {"guid": "idv-1", "error": "gateway timeout"}
        ],
        "widget": {"on_open": [["complete"], [{"error": "camera denied"}]]}
    }"#;

    #[test]
    fn parses_records_errors_and_widget_events() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert_eq!(scenario.locale.as_deref(), Some("fr-CA"));
        assert_eq!(scenario.customers.len(), 2);
        assert!(matches!(
            &scenario.customers[0],
            Scripted::Ok(CustomerRecord { state: CustomerState::Storing, .. })
        ));
        assert!(matches!(&scenario.records[1], ScriptedRecord::Err { error, .. } if error == "gateway timeout"));
        assert!(scenario.widget.ready_on_construct);
        assert!(matches!(scenario.widget.on_open[1][0], WidgetEvent::Error(_)));
    }

    #[tokio::test]
    async fn collaborators_replay_the_script() {
        let nulls = Scenario::from_json(SCENARIO).unwrap().into_collaborators();

        let page = nulls.service.list_identity_verifications(0, 1).await.unwrap();
        assert!(page.objects.is_empty());

        let created = nulls.service.create_identity_verification().await.unwrap();
        assert_eq!(created.state, IdentityState::Waiting);

        let read = nulls.service.get_identity_verification(&created.guid).await.unwrap();
        assert_eq!(read.persona_state, PersonaState::Waiting);
        let failed = nulls.service.get_identity_verification(&created.guid).await;
        assert!(failed.is_err());

        assert_eq!(
            nulls.service.calls()[0],
            ServiceCall::ListIdentityVerifications { page: 0, per_page: 1 }
        );
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Scenario::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }
}
