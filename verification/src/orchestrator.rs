//! Verification orchestrator: drives the customer, identity-verification and
//! persona state machines to a [`FlowOutcome`].
//!
//! The flow is an explicit loop over [`Step`]s. The `expired` persona state
//! transitions back to [`Step::Customer`] instead of recursing, so repeated
//! expirations never grow the stack.

use std::sync::Arc;
use std::time::Duration;

use kyc_poll::{Poll, PollConfig, PollSession, SessionEnd};
use kyc_types::{
    CustomerRecord, CustomerState, IdentityState, IdentityVerificationRecord, PersonaState,
};
use tokio::sync::watch;

use crate::bridge::{BridgeOutcome, PersonaClientFactory, ScriptLoader, ScriptRegistry, SdkBridge};
use crate::context::VerificationContext;
use crate::error::{FlowLevel, VerificationError};
use crate::outputs::VerificationOutputs;
use crate::report::Reporter;
use crate::service::{ConfigSource, VerificationService};
use crate::sinks::{ErrorSink, EventCode, EventLevel, EventSink};

/// Spacing between remote reads while polling.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum time a single poll session may run.
pub const POLL_DURATION: Duration = Duration::from_secs(120);

/// Only the latest identity verification matters.
const LIST_PAGE: u32 = 0;
const LIST_PER_PAGE: u32 = 1;

pub fn default_poll_config() -> PollConfig {
    PollConfig::new(POLL_INTERVAL, POLL_DURATION)
}

/// Everything the orchestrator consumes from its host.
#[derive(Clone)]
pub struct Collaborators {
    pub service: Arc<dyn VerificationService>,
    pub config: Arc<dyn ConfigSource>,
    pub events: Arc<dyn EventSink>,
    pub errors: Arc<dyn ErrorSink>,
    pub script_loader: Arc<dyn ScriptLoader>,
    pub client_factory: Arc<dyn PersonaClientFactory>,
    pub scripts: Arc<ScriptRegistry>,
}

/// How a run ended.
#[derive(Debug)]
pub enum FlowOutcome {
    /// The customer level reached verified, rejected or frozen.
    Customer(CustomerRecord),
    /// The identity verification settled.
    Identity(IdentityVerificationRecord),
    /// The user closed the widget.
    Canceled,
    Failed(VerificationError),
    /// The teardown signal fired first.
    TornDown,
}

impl FlowOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Customer(_) => "customer",
            Self::Identity(_) => "identity",
            Self::Canceled => "canceled",
            Self::Failed(_) => "failed",
            Self::TornDown => "torn_down",
        }
    }
}

enum Step {
    Customer,
    IdentityVerification,
    PollIdentity,
    Identity(IdentityVerificationRecord),
    AwaitSdk,
    CheckIdentity,
    Finished(FlowOutcome),
}

pub struct VerificationOrchestrator {
    service: Arc<dyn VerificationService>,
    config: Arc<dyn ConfigSource>,
    reporter: Reporter,
    outputs: Arc<VerificationOutputs>,
    poll: Poll,
    context: VerificationContext,
    restarts: u32,
}

impl VerificationOrchestrator {
    /// Build an orchestrator. The error flag is wired in as the poll timeout
    /// signal, so raising it ends any running poll.
    pub fn new(collaborators: Collaborators, poll_config: PollConfig) -> Self {
        let outputs = Arc::new(VerificationOutputs::new());
        let poll = Poll::new(poll_config.with_timeout_signal(outputs.subscribe_error()));
        let reporter = Reporter::new(
            collaborators.events,
            collaborators.errors,
            Arc::clone(&outputs),
        );
        let bridge = SdkBridge::new(
            collaborators.scripts,
            collaborators.script_loader,
            collaborators.client_factory,
        );

        Self {
            service: collaborators.service,
            config: collaborators.config,
            reporter,
            outputs,
            poll,
            context: VerificationContext::new(bridge),
            restarts: 0,
        }
    }

    pub fn outputs(&self) -> Arc<VerificationOutputs> {
        Arc::clone(&self.outputs)
    }

    pub fn context(&self) -> &VerificationContext {
        &self.context
    }

    /// How many times an expired persona inquiry restarted the flow.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Run the whole flow from the customer level.
    pub async fn run(&mut self, teardown: watch::Receiver<bool>) -> FlowOutcome {
        self.reporter.event(
            EventLevel::Info,
            EventCode::ComponentInit,
            "Initializing identity-verification component",
        );
        self.outputs.reset_flags();
        self.drive_until_teardown(Step::Customer, teardown).await
    }

    /// Re-fetch the active identity verification once and resolve it without
    /// starting a poll session.
    pub async fn check_identity(&mut self, teardown: watch::Receiver<bool>) -> FlowOutcome {
        self.drive_until_teardown(Step::CheckIdentity, teardown).await
    }

    async fn drive_until_teardown(
        &mut self,
        start: Step,
        mut teardown: watch::Receiver<bool>,
    ) -> FlowOutcome {
        let outcome = tokio::select! {
            biased;
            _ = torn_down(&mut teardown) => None,
            outcome = self.drive(start) => Some(outcome),
        };

        match outcome {
            Some(outcome) => {
                tracing::info!(outcome = outcome.label(), "verification flow finished");
                outcome
            }
            None => {
                tracing::info!("verification flow torn down");
                self.context.bridge.invalidate_callbacks();
                FlowOutcome::TornDown
            }
        }
    }

    async fn drive(&mut self, mut step: Step) -> FlowOutcome {
        loop {
            step = match step {
                Step::Customer => self.resolve_customer().await,
                Step::IdentityVerification => self.verify_identity().await,
                Step::PollIdentity => self.poll_identity().await,
                Step::Identity(record) => self.handle_identity_state(record).await,
                Step::AwaitSdk => self.await_sdk().await,
                Step::CheckIdentity => self.check_identity_once().await,
                Step::Finished(outcome) => return outcome,
            };
        }
    }

    // ── Customer level ─────────────────────────────────────────────────

    async fn resolve_customer(&mut self) -> Step {
        let mut session = self.poll.start();
        loop {
            if session.next_tick().await.is_none() {
                return self.poll_ended(FlowLevel::Customer, &session);
            }

            let customer = match session.guard(self.service.get_customer()).await {
                Ok(Ok(customer)) => customer,
                Ok(Err(e)) => {
                    session.stop();
                    return self.fail(FlowLevel::Customer, e.into());
                }
                Err(end) => return self.timed_out(FlowLevel::Customer, end),
            };

            if customer.state == CustomerState::Storing {
                tracing::debug!(tick = session.ticks(), "customer still storing");
                continue;
            }

            session.stop();
            return self.handle_customer_state(customer);
        }
    }

    fn handle_customer_state(&self, customer: CustomerRecord) -> Step {
        match customer.state {
            CustomerState::Unverified => {
                tracing::info!("customer unverified, starting identity verification");
                Step::IdentityVerification
            }
            state if state.is_terminal() => {
                match state {
                    CustomerState::Rejected => self.reporter.event(
                        EventLevel::Warning,
                        EventCode::KycRejected,
                        "Customer KYC has been rejected",
                    ),
                    CustomerState::Frozen => self.reporter.event(
                        EventLevel::Warning,
                        EventCode::CustomerFrozen,
                        "Customer has been frozen",
                    ),
                    _ => {}
                }
                self.outputs.publish_customer(customer.clone());
                self.outputs.set_loading(false);
                Step::Finished(FlowOutcome::Customer(customer))
            }
            state => self.fail(
                FlowLevel::Customer,
                VerificationError::unrecognized(FlowLevel::Customer, state.as_str()),
            ),
        }
    }

    // ── Identity-verification level ────────────────────────────────────

    async fn verify_identity(&mut self) -> Step {
        self.outputs.set_loading(true);
        match self.resolve_identity_record().await {
            Ok(record) => {
                self.context.set_active_guid(record.guid);
                Step::PollIdentity
            }
            Err(e) => self.fail(FlowLevel::IdentityVerification, e),
        }
    }

    /// Pick the record to poll: reuse an open attempt where possible, and
    /// never resume a persona session the third party already closed.
    async fn resolve_identity_record(&self) -> Result<IdentityVerificationRecord, VerificationError> {
        let page = self
            .service
            .list_identity_verifications(LIST_PAGE, LIST_PER_PAGE)
            .await?;

        let base = match page.first() {
            Some(existing) if existing.state.is_open() => {
                tracing::debug!(guid = %existing.guid, state = %existing.state, "reusing open identity verification");
                existing.clone()
            }
            _ => self.service.create_identity_verification().await?,
        };

        let detailed = self.service.get_identity_verification(&base.guid).await?;
        if detailed.persona_state.is_resumable() {
            return Ok(detailed);
        }

        tracing::info!(
            guid = %detailed.guid,
            persona_state = %detailed.persona_state,
            "persona session closed, creating a fresh identity verification"
        );
        let fresh = self.service.create_identity_verification().await?;
        Ok(self.service.get_identity_verification(&fresh.guid).await?)
    }

    async fn poll_identity(&mut self) -> Step {
        let guid = match self.context.active_guid() {
            Ok(guid) => guid.clone(),
            Err(e) => return self.fail(FlowLevel::IdentityVerification, e),
        };

        let mut session = self.poll.start();
        loop {
            if session.next_tick().await.is_none() {
                return self.poll_ended(FlowLevel::IdentityVerification, &session);
            }

            let record = match session
                .guard(self.service.get_identity_verification(&guid))
                .await
            {
                Ok(Ok(record)) => record,
                Ok(Err(e)) => {
                    session.stop();
                    return self.fail(FlowLevel::IdentityVerification, e.into());
                }
                Err(end) => return self.timed_out(FlowLevel::IdentityVerification, end),
            };

            if record.state == IdentityState::Storing {
                tracing::debug!(guid = %guid, tick = session.ticks(), "identity verification still storing");
                continue;
            }

            session.stop();
            return Step::Identity(record);
        }
    }

    async fn handle_identity_state(&mut self, record: IdentityVerificationRecord) -> Step {
        match record.state {
            IdentityState::Waiting => self.handle_persona_state(record).await,
            IdentityState::Completed => self.settle(record),
            // Only reachable from the one-shot check; go back to polling.
            IdentityState::Storing => Step::PollIdentity,
            IdentityState::Unknown => self.fail(
                FlowLevel::IdentityVerification,
                VerificationError::unrecognized(FlowLevel::IdentityVerification, record.state.as_str()),
            ),
        }
    }

    async fn check_identity_once(&mut self) -> Step {
        let guid = match self.context.active_guid() {
            Ok(guid) => guid.clone(),
            Err(e) => return self.fail(FlowLevel::IdentityVerification, e),
        };

        match self.service.get_identity_verification(&guid).await {
            Ok(record) => Step::Identity(record),
            Err(e) => self.fail(FlowLevel::IdentityVerification, e.into()),
        }
    }

    // ── Persona sub-state machine ──────────────────────────────────────

    async fn handle_persona_state(&mut self, record: IdentityVerificationRecord) -> Step {
        match record.persona_state {
            PersonaState::Waiting => {
                let Some(inquiry_id) = record
                    .persona_inquiry_id
                    .as_deref()
                    .filter(|id| !id.is_empty())
                else {
                    return self.fail(
                        FlowLevel::Sdk,
                        VerificationError::Sdk(format!(
                            "identity verification {} has no persona inquiry",
                            record.guid
                        )),
                    );
                };

                let locale = self.config.get_config().locale;
                match self.context.bridge.bootstrap(inquiry_id, &locale).await {
                    Ok(kind) => {
                        tracing::debug!(?kind, inquiry_id, "persona widget bootstrapped");
                        Step::AwaitSdk
                    }
                    Err(e) => self.fail(FlowLevel::Sdk, e),
                }
            }
            PersonaState::Expired => {
                self.restarts += 1;
                tracing::info!(
                    guid = %record.guid,
                    restarts = self.restarts,
                    "persona inquiry expired, restarting verification"
                );
                Step::Customer
            }
            state if state.is_settled() => self.settle(record),
            state => self.fail(
                FlowLevel::Persona,
                VerificationError::unrecognized(FlowLevel::Persona, state.as_str()),
            ),
        }
    }

    async fn await_sdk(&mut self) -> Step {
        let Some(event) = self.context.bridge.next_event().await else {
            return self.fail(
                FlowLevel::Sdk,
                VerificationError::Sdk("widget event channel closed".to_string()),
            );
        };

        tracing::debug!(?event, "persona widget event");
        match self.context.bridge.handle_event(event, &self.reporter) {
            BridgeOutcome::Continue => Step::AwaitSdk,
            BridgeOutcome::CheckIdentity => Step::CheckIdentity,
            BridgeOutcome::Canceled => Step::Finished(FlowOutcome::Canceled),
            BridgeOutcome::Failed(e) => Step::Finished(FlowOutcome::Failed(e)),
        }
    }

    // ── Terminal helpers ───────────────────────────────────────────────

    fn settle(&self, record: IdentityVerificationRecord) -> Step {
        self.outputs.set_loading(false);
        self.outputs.publish_identity(record.clone());
        Step::Finished(FlowOutcome::Identity(record))
    }

    fn fail(&self, level: FlowLevel, error: VerificationError) -> Step {
        self.reporter.fail(level, &error);
        Step::Finished(FlowOutcome::Failed(error))
    }

    fn timed_out(&self, level: FlowLevel, end: SessionEnd) -> Step {
        self.fail(level, VerificationError::Timeout { level, end })
    }

    fn poll_ended(&self, level: FlowLevel, session: &PollSession) -> Step {
        let end = session.end_reason().unwrap_or(SessionEnd::DurationElapsed);
        self.timed_out(level, end)
    }
}

async fn torn_down(teardown: &mut watch::Receiver<bool>) {
    if teardown.wait_for(|fired| *fired).await.is_err() {
        // Teardown source dropped without firing.
        std::future::pending::<()>().await;
    }
}
