//! Verification host: runs the orchestrator under a teardown signal and
//! routes the two host outcomes.

use std::sync::Arc;

use kyc_types::CustomerState;
use kyc_verification::{
    Collaborators, ConfigSource, FlowOutcome, HostConfig, RouteRequest, RoutingSink,
    VerificationOrchestrator, VerificationOutputs,
};

use crate::config::{HostSettings, RouteSettings};
use crate::teardown::TeardownController;

/// The two ways a host leaves the verification screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostOutcome {
    Complete,
    Canceled,
}

impl HostOutcome {
    /// The outcome a host would take once a flow has finished, if any.
    ///
    /// Rejected and frozen customers, failed flows and torn-down flows leave
    /// the user on the status screen; only the user can move on from there.
    pub fn for_flow(outcome: &FlowOutcome) -> Option<Self> {
        match outcome {
            FlowOutcome::Customer(customer) if customer.state == CustomerState::Verified => {
                Some(Self::Complete)
            }
            FlowOutcome::Identity(_) => Some(Self::Complete),
            FlowOutcome::Canceled => Some(Self::Canceled),
            FlowOutcome::Customer(_) | FlowOutcome::Failed(_) | FlowOutcome::TornDown => None,
        }
    }
}

/// A [`ConfigSource`] that always returns the same configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticConfigSource {
    config: HostConfig,
}

impl StaticConfigSource {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }
}

impl ConfigSource for StaticConfigSource {
    fn get_config(&self) -> HostConfig {
        self.config.clone()
    }
}

pub struct VerificationHost {
    orchestrator: VerificationOrchestrator,
    router: Arc<dyn RoutingSink>,
    routes: RouteSettings,
    teardown: Arc<TeardownController>,
}

impl VerificationHost {
    pub fn new(
        collaborators: Collaborators,
        router: Arc<dyn RoutingSink>,
        settings: &HostSettings,
    ) -> Self {
        Self {
            orchestrator: VerificationOrchestrator::new(collaborators, settings.poll_config()),
            router,
            routes: settings.routes.clone(),
            teardown: Arc::new(TeardownController::new()),
        }
    }

    /// Shared handle for whoever decides when the host goes away.
    pub fn teardown_controller(&self) -> Arc<TeardownController> {
        Arc::clone(&self.teardown)
    }

    pub fn outputs(&self) -> Arc<VerificationOutputs> {
        self.orchestrator.outputs()
    }

    pub fn orchestrator(&self) -> &VerificationOrchestrator {
        &self.orchestrator
    }

    pub async fn run(&mut self) -> FlowOutcome {
        self.orchestrator.run(self.teardown.subscribe()).await
    }

    pub async fn check_identity(&mut self) -> FlowOutcome {
        self.orchestrator.check_identity(self.teardown.subscribe()).await
    }

    /// Run the flow and take the matching host outcome, if the flow ended in
    /// one. Interactive hosts show the status screen and call
    /// [`complete`](Self::complete) or [`cancel`](Self::cancel) on user
    /// action instead; this is for unattended replays.
    pub async fn run_to_route(&mut self) -> (FlowOutcome, Option<RouteRequest>) {
        let outcome = self.run().await;
        let request = HostOutcome::for_flow(&outcome).map(|host| self.route(host));
        (outcome, request)
    }

    pub fn complete(&self) -> RouteRequest {
        self.route(HostOutcome::Complete)
    }

    pub fn cancel(&self) -> RouteRequest {
        self.route(HostOutcome::Canceled)
    }

    pub fn route(&self, outcome: HostOutcome) -> RouteRequest {
        let request = self.routes.request_for(outcome);
        tracing::info!(
            ?outcome,
            origin = %request.origin,
            route = %request.route,
            "routing away from verification"
        );
        self.router.handle_route(request.clone());
        request
    }
}
