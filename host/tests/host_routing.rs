use std::time::Duration;

use kyc_host::{HostOutcome, HostSettings, StaticConfigSource, VerificationHost};
use kyc_nullables::NullCollaborators;
use kyc_types::{
    CustomerRecord, CustomerState, IdentityState, IdentityVerificationPage,
    IdentityVerificationRecord, PersonaState,
};
use kyc_verification::{ConfigSource, FlowOutcome, RouteRequest, SdkEvent};

fn settings() -> HostSettings {
    HostSettings {
        poll_interval_ms: 100,
        poll_duration_ms: 2_000,
        ..HostSettings::default()
    }
}

fn host(nulls: &NullCollaborators, settings: &HostSettings) -> VerificationHost {
    VerificationHost::new(nulls.collaborators(), nulls.router.clone(), settings)
}

fn price_list() -> RouteRequest {
    RouteRequest {
        origin: "identity-verification".into(),
        route: "price-list".into(),
    }
}

#[test]
fn explicit_outcomes_share_default_route() {
    let nulls = NullCollaborators::new();
    let host = host(&nulls, &settings());

    assert_eq!(host.complete(), price_list());
    assert_eq!(host.cancel(), price_list());
    assert_eq!(nulls.router.routes(), vec![price_list(), price_list()]);
}

#[test]
fn configured_routes_are_used() {
    let nulls = NullCollaborators::new();
    let mut settings = settings();
    settings.routes.cancel = "home".into();
    let host = host(&nulls, &settings);

    assert_eq!(host.cancel().route, "home");
    assert_eq!(host.complete().route, "price-list");
}

#[test]
fn flow_outcomes_map_to_host_outcomes() {
    let verified = FlowOutcome::Customer(CustomerRecord::new(CustomerState::Verified));
    assert_eq!(HostOutcome::for_flow(&verified), Some(HostOutcome::Complete));
    assert_eq!(HostOutcome::for_flow(&FlowOutcome::Canceled), Some(HostOutcome::Canceled));
    assert_eq!(HostOutcome::for_flow(&FlowOutcome::TornDown), None);
}

#[test]
fn rejected_and_frozen_customers_stay_on_status_screen() {
    for state in [CustomerState::Rejected, CustomerState::Frozen] {
        let outcome = FlowOutcome::Customer(CustomerRecord::new(state));
        assert_eq!(HostOutcome::for_flow(&outcome), None);
    }
}

#[tokio::test(start_paused = true)]
async fn frozen_customer_is_not_routed() {
    let nulls = NullCollaborators::new();
    nulls.service.push_customer(CustomerRecord::new(CustomerState::Frozen));
    let mut host = host(&nulls, &settings());

    let (outcome, request) = host.run_to_route().await;

    assert!(matches!(outcome, FlowOutcome::Customer(_)));
    assert_eq!(request, None);
    assert!(nulls.router.routes().is_empty());
}

#[test]
fn static_config_source_returns_locale() {
    let settings = HostSettings {
        locale: "fr-CA".into(),
        ..HostSettings::default()
    };
    let source = StaticConfigSource::new(settings.host_config());
    assert_eq!(source.get_config().locale, "fr-CA");
}

#[tokio::test(start_paused = true)]
async fn verified_customer_routes_complete() {
    let nulls = NullCollaborators::new();
    nulls.service.push_customer(CustomerRecord::new(CustomerState::Verified));
    let mut host = host(&nulls, &settings());

    let (outcome, request) = host.run_to_route().await;

    assert!(matches!(outcome, FlowOutcome::Customer(_)));
    assert_eq!(request, Some(price_list()));
    assert_eq!(nulls.router.routes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn widget_cancel_routes_cancel() {
    let nulls = NullCollaborators::new();
    nulls.service.push_customer(CustomerRecord::new(CustomerState::Unverified));
    nulls.service.push_list(IdentityVerificationPage::empty());
    let record = IdentityVerificationRecord::new("idv-1", IdentityState::Waiting, PersonaState::Waiting)
        .with_inquiry_id("inq_1");
    nulls.service.push_create(record.clone());
    nulls.service.push_record(record);
    nulls.factory.react_on_open(vec![SdkEvent::Cancel]);
    let mut settings = settings();
    settings.routes.cancel = "home".into();
    let mut host = host(&nulls, &settings);

    let (outcome, request) = host.run_to_route().await;

    assert!(matches!(outcome, FlowOutcome::Canceled));
    assert_eq!(request.map(|r| r.route), Some("home".to_string()));
    assert!(host.outputs().is_canceled());
}

#[tokio::test(start_paused = true)]
async fn failed_flow_does_not_route() {
    let nulls = NullCollaborators::new();
    nulls.service.push_customer(CustomerRecord::new(CustomerState::Storing));
    let mut host = host(&nulls, &settings());

    let (outcome, request) = host.run_to_route().await;

    assert!(outcome.is_failed());
    assert_eq!(request, None);
    assert!(nulls.router.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn teardown_controller_stops_the_flow() {
    let nulls = NullCollaborators::new();
    nulls.service.push_customer(CustomerRecord::new(CustomerState::Storing));
    let mut host = host(&nulls, &settings());
    let teardown = host.teardown_controller();

    let (outcome, _) = tokio::join!(host.run_to_route(), async {
        tokio::time::sleep(Duration::from_millis(250)).await;
        teardown.teardown();
    });

    assert!(matches!(outcome.0, FlowOutcome::TornDown));
    assert_eq!(outcome.1, None);
    assert_eq!(nulls.service.call_count(), 2);
}
