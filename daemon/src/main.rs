//! KYC flow daemon: replays a scripted verification run through the real
//! orchestrator and prints what the host would have seen.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use kyc_host::{init_logging, HostSettings, VerificationHost};
use kyc_nullables::{NullCollaborators, Scenario};
use kyc_verification::{FlowOutcome, RouteRequest, ScriptRegistry};
use serde_json::json;

#[derive(Parser)]
#[command(name = "kyc-daemon", about = "KYC identity-verification flow runner")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "KYC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "KYC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "KYC_LOG_FORMAT")]
    log_format: Option<String>,

    /// User locale handed to the widget.
    #[arg(long, env = "KYC_LOCALE")]
    locale: Option<String>,

    /// Spacing between remote reads while polling, in milliseconds.
    #[arg(long, env = "KYC_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Maximum lifetime of a poll session, in milliseconds.
    #[arg(long, env = "KYC_POLL_DURATION_MS")]
    poll_duration_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a JSON scenario and print the resolved outcome.
    Run {
        /// Scenario file describing service responses and widget reactions.
        #[arg(long)]
        scenario: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<HostSettings> {
        let base = match &self.config {
            Some(path) => HostSettings::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => HostSettings::default(),
        };

        let settings = HostSettings {
            log_level: self.log_level.clone().unwrap_or(base.log_level.clone()),
            log_format: self.log_format.clone().unwrap_or(base.log_format.clone()),
            locale: self.locale.clone().unwrap_or(base.locale.clone()),
            poll_interval_ms: self.poll_interval_ms.unwrap_or(base.poll_interval_ms),
            poll_duration_ms: self.poll_duration_ms.unwrap_or(base.poll_duration_ms),
            ..base
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    match &cli.command {
        Command::Config => {
            print!("{}", settings.to_toml_string()?);
            Ok(())
        }
        Command::Run { scenario } => {
            init_logging(settings.log_format()?, &settings.log_level);
            run_scenario(&settings, scenario).await
        }
    }
}

async fn run_scenario(settings: &HostSettings, path: &Path) -> anyhow::Result<()> {
    let scenario = Scenario::from_file(path)
        .with_context(|| format!("loading scenario from {}", path.display()))?;
    let scenario_locale = scenario.locale.is_some();

    let mut nulls = scenario
        .into_collaborators()
        .with_scripts(ScriptRegistry::new(settings.persona_script_src.clone()));
    if !scenario_locale {
        nulls = nulls.with_locale(&settings.locale);
    }

    tracing::info!(
        scenario = %path.display(),
        interval_ms = settings.poll_interval_ms,
        duration_ms = settings.poll_duration_ms,
        "replaying verification scenario"
    );

    let mut host = VerificationHost::new(nulls.collaborators(), nulls.router.clone(), settings);
    let teardown = host.teardown_controller();
    let signals = tokio::spawn(async move { teardown.wait_for_signal().await });

    let (outcome, route) = host.run_to_route().await;
    signals.abort();

    let report = report(&host, &nulls, &outcome, route.as_ref());
    println!("{}", serde_json::to_string_pretty(&report)?);

    match outcome {
        FlowOutcome::Failed(e) => Err(anyhow::Error::new(e).context("verification flow failed")),
        _ => Ok(()),
    }
}

fn report(
    host: &VerificationHost,
    nulls: &NullCollaborators,
    outcome: &FlowOutcome,
    route: Option<&RouteRequest>,
) -> serde_json::Value {
    let outputs = host.outputs();
    let events: Vec<_> = nulls
        .events
        .events()
        .into_iter()
        .map(|e| {
            json!({
                "level": e.level.as_str(),
                "code": e.code.as_str(),
                "message": e.message,
                "context": e.context,
            })
        })
        .collect();

    json!({
        "outcome": outcome.label(),
        "customer": outputs.customer(),
        "identity": outputs.identity(),
        "loading": outputs.is_loading(),
        "error": outputs.is_error(),
        "canceled": outputs.is_canceled(),
        "inquiry_id": outputs.client().and_then(|c| c.inquiry_id),
        "restarts": host.orchestrator().restarts(),
        "route": route.map(|r| json!({ "origin": r.origin, "route": r.route })),
        "events": events,
        "errors": nulls.errors.errors(),
        "service_calls": nulls.service.call_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "kyc-daemon",
            "--locale",
            "fr-CA",
            "--poll-interval-ms",
            "250",
            "run",
            "--scenario",
            "demos/unverified_complete.json",
        ])
        .unwrap();
        let settings = cli.settings().unwrap();
        assert_eq!(settings.locale, "fr-CA");
        assert_eq!(settings.poll_interval_ms, 250);
        assert_eq!(settings.poll_duration_ms, 120_000);
        assert!(matches!(cli.command, Command::Run { .. }));
    }

    #[test]
    fn invalid_overlay_is_rejected() {
        let cli = Cli::try_parse_from(["kyc-daemon", "--log-format", "xml", "config"]).unwrap();
        assert!(cli.settings().is_err());
    }
}
