//! Binary entry point for the snapwarden CLI.

use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;

use snapwarden::{
    ConfigError, ContaboApi, JobError, LogSink, ReqwestTransport, Reporter, RotationController,
    RunPlan, RunSummary, SnapshotJob, SnapwardenConfig, SystemClock, TelemetryError,
    TokenProvider, TransportError, WebhookSink, render_report, telemetry,
};

mod cli;

use cli::{Cli, OutputArgs};

/// Exit status when at least one instance did not receive a snapshot.
const EXIT_PARTIAL_FAILURE: i32 = 2;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging setup failed: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error("failed to render output: {0}")]
    Output(String),
}

type Job = SnapshotJob<ContaboApi<ReqwestTransport>, SystemClock>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "snapwarden aborted");
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let config = SnapwardenConfig::load_without_cli_args()?;
    config.validate()?;
    telemetry::init(config.log_format()?)?;
    let job = build_job(&config)?;

    match cli {
        Cli::Run(output) => {
            let summary = job.execute().await?;
            write_stdout(&render_summary(&summary, &output)?);
            Ok(exit_code(&summary))
        }
        Cli::Plan(output) => {
            let plan = job.plan().await?;
            write_stdout(&render_plan(&plan, &output)?);
            Ok(0)
        }
    }
}

fn build_job(config: &SnapwardenConfig) -> Result<Job, CliError> {
    let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
    let tokens = TokenProvider::new(Arc::clone(&transport), config.auth_settings());
    let api = ContaboApi::new(Arc::clone(&transport), tokens, config.api_settings());

    let mut reporter = Reporter::new().with_sink(LogSink);
    if let Some(url) = config.webhook_url.as_deref() {
        reporter = reporter.with_sink(WebhookSink::new(transport, url.trim()));
    }

    let controller = RotationController::new(api, SystemClock, config.timezone()?);
    Ok(SnapshotJob::new(controller, reporter))
}

const fn exit_code(summary: &RunSummary) -> i32 {
    if summary.all_succeeded() {
        0
    } else {
        EXIT_PARTIAL_FAILURE
    }
}

fn render_summary(summary: &RunSummary, output: &OutputArgs) -> Result<String, CliError> {
    if output.json {
        serde_json::to_string_pretty(summary).map_err(|err| CliError::Output(err.to_string()))
    } else {
        Ok(render_report(summary))
    }
}

fn render_plan(plan: &RunPlan, output: &OutputArgs) -> Result<String, CliError> {
    if output.json {
        return serde_json::to_string_pretty(plan).map_err(|err| CliError::Output(err.to_string()));
    }
    let mut lines: Vec<String> = plan
        .planned
        .iter()
        .map(|entry| {
            format!(
                "{} ({}): {}",
                entry.display_name, entry.instance_id, entry.snapshot_name
            )
        })
        .collect();
    if lines.is_empty() {
        lines.push(String::from("No instances found."));
    }
    if !plan.inventory_complete {
        lines.push(String::from("warning: inventory listing was interrupted"));
    }
    Ok(lines.join("\n"))
}

fn write_stdout(text: &str) {
    writeln!(io::stdout(), "{}", text.trim_end()).ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
