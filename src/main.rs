use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod classify;
mod cli;
mod config;
mod fetch;
mod params;
mod progress;
mod remote;
mod util;
mod verdict;
mod workflow;

use cli::{ClassifyArgs, Command, OutputFormat, RootArgs, ValidateArgs};
use progress::{ConsoleFormat, ConsoleSink};
use remote::{FixtureTracker, HttpTracker, RequestTracker};
use workflow::{Invocation, Workflow, WorkflowState};

fn main() -> Result<ExitCode> {
    init_tracing();
    let args = RootArgs::parse();

    match args.command {
        Command::Validate(args) => cmd_validate(args),
        Command::Classify(args) => cmd_classify(args),
    }
}

fn init_tracing() {
    let filter = std::env::var("REQVAL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_validate(args: ValidateArgs) -> Result<ExitCode> {
    let mut parameters = params::load_parameters_file(&args.params)?;
    let instance_override = args.instance_id.map(|id| id.to_string());
    parameters.apply_overrides(args.request_number.as_deref(), instance_override.as_deref());

    let instance_id = args.instance_id.unwrap_or_else(|| {
        parameters
            .package_adapter_instance
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_default()
    });

    let tracker: Box<dyn RequestTracker> = match &args.fixture {
        Some(path) => Box::new(FixtureTracker::load(path)?),
        None => {
            let config = config::RemoteConfig::resolve(args.api_url.as_deref(), args.timeout_ms)?;
            tracing::debug!(
                base_url = config.base_url.as_str(),
                timeout_ms = config.timeout_ms,
                "using request tracker service"
            );
            Box::new(HttpTracker::new(&config))
        }
    };

    let format = match args.format {
        OutputFormat::Text => ConsoleFormat::Text,
        OutputFormat::Json => ConsoleFormat::Json,
    };
    let mut sink = ConsoleSink::new(format, args.cancel_file.clone());

    let mut workflow = Workflow::new(parameters, tracker.as_ref())?;
    let outcome = workflow.run(
        Invocation {
            instance_id,
            dry_run: args.dry_run,
        },
        &mut sink,
    );
    tracing::info!(
        state = ?outcome.state,
        verdict = outcome.verdict,
        elapsed_seconds = outcome.elapsed_seconds,
        error = outcome.error.as_deref(),
        "validation finished"
    );

    Ok(match outcome.state {
        WorkflowState::Complete => ExitCode::SUCCESS,
        _ => ExitCode::from(1),
    })
}

fn cmd_classify(args: ClassifyArgs) -> Result<ExitCode> {
    let parameters = params::load_parameters_file(&args.params)?;
    let prepared = parameters.prepare();
    if prepared.rules.is_empty() {
        eprintln!("note: no request type options configured; every number is Unknown Format");
    }
    let formats = classify::RequestNumberFormats::new()?;
    let request_number = args.request_number.trim();
    let classification = formats.classify(request_number, &prepared.rules);
    let report = serde_json::json!({
        "request_number": request_number,
        "matched": classification.matched,
        "category": classification.category,
        "format_label": classification.format_label,
        "requires_approval": classification.requires_approval,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}
