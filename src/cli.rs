//! CLI argument parsing for the request validator.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "reqval",
    version,
    about = "Decide whether a package deployment is authorized by its change/incident/task request",
    after_help = "Examples:\n  reqval validate --params params.json --api-url https://tracker.example/api\n  reqval validate --params - --fixture snapshot.json --instance-id 42 --dry-run\n  reqval classify --params params.json CRQ000000000001",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Validate(ValidateArgs),
    Classify(ClassifyArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable transcript on stderr
    Text,
    /// One JSON progress event per line on stdout
    Json,
}

/// Validate command inputs for a single request.
#[derive(Parser, Debug)]
#[command(about = "Validate a request and report a pass/fail verdict")]
pub struct ValidateArgs {
    /// Workflow parameters JSON (`-` reads stdin)
    #[arg(long, value_name = "PATH")]
    pub params: PathBuf,

    /// Request number; overrides the value in the parameters payload
    #[arg(long, value_name = "NUMBER")]
    pub request_number: Option<String>,

    /// Package adapter instance id; overrides the value in the payload
    #[arg(long, value_name = "ID")]
    pub instance_id: Option<i64>,

    /// Run every check but report the request as valid
    #[arg(long)]
    pub dry_run: bool,

    /// Base URL of the request-tracking service (else REQVAL_API_URL)
    #[arg(long, value_name = "URL", conflicts_with = "fixture")]
    pub api_url: Option<String>,

    /// Per-call timeout for the request-tracking service
    #[arg(long, value_name = "MS", conflicts_with = "fixture")]
    pub timeout_ms: Option<u64>,

    /// Serve lookups from a JSON snapshot instead of the live service
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Progress output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Cancel at the next step boundary once this file exists
    #[arg(long, value_name = "PATH")]
    pub cancel_file: Option<PathBuf>,
}

/// Classify command inputs; no remote calls are made.
#[derive(Parser, Debug)]
#[command(about = "Show which request type rule a request number selects")]
pub struct ClassifyArgs {
    /// Workflow parameters JSON (`-` reads stdin)
    #[arg(long, value_name = "PATH")]
    pub params: PathBuf,

    /// Request number to classify
    pub request_number: String,
}
