//! Command-line client for the account/model health service.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use healthdeck_config::{DashboardConfig, parse_api_url, parse_model_list};
use healthdeck_dashboard::{HealthCategory, Tab};
use healthdeck_telemetry::{LogFormat, LoggingConfig, build_sha, init_logging};
use tracing::debug;
use uuid::Uuid;

use crate::client::{AppContext, CliDependencies, CliResult};
use crate::commands::matrix::{handle_account, handle_issues, handle_matrix, handle_resolve};
use crate::commands::watch::handle_watch;

/// Parses CLI arguments, executes the requested command, and reports failures.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&logging_config(&cli)) {
        eprintln!("warning: logging disabled: {err}");
    }
    debug!(build_sha = build_sha(), "logging initialised");

    let trace_id = Uuid::new_v4().to_string();
    match execute(cli, &trace_id).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli, trace_id: &str) -> CliResult<()> {
    let config = resolve_config(&cli, healthdeck_config::load)?;
    let deps = CliDependencies::from_config(&config, trace_id)?;
    let tab = if matches!(cli.command, Command::Watch(_)) {
        Tab::Health
    } else {
        Tab::Dashboard
    };
    let ctx = AppContext::build(config, &deps, cli.password.clone(), tab)?;

    let result = dispatch(cli.command, &ctx, cli.output).await;
    if cli.metrics {
        match deps.metrics.render() {
            Ok(text) => eprint!("{text}"),
            Err(err) => eprintln!("warning: failed to render metrics: {err}"),
        }
    }
    result
}

async fn dispatch(command: Command, ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    match command {
        Command::Matrix(args) => handle_matrix(ctx, args, output).await,
        Command::Issues => handle_issues(ctx, output).await,
        Command::Resolve(args) => handle_resolve(ctx, args).await,
        Command::Account(args) => handle_account(ctx, args, output).await,
        Command::Watch(_) => handle_watch(ctx, output).await,
    }
}

/// Build identifier stamped at compile time; `dev` when unset.
const BUILD_SHA: Option<&str> = option_env!("HEALTHDECK_BUILD_SHA");

/// Logging settings from the `--log-level`/`--log-format` flags. Terminal
/// output defaults to the pretty format.
pub(crate) fn logging_config(cli: &Cli) -> LoggingConfig<'_> {
    let mut config = LoggingConfig {
        level: &cli.log_level,
        format: cli
            .log_format
            .as_deref()
            .map_or(LogFormat::Pretty, LogFormat::from_name),
        ..LoggingConfig::default()
    };
    if let Some(sha) = BUILD_SHA {
        config.build_sha = sha;
    }
    config
}

/// Layer flags over the file/environment configuration and validate the result.
pub(crate) fn resolve_config<F>(cli: &Cli, load: F) -> CliResult<DashboardConfig>
where
    F: FnOnce(Option<&std::path::Path>) -> healthdeck_config::ConfigResult<DashboardConfig>,
{
    let mut config = load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.base_url = parse_api_url(url)?;
    }
    if let Some(models) = &cli.models {
        config.tracked_models = parse_model_list(models);
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Command::Watch(WatchArgs {
        interval: Some(secs),
    }) = &cli.command
    {
        config.poll_interval = Duration::from_secs(*secs);
    }
    config.validate()?;
    Ok(config)
}

fn parse_category(input: &str) -> Result<HealthCategory, String> {
    input.parse::<HealthCategory>().map_err(|_| {
        format!("invalid filter '{input}': expected healthy, warning, critical or disabled")
    })
}

#[derive(Parser)]
#[command(
    name = "healthdeck",
    about = "Account and model health dashboard for the terminal"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "HEALTHDECK_CONFIG",
        help = "YAML configuration file"
    )]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, global = true, help = "Base URL of the health service")]
    pub(crate) api_url: Option<String>,
    #[arg(
        long,
        global = true,
        env = "HEALTHDECK_PASSWORD",
        hide_env_values = true,
        help = "Password sent in the x-webui-password header"
    )]
    pub(crate) password: Option<String>,
    #[arg(long, global = true, help = "Comma-separated model ids to track")]
    pub(crate) models: Option<String>,
    #[arg(long, global = true, help = "HTTP request timeout in seconds")]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        help = "Print Prometheus metrics to stderr on exit"
    )]
    pub(crate) metrics: bool,
    #[arg(
        long,
        global = true,
        env = "HEALTHDECK_LOG_LEVEL",
        default_value = "warn",
        help = "Log filter used when RUST_LOG is unset"
    )]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "HEALTHDECK_LOG_FORMAT",
        help = "Log output format: pretty or json"
    )]
    pub(crate) log_format: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Load the health matrix once and render it with the summary and issues.
    Matrix(MatrixArgs),
    /// List active issues.
    Issues,
    /// Resolve one issue.
    Resolve(ResolveArgs),
    /// Show the per-model health of one account.
    Account(AccountArgs),
    /// Refresh the matrix on an interval until interrupted.
    Watch(WatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct MatrixArgs {
    #[arg(long, value_parser = parse_category, help = "Dim cells outside this category")]
    pub(crate) filter: Option<HealthCategory>,
}

#[derive(Args, Debug)]
pub(crate) struct ResolveArgs {
    /// Identifier of the issue to resolve.
    pub(crate) id: String,
}

#[derive(Args, Debug)]
pub(crate) struct AccountArgs {
    /// Account identifier (email).
    pub(crate) email: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct WatchArgs {
    #[arg(long, help = "Seconds between refreshes")]
    pub(crate) interval: Option<u64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
