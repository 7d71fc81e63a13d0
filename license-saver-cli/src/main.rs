//! License Saver CLI - delete Signavio users that are not on an allowlist

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{error, info};

use license_saver_core::{Config, Error, PruneService, Settings, SignavioClient};

mod logging;

/// Delete every Signavio user whose email is not on the allowlist
#[derive(Parser, Debug)]
#[command(name = "license-saver", version, about, long_about = None)]
struct Cli {
    /// Signavio tenant ID
    #[arg(long, env = "SIGNAVIO_TENANT")]
    tenant: Option<String>,

    /// Signavio user
    #[arg(long, env = "SIGNAVIO_USER")]
    user: Option<String>,

    /// Signavio password
    #[arg(long, env = "SIGNAVIO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Signavio URL (e.g. https://editor.signavio.com)
    #[arg(long, env = "SIGNAVIO_URL")]
    url: Option<String>,

    /// Comma separated list of emails to keep (the API user is always kept)
    #[arg(long, env = "SIGNAVIO_ALLOWLIST", value_delimiter = ',')]
    allowlist: Vec<String>,

    /// JSON settings file; flags take precedence over its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log which users would be deleted without deleting them
    #[arg(long)]
    dry_run: bool,

    /// Read every page of the user listing instead of the first 200 users
    #[arg(long)]
    all_pages: bool,

    /// Pause between job status requests, in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Consecutive failed job status requests before giving up
    #[arg(long)]
    max_poll_errors: Option<u32>,

    /// Maximum time to wait for a single deletion job, in seconds
    #[arg(long)]
    poll_timeout_secs: Option<u64>,

    /// HTTP request timeout, in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            tenant: self.tenant.clone(),
            url: self.url.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            allowlist: self.allowlist.clone(),
            dry_run: self.dry_run.then_some(true),
            all_pages: self.all_pages.then_some(true),
            request_timeout_secs: self.request_timeout_secs,
            poll_interval_ms: self.poll_interval_ms,
            max_poll_errors: self.max_poll_errors,
            poll_timeout_secs: self.poll_timeout_secs,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(Error::MissingSettings(missing)) => Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                format!("missing required options: {}", missing.join(", ")),
            )
            .exit(),
        Err(e) => {
            error!(error = %e, settings_file = ?cli.config, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Run aborted");
            ExitCode::FAILURE
        }
    }
}

/// Settings file (if any) with command line values layered on top
fn load_config(cli: &Cli) -> license_saver_core::Result<Config> {
    Config::load(cli.config.as_deref(), cli.settings())
}

fn run(config: &Config) -> Result<()> {
    if config.allowlist.is_empty() {
        info!("No allowlist provided, at least keeping API user");
    }

    let mut client = SignavioClient::from_config(config).context("Failed to create Signavio client")?;
    let service = PruneService::from_config(config);

    let report = service.run(&mut client)?;

    info!(
        dry_run = report.dry_run,
        kept = report.kept(),
        deleted = report.deleted(),
        would_delete = report.would_delete(),
        failed = report.failed(),
        "Finished"
    );
    Ok(())
}
