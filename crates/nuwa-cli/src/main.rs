//! CyberNuwa CLI
//!
//! Main entry point for the `nuwa` binary.

use std::process::ExitCode;

use clap::Parser;
use nuwa_cli::cli::Cli;
use nuwa_cli::CliError;
use nuwa_common_config::{vars, Environment};
use nuwa_common_log::{LogConfig, LogLevel};

/// Exit codes decided here rather than by a [`CliError`]
#[repr(u8)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    // Before parsing, so `.env` can supply NUWA_CONFIG_DIR.
    let env_result = Environment::init();
    let cli = Cli::parse();

    init_logging(&cli);
    if let Err(e) = env_result {
        tracing::warn!(error = %e, "failed to load environment files");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            return Exit::GeneralError.into();
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            report(&e);
            e.exit_code()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    cli.execute(config).await
}

fn init_logging(cli: &Cli) {
    let mut config = LogConfig::from_env();
    // Flags win over the environment; with neither, only warnings show.
    if cli.quiet || cli.verbose > 0 || std::env::var_os(vars::NUWA_LOG_LEVEL).is_none() {
        let verbosity = if cli.quiet { -2 } else { cli.verbose.min(3) as i8 - 1 };
        config = config.with_level(LogLevel::from_verbosity(verbosity));
    }

    if let Err(e) = nuwa_common_log::init(config) {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn report(error: &CliError) {
    tracing::debug!(error = ?error, "command failed");
    eprintln!("error: {error}");
    if let Some(hint) = error.hint() {
        eprintln!("  hint: {hint}");
    }
}
