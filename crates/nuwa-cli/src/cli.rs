//! CLI argument definitions using clap derive macros.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use nuwa_common_config::{ConfigLoader, LocalStore, NuwaConfig};
use nuwa_common_core::{ApiResponse, Language, ResponseOrigin};
use nuwa_common_http::{ApiClient, ApiError};
use nuwa_common_i18n::{detect_language, t, ui_language, Dictionary, Translator};

use crate::commands::{
    AgentsCommand, ConfigCommand, HealthCommand, ModulesCommand, SignaturesCommand, TasksCommand,
    TranslateCommand, WishesCommand,
};
use crate::error::CliError;
use crate::output;

/// CyberNuwa - wishes, tasks and community-trained agents
#[derive(Debug, Parser)]
#[command(
    name = "nuwa",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Project directory containing `.nuwa/config.yaml`
    #[arg(
        short,
        long,
        global = true,
        env = "NUWA_CONFIG_DIR",
        value_hint = ValueHint::DirPath
    )]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse and submit wishes
    Wishes(WishesCommand),

    /// Browse and synthesize tasks
    Tasks(TasksCommand),

    /// Browse and build agents
    Agents(AgentsCommand),

    /// Browse and submit modules
    Modules(ModulesCommand),

    /// Browse and log contribution signatures
    Signatures(SignaturesCommand),

    /// Check whether the backend is reachable
    Health(HealthCommand),

    /// Translate a piece of text
    Translate(TranslateCommand),

    /// Show or change local settings
    Config(ConfigCommand),
}

/// Parse a language code such as `en`, `zh-CN` or `en_US`.
pub fn parse_language(s: &str) -> Result<Language, String> {
    Language::parse(s).ok_or_else(|| {
        let known: Vec<_> = Language::ALL.iter().map(|l| l.code()).collect();
        format!("unknown language '{s}' (expected one of: {})", known.join(", "))
    })
}

impl Cli {
    /// Project directory: `--config`, else the current directory.
    pub fn project_dir(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load configuration for the project directory.
    pub fn load_config(&self) -> Result<NuwaConfig, CliError> {
        let loader = ConfigLoader::new(self.project_dir());
        Ok(loader.load()?)
    }

    /// Execute the selected command
    pub async fn execute(self, config: NuwaConfig) -> Result<(), CliError> {
        let ctx = CommandContext::new(config, self.project_dir(), self.format, self.quiet);
        ctx.record_visit();

        match self.command {
            Command::Wishes(cmd) => cmd.execute(&ctx).await,
            Command::Tasks(cmd) => cmd.execute(&ctx).await,
            Command::Agents(cmd) => cmd.execute(&ctx).await,
            Command::Modules(cmd) => cmd.execute(&ctx).await,
            Command::Signatures(cmd) => cmd.execute(&ctx).await,
            Command::Health(cmd) => cmd.execute(&ctx).await,
            Command::Translate(cmd) => cmd.execute(&ctx).await,
            Command::Config(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub config: NuwaConfig,
    pub project_dir: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
    pub language: Language,
    pub dict: Dictionary,
}

impl CommandContext {
    pub fn new(config: NuwaConfig, project_dir: PathBuf, format: OutputFormat, quiet: bool) -> Self {
        let store = LocalStore::open(store_path(&project_dir, &config));
        let language = store
            .language()
            .unwrap_or_else(|| ui_language(detect_language()));

        Self {
            config,
            project_dir,
            format,
            quiet,
            language,
            dict: Dictionary::builtin(),
        }
    }

    /// Location of the local preference store.
    pub fn store_path(&self) -> PathBuf {
        store_path(&self.project_dir, &self.config)
    }

    pub fn open_store(&self) -> LocalStore {
        LocalStore::open(self.store_path())
    }

    /// Count this invocation. Failures only warn.
    pub fn record_visit(&self) {
        match self.open_store().increment_page_views() {
            Ok(views) => tracing::debug!(views, "recorded page view"),
            Err(e) => tracing::warn!(error = %e, "failed to record page view"),
        }
    }

    /// Localized UI string.
    pub fn t(&self, path: &str) -> String {
        t!(self.dict, self.language, path)
    }

    pub fn client(&self) -> Result<ApiClient, CliError> {
        Ok(ApiClient::new(self.config.api.clone())?)
    }

    pub fn translator(&self) -> Result<Translator, CliError> {
        Ok(Translator::from_config(&self.config)?)
    }

    /// Map a client error, remembering which backend was asked.
    pub fn network_error(&self, error: ApiError) -> CliError {
        CliError::network(error, self.config.api.base_url.clone())
    }

    /// Payload of a response, noting mock data on stderr.
    pub fn unwrap_response<T>(&self, response: ApiResponse<T>) -> Result<T, CliError> {
        if response.origin == ResponseOrigin::Mock {
            output::notice(self.quiet, &self.t("mock.notice"));
        }
        response
            .into_result()
            .map_err(|e| CliError::Other(anyhow::anyhow!("backend reported failure: {e}")))
    }
}

fn store_path(project_dir: &Path, config: &NuwaConfig) -> PathBuf {
    if config.storage.path.is_absolute() {
        config.storage.path.clone()
    } else {
        project_dir.join(&config.storage.path)
    }
}
