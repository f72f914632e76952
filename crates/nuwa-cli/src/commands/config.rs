//! Config command implementation.

use clap::{Parser, Subcommand};
use nuwa_common_core::Language;
use serde::Serialize;

use crate::cli::{parse_language, CommandContext, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Show or change local settings
#[derive(Debug, Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration and local state
    Show,

    /// Persist the display language
    SetLanguage {
        #[arg(value_parser = parse_language)]
        language: Language,
    },
}

#[derive(Debug, Serialize)]
struct Effective<'a> {
    config: &'a nuwa_common_config::NuwaConfig,
    language: Language,
    page_views: u64,
    store: String,
}

impl ConfigCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        match &self.action {
            ConfigAction::Show => show(ctx),
            ConfigAction::SetLanguage { language } => {
                if !language.is_ui_language() {
                    return Err(CliError::validation(format!(
                        "no interface strings for {}, choose one of: {}",
                        language.name(),
                        Language::UI.map(|l| l.code()).join(", ")
                    )));
                }
                ctx.open_store().set_language(*language)?;
                tracing::info!(language = %language, "display language saved");
                output::notice(ctx.quiet, &format!("{} ({})", language.name(), language.code()));
                Ok(())
            }
        }
    }
}

fn show(ctx: &CommandContext) -> Result<(), CliError> {
    let effective = Effective {
        config: &ctx.config,
        language: ctx.language,
        page_views: ctx.open_store().page_views(),
        store: ctx.store_path().display().to_string(),
    };

    match ctx.format {
        OutputFormat::Json => output::emit(ctx.format, &effective, String::new),
        OutputFormat::Text => {
            let yaml = serde_yaml::to_string(&ctx.config)
                .map_err(|e| CliError::Other(anyhow::anyhow!("failed to render configuration: {e}")))?;
            output::emit(ctx.format, &effective, || {
                format!(
                    "{yaml}\nlanguage: {}\npage_views: {}\nstore: {}",
                    effective.language, effective.page_views, effective.store
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuwa_common_config::NuwaConfig;

    fn context(dir: &tempfile::TempDir) -> CommandContext {
        CommandContext::new(NuwaConfig::default(), dir.path().to_path_buf(), OutputFormat::Text, true)
    }

    #[test]
    fn test_set_language_persists() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ConfigCommand {
            action: ConfigAction::SetLanguage { language: Language::En },
        };
        cmd.execute(&context(&dir)).unwrap();

        assert_eq!(context(&dir).language, Language::En);
    }

    #[test]
    fn test_set_language_rejects_non_ui_language() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ConfigCommand {
            action: ConfigAction::SetLanguage { language: Language::Fr },
        };
        let err = cmd.execute(&context(&dir)).unwrap_err();
        assert_eq!(err.code(), 1);
        assert_eq!(context(&dir).open_store().language(), None);
    }
}
