//! Translate command implementation.

use clap::Parser;
use nuwa_common_core::Language;
use serde::Serialize;

use super::require_text;
use crate::cli::{parse_language, CommandContext};
use crate::error::CliError;
use crate::output;

/// Translate a piece of text
#[derive(Debug, Parser)]
pub struct TranslateCommand {
    /// Text to translate
    pub text: String,

    /// Target language (defaults to the display language)
    #[arg(long, value_parser = parse_language)]
    pub to: Option<Language>,

    /// Source language (detected by the service when omitted)
    #[arg(long, value_parser = parse_language)]
    pub from: Option<Language>,
}

#[derive(Debug, Serialize)]
struct Translation<'a> {
    text: &'a str,
    translated: &'a str,
    target: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<Language>,
}

impl TranslateCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        require_text("text", &self.text)?;
        let target = self.to.unwrap_or(ctx.language);
        let translator = ctx.translator()?;

        let translated = translator.translate_text(&self.text, target, self.from).await;
        if translated == self.text && self.from != Some(target) {
            tracing::warn!(target_lang = %target, "translation unavailable, showing original text");
        }

        let result = Translation {
            text: &self.text,
            translated: &translated,
            target,
            source: self.from,
        };
        output::emit(ctx.format, &result, || translated.clone())
    }
}
