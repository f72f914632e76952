//! Health command implementation.

use clap::Parser;
use serde::Serialize;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Check whether the backend is reachable
#[derive(Debug, Parser)]
pub struct HealthCommand {}

#[derive(Debug, Serialize)]
struct HealthReport<'a> {
    healthy: bool,
    url: &'a str,
}

impl HealthCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let client = ctx.client()?;
        let healthy = client.health_check().await;
        let report = HealthReport {
            healthy,
            url: &ctx.config.api.base_url,
        };

        if healthy {
            return output::emit(ctx.format, &report, || ctx.t("health.up"));
        }

        // Text mode reports through the error path only.
        if ctx.format == OutputFormat::Json {
            output::emit(ctx.format, &report, String::new)?;
        }
        Err(CliError::Network {
            message: ctx.t("health.down"),
            source: None,
            url: Some(client.url("/health")),
        })
    }
}
