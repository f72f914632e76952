//! Signatures command implementation.

use clap::{Parser, Subcommand};
use nuwa_common_core::Signature;
use nuwa_common_http::{SignatureLog, SignaturesApi};

use super::{print_created, print_page, require_text, ListArgs};
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{Alignment, Column, Table};

/// Browse and log contribution signatures
#[derive(Debug, Parser)]
pub struct SignaturesCommand {
    #[command(subcommand)]
    pub action: SignaturesAction,
}

#[derive(Debug, Subcommand)]
pub enum SignaturesAction {
    /// List recorded signatures
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only signatures for this agent
        #[arg(long)]
        agent_id: Option<u64>,
    },

    /// Record a contribution to an agent
    Log {
        #[arg(long)]
        agent_id: u64,

        #[arg(long, env = "NUWA_USER_ID")]
        user_id: String,

        /// What was contributed
        #[arg(long)]
        contribution: String,
    },
}

impl SignaturesCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let api = SignaturesApi::new(ctx.client()?);

        match &self.action {
            SignaturesAction::List { list, agent_id } => {
                let mut query = list.query();
                if let Some(id) = agent_id {
                    query = query.agent_id(*id);
                }
                let response = api
                    .list_signatures(&query)
                    .await
                    .map_err(|e| ctx.network_error(e))?;
                let page = ctx.unwrap_response(response)?;
                print_page(ctx, &page, signature_table)
            }
            SignaturesAction::Log {
                agent_id,
                user_id,
                contribution,
            } => {
                require_text("contribution", contribution)?;
                let body = SignatureLog {
                    agent_id: *agent_id,
                    user_id: user_id.clone(),
                    contribution: contribution.clone(),
                };
                let response = api.signature_log(&body).await.map_err(|e| ctx.network_error(e))?;
                let signature = ctx.unwrap_response(response)?;

                let message = ctx
                    .dict
                    .translate("signatures.logged", ctx.language, &[("id", &signature.id.to_string())]);
                print_created(ctx, &signature, message)
            }
        }
    }
}

fn signature_table(signatures: &[Signature]) -> Table {
    let mut table = Table::new(vec![
        Column::new("ID").align(Alignment::Right),
        Column::new("AGENT").align(Alignment::Right),
        Column::new("USER"),
        Column::new("CONTRIBUTION").max_width(48),
        Column::new("AT"),
    ]);

    for signature in signatures {
        table.add_row(vec![
            signature.id.to_string(),
            signature.agent_id.to_string(),
            signature.user_id.clone(),
            signature.contribution.clone(),
            signature.created_at.clone().unwrap_or_default(),
        ]);
    }
    table
}
