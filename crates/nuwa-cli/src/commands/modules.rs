//! Modules command implementation.

use clap::{Parser, Subcommand};
use nuwa_common_core::Module;
use nuwa_common_http::{ModulesApi, SubmitModule};

use super::{print_created, print_page, require_text, ListArgs};
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{Alignment, Column, Table};

/// Browse and submit modules
#[derive(Debug, Parser)]
pub struct ModulesCommand {
    #[command(subcommand)]
    pub action: ModulesAction,
}

#[derive(Debug, Subcommand)]
pub enum ModulesAction {
    /// List contributed modules
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only modules for this task
        #[arg(long)]
        task_id: Option<u64>,
    },

    /// Contribute a module to a task
    Submit {
        #[arg(long)]
        task_id: u64,

        #[arg(long)]
        name: String,

        /// Module body
        #[arg(long)]
        content: String,

        /// Contributing user
        #[arg(long, env = "NUWA_USER_ID")]
        user_id: String,
    },
}

impl ModulesCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let api = ModulesApi::new(ctx.client()?);

        match &self.action {
            ModulesAction::List { list, task_id } => {
                let mut query = list.query();
                if let Some(id) = task_id {
                    query = query.task_id(*id);
                }
                let response = api.list_modules(&query).await.map_err(|e| ctx.network_error(e))?;
                let page = ctx.unwrap_response(response)?;
                print_page(ctx, &page, module_table)
            }
            ModulesAction::Submit {
                task_id,
                name,
                content,
                user_id,
            } => {
                require_text("name", name)?;
                require_text("content", content)?;
                let body = SubmitModule {
                    task_id: *task_id,
                    name: name.clone(),
                    content: content.clone(),
                    user_id: user_id.clone(),
                };
                let response = api.submit_module(&body).await.map_err(|e| ctx.network_error(e))?;
                let module = ctx.unwrap_response(response)?;

                let message = ctx
                    .dict
                    .translate("modules.submitted", ctx.language, &[("id", &module.id.to_string())]);
                print_created(ctx, &module, message)
            }
        }
    }
}

fn module_table(modules: &[Module]) -> Table {
    let mut table = Table::new(vec![
        Column::new("ID").align(Alignment::Right),
        Column::new("TASK").align(Alignment::Right),
        Column::new("NAME").max_width(32),
        Column::new("STATUS"),
        Column::new("CONTRIBUTOR"),
    ]);

    for module in modules {
        table.add_row(vec![
            module.id.to_string(),
            module.task_id.to_string(),
            module.name.clone(),
            module.status.clone(),
            module.user_id.clone().unwrap_or_default(),
        ]);
    }
    table
}
