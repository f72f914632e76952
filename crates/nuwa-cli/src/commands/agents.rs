//! Agents command implementation.

use clap::{Parser, Subcommand};
use nuwa_common_core::Agent;
use nuwa_common_http::{AgentsApi, BuildAgent};

use super::{print_created, print_page, ListArgs};
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{Alignment, Column, Table};

/// Browse and build agents
#[derive(Debug, Parser)]
pub struct AgentsCommand {
    #[command(subcommand)]
    pub action: AgentsAction,
}

#[derive(Debug, Subcommand)]
pub enum AgentsAction {
    /// List trained agents
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only agents built for this task
        #[arg(long)]
        task_id: Option<u64>,
    },

    /// Assemble an agent from a task's modules
    Build {
        /// Task the agent is built for
        #[arg(long)]
        task_id: u64,

        /// Module ids to include (repeat or comma-separate)
        #[arg(long = "module", value_delimiter = ',', required = true)]
        modules: Vec<u64>,
    },
}

impl AgentsCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let api = AgentsApi::new(ctx.client()?);

        match &self.action {
            AgentsAction::List { list, task_id } => {
                let mut query = list.query();
                if let Some(id) = task_id {
                    query = query.task_id(*id);
                }
                let response = api.list_agents(&query).await.map_err(|e| ctx.network_error(e))?;
                let page = ctx.unwrap_response(response)?;
                print_page(ctx, &page, |agents| agent_table(ctx, agents))
            }
            AgentsAction::Build { task_id, modules } => {
                let body = BuildAgent {
                    task_id: *task_id,
                    modules: modules.clone(),
                };
                let response = api.build_agent(&body).await.map_err(|e| ctx.network_error(e))?;
                let agent = ctx.unwrap_response(response)?;

                let message = ctx
                    .dict
                    .translate("agents.built", ctx.language, &[("id", &agent.id.to_string())]);
                print_created(ctx, &agent, message)
            }
        }
    }
}

fn agent_table(ctx: &CommandContext, agents: &[Agent]) -> Table {
    let mut table = Table::new(vec![
        Column::new("ID").align(Alignment::Right),
        Column::new(ctx.t("agents.title")).max_width(32),
        Column::new("STATUS"),
        Column::new("PERF").align(Alignment::Right),
        Column::new("DONE").align(Alignment::Right),
    ]);

    for agent in agents {
        table.add_row(vec![
            agent.id.to_string(),
            agent.name.best(ctx.language).map(|(_, s)| s).unwrap_or_default().to_string(),
            agent.status.clone(),
            agent.performance.map(|p| format!("{p}%")).unwrap_or_default(),
            agent.tasks_completed.map(|n| n.to_string()).unwrap_or_default(),
        ]);
    }
    table
}
