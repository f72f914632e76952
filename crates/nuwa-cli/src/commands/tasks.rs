//! Tasks command implementation.

use clap::{Parser, Subcommand};
use nuwa_common_core::Task;
use nuwa_common_http::{SynthesizeTask, TasksApi};

use super::{print_created, print_page, ListArgs};
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{Alignment, Column, Table};

/// Browse and synthesize tasks
#[derive(Debug, Parser)]
pub struct TasksCommand {
    #[command(subcommand)]
    pub action: TasksAction,
}

#[derive(Debug, Subcommand)]
pub enum TasksAction {
    /// List synthesized tasks
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only tasks synthesized from this wish
        #[arg(long)]
        wish_id: Option<u64>,
    },

    /// Turn a wish into a task
    Synthesize {
        /// Source wish
        #[arg(long)]
        wish_id: u64,
    },
}

impl TasksCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let api = TasksApi::new(ctx.client()?);

        match &self.action {
            TasksAction::List { list, wish_id } => {
                let mut query = list.query();
                if let Some(id) = wish_id {
                    query = query.wish_id(*id);
                }
                let response = api.list_tasks(&query).await.map_err(|e| ctx.network_error(e))?;
                let page = ctx.unwrap_response(response)?;
                print_page(ctx, &page, |tasks| task_table(ctx, tasks))
            }
            TasksAction::Synthesize { wish_id } => {
                let body = SynthesizeTask { wish_id: *wish_id };
                let response = api
                    .synthesize_task(&body)
                    .await
                    .map_err(|e| ctx.network_error(e))?;
                let task = ctx.unwrap_response(response)?;

                let message = ctx
                    .dict
                    .translate("tasks.synthesized", ctx.language, &[("id", &task.id.to_string())]);
                print_created(ctx, &task, message)
            }
        }
    }
}

fn task_table(ctx: &CommandContext, tasks: &[Task]) -> Table {
    let mut table = Table::new(vec![
        Column::new("ID").align(Alignment::Right),
        Column::new(ctx.t("tasks.title")).max_width(40),
        Column::new("WISH").align(Alignment::Right),
        Column::new("STATUS"),
        Column::new("DIFFICULTY"),
    ]);

    for task in tasks {
        table.add_row(vec![
            task.id.to_string(),
            task.title.best(ctx.language).map(|(_, s)| s).unwrap_or_default().to_string(),
            task.wish_id.map(|id| id.to_string()).unwrap_or_default(),
            task.status.clone(),
            task.difficulty.clone().unwrap_or_default(),
        ]);
    }
    table
}
