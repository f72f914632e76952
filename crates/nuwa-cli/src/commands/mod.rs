//! Command implementations.

mod agents;
mod config;
mod health;
mod modules;
mod signatures;
mod tasks;
mod translate;
mod wishes;

pub use agents::AgentsCommand;
pub use config::ConfigCommand;
pub use health::HealthCommand;
pub use modules::ModulesCommand;
pub use signatures::SignaturesCommand;
pub use tasks::TasksCommand;
pub use translate::TranslateCommand;
pub use wishes::WishesCommand;

use clap::Args;
use nuwa_common_core::{Page, Pagination};
use nuwa_common_http::ListQuery;
use serde::Serialize;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{self, Table};

/// Paging and status filter shared by every `list` subcommand
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page
    #[arg(long, default_value_t = 10)]
    pub size: u32,

    /// Only show items with this status
    #[arg(long)]
    pub status: Option<String>,
}

impl ListArgs {
    pub fn query(&self) -> ListQuery {
        let query = ListQuery::new().page(self.page).size(self.size);
        match &self.status {
            Some(status) => query.status(status.clone()),
            None => query,
        }
    }
}

/// Print a page: a table plus the pagination summary in text mode, the page itself as JSON.
pub(crate) fn print_page<T, F>(ctx: &CommandContext, page: &Page<T>, table: F) -> Result<(), CliError>
where
    T: Serialize,
    F: FnOnce(&[T]) -> Table,
{
    output::emit(ctx.format, page, || {
        if page.is_empty() {
            return ctx.t("common.empty");
        }
        format!("{}\n{}", table(&page.items).render(), pagination_summary(ctx, &page.pagination()))
    })
}

pub(crate) fn pagination_summary(ctx: &CommandContext, pagination: &Pagination) -> String {
    let page = pagination.page.to_string();
    let pages = pagination.pages.to_string();
    let total = pagination.total.to_string();
    ctx.dict.translate(
        "pagination.summary",
        ctx.language,
        &[("page", &page), ("pages", &pages), ("total", &total)],
    )
}

/// Print the result of a write: `message` in text mode, the created entity as JSON.
pub(crate) fn print_created<T: Serialize>(ctx: &CommandContext, entity: &T, message: String) -> Result<(), CliError> {
    output::emit(ctx.format, entity, || message)
}

/// Reject blank free-text arguments before anything is sent.
pub(crate) fn require_text(name: &str, value: &str) -> Result<(), CliError> {
    if value.trim().is_empty() {
        return Err(CliError::validation(format!("{name} must not be empty")));
    }
    Ok(())
}
