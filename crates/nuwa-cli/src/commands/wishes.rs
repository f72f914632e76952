//! Wishes command implementation.

use clap::{Parser, Subcommand};
use nuwa_common_core::Wish;
use nuwa_common_http::{SubmitWish, WishesApi};

use super::{print_created, print_page, require_text, ListArgs};
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{Alignment, Column, Table};

/// Browse and submit wishes
#[derive(Debug, Parser)]
pub struct WishesCommand {
    #[command(subcommand)]
    pub action: WishesAction,
}

#[derive(Debug, Subcommand)]
pub enum WishesAction {
    /// List wishes in the pool
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Translate titles into the display language
        #[arg(long)]
        translate: bool,
    },

    /// Post a new wish
    Submit {
        /// What you wish for
        #[arg(long)]
        content: String,

        /// Submitting user
        #[arg(long, env = "NUWA_USER_ID")]
        user_id: String,
    },
}

impl WishesCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let api = WishesApi::new(ctx.client()?);

        match &self.action {
            WishesAction::List { list, translate } => {
                let response = api
                    .list_wishes(&list.query())
                    .await
                    .map_err(|e| ctx.network_error(e))?;
                let mut page = ctx.unwrap_response(response)?;

                if *translate {
                    let translator = ctx.translator()?;
                    let items = std::mem::take(&mut page.items);
                    page.items = translator.translate_wishes(items, ctx.language).await;
                }

                print_page(ctx, &page, |wishes| wish_table(ctx, wishes))
            }
            WishesAction::Submit { content, user_id } => {
                require_text("content", content)?;
                let body = SubmitWish {
                    content: content.clone(),
                    user_id: user_id.clone(),
                };
                let response = api.submit_wish(&body).await.map_err(|e| ctx.network_error(e))?;
                let wish = ctx.unwrap_response(response)?;

                let message = ctx
                    .dict
                    .translate("wishes.submitted", ctx.language, &[("id", &wish.id.to_string())]);
                print_created(ctx, &wish, message)
            }
        }
    }
}

fn wish_table(ctx: &CommandContext, wishes: &[Wish]) -> Table {
    let mut table = Table::new(vec![
        Column::new("ID").align(Alignment::Right),
        Column::new(ctx.t("wishes.title")).max_width(40),
        Column::new("STATUS"),
        Column::new("LIKES").align(Alignment::Right),
    ]);

    for wish in wishes {
        table.add_row(vec![
            wish.id.to_string(),
            wish.display_title(ctx.language).unwrap_or_default().to_string(),
            wish.status.clone(),
            wish.likes.to_string(),
        ]);
    }
    table
}
