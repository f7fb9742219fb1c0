//! Site-blocking command handlers.

use tabled::Tabled;

use netwarden_core::{BlockOutcome, UnblockOutcome};

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand};
use crate::context::AppContext;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Method")]
    method: String,
}

pub async fn handle(ctx: &AppContext, args: SitesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SitesCommand::List => {
            let sites = ctx.session.blocked_sites().await?;
            let out = output::render_list(
                &global.output,
                &sites,
                |s| SiteRow {
                    site: s.site.clone(),
                    method: s.blockmethod.clone(),
                },
                |s| s.site.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SitesCommand::Block { site } => {
            match ctx.session.block_site(&site).await? {
                BlockOutcome::Blocked => {
                    output::print_status(&format!("Blocked: {site}"), true, global.quiet);
                }
                BlockOutcome::AlreadyBlocked => {
                    output::print_status(&format!("{site} is already blocked"), false, global.quiet);
                }
            }
            Ok(())
        }

        SitesCommand::Unblock { site } => {
            match ctx.session.unblock_site(&site).await? {
                UnblockOutcome::Unblocked => {
                    output::print_status(&format!("Unblocked: {site}"), true, global.quiet);
                }
                UnblockOutcome::NotBlocked => {
                    output::print_status(&format!("{site} was not blocked"), false, global.quiet);
                }
            }
            Ok(())
        }
    }
}
