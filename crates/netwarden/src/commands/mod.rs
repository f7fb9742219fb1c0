//! Command handlers. Each module owns one subcommand tree.

pub mod allowlist;
pub mod config_cmd;
pub mod devices;
pub mod lockdown;
pub mod monitor;
pub mod sites;

use crate::cli::{Command, GlobalOpts};
use crate::context::AppContext;
use crate::error::CliError;

pub async fn dispatch(cmd: Command, ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Monitor => monitor::handle(ctx, global).await,
        Command::Devices(args) => devices::handle(ctx, args, global).await,
        Command::Sites(args) => sites::handle(ctx, args, global).await,
        Command::Lockdown(args) => lockdown::handle(ctx, args, global).await,
        Command::Allowlist(args) => allowlist::handle(ctx, args, global),
        // Handled before a context exists
        Command::Config(_) | Command::Completions(_) => unreachable!("dispatched in main"),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
