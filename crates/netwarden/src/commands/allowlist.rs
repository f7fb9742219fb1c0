//! Allowlist command handlers.

use tabled::Tabled;

use netwarden_core::{AllowlistEntry, MacAddress};

use crate::cli::{AllowlistArgs, AllowlistCommand, GlobalOpts};
use crate::context::AppContext;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct AllowlistRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&AllowlistEntry> for AllowlistRow {
    fn from(e: &AllowlistEntry) -> Self {
        Self {
            name: e.name.clone(),
            mac: e.mac.clone(),
            reason: e.reason.clone(),
        }
    }
}

pub fn handle(ctx: &AppContext, args: AllowlistArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AllowlistCommand::List => {
            let entries = ctx.allowlist.load()?;
            let out = output::render_list(
                &global.output,
                &entries,
                |e| AllowlistRow::from(e),
                |e| e.mac.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AllowlistCommand::Add { name, mac, reason } => {
            let mac = MacAddress::new(&mac);
            if ctx.allowlist.add(&name, &mac, &reason)? {
                output::print_status(
                    &format!("Allowlisted: {name} ({mac})"),
                    true,
                    global.quiet,
                );
            } else {
                output::print_status(
                    &format!("{mac} is already allowlisted"),
                    false,
                    global.quiet,
                );
            }
            Ok(())
        }

        AllowlistCommand::Remove { mac } => {
            let mac = MacAddress::new(&mac);
            if ctx.allowlist.remove(&mac)? {
                output::print_status(&format!("Removed: {mac}"), true, global.quiet);
            } else {
                output::print_status(
                    &format!("{mac} was not in the allowlist"),
                    false,
                    global.quiet,
                );
            }
            Ok(())
        }
    }
}
