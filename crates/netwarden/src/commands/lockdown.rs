//! Lockdown command handlers.

use tabled::Tabled;

use netwarden_core::{BlockedDevice, LockdownMode, LockdownReport};

use crate::cli::{GlobalOpts, LockdownArgs, LockdownCommand};
use crate::context::AppContext;
use crate::error::CliError;
use crate::output;

use super::confirm;

#[derive(Tabled)]
struct BlockedRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
}

impl From<&BlockedDevice> for BlockedRow {
    fn from(d: &BlockedDevice) -> Self {
        Self {
            name: d.name.clone(),
            mac: d.mac.clone(),
        }
    }
}

pub async fn handle(
    ctx: &AppContext,
    args: LockdownArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = ctx.lockdown_controller();

    match args.command {
        LockdownCommand::Status => {
            let status = controller.status();
            if status.active {
                let mode = status
                    .mode
                    .map_or_else(|| "unknown".to_owned(), |m| m.to_string());
                let since = status
                    .started_at
                    .map_or_else(|| "unknown".to_owned(), |t| t.to_rfc3339());
                output::print_status(
                    &format!(
                        "Lockdown ACTIVE ({mode} mode) since {since}, {} devices blocked",
                        status.blocked_devices.len()
                    ),
                    false,
                    global.quiet,
                );
                print_devices(&status.blocked_devices, global);
            } else {
                output::print_status("Lockdown is not active", true, global.quiet);
            }
            Ok(())
        }

        LockdownCommand::Preview => {
            let devices = controller.devices_to_block().await?;
            if devices.is_empty() {
                output::print_status(
                    "Nothing to block - every visible device is allowlisted",
                    true,
                    global.quiet,
                );
                return Ok(());
            }
            let blocked: Vec<BlockedDevice> = devices
                .iter()
                .map(|d| BlockedDevice {
                    name: d.name.clone(),
                    mac: d.mac.to_string(),
                })
                .collect();
            print_devices(&blocked, global);
            output::print_status(
                &format!(
                    "{} visible devices would be blocked (strict mode also blocks future connections)",
                    blocked.len()
                ),
                false,
                global.quiet,
            );
            Ok(())
        }

        LockdownCommand::Start { soft, dry_run } => {
            let mode = if soft {
                LockdownMode::Soft
            } else {
                LockdownMode::Strict
            };

            if !dry_run
                && !confirm(
                    &format!("Start {mode} lockdown? Non-allowlisted devices lose network access."),
                    global.yes,
                )?
            {
                return Ok(());
            }

            let report = controller.start(mode, dry_run).await?;
            print_report(&report, global);
            Ok(())
        }

        LockdownCommand::Stop => {
            let report = controller.stop().await?;
            print_report(&report, global);
            Ok(())
        }
    }
}

fn print_report(report: &LockdownReport, global: &GlobalOpts) {
    output::print_status(&report.message, report.failed.is_empty(), global.quiet);
    print_devices(&report.devices, global);
    for failure in &report.failed {
        eprintln!("  failed: {} ({}): {}", failure.name, failure.mac, failure.error);
    }
}

fn print_devices(devices: &[BlockedDevice], global: &GlobalOpts) {
    if devices.is_empty() {
        return;
    }
    let out = output::render_list(&global.output, devices, |d| BlockedRow::from(d), |d| d.mac.clone());
    output::print_output(&out, global.quiet);
}
