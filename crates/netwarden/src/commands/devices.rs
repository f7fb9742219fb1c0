//! Device command handlers.

use tabled::Tabled;

use netwarden_core::{BlockOutcome, Device, MacAddress, RouterControl, UnblockOutcome};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::context::AppContext;
use crate::error::CliError;
use crate::output;

use super::confirm;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Online")]
    online: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            name: d.name.clone(),
            ip: d.ip.clone(),
            mac: d.mac.to_string(),
            connection: d.medium.to_string(),
            online: if d.online { "yes".into() } else { "no".into() },
        }
    }
}

#[derive(Tabled)]
struct FilterRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Action")]
    action: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &AppContext,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { online } => {
            let mut devices = ctx.session.devices().await;
            if online {
                devices.retain(|d| d.online);
            }
            devices.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.mac.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Blocked => {
            let entries = ctx.session.blocked_entries().await?;
            let out = output::render_list(
                &global.output,
                &entries,
                |e| FilterRow {
                    mac: e.macaddress.clone(),
                    description: e.description.clone(),
                    action: format!("{:?}", e.action),
                },
                |e| e.macaddress.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Block { device } => {
            let resolved = resolve(ctx, &device).await?;
            if !confirm(
                &format!("Block {} ({})?", resolved.name, resolved.mac),
                global.yes,
            )? {
                return Ok(());
            }

            match ctx.session.block_device(&resolved.mac, &resolved.name).await? {
                BlockOutcome::Blocked => output::print_status(
                    &format!("Blocked: {} ({})", resolved.name, resolved.mac),
                    true,
                    global.quiet,
                ),
                BlockOutcome::AlreadyBlocked => output::print_status(
                    &format!("{} ({}) is already blocked", resolved.name, resolved.mac),
                    false,
                    global.quiet,
                ),
            }
            Ok(())
        }

        DevicesCommand::Unblock { device } => {
            let mac = resolve_blocked(ctx, &device).await?;
            match ctx.session.unblock_device(&mac).await? {
                UnblockOutcome::Unblocked => {
                    output::print_status(&format!("Unblocked: {mac}"), true, global.quiet);
                }
                UnblockOutcome::NotBlocked => {
                    output::print_status(&format!("{mac} was not blocked"), false, global.quiet);
                }
            }
            Ok(())
        }
    }
}

/// Resolve a name substring or MAC to a device via the host table.
async fn resolve(ctx: &AppContext, query: &str) -> Result<Device, CliError> {
    ctx.session
        .find_device(query)
        .await
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: query.into(),
            list_command: "devices list".into(),
        })
}

/// Resolve for unblocking: the host table first, then the filter table's
/// descriptions (a blocked device may no longer show up as a host).
async fn resolve_blocked(ctx: &AppContext, query: &str) -> Result<MacAddress, CliError> {
    if let Some(device) = ctx.session.find_device(query).await {
        return Ok(device.mac);
    }

    let needle = query.to_lowercase();
    let entries = ctx.session.blocked_entries().await?;
    for entry in &entries {
        if entry.description.to_lowercase().contains(&needle) {
            return Ok(MacAddress::new(&entry.macaddress));
        }
    }

    // Last resort: treat the query itself as a MAC.
    if query.len() >= 12 {
        return Ok(MacAddress::new(query));
    }

    Err(CliError::NotFound {
        resource_type: "device".into(),
        identifier: query.into(),
        list_command: "devices blocked".into(),
    })
}
