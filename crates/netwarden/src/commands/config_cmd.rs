//! Config command handlers. These run without a gateway session.

use std::fs;

use dialoguer::Input;

use netwarden_config::{Config, config_path};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

use super::confirm;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = global.config.clone().unwrap_or_else(config_path);
            println!("{}", path.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let mut config = Config::load(global.config.as_ref())?;
            if !config.router.password.is_empty() {
                config.router.password = "<redacted>".into();
            }
            println!("{}", config.to_toml()?);
            Ok(())
        }

        ConfigCommand::Init => init(global),
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = global.config.clone().unwrap_or_else(config_path);

    if path.exists()
        && !confirm(
            &format!("{} exists. Overwrite?", path.display()),
            global.yes,
        )?
    {
        return Ok(());
    }

    let mut config = Config::default();

    config.router.url = Input::new()
        .with_prompt("Gateway URL")
        .default(config.router.url.clone())
        .interact_text()
        .map_err(dialoguer_err)?;

    config.router.username = Input::new()
        .with_prompt("Gateway username")
        .interact_text()
        .map_err(dialoguer_err)?;

    config.router.password = rpassword::prompt_password("Gateway password: ")?;

    let patterns: String = Input::new()
        .with_prompt("Notify patterns (comma-separated name substrings, empty for none)")
        .allow_empty(true)
        .interact_text()
        .map_err(dialoguer_err)?;
    config.monitor.notify_patterns = patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, config.to_toml()?)?;

    println!("Wrote {}", path.display());
    println!("Tip: keep the password out of the file with NETWARDEN_ROUTER__PASSWORD.");
    Ok(())
}

fn dialoguer_err(e: dialoguer::Error) -> CliError {
    CliError::Io(std::io::Error::other(e))
}
