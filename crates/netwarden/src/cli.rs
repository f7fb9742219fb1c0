//! Clap derive structures for the `netwarden` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netwarden -- presence monitoring and access policy for a home gateway
#[derive(Debug, Parser)]
#[command(
    name = "netwarden",
    version,
    about = "Track device presence and enforce network access policy",
    long_about = "Tracks which devices are on the home network through the \
        gateway's management API and enforces access policy:\n\
        per-device blocking, site blocking, and full network lockdown.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file path (defaults to the platform config dir)
    #[arg(long, short = 'c', env = "NETWARDEN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the presence monitor loop (until Ctrl-C)
    #[command(alias = "mon")]
    Monitor,

    /// Inspect and control devices on the network
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage blocked web sites
    Sites(SitesArgs),

    /// Network lockdown: block everything except the allowlist
    #[command(alias = "ld")]
    Lockdown(LockdownArgs),

    /// Manage the never-block allowlist
    #[command(alias = "al")]
    Allowlist(AllowlistArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices known to the gateway
    #[command(alias = "ls")]
    List {
        /// Only currently connected devices
        #[arg(long)]
        online: bool,
    },

    /// List devices currently in the MAC filter table
    Blocked,

    /// Block a device by name or MAC (adds a filter entry)
    Block {
        /// Device name substring or hardware address
        device: String,
    },

    /// Unblock a device by name or MAC (removes its filter entry)
    Unblock {
        /// Device name substring or hardware address
        device: String,
    },
}

// ── Sites ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List blocked sites
    #[command(alias = "ls")]
    List,

    /// Block a site by hostname
    Block { site: String },

    /// Unblock a site
    Unblock { site: String },
}

// ── Lockdown ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LockdownArgs {
    #[command(subcommand)]
    pub command: LockdownCommand,
}

#[derive(Debug, Subcommand)]
pub enum LockdownCommand {
    /// Show the persisted lockdown state
    Status,

    /// Show what a lockdown would block, without blocking anything
    Preview,

    /// Start a lockdown (strict by default: blocks all unknown devices,
    /// including ones that connect later)
    Start {
        /// Soft mode: only block currently visible devices
        #[arg(long)]
        soft: bool,

        /// Compute the block set without touching the router
        #[arg(long)]
        dry_run: bool,
    },

    /// Stop the active lockdown and restore normal access
    Stop,
}

// ── Allowlist ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AllowlistArgs {
    #[command(subcommand)]
    pub command: AllowlistCommand,
}

#[derive(Debug, Subcommand)]
pub enum AllowlistCommand {
    /// List never-block devices
    #[command(alias = "ls")]
    List,

    /// Add a device to the allowlist
    Add {
        /// Human label
        name: String,
        /// Hardware address
        mac: String,
        /// Why this device must never be blocked
        #[arg(long, default_value = "User added")]
        reason: String,
    },

    /// Remove a device from the allowlist
    #[command(alias = "rm")]
    Remove {
        /// Hardware address
        mac: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactively create the config file
    Init,

    /// Print the effective configuration (password redacted)
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
