//! The `monitor` command: run the poll loop until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use netwarden_core::{Monitor, PresenceLog, PresenceTracker, RouterControl};

use crate::cli::GlobalOpts;
use crate::context::AppContext;
use crate::error::CliError;

pub async fn handle(ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    let tracker = PresenceTracker::new(&ctx.config.monitor.notify_patterns);
    let log = PresenceLog::new(ctx.config.storage.presence_log_path());
    let interval = Duration::from_secs(ctx.config.monitor.interval_secs);

    let monitor = Monitor::new(
        Arc::clone(&ctx.session) as Arc<dyn RouterControl>,
        tracker,
        log,
        ctx.sink(),
        interval,
    )
    .with_stale_horizon(ctx.config.monitor.stale_after_secs);

    if !global.quiet {
        eprintln!(
            "Monitoring every {}s (notify patterns: {}). Ctrl-C to stop.",
            interval.as_secs(),
            if ctx.config.monitor.notify_patterns.is_empty() {
                "none".to_owned()
            } else {
                ctx.config.monitor.notify_patterns.join(", ")
            }
        );
    }

    // Cooperative shutdown: the loop finishes its current iteration.
    let cancel = monitor.cancellation_token();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
        cancel.cancel();
    });

    monitor.run().await;
    ctx.session.logout().await;
    Ok(())
}
