//! Application context: everything stateful, constructed once at startup.
//!
//! The gateway allows exactly one authenticated session, so the single
//! [`RouterSession`] lives here and is shared by the monitor loop and every
//! command path. No ambient singletons.

use std::sync::Arc;

use netwarden_config::Config;
use netwarden_core::{
    AllowlistStore, EventSink, LockdownController, NullSink, RouterControl, RouterSession,
};

use crate::error::CliError;
use crate::notify::TelegramNotifier;

pub struct AppContext {
    pub config: Config,
    pub session: Arc<RouterSession>,
    pub allowlist: Arc<AllowlistStore>,
}

impl AppContext {
    pub fn from_config(config: Config) -> Result<Self, CliError> {
        let session = Arc::new(RouterSession::new(config.gateway_config()?)?);
        let allowlist = Arc::new(AllowlistStore::new(
            config.storage.allowlist_path(),
            config.infrastructure_entries(),
        ));
        Ok(Self {
            config,
            session,
            allowlist,
        })
    }

    /// The notification sink: Telegram when configured, otherwise a no-op.
    pub fn sink(&self) -> Arc<dyn EventSink> {
        match &self.config.telegram {
            Some(tg) => Arc::new(TelegramNotifier::new(&tg.bot_token, &tg.chat_id)),
            None => Arc::new(NullSink),
        }
    }

    /// Build a lockdown controller over the shared session and allowlist.
    pub fn lockdown_controller(&self) -> LockdownController {
        LockdownController::new(
            Arc::clone(&self.session) as Arc<dyn RouterControl>,
            Arc::clone(&self.allowlist),
            self.config.storage.lockdown_state_path(),
        )
        .with_sink(self.sink())
    }
}
