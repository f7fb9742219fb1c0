//! Telegram notification sink.
//!
//! Posts `sendMessage` calls to the Bot API. Delivery failure returns
//! `false`; the caller logs it and the poll loop keeps running.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use netwarden_core::{EventKind, EventSink, NotifyEvent};

const API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    ok: bool,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, chat_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: bot_token.to_owned(),
            chat_id: chat_id.to_owned(),
        }
    }

    /// Send a raw HTML-formatted message to the configured chat.
    pub async fn send_message(&self, text: &str) -> bool {
        let url = format!("{API_BASE}/bot{}/sendMessage", self.bot_token);
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "HTML"),
        ];

        let result = self
            .http
            .post(url)
            .timeout(SEND_TIMEOUT)
            .form(&form)
            .send()
            .await;

        match result {
            Ok(resp) => match resp.json::<SendResponse>().await {
                Ok(body) if body.ok => {
                    debug!("telegram message delivered");
                    true
                }
                Ok(_) => {
                    warn!("telegram rejected the message");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "telegram answered with unexpected body");
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, "telegram send failed");
                false
            }
        }
    }

    fn format_event(event: &NotifyEvent) -> String {
        match event.kind {
            EventKind::Arrived => format!(
                "\u{1f4f1} <b>Device Arrived</b>\n\n\u{1f7e2} <b>{}</b>\nIP: <code>{}</code>\nStatus: Connected to network",
                event.name, event.address
            ),
            EventKind::Departed => format!(
                "\u{1f4f1} <b>Device Left</b>\n\n\u{1f534} <b>{}</b>\nIP: <code>{}</code>\nStatus: Disconnected from network",
                event.name, event.address
            ),
            EventKind::LockdownStarted => format!(
                "\u{1f512} <b>Lockdown Started</b>\n\nMode: {}",
                event.name
            ),
            EventKind::LockdownStopped => {
                "\u{1f513} <b>Lockdown Ended</b>\n\nAll devices can connect again".to_owned()
            }
        }
    }
}

#[async_trait]
impl EventSink for TelegramNotifier {
    async fn notify(&self, event: &NotifyEvent) -> bool {
        self.send_message(&Self::format_event(event)).await
    }
}
