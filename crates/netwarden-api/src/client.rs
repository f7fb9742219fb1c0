// Gateway HTTP client
//
// Wraps `reqwest::Client` with gateway-specific URL construction, the
// `{error: "ok"}` envelope handling, and CSRF header injection. Endpoint
// groups (auth, host, filter) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Connection parameters for a gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway root URL, e.g. `http://192.168.0.1`.
    pub base_url: Url,
    pub username: String,
    pub password: SecretString,
    pub transport: TransportConfig,
}

/// Raw HTTP client for the gateway's `/api/v1/*` management API.
///
/// Owns the cookie jar (the session lives there as an `auth` cookie) and the
/// CSRF token mirrored from it. The gateway keeps at most one authenticated
/// session alive system-wide, so a process should hold exactly one of these
/// and funnel every call through it.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    pub(crate) username: String,
    pub(crate) password: SecretString,
    cookie_jar: Arc<Jar>,
    pub(crate) csrf_token: RwLock<Option<String>>,
    pub(crate) logged_in: AtomicBool,
    transport: TransportConfig,
}

/// Response envelope shared by every GET endpoint: `{error, data, message}`.
#[derive(serde::Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: String,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// POST responses drop the `data` payload.
#[derive(serde::Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub(crate) error: String,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

impl GatewayClient {
    /// Create a new client. Does not authenticate -- call
    /// [`login()`](Self::login) or let [`ensure_logged_in()`](Self::ensure_logged_in)
    /// do it lazily.
    pub fn new(config: GatewayConfig) -> Result<Self, Error> {
        let cookie_jar = Arc::new(Jar::default());
        let http = config
            .transport
            .build_client(&config.base_url, Arc::clone(&cookie_jar))?;

        Ok(Self {
            http,
            base_url: config.base_url,
            username: config.username,
            password: config.password,
            cookie_jar,
            csrf_token: RwLock::new(None),
            logged_in: AtomicBool::new(false),
            transport: config.transport,
        })
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the client currently believes it holds a valid session.
    /// Purely local state -- the gateway may have invalidated us silently.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::Acquire)
    }

    /// Drop the local session flag so the next call re-authenticates.
    pub fn invalidate_session(&self) {
        self.logged_in.store(false, Ordering::Release);
    }

    pub(crate) fn probe_timeout(&self) -> Duration {
        self.transport.probe_timeout
    }

    // ── URL / header helpers ─────────────────────────────────────────

    /// Build a full URL for an API path (e.g. `api/v1/host`).
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Read the `auth` session cookie the login response stored in the jar.
    /// Its value doubles as the CSRF token.
    pub(crate) fn auth_cookie(&self) -> Option<String> {
        let cookies = self.cookie_jar.cookies(&self.base_url)?;
        let header = cookies.to_str().ok()?;
        header.split("; ").find_map(|pair| {
            pair.strip_prefix("auth=").map(str::to_owned)
        })
    }

    /// Apply the stored CSRF token to a request builder.
    pub(crate) fn apply_csrf(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.csrf_token.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_deref() {
            Some(token) => builder.header("X-CSRF-TOKEN", token),
            None => builder,
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET an endpoint and unwrap its `{error, data}` envelope.
    pub(crate) async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("GET {}", url);

        let resp = self
            .apply_csrf(self.http.get(url))
            .send()
            .await
            .map_err(Error::Transport)?;

        let body = Self::checked_body(resp).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| Error::Protocol {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        if envelope.error != "ok" {
            return Err(Error::Protocol {
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("gateway error: {}", envelope.error)),
                body,
            });
        }

        envelope.data.ok_or(Error::Protocol {
            message: "response missing data payload".into(),
            body,
        })
    }

    /// POST form fields to an endpoint and require `error == "ok"`.
    ///
    /// Uses the long write timeout -- the gateway applies filter-table
    /// replacements synchronously before answering.
    pub(crate) async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<(), Error> {
        let url = self.api_url(path)?;
        debug!("POST {}", url);
        trace!(fields = form.len(), "form body");

        let resp = self
            .apply_csrf(self.http.post(url))
            .timeout(self.transport.write_timeout)
            .form(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let body = Self::checked_body(resp).await?;
        let ack: Ack = serde_json::from_str(&body).map_err(|e| Error::Protocol {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        if ack.error != "ok" {
            return Err(Error::Protocol {
                message: ack
                    .message
                    .unwrap_or_else(|| format!("gateway error: {}", ack.error)),
                body,
            });
        }
        Ok(())
    }

    /// Check HTTP status and read the body. 401 means the session cookie is
    /// no longer accepted -- the one signal the gateway gives us when a
    /// competing login stole the session.
    async fn checked_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Protocol {
                message: format!("HTTP {status}"),
                body,
            });
        }

        resp.text().await.map_err(Error::Transport)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

fn preview(body: &str) -> &str {
    &body[..body.len().min(200)]
}
