// Gateway authentication
//
// Two-step salted login: the first POST carries the sentinel password
// "seeksalthash" and returns a salt pair; the second carries the derived
// credential. The session cookie set by the gateway doubles as the CSRF
// token and must be echoed in an X-CSRF-TOKEN header afterwards.

use std::sync::atomic::Ordering;

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{Ack, GatewayClient};
use crate::error::Error;

/// Sentinel password that makes the login endpoint return the salt pair
/// instead of authenticating.
const SALT_REQUEST_PASSWORD: &str = "seeksalthash";

const LOGIN_PATH: &str = "api/v1/session/login";
const LOGOUT_PATH: &str = "api/v1/session/logout";
const MENU_PATH: &str = "api/v1/session/menu";

#[derive(Deserialize)]
struct SaltResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    salt: String,
    #[serde(default)]
    saltwebui: String,
    #[serde(default)]
    message: Option<String>,
}

/// PBKDF2-HMAC-SHA256, 1000 iterations, 16-byte output, lowercase hex.
/// This is what the gateway's web UI computes in JavaScript.
fn pbkdf2_hex(password: &str, salt: &str) -> String {
    let mut derived = [0u8; 16];
    pbkdf2::pbkdf2_hmac::<sha2::Sha256>(password.as_bytes(), salt.as_bytes(), 1_000, &mut derived);
    hex::encode(derived)
}

/// Derive the final login credential from the plaintext password and the
/// salt pair returned by the salt request.
///
/// A literal `"none"` salt means the gateway wants the plaintext password;
/// otherwise the password is hashed with the first salt and the result
/// hashed again with the web-UI salt.
pub fn derive_credential(password: &str, salt: &str, salt_webui: &str) -> String {
    if salt == "none" {
        password.to_owned()
    } else {
        pbkdf2_hex(&pbkdf2_hex(password, salt), salt_webui)
    }
}

impl GatewayClient {
    /// Authenticate with the gateway.
    ///
    /// Walks the full handshake: warm-up GETs, a logout to clear any stale
    /// server-side session, the salt request, the credential POST, CSRF
    /// extraction from the `auth` cookie, and a final activation read.
    pub async fn login(&self) -> Result<(), Error> {
        if self.username.is_empty() || self.password.expose_secret().is_empty() {
            return Err(Error::Authentication {
                message: "gateway credentials not configured".into(),
            });
        }

        debug!("logging in at {}", self.base_url());

        // Warm-up: the UI always loads the root page and the menu before
        // logging in, and the gateway rejects logins that skip this.
        self.http()
            .get(self.base_url().clone())
            .send()
            .await
            .map_err(Error::Transport)?;

        // Clear any stale server-side session; the gateway refuses a second
        // concurrent login otherwise. Failure here is not fatal.
        let _ = self
            .http()
            .post(self.api_url(LOGOUT_PATH)?)
            .send()
            .await;

        self.http()
            .get(self.api_url(MENU_PATH)?)
            .send()
            .await
            .map_err(Error::Transport)?;

        // Step 1: salt request.
        let resp = self
            .http()
            .post(self.api_url(LOGIN_PATH)?)
            .form(&[("username", self.username.as_str()), ("password", SALT_REQUEST_PASSWORD)])
            .send()
            .await
            .map_err(Error::Transport)?;

        let salt: SaltResponse = resp.json().await.map_err(Error::Transport)?;
        if salt.error != "ok" {
            return Err(Error::Authentication {
                message: salt
                    .message
                    .unwrap_or_else(|| format!("salt request rejected: {}", salt.error)),
            });
        }

        // Step 2: credential POST.
        let credential =
            derive_credential(self.password.expose_secret(), &salt.salt, &salt.saltwebui);

        let resp = self
            .http()
            .post(self.api_url(LOGIN_PATH)?)
            .form(&[("username", self.username.as_str()), ("password", credential.as_str())])
            .send()
            .await
            .map_err(Error::Transport)?;

        let ack: Ack = resp.json().await.map_err(Error::Transport)?;
        if ack.error != "ok" {
            return Err(Error::Authentication {
                message: ack
                    .message
                    .unwrap_or_else(|| format!("login rejected: {}", ack.error)),
            });
        }

        // The auth cookie value is the CSRF token.
        match self.auth_cookie() {
            Some(token) => {
                *self.csrf_token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
            }
            None => warn!("login succeeded but no auth cookie was set"),
        }

        // Activation read: the session is not usable until the menu has been
        // fetched once with the CSRF header attached.
        self.apply_csrf(self.http().get(self.api_url(MENU_PATH)?))
            .send()
            .await
            .map_err(Error::Transport)?;

        self.logged_in.store(true, Ordering::Release);
        debug!("login successful");
        Ok(())
    }

    /// End the current session. Best-effort: transport failures are ignored,
    /// the local session flag is always cleared.
    pub async fn logout(&self) {
        if !self.is_logged_in() {
            return;
        }
        if let Ok(url) = self.api_url(LOGOUT_PATH) {
            let _ = self
                .apply_csrf(self.http().post(url))
                .timeout(self.probe_timeout())
                .send()
                .await;
        }
        self.invalidate_session();
        debug!("logged out");
    }

    /// Make sure we hold a live session, re-authenticating when the probe
    /// fails.
    ///
    /// The gateway invalidates our session silently whenever someone logs in
    /// through the web UI, so callers must invoke this immediately before
    /// every mutating write, not just once up front.
    pub async fn ensure_logged_in(&self) -> Result<(), Error> {
        if self.is_logged_in() {
            if self.probe_session().await {
                return Ok(());
            }
            debug!("session probe failed, re-authenticating");
            self.invalidate_session();
        }
        self.login().await
    }

    /// Cheap session-validity probe: a short-timeout GET of the menu
    /// endpoint. Any non-200 answer means the session is gone.
    async fn probe_session(&self) -> bool {
        let Ok(url) = self.api_url(MENU_PATH) else {
            return false;
        };
        match self
            .apply_csrf(self.http().get(url))
            .timeout(self.probe_timeout())
            .send()
            .await
        {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_credential_for_none_salt() {
        assert_eq!(derive_credential("hunter2", "none", "ignored"), "hunter2");
    }

    #[test]
    fn salted_credential_is_derived_not_plaintext() {
        let derived = derive_credential("hunter2", "abc123", "def456");
        assert_ne!(derived, "hunter2");
        // 16 bytes hex-encoded
        assert_eq!(derived.len(), 32);
        assert!(derived.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derivation_chains_both_salts() {
        // Changing either salt must change the result.
        let base = derive_credential("pw", "s1", "s2");
        assert_ne!(base, derive_credential("pw", "s1x", "s2"));
        assert_ne!(base, derive_credential("pw", "s1", "s2x"));
    }

    #[test]
    fn pbkdf2_hex_matches_known_vector() {
        // Independently computed with hashlib.pbkdf2_hmac('sha256', b'password',
        // b'salt', 1000, dklen=16).hex()
        assert_eq!(
            pbkdf2_hex("password", "salt"),
            "632c2812e46d4604102ba7618e9d6d7d"
        );
    }

    #[test]
    fn full_chain_matches_known_vector() {
        assert_eq!(
            derive_credential("password", "salt", "webui"),
            "b85cce8d74599bfbfe1577e93afc8303"
        );
    }
}
