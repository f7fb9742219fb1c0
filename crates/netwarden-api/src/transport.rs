// Shared transport configuration for building reqwest::Client instances.
//
// The gateway's web UI is picky about headers: requests without the
// XMLHttpRequest marker or a Referer get an HTML error page instead of
// JSON. All defaults here replicate what the stock UI sends.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER};
use url::Url;

/// Timeout profile for gateway HTTP calls.
///
/// Reads and session probes stay short so a wedged gateway never stalls the
/// poll loop; full table-replacement writes get more headroom because the
/// gateway applies them synchronously.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for GET requests (host table, filter tables).
    pub read_timeout: Duration,
    /// Timeout for filter-table writes.
    pub write_timeout: Duration,
    /// Timeout for the cheap session-validity probe.
    pub probe_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` wired to the given cookie jar, with the
    /// default headers the gateway UI expects on every request.
    pub fn build_client(
        &self,
        base_url: &Url,
        jar: Arc<Jar>,
    ) -> Result<reqwest::Client, crate::error::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Ok(referer) = HeaderValue::from_str(base_url.as_str()) {
            headers.insert(REFERER, referer);
        }

        reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .default_headers(headers)
            .cookie_provider(jar)
            .timeout(self.read_timeout)
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
