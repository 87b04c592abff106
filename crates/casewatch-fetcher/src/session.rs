//! Plain HTTP session with browser-like headers.
//!
//! No retries here: connection failures surface as [`FetchError::Network`]
//! and expired waits as [`FetchError::Timeout`].

use crate::error::{FetchError, Result};
use casewatch_browser::{FingerprintConfig, PageCookie};
use reqwest::cookie::Jar;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

/// Creates one [`HttpSession`] per lookup.
#[derive(Debug, Clone)]
pub struct SessionManager {
    timeout: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Open a session presenting `fingerprint`, with its own cookie store.
    pub fn create_session(&self, fingerprint: &FingerprintConfig) -> Result<HttpSession> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .default_headers(browser_headers(fingerprint)?)
            .cookie_provider(Arc::clone(&jar))
            .timeout(self.timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(HttpSession { client, jar })
    }
}

/// An exclusively-owned HTTP client for one lookup.
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
}

impl HttpSession {
    /// Carry the browser's session cookies over for requests to `url`.
    ///
    /// Resources such as the CAPTCHA image are bound to the browser session
    /// that rendered the form.
    pub fn import_cookies(&self, url: &str, cookies: &[PageCookie]) -> Result<()> {
        let url = Url::parse(url)
            .map_err(|e| FetchError::Navigation(format!("invalid URL '{url}': {e}")))?;
        for cookie in cookies {
            self.jar
                .add_cookie_str(&format!("{}={}; Path=/", cookie.name, cookie.value), &url);
        }
        tracing::debug!(
            count = cookies.len(),
            host = url.host_str().unwrap_or_default(),
            "imported browser cookies"
        );
        Ok(())
    }

    /// Download a resource, treating any non-success status as a network failure.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("GET {url} returned HTTP {status}")));
        }

        let bytes = response.bytes().await?;
        tracing::debug!(url = %url, bytes = bytes.len(), "downloaded resource");
        Ok(bytes.to_vec())
    }
}

/// Headers a desktop browser sends on a top-level navigation.
pub fn browser_headers(fingerprint: &FingerprintConfig) -> Result<HeaderMap> {
    let value = |v: &str| {
        HeaderValue::from_str(v).map_err(|e| FetchError::Network(format!("invalid header value: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, value(&fingerprint.user_agent)?);
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(header::ACCEPT_LANGUAGE, value(&fingerprint.accept_language)?);
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    Ok(headers)
}
