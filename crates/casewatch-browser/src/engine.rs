use crate::actions::{extract_domain, js_string, BrowserActions, PageCookie};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::stream::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Interval between element lookups while waiting for a selector.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How to start a browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chrome_executable: None,
        }
    }
}

/// Opens exclusively-owned browser sessions.
#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Start a fresh browser with one blank page, presenting `fingerprint`.
    async fn launch(&self, fingerprint: &FingerprintConfig) -> Result<Box<dyn BrowserActions>>;
}

/// Launches a local Chromium for every session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    options: LaunchOptions,
}

impl ChromiumLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, fingerprint: &FingerprintConfig) -> Result<Box<dyn BrowserActions>> {
        let engine = BrowserEngine::launch(&self.options, fingerprint).await?;
        Ok(Box::new(engine))
    }
}

/// Browser automation engine: one Chromium process driving one page.
///
/// Dropping the engine aborts the CDP event loop; chromiumoxide kills the
/// child process when the [`Browser`] is dropped, so an abandoned fetch
/// never leaks a browser.
pub struct BrowserEngine {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl BrowserEngine {
    /// Create a new browser engine with default configuration
    pub async fn new() -> Result<Self> {
        Self::launch(&LaunchOptions::default(), &FingerprintConfig::randomized()).await
    }

    /// Launch Chromium with the given options and open a blank page.
    pub async fn launch(options: &LaunchOptions, fingerprint: &FingerprintConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(options.window_width, options.window_height)
            .arg("--disable-dev-shm-usage")
            .args(fingerprint.launch_args());

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(BrowserError::LaunchError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::LaunchError(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(BrowserError::LaunchError(format!("failed to open page: {e}")));
            }
        };

        tracing::debug!(
            headless = options.headless,
            user_agent = %fingerprint.user_agent,
            "browser launched"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }

    async fn evaluate<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| BrowserError::ScriptError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()> {
        if let Ok(domain) = extract_domain(url) {
            tracing::debug!(domain = %domain, "navigating");
        }

        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationError(format!("{url}: {e}"))),
            Err(_) => Err(BrowserError::Timeout(format!(
                "loading {url} exceeded {timeout_ms}ms"
            ))),
        }
    }

    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return false; \
             el.focus(); el.value = {val}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true; }})()",
            sel = js_string(selector),
            val = js_string(value),
        );

        if self.evaluate::<bool>(script).await? {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return 'missing'; \
             const opt = Array.from(el.options || []).find(o => o.value === {val}); \
             if (!opt) return 'no-option'; \
             el.value = opt.value; \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return 'ok'; }})()",
            sel = js_string(selector),
            val = js_string(value),
        );

        match self.evaluate::<String>(script).await?.as_str() {
            "ok" => Ok(()),
            "no-option" => Err(BrowserError::OptionNotFound {
                selector: selector.to_string(),
                value: value.to_string(),
            }),
            _ => Err(BrowserError::SelectorNotFound(selector.to_string())),
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;

        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), poll)
            .await
            .map_err(|_| {
                BrowserError::Timeout(format!("'{selector}' not present after {timeout_ms}ms"))
            })
    }

    async fn attribute_values(&self, selector: &str, attribute: &str) -> Result<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({sel})).map(el => el.getAttribute({attr}) || '')",
            sel = js_string(selector),
            attr = js_string(attribute),
        );
        self.evaluate(script).await
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?
            .ok_or_else(|| BrowserError::NavigationError("page has no URL".to_string()))
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn cookies(&self) -> Result<Vec<PageCookie>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        Ok(cookies
            .into_iter()
            .map(|c| PageCookie {
                name: c.name,
                value: c.value,
            })
            .collect())
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()));
        // Reap the child even if the close command failed
        let _ = browser.wait().await;
        self.handler.abort();
        closed.map(|_| ())
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
