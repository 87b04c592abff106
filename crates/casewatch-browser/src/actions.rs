use crate::error::{BrowserError, Result};

/// A cookie held by the browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCookie {
    pub name: String,
    pub value: String,
}

/// Browser actions for automation.
///
/// One implementor drives one page. Every wait is bounded by the timeout
/// passed in, never by the implementor's own defaults.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL, failing with [`BrowserError::Timeout`] after `timeout_ms`
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()>;

    /// Replace the value of a form field
    async fn fill_field(&self, selector: &str, value: &str) -> Result<()>;

    /// Choose the `<option>` whose value is exactly `value`
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;

    /// Click an element by selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait for a selector to appear
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Value of `attribute` on every element matching `selector`, in document order
    async fn attribute_values(&self, selector: &str, attribute: &str) -> Result<Vec<String>>;

    /// URL of the current document
    async fn current_url(&self) -> Result<String>;

    /// Serialized HTML of the current document
    async fn content(&self) -> Result<String>;

    /// Cookies the page's session holds for the current URL
    async fn cookies(&self) -> Result<Vec<PageCookie>>;

    /// Release the page and the browser behind it
    async fn close(&self) -> Result<()>;
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}

/// Resolve a possibly relative `href` against the page it appeared on.
pub fn resolve_url(base: &str, href: &str) -> Result<String> {
    let base = url::Url::parse(base)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid base URL: {}", e)))?;

    base.join(href.trim())
        .map(|u| u.to_string())
        .map_err(|e| BrowserError::NavigationError(format!("Invalid link '{}': {}", href, e)))
}

/// Quote a string as a JavaScript literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://delhihighcourt.nic.in/case_status.asp").unwrap(),
            "delhihighcourt.nic.in"
        );
        assert_eq!(
            extract_domain("http://subdomain.example.com:8080/path").unwrap(),
            "subdomain.example.com"
        );
    }

    #[test]
    fn test_extract_domain_invalid() {
        assert!(extract_domain("not-a-url").is_err());
    }

    #[test]
    fn test_resolve_url() {
        let base = "https://delhihighcourt.nic.in/case_status.asp";
        assert_eq!(
            resolve_url(base, "/captcha/image.php?id=9").unwrap(),
            "https://delhihighcourt.nic.in/captcha/image.php?id=9"
        );
        assert_eq!(
            resolve_url(base, "captcha.png").unwrap(),
            "https://delhihighcourt.nic.in/captcha.png"
        );
        assert_eq!(
            resolve_url(base, "https://cdn.example.com/c.png").unwrap(),
            "https://cdn.example.com/c.png"
        );
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("W.P.(C)"), "\"W.P.(C)\"");
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(js_string("input[name='case_no']"), "\"input[name='case_no']\"");
    }
}
