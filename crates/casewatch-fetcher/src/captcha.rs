//! CAPTCHA resolution.
//!
//! Strategies are tried in order until one produces a non-empty answer. A
//! resolver that runs out of strategies reports [`FetchError::CaptchaUnsolved`];
//! it never hands back a blank or guessed string.

use crate::error::{FetchError, Result};
use async_trait::async_trait;
use base64::Engine as _;
use casewatch_core::FetchConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Characters a court CAPTCHA can contain.
pub const CAPTCHA_WHITELIST: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Why a single strategy produced no answer.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("{0} is not available")]
    Unavailable(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("solving service error: {0}")]
    Service(String),

    #[error("solving service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gave up after {0:?}")]
    Timeout(Duration),
}

/// CAPTCHA solver trait for pluggable implementations.
#[async_trait]
pub trait CaptchaStrategy: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Attempt to read the CAPTCHA.
    ///
    /// Returns Ok(None) when the strategy ran but could not read anything.
    async fn solve(&self, image: &[u8]) -> std::result::Result<Option<String>, CaptchaError>;
}

/// Keep only whitelisted characters; `None` if nothing is left.
#[must_use]
pub fn sanitize_answer(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| CAPTCHA_WHITELIST.contains(*c))
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Local OCR through the `tesseract` executable.
pub struct LocalOcr {
    binary: Option<PathBuf>,
    timeout: Duration,
}

impl LocalOcr {
    /// Use `binary`, or look up `tesseract` on `PATH` when `None`.
    #[must_use]
    pub fn new(binary: Option<PathBuf>, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    fn binary(&self) -> std::result::Result<PathBuf, CaptchaError> {
        match &self.binary {
            Some(path) => Ok(path.clone()),
            None => which::which("tesseract")
                .map_err(|_| CaptchaError::Unavailable("tesseract".to_string())),
        }
    }
}

#[async_trait]
impl CaptchaStrategy for LocalOcr {
    fn name(&self) -> &'static str {
        "local_ocr"
    }

    async fn solve(&self, image: &[u8]) -> std::result::Result<Option<String>, CaptchaError> {
        let binary = self.binary()?;

        // Covers feeding stdin as well as waiting for the result
        tokio::time::timeout(self.timeout, run_tesseract(&binary, image))
            .await
            .map_err(|_| CaptchaError::Timeout(self.timeout))?
    }
}

async fn run_tesseract(
    binary: &Path,
    image: &[u8],
) -> std::result::Result<Option<String>, CaptchaError> {
    let mut child = Command::new(binary)
        .args(["stdin", "stdout", "--psm", "8", "-c"])
        .arg(format!("tessedit_char_whitelist={CAPTCHA_WHITELIST}"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CaptchaError::Unavailable(format!("{}: {e}", binary.display())))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(image).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptchaError::Ocr(stderr.trim().to_string()));
    }

    Ok(sanitize_answer(&String::from_utf8_lossy(&output.stdout)))
}

/// Delegation to a 2captcha-compatible solving service.
pub struct ExternalService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    status: u8,
    request: String,
}

impl ExternalService {
    /// Create a client for the service at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            poll_interval: Duration::from_secs(5),
        })
    }

    /// Change how often a pending answer is polled.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn submit(&self, image: &[u8]) -> std::result::Result<String, CaptchaError> {
        let body = base64::engine::general_purpose::STANDARD.encode(image);
        let response: ServiceResponse = self
            .client
            .post(format!("{}/in.php", self.base_url))
            .form(&[
                ("key", self.api_key.as_str()),
                ("method", "base64"),
                ("body", body.as_str()),
                ("json", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status == 1 {
            Ok(response.request)
        } else {
            Err(CaptchaError::Service(response.request))
        }
    }

    async fn poll(&self, task_id: &str) -> std::result::Result<Option<String>, CaptchaError> {
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let response: ServiceResponse = self
                .client
                .get(format!("{}/res.php", self.base_url))
                .query(&[
                    ("key", self.api_key.as_str()),
                    ("action", "get"),
                    ("id", task_id),
                    ("json", "1"),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            match (response.status, response.request.as_str()) {
                (1, answer) => return Ok(sanitize_answer(&answer.to_ascii_uppercase())),
                (_, "CAPCHA_NOT_READY") => continue,
                (_, "ERROR_CAPTCHA_UNSOLVABLE") => return Ok(None),
                (_, other) => return Err(CaptchaError::Service(other.to_string())),
            }
        }
    }
}

#[async_trait]
impl CaptchaStrategy for ExternalService {
    fn name(&self) -> &'static str {
        "external_service"
    }

    async fn solve(&self, image: &[u8]) -> std::result::Result<Option<String>, CaptchaError> {
        let solve = async {
            let task_id = self.submit(image).await?;
            tracing::debug!(task_id = %task_id, "CAPTCHA submitted to solving service");
            self.poll(&task_id).await
        };

        tokio::time::timeout(self.timeout, solve)
            .await
            .map_err(|_| CaptchaError::Timeout(self.timeout))?
    }
}

/// Runs strategies in order until one answers.
pub struct CaptchaResolver {
    strategies: Vec<Box<dyn CaptchaStrategy>>,
}

impl CaptchaResolver {
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn CaptchaStrategy>>) -> Self {
        Self { strategies }
    }

    /// Local OCR, then the external service when a credential is configured.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let timeout = config.request_timeout();
        let mut strategies: Vec<Box<dyn CaptchaStrategy>> =
            vec![Box::new(LocalOcr::new(config.tesseract_path.clone(), timeout))];

        if let Some(key) = &config.captcha_service_key {
            strategies.push(Box::new(ExternalService::new(
                &config.captcha_service_url,
                key,
                timeout,
            )?));
        }

        Ok(Self::new(strategies))
    }

    /// Names of the configured strategies, in order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Produce a non-empty answer or [`FetchError::CaptchaUnsolved`].
    pub async fn resolve(&self, image: &[u8]) -> Result<String> {
        for strategy in &self.strategies {
            match strategy.solve(image).await {
                Ok(Some(answer)) if !answer.trim().is_empty() => {
                    tracing::info!(strategy = strategy.name(), "CAPTCHA solved");
                    return Ok(answer.trim().to_string());
                }
                Ok(_) => {
                    tracing::warn!(strategy = strategy.name(), "CAPTCHA strategy produced no answer");
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), error = %e, "CAPTCHA strategy failed");
                }
            }
        }

        Err(FetchError::CaptchaUnsolved {
            strategies: self
                .strategy_names()
                .into_iter()
                .map(String::from)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl CaptchaStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn solve(&self, _image: &[u8]) -> std::result::Result<Option<String>, CaptchaError> {
            Ok(self.0.map(String::from))
        }
    }

    struct Broken;

    #[async_trait]
    impl CaptchaStrategy for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn solve(&self, _image: &[u8]) -> std::result::Result<Option<String>, CaptchaError> {
            Err(CaptchaError::Service("ERROR_ZERO_BALANCE".to_string()))
        }
    }

    #[test]
    fn test_sanitize_answer() {
        assert_eq!(sanitize_answer(" X7K2P\n"), Some("X7K2P".to_string()));
        assert_eq!(sanitize_answer("a-b c"), None);
        assert_eq!(sanitize_answer("\n\x0c"), None);
        assert_eq!(sanitize_answer("AB'12"), Some("AB12".to_string()));
    }

    #[tokio::test]
    async fn test_first_answer_wins() {
        let resolver = CaptchaResolver::new(vec![
            Box::new(Fixed(Some("ABC123"))),
            Box::new(Fixed(Some("ZZZ999"))),
        ]);
        assert_eq!(resolver.resolve(b"img").await.unwrap(), "ABC123");
    }

    #[tokio::test]
    async fn test_falls_through_failures() {
        let resolver = CaptchaResolver::new(vec![
            Box::new(Broken),
            Box::new(Fixed(Some("  "))),
            Box::new(Fixed(Some("Q9"))),
        ]);
        assert_eq!(resolver.resolve(b"img").await.unwrap(), "Q9");
    }

    #[tokio::test]
    async fn test_exhausted_is_unsolved() {
        let resolver = CaptchaResolver::new(vec![Box::new(Broken), Box::new(Fixed(None))]);
        let err = resolver.resolve(b"img").await.unwrap_err();
        match err {
            FetchError::CaptchaUnsolved { strategies } => {
                assert_eq!(strategies, vec!["broken", "fixed"]);
            }
            other => panic!("expected CaptchaUnsolved, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_tesseract_without_credential_is_unsolved() {
        let config = FetchConfig {
            tesseract_path: Some(PathBuf::from("/nonexistent/tesseract")),
            ..FetchConfig::default()
        };
        let resolver = CaptchaResolver::from_config(&config).unwrap();
        assert_eq!(resolver.strategy_names(), vec!["local_ocr"]);

        let err = resolver.resolve(b"definitely not an image").await.unwrap_err();
        assert!(matches!(err, FetchError::CaptchaUnsolved { .. }));
    }

    #[tokio::test]
    async fn test_external_service_polls_until_ready() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/in.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 1, "request": "42"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/res.php"))
            .and(query_param("id", "42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 0, "request": "CAPCHA_NOT_READY"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/res.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 1, "request": "x7k2p"})),
            )
            .mount(&server)
            .await;

        let service = ExternalService::new(server.uri(), "key", Duration::from_secs(5))
            .unwrap()
            .with_poll_interval(Duration::from_millis(10));
        let answer = service.solve(b"img").await.unwrap();
        assert_eq!(answer.as_deref(), Some("X7K2P"));
    }

    #[tokio::test]
    async fn test_external_service_rejection() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/in.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 0, "request": "ERROR_WRONG_USER_KEY"})),
            )
            .mount(&server)
            .await;

        let service = ExternalService::new(server.uri(), "bad", Duration::from_secs(5)).unwrap();
        let err = service.solve(b"img").await.unwrap_err();
        assert!(err.to_string().contains("ERROR_WRONG_USER_KEY"));
    }

    #[tokio::test]
    async fn test_external_service_bounded_by_one_timeout() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/in.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 1, "request": "42"}))
                    .set_delay(Duration::from_millis(250)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/res.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 0, "request": "CAPCHA_NOT_READY"})),
            )
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(400);
        let service = ExternalService::new(server.uri(), "key", timeout)
            .unwrap()
            .with_poll_interval(Duration::from_millis(20));

        let started = std::time::Instant::now();
        let err = service.solve(b"img").await.unwrap_err();
        assert!(matches!(err, CaptchaError::Timeout(_)), "{err:?}");
        assert!(started.elapsed() < Duration::from_millis(600), "{:?}", started.elapsed());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_ocr_timeout_covers_stdin() {
        use std::os::unix::fs::PermissionsExt;

        // Never reads stdin, so a large image blocks the pipe
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let script = tmp.path().join("stalled-ocr");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("make script executable");

        let timeout = Duration::from_millis(200);
        let ocr = LocalOcr::new(Some(script), timeout);
        let image = vec![0u8; 4 * 1024 * 1024];

        let started = std::time::Instant::now();
        let err = ocr.solve(&image).await.unwrap_err();
        assert!(matches!(err, CaptchaError::Timeout(_)), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_credential_enables_external_service() {
        let config = FetchConfig {
            captcha_service_key: Some("key".to_string()),
            ..FetchConfig::default()
        };
        let resolver = CaptchaResolver::from_config(&config).unwrap();
        assert_eq!(resolver.strategy_names(), vec!["local_ocr", "external_service"]);
    }
}
