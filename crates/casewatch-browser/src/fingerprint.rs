use rand::Rng;

/// Common desktop user agents.
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Common viewport sizes
const VIEWPORTS: [(u32, u32); 4] = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

/// Browser identity presented to the court site, shared by the headless
/// browser and the plain HTTP session so both look like the same visitor.
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub timezone: String,
}

impl FingerprintConfig {
    /// Generate a randomized fingerprint configuration
    pub fn randomized() -> Self {
        Self::from_rng(&mut rand::thread_rng())
    }

    /// Generate a fingerprint from the given random source.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let ua_idx = rng.gen_range(0..USER_AGENTS.len());
        let vp_idx = rng.gen_range(0..VIEWPORTS.len());
        let (width, height) = VIEWPORTS[vp_idx];

        Self {
            user_agent: USER_AGENTS[ua_idx].to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            viewport_width: width,
            viewport_height: height,
            timezone: "Asia/Kolkata".to_string(),
        }
    }

    /// Chrome command-line arguments that apply this fingerprint.
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            format!("--user-agent={}", self.user_agent),
            format!("--lang={}", primary_language(&self.accept_language)),
            "--disable-blink-features=AutomationControlled".to_string(),
        ]
    }
}

fn primary_language(accept_language: &str) -> &str {
    accept_language
        .split([',', ';'])
        .next()
        .map_or("en-US", str::trim)
}
