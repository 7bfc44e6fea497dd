use serde::Deserialize;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetch: FetchConfig,
    pub classifier: ClassifierConfig,
    pub sink: SinkConfig,
}

/// Page fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// User agent string sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of page fetches allowed in flight at once (1 = sequential)
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// What to do when a single page fetch fails during harvest
    #[serde(rename = "on-fetch-error", default)]
    pub on_fetch_error: FetchFailurePolicy,

    /// Suppress overlay elements (modals, popups, cookie walls)
    #[serde(rename = "remove-overlays", default = "default_true")]
    pub remove_overlays: bool,

    /// Include iframe content in extracted text
    #[serde(rename = "process-iframes", default)]
    pub process_iframes: bool,

    /// Structural tags excluded from text extraction
    #[serde(rename = "excluded-tags", default = "default_excluded_tags")]
    pub excluded_tags: Vec<String>,

    /// Prefer the main content region (main/article) over the whole body
    #[serde(rename = "magic-extraction", default = "default_true")]
    pub magic_extraction: bool,

    /// Drop external images from extracted text
    #[serde(rename = "exclude-external-images", default = "default_true")]
    pub exclude_external_images: bool,
}

/// Policy for per-link fetch failures during harvest
///
/// `Abort` is the baseline: the first failure ends the run and nothing is
/// persisted. `Skip` trades completeness for resilience; skipped links are
/// logged at WARN and the output map simply lacks their entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchFailurePolicy {
    #[default]
    Abort,
    Skip,
}

/// Classification oracle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the generateContent-style API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Cap on verdict length; the verdict is one word, 20 tokens is plenty
    #[serde(rename = "max-output-tokens", default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Retries for transient failures (429, 5xx, transport errors)
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries, in milliseconds
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Keep entries whose classification fails persistently
    #[serde(rename = "fail-open", default = "default_true")]
    pub fail_open: bool,
}

/// Sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// Destination folder (local sink)
    #[serde(rename = "folder-path")]
    pub folder_path: Option<String>,

    /// Storage account endpoint (object-storage sink)
    #[serde(rename = "account-url")]
    pub account_url: Option<String>,

    /// Name of the environment variable holding the SAS token
    #[serde(rename = "sas-token-env", default = "default_sas_token_env")]
    pub sas_token_env: String,
}

/// Which sink variant to persist to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    Local,
    ObjectStorage,
}

fn default_user_agent() -> String {
    format!("gleaner/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_excluded_tags() -> Vec<String> {
    ["form", "header", "footer", "nav"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GLEANER_CLASSIFIER_KEY".to_string()
}

fn default_max_output_tokens() -> u32 {
    20
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_sas_token_env() -> String {
    "GLEANER_SAS_TOKEN".to_string()
}
