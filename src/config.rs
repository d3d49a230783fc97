//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::filters::FilterThresholds;
use crate::pacing::Pacing;
use crate::search::SearchCriteria;
use crate::seller::models::normalize_cookie;
use crate::seller::{AuthContext, Marketplace};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seller portal marketplace
    #[serde(default)]
    pub marketplace: Marketplace,

    /// Overrides the marketplace's obfuscated id
    #[serde(default)]
    pub marketplace_id: Option<String>,

    /// Value of the portal's anti-CSRF token
    #[serde(default)]
    pub csrf_token: Option<String>,

    /// Session cookie copied from the browser
    #[serde(default)]
    pub cookie: Option<String>,

    /// Relay endpoint; requests go straight to the portal when unset
    #[serde(default)]
    pub relay_url: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Niche thresholds
    #[serde(default)]
    pub thresholds: FilterThresholds,

    /// Lower bound of the delay before each detail request
    #[serde(default = "default_candidate_delay_min_ms")]
    pub candidate_delay_min_ms: u64,

    /// Upper bound (exclusive) of the delay before each detail request
    #[serde(default = "default_candidate_delay_max_ms")]
    pub candidate_delay_max_ms: u64,

    /// Delays picked from after each keyword
    #[serde(default = "default_keyword_delays_ms")]
    pub keyword_delays_ms: Vec<u64>,

    /// Attempts per request, shared by rate limits and failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_candidate_delay_min_ms() -> u64 {
    Pacing::default().candidate_delay_min_ms
}

fn default_candidate_delay_max_ms() -> u64 {
    Pacing::default().candidate_delay_max_ms
}

fn default_keyword_delays_ms() -> Vec<u64> {
    Pacing::default().keyword_delays_ms
}

fn default_max_attempts() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marketplace: Marketplace::default(),
            marketplace_id: None,
            csrf_token: None,
            cookie: None,
            relay_url: None,
            proxy: None,
            thresholds: FilterThresholds::default(),
            candidate_delay_min_ms: default_candidate_delay_min_ms(),
            candidate_delay_max_ms: default_candidate_delay_max_ms(),
            keyword_delays_ms: default_keyword_delays_ms(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("niche-finder").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(country) = std::env::var("NICHE_COUNTRY") {
            if let Ok(m) = country.parse() {
                self.marketplace = m;
            }
        }

        if let Ok(id) = std::env::var("NICHE_MARKETPLACE_ID") {
            self.marketplace_id = Some(id);
        }

        if let Ok(token) = std::env::var("NICHE_CSRF") {
            self.csrf_token = Some(token);
        }

        if let Ok(cookie) = std::env::var("NICHE_COOKIE") {
            self.cookie = Some(cookie);
        }

        if let Ok(relay) = std::env::var("NICHE_RELAY") {
            self.relay_url = Some(relay);
        }

        if let Ok(proxy) = std::env::var("NICHE_PROXY") {
            self.proxy = Some(proxy);
        }

        self
    }

    /// Obfuscated marketplace id sent with every query.
    pub fn marketplace_id(&self) -> String {
        match self.marketplace_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.marketplace.obfuscated_id().to_string(),
        }
    }

    /// Session credentials, with the cookie normalized to a single header line.
    pub fn auth(&self) -> AuthContext {
        AuthContext::new(
            self.csrf_token.clone().unwrap_or_default(),
            normalize_cookie(self.cookie.as_deref().unwrap_or_default()),
            self.marketplace.code(),
        )
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            candidate_delay_min_ms: self.candidate_delay_min_ms,
            candidate_delay_max_ms: self.candidate_delay_max_ms,
            keyword_delays_ms: self.keyword_delays_ms.clone(),
        }
    }

    /// Settings shared by every keyword of a run.
    pub fn search_template(&self) -> SearchCriteria {
        SearchCriteria::template(self.marketplace_id(), self.auth(), self.thresholds.sanitized())
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl OutputFormat {
    /// File extension used when exporting in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Table => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
            OutputFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
