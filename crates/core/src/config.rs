use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SEOFORGE_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SEOFORGE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            rate_limit: RateLimitConfig::from_env_profiled(p),
            pipeline: PipelineConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}, data_dir={}", self.server.host, self.server.port, self.server.data_dir.display());
        tracing::info!(
            "  rate_limit:  {}/min, {}/hour, {} operation overrides",
            self.rate_limit.requests_per_minute,
            self.rate_limit.requests_per_hour,
            self.rate_limit.operations.len()
        );
        tracing::info!(
            "  pipeline:    source_timeout={}ms, max_images={}, max_keywords={}",
            self.pipeline.source_timeout_ms,
            self.pipeline.max_images,
            self.pipeline.max_keywords
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Directory for the JSON product store.
    pub data_dir: PathBuf,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3001),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data/products")),
        }
    }
}

// ── Rate limiting ─────────────────────────────────────────────

/// Client identity headers, highest priority first.
pub const DEFAULT_CLIENT_HEADERS: &[&str] =
    &["cf-connecting-ip", "x-real-ip", "x-forwarded-for", "x-client-ip"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
    /// Headers consulted in order to resolve the client address.
    pub client_headers: Vec<String>,
    /// Stricter limits for specific operations, enforced on top of the globals.
    pub operations: Vec<OperationLimit>,
}

/// Per-operation limit. `path` uses `:id` for numeric and UUID segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLimit {
    pub method: String,
    pub path: String,
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
}

impl OperationLimit {
    pub fn new(method: &str, path: &str, per_minute: u32, per_hour: u32) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            requests_per_minute: per_minute,
            requests_per_hour: per_hour,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_hour: 1000,
            client_headers: DEFAULT_CLIENT_HEADERS.iter().map(|h| h.to_string()).collect(),
            operations: vec![
                OperationLimit::new("POST", "/api/products/enrich", 10, 200),
                OperationLimit::new("POST", "/api/products/:id/reprocess", 5, 50),
            ],
        }
    }
}

impl RateLimitConfig {
    /// Simple global limits with no operation overrides.
    pub fn flat(requests_per_minute: u32, requests_per_hour: u32) -> Self {
        Self {
            requests_per_minute,
            requests_per_hour,
            operations: Vec::new(),
            ..Self::default()
        }
    }

    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        let client_headers = profiled_env_opt(p, "RATE_LIMIT_CLIENT_HEADERS")
            .map(|v| {
                v.split(',')
                    .map(|h| h.trim().to_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.client_headers);
        let operations = vec![
            OperationLimit::new(
                "POST",
                "/api/products/enrich",
                profiled_env_u32(p, "RATE_LIMIT_ENRICH_PER_MINUTE", 10),
                profiled_env_u32(p, "RATE_LIMIT_ENRICH_PER_HOUR", 200),
            ),
            OperationLimit::new(
                "POST",
                "/api/products/:id/reprocess",
                profiled_env_u32(p, "RATE_LIMIT_REPROCESS_PER_MINUTE", 5),
                profiled_env_u32(p, "RATE_LIMIT_REPROCESS_PER_HOUR", 50),
            ),
        ];
        Self {
            requests_per_minute: profiled_env_u32(p, "RATE_LIMIT_PER_MINUTE", defaults.requests_per_minute),
            requests_per_hour: profiled_env_u32(p, "RATE_LIMIT_PER_HOUR", defaults.requests_per_hour),
            client_headers,
            operations,
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Per-call timeout for every external source.
    pub source_timeout_ms: u64,
    /// Images requested from the image source.
    pub max_images: usize,
    /// Candidates scoring below this are dropped.
    pub min_image_score: i32,
    pub max_keywords: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 5000,
            max_images: 5,
            min_image_score: 25,
            max_keywords: 50,
        }
    }
}

impl PipelineConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            source_timeout_ms: profiled_env_u64(p, "SOURCE_TIMEOUT_MS", defaults.source_timeout_ms),
            max_images: profiled_env_u32(p, "MAX_IMAGES", defaults.max_images as u32) as usize,
            min_image_score: profiled_env_opt(p, "MIN_IMAGE_SCORE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_image_score),
            max_keywords: profiled_env_u32(p, "MAX_KEYWORDS", defaults.max_keywords as u32) as usize,
        }
    }

    pub fn source_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.source_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.requests_per_minute, 60);
        assert_eq!(config.requests_per_hour, 1000);
        assert_eq!(config.client_headers[0], "cf-connecting-ip");
        assert_eq!(config.operations.len(), 2);
        assert_eq!(config.operations[0].method, "POST");
    }

    #[test]
    fn flat_has_no_overrides() {
        let config = RateLimitConfig::flat(3, 100);
        assert_eq!(config.requests_per_minute, 3);
        assert!(config.operations.is_empty());
        assert!(!config.client_headers.is_empty());
    }

    #[test]
    fn pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.source_timeout(), std::time::Duration::from_secs(5));
        assert_eq!(config.max_keywords, 50);
    }

    #[test]
    fn profile_label_defaults() {
        let config = Config::for_profile("");
        assert_eq!(config.profile_label(), "default");
    }
}
