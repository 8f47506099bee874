// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets (API keys, JWT key) as environment variables,
//! so everything is read once at startup.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which storage implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Firestore => "firestore",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Connection settings for one LLM provider.
#[derive(Debug, Clone)]
pub struct LlmProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// Response cache bounds for the AI gateway.
#[derive(Debug, Clone)]
pub struct AiCacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for AiCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 256,
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Storage implementation
    pub store_backend: StoreBackend,
    /// Users allowed to manage prompt templates
    pub admin_user_ids: Vec<u64>,

    // --- AI gateway ---
    pub openai: LlmProviderConfig,
    pub anthropic: LlmProviderConfig,
    /// Per-request timeout for LLM HTTP calls
    pub ai_timeout: Duration,
    pub ai_cache: AiCacheConfig,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            admin_user_ids: vec![1],
            openai: LlmProviderConfig {
                api_key: "test_openai_key".to_string(),
                model: DEFAULT_OPENAI_MODEL.to_string(),
                base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            },
            anthropic: LlmProviderConfig {
                api_key: "test_anthropic_key".to_string(),
                model: DEFAULT_ANTHROPIC_MODEL.to_string(),
                base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            },
            ai_timeout: Duration::from_secs(30),
            ai_cache: AiCacheConfig::default(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// For local development values can come from a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 8080)?,
            store_backend,
            admin_user_ids: parse_id_list(&env::var("ADMIN_USER_IDS").unwrap_or_default())?,

            openai: LlmProviderConfig {
                api_key: required_secret("OPENAI_API_KEY")?,
                model: env::var("OPENAI_MODEL")
                    .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
            anthropic: LlmProviderConfig {
                api_key: required_secret("ANTHROPIC_API_KEY")?,
                model: env::var("ANTHROPIC_MODEL")
                    .unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string()),
                base_url: env::var("ANTHROPIC_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            },
            ai_timeout: Duration::from_secs(parse_or("AI_TIMEOUT_SECS", 30)?),
            ai_cache: AiCacheConfig {
                enabled: parse_or("AI_CACHE_ENABLED", true)?,
                max_entries: parse_or("AI_CACHE_MAX_ENTRIES", 256)?,
                ttl: Duration::from_secs(parse_or("AI_CACHE_TTL_SECS", 24 * 60 * 60)?),
            },

            jwt_signing_key: required_secret("JWT_SIGNING_KEY")?.into_bytes(),
        })
    }

    /// Whether the given user may manage prompt templates.
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_user_ids.contains(&user_id)
    }
}

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

fn required_secret(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_id_list(raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| ConfigError::Invalid("ADMIN_USER_IDS", s.to_string()))
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
