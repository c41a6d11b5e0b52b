//! Environment-driven configuration.
//!
//! Every tunable in Hearth comes from an environment variable with a typed
//! default. `Config::from_env()` is called exactly once at startup and the
//! resulting struct is passed by reference into the components that need
//! it; nothing in the workspace reads the environment after that point.

use std::path::PathBuf;

/// Environment variable names.
pub mod env_vars {
    pub const HUB_URL: &str = "HEARTH_HUB_URL";
    pub const HUB_TOKEN: &str = "HEARTH_HUB_TOKEN";
    pub const OLLAMA_URL: &str = "HEARTH_OLLAMA_URL";
    pub const OLLAMA_MODEL: &str = "HEARTH_OLLAMA_MODEL";
    pub const ENGINE_TIMEOUT_SECS: &str = "HEARTH_ENGINE_TIMEOUT_SECS";
    pub const NTP_SERVER: &str = "HEARTH_NTP_SERVER";
    pub const TIMEZONE: &str = "HEARTH_TIMEZONE";
    pub const LATITUDE: &str = "HEARTH_LATITUDE";
    pub const LONGITUDE: &str = "HEARTH_LONGITUDE";
    pub const DEFAULT_PING_HOST: &str = "HEARTH_DEFAULT_PING_HOST";
    pub const STATE_TTL_SECS: &str = "HEARTH_STATE_TTL_SECS";
    pub const DATA_DIR: &str = "HEARTH_DATA_DIR";
    pub const TOOLS_URL: &str = "HEARTH_TOOLS_URL";
    pub const LOG_JSON: &str = "HEARTH_LOG_JSON";
}

/// Default values used when the corresponding variable is unset.
pub mod defaults {
    pub const HUB_URL: &str = "http://localhost:8123";
    pub const OLLAMA_URL: &str = "http://localhost:11434";
    pub const OLLAMA_MODEL: &str = "llama3.2";
    pub const ENGINE_TIMEOUT_SECS: u64 = 30;
    pub const NTP_SERVER: &str = "pool.ntp.org";
    pub const NTP_FALLBACK: &str = "time.google.com";
    pub const TIMEZONE: &str = "America/Los_Angeles";
    pub const PING_HOST: &str = "google.com";
    pub const STATE_TTL_SECS: u64 = 30;
    pub const DATA_DIR: &str = "./data";
}

/// Automation hub connection settings.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Base URL of the hub, e.g. `http://localhost:8123`.
    pub url: String,
    /// Long-lived access token. Unset leaves the hub tools unconfigured.
    pub token: Option<String>,
    /// Seconds a cached device state stays valid.
    pub state_ttl_secs: u64,
}

impl HubConfig {
    /// Whether enough is present to talk to the hub at all.
    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

/// Text-generation engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Network tool settings (time lookup and reachability probe).
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub ntp_server: String,
    pub ntp_fallback: String,
    /// IANA timezone name used for local time renderings.
    pub timezone: String,
    /// Host pinged when a message names no target.
    pub default_ping_host: String,
}

/// Coordinates for the day/night times lookup. Both must be present for
/// the tool to be usable.
#[derive(Debug, Clone, Default)]
pub struct SunConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SunConfig {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Durable storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding `interactions.redb`.
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Full path of the durable database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("interactions.redb")
    }
}

/// Top-level configuration, one instance per process.
#[derive(Debug, Clone)]
pub struct Config {
    pub hub: HubConfig,
    pub engine: EngineConfig,
    pub net: NetConfig,
    pub sun: SunConfig,
    pub storage: StorageConfig,
    /// When set, the chat service invokes tools over HTTP at this base URL
    /// instead of in-process.
    pub tools_url: Option<String>,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            hub: HubConfig {
                url: normalize_base_url(env_string(env_vars::HUB_URL, defaults::HUB_URL)),
                token: env_opt(env_vars::HUB_TOKEN),
                state_ttl_secs: env_parse(env_vars::STATE_TTL_SECS, defaults::STATE_TTL_SECS),
            },
            engine: EngineConfig {
                endpoint: normalize_base_url(env_string(env_vars::OLLAMA_URL, defaults::OLLAMA_URL)),
                model: env_string(env_vars::OLLAMA_MODEL, defaults::OLLAMA_MODEL),
                timeout_secs: env_parse(
                    env_vars::ENGINE_TIMEOUT_SECS,
                    defaults::ENGINE_TIMEOUT_SECS,
                ),
            },
            net: NetConfig {
                ntp_server: env_string(env_vars::NTP_SERVER, defaults::NTP_SERVER),
                ntp_fallback: defaults::NTP_FALLBACK.to_string(),
                timezone: env_string(env_vars::TIMEZONE, defaults::TIMEZONE),
                default_ping_host: env_string(env_vars::DEFAULT_PING_HOST, defaults::PING_HOST),
            },
            sun: SunConfig {
                latitude: env_opt(env_vars::LATITUDE).and_then(|s| parse_logged(env_vars::LATITUDE, &s)),
                longitude: env_opt(env_vars::LONGITUDE)
                    .and_then(|s| parse_logged(env_vars::LONGITUDE, &s)),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from(env_string(env_vars::DATA_DIR, defaults::DATA_DIR)),
            },
            tools_url: env_opt(env_vars::TOOLS_URL).map(normalize_base_url),
        }
    }

    /// Whether JSON log output was requested.
    pub fn log_json() -> bool {
        std::env::var(env_vars::LOG_JSON)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false)
    }
}

impl Default for Config {
    /// All defaults, no environment consulted. Used by tests.
    fn default() -> Self {
        Self {
            hub: HubConfig {
                url: defaults::HUB_URL.to_string(),
                token: None,
                state_ttl_secs: defaults::STATE_TTL_SECS,
            },
            engine: EngineConfig {
                endpoint: defaults::OLLAMA_URL.to_string(),
                model: defaults::OLLAMA_MODEL.to_string(),
                timeout_secs: defaults::ENGINE_TIMEOUT_SECS,
            },
            net: NetConfig {
                ntp_server: defaults::NTP_SERVER.to_string(),
                ntp_fallback: defaults::NTP_FALLBACK.to_string(),
                timezone: defaults::TIMEZONE.to_string(),
                default_ping_host: defaults::PING_HOST.to_string(),
            },
            sun: SunConfig::default(),
            storage: StorageConfig {
                data_dir: PathBuf::from(defaults::DATA_DIR),
            },
            tools_url: None,
        }
    }
}

/// Strip the trailing slash so joined paths never double it.
pub fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => parse_logged(name, &raw).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_logged<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparseable value for {}: {:?}", name, raw);
            None
        }
    }
}
