//! zkdvp Configuration
//!
//! Shared configuration for the proof services and tooling.
//!
//! Handles loading configuration from:
//! 1. DVP_CONFIG env var (explicit path)
//! 2. ./zkdvp.toml (current directory)
//! 3. ~/.zkdvp/zkdvp.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<DvpConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "zkdvp.toml";
const CONFIG_DIR_NAME: &str = ".zkdvp";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_ARTIFACTS_ROOT: &str = "./keys";
const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DvpConfig {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where circuit manifests and keys are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_artifacts_root")]
    pub root: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: default_artifacts_root(),
        }
    }
}

fn default_artifacts_root() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_ROOT)
}

/// Proof service sizing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    /// Worker threads; unset means one per available core
    #[serde(default)]
    pub workers: Option<usize>,
    /// How long a caller waits for a proof; unset means no limit
    #[serde(default)]
    pub proof_timeout_secs: Option<u64>,
}

impl ProverConfig {
    pub fn proof_timeout(&self) -> Option<Duration> {
        self.proof_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

fn env_path(key: &str, field: &mut PathBuf) {
    if let Ok(v) = env::var(key) {
        *field = PathBuf::from(v);
    }
}

/// Set Option<T> from env var if present and parseable
fn env_parse_option<T: std::str::FromStr>(key: &str, field: &mut Option<T>) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = Some(parsed),
            Err(_) => log::warn!("Ignoring unparseable {key}={v}"),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl DvpConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("DVP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("DVP_CONFIG points at missing file {}", path.display());
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        env_path("PROVING_KEYS_ROOT", &mut self.artifacts.root);
        env_parse_option("DVP_PROVER_WORKERS", &mut self.prover.workers);
        env_parse_option("DVP_PROOF_TIMEOUT_SECS", &mut self.prover.proof_timeout_secs);
        env_string("DVP_LOG", &mut self.logging.filter);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.prover.workers = Some(4);
        sample.prover.proof_timeout_secs = Some(120);
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static DvpConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {e:#}, using defaults");
                Self::default()
            })
        })
    }

    /// Returns `None` if config hasn't been initialized yet.
    pub fn try_global() -> Option<&'static DvpConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: DvpConfig) -> Result<(), DvpConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `DvpConfig::global()`.
#[inline]
pub fn global_config() -> &'static DvpConfig {
    DvpConfig::global()
}

// ============================================================================
// Tests
// ============================================================================
