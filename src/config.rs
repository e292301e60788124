//! Configuration for the session engine and API server
//!
//! Centralized configuration with validation, defaults, and environment
//! variable support.

use crate::errors::{GameError, GameResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WagerhallConfig {
    pub engine: EngineConfig,
    pub api: ApiConfig,
}

/// Session engine timing and fee parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fraction of the stake pool retained by the platform
    pub fee_rate: f64,
    /// Destination address for the platform fee transfer
    pub platform_address: String,
    /// Resolution deadline after a coinflip starts
    pub coinflip_resolve_ms: u64,
    /// Jackpot join window between creation and start
    pub jackpot_countdown_ms: u64,
    /// Resolution deadline after a jackpot starts
    pub jackpot_resolve_ms: u64,
    /// How long a completed session stays queryable before removal
    pub cleanup_grace_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_rate: 0.10,
            platform_address: "platform-treasury".to_string(),
            coinflip_resolve_ms: 15_000,
            jackpot_countdown_ms: 60_000,
            jackpot_resolve_ms: 5_000,
            cleanup_grace_ms: 30_000,
        }
    }
}

impl EngineConfig {
    pub fn resolve_deadline(&self, game_type: crate::types::GameType) -> Duration {
        match game_type {
            crate::types::GameType::Coinflip => Duration::from_millis(self.coinflip_resolve_ms),
            crate::types::GameType::Jackpot => Duration::from_millis(self.jackpot_resolve_ms),
        }
    }

    pub fn jackpot_countdown(&self) -> Duration {
        Duration::from_millis(self.jackpot_countdown_ms)
    }

    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_millis(self.cleanup_grace_ms)
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub listen_address: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> GameResult<WagerhallConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            WagerhallConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> GameResult<WagerhallConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GameError::Configuration(format!("failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| GameError::Configuration(format!("failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut WagerhallConfig) -> GameResult<()> {
        if let Ok(rate) = env::var("WAGERHALL_FEE_RATE") {
            config.engine.fee_rate = rate.parse().map_err(|_| {
                GameError::Configuration(format!("invalid WAGERHALL_FEE_RATE: {}", rate))
            })?;
        }
        if let Ok(addr) = env::var("WAGERHALL_PLATFORM_ADDRESS") {
            config.engine.platform_address = addr;
        }
        if let Ok(ms) = env::var("WAGERHALL_CLEANUP_GRACE_MS") {
            config.engine.cleanup_grace_ms = ms.parse().map_err(|_| {
                GameError::Configuration(format!("invalid WAGERHALL_CLEANUP_GRACE_MS: {}", ms))
            })?;
        }
        if let Ok(addr) = env::var("WAGERHALL_API_ADDRESS") {
            config.api.listen_address = addr;
        }
        if let Ok(port) = env::var("WAGERHALL_API_PORT") {
            config.api.port = port.parse().map_err(|_| {
                GameError::Configuration(format!("invalid WAGERHALL_API_PORT: {}", port))
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self, config: &WagerhallConfig) -> GameResult<()> {
        if !(0.0..1.0).contains(&config.engine.fee_rate) {
            return Err(GameError::Configuration(format!(
                "fee_rate must be in [0, 1): {}",
                config.engine.fee_rate
            )));
        }
        if config.engine.platform_address.is_empty() {
            return Err(GameError::Configuration(
                "platform_address cannot be empty".to_string(),
            ));
        }
        if config.engine.coinflip_resolve_ms == 0 || config.engine.jackpot_resolve_ms == 0 {
            return Err(GameError::Configuration(
                "resolution deadlines must be non-zero".to_string(),
            ));
        }
        if config.engine.jackpot_countdown_ms == 0 {
            return Err(GameError::Configuration(
                "jackpot_countdown_ms must be non-zero".to_string(),
            ));
        }
        if config.api.port == 0 {
            return Err(GameError::Configuration(
                "api.port cannot be zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &WagerhallConfig, path: &str) -> GameResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| GameError::Configuration(format!("failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| GameError::Configuration(format!("failed to write {}: {}", path, e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
