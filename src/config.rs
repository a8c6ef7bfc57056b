//! Application configuration.
//!
//! The configuration is loaded from a JSON file at
//! `$XDG_CONFIG_HOME/spacecmd/config.json`.  Every field is optional; a
//! minimal `{}` file is valid and all sections fall back to their compiled-in
//! defaults.  Unknown keys are ignored.
//!
//! # Example
//!
//! ```json
//! {
//!   "mode": "auto",
//!   "yabai": { "timeout_ms": 1500 },
//!   "native": {
//!     "shortcut_range": 20,
//!     "settle_ms": 150,
//!     "synthesis_attempts": 3,
//!     "script_attempts": 2
//!   },
//!   "verify": { "attempts": 2 }
//! }
//! ```

use crate::manager::SpaceMode;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend selection mode.
    #[serde(default)]
    pub mode: SpaceMode,

    /// Label file override.
    #[serde(default)]
    pub labels_path: Option<PathBuf>,

    /// Command socket override.
    #[serde(default)]
    pub socket_path: Option<PathBuf>,

    #[serde(default)]
    pub yabai: YabaiConfig,

    #[serde(default)]
    pub native: NativeConfig,

    /// Verification applied by the manager to backends that do not verify
    /// their own switches (yabai).
    #[serde(default)]
    pub verify: VerifyConfig,
}

/// Where to find yabai and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YabaiConfig {
    /// Explicit binary; skips the search entirely.
    pub binary: Option<PathBuf>,
    /// Well-known install locations, tried before `PATH`.
    pub search_paths: Vec<PathBuf>,
    pub timeout_ms: u64,
}

impl Default for YabaiConfig {
    fn default() -> Self {
        Self {
            binary: None,
            search_paths: vec![
                PathBuf::from("/usr/local/bin/yabai"),
                PathBuf::from("/opt/homebrew/bin/yabai"),
                PathBuf::from("/run/current-system/sw/bin/yabai"),
            ],
            timeout_ms: 2000,
        }
    }
}

impl YabaiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Upper bound on key-chord attempts per native switch.
pub const MAX_SYNTHESIS_ATTEMPTS: u32 = 3;
/// Upper bound on scripted attempts per native switch.
pub const MAX_SCRIPT_ATTEMPTS: u32 = 2;

/// Native backend actuation settings.
///
/// All durations are in **milliseconds**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Highest space index reachable by a direct key chord: `10` for the
    /// stock ⌃1…⌃0 shortcuts, `20` when ⌃⌥1…⌃⌥0 are also bound.
    pub shortcut_range: u32,
    /// Time between key-down and key-up of a synthesized chord.
    pub key_hold_ms: u64,
    /// Time allowed for a switch animation before re-querying.
    pub settle_ms: u64,
    pub retry_delay_ms: u64,
    /// At most [`MAX_SYNTHESIS_ATTEMPTS`]; larger values are clamped.
    pub synthesis_attempts: u32,
    /// At most [`MAX_SCRIPT_ATTEMPTS`]; larger values are clamped.
    pub script_attempts: u32,
    /// Settle time after a scripted switch (Mission Control is slower).
    pub script_settle_ms: u64,
    /// Upper bound on one `osascript` run.
    pub script_timeout_ms: u64,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            shortcut_range: 10,
            key_hold_ms: 50,
            settle_ms: 150,
            retry_delay_ms: 100,
            synthesis_attempts: 3,
            script_attempts: 2,
            script_settle_ms: 400,
            script_timeout_ms: 5000,
        }
    }
}

impl NativeConfig {
    pub fn key_hold(&self) -> Duration {
        Duration::from_millis(self.key_hold_ms)
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }

    pub fn synthesis_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.synthesis_attempts.min(MAX_SYNTHESIS_ATTEMPTS),
            Duration::from_millis(self.settle_ms),
            Duration::from_millis(self.retry_delay_ms),
        )
    }

    pub fn script_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.script_attempts.min(MAX_SCRIPT_ATTEMPTS),
            Duration::from_millis(self.script_settle_ms),
            Duration::from_millis(self.retry_delay_ms),
        )
    }
}

/// Manager-level verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    pub attempts: u32,
    pub settle_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            attempts: 2,
            settle_ms: 150,
            retry_delay_ms: 100,
        }
    }
}

impl VerifyConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.attempts,
            Duration::from_millis(self.settle_ms),
            Duration::from_millis(self.retry_delay_ms),
        )
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "mode": "yabai",
            "labels_path": "/tmp/labels.json",
            "yabai": { "binary": "/opt/yabai", "timeout_ms": 500 },
            "native": {
                "shortcut_range": 20,
                "settle_ms": 120,
                "synthesis_attempts": 4,
                "script_attempts": 1
            },
            "verify": { "attempts": 3, "settle_ms": 50 }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.mode, SpaceMode::Yabai);
        assert_eq!(cfg.labels_path, Some(PathBuf::from("/tmp/labels.json")));
        assert_eq!(cfg.yabai.binary, Some(PathBuf::from("/opt/yabai")));
        assert_eq!(cfg.yabai.timeout(), Duration::from_millis(500));
        assert_eq!(cfg.native.shortcut_range, 20);
        assert_eq!(cfg.native.synthesis_policy().attempts, 3);
        assert_eq!(cfg.native.synthesis_policy().settle, Duration::from_millis(120));
        assert_eq!(cfg.native.script_policy().attempts, 1);
        assert_eq!(cfg.verify.policy().attempts, 3);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.mode, SpaceMode::Auto);
        assert!(cfg.labels_path.is_none());
        assert_eq!(cfg.yabai.search_paths.len(), 3);
        let nd = NativeConfig::default();
        assert_eq!(cfg.native.synthesis_attempts, nd.synthesis_attempts);
        assert_eq!(cfg.native.script_attempts, nd.script_attempts);
        assert_eq!(cfg.native.shortcut_range, 10);
        assert_eq!(cfg.verify.attempts, VerifyConfig::default().attempts);
    }

    #[test]
    fn native_budget_is_capped_at_three_plus_two() {
        let nc = NativeConfig {
            synthesis_attempts: 10,
            script_attempts: 7,
            ..NativeConfig::default()
        };
        assert_eq!(nc.synthesis_policy().attempts, MAX_SYNTHESIS_ATTEMPTS);
        assert_eq!(nc.script_policy().attempts, MAX_SCRIPT_ATTEMPTS);
    }

    #[test]
    fn default_native_budget_is_three_plus_two() {
        let nd = NativeConfig::default();
        assert_eq!(nd.synthesis_policy().attempts, 3);
        assert_eq!(nd.script_policy().attempts, 2);
    }

    #[test]
    fn deserialize_partial_native() {
        let json = r#"{ "native": { "key_hold_ms": 20 } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.native.key_hold(), Duration::from_millis(20));
        assert_eq!(cfg.native.settle_ms, NativeConfig::default().settle_ms);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "mode": "native", "future_section": { "key": 42 } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.mode, SpaceMode::Native);
    }

    #[test]
    fn load_missing_file_is_error() {
        let err = Config::load(Path::new("/nonexistent/spacecmd/config.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
