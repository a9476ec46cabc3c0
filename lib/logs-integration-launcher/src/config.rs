//! Configuration accepted by the launcher, and its validated form.
//!
//! [`LauncherConfig`] mirrors the `#[derive(Deserialize)]` source-config
//! convention used throughout `src/sources/*` (see
//! `src/test_util/mock/sources/basic.rs`'s `BasicSourceConfig` for the same
//! shape): a raw, optional-everything struct the surrounding process
//! deserializes from TOML/YAML, which [`LauncherConfig::build`] turns into an
//! immutable, validated [`LauncherSettings`].

use std::path::PathBuf;

use serde::Deserialize;
use snafu::Snafu;

/// `combined-usage-max` default: 100 MiB.
pub const DEFAULT_COMBINED_USAGE_MAX: u64 = 100 * 1024 * 1024;

/// Default divisor used to derive the per-file cap from `combined-usage-max`.
pub const DEFAULT_MAX_OPEN_INTEGRATIONS: u64 = 10;

/// Floor under which the derived per-file cap is never allowed to shrink.
pub const MIN_FILE_SIZE_MAX: u64 = 1024 * 1024;

/// Raw configuration as read from `logs_config.*`. Every field is optional;
/// [`LauncherConfig::build`] applies the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// `logs_config.run_path`.
    pub run_path: Option<PathBuf>,

    /// `logs_config.integrations_logs_files_max_size`.
    pub integrations_logs_files_max_size: Option<u64>,

    /// `logs_config.integrations_logs_total_usage`, an accepted alias for the
    /// same cap.
    pub integrations_logs_total_usage: Option<u64>,

    /// Divisor used to derive the per-file cap from the combined cap.
    pub max_open_integrations: Option<u64>,
}

/// Validated, immutable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherSettings {
    pub run_path: PathBuf,
    pub file_size_max: u64,
    pub combined_usage_max: u64,
}

/// Construction-time configuration errors.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("logs_config.run_path must be set to a non-empty path"))]
    RunPathEmpty,
}

impl LauncherConfig {
    /// Validate this configuration, applying defaults, and produce the
    /// immutable settings the launcher runs with. Does not touch the
    /// filesystem; `run_path` is taken at face value.
    pub fn build(&self) -> Result<LauncherSettings, ConfigError> {
        let run_path = self
            .run_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::RunPathEmpty)?;

        let combined_usage_max = self
            .integrations_logs_files_max_size
            .or(self.integrations_logs_total_usage)
            .unwrap_or(DEFAULT_COMBINED_USAGE_MAX);

        let max_open_integrations = self
            .max_open_integrations
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_OPEN_INTEGRATIONS);

        let file_size_max = (combined_usage_max / max_open_integrations).max(MIN_FILE_SIZE_MAX);

        Ok(LauncherSettings {
            run_path,
            file_size_max,
            combined_usage_max,
        })
    }
}
