//! Runtime configuration, with environment overrides.

use std::time::Duration;

use crate::models::DEFAULT_MARKER_WIDTH;

/// Upper bound on either side of a rectified image
pub const DEFAULT_MAX_RECTIFIED_DIM: u32 = 4096;

/// How long a registered target suppresses re-registration
pub const DEFAULT_REARM_AFTER: Duration = Duration::from_secs(5);

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

/// Barcode detector settings
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Physical width, in metres, assigned to every reference target
    pub marker_width: f32,
    /// Reclaim the in-flight guard after this long; `None` never reclaims
    pub busy_timeout: Option<Duration>,
    /// Largest accepted rectified width or height
    pub max_output_dim: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            marker_width: DEFAULT_MARKER_WIDTH,
            busy_timeout: None,
            max_output_dim: DEFAULT_MAX_RECTIFIED_DIM,
        }
    }
}

impl DetectorConfig {
    /// Defaults overridden by `QRANCHOR_MARKER_WIDTH`, `QRANCHOR_BUSY_TIMEOUT_MS`
    /// (0 disables) and `QRANCHOR_MAX_RECTIFIED_DIM`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            marker_width: parse_env::<f32>("QRANCHOR_MARKER_WIDTH")
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(defaults.marker_width),
            busy_timeout: match parse_env::<u64>("QRANCHOR_BUSY_TIMEOUT_MS") {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.busy_timeout,
            },
            max_output_dim: parse_env::<u32>("QRANCHOR_MAX_RECTIFIED_DIM")
                .filter(|d| *d > 0)
                .unwrap_or(defaults.max_output_dim),
        }
    }
}

/// Session settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Detector settings
    pub detector: DetectorConfig,
    /// Window after a registration during which new targets are ignored
    pub rearm_after: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            rearm_after: DEFAULT_REARM_AFTER,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden from the environment, including `QRANCHOR_REARM_MS`
    pub fn from_env() -> Self {
        Self {
            detector: DetectorConfig::from_env(),
            rearm_after: parse_env::<u64>("QRANCHOR_REARM_MS")
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REARM_AFTER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.detector.marker_width, 0.1);
        assert_eq!(cfg.detector.busy_timeout, None);
        assert_eq!(cfg.rearm_after, Duration::from_secs(5));
    }

    #[test]
    fn test_parse_env_ignores_garbage() {
        assert_eq!(parse_env::<u64>("QRANCHOR_TEST_UNSET_VARIABLE"), None);
    }
}
