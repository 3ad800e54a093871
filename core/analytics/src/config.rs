use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_COUNT_THRESHOLD_RATIO: f64 = 0.20;
pub const DEFAULT_QUALITY_THRESHOLD_POINTS: f64 = 10.0;
pub const DEFAULT_SPHERE_THRESHOLD_RATIO: f64 = 0.20;

/// Slack added to every inclusive threshold check so that a difference lying
/// exactly on the threshold still classifies as "same" after float rounding
/// (e.g. 66.67% - 56.67% evaluating to 10.000000000000007).
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Classification thresholds shared by every comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Fraction of the average peer memory count a subject may deviate by
    /// and still count as "same"
    pub count_threshold_ratio: f64,
    /// Absolute sunny-percentage points a subject may deviate by
    pub quality_threshold_points: f64,
    /// Fraction of the larger sphere's total within which spheres are balanced
    pub sphere_threshold_ratio: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            count_threshold_ratio: DEFAULT_COUNT_THRESHOLD_RATIO,
            quality_threshold_points: DEFAULT_QUALITY_THRESHOLD_POINTS,
            sphere_threshold_ratio: DEFAULT_SPHERE_THRESHOLD_RATIO,
        }
    }
}

impl AnalyticsConfig {
    /// Read thresholds from `INSIGHTS_COUNT_RATIO`, `INSIGHTS_QUALITY_POINTS`
    /// and `INSIGHTS_SPHERE_RATIO`, keeping defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            count_threshold_ratio: env_f64("INSIGHTS_COUNT_RATIO", DEFAULT_COUNT_THRESHOLD_RATIO),
            quality_threshold_points: env_f64(
                "INSIGHTS_QUALITY_POINTS",
                DEFAULT_QUALITY_THRESHOLD_POINTS,
            ),
            sphere_threshold_ratio: env_f64("INSIGHTS_SPHERE_RATIO", DEFAULT_SPHERE_THRESHOLD_RATIO),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("count_threshold_ratio", self.count_threshold_ratio)?;
        check("quality_threshold_points", self.quality_threshold_points)?;
        check("sphere_threshold_ratio", self.sphere_threshold_ratio)?;
        Ok(())
    }
}

fn check(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

fn env_f64(var: &str, default: f64) -> f64 {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={:?}, using {}", var, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.count_threshold_ratio, 0.20);
        assert_eq!(config.quality_threshold_points, 10.0);
        assert_eq!(config.sphere_threshold_ratio, 0.20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        let config = AnalyticsConfig {
            quality_threshold_points: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidThreshold {
                name: "quality_threshold_points",
                value: -1.0
            })
        );

        let config = AnalyticsConfig {
            sphere_threshold_ratio: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: AnalyticsConfig = serde_json::from_str(
            r#"{"count_threshold_ratio":0.25,"quality_threshold_points":5.0,"sphere_threshold_ratio":0.1}"#,
        )
        .unwrap();
        assert_eq!(config.count_threshold_ratio, 0.25);
        assert!(config.validate().is_ok());
    }
}
