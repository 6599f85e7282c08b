// Engine configuration - Tunables for the scheduler and the tempo clusterer
// Every field has a default so partial JSON documents are accepted

use crate::tempo::KSelection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BPM range {min}..={max} is empty or outside 1..=500")]
    BpmRange { min: u32, max: u32 },

    #[error("Default BPM {0} is outside the configured range")]
    DefaultBpm(u32),

    #[error("Beat value must be a positive number, got {0}")]
    BeatValue(f32),

    #[error("Onset interval window [{min}, {max}] is empty or negative")]
    IntervalWindow { min: f64, max: f64 },

    #[error("Clusterer needs max_k >= 1 and iterations >= 1")]
    Clusterer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Beats dispatched later than this are logged as warnings
    pub late_warning_ms: f64,
    pub thread_name_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            late_warning_ms: 10.0,
            thread_name_prefix: "beat-scheduler".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClustererConfig {
    /// Shortest inter-onset interval kept, in seconds
    pub min_interval: f64,
    /// Longest inter-onset interval kept, in seconds
    pub max_interval: f64,
    pub max_k: usize,
    pub iterations: usize,
    pub selection: KSelection,
}

impl Default for ClustererConfig {
    fn default() -> Self {
        Self {
            min_interval: 0.2,
            max_interval: 3.0,
            max_k: 6,
            iterations: 20,
            selection: KSelection::LowestInertia,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_bpm: u32,
    pub min_bpm: u32,
    pub max_bpm: u32,
    pub default_beat_value: f32,
    pub scheduler: SchedulerConfig,
    pub clusterer: ClustererConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_bpm: 120,
            min_bpm: 1,
            max_bpm: 500,
            default_beat_value: 4.0,
            scheduler: SchedulerConfig::default(),
            clusterer: ClustererConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_bpm == 0 || self.min_bpm > self.max_bpm || self.max_bpm > 500 {
            return Err(ConfigError::BpmRange {
                min: self.min_bpm,
                max: self.max_bpm,
            });
        }
        if !(self.min_bpm..=self.max_bpm).contains(&self.default_bpm) {
            return Err(ConfigError::DefaultBpm(self.default_bpm));
        }
        if !(self.default_beat_value.is_finite() && self.default_beat_value > 0.0) {
            return Err(ConfigError::BeatValue(self.default_beat_value));
        }

        let clusterer = &self.clusterer;
        if clusterer.min_interval < 0.0 || clusterer.min_interval >= clusterer.max_interval {
            return Err(ConfigError::IntervalWindow {
                min: clusterer.min_interval,
                max: clusterer.max_interval,
            });
        }
        if clusterer.max_k == 0 || clusterer.iterations == 0 {
            return Err(ConfigError::Clusterer);
        }

        Ok(())
    }

    /// Clamp a BPM into the configured range
    ///
    /// Total even for an inverted range: `max_bpm` wins.
    pub fn clamp_bpm(&self, bpm: u32) -> u32 {
        bpm.max(self.min_bpm).min(self.max_bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bpm_with_inverted_range() {
        let config = EngineConfig {
            min_bpm: 300,
            max_bpm: 100,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.clamp_bpm(50), 100);
        assert_eq!(config.clamp_bpm(400), 100);
    }

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_bpm, 120);
        assert_eq!(config.clusterer.max_k, 6);
        assert_eq!(config.scheduler.thread_name_prefix, "beat-scheduler");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            EngineConfig::from_json(r#"{"default_bpm": 90, "clusterer": {"iterations": 50}}"#)
                .unwrap();
        assert_eq!(config.default_bpm, 90);
        assert_eq!(config.max_bpm, 500);
        assert_eq!(config.clusterer.iterations, 50);
        assert_eq!(config.clusterer.max_interval, 3.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig {
            min_bpm: 30,
            max_bpm: 300,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"min_bpm": 200, "max_bpm": 100}"#),
            Err(ConfigError::BpmRange { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"default_bpm": 600}"#),
            Err(ConfigError::DefaultBpm(600))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"default_beat_value": 0.0}"#),
            Err(ConfigError::BeatValue(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"clusterer": {"min_interval": 3.0, "max_interval": 0.2}}"#),
            Err(ConfigError::IntervalWindow { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_clamp_bpm() {
        let config = EngineConfig {
            min_bpm: 40,
            max_bpm: 240,
            ..Default::default()
        };
        assert_eq!(config.clamp_bpm(10), 40);
        assert_eq!(config.clamp_bpm(300), 240);
        assert_eq!(config.clamp_bpm(100), 100);
    }
}
