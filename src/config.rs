use crate::error::{ConfigError, ConfigFileError};
use crate::train::Controls;
use std::path::Path;

/// Tunable parameters of a simulation run. Every field has a default, so a
/// JSON config file only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of one step in minutes.
    pub step_minutes: u32,
    /// A train brakes when another train on its rail is this close ahead (km).
    pub safety_distance_km: f64,
    /// Anticipatory braking before a node only starts within this many km of it.
    pub braking_lookahead_km: f64,
    /// Two trains on the same rail closer than this (km) have collided.
    pub collision_distance_km: f64,
    /// Fraction of the speed limit above which a train stops accelerating.
    pub maintain_ratio: f64,
    /// Hard ceiling on the number of steps of a run.
    pub max_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            step_minutes: 5,
            safety_distance_km: 2.0,
            braking_lookahead_km: 5.0,
            collision_distance_km: 0.1,
            maintain_ratio: 0.95,
            max_steps: 10_000,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<SimulationConfig, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: &Path) -> Result<SimulationConfig, ConfigFileError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config =
            SimulationConfig::from_json_str(&contents).map_err(|source| ConfigFileError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_minutes == 0 {
            return Err(ConfigError::Setting {
                field: "step_minutes",
                reason: "must be at least one minute".to_string(),
            });
        }
        let distances = [
            ("safety_distance_km", self.safety_distance_km),
            ("braking_lookahead_km", self.braking_lookahead_km),
            ("collision_distance_km", self.collision_distance_km),
        ];
        for &(field, value) in distances.iter() {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Setting {
                    field,
                    reason: format!("must be a positive distance, got {}", value),
                });
            }
        }
        if !(self.maintain_ratio > 0.0 && self.maintain_ratio <= 1.0) {
            return Err(ConfigError::Setting {
                field: "maintain_ratio",
                reason: format!("must be in (0, 1], got {}", self.maintain_ratio),
            });
        }
        Ok(())
    }

    pub fn step_hours(&self) -> f64 {
        self.step_minutes as f64 / 60.0
    }

    pub fn controls(&self) -> Controls {
        Controls {
            step_hours: self.step_hours(),
            maintain_ratio: self.maintain_ratio,
            braking_lookahead_km: self.braking_lookahead_km,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.step_minutes, 5);
        assert_eq!(config.safety_distance_km, 2.0);
        assert_eq!(config.braking_lookahead_km, 5.0);
        assert_eq!(config.collision_distance_km, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimulationConfig::from_json_str(r#"{ "step_minutes": 1, "max_steps": 50 }"#)
            .unwrap();
        assert_eq!(config.step_minutes, 1);
        assert_eq!(config.max_steps, 50);
        assert_eq!(config.safety_distance_km, 2.0);
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let mut config = SimulationConfig::default();
        config.step_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.safety_distance_km = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Setting {
                field: "safety_distance_km",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.maintain_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_and_validates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "collision_distance_km": 0.0 }}"#).unwrap();
        assert!(matches!(
            SimulationConfig::from_json_file(file.path()),
            Err(ConfigFileError::Invalid(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            SimulationConfig::from_json_file(file.path()),
            Err(ConfigFileError::Format { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "safety_distance_km": 3.5 }}"#).unwrap();
        let config = SimulationConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.safety_distance_km, 3.5);
    }
}
