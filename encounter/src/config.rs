//! Encounter tuning loaded from TOML.
//!
//! Every key is optional; missing keys fall back to [`EncounterConfig::default`],
//! so a file only needs the values it overrides:
//!
//! ```toml
//! enemies_per_wave = 5
//! max_waves = 10
//!
//! [cues]
//! loop_sound = true
//! ```

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use wave_siege_core::SpawnPoint;
use wave_siege_presentation::{CueConfig, InvalidCue};
use wave_siege_system_escalation::{EscalationError, EscalationPolicy};
use wave_siege_system_sequencer::{self as sequencer, Timings};
use wave_siege_system_spawning as spawning;

/// Errors raised while loading or validating an [`EncounterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed into a configuration.
    #[error("failed to parse encounter configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The escalation factor is unusable.
    #[error(transparent)]
    Escalation(#[from] EscalationError),
    /// The wave layout is unusable.
    #[error(transparent)]
    Sequencer(#[from] sequencer::ConfigError),
    /// A phase duration is negative, not finite, or too large.
    #[error("`{field}` must be a finite, non-negative number of seconds, got {value}")]
    InvalidDuration {
        /// Name of the offending key.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A heads-up display cue setting is out of range.
    #[error("`cues.{field}` is out of range, got {value}")]
    InvalidCue {
        /// Name of the offending key within the `[cues]` table.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The spawn area is not a finite sphere.
    #[error("spawn area must have a finite origin and a finite, non-negative radius")]
    InvalidSpawnArea,
}

/// Tuning for a single encounter.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Enemy count of the first wave.
    pub enemies_per_wave: u32,
    /// Growth factor applied to the enemy count between waves.
    pub escalation_factor: f64,
    /// Number of waves after which the encounter completes.
    pub max_waves: u32,
    /// Optional limit on spawn attempts per wave.
    pub spawn_cap: Option<u32>,
    /// Seconds before the first warning.
    pub settle_delay_secs: f32,
    /// Seconds each warning is shown before its wave spawns.
    pub warning_duration_secs: f32,
    /// Seconds between a cleared wave and the next warning.
    pub time_between_waves_secs: f32,
    /// Centre of the spawn area.
    pub spawn_origin: [f32; 3],
    /// Radius of the spawn area.
    pub spawn_radius: f32,
    /// Height every enemy is placed at.
    pub spawn_height: f32,
    /// Seed of the placement random number generator.
    pub placement_seed: u64,
    /// Heads-up display cue tuning.
    pub cues: CueConfig,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            enemies_per_wave: 3,
            escalation_factor: 1.2,
            max_waves: 99,
            spawn_cap: None,
            settle_delay_secs: 1.0,
            warning_duration_secs: 2.0,
            time_between_waves_secs: 3.0,
            spawn_origin: [0.0; 3],
            spawn_radius: 10.0,
            spawn_height: 0.0,
            placement_seed: 0,
            cues: CueConfig::default(),
        }
    }
}

impl EncounterConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.sequencer_config()?;
        let _ = self.placement_config()?;
        self.cues
            .validate()
            .map_err(|InvalidCue { field, value }| ConfigError::InvalidCue { field, value })
    }

    /// Phase timings described by the configuration.
    pub fn timings(&self) -> Result<Timings, ConfigError> {
        Ok(Timings {
            settle_delay: seconds("settle_delay_secs", self.settle_delay_secs)?,
            warning_duration: seconds("warning_duration_secs", self.warning_duration_secs)?,
            time_between_waves: seconds("time_between_waves_secs", self.time_between_waves_secs)?,
        })
    }

    /// Sequencer configuration described by the configuration.
    pub fn sequencer_config(&self) -> Result<sequencer::Config, ConfigError> {
        let escalation = EscalationPolicy::new(self.escalation_factor)?;
        let config = sequencer::Config::new(
            self.enemies_per_wave,
            escalation,
            self.max_waves,
            self.timings()?,
        )?;
        Ok(match self.spawn_cap {
            Some(cap) => config.with_spawn_cap(cap)?,
            None => config,
        })
    }

    /// Placement configuration described by the configuration.
    pub fn placement_config(&self) -> Result<spawning::Config, ConfigError> {
        let [x, y, z] = self.spawn_origin;
        let origin = SpawnPoint::new(x, y, z);
        if !origin.is_finite()
            || !self.spawn_height.is_finite()
            || !self.spawn_radius.is_finite()
            || self.spawn_radius < 0.0
        {
            return Err(ConfigError::InvalidSpawnArea);
        }
        Ok(spawning::Config::new(
            origin,
            self.spawn_radius,
            self.spawn_height,
            self.placement_seed,
        ))
    }
}

fn seconds(field: &'static str, value: f32) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f32(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EncounterConfig::from_toml_str("").expect("defaults are valid");
        assert_eq!(config, EncounterConfig::default());
        assert_eq!(
            config.timings().expect("valid timings"),
            Timings::default()
        );
    }

    #[test]
    fn overrides_merge_with_defaults() {
        let config = EncounterConfig::from_toml_str(
            r#"
            enemies_per_wave = 10
            escalation_factor = 1.1
            spawn_cap = 64

            [cues]
            flash_enabled = false
            "#,
        )
        .expect("valid config");

        assert_eq!(config.enemies_per_wave, 10);
        assert_eq!(config.spawn_cap, Some(64));
        assert_eq!(config.max_waves, 99);
        assert!(!config.cues.flash_enabled);
        assert_eq!(config.cues.flash_count, 2);
    }

    #[test]
    fn rejects_unusable_values() {
        let cases = [
            "enemies_per_wave = 0",
            "max_waves = 0",
            "escalation_factor = 1.0",
            "escalation_factor = 0.5",
            "escalation_factor = nan",
            "warning_duration_secs = -1.0",
            "settle_delay_secs = inf",
            "spawn_radius = -2.0",
            "spawn_origin = [0.0, nan, 0.0]",
            "spawn_cap = 0",
            "[cues]\nwarning_fade_duration = 1e19",
            "[cues]\nflash_speed = -0.1",
            "[cues]\nsound_volume = inf",
        ];
        for case in cases {
            assert!(
                EncounterConfig::from_toml_str(case).is_err(),
                "`{case}` should be rejected"
            );
        }
    }

    #[test]
    fn reports_offending_cue_and_spawn_cap() {
        match EncounterConfig::from_toml_str("[cues]\nkill_pulse_duration = 7200.0") {
            Err(ConfigError::InvalidCue { field, value }) => {
                assert_eq!(field, "kill_pulse_duration");
                assert_eq!(value, 7200.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            EncounterConfig::from_toml_str("spawn_cap = 0"),
            Err(ConfigError::Sequencer(sequencer::ConfigError::ZeroSpawnCap))
        ));
    }

    #[test]
    fn reports_offending_duration() {
        let config = EncounterConfig {
            time_between_waves_secs: -0.5,
            ..EncounterConfig::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidDuration { field, .. }) => {
                assert_eq!(field, "time_between_waves_secs");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            EncounterConfig::from_toml_str("enemies_per_wave = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
