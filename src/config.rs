//! Versioned engine configuration.
//!
//! [`EngineConfig`] is the single configuration object of a run: model
//! defaults, the penalty table and the GA parameters. It is built once,
//! validated, and passed by reference to every component; nothing
//! mutates it afterwards.
//!
//! Every field is `#[serde(default)]`, so a partial JSON document only
//! overrides what it names:
//!
//! ```
//! use u_timetable::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{"ga": {"generations": 5}}"#).unwrap();
//! assert_eq!(config.ga.generations, 5);
//! assert_eq!(config.defaults.starting_fitness, 1000);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};
use crate::ga::{GaConfig, PenaltyTable};
use crate::models::DEFAULT_WORKING_DAYS;

/// Schema version understood by this crate.
pub const CONFIG_VERSION: u32 = 1;

/// Model-level defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Capacity assumed for rooms missing from the instance.
    pub room_capacity: u32,
    /// Working days when a request names none.
    pub working_days: Vec<String>,
    /// Score of a chromosome with no violations.
    pub starting_fitness: i64,
    /// Section size used when forming sections from a student roster.
    pub class_strength: usize,
    /// Most periods a teacher may hold in a row within one day. `None`
    /// leaves runs unlimited.
    pub max_consecutive: Option<u32>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            room_capacity: 60,
            working_days: DEFAULT_WORKING_DAYS.iter().map(|d| d.to_string()).collect(),
            starting_fitness: 1000,
            class_strength: 50,
            max_consecutive: None,
        }
    }
}

/// Complete configuration of an engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Schema version; must equal [`CONFIG_VERSION`].
    pub version: u32,
    /// Model defaults.
    pub defaults: Defaults,
    /// Penalty weight per violation kind.
    pub penalties: PenaltyTable,
    /// Generation loop parameters.
    pub ga: GaConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            defaults: Defaults::default(),
            penalties: PenaltyTable::default(),
            ga: GaConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Sets the model defaults.
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets the penalty table.
    pub fn with_penalties(mut self, penalties: PenaltyTable) -> Self {
        self.penalties = penalties;
        self
    }

    /// Sets the GA parameters.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the starting fitness.
    pub fn with_starting_fitness(mut self, fitness: i64) -> Self {
        self.defaults.starting_fitness = fitness;
        self
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(TimetableError::UnsupportedConfigVersion {
                found: self.version,
                expected: CONFIG_VERSION,
            });
        }
        if self.defaults.working_days.is_empty() {
            return Err(TimetableError::InvalidParameter {
                name: "defaults.working_days",
                reason: "must name at least one day".into(),
            });
        }
        if self.defaults.class_strength == 0 {
            return Err(TimetableError::InvalidParameter {
                name: "defaults.class_strength",
                reason: "must be at least 1".into(),
            });
        }
        if self.defaults.max_consecutive == Some(0) {
            return Err(TimetableError::InvalidParameter {
                name: "defaults.max_consecutive",
                reason: "must be at least 1 when set".into(),
            });
        }
        self.ga.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViolationType;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.version, CONFIG_VERSION);
        assert_eq!(c.defaults.room_capacity, 60);
        assert_eq!(c.defaults.working_days.len(), 5);
        assert_eq!(c.defaults.working_days[0], "Monday");
        assert_eq!(c.defaults.class_strength, 50);
        assert_eq!(c.penalties.weight(ViolationType::NonDutyDay), 40);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json_merges_defaults() {
        let c = EngineConfig::from_json(
            r#"{"penalties": {"over_capacity": 1}, "defaults": {"room_capacity": 45}}"#,
        )
        .unwrap();
        assert_eq!(c.penalties.over_capacity, 1);
        assert_eq!(c.penalties.teacher_double_booked, 30);
        assert_eq!(c.defaults.room_capacity, 45);
        assert_eq!(c.defaults.starting_fitness, 1000);
        assert_eq!(c.ga, GaConfig::default());
    }

    #[test]
    fn test_max_consecutive() {
        let c = EngineConfig::from_json(r#"{"defaults": {"max_consecutive": 3}}"#).unwrap();
        assert_eq!(c.defaults.max_consecutive, Some(3));
        assert_eq!(EngineConfig::default().defaults.max_consecutive, None);

        let err = EngineConfig::from_json(r#"{"defaults": {"max_consecutive": 0}}"#).unwrap_err();
        assert!(matches!(
            err,
            TimetableError::InvalidParameter {
                name: "defaults.max_consecutive",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_other_version() {
        let err = EngineConfig::from_json(r#"{"version": 2}"#).unwrap_err();
        assert!(matches!(
            err,
            TimetableError::UnsupportedConfigVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(TimetableError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_zero_generations() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"ga": {"generations": 0}}"#),
            Err(TimetableError::ZeroGenerations)
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let c = EngineConfig::default().with_starting_fitness(500);
        let back = EngineConfig::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(back, c);
    }
}
