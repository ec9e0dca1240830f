//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the generation loop.

use serde::{Deserialize, Serialize};

use super::operators::CrossoverType;
use super::selection::Retention;
use crate::error::{Result, TimetableError};

/// Configuration for the timetabling GA.
///
/// # Defaults
///
/// ```
/// use u_timetable::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.generations, 50);
/// assert_eq!(config.initial_chromosomes, 10);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_timetable::ga::{GaConfig, Retention};
///
/// let config = GaConfig::default()
///     .with_generations(20)
///     .with_retention(Retention::Count(4))
///     .with_mutation_rate(0.25)
///     .with_seed(7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Number of generations to run. Also the run's time bound.
    pub generations: usize,

    /// Upper bound on freshly generated chromosomes per generation.
    ///
    /// The actual count is `min(generations, initial_chromosomes)`.
    /// Also caps the carried mutation pool.
    pub initial_chromosomes: usize,

    /// How many chromosomes survive selection each generation.
    pub retention: Retention,

    /// Maximum size of the retained pool after merging with the
    /// previous generation's pool.
    pub elite_pool_limit: usize,

    /// Fraction of each day's sections whose slots are shuffled (0.0–1.0).
    pub mutation_rate: f64,

    /// Crossover strategy.
    pub crossover: CrossoverType,

    /// Consecutive periods per lab session. 1 disables blocking.
    pub lab_block_len: usize,

    /// Whether to generate, evaluate and mutate in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility. `None` draws one at run start.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            generations: 50,
            initial_chromosomes: 10,
            retention: Retention::default(),
            elite_pool_limit: 20,
            mutation_rate: 0.5,
            crossover: CrossoverType::default(),
            lab_block_len: 2,
            parallel: true,
            seed: None,
        }
    }
}

impl GaConfig {
    /// Sets the number of generations.
    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    /// Sets the per-generation chromosome cap.
    pub fn with_initial_chromosomes(mut self, n: usize) -> Self {
        self.initial_chromosomes = n;
        self
    }

    /// Sets the retention policy.
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the retained pool limit.
    pub fn with_elite_pool_limit(mut self, n: usize) -> Self {
        self.elite_pool_limit = n;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover strategy.
    pub fn with_crossover(mut self, crossover: CrossoverType) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the lab block length.
    pub fn with_lab_block_len(mut self, len: usize) -> Self {
        self.lab_block_len = len;
        self
    }

    /// Enables or disables parallel work within a generation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Chromosomes generated per generation.
    pub fn population_size(&self) -> usize {
        self.generations.min(self.initial_chromosomes).max(1)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.generations == 0 {
            return Err(TimetableError::ZeroGenerations);
        }
        if self.initial_chromosomes == 0 {
            return Err(TimetableError::InvalidParameter {
                name: "initial_chromosomes",
                reason: "must be at least 1".into(),
            });
        }
        if self.elite_pool_limit == 0 {
            return Err(TimetableError::InvalidParameter {
                name: "elite_pool_limit",
                reason: "must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(TimetableError::InvalidParameter {
                name: "mutation_rate",
                reason: format!("{} is outside [0, 1]", self.mutation_rate),
            });
        }
        if self.lab_block_len == 0 {
            return Err(TimetableError::InvalidParameter {
                name: "lab_block_len",
                reason: "must be at least 1".into(),
            });
        }
        self.retention.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.generations, 50);
        assert_eq!(config.initial_chromosomes, 10);
        assert_eq!(config.retention, Retention::Fraction(0.5));
        assert_eq!(config.elite_pool_limit, 20);
        assert!((config.mutation_rate - 0.5).abs() < 1e-10);
        assert_eq!(config.crossover, CrossoverType::DayBoundary);
        assert_eq!(config.lab_block_len, 2);
        assert!(config.parallel);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_population_size_bounded_by_generations() {
        assert_eq!(GaConfig::default().population_size(), 10);
        assert_eq!(GaConfig::default().with_generations(3).population_size(), 3);
    }

    #[test]
    fn test_validate() {
        assert!(GaConfig::default().validate().is_ok());
        assert!(matches!(
            GaConfig::default().with_generations(0).validate(),
            Err(TimetableError::ZeroGenerations)
        ));
        assert!(GaConfig::default()
            .with_lab_block_len(0)
            .validate()
            .is_err());
        assert!(GaConfig::default()
            .with_retention(Retention::Fraction(1.5))
            .validate()
            .is_err());
    }

    #[test]
    fn test_mutation_rate_clamped() {
        let config = GaConfig::default().with_mutation_rate(3.0);
        assert!((config.mutation_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_partial_json() {
        let config: GaConfig =
            serde_json::from_str(r#"{"generations": 5, "retention": {"count": 3}}"#).unwrap();
        assert_eq!(config.generations, 5);
        assert_eq!(config.retention, Retention::Count(3));
        assert_eq!(config.initial_chromosomes, 10);
    }
}
