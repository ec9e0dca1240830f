//! Elite selection across generations.
//!
//! Ranking is by score descending, ties by chromosome ID ascending, so the
//! same [`FitnessMap`] always yields the same pool.

use serde::{Deserialize, Serialize};

use super::chromosome::ChromosomeId;
use super::config::GaConfig;
use super::fitness::FitnessMap;
use crate::error::{Result, TimetableError};

/// How many chromosomes survive each generation's selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Keep at most this many.
    Count(usize),
    /// Keep this fraction (0, 1] of the evaluated chromosomes, rounded up.
    Fraction(f64),
}

impl Default for Retention {
    fn default() -> Self {
        Retention::Fraction(0.5)
    }
}

impl Retention {
    /// Number retained out of `available`. At least one when any exist.
    pub fn size(&self, available: usize) -> usize {
        if available == 0 {
            return 0;
        }
        let n = match *self {
            Retention::Count(n) => n,
            Retention::Fraction(f) => (available as f64 * f).ceil() as usize,
        };
        n.clamp(1, available)
    }

    /// Rejects empty counts and fractions outside (0, 1].
    pub fn validate(&self) -> Result<()> {
        match *self {
            Retention::Count(0) => Err(TimetableError::InvalidParameter {
                name: "retention",
                reason: "count must be at least 1".into(),
            }),
            Retention::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(TimetableError::InvalidParameter {
                    name: "retention",
                    reason: format!("fraction {f} is outside (0, 1]"),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Orders a fitness map best-first.
pub fn rank(fitness: &FitnessMap) -> Vec<(ChromosomeId, i64)> {
    let mut ranked: Vec<(ChromosomeId, i64)> = fitness.iter().map(|(id, s)| (*id, *s)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Truncation selector with a bounded elite pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    retention: Retention,
    pool_limit: usize,
}

impl Selector {
    /// Creates a selector.
    pub fn new(retention: Retention, pool_limit: usize) -> Self {
        Self {
            retention,
            pool_limit: pool_limit.max(1),
        }
    }

    /// Selector for a GA configuration.
    pub fn from_config(config: &GaConfig) -> Self {
        Self::new(config.retention, config.elite_pool_limit)
    }

    /// Top chromosomes of one generation.
    pub fn select(&self, fitness: &FitnessMap) -> FitnessMap {
        let keep = self.retention.size(fitness.len());
        rank(fitness).into_iter().take(keep).collect()
    }

    /// Unions the previous pool into the current one.
    ///
    /// On an ID collision the current score wins. The result is capped at
    /// the pool limit in rank order.
    pub fn merge(&self, previous: &FitnessMap, current: FitnessMap) -> FitnessMap {
        let mut merged = previous.clone();
        merged.extend(current);
        if merged.len() <= self.pool_limit {
            return merged;
        }
        rank(&merged).into_iter().take(self.pool_limit).collect()
    }
}
