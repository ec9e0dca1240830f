//! GA-based timetable search.
//!
//! # Encoding
//!
//! A chromosome is a whole candidate week: working day → section →
//! periods in slot order. Each gene is one (teacher, subject, room, slot)
//! assignment. Chromosomes are built constructively, so a fresh one is
//! already conflict-free wherever the problem allows; crossover and
//! mutation may introduce conflicts, which fitness then penalizes.
//!
//! # Submodules
//!
//! - [`operators`]: Runtime-selectable crossover and slot-shuffle mutation
//!
//! # Reference
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"
//! - Colorni, Dorigo & Maniezzo (1998), "Metaheuristics for high school timetabling"

mod chromosome;
mod config;
mod engine;
mod fitness;
mod generator;
pub mod operators;
mod selection;

pub use chromosome::{Chromosome, ChromosomeId, IdSequence, Population};
pub use config::GaConfig;
pub use engine::{
    CancelToken, EngineOutput, GenerationStats, StopReason, TimetableEngine, SENTINEL_SCORE,
};
pub use fitness::{FitnessEvaluator, FitnessMap, PenaltyTable, ViolationReport};
pub use generator::{ChromosomeGenerator, GeneratedBatch};
pub use operators::{
    day_crossover, mutate_week, mutation_count, section_uniform_crossover, CrossoverType,
    GeneticOperators,
};
pub use selection::{rank, Retention, Selector};
