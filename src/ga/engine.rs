//! Generation loop.
//!
//! # Generation
//!
//! 1. Stop if the [`CancelToken`] is set
//! 2. Generate fresh chromosomes against the original baselines
//! 3. Evaluate them together with the carried mutation pool
//! 4. Select, then merge with the previous retained pool
//! 5. Cross retained chromosomes pairwise in rank order
//! 6. Mutate every child; children plus the previous pool form the next
//!    mutation pool
//! 7. Promote the pool's top chromosome if it beats the best so far
//!
//! Availability baselines are never modified during the loop. Fitness
//! charges any period that lands on a cell a baseline already commits, so
//! a period moved there by crossover or mutation costs score. Only the
//! best chromosome's bookings are folded into the returned matrices.
//!
//! All randomness comes from one seeded [`SmallRng`]; parallel work uses
//! sub-seeds drawn from it in a fixed order, so a seed fully determines
//! the result whether or not rayon is used.

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::chromosome::{Chromosome, ChromosomeId, IdSequence};
use super::fitness::{FitnessEvaluator, FitnessMap};
use super::generator::ChromosomeGenerator;
use super::operators::GeneticOperators;
use super::selection::{rank, Selector};
use crate::config::EngineConfig;
use crate::error::{Result, TimetableError};
use crate::models::{
    AvailabilityMatrix, ProblemInstance, ResourceKind, Timetable, Violation,
};
use crate::validation::{validate_problem, ValidationError, ValidationErrorKind};

/// Best score before any chromosome has been accepted.
pub const SENTINEL_SCORE: i64 = -1;

/// Cooperative cancellation flag, checked at the top of each generation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// All configured generations ran.
    Completed,
    /// The cancel token was set.
    Cancelled,
}

/// Per-generation statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation index (0-based).
    pub generation: usize,
    /// Chromosomes evaluated (fresh plus carried).
    pub evaluated: usize,
    /// Size of the merged retained pool.
    pub retained: usize,
    /// Top score of the retained pool.
    pub generation_best: i64,
    /// Best score so far.
    pub best_so_far: i64,
}

/// Result of an engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Best timetable found; empty if nothing beat the sentinel.
    pub timetable: Timetable,
    /// Teacher baseline with the best timetable folded in.
    ///
    /// When a timetable is found, every teacher the problem names has a
    /// grid, including those the baseline omitted. A degenerate run
    /// returns the baseline exactly as given.
    pub teacher_availability: AvailabilityMatrix,
    /// Lab baseline with the best timetable folded in. Same shape rules as
    /// `teacher_availability`, over declared labs.
    pub lab_availability: AvailabilityMatrix,
    /// Score of the best timetable, or [`SENTINEL_SCORE`].
    pub fitness: i64,
    /// Generations that actually ran.
    pub generations_run: usize,
    /// Why the loop ended.
    pub stop_reason: StopReason,
    /// Violations remaining in the best timetable.
    pub violations: Vec<Violation>,
    /// Statistics per generation.
    pub history: Vec<GenerationStats>,
}

impl EngineOutput {
    /// Whether no chromosome ever beat the sentinel.
    pub fn is_degenerate(&self) -> bool {
        self.fitness == SENTINEL_SCORE && self.timetable.is_empty()
    }
}

/// Genetic timetabling engine.
///
/// # Example
///
/// ```
/// use u_timetable::config::EngineConfig;
/// use u_timetable::ga::{GaConfig, TimetableEngine};
/// use u_timetable::models::{AvailabilityMatrix, ProblemInstance};
///
/// let problem = ProblemInstance::new()
///     .with_subject("MATH", 3, ["T1"])
///     .with_section("A", 30)
///     .with_classroom("R1", 40);
/// let config = EngineConfig::default()
///     .with_ga(GaConfig::default().with_generations(3).with_seed(1));
///
/// let engine = TimetableEngine::new(problem, config).unwrap();
/// let out = engine
///     .run(&AvailabilityMatrix::new(), &AvailabilityMatrix::new())
///     .unwrap();
/// assert_eq!(out.fitness, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct TimetableEngine {
    problem: ProblemInstance,
    config: EngineConfig,
    cancel: CancelToken,
}

impl TimetableEngine {
    /// Creates an engine after validating the configuration and problem.
    pub fn new(problem: ProblemInstance, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        validate_problem(&problem, &AvailabilityMatrix::new(), &AvailabilityMatrix::new())
            .map_err(TimetableError::Configuration)?;

        let capable: BTreeSet<&str> = problem
            .subject_teachers
            .values()
            .flatten()
            .map(String::as_str)
            .collect();
        for (subject, sections) in &problem.fixed_teacher_assignment {
            for (section, teacher) in sections {
                if !capable.contains(teacher.as_str()) {
                    warn!("fixed teacher {teacher} for {subject}/{section} is not in the capability map");
                }
            }
        }

        Ok(Self {
            problem,
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Uses an externally held cancel token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels this engine's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The problem being solved.
    pub fn problem(&self) -> &ProblemInstance {
        &self.problem
    }

    /// The run configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the generation loop.
    ///
    /// The baselines are read-only; the returned matrices are copies.
    ///
    /// # Errors
    /// [`TimetableError::Configuration`] if a baseline grid does not match
    /// the calendar.
    pub fn run(
        &self,
        teacher_baseline: &AvailabilityMatrix,
        lab_baseline: &AvailabilityMatrix,
    ) -> Result<EngineOutput> {
        self.check_baselines(teacher_baseline, lab_baseline)?;

        let problem = &self.problem;
        let calendar = &problem.calendar;
        let ga = &self.config.ga;
        let seed = ga.seed.unwrap_or_else(rand::random);
        let mut rng = SmallRng::seed_from_u64(seed);

        info!(
            "timetable run: {} sections, {} subjects, {} generations, seed {seed}",
            problem.sections.len(),
            problem.subject_quota.len(),
            ga.generations
        );

        let generator = ChromosomeGenerator::from_config(problem, ga);
        let evaluator = FitnessEvaluator::new(
            problem,
            &self.config.penalties,
            self.config.defaults.starting_fitness,
            self.config.defaults.room_capacity,
        )
        .with_baselines(teacher_baseline, lab_baseline)
        .with_max_consecutive(self.config.defaults.max_consecutive);
        let selector = Selector::from_config(ga);
        let ops = GeneticOperators::from_config(ga);

        let mut ids = IdSequence::new();
        let mut retained = FitnessMap::new();
        let mut archive: BTreeMap<ChromosomeId, Chromosome> = BTreeMap::new();
        let mut mutation_pool: Vec<Chromosome> = Vec::new();
        let mut best: Option<Chromosome> = None;
        let mut best_score = SENTINEL_SCORE;
        let mut history = Vec::with_capacity(ga.generations);
        let mut stop_reason = StopReason::Completed;

        for generation in 0..ga.generations {
            if self.cancel.is_cancelled() {
                stop_reason = StopReason::Cancelled;
                break;
            }

            let batch = generator.generate(
                ga.population_size(),
                &mut ids,
                teacher_baseline,
                lab_baseline,
                &mut rng,
            );
            let carried = std::mem::take(&mut mutation_pool);
            let mut population = batch.chromosomes;
            population.extend(carried.iter().cloned());

            let fitness = evaluator.evaluate_population(&population, ga.parallel);
            let evaluated = population.len();
            for chromosome in population {
                archive.insert(chromosome.id, chromosome);
            }

            let selected = selector.select(&fitness);
            retained = selector.merge(&retained, selected);
            archive.retain(|id, _| retained.contains_key(id));

            let ranked = rank(&retained);
            let parents: Vec<&Chromosome> =
                ranked.iter().filter_map(|(id, _)| archive.get(id)).collect();
            let mut children = Vec::with_capacity(parents.len());
            for pair in parents.chunks_exact(2) {
                let (a, b) = ops.crossover(pair[0], pair[1], &mut rng);
                children.push(a.with_id(ids.next_id()));
                children.push(b.with_id(ids.next_id()));
            }

            let seeds: Vec<u64> = children.iter().map(|_| rng.random()).collect();
            if ga.parallel {
                children
                    .par_iter_mut()
                    .zip(seeds.par_iter())
                    .for_each(|(child, seed)| {
                        let mut r = SmallRng::seed_from_u64(*seed);
                        ops.mutate(child, calendar, &mut r);
                    });
            } else {
                for (child, seed) in children.iter_mut().zip(&seeds) {
                    let mut r = SmallRng::seed_from_u64(*seed);
                    ops.mutate(child, calendar, &mut r);
                }
            }
            children.extend(carried);
            children.truncate(ga.initial_chromosomes);
            mutation_pool = children;

            let generation_best = ranked.first().map_or(SENTINEL_SCORE, |(_, s)| *s);
            if let Some(&(id, score)) = ranked.first() {
                if score > best_score {
                    best = archive.get(&id).cloned();
                    best_score = score;
                }
            }

            debug!(
                "generation {generation}: evaluated {evaluated}, retained {}, best {generation_best}/{best_score}, pool {}, snapshot busy {}",
                retained.len(),
                mutation_pool.len(),
                batch.teacher_snapshot.total_busy()
            );
            history.push(GenerationStats {
                generation,
                evaluated,
                retained: retained.len(),
                generation_best,
                best_so_far: best_score,
            });
        }

        let generations_run = history.len();
        let output = match best {
            Some(chromosome) => {
                let mut teachers = generator.prepare_teachers(teacher_baseline);
                let mut labs = generator.prepare_labs(lab_baseline);
                teachers.fold_schedule(&chromosome.days, calendar, ResourceKind::Teacher);
                labs.fold_schedule(&chromosome.days, calendar, ResourceKind::Room);
                info!(
                    "timetable run finished after {generations_run} generations: fitness {best_score}, {} periods",
                    chromosome.assignment_count()
                );
                EngineOutput {
                    timetable: chromosome.to_timetable(),
                    teacher_availability: teachers,
                    lab_availability: labs,
                    fitness: best_score,
                    generations_run,
                    stop_reason,
                    violations: evaluator.violations(&chromosome).items,
                    history,
                }
            }
            None => {
                warn!(
                    "timetable run finished after {generations_run} generations without beating score {SENTINEL_SCORE}"
                );
                EngineOutput {
                    timetable: Timetable::new(),
                    teacher_availability: teacher_baseline.clone(),
                    lab_availability: lab_baseline.clone(),
                    fitness: SENTINEL_SCORE,
                    generations_run,
                    stop_reason,
                    violations: Vec::new(),
                    history,
                }
            }
        };
        Ok(output)
    }

    fn check_baselines(
        &self,
        teacher_baseline: &AvailabilityMatrix,
        lab_baseline: &AvailabilityMatrix,
    ) -> Result<()> {
        let calendar = &self.problem.calendar;
        let (days, slots) = (calendar.day_count(), calendar.slots_per_day());
        let mut errors = Vec::new();
        for (label, matrix) in [("teacher", teacher_baseline), ("lab", lab_baseline)] {
            for resource in matrix.mismatched(days, slots) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MatrixDimensionMismatch,
                    format!("{label} availability for '{resource}' is not {days}x{slots}"),
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TimetableError::Configuration(errors))
        }
    }
}
