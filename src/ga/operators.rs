//! Crossover and mutation operators for week chromosomes.
//!
//! Provides runtime-selectable crossover via [`GeneticOperators`] and the
//! slot-shuffle mutation.
//!
//! # Usage
//!
//! ```
//! use u_timetable::ga::operators::{CrossoverType, GeneticOperators};
//!
//! let ops = GeneticOperators::default();
//! assert_eq!(ops.crossover_type, CrossoverType::DayBoundary);
//! ```
//!
//! Operators never reject a child. Conflicts they introduce (a teacher
//! or room now double-booked) are left for the next fitness pass.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::chromosome::Chromosome;
use super::config::GaConfig;
use crate::models::{Assignment, DaySchedule, WeekCalendar};

/// Crossover strategy for week chromosomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverType {
    /// One split point between days; whole days are exchanged.
    #[default]
    DayBoundary,
    /// Each (day, section) sub-schedule is inherited from a random parent.
    SectionUniform,
}

/// Day-boundary crossover.
///
/// Picks a split `s` uniformly in `1..days`. Child A takes parent 1's days
/// before `s` and parent 2's from `s` on; child B is the complement. A
/// one-day week has no split point and yields parent copies.
///
/// Children keep the parents' IDs; callers assign fresh ones.
pub fn day_crossover<R: Rng>(
    p1: &Chromosome,
    p2: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let days = p1.days.len().min(p2.days.len());
    if days < 2 {
        return (p1.clone(), p2.clone());
    }
    let split = rng.random_range(1..days);

    let mut a: Vec<DaySchedule> = p1.days[..split].to_vec();
    a.extend_from_slice(&p2.days[split..]);
    let mut b: Vec<DaySchedule> = p2.days[..split].to_vec();
    b.extend_from_slice(&p1.days[split..]);

    (Chromosome::new(p1.id, a), Chromosome::new(p2.id, b))
}

/// Section-uniform crossover.
///
/// For every day and every section present in either parent, a fair coin
/// decides which parent's periods child A inherits; child B takes the
/// other parent's.
pub fn section_uniform_crossover<R: Rng>(
    p1: &Chromosome,
    p2: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let mut a = p1.clone();
    let mut b = p2.clone();

    for (da, db) in a.days.iter_mut().zip(b.days.iter_mut()) {
        let sections: BTreeSet<String> = da
            .sections
            .keys()
            .chain(db.sections.keys())
            .cloned()
            .collect();
        for section in sections {
            if rng.random_bool(0.5) {
                let from_a = da.sections.remove(&section);
                let from_b = db.sections.remove(&section);
                if let Some(p) = from_b {
                    da.sections.insert(section.clone(), p);
                }
                if let Some(p) = from_a {
                    db.sections.insert(section, p);
                }
            }
        }
    }

    (a, b)
}

/// Sections to mutate on a day with `section_count` sections.
///
/// `max(1, round(rate × section_count))`, never more than exist. Halves
/// round away from zero (`f64::round`), so rate 0.5 over 5 sections picks 3.
pub fn mutation_count(rate: f64, section_count: usize) -> usize {
    if section_count == 0 {
        return 0;
    }
    let n = (rate.clamp(0.0, 1.0) * section_count as f64).round() as usize;
    n.clamp(1, section_count)
}

/// Permutes the slot labels among a section's periods.
///
/// Teacher, subject and room stay with each period. Returns `false` for
/// fewer than two periods.
pub fn shuffle_section_slots<R: Rng>(
    periods: &mut [Assignment],
    rng: &mut R,
) -> bool {
    if periods.len() < 2 {
        return false;
    }
    let mut labels: Vec<String> = periods.iter().map(|a| a.time_slot.clone()).collect();
    labels.shuffle(rng);
    for (a, label) in periods.iter_mut().zip(labels) {
        a.time_slot = label;
    }
    true
}

/// Slot-shuffle mutation over a whole week.
///
/// On every day, picks [`mutation_count`] sections uniformly without
/// replacement and shuffles each one's slot labels, then restores slot
/// order. Returns the `(day, section)` pairs that were shuffled.
pub fn mutate_week<R: Rng>(
    chromosome: &mut Chromosome,
    rate: f64,
    calendar: &WeekCalendar,
    rng: &mut R,
) -> Vec<(String, String)> {
    let mut mutated = Vec::new();
    for day in &mut chromosome.days {
        let names: Vec<String> = day.sections.keys().cloned().collect();
        let k = mutation_count(rate, names.len());
        if k == 0 {
            continue;
        }
        let mut picked = index::sample(rng, names.len(), k).into_vec();
        picked.sort_unstable();

        let mut touched = false;
        for i in picked {
            let name = &names[i];
            if let Some(periods) = day.sections.get_mut(name) {
                if shuffle_section_slots(periods, rng) {
                    mutated.push((day.day.clone(), name.clone()));
                    touched = true;
                }
            }
        }
        if touched {
            day.sort_by_slot(calendar);
        }
    }
    mutated
}

/// Runtime-selectable genetic operators.
///
/// # Example
///
/// ```
/// use u_timetable::ga::operators::{CrossoverType, GeneticOperators};
///
/// let ops = GeneticOperators {
///     crossover_type: CrossoverType::SectionUniform,
///     mutation_rate: 1.0,
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticOperators {
    /// Crossover strategy.
    pub crossover_type: CrossoverType,
    /// Mutation rate in [0, 1].
    pub mutation_rate: f64,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self {
            crossover_type: CrossoverType::DayBoundary,
            mutation_rate: 0.5,
        }
    }
}

impl GeneticOperators {
    /// Operators for a GA configuration.
    pub fn from_config(config: &GaConfig) -> Self {
        Self {
            crossover_type: config.crossover,
            mutation_rate: config.mutation_rate,
        }
    }

    /// Performs crossover using the configured strategy.
    pub fn crossover<R: Rng>(
        &self,
        p1: &Chromosome,
        p2: &Chromosome,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        match self.crossover_type {
            CrossoverType::DayBoundary => day_crossover(p1, p2, rng),
            CrossoverType::SectionUniform => section_uniform_crossover(p1, p2, rng),
        }
    }

    /// Performs slot-shuffle mutation at the configured rate.
    pub fn mutate<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        calendar: &WeekCalendar,
        rng: &mut R,
    ) -> Vec<(String, String)> {
        mutate_week(chromosome, self.mutation_rate, calendar, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const SLOTS: [&str; 4] = ["P1", "P2", "P3", "P4"];

    fn calendar() -> WeekCalendar {
        WeekCalendar::from_labels(["Mon", "Tue", "Wed"], SLOTS)
    }

    /// Every section holds every slot, teacher tagged by day and section.
    fn full_week(id: u64, tag: &str, sections: &[&str]) -> Chromosome {
        let cal = calendar();
        let mut ch = Chromosome::empty(id, &cal);
        for day in &mut ch.days {
            for s in sections {
                let periods = SLOTS
                    .iter()
                    .enumerate()
                    .map(|(i, slot)| {
                        Assignment::new(format!("{tag}-{s}-{i}"), "SUB", "R1", *slot)
                    })
                    .collect();
                day.sections.insert(s.to_string(), periods);
            }
        }
        ch
    }

    #[test]
    fn test_default_operators() {
        let ops = GeneticOperators::default();
        assert_eq!(ops.crossover_type, CrossoverType::DayBoundary);
        assert!((ops.mutation_rate - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_day_crossover_exchanges_whole_days() {
        let p1 = full_week(1, "x", &["A", "B"]);
        let p2 = full_week(2, "y", &["A", "B"]);
        let mut rng = SmallRng::seed_from_u64(42);
        let (c1, c2) = day_crossover(&p1, &p2, &mut rng);

        // Parents differ on every day, so the first differing day is the split.
        let split = c1
            .days
            .iter()
            .zip(&p1.days)
            .position(|(a, b)| a != b)
            .unwrap();
        assert!((1..3).contains(&split));
        for i in 0..3 {
            if i < split {
                assert_eq!(c1.days[i], p1.days[i]);
                assert_eq!(c2.days[i], p2.days[i]);
            } else {
                assert_eq!(c1.days[i], p2.days[i]);
                assert_eq!(c2.days[i], p1.days[i]);
            }
        }
        assert!(c1.is_valid(&calendar()));
        assert!(c2.is_valid(&calendar()));
    }

    #[test]
    fn test_self_crossover_yields_parent() {
        let p = full_week(7, "x", &["A", "B", "C"]);
        let mut rng = SmallRng::seed_from_u64(1);
        for ty in [CrossoverType::DayBoundary, CrossoverType::SectionUniform] {
            let ops = GeneticOperators {
                crossover_type: ty,
                mutation_rate: 0.5,
            };
            for _ in 0..10 {
                let (a, b) = ops.crossover(&p, &p, &mut rng);
                assert!(a.same_genes(&p));
                assert!(b.same_genes(&p));
            }
        }
    }

    #[test]
    fn test_section_uniform_conserves_genes() {
        let p1 = full_week(1, "x", &["A", "B"]);
        let p2 = full_week(2, "y", &["A", "B"]);
        let mut rng = SmallRng::seed_from_u64(9);
        let (c1, c2) = section_uniform_crossover(&p1, &p2, &mut rng);
        for d in 0..3 {
            for s in ["A", "B"] {
                let got = (&c1.days[d].sections[s], &c2.days[d].sections[s]);
                let p = (&p1.days[d].sections[s], &p2.days[d].sections[s]);
                assert!(got == p || got == (p.1, p.0));
            }
        }
    }

    #[test]
    fn test_mutation_count_floor_and_ceiling() {
        assert_eq!(mutation_count(0.0, 4), 1);
        assert_eq!(mutation_count(0.5, 4), 2);
        assert_eq!(mutation_count(1.0, 4), 4);
        assert_eq!(mutation_count(3.0, 4), 4);
        assert_eq!(mutation_count(0.5, 0), 0);
        assert_eq!(mutation_count(0.5, 5), 3);
    }

    #[test]
    fn test_rate_zero_mutates_one_section_per_day() {
        let cal = calendar();
        let mut ch = full_week(0, "x", &["A", "B", "C"]);
        let mut rng = SmallRng::seed_from_u64(3);
        let mutated = mutate_week(&mut ch, 0.0, &cal, &mut rng);
        assert_eq!(mutated.len(), 3);
        let days: BTreeSet<&str> = mutated.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(days.len(), 3);
    }

    #[test]
    fn test_rate_one_mutates_every_multi_period_section() {
        let cal = calendar();
        let mut ch = full_week(0, "x", &["A", "B"]);
        ch.days[0]
            .sections
            .insert("C".into(), vec![Assignment::new("T", "SUB", "R2", "P2")]);
        let mut rng = SmallRng::seed_from_u64(5);
        let mutated = mutate_week(&mut ch, 1.0, &cal, &mut rng);
        assert_eq!(mutated.len(), 6);
        assert!(!mutated.iter().any(|(_, s)| s == "C"));
    }

    #[test]
    fn test_mutation_preserves_periods_and_order() {
        let cal = calendar();
        let original = full_week(0, "x", &["A", "B"]);
        let mut ch = original.clone();
        let mut rng = SmallRng::seed_from_u64(11);
        mutate_week(&mut ch, 1.0, &cal, &mut rng);
        assert!(ch.is_valid(&cal));
        for (before, after) in original.days.iter().zip(&ch.days) {
            for (section, periods) in &before.sections {
                let mut a: Vec<_> = periods.iter().map(|p| p.teacher_id.clone()).collect();
                let mut b: Vec<_> = after.sections[section]
                    .iter()
                    .map(|p| p.teacher_id.clone())
                    .collect();
                a.sort();
                b.sort();
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_short_section_unchanged() {
        let mut periods = vec![Assignment::new("T", "S", "R", "P1")];
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(!shuffle_section_slots(&mut periods, &mut rng));
        assert_eq!(periods[0].time_slot, "P1");
    }
}
