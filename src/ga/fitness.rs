//! Penalty-based fitness evaluation.
//!
//! # Model
//!
//! `score = starting_fitness - Σ count(kind) × weight(kind)`
//!
//! All violations are soft: they lower the score but never invalidate a
//! chromosome. Scores are integers so evaluation is exactly reproducible.
//!
//! | Kind | Counted per |
//! |------|-------------|
//! | Teacher / room double-booked | extra occupant of a (day, slot) |
//! | Over capacity | period whose section exceeds the room |
//! | Unpreferred slot | staffed period outside the teacher's preferences |
//! | Teacher overload | hour above the weekly cap |
//! | Non-duty day | staffed period on a day off |
//! | Unstaffed period | placeholder period |
//! | Quota mismatch | period missing from or beyond a section's quota |
//! | Baseline conflict | teacher or lab period on a cell the baseline commits |
//! | Consecutive overrun | period beyond a teacher's back-to-back limit (off unless set) |

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::chromosome::{Chromosome, ChromosomeId};
use crate::models::{AvailabilityMatrix, DaySchedule, ProblemInstance, Violation, ViolationType};

/// Chromosome ID → score (higher = better).
pub type FitnessMap = BTreeMap<ChromosomeId, i64>;

/// Penalty weight per violation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyTable {
    /// Teacher in two places at once.
    pub teacher_double_booked: i64,
    /// Room hosting two periods at once.
    #[serde(alias = "classroom_double_booked")]
    pub room_double_booked: i64,
    /// Section larger than its room.
    pub over_capacity: i64,
    /// Period outside the teacher's preferred slots.
    #[serde(alias = "un_preferred_slot")]
    pub unpreferred_slot: i64,
    /// Hour above the teacher's weekly cap.
    #[serde(alias = "overload_teacher")]
    pub teacher_overload: i64,
    /// Period on a teacher's day off.
    pub non_duty_day: i64,
    /// Period without a teacher.
    pub unstaffed_period: i64,
    /// Period missing from or beyond a section's subject quota.
    pub quota_mismatch: i64,
    /// Period on a cell already committed in a baseline matrix.
    pub baseline_conflict: i64,
    /// Period beyond a teacher's back-to-back limit.
    pub consecutive_overrun: i64,
}

impl Default for PenaltyTable {
    fn default() -> Self {
        Self {
            teacher_double_booked: 30,
            room_double_booked: 20,
            over_capacity: 25,
            unpreferred_slot: 5,
            teacher_overload: 10,
            non_duty_day: 40,
            unstaffed_period: 15,
            quota_mismatch: 20,
            baseline_conflict: 30,
            consecutive_overrun: 10,
        }
    }
}

impl PenaltyTable {
    /// Weight charged per occurrence of `kind`.
    pub fn weight(&self, kind: ViolationType) -> i64 {
        match kind {
            ViolationType::TeacherDoubleBooked => self.teacher_double_booked,
            ViolationType::RoomDoubleBooked => self.room_double_booked,
            ViolationType::OverCapacity => self.over_capacity,
            ViolationType::UnpreferredSlot => self.unpreferred_slot,
            ViolationType::TeacherOverload => self.teacher_overload,
            ViolationType::NonDutyDay => self.non_duty_day,
            ViolationType::UnstaffedPeriod => self.unstaffed_period,
            ViolationType::QuotaMismatch => self.quota_mismatch,
            ViolationType::BaselineConflict => self.baseline_conflict,
            ViolationType::ConsecutiveOverrun => self.consecutive_overrun,
        }
    }

    /// Overrides the weight for `kind`.
    pub fn with_weight(mut self, kind: ViolationType, weight: i64) -> Self {
        let slot = match kind {
            ViolationType::TeacherDoubleBooked => &mut self.teacher_double_booked,
            ViolationType::RoomDoubleBooked => &mut self.room_double_booked,
            ViolationType::OverCapacity => &mut self.over_capacity,
            ViolationType::UnpreferredSlot => &mut self.unpreferred_slot,
            ViolationType::TeacherOverload => &mut self.teacher_overload,
            ViolationType::NonDutyDay => &mut self.non_duty_day,
            ViolationType::UnstaffedPeriod => &mut self.unstaffed_period,
            ViolationType::QuotaMismatch => &mut self.quota_mismatch,
            ViolationType::BaselineConflict => &mut self.baseline_conflict,
            ViolationType::ConsecutiveOverrun => &mut self.consecutive_overrun,
        };
        *slot = weight;
        self
    }
}

/// Violations found in one chromosome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    /// Occurrences per kind (kinds with zero are absent).
    pub counts: BTreeMap<ViolationType, u32>,
    /// Itemized violations.
    pub items: Vec<Violation>,
}

impl ViolationReport {
    /// Occurrences of `kind`.
    pub fn count(&self, kind: ViolationType) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total penalty under a table.
    pub fn penalty(&self, table: &PenaltyTable) -> i64 {
        self.counts
            .iter()
            .map(|(kind, n)| i64::from(*n) * table.weight(*kind))
            .sum()
    }

    /// Whether nothing was violated.
    pub fn is_clean(&self) -> bool {
        self.counts.is_empty()
    }

    fn charge(&mut self, kind: ViolationType, n: u32, detail: Option<(&str, String)>) {
        if n == 0 {
            return;
        }
        *self.counts.entry(kind).or_insert(0) += n;
        if let Some((entity, message)) = detail {
            self.items.push(Violation::new(kind, entity, n, message));
        }
    }
}

/// Scores chromosomes against a problem and penalty table.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator<'a> {
    problem: &'a ProblemInstance,
    penalties: &'a PenaltyTable,
    starting_fitness: i64,
    default_room_capacity: u32,
    teacher_baseline: Option<&'a AvailabilityMatrix>,
    lab_baseline: Option<&'a AvailabilityMatrix>,
    max_consecutive: Option<u32>,
}

impl<'a> FitnessEvaluator<'a> {
    /// Creates an evaluator.
    ///
    /// `default_room_capacity` applies to rooms missing from the instance.
    pub fn new(
        problem: &'a ProblemInstance,
        penalties: &'a PenaltyTable,
        starting_fitness: i64,
        default_room_capacity: u32,
    ) -> Self {
        Self {
            problem,
            penalties,
            starting_fitness,
            default_room_capacity,
            teacher_baseline: None,
            lab_baseline: None,
            max_consecutive: None,
        }
    }

    /// Charges periods that land on cells the baselines mark busy.
    pub fn with_baselines(
        mut self,
        teachers: &'a AvailabilityMatrix,
        labs: &'a AvailabilityMatrix,
    ) -> Self {
        self.teacher_baseline = Some(teachers);
        self.lab_baseline = Some(labs);
        self
    }

    /// Limit on a teacher's periods in a row within one day. `None` disables it.
    pub fn with_max_consecutive(mut self, limit: Option<u32>) -> Self {
        self.max_consecutive = limit;
        self
    }

    /// Score of one chromosome. Pure: same input, same score.
    pub fn evaluate(&self, chromosome: &Chromosome) -> i64 {
        let report = self.scan(&chromosome.days, false);
        self.starting_fitness - report.penalty(self.penalties)
    }

    /// Scores a population, keyed by chromosome ID.
    ///
    /// Parallel evaluation yields the same map as sequential.
    pub fn evaluate_population(&self, population: &[Chromosome], parallel: bool) -> FitnessMap {
        if parallel {
            population
                .par_iter()
                .map(|c| (c.id, self.evaluate(c)))
                .collect::<Vec<_>>()
                .into_iter()
                .collect()
        } else {
            population.iter().map(|c| (c.id, self.evaluate(c))).collect()
        }
    }

    /// Itemized violations of one chromosome.
    pub fn violations(&self, chromosome: &Chromosome) -> ViolationReport {
        self.scan(&chromosome.days, true)
    }

    fn scan(&self, days: &[DaySchedule], itemize: bool) -> ViolationReport {
        let problem = self.problem;
        let calendar = &problem.calendar;
        let mut report = ViolationReport::default();

        let mut teacher_slots: BTreeMap<(&str, &str, &str), u32> = BTreeMap::new();
        let mut room_slots: BTreeMap<(&str, &str, &str), u32> = BTreeMap::new();
        let mut teacher_hours: BTreeMap<&str, u32> = BTreeMap::new();
        let mut held: BTreeMap<(&str, &str), u32> = BTreeMap::new();
        let mut runs: BTreeMap<(&str, &str), BTreeSet<usize>> = BTreeMap::new();

        for day in days {
            for (section, periods) in &day.sections {
                let strength = problem.sections.get(section).copied().unwrap_or(0);
                for a in periods {
                    *held
                        .entry((section.as_str(), a.subject_id.as_str()))
                        .or_insert(0) += 1;
                    *room_slots
                        .entry((day.day.as_str(), a.time_slot.as_str(), a.room_id.as_str()))
                        .or_insert(0) += 1;

                    let cell = calendar.cell(&day.day, &a.time_slot);
                    if let (Some(labs), Some((row, col))) = (self.lab_baseline, cell) {
                        if !labs.is_free(&a.room_id, row, col) {
                            report.charge(
                                ViolationType::BaselineConflict,
                                1,
                                itemize.then(|| {
                                    (
                                        a.room_id.as_str(),
                                        format!(
                                            "{} is already committed on {} {}",
                                            a.room_id, day.day, a.time_slot
                                        ),
                                    )
                                }),
                            );
                        }
                    }

                    let capacity = problem
                        .room_capacity(&a.room_id)
                        .unwrap_or(self.default_room_capacity);
                    if strength > capacity {
                        report.charge(
                            ViolationType::OverCapacity,
                            1,
                            itemize.then(|| {
                                (
                                    section.as_str(),
                                    format!(
                                        "{section} ({strength}) exceeds {} ({capacity}) on {} {}",
                                        a.room_id, day.day, a.time_slot
                                    ),
                                )
                            }),
                        );
                    }

                    let Some(teacher) = a.teacher() else {
                        report.charge(
                            ViolationType::UnstaffedPeriod,
                            1,
                            itemize.then(|| {
                                (
                                    section.as_str(),
                                    format!(
                                        "{} for {section} on {} {} has no teacher",
                                        a.subject_id, day.day, a.time_slot
                                    ),
                                )
                            }),
                        );
                        continue;
                    };

                    *teacher_slots
                        .entry((day.day.as_str(), a.time_slot.as_str(), teacher))
                        .or_insert(0) += 1;
                    *teacher_hours.entry(teacher).or_insert(0) += 1;

                    if let (Some(teachers), Some((row, col))) = (self.teacher_baseline, cell) {
                        if !teachers.is_free(teacher, row, col) {
                            report.charge(
                                ViolationType::BaselineConflict,
                                1,
                                itemize.then(|| {
                                    (
                                        teacher,
                                        format!(
                                            "{teacher} is already committed on {} {}",
                                            day.day, a.time_slot
                                        ),
                                    )
                                }),
                            );
                        }
                    }
                    if self.max_consecutive.is_some() {
                        if let Some(idx) = calendar.slot_index(&a.time_slot) {
                            runs.entry((teacher, day.day.as_str())).or_default().insert(idx);
                        }
                    }

                    if !problem.is_duty_day(teacher, &day.day) {
                        report.charge(
                            ViolationType::NonDutyDay,
                            1,
                            itemize.then(|| {
                                (teacher, format!("{teacher} is off duty on {}", day.day))
                            }),
                        );
                    }

                    let preferred = calendar
                        .slot_index(&a.time_slot)
                        .map_or(true, |idx| problem.prefers_slot(teacher, idx));
                    if !preferred {
                        report.charge(
                            ViolationType::UnpreferredSlot,
                            1,
                            itemize.then(|| {
                                (
                                    teacher,
                                    format!("{teacher} does not prefer {}", a.time_slot),
                                )
                            }),
                        );
                    }
                }
            }
        }

        for ((day, slot, teacher), n) in &teacher_slots {
            report.charge(
                ViolationType::TeacherDoubleBooked,
                n - 1,
                itemize.then(|| (*teacher, format!("{teacher} has {n} periods on {day} {slot}"))),
            );
        }
        for ((day, slot, room), n) in &room_slots {
            report.charge(
                ViolationType::RoomDoubleBooked,
                n - 1,
                itemize.then(|| (*room, format!("{room} hosts {n} periods on {day} {slot}"))),
            );
        }
        for (teacher, hours) in &teacher_hours {
            if let Some(cap) = problem.max_hours(teacher) {
                if *hours > cap {
                    report.charge(
                        ViolationType::TeacherOverload,
                        hours - cap,
                        itemize.then(|| {
                            (*teacher, format!("{teacher} teaches {hours} of {cap} hours"))
                        }),
                    );
                }
            }
        }

        if let Some(limit) = self.max_consecutive {
            for ((teacher, day), slots) in &runs {
                let excess = consecutive_excess(slots, limit);
                report.charge(
                    ViolationType::ConsecutiveOverrun,
                    excess,
                    itemize.then(|| {
                        (
                            *teacher,
                            format!("{teacher} exceeds {limit} periods in a row on {day}"),
                        )
                    }),
                );
            }
        }

        for section in problem.sections.keys() {
            for (subject, quota) in problem.scheduled_subjects() {
                let n = held.remove(&(section.as_str(), subject)).unwrap_or(0);
                report.charge(
                    ViolationType::QuotaMismatch,
                    n.abs_diff(quota),
                    itemize.then(|| {
                        (
                            section.as_str(),
                            format!("{section} holds {n} of {quota} {subject} periods"),
                        )
                    }),
                );
            }
        }
        for ((section, subject), n) in held {
            report.charge(
                ViolationType::QuotaMismatch,
                n,
                itemize.then(|| (section, format!("{section} holds {n} unrequired {subject} periods"))),
            );
        }

        report
    }
}

/// Periods beyond `limit` summed over every run of adjacent slot indices.
fn consecutive_excess(slots: &BTreeSet<usize>, limit: u32) -> u32 {
    let mut excess = 0;
    let mut run = 0u32;
    let mut prev: Option<usize> = None;
    for &idx in slots {
        run = match prev {
            Some(p) if idx == p + 1 => run + 1,
            _ => {
                excess += run.saturating_sub(limit);
                1
            }
        };
        prev = Some(idx);
    }
    excess + run.saturating_sub(limit)
}
