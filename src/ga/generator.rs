//! Randomized constructive chromosome generator.
//!
//! # Algorithm
//!
//! Each chromosome is built against its own copy of the baseline
//! availability, so chromosomes of one batch never see each other's
//! bookings. Within a chromosome, sections are filled one after another
//! and every booking is committed immediately, which is what keeps later
//! sections from double-booking a teacher, lab or classroom.
//!
//! For each section the weekly demand is split into units (single
//! periods, or lab blocks of consecutive periods), shuffled, and placed
//! by a tiered search over shuffled free cells:
//!
//! 1. teacher free, on duty, under the weekly cap, in a preferred slot;
//!    smallest free room that seats the section
//! 2. as 1, without the preferred-slot requirement
//! 3. as 2, with any free room of the right kind (largest first)
//!
//! A fixed teacher override is tried first through every tier and is
//! exempt from the weekly cap. If it cannot be placed, the remaining
//! capable teachers are tried the same way. A unit no tier can place
//! becomes an unstaffed period in the section's first free cell.

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::BTreeMap;

use super::chromosome::{Chromosome, ChromosomeId, IdSequence};
use super::config::GaConfig;
use crate::models::{Assignment, AvailabilityMatrix, DaySchedule, ProblemInstance, RoomKind};

/// A batch of chromosomes with the combined teacher availability.
#[derive(Debug, Clone)]
pub struct GeneratedBatch {
    /// Chromosomes in ID order.
    pub chromosomes: Vec<Chromosome>,
    /// Teacher baseline with every chromosome's bookings applied.
    ///
    /// Diagnostic only: the engine logs its busy count, and never feeds it
    /// back into generation or fitness.
    pub teacher_snapshot: AvailabilityMatrix,
}

/// One placement request: a single period or a lab block.
#[derive(Debug, Clone, Copy)]
struct Unit<'p> {
    subject: &'p str,
    len: usize,
    kind: RoomKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Preferred,
    AnySlot,
    AnyRoom,
}

const TIERS: [Tier; 3] = [Tier::Preferred, Tier::AnySlot, Tier::AnyRoom];

/// Builds chromosomes for a problem instance.
#[derive(Debug, Clone)]
pub struct ChromosomeGenerator<'a> {
    problem: &'a ProblemInstance,
    lab_block_len: usize,
    parallel: bool,
    /// Slot labels by column.
    labels: Vec<String>,
    /// Grid row of each working day.
    rows: Vec<usize>,
}

impl<'a> ChromosomeGenerator<'a> {
    /// Creates a sequential generator with two-period lab blocks.
    pub fn new(problem: &'a ProblemInstance) -> Self {
        let calendar = &problem.calendar;
        let labels = calendar.time_slots.values().cloned().collect();
        let rows = calendar
            .working_days
            .iter()
            .enumerate()
            .map(|(i, d)| calendar.day_index(d).unwrap_or(i))
            .collect();
        Self {
            problem,
            lab_block_len: 2,
            parallel: false,
            labels,
            rows,
        }
    }

    /// Generator configured from GA parameters.
    pub fn from_config(problem: &'a ProblemInstance, config: &GaConfig) -> Self {
        Self::new(problem)
            .with_lab_block_len(config.lab_block_len)
            .with_parallel(config.parallel)
    }

    /// Sets the lab block length. Values below 1 are treated as 1.
    pub fn with_lab_block_len(mut self, len: usize) -> Self {
        self.lab_block_len = len.max(1);
        self
    }

    /// Builds chromosomes of a batch in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Baseline teacher matrix with an all-free grid for every teacher the
    /// problem names but the baseline omits.
    pub fn prepare_teachers(&self, baseline: &AvailabilityMatrix) -> AvailabilityMatrix {
        let (days, slots) = self.dims();
        let mut m = baseline.clone();
        for teacher in self.problem.teachers() {
            m.ensure(teacher, days, slots);
        }
        m
    }

    /// Baseline lab matrix with an all-free grid for every declared lab.
    pub fn prepare_labs(&self, baseline: &AvailabilityMatrix) -> AvailabilityMatrix {
        let (days, slots) = self.dims();
        let mut m = baseline.clone();
        for lab in self.problem.labs.keys() {
            m.ensure(lab, days, slots);
        }
        m
    }

    /// Generates `count` chromosomes.
    ///
    /// IDs and per-chromosome seeds are drawn in order before any building
    /// starts, so parallel and sequential batches are identical.
    pub fn generate<R: Rng>(
        &self,
        count: usize,
        ids: &mut IdSequence,
        teacher_baseline: &AvailabilityMatrix,
        lab_baseline: &AvailabilityMatrix,
        rng: &mut R,
    ) -> GeneratedBatch {
        let seeds: Vec<(ChromosomeId, u64)> =
            (0..count).map(|_| (ids.next_id(), rng.random())).collect();

        let teachers = self.prepare_teachers(teacher_baseline);
        let labs = self.prepare_labs(lab_baseline);

        let built: Vec<(Chromosome, AvailabilityMatrix)> = if self.parallel {
            seeds
                .par_iter()
                .map(|(id, seed)| self.build(*id, *seed, &teachers, &labs))
                .collect()
        } else {
            seeds
                .iter()
                .map(|(id, seed)| self.build(*id, *seed, &teachers, &labs))
                .collect()
        };

        let mut snapshot = teachers;
        let mut chromosomes = Vec::with_capacity(built.len());
        for (chromosome, booked) in built {
            snapshot.intersect(&booked);
            chromosomes.push(chromosome);
        }
        GeneratedBatch {
            chromosomes,
            teacher_snapshot: snapshot,
        }
    }

    /// Builds one chromosome from a seed.
    ///
    /// Returns the chromosome and the teacher matrix with its bookings.
    pub fn build(
        &self,
        id: ChromosomeId,
        seed: u64,
        teacher_baseline: &AvailabilityMatrix,
        lab_baseline: &AvailabilityMatrix,
    ) -> (Chromosome, AvailabilityMatrix) {
        let calendar = &self.problem.calendar;
        let (days, slots) = self.dims();
        let mut builder = Builder {
            id,
            problem: self.problem,
            labels: &self.labels,
            rows: &self.rows,
            teachers: self.prepare_teachers(teacher_baseline),
            labs: self.prepare_labs(lab_baseline),
            classrooms: AvailabilityMatrix::all_free(self.problem.classrooms.keys(), days, slots),
            hours: BTreeMap::new(),
            week: calendar
                .working_days
                .iter()
                .map(|d| DaySchedule::new(d.as_str()))
                .collect(),
            rng: SmallRng::seed_from_u64(seed),
        };

        let units = self.units();
        for (section, strength) in &self.problem.sections {
            builder.fill_section(section, *strength, &units);
        }

        let mut week = builder.week;
        for day in &mut week {
            day.sort_by_slot(calendar);
        }
        (Chromosome::new(id, week), builder.teachers)
    }

    fn dims(&self) -> (usize, usize) {
        (
            self.problem.calendar.day_count(),
            self.problem.calendar.slots_per_day(),
        )
    }

    /// Weekly demand of one section as placement units.
    fn units(&self) -> Vec<Unit<'a>> {
        let problem = self.problem;
        let mut units = Vec::new();
        for (subject, quota) in problem.scheduled_subjects() {
            let quota = quota as usize;
            let (kind, block) = if problem.is_lab_subject(subject) {
                (RoomKind::Lab, self.lab_block_len)
            } else {
                (RoomKind::Classroom, 1)
            };
            for _ in 0..quota / block {
                units.push(Unit {
                    subject,
                    len: block,
                    kind,
                });
            }
            for _ in 0..quota % block {
                units.push(Unit {
                    subject,
                    len: 1,
                    kind,
                });
            }
        }
        units
    }
}

/// Mutable state while building one chromosome.
struct Builder<'g> {
    id: ChromosomeId,
    problem: &'g ProblemInstance,
    labels: &'g [String],
    rows: &'g [usize],
    teachers: AvailabilityMatrix,
    labs: AvailabilityMatrix,
    classrooms: AvailabilityMatrix,
    hours: BTreeMap<&'g str, u32>,
    week: Vec<DaySchedule>,
    rng: SmallRng,
}

impl<'g> Builder<'g> {
    fn fill_section(&mut self, section: &str, strength: u32, units: &[Unit<'g>]) {
        let mut free = vec![vec![true; self.labels.len()]; self.week.len()];
        let mut order = units.to_vec();
        order.shuffle(&mut self.rng);

        for unit in order {
            if self.place(section, strength, unit, &mut free) {
                continue;
            }
            if unit.len > 1 {
                let single = Unit { len: 1, ..unit };
                for _ in 0..unit.len {
                    if !self.place(section, strength, single, &mut free) {
                        self.place_unstaffed(section, single, &mut free);
                    }
                }
            } else {
                self.place_unstaffed(section, unit, &mut free);
            }
        }
    }

    /// Tiered search for a staffed placement. Commits on success.
    fn place(&mut self, section: &str, strength: u32, unit: Unit<'g>, free: &mut [Vec<bool>]) -> bool {
        let problem = self.problem;
        let slots = self.labels.len();
        if unit.len > slots {
            return false;
        }

        let fixed = problem.fixed_teacher(unit.subject, section);
        let mut capable: Vec<&'g str> = problem
            .capable_teachers(unit.subject)
            .iter()
            .map(String::as_str)
            .filter(|t| Some(*t) != fixed)
            .collect();
        if capable.is_empty() && fixed.is_none() {
            return false;
        }
        capable.shuffle(&mut self.rng);
        let mut groups: Vec<(Vec<&'g str>, bool)> = Vec::with_capacity(2);
        if let Some(t) = fixed {
            groups.push((vec![t], true));
        }
        groups.push((capable, false));

        let mut cells: Vec<(usize, usize)> = free
            .iter()
            .enumerate()
            .flat_map(|(w, row)| {
                (0..=slots - unit.len)
                    .filter(move |&c| row[c..c + unit.len].iter().all(|f| *f))
                    .map(move |c| (w, c))
            })
            .collect();
        cells.shuffle(&mut self.rng);

        let mut rooms = problem.rooms_for(unit.kind);
        rooms.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        let adequate: Vec<&'g str> = rooms
            .iter()
            .filter(|(_, cap)| *cap >= strength)
            .map(|(r, _)| *r)
            .collect();
        let largest_first: Vec<&'g str> = rooms.iter().rev().map(|(r, _)| *r).collect();

        for (candidates, pinned) in &groups {
            for tier in TIERS {
                let room_order = if tier == Tier::AnyRoom {
                    &largest_first
                } else {
                    &adequate
                };
                for &(w, col) in &cells {
                    for &teacher in candidates {
                        if !self.teacher_fits(teacher, w, col, unit.len, tier, *pinned) {
                            continue;
                        }
                        let room = room_order
                            .iter()
                            .copied()
                            .find(|r| self.room_free(r, w, col, unit.len));
                        if let Some(room) = room {
                            self.commit(section, unit.subject, Some(teacher), room, w, col, unit.len, free);
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    fn teacher_fits(
        &self,
        teacher: &str,
        w: usize,
        col: usize,
        len: usize,
        tier: Tier,
        exempt_from_cap: bool,
    ) -> bool {
        let problem = self.problem;
        if !problem.is_duty_day(teacher, &self.week[w].day) {
            return false;
        }
        if !exempt_from_cap {
            if let Some(cap) = problem.max_hours(teacher) {
                let booked = self.hours.get(teacher).copied().unwrap_or(0);
                if booked + len as u32 > cap {
                    return false;
                }
            }
        }
        let row = self.rows[w];
        if !(col..col + len).all(|c| self.teachers.is_free(teacher, row, c)) {
            return false;
        }
        tier != Tier::Preferred || (col..col + len).all(|c| problem.prefers_slot(teacher, c + 1))
    }

    fn room_free(&self, room: &str, w: usize, col: usize, len: usize) -> bool {
        let row = self.rows[w];
        let matrix = if self.problem.labs.contains_key(room) {
            &self.labs
        } else {
            &self.classrooms
        };
        (col..col + len).all(|c| matrix.is_free(room, row, c))
    }

    #[allow(clippy::too_many_arguments)]
    fn commit(
        &mut self,
        section: &str,
        subject: &str,
        teacher: Option<&'g str>,
        room: &str,
        w: usize,
        col: usize,
        len: usize,
        free: &mut [Vec<bool>],
    ) {
        let row = self.rows[w];
        let is_lab = self.problem.labs.contains_key(room);
        for c in col..col + len {
            if let Some(t) = teacher {
                self.teachers.mark_busy(t, row, c);
            }
            if is_lab {
                self.labs.mark_busy(room, row, c);
            } else {
                self.classrooms.mark_busy(room, row, c);
            }
            free[w][c] = false;
            self.week[w]
                .sections
                .entry(section.to_string())
                .or_default()
                .push(Assignment {
                    teacher_id: teacher.map(str::to_string),
                    subject_id: subject.to_string(),
                    room_id: room.to_string(),
                    time_slot: self.labels[c].clone(),
                });
        }
        if let Some(t) = teacher {
            *self.hours.entry(t).or_insert(0) += len as u32;
        }
    }

    /// Unstaffed period in the first free cell, preferring cells with a
    /// free room. Dropped if the section's week is full.
    fn place_unstaffed(&mut self, section: &str, unit: Unit<'g>, free: &mut [Vec<bool>]) {
        let cells: Vec<(usize, usize)> = free
            .iter()
            .enumerate()
            .flat_map(|(w, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, f)| **f)
                    .map(move |(c, _)| (w, c))
            })
            .collect();
        let Some(&(first_w, first_col)) = cells.first() else {
            warn!(
                "chromosome {}: week of section {section} is full, dropping a {} period",
                self.id, unit.subject
            );
            return;
        };

        let mut rooms = self.problem.rooms_for(unit.kind);
        rooms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let (w, col, room) = cells
            .iter()
            .find_map(|&(w, c)| {
                rooms
                    .iter()
                    .map(|(r, _)| *r)
                    .find(|r| self.room_free(r, w, c, 1))
                    .map(|r| (w, c, r))
            })
            .unwrap_or_else(|| {
                let fallback = rooms.first().map(|(r, _)| *r).unwrap_or_default();
                (first_w, first_col, fallback)
            });

        debug!(
            "chromosome {}: no teacher for {} in section {section}, unstaffed at {} {}",
            self.id, unit.subject, self.week[w].day, self.labels[col]
        );
        self.commit(section, unit.subject, None, room, w, col, 1, free);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::fitness::{FitnessEvaluator, PenaltyTable};
    use crate::models::{ViolationType, WeekCalendar};

    fn problem() -> ProblemInstance {
        ProblemInstance::new()
            .with_subject("MATH", 4, ["T1", "T2"])
            .with_lab_subject("PHY-LAB", 2, ["T3"])
            .with_subject("ART", 0, ["T1"])
            .with_section("A", 40)
            .with_section("B", 50)
            .with_classroom("R1", 60)
            .with_classroom("R2", 30)
            .with_lab("L1", 60)
    }

    fn generate(p: &ProblemInstance, count: usize, seed: u64) -> GeneratedBatch {
        let generator = ChromosomeGenerator::new(p);
        let mut ids = IdSequence::new();
        let mut rng = SmallRng::seed_from_u64(seed);
        generator.generate(
            count,
            &mut ids,
            &AvailabilityMatrix::new(),
            &AvailabilityMatrix::new(),
            &mut rng,
        )
    }

    #[test]
    fn test_generates_complete_valid_weeks() {
        let p = problem();
        let batch = generate(&p, 3, 42);
        assert_eq!(batch.chromosomes.len(), 3);
        for ch in &batch.chromosomes {
            assert!(ch.is_valid(&p.calendar));
            assert_eq!(ch.section_periods("A"), 6);
            assert_eq!(ch.section_periods("B"), 6);
        }
        let ids: Vec<u64> = batch.chromosomes.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_no_conflicts_in_fresh_chromosome() {
        let p = problem();
        let table = PenaltyTable::default();
        let eval = FitnessEvaluator::new(&p, &table, 1000, 60);
        for ch in generate(&p, 5, 7).chromosomes {
            let report = eval.violations(&ch);
            assert_eq!(report.count(ViolationType::TeacherDoubleBooked), 0);
            assert_eq!(report.count(ViolationType::RoomDoubleBooked), 0);
            assert_eq!(report.count(ViolationType::OverCapacity), 0);
            assert_eq!(eval.evaluate(&ch), 1000);
        }
    }

    #[test]
    fn test_lab_blocks_are_consecutive() {
        let p = problem();
        for ch in generate(&p, 3, 1).chromosomes {
            for day in &ch.days {
                for periods in day.sections.values() {
                    let labs: Vec<usize> = periods
                        .iter()
                        .filter(|a| a.subject_id == "PHY-LAB")
                        .map(|a| p.calendar.slot_index(&a.time_slot).unwrap())
                        .collect();
                    if !labs.is_empty() {
                        assert_eq!(labs.len(), 2);
                        assert_eq!(labs[1], labs[0] + 1);
                    }
                }
                for a in day.sections.values().flatten() {
                    if a.subject_id == "PHY-LAB" {
                        assert_eq!(a.room_id, "L1");
                    } else {
                        assert_ne!(a.room_id, "L1");
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_quota_never_scheduled() {
        let p = problem();
        for ch in generate(&p, 4, 3).chromosomes {
            assert!(ch.to_timetable().iter().all(|(_, _, a)| a.subject_id != "ART"));
        }
    }

    #[test]
    fn test_fixed_teacher_override() {
        let p = problem().with_fixed_teacher("MATH", "A", "T9").with_max_hours("T9", 0);
        for ch in generate(&p, 3, 11).chromosomes {
            for day in &ch.days {
                for a in day.sections.get("A").into_iter().flatten() {
                    if a.subject_id == "MATH" {
                        assert_eq!(a.teacher(), Some("T9"));
                    }
                }
            }
        }
    }

    #[test]
    fn test_unplaceable_fixed_teacher_falls_back() {
        let p = problem()
            .with_fixed_teacher("MATH", "A", "T1")
            .with_duty_days("T1", ["Saturday"]);
        let table = PenaltyTable::default();
        let eval = FitnessEvaluator::new(&p, &table, 1000, 60);
        for ch in generate(&p, 3, 19).chromosomes {
            assert_eq!(eval.violations(&ch).count(ViolationType::UnstaffedPeriod), 0);
            for day in &ch.days {
                for a in day.sections.get("A").into_iter().flatten() {
                    if a.subject_id == "MATH" {
                        assert_eq!(a.teacher(), Some("T2"));
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_hours_leaves_periods_unstaffed() {
        let p = problem().with_max_hours("T3", 0);
        let table = PenaltyTable::default();
        let eval = FitnessEvaluator::new(&p, &table, 1000, 60);
        for ch in generate(&p, 3, 5).chromosomes {
            let report = eval.violations(&ch);
            assert_eq!(report.count(ViolationType::UnstaffedPeriod), 4);
            assert_eq!(ch.section_periods("A"), 6);
            assert!(ch
                .to_timetable()
                .iter()
                .all(|(_, _, a)| a.teacher() != Some("T3")));
        }
    }

    #[test]
    fn test_respects_baseline_and_duty_days() {
        let p = problem().with_duty_days("T2", ["Tuesday"]);
        let mut busy_monday = vec![vec![true; 7]; 5];
        busy_monday[0] = vec![false; 7];
        let teachers = AvailabilityMatrix::new().with_grid("T1", busy_monday);

        let generator = ChromosomeGenerator::new(&p);
        let mut ids = IdSequence::new();
        let mut rng = SmallRng::seed_from_u64(8);
        let batch = generator.generate(4, &mut ids, &teachers, &AvailabilityMatrix::new(), &mut rng);
        for ch in &batch.chromosomes {
            for (day, _, a) in ch.to_timetable().iter() {
                if day == "Monday" {
                    assert_ne!(a.teacher(), Some("T1"));
                }
                if a.teacher() == Some("T2") {
                    assert_eq!(day, "Tuesday");
                }
            }
        }
        // Snapshot keeps the baseline and adds every chromosome's bookings.
        assert!(batch.teacher_snapshot.free_slots("T1", 0).is_empty());
        assert!(batch.teacher_snapshot.total_busy() > 7);
    }

    #[test]
    fn test_full_week_drops_excess() {
        let p = ProblemInstance::new()
            .with_calendar(WeekCalendar::from_labels(["Mon"], ["P1", "P2"]))
            .with_subject("MATH", 3, ["T1"])
            .with_section("A", 10)
            .with_classroom("R1", 20);
        let batch = generate(&p, 2, 0);
        for ch in &batch.chromosomes {
            assert_eq!(ch.section_periods("A"), 2);
            assert!(ch.is_valid(&p.calendar));
        }
    }

    #[test]
    fn test_seeded_and_parallel_batches_match() {
        let p = problem();
        let a = generate(&p, 4, 99);
        let b = generate(&p, 4, 99);
        assert_eq!(a.chromosomes, b.chromosomes);

        let generator = ChromosomeGenerator::new(&p).with_parallel(true);
        let mut ids = IdSequence::new();
        let mut rng = SmallRng::seed_from_u64(99);
        let par = generator.generate(
            4,
            &mut ids,
            &AvailabilityMatrix::new(),
            &AvailabilityMatrix::new(),
            &mut rng,
        );
        assert_eq!(a.chromosomes, par.chromosomes);
        assert_eq!(a.teacher_snapshot, par.teacher_snapshot);
    }
}
