//! Week-timetable chromosome.
//!
//! # Encoding
//!
//! A chromosome is one candidate week: a list of [`DaySchedule`]s in
//! working-day order. Each day maps section → periods in slot order.
//! Genes are the individual [`Assignment`](crate::models::Assignment)s.
//!
//! Chromosome IDs come from a run-wide [`IdSequence`], so IDs never
//! repeat across generations and pool merges cannot collide.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::{DaySchedule, Timetable, WeekCalendar};

/// Run-unique chromosome identifier.
pub type ChromosomeId = u64;

/// A generation's chromosomes.
pub type Population = Vec<Chromosome>;

/// Monotonic ID source for one engine run.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: ChromosomeId,
}

impl IdSequence {
    /// Starts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused ID.
    pub fn next_id(&mut self) -> ChromosomeId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of IDs handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// One candidate weekly timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromosome {
    /// Run-unique ID.
    pub id: ChromosomeId,
    /// Days in working-day order.
    pub days: Vec<DaySchedule>,
}

impl Chromosome {
    /// Wraps day schedules.
    pub fn new(id: ChromosomeId, days: Vec<DaySchedule>) -> Self {
        Self { id, days }
    }

    /// An empty week for the calendar's working days.
    pub fn empty(id: ChromosomeId, calendar: &WeekCalendar) -> Self {
        Self {
            id,
            days: calendar
                .working_days
                .iter()
                .map(|d| DaySchedule::new(d.clone()))
                .collect(),
        }
    }

    /// Same genes under a new ID.
    pub fn with_id(mut self, id: ChromosomeId) -> Self {
        self.id = id;
        self
    }

    /// Schedule for a named day.
    pub fn day(&self, name: &str) -> Option<&DaySchedule> {
        self.days.iter().find(|d| d.day == name)
    }

    /// Every section appearing on any day.
    pub fn section_names(&self) -> BTreeSet<&str> {
        self.days
            .iter()
            .flat_map(|d| d.sections.keys().map(|s| s.as_str()))
            .collect()
    }

    /// Periods a section holds across the week.
    pub fn section_periods(&self, section: &str) -> usize {
        self.days
            .iter()
            .filter_map(|d| d.sections.get(section))
            .map(Vec::len)
            .sum()
    }

    /// Periods per section across the week.
    pub fn periods_by_section(&self) -> BTreeMap<&str, usize> {
        let mut out = BTreeMap::new();
        for day in &self.days {
            for (section, periods) in &day.sections {
                *out.entry(section.as_str()).or_insert(0) += periods.len();
            }
        }
        out
    }

    /// Total periods in the week.
    pub fn assignment_count(&self) -> usize {
        self.days.iter().map(DaySchedule::period_count).sum()
    }

    /// Whether two chromosomes hold the same genes, ignoring IDs.
    pub fn same_genes(&self, other: &Chromosome) -> bool {
        self.days == other.days
    }

    /// Externally visible form.
    pub fn to_timetable(&self) -> Timetable {
        Timetable::from(self.days.as_slice())
    }

    /// Validates the structure against a calendar.
    ///
    /// Checks:
    /// 1. Days follow the calendar's working days, in order
    /// 2. Every period label is a known slot
    /// 3. No slot repeats within a section's day
    /// 4. Each section's periods are in slot order
    pub fn is_valid(&self, calendar: &WeekCalendar) -> bool {
        if self.days.len() != calendar.working_days.len() {
            return false;
        }
        for (day, expected) in self.days.iter().zip(&calendar.working_days) {
            if &day.day != expected {
                return false;
            }
            for periods in day.sections.values() {
                let mut seen = HashSet::new();
                let mut last = 0;
                for a in periods {
                    let Some(idx) = calendar.slot_index(&a.time_slot) else {
                        return false;
                    };
                    if !seen.insert(idx) || idx < last {
                        return false;
                    }
                    last = idx;
                }
            }
        }
        true
    }
}
