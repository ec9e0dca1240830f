//! Engine entry point over a flat request.
//!
//! [`TimetableRequest`] mirrors the inputs a caller typically holds as
//! plain maps (e.g. decoded from JSON): capability and quota maps, rooms,
//! teacher limits, both availability baselines, the calendar maps and an
//! optional generation count. [`generate_timetable`] turns it into a
//! [`ProblemInstance`], runs the engine and returns its output.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{Defaults, EngineConfig};
use crate::error::Result;
use crate::ga::{EngineOutput, TimetableEngine};
use crate::models::{
    partition_into_sections, AvailabilityMatrix, ProblemInstance, Student, StudentAttribute,
    WeekCalendar, DEFAULT_TIME_SLOTS,
};

/// Every input of one timetabling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableRequest {
    /// Subject → capable teachers.
    pub subject_teachers: BTreeMap<String, Vec<String>>,
    /// Section → student strength.
    pub sections: BTreeMap<String, u32>,
    /// Student roster; forms sections when `sections` is empty.
    pub students: Vec<Student>,
    /// Attribute rules used to group the roster.
    pub student_rules: Vec<StudentAttribute>,
    /// Classroom → capacity.
    pub classrooms: BTreeMap<String, u32>,
    /// Lab → capacity.
    pub labs: BTreeMap<String, u32>,
    /// Teacher → preferred 1-based slot indices.
    pub teacher_preferences: BTreeMap<String, Vec<usize>>,
    /// Teacher → weekly period cap.
    pub teacher_max_hours: BTreeMap<String, u32>,
    /// Subjects held in labs.
    pub lab_subjects: BTreeSet<String>,
    /// Subject → periods per week.
    pub subject_quota: BTreeMap<String, u32>,
    /// Teacher → duty day names.
    pub teacher_duty_days: BTreeMap<String, Vec<String>>,
    /// Baseline teacher availability.
    pub teacher_availability: AvailabilityMatrix,
    /// Baseline lab availability.
    pub lab_availability: AvailabilityMatrix,
    /// Overrides `ga.generations` when present.
    pub generations: Option<usize>,
    /// Slot index → label. Empty means the default seven-period day.
    pub time_slots: BTreeMap<usize, String>,
    /// Day name → grid row. Empty means working-day order.
    pub day_map: BTreeMap<String, usize>,
    /// Slot label → index. Empty means the inverse of `time_slots`.
    pub time_slot_map: BTreeMap<String, usize>,
    /// Subject → section → pinned teacher.
    pub fixed_teacher_assignment: BTreeMap<String, BTreeMap<String, String>>,
    /// Scheduled days. Absent means the configured default.
    pub working_days: Option<Vec<String>>,
}

impl TimetableRequest {
    /// Week calendar, filling unspecified maps from defaults.
    pub fn calendar(&self, defaults: &Defaults) -> WeekCalendar {
        let working_days = self
            .working_days
            .clone()
            .unwrap_or_else(|| defaults.working_days.clone());
        let time_slots: BTreeMap<usize, String> = if self.time_slots.is_empty() {
            DEFAULT_TIME_SLOTS
                .iter()
                .enumerate()
                .map(|(i, l)| (i + 1, l.to_string()))
                .collect()
        } else {
            self.time_slots.clone()
        };
        let day_map = if self.day_map.is_empty() {
            working_days
                .iter()
                .enumerate()
                .map(|(i, d)| (d.clone(), i))
                .collect()
        } else {
            self.day_map.clone()
        };
        let time_slot_map = if self.time_slot_map.is_empty() {
            time_slots.iter().map(|(i, l)| (l.clone(), *i)).collect()
        } else {
            self.time_slot_map.clone()
        };
        WeekCalendar::new(working_days, day_map, time_slots, time_slot_map)
    }

    /// Problem instance described by this request.
    pub fn to_problem(&self, defaults: &Defaults) -> ProblemInstance {
        let sections = if self.sections.is_empty() && !self.students.is_empty() {
            partition_into_sections(&self.students, &self.student_rules, defaults.class_strength)
                .into_iter()
                .map(|(name, members)| (name, members.len() as u32))
                .collect()
        } else {
            self.sections.clone()
        };
        ProblemInstance {
            subject_teachers: self.subject_teachers.clone(),
            sections,
            classrooms: self.classrooms.clone(),
            labs: self.labs.clone(),
            subject_quota: self.subject_quota.clone(),
            lab_subjects: self.lab_subjects.clone(),
            teacher_max_hours: self.teacher_max_hours.clone(),
            teacher_duty_days: self.teacher_duty_days.clone(),
            teacher_preferences: self.teacher_preferences.clone(),
            fixed_teacher_assignment: self.fixed_teacher_assignment.clone(),
            calendar: self.calendar(defaults),
        }
    }
}

/// Builds the problem, runs the engine and returns the best timetable.
///
/// # Errors
/// Any configuration problem (invalid config, empty capability map, no
/// sections, no rooms, zero generations, mismatched grids) is returned
/// before the first generation runs.
pub fn generate_timetable(request: &TimetableRequest, config: &EngineConfig) -> Result<EngineOutput> {
    let mut config = config.clone();
    if let Some(n) = request.generations {
        config.ga.generations = n;
    }
    config.validate()?;

    let problem = request.to_problem(&config.defaults);
    let engine = TimetableEngine::new(problem, config)?;
    engine.run(&request.teacher_availability, &request.lab_availability)
}
