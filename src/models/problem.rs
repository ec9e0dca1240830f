//! Problem instance model.
//!
//! Everything the search needs to know about a college's week: who can
//! teach what, section sizes, rooms, weekly quotas, teacher limits and
//! preferences, and the calendar. Immutable for the duration of a run.
//!
//! All maps are ordered (`BTreeMap`/`BTreeSet`) so that every iteration
//! over the instance is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{partition_into_sections, Student, StudentAttribute, WeekCalendar};

/// Room category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// Ordinary lecture classroom.
    Classroom,
    /// Laboratory.
    Lab,
}

/// A complete timetabling problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemInstance {
    /// Subject code → teachers able to teach it.
    pub subject_teachers: BTreeMap<String, Vec<String>>,
    /// Section name → student strength.
    pub sections: BTreeMap<String, u32>,
    /// Classroom name → seating capacity.
    pub classrooms: BTreeMap<String, u32>,
    /// Lab name → seating capacity.
    pub labs: BTreeMap<String, u32>,
    /// Subject code → periods per week per section.
    pub subject_quota: BTreeMap<String, u32>,
    /// Subjects that must be held in a lab.
    pub lab_subjects: BTreeSet<String>,
    /// Teacher → maximum periods per week. Absent = uncapped.
    pub teacher_max_hours: BTreeMap<String, u32>,
    /// Teacher → days they may teach. Absent or empty = every day.
    pub teacher_duty_days: BTreeMap<String, Vec<String>>,
    /// Teacher → preferred 1-based period indices. Absent or empty = no preference.
    pub teacher_preferences: BTreeMap<String, Vec<usize>>,
    /// Subject → section → teacher that must take it.
    pub fixed_teacher_assignment: BTreeMap<String, BTreeMap<String, String>>,
    /// Week structure.
    pub calendar: WeekCalendar,
}

impl ProblemInstance {
    /// Creates an empty instance on the standard calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the calendar.
    pub fn with_calendar(mut self, calendar: WeekCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Declares the teachers able to teach a subject.
    pub fn with_subject<I>(mut self, subject: impl Into<String>, quota: u32, teachers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let subject = subject.into();
        self.subject_quota.insert(subject.clone(), quota);
        self.subject_teachers
            .insert(subject, teachers.into_iter().map(Into::into).collect());
        self
    }

    /// Declares a lab subject.
    pub fn with_lab_subject<I>(self, subject: impl Into<String>, quota: u32, teachers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let subject = subject.into();
        let mut me = self.with_subject(subject.clone(), quota, teachers);
        me.lab_subjects.insert(subject);
        me
    }

    /// Adds a section.
    pub fn with_section(mut self, name: impl Into<String>, strength: u32) -> Self {
        self.sections.insert(name.into(), strength);
        self
    }

    /// Adds sections formed from a student roster.
    ///
    /// See [`partition_into_sections`].
    pub fn with_sections_from_students(
        mut self,
        students: &[Student],
        rules: &[StudentAttribute],
        class_strength: usize,
    ) -> Self {
        for (name, members) in partition_into_sections(students, rules, class_strength) {
            self.sections.insert(name, members.len() as u32);
        }
        self
    }

    /// Adds a classroom.
    pub fn with_classroom(mut self, name: impl Into<String>, capacity: u32) -> Self {
        self.classrooms.insert(name.into(), capacity);
        self
    }

    /// Adds a lab.
    pub fn with_lab(mut self, name: impl Into<String>, capacity: u32) -> Self {
        self.labs.insert(name.into(), capacity);
        self
    }

    /// Caps a teacher's weekly periods.
    pub fn with_max_hours(mut self, teacher: impl Into<String>, hours: u32) -> Self {
        self.teacher_max_hours.insert(teacher.into(), hours);
        self
    }

    /// Restricts a teacher to the given days.
    pub fn with_duty_days<I>(mut self, teacher: impl Into<String>, days: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.teacher_duty_days
            .insert(teacher.into(), days.into_iter().map(Into::into).collect());
        self
    }

    /// Sets a teacher's preferred period indices.
    pub fn with_preferences(mut self, teacher: impl Into<String>, slots: Vec<usize>) -> Self {
        self.teacher_preferences.insert(teacher.into(), slots);
        self
    }

    /// Pins the teacher for a subject in a section.
    pub fn with_fixed_teacher(
        mut self,
        subject: impl Into<String>,
        section: impl Into<String>,
        teacher: impl Into<String>,
    ) -> Self {
        self.fixed_teacher_assignment
            .entry(subject.into())
            .or_default()
            .insert(section.into(), teacher.into());
        self
    }

    /// Every teacher named anywhere in the instance, sorted.
    pub fn teachers(&self) -> BTreeSet<&str> {
        let mut out: BTreeSet<&str> = self
            .subject_teachers
            .values()
            .flatten()
            .map(|t| t.as_str())
            .collect();
        out.extend(
            self.fixed_teacher_assignment
                .values()
                .flat_map(|m| m.values())
                .map(|t| t.as_str()),
        );
        out.extend(self.teacher_max_hours.keys().map(|t| t.as_str()));
        out
    }

    /// Whether a subject must be held in a lab.
    #[inline]
    pub fn is_lab_subject(&self, subject: &str) -> bool {
        self.lab_subjects.contains(subject)
    }

    /// Teachers able to teach a subject.
    pub fn capable_teachers(&self, subject: &str) -> &[String] {
        self.subject_teachers
            .get(subject)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Pinned teacher for (subject, section).
    pub fn fixed_teacher(&self, subject: &str, section: &str) -> Option<&str> {
        self.fixed_teacher_assignment
            .get(subject)
            .and_then(|m| m.get(section))
            .map(|t| t.as_str())
    }

    /// Weekly cap for a teacher, if any.
    pub fn max_hours(&self, teacher: &str) -> Option<u32> {
        self.teacher_max_hours.get(teacher).copied()
    }

    /// Whether `teacher` may teach on `day`.
    pub fn is_duty_day(&self, teacher: &str, day: &str) -> bool {
        match self.teacher_duty_days.get(teacher) {
            Some(days) if !days.is_empty() => days.iter().any(|d| d == day),
            _ => true,
        }
    }

    /// Whether `teacher` prefers the 1-based period `slot`.
    pub fn prefers_slot(&self, teacher: &str, slot: usize) -> bool {
        match self.teacher_preferences.get(teacher) {
            Some(slots) if !slots.is_empty() => slots.contains(&slot),
            _ => true,
        }
    }

    /// Capacity of a classroom or lab.
    pub fn room_capacity(&self, room: &str) -> Option<u32> {
        self.classrooms
            .get(room)
            .or_else(|| self.labs.get(room))
            .copied()
    }

    /// Rooms of a kind, falling back to the other kind when none exist.
    pub fn rooms_for(&self, kind: RoomKind) -> Vec<(&str, u32)> {
        let (primary, fallback) = match kind {
            RoomKind::Classroom => (&self.classrooms, &self.labs),
            RoomKind::Lab => (&self.labs, &self.classrooms),
        };
        let source = if primary.is_empty() { fallback } else { primary };
        source.iter().map(|(k, v)| (k.as_str(), *v)).collect()
    }

    /// Subjects with a positive quota, in code order.
    pub fn scheduled_subjects(&self) -> impl Iterator<Item = (&str, u32)> {
        self.subject_quota
            .iter()
            .filter(|(_, q)| **q > 0)
            .map(|(s, q)| (s.as_str(), *q))
    }

    /// Total periods each section needs per week.
    pub fn weekly_demand(&self) -> u32 {
        self.scheduled_subjects().map(|(_, q)| q).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProblemInstance {
        ProblemInstance::new()
            .with_subject("MATH", 4, ["T1", "T2"])
            .with_lab_subject("PHY-LAB", 2, ["T3"])
            .with_subject("ART", 0, ["T4"])
            .with_section("A", 40)
            .with_classroom("R1", 60)
            .with_lab("L1", 30)
            .with_max_hours("T1", 10)
            .with_duty_days("T2", ["Monday"])
            .with_preferences("T1", vec![1, 2])
            .with_fixed_teacher("MATH", "A", "T9")
    }

    #[test]
    fn test_teachers_collects_every_source() {
        let p = sample();
        let t: Vec<&str> = p.teachers().into_iter().collect();
        assert_eq!(t, vec!["T1", "T2", "T3", "T4", "T9"]);
    }

    #[test]
    fn test_lookup_helpers() {
        let p = sample();
        assert!(p.is_lab_subject("PHY-LAB"));
        assert!(!p.is_lab_subject("MATH"));
        assert_eq!(p.capable_teachers("MATH"), ["T1".to_string(), "T2".to_string()]);
        assert!(p.capable_teachers("NONE").is_empty());
        assert_eq!(p.fixed_teacher("MATH", "A"), Some("T9"));
        assert_eq!(p.fixed_teacher("MATH", "B"), None);
        assert_eq!(p.max_hours("T1"), Some(10));
        assert_eq!(p.max_hours("T2"), None);
        assert_eq!(p.room_capacity("L1"), Some(30));
        assert_eq!(p.room_capacity("X"), None);
    }

    #[test]
    fn test_duty_days_and_preferences() {
        let p = sample();
        assert!(p.is_duty_day("T2", "Monday"));
        assert!(!p.is_duty_day("T2", "Friday"));
        assert!(p.is_duty_day("T1", "Friday"));
        assert!(p.prefers_slot("T1", 2));
        assert!(!p.prefers_slot("T1", 5));
        assert!(p.prefers_slot("T2", 5));
    }

    #[test]
    fn test_zero_quota_not_scheduled() {
        let p = sample();
        let s: Vec<&str> = p.scheduled_subjects().map(|(s, _)| s).collect();
        assert_eq!(s, vec!["MATH", "PHY-LAB"]);
        assert_eq!(p.weekly_demand(), 6);
    }

    #[test]
    fn test_rooms_fallback() {
        let p = ProblemInstance::new().with_classroom("R1", 50);
        assert_eq!(p.rooms_for(RoomKind::Lab), vec![("R1", 50)]);
        let p = p.with_lab("L1", 20);
        assert_eq!(p.rooms_for(RoomKind::Lab), vec![("L1", 20)]);
    }

    #[test]
    fn test_sections_from_students() {
        let students: Vec<Student> = (0..5).map(|i| Student::new(format!("s{i}"))).collect();
        let p = ProblemInstance::new().with_sections_from_students(&students, &[], 2);
        assert_eq!(p.sections.get("A"), Some(&2));
        assert_eq!(p.sections.get("C"), Some(&1));
    }

    #[test]
    fn test_deserialize_partial() {
        let p: ProblemInstance = serde_json::from_str(
            r#"{"sections": {"A": 30}, "subject_quota": {"X": 3}}"#,
        )
        .unwrap();
        assert_eq!(p.sections["A"], 30);
        assert_eq!(p.calendar, WeekCalendar::standard());
    }
}
