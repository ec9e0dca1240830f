//! Timetable (solution) model.
//!
//! A timetable maps each working day to each section's ordered list of
//! periods. Each period is an [`Assignment`] of teacher, subject and room
//! to a time-slot label. Constraint violations found while scoring are
//! recorded as [`Violation`]s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::WeekCalendar;

/// One scheduled period.
///
/// `teacher_id == None` marks an unstaffed placeholder period
/// (e.g. supervised library time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned teacher, or `None` for an unstaffed period.
    pub teacher_id: Option<String>,
    /// Subject code.
    pub subject_id: String,
    /// Classroom or lab name.
    pub room_id: String,
    /// Period label (see [`WeekCalendar::time_slots`]).
    pub time_slot: String,
}

impl Assignment {
    /// Creates a staffed period.
    pub fn new(
        teacher_id: impl Into<String>,
        subject_id: impl Into<String>,
        room_id: impl Into<String>,
        time_slot: impl Into<String>,
    ) -> Self {
        Self {
            teacher_id: Some(teacher_id.into()),
            subject_id: subject_id.into(),
            room_id: room_id.into(),
            time_slot: time_slot.into(),
        }
    }

    /// Creates an unstaffed placeholder period.
    pub fn unstaffed(
        subject_id: impl Into<String>,
        room_id: impl Into<String>,
        time_slot: impl Into<String>,
    ) -> Self {
        Self {
            teacher_id: None,
            subject_id: subject_id.into(),
            room_id: room_id.into(),
            time_slot: time_slot.into(),
        }
    }

    /// Whether a teacher supervises this period.
    #[inline]
    pub fn is_staffed(&self) -> bool {
        self.teacher_id.is_some()
    }

    /// Teacher ID as `&str`, if staffed.
    #[inline]
    pub fn teacher(&self) -> Option<&str> {
        self.teacher_id.as_deref()
    }
}

/// One day of a timetable: section → periods in slot order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Day name.
    pub day: String,
    /// Section name → assignments ordered by slot index.
    pub sections: BTreeMap<String, Vec<Assignment>>,
}

impl DaySchedule {
    /// Creates an empty day.
    pub fn new(day: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            sections: BTreeMap::new(),
        }
    }

    /// Total periods scheduled on this day across sections.
    pub fn period_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    /// Sorts every section's periods by slot index.
    ///
    /// Labels unknown to the calendar sort last, by label.
    pub fn sort_by_slot(&mut self, calendar: &WeekCalendar) {
        for periods in self.sections.values_mut() {
            periods.sort_by(|a, b| {
                let ka = calendar.slot_index(&a.time_slot).unwrap_or(usize::MAX);
                let kb = calendar.slot_index(&b.time_slot).unwrap_or(usize::MAX);
                ka.cmp(&kb).then_with(|| a.time_slot.cmp(&b.time_slot))
            });
        }
    }
}

/// Externally visible timetable: day → section → periods.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable(pub BTreeMap<String, BTreeMap<String, Vec<Assignment>>>);

impl Timetable {
    /// Creates an empty timetable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no day has been scheduled.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|d| d.values().all(Vec::is_empty))
    }

    /// Periods for a section on a day.
    pub fn periods(&self, day: &str, section: &str) -> &[Assignment] {
        self.0
            .get(day)
            .and_then(|d| d.get(section))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates `(day, section, assignment)` in day/section order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Assignment)> {
        self.0.iter().flat_map(|(day, sections)| {
            sections.iter().flat_map(move |(section, periods)| {
                periods
                    .iter()
                    .map(move |a| (day.as_str(), section.as_str(), a))
            })
        })
    }

    /// Number of periods across the week.
    pub fn assignment_count(&self) -> usize {
        self.iter().count()
    }
}

impl From<&[DaySchedule]> for Timetable {
    fn from(days: &[DaySchedule]) -> Self {
        Self(
            days.iter()
                .map(|d| (d.day.clone(), d.sections.clone()))
                .collect(),
        )
    }
}

/// Classification of soft-constraint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// A teacher holds two periods in the same day/slot.
    TeacherDoubleBooked,
    /// A classroom or lab hosts two periods in the same day/slot.
    RoomDoubleBooked,
    /// Section strength exceeds the assigned room's capacity.
    OverCapacity,
    /// Period placed in a slot the teacher did not prefer.
    UnpreferredSlot,
    /// Teacher's weekly periods exceed their cap (counted per excess hour).
    TeacherOverload,
    /// Period placed on a day outside the teacher's duty days.
    NonDutyDay,
    /// Period with no supervising teacher.
    UnstaffedPeriod,
    /// A section's weekly periods of a subject differ from the quota.
    QuotaMismatch,
    /// Teacher or lab booked in a cell the baseline already commits.
    BaselineConflict,
    /// Teacher's run of back-to-back periods exceeds the configured limit.
    ConsecutiveOverrun,
}

impl ViolationType {
    /// All variants, in reporting order.
    pub const ALL: [ViolationType; 10] = [
        ViolationType::TeacherDoubleBooked,
        ViolationType::RoomDoubleBooked,
        ViolationType::OverCapacity,
        ViolationType::UnpreferredSlot,
        ViolationType::TeacherOverload,
        ViolationType::NonDutyDay,
        ViolationType::UnstaffedPeriod,
        ViolationType::QuotaMismatch,
        ViolationType::BaselineConflict,
        ViolationType::ConsecutiveOverrun,
    ];
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TeacherDoubleBooked => "teacher_double_booked",
            Self::RoomDoubleBooked => "room_double_booked",
            Self::OverCapacity => "over_capacity",
            Self::UnpreferredSlot => "unpreferred_slot",
            Self::TeacherOverload => "teacher_overload",
            Self::NonDutyDay => "non_duty_day",
            Self::UnstaffedPeriod => "unstaffed_period",
            Self::QuotaMismatch => "quota_mismatch",
            Self::BaselineConflict => "baseline_conflict",
            Self::ConsecutiveOverrun => "consecutive_overrun",
        };
        f.write_str(name)
    }
}

/// A detected violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Teacher, room or section the violation concerns.
    pub entity_id: String,
    /// Number of occurrences charged.
    pub count: u32,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    /// Creates a violation record.
    pub fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        count: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            count,
            message: message.into(),
        }
    }
}
