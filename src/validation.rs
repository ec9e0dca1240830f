//! Input validation for timetabling problems.
//!
//! Checks that a problem instance and its availability matrices are
//! well-formed enough for the search to run. Detects:
//! - Missing capability map, sections or rooms
//! - Rooms declared both as classroom and lab
//! - Inconsistent calendar maps
//! - Availability grids whose dimensions differ from the calendar
//!
//! Constraint *violations* (overload, double-booking, ...) are not
//! validation errors; the search optimizes around them.

use std::collections::BTreeSet;
use std::fmt;

use crate::models::{AvailabilityMatrix, ProblemInstance, WeekCalendar};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// No subject has any capable teacher.
    EmptyCapabilityMap,
    /// No sections to schedule.
    NoSections,
    /// Neither classrooms nor labs exist.
    NoRooms,
    /// The same name is used by a classroom and a lab.
    DuplicateId,
    /// Working days, day map and slot maps disagree.
    CalendarMismatch,
    /// An availability grid is not `days × slots`.
    MatrixDimensionMismatch,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates a problem instance and its baseline availability.
///
/// Checks:
/// 1. At least one subject has a capable teacher
/// 2. At least one section
/// 3. At least one classroom or lab
/// 4. No room is both classroom and lab
/// 5. Calendar maps are consistent (see [`validate_calendar`])
/// 6. Every teacher/lab grid is `working_days × time_slots`
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_problem(
    problem: &ProblemInstance,
    teacher_availability: &AvailabilityMatrix,
    lab_availability: &AvailabilityMatrix,
) -> ValidationResult {
    let mut errors = Vec::new();

    if problem.subject_teachers.values().all(Vec::is_empty) {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyCapabilityMap,
            "Teacher-subject capability map is empty",
        ));
    }

    if problem.sections.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoSections,
            "No sections to schedule",
        ));
    }

    if problem.classrooms.is_empty() && problem.labs.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoRooms,
            "No classrooms or labs available",
        ));
    }

    for room in problem.classrooms.keys() {
        if problem.labs.contains_key(room) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Room '{room}' is declared as both classroom and lab"),
            ));
        }
    }

    if let Err(mut calendar_errors) = validate_calendar(&problem.calendar) {
        errors.append(&mut calendar_errors);
    }

    let days = problem.calendar.day_count();
    let slots = problem.calendar.slots_per_day();
    for (label, matrix) in [("teacher", teacher_availability), ("lab", lab_availability)] {
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
        Err(errors)
    }
}

/// Validates calendar consistency.
///
/// Checks:
/// 1. At least one working day and one period
/// 2. Every working day has a row in `day_map`, rows are distinct and
///    below the number of working days
/// 3. Period indices are exactly `1..=n`
/// 4. `time_slot_map` is the inverse of `time_slots`
pub fn validate_calendar(calendar: &WeekCalendar) -> ValidationResult {
    let mut errors = Vec::new();
    let mismatch = |msg: String| ValidationError::new(ValidationErrorKind::CalendarMismatch, msg);

    if calendar.working_days.is_empty() {
        errors.push(mismatch("No working days".into()));
    }
    if calendar.time_slots.is_empty() {
        errors.push(mismatch("No time slots".into()));
    }

    let days = calendar.day_count();
    let mut rows = BTreeSet::new();
    for day in &calendar.working_days {
        match calendar.day_index(day) {
            None => errors.push(mismatch(format!("Working day '{day}' missing from day map"))),
            Some(row) if row >= days => errors.push(mismatch(format!(
                "Day '{day}' maps to row {row}, outside 0..{days}"
            ))),
            Some(row) => {
                if !rows.insert(row) {
                    errors.push(mismatch(format!("Day '{day}' reuses row {row}")));
                }
            }
        }
    }

    let n = calendar.slots_per_day();
    if !calendar.time_slots.keys().copied().eq(1..=n) {
        errors.push(mismatch(format!("Time slot indices are not 1..={n}")));
    }

    let inverse_ok = calendar.time_slot_map.len() == n
        && calendar
            .time_slots
            .iter()
            .all(|(idx, label)| calendar.slot_index(label) == Some(*idx));
    if !inverse_ok {
        errors.push(mismatch(
            "Time slot label map is not the inverse of the index map".into(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_problem() -> ProblemInstance {
        ProblemInstance::new()
            .with_subject("MATH", 3, ["T1"])
            .with_section("A", 30)
            .with_classroom("R1", 40)
    }

    fn teachers() -> AvailabilityMatrix {
        AvailabilityMatrix::all_free(["T1"], 5, 7)
    }

    #[test]
    fn test_valid_input() {
        let p = sample_problem();
        assert!(validate_problem(&p, &teachers(), &AvailabilityMatrix::new()).is_ok());
    }

    #[test]
    fn test_empty_capability_map() {
        let p = ProblemInstance::new()
            .with_subject("MATH", 3, Vec::<String>::new())
            .with_section("A", 30)
            .with_classroom("R1", 40);
        let errors = validate_problem(&p, &teachers(), &AvailabilityMatrix::new()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptyCapabilityMap));
    }

    #[test]
    fn test_no_sections_and_no_rooms() {
        let p = ProblemInstance::new().with_subject("MATH", 3, ["T1"]);
        let errors = validate_problem(&p, &teachers(), &AvailabilityMatrix::new()).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::NoSections));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::NoRooms));
        assert!(errors.len() >= 2);
    }

    #[test]
    fn test_room_both_classroom_and_lab() {
        let p = sample_problem().with_lab("R1", 20);
        let errors = validate_problem(&p, &teachers(), &AvailabilityMatrix::new()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("R1")));
    }

    #[test]
    fn test_matrix_dimension_mismatch() {
        let p = sample_problem();
        let bad = AvailabilityMatrix::all_free(["T1"], 6, 7);
        let labs = AvailabilityMatrix::all_free(["L1"], 5, 3);
        let errors = validate_problem(&p, &bad, &labs).unwrap_err();
        let dims: Vec<_> = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::MatrixDimensionMismatch)
            .collect();
        assert_eq!(dims.len(), 2);
    }

    #[test]
    fn test_calendar_missing_day() {
        let mut cal = WeekCalendar::standard();
        cal.day_map.remove("Friday");
        let errors = validate_calendar(&cal).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("Friday")));
    }

    #[test]
    fn test_calendar_bad_slot_indices() {
        let mut slots = BTreeMap::new();
        slots.insert(0, "early".to_string());
        slots.insert(1, "late".to_string());
        let map = slots.iter().map(|(k, v)| (v.clone(), *k)).collect();
        let cal = WeekCalendar::new(
            vec!["Mon".into()],
            [("Mon".to_string(), 0)].into_iter().collect(),
            slots,
            map,
        );
        let errors = validate_calendar(&cal).unwrap_err();
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::CalendarMismatch));
        assert!(errors.iter().any(|e| e.message.contains("1..=2")));
    }

    #[test]
    fn test_calendar_duplicate_rows() {
        let mut cal = WeekCalendar::standard();
        cal.day_map.insert("Friday".into(), 0);
        let errors = validate_calendar(&cal).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("reuses row 0")));
    }

    #[test]
    fn test_standard_calendar_valid() {
        assert!(validate_calendar(&WeekCalendar::standard()).is_ok());
    }
}
