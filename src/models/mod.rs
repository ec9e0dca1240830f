//! Timetabling domain models.
//!
//! Provides the data types for describing an academic timetabling
//! problem and its solutions.
//!
//! # Domain Mappings
//!
//! | u-timetable | College | School | Training Center |
//! |-------------|---------|--------|-----------------|
//! | Section | Class section | Homeroom | Cohort |
//! | Subject | Course code | Subject | Module |
//! | Classroom / Lab | Lecture hall / Lab | Room / Science lab | Room / Workshop |
//! | Timetable | Weekly timetable | Weekly timetable | Course plan |

mod availability;
mod calendar;
mod problem;
mod schedule;
mod student;

pub use availability::{AvailabilityMatrix, ResourceKind};
pub use calendar::{WeekCalendar, DEFAULT_TIME_SLOTS, DEFAULT_WORKING_DAYS};
pub use problem::{ProblemInstance, RoomKind};
pub use schedule::{Assignment, DaySchedule, Timetable, Violation, ViolationType};
pub use student::{
    attribute_code, partition_into_sections, section_label, Student, StudentAttribute,
};
