//! Academic timetabling for the U-Engine ecosystem.
//!
//! Assigns teachers, subjects, rooms and time slots to class sections for
//! a teaching week, using a genetic algorithm over whole-week candidate
//! timetables. Constraint violations are soft: the search optimizes
//! around them instead of rejecting input.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `ProblemInstance`, `WeekCalendar`,
//!   `AvailabilityMatrix`, `Assignment`, `DaySchedule`, `Timetable`,
//!   `Violation`, student attribute rules
//! - **`ga`**: Chromosome generator, fitness evaluator, selection,
//!   crossover/mutation operators and the `TimetableEngine`
//! - **`config`**: One versioned `EngineConfig` (defaults, penalties, GA)
//! - **`validation`**: Input integrity checks run before the first generation
//! - **`request`**: Flat request type and the `generate_timetable` entry point
//! - **`error`**: Crate error type
//!
//! # Example
//!
//! ```
//! use u_timetable::config::EngineConfig;
//! use u_timetable::request::{generate_timetable, TimetableRequest};
//!
//! let mut request = TimetableRequest::default();
//! request.subject_teachers.insert("MATH".into(), vec!["T1".into()]);
//! request.subject_quota.insert("MATH".into(), 4);
//! request.sections.insert("A".into(), 35);
//! request.classrooms.insert("R1".into(), 40);
//! request.generations = Some(3);
//!
//! let output = generate_timetable(&request, &EngineConfig::default()).unwrap();
//! assert_eq!(output.timetable.assignment_count(), 4);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

pub mod config;
pub mod error;
pub mod ga;
pub mod models;
pub mod request;
pub mod validation;

pub use error::{Result, TimetableError};
