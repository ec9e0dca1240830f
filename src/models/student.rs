//! Student attribute rules and section formation.
//!
//! Attribute rules classify students by named predicates. Each rule has a
//! fixed power-of-two weight, so the sum of matching weights is a bitmask
//! code; students sharing a code are grouped into the same sections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A student record used for section formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Unique student identifier.
    pub id: String,
    /// Cumulative grade point average, if known.
    pub cgpa: Option<f64>,
    /// Lives in campus housing.
    pub hostler: bool,
}

impl Student {
    /// Creates a day-scholar with no recorded CGPA.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cgpa: None,
            hostler: false,
        }
    }

    /// Sets the CGPA.
    pub fn with_cgpa(mut self, cgpa: f64) -> Self {
        self.cgpa = Some(cgpa);
        self
    }

    /// Marks the student as a hostler.
    pub fn hostler(mut self) -> Self {
        self.hostler = true;
        self
    }
}

/// A named attribute predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentAttribute {
    /// CGPA at or above the threshold.
    GoodCgpa { threshold: f64 },
    /// Lives in campus housing.
    Hostler,
}

impl StudentAttribute {
    /// Bit weight of this attribute in the classification code.
    pub fn weight(&self) -> u32 {
        match self {
            Self::GoodCgpa { .. } => 1,
            Self::Hostler => 2,
        }
    }

    /// Whether the student satisfies this attribute.
    pub fn matches(&self, student: &Student) -> bool {
        match self {
            Self::GoodCgpa { threshold } => student.cgpa.is_some_and(|g| g >= *threshold),
            Self::Hostler => student.hostler,
        }
    }
}

/// Sums the weights of every rule the student satisfies.
pub fn attribute_code(student: &Student, rules: &[StudentAttribute]) -> u32 {
    rules
        .iter()
        .filter(|r| r.matches(student))
        .map(StudentAttribute::weight)
        .fold(0, |acc, w| acc | w)
}

/// Spreadsheet-style section label: `A`..`Z`, `AA`, `AB`, ...
pub fn section_label(mut index: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// Groups students into sections of at most `class_strength`.
///
/// Students are ordered by attribute code, then ID, and chunked in that
/// order, so each section is as homogeneous as the roster allows.
/// A `class_strength` of zero is treated as one.
pub fn partition_into_sections(
    students: &[Student],
    rules: &[StudentAttribute],
    class_strength: usize,
) -> BTreeMap<String, Vec<Student>> {
    let mut ordered: Vec<(u32, &Student)> = students
        .iter()
        .map(|s| (attribute_code(s, rules), s))
        .collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

    ordered
        .chunks(class_strength.max(1))
        .enumerate()
        .map(|(i, chunk)| {
            (
                section_label(i),
                chunk.iter().map(|(_, s)| (*s).clone()).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<StudentAttribute> {
        vec![
            StudentAttribute::GoodCgpa { threshold: 8.0 },
            StudentAttribute::Hostler,
        ]
    }

    #[test]
    fn test_attribute_code() {
        let r = rules();
        assert_eq!(attribute_code(&Student::new("s1"), &r), 0);
        assert_eq!(attribute_code(&Student::new("s2").with_cgpa(8.5), &r), 1);
        assert_eq!(attribute_code(&Student::new("s3").hostler(), &r), 2);
        assert_eq!(
            attribute_code(&Student::new("s4").with_cgpa(9.0).hostler(), &r),
            3
        );
        assert_eq!(attribute_code(&Student::new("s5").with_cgpa(7.9), &r), 0);
    }

    #[test]
    fn test_section_labels() {
        assert_eq!(section_label(0), "A");
        assert_eq!(section_label(25), "Z");
        assert_eq!(section_label(26), "AA");
        assert_eq!(section_label(27), "AB");
        assert_eq!(section_label(52), "BA");
    }

    #[test]
    fn test_partition_groups_by_code() {
        let students = vec![
            Student::new("s1").hostler(),
            Student::new("s2"),
            Student::new("s3").hostler(),
            Student::new("s4"),
            Student::new("s5").with_cgpa(9.1),
        ];
        let sections = partition_into_sections(&students, &rules(), 2);
        assert_eq!(sections.len(), 3);
        let a: Vec<&str> = sections["A"].iter().map(|s| s.id.as_str()).collect();
        assert_eq!(a, vec!["s2", "s4"]);
        let c: Vec<&str> = sections["C"].iter().map(|s| s.id.as_str()).collect();
        assert_eq!(c, vec!["s3"]);
    }

    #[test]
    fn test_partition_zero_strength() {
        let students = vec![Student::new("a"), Student::new("b")];
        let sections = partition_into_sections(&students, &[], 0);
        assert_eq!(sections.len(), 2);
    }
}
