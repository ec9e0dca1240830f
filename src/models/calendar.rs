//! Week calendar model.
//!
//! Defines the working days and teaching periods of a week, and the
//! lookups between names/labels and availability-grid coordinates.
//!
//! # Grid Model
//! Availability grids are indexed `[day][slot]`:
//! - `day` is the 0-based row from `day_map`.
//! - `slot` is the 1-based period index from `time_slot_map`, minus one.
//!
//! # Precedence
//! `working_days` defines which days are scheduled and in what order.
//! `day_map` only supplies the grid row for each of them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default working days (Monday to Friday).
pub const DEFAULT_WORKING_DAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Default period labels for a seven-period teaching day.
pub const DEFAULT_TIME_SLOTS: [&str; 7] = [
    "9:00 - 9:55",
    "9:55 - 10:50",
    "11:10 - 12:05",
    "12:05 - 1:00",
    "1:20 - 2:15",
    "2:15 - 3:10",
    "3:30 - 4:25",
];

/// Working days and periods of a teaching week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCalendar {
    /// Scheduled days, in schedule order.
    pub working_days: Vec<String>,
    /// Day name → grid row (0-based).
    pub day_map: BTreeMap<String, usize>,
    /// Period index (1-based) → label.
    pub time_slots: BTreeMap<usize, String>,
    /// Period label → index (1-based).
    pub time_slot_map: BTreeMap<String, usize>,
}

impl Default for WeekCalendar {
    fn default() -> Self {
        Self::standard()
    }
}

impl WeekCalendar {
    /// Builds a calendar from explicit maps.
    pub fn new(
        working_days: Vec<String>,
        day_map: BTreeMap<String, usize>,
        time_slots: BTreeMap<usize, String>,
        time_slot_map: BTreeMap<String, usize>,
    ) -> Self {
        Self {
            working_days,
            day_map,
            time_slots,
            time_slot_map,
        }
    }

    /// Derives every map from ordered day names and period labels.
    ///
    /// Days get rows `0..n`, labels get indices `1..=m`.
    pub fn from_labels<D, L>(days: D, labels: L) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let working_days: Vec<String> = days.into_iter().map(Into::into).collect();
        let day_map = working_days
            .iter()
            .enumerate()
            .map(|(i, d)| (d.clone(), i))
            .collect();
        let time_slots: BTreeMap<usize, String> = labels
            .into_iter()
            .enumerate()
            .map(|(i, l)| (i + 1, l.into()))
            .collect();
        let time_slot_map = time_slots
            .iter()
            .map(|(i, l)| (l.clone(), *i))
            .collect();
        Self {
            working_days,
            day_map,
            time_slots,
            time_slot_map,
        }
    }

    /// Monday–Friday, seven periods per day.
    pub fn standard() -> Self {
        Self::from_labels(DEFAULT_WORKING_DAYS, DEFAULT_TIME_SLOTS)
    }

    /// Replaces the working-day list, keeping the existing grid rows.
    ///
    /// Days missing from `day_map` are appended after the current rows.
    pub fn with_working_days<D>(mut self, days: D) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
    {
        self.working_days = days.into_iter().map(Into::into).collect();
        let mut next_row = self.day_map.values().map(|r| r + 1).max().unwrap_or(0);
        for day in &self.working_days {
            if !self.day_map.contains_key(day) {
                self.day_map.insert(day.clone(), next_row);
                next_row += 1;
            }
        }
        self
    }

    /// Number of grid rows (one per working day).
    #[inline]
    pub fn day_count(&self) -> usize {
        self.working_days.len()
    }

    /// Number of periods per day.
    #[inline]
    pub fn slots_per_day(&self) -> usize {
        self.time_slots.len()
    }

    /// Total teaching periods in the week.
    #[inline]
    pub fn periods_per_week(&self) -> usize {
        self.day_count() * self.slots_per_day()
    }

    /// Grid row for a day name.
    pub fn day_index(&self, day: &str) -> Option<usize> {
        self.day_map.get(day).copied()
    }

    /// 1-based period index for a label.
    pub fn slot_index(&self, label: &str) -> Option<usize> {
        self.time_slot_map.get(label).copied()
    }

    /// Label for a 1-based period index.
    pub fn slot_label(&self, index: usize) -> Option<&str> {
        self.time_slots.get(&index).map(|s| s.as_str())
    }

    /// Grid coordinates `(row, column)` for a day name and period label.
    pub fn cell(&self, day: &str, label: &str) -> Option<(usize, usize)> {
        let row = self.day_index(day)?;
        let idx = self.slot_index(label)?;
        idx.checked_sub(1).map(|col| (row, col))
    }

    /// Period indices in ascending order.
    pub fn slot_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.time_slots.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_week() {
        let cal = WeekCalendar::standard();
        assert_eq!(cal.day_count(), 5);
        assert_eq!(cal.slots_per_day(), 7);
        assert_eq!(cal.periods_per_week(), 35);
        assert_eq!(cal.day_index("Wednesday"), Some(2));
        assert_eq!(cal.slot_index("9:00 - 9:55"), Some(1));
        assert_eq!(cal.slot_label(7), Some("3:30 - 4:25"));
    }

    #[test]
    fn test_cell_lookup() {
        let cal = WeekCalendar::standard();
        assert_eq!(cal.cell("Tuesday", "11:10 - 12:05"), Some((1, 2)));
        assert_eq!(cal.cell("Sunday", "11:10 - 12:05"), None);
        assert_eq!(cal.cell("Tuesday", "midnight"), None);
    }

    #[test]
    fn test_with_working_days_appends_unknown_rows() {
        let cal = WeekCalendar::from_labels(["Mon", "Tue"], ["P1", "P2"])
            .with_working_days(["Mon", "Tue", "Sat"]);
        assert_eq!(cal.day_count(), 3);
        assert_eq!(cal.day_index("Sat"), Some(2));
        assert_eq!(cal.day_index("Mon"), Some(0));
    }

    #[test]
    fn test_slot_indices_ascending() {
        let cal = WeekCalendar::from_labels(["D"], ["a", "b", "c"]);
        let idx: Vec<usize> = cal.slot_indices().collect();
        assert_eq!(idx, vec![1, 2, 3]);
    }

    #[test]
    fn test_serde_roundtrip_preserves_maps() {
        let cal = WeekCalendar::standard();
        let json = serde_json::to_string(&cal).unwrap();
        let back: WeekCalendar = serde_json::from_str(&json).unwrap();
        assert_eq!(cal, back);
    }
}
