//! Availability matrix model.
//!
//! Per-resource boolean grids over the week. `true` means the resource
//! is free in that `[day][slot]` cell; `false` means it is committed.
//! Teachers and labs each get one matrix; classrooms get a scratch matrix
//! inside the generator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{DaySchedule, WeekCalendar};

/// Which assignment field a matrix tracks when folding a schedule in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Keyed by `Assignment::teacher_id`.
    Teacher,
    /// Keyed by `Assignment::room_id`.
    Room,
}

/// Resource ID → `grid[day][slot]` of free flags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityMatrix {
    grids: BTreeMap<String, Vec<Vec<bool>>>,
}

impl AvailabilityMatrix {
    /// Creates an empty matrix (no resources).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an all-free matrix for the given resources.
    pub fn all_free<I>(resources: I, days: usize, slots: usize) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let grids = resources
            .into_iter()
            .map(|r| (r.into(), vec![vec![true; slots]; days]))
            .collect();
        Self { grids }
    }

    /// Wraps pre-built grids.
    pub fn from_grids(grids: BTreeMap<String, Vec<Vec<bool>>>) -> Self {
        Self { grids }
    }

    /// Adds a resource with a specific grid, replacing any previous one.
    pub fn with_grid(mut self, resource: impl Into<String>, grid: Vec<Vec<bool>>) -> Self {
        self.grids.insert(resource.into(), grid);
        self
    }

    /// Adds an all-free grid for `resource` if it is not tracked yet.
    pub fn ensure(&mut self, resource: &str, days: usize, slots: usize) {
        if !self.grids.contains_key(resource) {
            self.grids
                .insert(resource.to_string(), vec![vec![true; slots]; days]);
        }
    }

    /// Whether a resource is tracked.
    pub fn contains(&self, resource: &str) -> bool {
        self.grids.contains_key(resource)
    }

    /// Tracked resource IDs in sorted order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.grids.keys().map(|k| k.as_str())
    }

    /// Number of tracked resources.
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Whether no resources are tracked.
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Grid for a resource.
    pub fn grid(&self, resource: &str) -> Option<&[Vec<bool>]> {
        self.grids.get(resource).map(|g| g.as_slice())
    }

    /// Whether `resource` is free at `[day][slot]`.
    ///
    /// Untracked resources and out-of-range cells read as free.
    pub fn is_free(&self, resource: &str, day: usize, slot: usize) -> bool {
        self.grids
            .get(resource)
            .and_then(|g| g.get(day))
            .and_then(|row| row.get(slot))
            .copied()
            .unwrap_or(true)
    }

    /// Marks `[day][slot]` busy. Returns `false` if the cell does not exist.
    pub fn mark_busy(&mut self, resource: &str, day: usize, slot: usize) -> bool {
        self.set(resource, day, slot, false)
    }

    /// Marks `[day][slot]` free. Returns `false` if the cell does not exist.
    pub fn release(&mut self, resource: &str, day: usize, slot: usize) -> bool {
        self.set(resource, day, slot, true)
    }

    fn set(&mut self, resource: &str, day: usize, slot: usize, value: bool) -> bool {
        match self
            .grids
            .get_mut(resource)
            .and_then(|g| g.get_mut(day))
            .and_then(|row| row.get_mut(slot))
        {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Number of busy cells for a resource.
    pub fn busy_count(&self, resource: &str) -> usize {
        self.grids
            .get(resource)
            .map(|g| g.iter().flatten().filter(|free| !**free).count())
            .unwrap_or(0)
    }

    /// Number of busy cells across all resources.
    pub fn total_busy(&self) -> usize {
        self.grids
            .values()
            .map(|g| g.iter().flatten().filter(|free| !**free).count())
            .sum()
    }

    /// Free slot columns for a resource on a day.
    pub fn free_slots(&self, resource: &str, day: usize) -> Vec<usize> {
        match self.grids.get(resource).and_then(|g| g.get(day)) {
            Some(row) => row
                .iter()
                .enumerate()
                .filter(|(_, free)| **free)
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Cell-wise AND with another matrix: a cell stays free only if free in both.
    ///
    /// Resources only present in `other` are copied in.
    pub fn intersect(&mut self, other: &AvailabilityMatrix) {
        for (resource, grid) in &other.grids {
            match self.grids.get_mut(resource) {
                Some(mine) => {
                    for (row, other_row) in mine.iter_mut().zip(grid) {
                        for (cell, other_cell) in row.iter_mut().zip(other_row) {
                            *cell = *cell && *other_cell;
                        }
                    }
                }
                None => {
                    self.grids.insert(resource.clone(), grid.clone());
                }
            }
        }
    }

    /// Checks every grid is `days × slots`.
    ///
    /// Returns the IDs of resources whose grid has other dimensions.
    pub fn mismatched(&self, days: usize, slots: usize) -> Vec<&str> {
        self.grids
            .iter()
            .filter(|(_, g)| g.len() != days || g.iter().any(|row| row.len() != slots))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Marks every period of `days` busy for the resource it names.
    ///
    /// Only resources already tracked are updated; unknown days or
    /// labels are skipped. Returns the number of cells committed.
    pub fn fold_schedule(
        &mut self,
        days: &[DaySchedule],
        calendar: &WeekCalendar,
        kind: ResourceKind,
    ) -> usize {
        let mut committed = 0;
        for day in days {
            let Some(row) = calendar.day_index(&day.day) else {
                continue;
            };
            for assignment in day.sections.values().flatten() {
                let resource = match kind {
                    ResourceKind::Teacher => match assignment.teacher() {
                        Some(t) => t,
                        None => continue,
                    },
                    ResourceKind::Room => assignment.room_id.as_str(),
                };
                let Some(col) = calendar
                    .slot_index(&assignment.time_slot)
                    .and_then(|i| i.checked_sub(1))
                else {
                    continue;
                };
                if self.mark_busy(resource, row, col) {
                    committed += 1;
                }
            }
        }
        committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Assignment;

    #[test]
    fn test_all_free_dimensions() {
        let m = AvailabilityMatrix::all_free(["T1", "T2"], 5, 7);
        assert_eq!(m.len(), 2);
        assert!(m.mismatched(5, 7).is_empty());
        assert_eq!(m.mismatched(6, 7), vec!["T1", "T2"]);
        assert_eq!(m.total_busy(), 0);
    }

    #[test]
    fn test_mark_and_release() {
        let mut m = AvailabilityMatrix::all_free(["T1"], 2, 3);
        assert!(m.mark_busy("T1", 1, 2));
        assert!(!m.is_free("T1", 1, 2));
        assert_eq!(m.busy_count("T1"), 1);
        assert_eq!(m.free_slots("T1", 1), vec![0, 1]);
        assert!(m.release("T1", 1, 2));
        assert!(m.is_free("T1", 1, 2));
        assert!(!m.mark_busy("T1", 9, 0));
        assert!(!m.mark_busy("nobody", 0, 0));
    }

    #[test]
    fn test_untracked_reads_free() {
        let m = AvailabilityMatrix::new();
        assert!(m.is_free("ghost", 0, 0));
        assert!(m.free_slots("ghost", 0).is_empty());
    }

    #[test]
    fn test_ensure_does_not_overwrite() {
        let mut m = AvailabilityMatrix::all_free(["T1"], 1, 2);
        m.mark_busy("T1", 0, 0);
        m.ensure("T1", 1, 2);
        m.ensure("T2", 1, 2);
        assert!(!m.is_free("T1", 0, 0));
        assert!(m.contains("T2"));
    }

    #[test]
    fn test_intersect() {
        let mut a = AvailabilityMatrix::all_free(["T1"], 1, 2);
        let mut b = AvailabilityMatrix::all_free(["T1", "T2"], 1, 2);
        b.mark_busy("T1", 0, 1);
        b.mark_busy("T2", 0, 0);
        a.intersect(&b);
        assert!(a.is_free("T1", 0, 0));
        assert!(!a.is_free("T1", 0, 1));
        assert!(!a.is_free("T2", 0, 0));
    }

    #[test]
    fn test_fold_schedule() {
        let cal = WeekCalendar::standard();
        let mut day = DaySchedule::new("Tuesday");
        day.sections.insert(
            "A".into(),
            vec![
                Assignment::new("T1", "MATH", "L1", "9:55 - 10:50"),
                Assignment::unstaffed("LIB", "R1", "9:00 - 9:55"),
            ],
        );
        let days = vec![day];

        let mut teachers = AvailabilityMatrix::all_free(["T1"], 5, 7);
        assert_eq!(teachers.fold_schedule(&days, &cal, ResourceKind::Teacher), 1);
        assert!(!teachers.is_free("T1", 1, 1));

        let mut labs = AvailabilityMatrix::all_free(["L1"], 5, 7);
        assert_eq!(labs.fold_schedule(&days, &cal, ResourceKind::Room), 1);
        assert!(!labs.is_free("L1", 1, 1));
        assert!(!labs.contains("R1"));
    }
}
