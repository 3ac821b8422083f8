//! Schedule board state
//!
//! Two independently owned containers:
//! - `ScheduleBoard`: the generated month and the committed assignments
//! - `PendingForm`: draft rows of the input form, discarded on submission

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::calendar::{CalendarMonth, Week};
use crate::error::BoardError;
use crate::parser::parse_days;
use crate::types::{Assignment, PendingRow};

/// True if any two distinct assignments share the same period
pub fn has_conflict(assignments: &[&Assignment]) -> bool {
    assignments.iter().enumerate().any(|(idx, assignment)| {
        assignments[idx + 1..]
            .iter()
            .any(|other| other.period == assignment.period)
    })
}

/// A rendered calendar cell
#[derive(Debug, Clone)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub assignments: Vec<&'a Assignment>,
    pub conflict: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleBoard {
    month: Option<CalendarMonth>,
    assignments: Vec<Assignment>,
}

impl ScheduleBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn month(&self) -> Option<&CalendarMonth> {
        self.month.as_ref()
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Replace the current month. On error the previous month is kept.
    pub fn generate(&mut self, year: i32, month: u32) -> Result<(), BoardError> {
        let generated = CalendarMonth::new(year, month)?;
        info!(year, month, days = generated.dates.len(), "Calendar generated");
        self.month = Some(generated);
        Ok(())
    }

    pub fn add(&mut self, assignment: Assignment) {
        debug!(name = %assignment.name, period = %assignment.period, "Assignment added");
        self.assignments.push(assignment);
    }

    /// Validate a batch of pending rows and append the valid ones.
    ///
    /// Rows without a single valid day are dropped. If none survives, nothing
    /// is stored and `NoValidDays` is returned. Returns the number appended.
    pub fn add_many(&mut self, rows: &[PendingRow]) -> Result<usize, BoardError> {
        let batch: Vec<Assignment> = rows
            .iter()
            .filter_map(|row| {
                let days = parse_days(&row.days);
                if days.is_empty() {
                    debug!(name = %row.name, days = %row.days, "Dropping row without valid days");
                    return None;
                }
                Some(Assignment::new(
                    row.name.clone(),
                    row.period.clone(),
                    days,
                    row.paid_in_cash,
                ))
            })
            .collect();

        if batch.is_empty() {
            return Err(BoardError::NoValidDays);
        }

        let count = batch.len();
        self.assignments.extend(batch);
        info!(
            added = count,
            dropped = rows.len() - count,
            total = self.assignments.len(),
            "Assignments submitted"
        );
        Ok(count)
    }

    /// Assignments active on a day of the month, in insertion order
    pub fn for_day(&self, day: u32) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|assignment| assignment.is_active_on(day))
            .collect()
    }

    /// Drop both the generated month and every assignment
    pub fn clear(&mut self) {
        self.month = None;
        self.assignments.clear();
        info!("Board cleared");
    }

    pub fn weeks(&self) -> Vec<Week> {
        self.month.as_ref().map(CalendarMonth::weeks).unwrap_or_default()
    }

    /// Weeks of the current month with each date resolved to its assignments
    pub fn cells(&self) -> Vec<Vec<Option<DayCell<'_>>>> {
        self.weeks()
            .into_iter()
            .map(|week| {
                week.into_iter()
                    .map(|slot| {
                        slot.map(|date| {
                            let assignments = self.for_day(date.day());
                            let conflict = has_conflict(&assignments);
                            DayCell {
                                date,
                                assignments,
                                conflict,
                            }
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Draft rows of the input form. Always starts with one blank row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingForm {
    rows: Vec<PendingRow>,
}

impl Default for PendingForm {
    fn default() -> Self {
        Self {
            rows: vec![PendingRow::default()],
        }
    }
}

impl PendingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[PendingRow] {
        &self.rows
    }

    pub fn add_row(&mut self) {
        self.rows.push(PendingRow::default());
    }

    /// Remove a draft row. The form may end up with no rows at all.
    pub fn remove_row(&mut self, index: usize) -> Option<PendingRow> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn update_row(&mut self, index: usize, row: PendingRow) {
        if let Some(slot) = self.rows.get_mut(index) {
            *slot = row;
        }
    }

    /// Replace every draft with the values posted by the browser
    pub fn replace_rows(&mut self, rows: Vec<PendingRow>) {
        self.rows = rows;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move the drafts into the board. The form is reset only on success.
    pub fn submit(&mut self, board: &mut ScheduleBoard) -> Result<usize, BoardError> {
        let count = board.add_many(&self.rows)?;
        self.reset();
        Ok(count)
    }
}
