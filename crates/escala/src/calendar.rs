use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::BoardError;

/// One calendar row, Sunday first. Only the first week is padded; a short
/// last week simply has fewer than seven entries.
pub type Week = Vec<Option<NaiveDate>>;

pub const DAYS_IN_WEEK: usize = 7;

/// Column headers, Sunday to Saturday
pub const WEEKDAY_NAMES: [&str; DAYS_IN_WEEK] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Portuguese name of a month (1-12)
pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
}

/// Every date of the given month, in order
pub fn generate(year: i32, month: u32) -> Result<Vec<NaiveDate>, BoardError> {
    if !(1..=12).contains(&month) {
        return Err(BoardError::InvalidMonth(month));
    }

    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return Err(BoardError::YearOutOfRange(year.to_string()));
    }

    Ok((1..=31)
        .map_while(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect())
}

/// Group dates into Sunday-first weeks
pub fn partition(dates: &[NaiveDate]) -> Vec<Week> {
    let Some(first) = dates.first() else {
        return Vec::new();
    };

    let mut weeks = Vec::new();
    let mut week: Week = vec![None; first.weekday().num_days_from_sunday() as usize];

    for &date in dates {
        if date.weekday().num_days_from_sunday() == 0 && !week.is_empty() {
            weeks.push(std::mem::take(&mut week));
        }
        week.push(Some(date));
    }

    if !week.is_empty() {
        weeks.push(week);
    }

    weeks
}

/// A generated month, replaced wholesale by each generate action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    #[serde(skip)]
    pub dates: Vec<NaiveDate>,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, BoardError> {
        let dates = generate(year, month)?;
        Ok(Self { year, month, dates })
    }

    pub fn weeks(&self) -> Vec<Week> {
        partition(&self.dates)
    }

    /// Grid title, e.g. "março 2024"
    pub fn title(&self) -> String {
        format!("{} {}", month_name(self.month).unwrap_or_default(), self.year)
    }
}
