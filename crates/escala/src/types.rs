use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Shift period of an assignment.
///
/// Labels other than "Diurno" and "Noturno" are kept verbatim: they render in
/// a neutral color and only collide with an identical label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Period {
    #[default]
    Day,
    Night,
    Other(String),
}

impl Period {
    pub fn label(&self) -> &str {
        match self {
            Period::Day => "Diurno",
            Period::Night => "Noturno",
            Period::Other(label) => label.as_str(),
        }
    }

    /// Text color used for labels of this period
    pub fn color(&self) -> &'static str {
        match self {
            Period::Day => "blue",
            Period::Night => "red",
            Period::Other(_) => "black",
        }
    }
}

impl FromStr for Period {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Diurno" => Period::Day,
            "Noturno" => Period::Night,
            other => Period::Other(other.to_string()),
        })
    }
}

impl From<String> for Period {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(period) => period,
            Err(never) => match never {},
        }
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A professional rostered on a shift for some days of the month
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Assignment {
    /// Display name (may be empty)
    pub name: String,

    pub period: Period,

    /// Days of the month, all > 0. Values past the end of the month never match.
    pub days: Vec<u32>,

    /// Paid in cash ("PG")
    #[serde(default)]
    pub paid_in_cash: bool,
}

impl Assignment {
    pub fn new(name: impl Into<String>, period: Period, days: Vec<u32>, paid_in_cash: bool) -> Self {
        Self {
            name: name.into(),
            period,
            days,
            paid_in_cash,
        }
    }

    pub fn is_active_on(&self, day: u32) -> bool {
        self.days.contains(&day)
    }

    /// Text shown inside a calendar cell
    pub fn label(&self) -> String {
        if self.paid_in_cash {
            format!("{} PG", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// A draft row of the input form, not yet submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct PendingRow {
    pub name: String,
    pub period: Period,

    /// Raw day list as typed, e.g. "1, 2 3"
    pub days: String,

    pub paid_in_cash: bool,
}
