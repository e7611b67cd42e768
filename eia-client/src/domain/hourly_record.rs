use std::fmt;

use time::{Date, Month, OffsetDateTime};

/// `true` when demand has reached `threshold` times generation.
///
/// A missing side never flags.
pub fn near_capacity(demand: Option<f64>, generation: Option<f64>, threshold: f64) -> bool {
    match (demand, generation) {
        (Some(d), Some(g)) => d >= threshold * g,
        _ => false,
    }
}

/// Demand and generation aligned on one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyRecord {
    pub ts: OffsetDateTime,
    pub demand: Option<f64>,
    pub generation: Option<f64>,
    /// generation - demand, missing unless both sides are present.
    pub difference: Option<f64>,
    pub near_capacity: bool,
}

impl HourlyRecord {
    pub fn new(ts: OffsetDateTime, demand: Option<f64>, generation: Option<f64>, threshold: f64) -> Self {
        let difference = match (demand, generation) {
            (Some(d), Some(g)) => Some(g - d),
            _ => None,
        };

        Self {
            ts,
            demand,
            generation,
            difference,
            near_capacity: near_capacity(demand, generation, threshold),
        }
    }

    pub fn day(&self) -> Date {
        self.ts.date()
    }

    pub fn hour(&self) -> u8 {
        self.ts.hour()
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.ts.date())
    }

    /// Both readings present; only complete records enter daily totals.
    pub fn is_complete(&self) -> bool {
        self.demand.is_some() && self.generation.is_some()
    }
}

/// Calendar month key, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: Month,
}

impl YearMonth {
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

// `Month` orders by discriminant, so the derived `Ord` sorts chronologically.
impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}
