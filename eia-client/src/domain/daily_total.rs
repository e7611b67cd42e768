use time::Date;

/// Sums over the complete hourly records of one calendar day (MWh).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTotal {
    pub day: Date,
    pub demand: f64,
    pub generation: f64,
    pub difference: f64,
}

impl DailyTotal {
    pub fn empty(day: Date) -> Self {
        Self {
            day,
            demand: 0.0,
            generation: 0.0,
            difference: 0.0,
        }
    }
}
