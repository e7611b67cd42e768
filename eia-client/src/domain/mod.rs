mod daily_total;
mod hourly_record;
mod observation;
mod period;

pub use daily_total::DailyTotal;
pub use hourly_record::{near_capacity, HourlyRecord, YearMonth};
pub use observation::{Observation, SeriesKind};
pub use period::{format_hour, parse_period, HourWindow, PeriodError};
