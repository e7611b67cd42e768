use time::{macros::format_description, Date, OffsetDateTime, Time, UtcOffset};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("invalid period '{0}', expected YYYY-MM-DDTHH")]
    Invalid(String),
    #[error("window start {start} is after end {end}")]
    Reversed { start: String, end: String },
}

/// Parse an hourly `period` value as returned by the region-data API.
///
/// Accepted shapes:
/// - `2025-09-01T13` (UTC, the `hourly` frequency)
/// - `2025-09-01T13-04` / `2025-09-01T13+05:30` (explicit offset, the
///   `local-hourly` frequency)
pub fn parse_period(s: &str) -> Result<OffsetDateTime, PeriodError> {
    let invalid = || PeriodError::Invalid(s.to_string());

    let trimmed = s.trim();
    let (date_part, rest) = trimmed.split_once('T').ok_or_else(invalid)?;
    let date = Date::parse(date_part, format_description!("[year]-[month]-[day]"))
        .map_err(|_| invalid())?;

    let hour_part = rest.get(..2).ok_or_else(invalid)?;
    if !hour_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hour: u8 = hour_part.parse().map_err(|_| invalid())?;
    let time = Time::from_hms(hour, 0, 0).map_err(|_| invalid())?;

    let offset = match &rest[2..] {
        "" | "Z" => UtcOffset::UTC,
        tail => parse_offset(tail).ok_or_else(invalid)?,
    };

    Ok(date.with_time(time).assume_offset(offset))
}

fn parse_offset(tail: &str) -> Option<UtcOffset> {
    let (sign, digits) = match tail.as_bytes().first()? {
        b'+' => (1i8, &tail[1..]),
        b'-' => (-1i8, &tail[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i8>().ok()?, 0i8),
        4 => (digits[..2].parse::<i8>().ok()?, digits[2..].parse::<i8>().ok()?),
        _ => return None,
    };

    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

/// Render an instant in the hour-precision form the API expects for
/// `start` and `end`.
pub fn format_hour(ts: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour()
    )
}

/// Inclusive hour range requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl HourWindow {
    pub fn parse(start: &str, end: &str) -> Result<Self, PeriodError> {
        let start_ts = parse_period(start)?;
        let end_ts = parse_period(end)?;

        if start_ts > end_ts {
            return Err(PeriodError::Reversed {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(Self {
            start: start_ts,
            end: end_ts,
        })
    }

    pub fn start_param(&self) -> String {
        format_hour(self.start)
    }

    pub fn end_param(&self) -> String {
        format_hour(self.end)
    }
}
