use std::{fmt, str::FromStr};

use time::OffsetDateTime;

/// Which region-data series an observation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKind {
    Demand,
    NetGeneration,
}

impl SeriesKind {
    /// Value of the `facets[type][]` query parameter, also used as the
    /// column header for the series in exported tables.
    pub fn facet(self) -> &'static str {
        match self {
            Self::Demand => "D",
            Self::NetGeneration => "NG",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.facet())
    }
}

impl FromStr for SeriesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" => Ok(Self::Demand),
            "NG" => Ok(Self::NetGeneration),
            other => Err(format!("unknown series type '{other}'")),
        }
    }
}

/// One hourly reading in megawatts. `value` is `None` when the API
/// reported a null for the hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub ts: OffsetDateTime,
    pub kind: SeriesKind,
    pub value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_kind_round_trips_through_facet() {
        for kind in [SeriesKind::Demand, SeriesKind::NetGeneration] {
            assert_eq!(kind.facet().parse::<SeriesKind>(), Ok(kind));
        }
        assert!("TI".parse::<SeriesKind>().is_err());
    }
}
