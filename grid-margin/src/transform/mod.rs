use std::collections::{BTreeMap, HashSet};

use eia_client::domain::{DailyTotal, HourlyRecord, Observation, YearMonth};
use time::OffsetDateTime;

/// Drop repeated timestamps, keeping the first occurrence and the original order.
///
/// The API can report the same hour more than once (notably when no
/// respondent facet is set); joining on a non-unique key would multiply rows.
pub fn dedup_first(observations: &[Observation]) -> Vec<Observation> {
    let mut seen: HashSet<OffsetDateTime> = HashSet::with_capacity(observations.len());
    let deduped: Vec<Observation> = observations
        .iter()
        .filter(|o| seen.insert(o.ts))
        .copied()
        .collect();

    let dropped = observations.len() - deduped.len();
    if dropped > 0 {
        metrics::counter!("duplicate_observations_dropped_total").increment(dropped as u64);
        tracing::debug!(dropped, "dropped duplicate observations");
    }

    deduped
}

/// Outer-join demand and generation on timestamp.
///
/// Both inputs are deduplicated first. Hours present in only one series
/// produce a record with the other side missing. Output is sorted by
/// timestamp.
pub fn merge_series(demand: &[Observation], generation: &[Observation], threshold: f64) -> Vec<HourlyRecord> {
    let mut aligned: BTreeMap<OffsetDateTime, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for obs in dedup_first(demand) {
        aligned.entry(obs.ts).or_default().0 = obs.value;
    }
    for obs in dedup_first(generation) {
        aligned.entry(obs.ts).or_default().1 = obs.value;
    }

    aligned
        .into_iter()
        .map(|(ts, (d, g))| HourlyRecord::new(ts, d, g, threshold))
        .collect()
}

/// Sum complete records per calendar day.
///
/// Every day between the first and last record is present; a day with no
/// complete record is reported with zero totals.
pub fn daily_totals(records: &[HourlyRecord]) -> Vec<DailyTotal> {
    let (Some(first), Some(last)) = (
        records.iter().map(HourlyRecord::day).min(),
        records.iter().map(HourlyRecord::day).max(),
    ) else {
        return Vec::new();
    };

    let mut days: BTreeMap<time::Date, DailyTotal> = BTreeMap::new();
    let mut day = first;
    loop {
        days.insert(day, DailyTotal::empty(day));
        match day.next_day() {
            Some(next) if next <= last => day = next,
            _ => break,
        }
    }

    for r in records {
        if let (Some(d), Some(g), Some(diff)) = (r.demand, r.generation, r.difference) {
            if let Some(total) = days.get_mut(&r.day()) {
                total.demand += d;
                total.generation += g;
                total.difference += diff;
            }
        }
    }

    days.into_values().collect()
}

/// Records flagged as near capacity, in timestamp order.
pub fn critical_events(records: &[HourlyRecord]) -> Vec<HourlyRecord> {
    records.iter().filter(|r| r.near_capacity).copied().collect()
}

/// Group records by calendar month. Months without records are absent.
pub fn partition_by_month(records: &[HourlyRecord]) -> BTreeMap<YearMonth, Vec<HourlyRecord>> {
    let mut months: BTreeMap<YearMonth, Vec<HourlyRecord>> = BTreeMap::new();
    for r in records {
        months.entry(r.month()).or_default().push(*r);
    }
    months
}
