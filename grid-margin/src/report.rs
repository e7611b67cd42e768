use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use eia_client::{
    domain::{DailyTotal, HourlyRecord, Observation, SeriesKind},
    RegionDataClient,
};

use crate::{
    config::{AppConfig, OutputConfig},
    pipeline::{collect_series, drain_into, PipelineError},
    sinks::{chart_file_name, render_chart, CsvFileSink},
    sources::EiaSeriesSource,
    transform,
};

pub const HOURLY_FILE: &str = "hourly_demand_generation.csv";
pub const DAILY_FILE: &str = "daily_totals.csv";
pub const EVENTS_FILE: &str = "high_demand_events.csv";

pub fn monthly_events_file(month: eia_client::domain::YearMonth) -> String {
    format!("high_demand_events_{month}.csv")
}

/// Everything derived from one demand/generation pair.
#[derive(Debug, Clone)]
pub struct Report {
    pub threshold: f64,
    pub hourly: Vec<HourlyRecord>,
    pub daily: Vec<DailyTotal>,
    pub events: Vec<HourlyRecord>,
}

impl Report {
    pub fn build(demand: &[Observation], generation: &[Observation], threshold: f64) -> Self {
        let hourly = transform::merge_series(demand, generation, threshold);
        let daily = transform::daily_totals(&hourly);
        let events = transform::critical_events(&hourly);

        metrics::counter!("critical_events_total").increment(events.len() as u64);

        Self {
            threshold,
            hourly,
            daily,
            events,
        }
    }

    pub fn log_summary(&self) {
        let pct = self.threshold * 100.0;
        let complete = self.hourly.iter().filter(|r| r.is_complete()).count();

        tracing::info!(
            hours = self.hourly.len(),
            complete_hours = complete,
            days = self.daily.len(),
            "hourly table built"
        );
        tracing::info!(
            events = self.events.len(),
            "hours where demand >= {pct}% of generation"
        );
        for e in self.events.iter().take(10) {
            tracing::info!(
                ts = %e.ts,
                demand = ?e.demand,
                generation = ?e.generation,
                difference = ?e.difference,
                "critical hour"
            );
        }
    }

    /// Write CSV outputs (and charts when enabled) under `output.dir`.
    /// Returns the paths written, in order. Stops at the first failure;
    /// files already written stay in place.
    pub async fn export(&self, output: &OutputConfig, title: &str) -> Result<Vec<PathBuf>, PipelineError> {
        let dir = &output.dir;
        let mut written = Vec::new();

        let hourly = CsvFileSink::<HourlyRecord>::new(dir.join(HOURLY_FILE));
        drain_into(&hourly, &self.hourly).await?;
        written.push(hourly.path().to_path_buf());

        let daily = CsvFileSink::<DailyTotal>::new(dir.join(DAILY_FILE));
        drain_into(&daily, &self.daily).await?;
        written.push(daily.path().to_path_buf());

        if output.events_by_month {
            for (month, slice) in transform::partition_by_month(&self.events) {
                let sink = CsvFileSink::<HourlyRecord>::new(dir.join(monthly_events_file(month)));
                drain_into(&sink, &slice).await?;
                tracing::info!(month = %month, events = slice.len(), "monthly events saved");
                written.push(sink.path().to_path_buf());
            }
        } else {
            let sink = CsvFileSink::<HourlyRecord>::new(dir.join(EVENTS_FILE));
            drain_into(&sink, &self.events).await?;
            written.push(sink.path().to_path_buf());
        }

        if output.plot.enabled {
            if output.plot.per_month {
                let plot_dir = dir.join(&output.plot.dir);
                for (month, slice) in transform::partition_by_month(&self.hourly) {
                    let path = plot_dir.join(chart_file_name(Some(month)));
                    render_chart(&slice, &format!("{title}: {month}"), self.threshold, &path)?;
                    written.push(path);
                }
            } else if !self.hourly.is_empty() {
                let path = dir.join(chart_file_name(None));
                render_chart(&self.hourly, title, self.threshold, &path)?;
                written.push(path);
            }
        }

        Ok(written)
    }
}

fn chart_title(cfg: &AppConfig) -> String {
    match &cfg.eia.respondent {
        Some(r) => format!("Hourly Demand vs Generation ({r})"),
        None => "Hourly Demand vs Generation".to_string(),
    }
}

/// Fetch both series, build the report and export it.
pub async fn run_report(cfg: &AppConfig) -> anyhow::Result<Report> {
    let api_key = cfg.eia.resolve_api_key()?;
    let window = cfg.window.hours()?;

    let client = RegionDataClient::new(cfg.eia.base_url.clone(), api_key, cfg.eia.timeout())?
        .with_page_size(cfg.eia.page_size)
        .with_respondent(cfg.eia.respondent.clone());
    let client = Arc::new(client);

    tracing::info!(
        start = %cfg.window.start,
        end = %cfg.window.end,
        respondent = cfg.eia.respondent.as_deref().unwrap_or("all"),
        "fetching region data"
    );

    let demand = collect_series(&EiaSeriesSource::new(client.clone(), SeriesKind::Demand, window))
        .await
        .context("fetching demand series")?;
    let generation = collect_series(&EiaSeriesSource::new(client, SeriesKind::NetGeneration, window))
        .await
        .context("fetching net generation series")?;

    let report = Report::build(&demand, &generation, cfg.analysis.critical_threshold);
    report.log_summary();

    let written = report
        .export(&cfg.output, &chart_title(cfg))
        .await
        .context("exporting report")?;
    tracing::info!(files = written.len(), dir = %cfg.output.dir.display(), "report exported");

    Ok(report)
}
