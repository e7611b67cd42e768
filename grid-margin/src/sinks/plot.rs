use std::{fs, path::Path};

use eia_client::domain::{HourlyRecord, YearMonth};
use plotters::prelude::*;
use time::OffsetDateTime;

use crate::pipeline::PipelineError;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 600;

pub fn chart_file_name(month: Option<YearMonth>) -> String {
    match month {
        Some(m) => format!("hourly_demand_gen_{m}.svg"),
        None => "hourly_demand_generation.svg".to_string(),
    }
}

fn x_label(x: &i64) -> String {
    match OffsetDateTime::from_unix_timestamp(*x) {
        Ok(ts) => format!("{:02}-{:02} {:02}:00", u8::from(ts.month()), ts.day(), ts.hour()),
        Err(_) => String::new(),
    }
}

/// Draw demand and generation lines for `records`, marking critical hours
/// in red, and save the SVG at `path`.
///
/// `records` is any already computed slice (a full run or one month); an
/// empty slice writes nothing.
pub fn render_chart(
    records: &[HourlyRecord],
    title: &str,
    threshold: f64,
    path: &Path,
) -> Result<(), PipelineError> {
    if records.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| PipelineError::Sink(format!("{}: {e}", parent.display())))?;
    }

    draw(records, title, threshold, path)
        .map_err(|e| PipelineError::Sink(format!("rendering {}: {e}", path.display())))?;

    tracing::info!(path = %path.display(), hours = records.len(), "chart written");
    Ok(())
}

fn draw(
    records: &[HourlyRecord],
    title: &str,
    threshold: f64,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_of = |r: &HourlyRecord| r.ts.unix_timestamp();
    let first = records.iter().map(x_of).min().unwrap_or_default();
    let mut last = records.iter().map(x_of).max().unwrap_or_default();
    if last == first {
        last = first + 3600;
    }

    let values = records
        .iter()
        .flat_map(|r| [r.demand, r.generation])
        .flatten();
    let (y_min, y_max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (y_min, y_max) = if y_min.is_finite() {
        let pad = ((y_max - y_min) * 0.05).max(1.0);
        (y_min - pad, y_max + pad)
    } else {
        (0.0, 1.0)
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(first..last, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("MW")
        .x_labels(12)
        .x_label_formatter(&x_label)
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            records.iter().filter_map(|r| r.demand.map(|d| (x_of(r), d))),
            &BLUE,
        ))?
        .label("Demand (MW)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            records.iter().filter_map(|r| r.generation.map(|g| (x_of(r), g))),
            &RGBColor(255, 165, 0),
        ))?
        .label("Generation (MW)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RGBColor(255, 165, 0)));

    let event_label = format!("≥ {:.0}% of Gen", threshold * 100.0);
    chart
        .draw_series(
            records
                .iter()
                .filter(|r| r.near_capacity)
                .filter_map(|r| r.demand.map(|d| Circle::new((x_of(r), d), 3, RED.filled()))),
        )?
        .label(event_label)
        .legend(|(x, y)| Circle::new((x + 10, y), 3, RED.filled()));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
