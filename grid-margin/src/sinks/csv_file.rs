use std::{
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use eia_client::domain::{DailyTotal, HourlyRecord};
use futures::StreamExt;
use time::OffsetDateTime;

use crate::pipeline::{PipelineError, Sink};

/// Table layout for one exported row type.
pub trait CsvRow {
    fn header() -> &'static [&'static str];
    fn write_fields(&self, out: &mut Vec<String>);
}

/// Floats keep a trailing `.0` so integral megawatt values read as floats.
fn fmt_f64(v: f64) -> String {
    format!("{v:?}")
}

fn fmt_opt_f64(v: Option<f64>) -> String {
    v.map(fmt_f64).unwrap_or_default()
}

fn fmt_timestamp(ts: OffsetDateTime) -> String {
    let base = format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    );

    let offset = ts.offset();
    if offset.is_utc() {
        return base;
    }
    let (h, m, _) = offset.as_hms();
    let sign = if offset.is_negative() { '-' } else { '+' };
    format!("{base}{sign}{:02}:{:02}", h.unsigned_abs(), m.unsigned_abs())
}

fn fmt_date(d: time::Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

fn fmt_bool(b: bool) -> String {
    let s = if b { "True" } else { "False" };
    s.to_string()
}

impl CsvRow for HourlyRecord {
    fn header() -> &'static [&'static str] {
        &["datetime", "D", "NG", "Diff", "Day", "Hour", "CloseToLimit"]
    }

    fn write_fields(&self, out: &mut Vec<String>) {
        out.push(fmt_timestamp(self.ts));
        out.push(fmt_opt_f64(self.demand));
        out.push(fmt_opt_f64(self.generation));
        out.push(fmt_opt_f64(self.difference));
        out.push(fmt_date(self.day()));
        out.push(self.hour().to_string());
        out.push(fmt_bool(self.near_capacity));
    }
}

impl CsvRow for DailyTotal {
    fn header() -> &'static [&'static str] {
        &["datetime", "D", "NG", "Diff"]
    }

    fn write_fields(&self, out: &mut Vec<String>) {
        out.push(fmt_date(self.day));
        out.push(fmt_f64(self.demand));
        out.push(fmt_f64(self.generation));
        out.push(fmt_f64(self.difference));
    }
}

/// Writes every row of the input stream to one CSV file, replacing any
/// existing file. The parent directory is created if needed.
pub struct CsvFileSink<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CsvFileSink<T> {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn sink_err(path: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Sink(format!("{}: {e}", path.display()))
}

#[async_trait::async_trait]
impl<T> Sink<T> for CsvFileSink<T>
where
    T: CsvRow + Send + 'static,
{
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<T, PipelineError>> + Send + Unpin + 'static,
    {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| sink_err(parent, e))?;
        }

        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| sink_err(&self.path, e))?;
        writer
            .write_record(T::header())
            .map_err(|e| sink_err(&self.path, e))?;

        let mut fields = Vec::with_capacity(T::header().len());
        let mut rows: u64 = 0;
        while let Some(item) = input.next().await {
            let row = item?;
            fields.clear();
            row.write_fields(&mut fields);
            writer
                .write_record(&fields)
                .map_err(|e| sink_err(&self.path, e))?;
            rows += 1;
        }

        writer.flush().map_err(|e| sink_err(&self.path, e))?;
        metrics::counter!("csv_rows_written_total").increment(rows);
        tracing::info!(path = %self.path.display(), rows, "csv written");

        Ok(())
    }
}
