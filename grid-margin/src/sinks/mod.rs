pub mod csv_file;
pub mod plot;

pub use csv_file::{CsvFileSink, CsvRow};
pub use plot::{chart_file_name, render_chart};
