pub mod config;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use pipeline::{PipelineError, Sink, Source};
pub use report::{run_report, Report};
