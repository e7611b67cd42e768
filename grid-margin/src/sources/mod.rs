pub mod eia_series;

pub use eia_series::EiaSeriesSource;
