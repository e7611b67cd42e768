pub mod region_data;

pub use region_data::{ApiError, RegionDataClient, DEFAULT_BASE_URL, MAX_PAGE_SIZE};
