//! Result buffering and vector persistence.

mod buffer;
mod csv;
mod geojson;
pub mod progress;
mod store;
mod types;

pub use buffer::ResultBuffer;
pub use csv::CsvStore;
pub use geojson::GeoJsonStore;
pub use store::{FanoutStore, PersistenceStore};
pub use types::{DetectionResult, close_ring};
