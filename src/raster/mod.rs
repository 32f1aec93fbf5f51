//! Raster access and tile streaming.

mod extent;
mod source;
mod streamer;
mod worldfile;

pub use extent::RasterExtent;
pub use source::RasterSource;
pub use streamer::{ScanOrder, Tile, TileStream};
pub use worldfile::WorldFileRaster;
