//! Pixel-to-geospatial coordinate mapping.

mod transform;

pub use transform::AffineTransform;
