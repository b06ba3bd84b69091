//! Signature normalization: bounding-box scan, crop, lossless codec, and
//! aspect-preserving restore.

pub mod bounds;
pub mod codec;
pub mod restore;

use sigil_types::{raster::RasterImage, SigilError};

pub use bounds::{scan_bounds, BoundingBox};
pub use codec::{decode_png, encode_png};
pub use restore::{fit_placement, restore_into, Placement};

/// Copy the pixels inside `bounds` into a new minimal raster.
///
/// The output pixel at local `(x, y)` equals the input pixel at
/// `(x + left, y + top)`; no scaling or resampling. Callers must obtain the
/// box from [`scan_bounds`], which guarantees it lies within the raster.
pub fn crop(raster: &RasterImage, bounds: BoundingBox) -> RasterImage {
    let mut out = RasterImage::new(bounds.width(), bounds.height());
    for y in 0..bounds.height() {
        for x in 0..bounds.width() {
            if let Some(px) = raster.pixel(x + bounds.left, y + bounds.top) {
                out.set_pixel(x, y, px);
            }
        }
    }
    out
}

/// Trim transparent edges: scan for the foreground box and crop to it.
///
/// Returns `None` for a raster with no foreground pixels, which callers treat
/// as "nothing to save" rather than an error.
pub fn trim(raster: &RasterImage) -> Option<RasterImage> {
    scan_bounds(raster).map(|bounds| crop(raster, bounds))
}

pub fn raster_error(message: impl Into<String>) -> SigilError {
    SigilError::Raster(message.into())
}
