use std::io::Cursor;

use image::{ImageBuffer, ImageFormat, ImageOutputFormat, Rgba};
use sigil_types::{raster::RasterImage, Result, SigilError};

use crate::raster_error;

/// Encode a raster as PNG bytes. Deterministic: the same pixels always
/// produce the same payload.
pub fn encode_png(raster: &RasterImage) -> Result<Vec<u8>> {
    let Some(buffer) = ImageBuffer::<Rgba<u8>, _>::from_raw(
        raster.width,
        raster.height,
        raster.as_raw().to_vec(),
    ) else {
        return Err(raster_error(format!(
            "image buffer creation failed for {}x{} raster",
            raster.width, raster.height
        )));
    };

    let mut out = Cursor::new(Vec::new());
    buffer
        .write_to(&mut out, ImageOutputFormat::Png)
        .map_err(|err| raster_error(format!("PNG encode failed: {err}")))?;
    Ok(out.into_inner())
}

/// Decode PNG bytes back into an RGBA raster.
///
/// Malformed input yields [`SigilError::Decode`], which callers surface as
/// "no signature available" rather than a crash.
pub fn decode_png(bytes: &[u8]) -> Result<RasterImage> {
    let dynamic = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|err| decode_error(format!("malformed PNG payload: {err}")))?;
    let rgba = dynamic.into_rgba8();
    let (width, height) = rgba.dimensions();
    RasterImage::from_raw(width, height, rgba.into_raw())
}

pub fn decode_error(message: impl Into<String>) -> SigilError {
    SigilError::Decode(message.into())
}
