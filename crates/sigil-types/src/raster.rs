use serde::{Deserialize, Serialize};

use crate::{Result, SigilError};

/// Bytes per RGBA8 pixel.
pub const PIXEL_STRIDE: usize = 4;

/// Owned RGBA8 pixel grid in row-major order.
///
/// A raster is owned exclusively by whichever component currently holds it;
/// pads hand it off on commit, restore targets are mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Create a fully transparent raster of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * PIXEL_STRIDE;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Wrap an existing RGBA8 buffer, validating its length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * PIXEL_STRIDE;
        if data.len() != expected {
            return Err(SigilError::Raster(format!(
                "buffer length {} does not match {}x{} RGBA ({} expected)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * PIXEL_STRIDE
    }

    /// RGBA at the given coordinates, or `None` when out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Set the RGBA value at the given coordinates; out of bounds is a no-op.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index(x, y);
        self.data[i..i + PIXEL_STRIDE].copy_from_slice(&rgba);
    }

    /// Alpha channel at the given coordinates; out of bounds reads as 0.
    #[inline]
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y).map(|p| p[3]).unwrap_or(0)
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// True when no pixel carries any alpha.
    pub fn is_blank(&self) -> bool {
        self.data
            .chunks_exact(PIXEL_STRIDE)
            .all(|px| px[3] == 0)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
