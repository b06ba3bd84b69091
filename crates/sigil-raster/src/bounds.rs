use sigil_types::raster::RasterImage;

/// Inclusive bounding box of the foreground (alpha > 0) pixels of a raster.
///
/// Only ever produced by [`scan_bounds`]; an empty raster yields `None`
/// instead of a sentinel box, so `top <= bottom` and `left <= right` hold for
/// every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }
}

/// Scan a raster for the bounding box of its non-transparent pixels.
///
/// Single row-major pass tracking the running min/max of each axis; O(w*h)
/// time, O(1) extra space. Returns `None` when every alpha is exactly zero.
pub fn scan_bounds(raster: &RasterImage) -> Option<BoundingBox> {
    let mut found: Option<BoundingBox> = None;

    for y in 0..raster.height {
        for x in 0..raster.width {
            if raster.alpha_at(x, y) == 0 {
                continue;
            }
            found = Some(match found {
                None => BoundingBox {
                    top: y,
                    bottom: y,
                    left: x,
                    right: x,
                },
                Some(b) => BoundingBox {
                    top: b.top,
                    bottom: y,
                    left: b.left.min(x),
                    right: b.right.max(x),
                },
            });
        }
    }

    found
}
