use sigil_types::raster::RasterImage;

/// Opaque black ink, matching the pen color of the capture overlay.
pub const DEFAULT_PEN_COLOR: [u8; 4] = [0, 0, 0, 255];

/// A freehand stroke as the ordered points reported by the pointer.
#[derive(Debug, Clone)]
pub struct PenStroke {
    points: Vec<(u32, u32)>,
    color: [u8; 4],
}

impl PenStroke {
    pub fn from_points(points: Vec<(u32, u32)>) -> Self {
        Self {
            points,
            color: DEFAULT_PEN_COLOR,
        }
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Stamp the stroke onto a raster with a square pen of `pen_width`
    /// pixels. Segments between consecutive points are stepped densely
    /// enough that the stamps overlap into a continuous line. Points outside
    /// the raster clip silently.
    pub fn stamp(&self, raster: &mut RasterImage, pen_width: u32) {
        match self.points.as_slice() {
            [] => {}
            [single] => stamp_dab(raster, *single, pen_width, self.color),
            points => {
                for pair in points.windows(2) {
                    stamp_segment(raster, pair[0], pair[1], pen_width, self.color);
                }
            }
        }
    }
}

fn stamp_segment(
    raster: &mut RasterImage,
    from: (u32, u32),
    to: (u32, u32),
    pen_width: u32,
    color: [u8; 4],
) {
    let dx = to.0 as i64 - from.0 as i64;
    let dy = to.1 as i64 - from.1 as i64;
    let steps = dx.abs().max(dy.abs()).max(1);

    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = (from.0 as f32 + dx as f32 * t).round() as i64;
        let y = (from.1 as f32 + dy as f32 * t).round() as i64;
        if x >= 0 && y >= 0 {
            stamp_dab(raster, (x as u32, y as u32), pen_width, color);
        }
    }
}

fn stamp_dab(raster: &mut RasterImage, center: (u32, u32), pen_width: u32, color: [u8; 4]) {
    let half = pen_width / 2;
    let x0 = center.0.saturating_sub(half);
    let y0 = center.1.saturating_sub(half);
    for y in y0..=center.1.saturating_add(half) {
        for x in x0..=center.0.saturating_add(half) {
            raster.set_pixel(x, y, color);
        }
    }
}
