use sigil_types::{artifact::SignatureArtifact, raster::RasterImage, Result};
use tracing::debug;

use crate::codec::decode_png;

/// Where a restored artifact lands inside a display rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

/// Compute the aspect-preserving, centered placement of an `art_w x art_h`
/// artifact inside a `disp_w x disp_h` rectangle with `padding` pixels of
/// interior margin.
///
/// The scale factor is `min` of the per-axis ratios against the padded
/// interior, applied uniformly to both axes. Fit-to-box policy: a small
/// artifact is scaled up past native resolution to fill the interior; there
/// is no 1.0 clamp. Returns `None` when the artifact has zero area or the
/// padding leaves no interior to draw into.
pub fn fit_placement(
    art_w: u32,
    art_h: u32,
    disp_w: u32,
    disp_h: u32,
    padding: u32,
) -> Option<Placement> {
    if art_w == 0 || art_h == 0 {
        return None;
    }
    let interior_w = disp_w.checked_sub(padding * 2)?;
    let interior_h = disp_h.checked_sub(padding * 2)?;
    if interior_w == 0 || interior_h == 0 {
        return None;
    }

    let scale = (interior_w as f32 / art_w as f32).min(interior_h as f32 / art_h as f32);
    let width = ((art_w as f32 * scale).round() as u32).max(1);
    let height = ((art_h as f32 * scale).round() as u32).max(1);

    Some(Placement {
        x: (disp_w - width) / 2,
        y: (disp_h - height) / 2,
        width,
        height,
        scale,
    })
}

/// Decode an artifact and redraw it, centered and uniformly scaled, onto the
/// target raster.
///
/// The target is cleared first, so repeating the call with the same artifact
/// and the same target dimensions produces identical pixels. On a resize the
/// caller re-invokes this against the new dimensions; nothing is patched
/// incrementally. Returns the placement used, or `None` when there was no
/// interior to draw into.
pub fn restore_into(
    artifact: &SignatureArtifact,
    target: &mut RasterImage,
    padding: u32,
) -> Result<Option<Placement>> {
    artifact.validate_schema()?;
    let source = decode_png(&artifact.png)?;

    target.clear();
    let Some(placement) = fit_placement(
        source.width,
        source.height,
        target.width,
        target.height,
        padding,
    ) else {
        debug!(
            artifact_w = artifact.width,
            artifact_h = artifact.height,
            target_w = target.width,
            target_h = target.height,
            "no interior to restore artifact into"
        );
        return Ok(None);
    };

    // Nearest-neighbor resample of the decoded source into the placement.
    for ty in 0..placement.height {
        let sy = ((ty as f32 / placement.scale) as u32).min(source.height - 1);
        for tx in 0..placement.width {
            let sx = ((tx as f32 / placement.scale) as u32).min(source.width - 1);
            if let Some(px) = source.pixel(sx, sy) {
                target.set_pixel(placement.x + tx, placement.y + ty, px);
            }
        }
    }

    Ok(Some(placement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_png;

    fn artifact_of(width: u32, height: u32) -> SignatureArtifact {
        let mut raster = RasterImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                raster.set_pixel(x, y, [30, 30, 30, 255]);
            }
        }
        let png = encode_png(&raster).expect("encode");
        SignatureArtifact::new(width, height, png)
    }

    #[test]
    fn placement_matches_worked_example() {
        // 100x40 into 240x80 with 10px padding: scale = min(2.2, 1.5) = 1.5.
        let placement = fit_placement(100, 40, 240, 80, 10).expect("placement");
        assert_eq!(placement.width, 150);
        assert_eq!(placement.height, 60);
        assert_eq!(placement.x, 45);
        assert_eq!(placement.y, 10);
        assert!((placement.scale - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn small_artifact_is_upscaled_to_fill_the_box() {
        let placement = fit_placement(10, 10, 100, 100, 10).expect("placement");
        assert!(placement.scale > 1.0);
        assert_eq!(placement.width, 80);
        assert_eq!(placement.height, 80);
    }

    #[test]
    fn degenerate_inputs_have_no_placement() {
        assert_eq!(fit_placement(0, 10, 100, 100, 10), None);
        assert_eq!(fit_placement(10, 10, 15, 100, 10), None);
        assert_eq!(fit_placement(10, 10, 20, 20, 10), None);
    }

    #[test]
    fn restore_is_idempotent() {
        let artifact = artifact_of(20, 8);
        let mut first = RasterImage::new(240, 80);
        let mut second = RasterImage::new(240, 80);

        restore_into(&artifact, &mut first, 10).expect("restore");
        restore_into(&artifact, &mut second, 10).expect("restore");
        assert_eq!(first, second);

        // Restoring again over the previous draw changes nothing either.
        let snapshot = first.clone();
        restore_into(&artifact, &mut first, 10).expect("restore");
        assert_eq!(first, snapshot);
    }

    #[test]
    fn restore_centers_scaled_pixels() {
        let artifact = artifact_of(100, 40);
        let mut target = RasterImage::new(240, 80);
        let placement = restore_into(&artifact, &mut target, 10)
            .expect("restore")
            .expect("placement");

        assert_eq!((placement.x, placement.y), (45, 10));
        // Inside the placement ink is present; outside it the target is clear.
        assert!(target.alpha_at(placement.x, placement.y) > 0);
        assert!(target.alpha_at(placement.x + placement.width - 1, placement.y) > 0);
        assert_eq!(target.alpha_at(0, 0), 0);
        assert_eq!(target.alpha_at(44, 40), 0);
    }

    #[test]
    fn malformed_artifact_fails_with_decode_error() {
        let mut artifact = artifact_of(4, 4);
        artifact.png = vec![0xde, 0xad, 0xbe, 0xef];
        let mut target = RasterImage::new(100, 100);
        let err = restore_into(&artifact, &mut target, 4).expect_err("must fail");
        assert!(err.is_decode());
    }
}
