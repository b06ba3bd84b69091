//! Signature pad: freehand pen input and the per-slot commit lifecycle.

mod pen;

pub use pen::{PenStroke, DEFAULT_PEN_COLOR};

use sigil_raster::{encode_png, restore_into, trim, Placement};
use sigil_types::{
    artifact::SignatureArtifact, config::PadConfig, raster::RasterImage, Result, SigilError,
};
use tracing::{debug, info};

/// Externally visible phase of a signature slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadPhase {
    Empty,
    Drawing,
    Committed,
}

enum SlotState {
    Empty,
    Drawing {
        raster: RasterImage,
        /// Artifact being replaced; restored when the commit no-ops.
        prior: Option<SignatureArtifact>,
    },
    Committed(SignatureArtifact),
}

/// Simple activity counters, mostly for the demo status view.
#[derive(Debug, Default, Clone)]
pub struct PadMetrics {
    pub strokes_applied: u64,
    pub commits: u64,
    pub blank_commits: u64,
    pub clears: u64,
}

/// One signature slot: a capture canvas while drawing, an artifact once
/// committed. Freehand input is inherently serialized (one pointer, one
/// stroke sequence), so the pad is single-owner with no interior locking.
pub struct SignaturePad {
    config: PadConfig,
    state: SlotState,
    metrics: PadMetrics,
}

impl SignaturePad {
    pub fn new(config: PadConfig) -> Self {
        Self {
            config,
            state: SlotState::Empty,
            metrics: PadMetrics::default(),
        }
    }

    /// Seed the slot with a previously persisted artifact.
    pub fn with_artifact(config: PadConfig, artifact: SignatureArtifact) -> Self {
        Self {
            config,
            state: SlotState::Committed(artifact),
            metrics: PadMetrics::default(),
        }
    }

    pub fn phase(&self) -> PadPhase {
        match self.state {
            SlotState::Empty => PadPhase::Empty,
            SlotState::Drawing { .. } => PadPhase::Drawing,
            SlotState::Committed(_) => PadPhase::Committed,
        }
    }

    pub fn metrics(&self) -> PadMetrics {
        self.metrics.clone()
    }

    pub fn artifact(&self) -> Option<&SignatureArtifact> {
        match &self.state {
            SlotState::Committed(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Open a fresh capture canvas. Re-editing a committed slot replaces the
    /// prior artifact on successful commit; it never merges strokes into it.
    pub fn begin(&mut self) -> Result<()> {
        if matches!(self.state, SlotState::Drawing { .. }) {
            return Err(pad_error("drawing already in progress"));
        }
        let prior = match std::mem::replace(&mut self.state, SlotState::Empty) {
            SlotState::Committed(artifact) => Some(artifact),
            _ => None,
        };
        self.state = SlotState::Drawing {
            raster: RasterImage::new(self.config.canvas_width, self.config.canvas_height),
            prior,
        };
        debug!(
            width = self.config.canvas_width,
            height = self.config.canvas_height,
            "opened capture canvas"
        );
        Ok(())
    }

    /// Stamp a polyline stroke onto the capture canvas.
    pub fn apply_stroke(&mut self, stroke: &PenStroke) -> Result<()> {
        let SlotState::Drawing { raster, .. } = &mut self.state else {
            return Err(pad_error("no drawing in progress"));
        };
        stroke.stamp(raster, self.config.pen_width);
        self.metrics.strokes_applied += 1;
        Ok(())
    }

    /// Wipe the capture canvas without leaving the drawing state.
    pub fn wipe_canvas(&mut self) -> Result<()> {
        let SlotState::Drawing { raster, .. } = &mut self.state else {
            return Err(pad_error("no drawing in progress"));
        };
        raster.clear();
        Ok(())
    }

    /// Finalize the drawing: trim to the foreground bounding box, encode, and
    /// move to `Committed`. A canvas with no strokes is a full no-op: the
    /// slot falls back to its prior artifact (or stays empty) and `None` is
    /// returned, meaning "nothing to save".
    pub fn commit(&mut self) -> Result<Option<SignatureArtifact>> {
        let SlotState::Drawing { raster, prior } =
            std::mem::replace(&mut self.state, SlotState::Empty)
        else {
            return Err(pad_error("no drawing in progress"));
        };

        let Some(trimmed) = trim(&raster) else {
            self.metrics.blank_commits += 1;
            info!("commit with blank canvas; keeping prior slot contents");
            self.state = match prior {
                Some(artifact) => SlotState::Committed(artifact),
                None => SlotState::Empty,
            };
            return Ok(None);
        };

        // If encoding fails the prior slot contents survive.
        let png = match encode_png(&trimmed) {
            Ok(png) => png,
            Err(err) => {
                self.state = match prior {
                    Some(artifact) => SlotState::Committed(artifact),
                    None => SlotState::Empty,
                };
                return Err(err);
            }
        };
        let artifact = SignatureArtifact::new(trimmed.width, trimmed.height, png);
        info!(
            width = artifact.width,
            height = artifact.height,
            "committed signature artifact"
        );
        self.metrics.commits += 1;
        self.state = SlotState::Committed(artifact.clone());
        Ok(Some(artifact))
    }

    /// Redraw the committed artifact into a preview raster. An empty slot
    /// clears the target and draws nothing.
    pub fn restore_preview(&self, target: &mut RasterImage) -> Result<Option<Placement>> {
        match &self.state {
            SlotState::Committed(artifact) => {
                restore_into(artifact, target, self.config.preview_padding)
            }
            _ => {
                target.clear();
                Ok(None)
            }
        }
    }

    /// Discard the slot contents. The caller persists the cleared field.
    pub fn clear(&mut self) {
        self.metrics.clears += 1;
        self.state = SlotState::Empty;
    }
}

pub fn pad_error(message: impl Into<String>) -> SigilError {
    SigilError::Pad(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PadConfig {
        PadConfig {
            canvas_width: 300,
            canvas_height: 150,
            pen_width: 3,
            preview_width: 240,
            preview_height: 80,
            preview_padding: 10,
        }
    }

    fn diagonal_stroke() -> PenStroke {
        PenStroke::from_points(vec![(40, 30), (120, 90), (200, 50)])
    }

    #[test]
    fn commit_produces_trimmed_artifact() {
        let mut pad = SignaturePad::new(test_config());
        pad.begin().expect("begin");
        pad.apply_stroke(&diagonal_stroke()).expect("stroke");

        let artifact = pad.commit().expect("commit").expect("artifact");
        assert_eq!(pad.phase(), PadPhase::Committed);
        assert!(artifact.width <= 300);
        assert!(artifact.height <= 150);
        assert!(artifact.validate_schema().is_ok());
    }

    #[test]
    fn blank_commit_is_a_no_op() {
        let mut pad = SignaturePad::new(test_config());
        pad.begin().expect("begin");
        assert!(pad.commit().expect("commit").is_none());
        assert_eq!(pad.phase(), PadPhase::Empty);
        assert_eq!(pad.metrics().blank_commits, 1);
    }

    #[test]
    fn blank_recommit_keeps_prior_artifact() {
        let mut pad = SignaturePad::new(test_config());
        pad.begin().expect("begin");
        pad.apply_stroke(&diagonal_stroke()).expect("stroke");
        let first = pad.commit().expect("commit").expect("artifact");

        // Re-edit but draw nothing: the prior artifact survives.
        pad.begin().expect("re-begin");
        assert!(pad.commit().expect("commit").is_none());
        assert_eq!(pad.phase(), PadPhase::Committed);
        assert_eq!(pad.artifact().expect("prior kept").png, first.png);
    }

    #[test]
    fn reedit_replaces_rather_than_merges() {
        let mut pad = SignaturePad::new(test_config());
        pad.begin().expect("begin");
        pad.apply_stroke(&PenStroke::from_points(vec![(10, 10), (290, 10)]))
            .expect("stroke");
        let wide = pad.commit().expect("commit").expect("artifact");

        pad.begin().expect("re-begin");
        pad.apply_stroke(&PenStroke::from_points(vec![(50, 50), (50, 100)]))
            .expect("stroke");
        let tall = pad.commit().expect("commit").expect("artifact");

        assert!(wide.width > tall.width);
        assert!(tall.height > wide.height);
    }

    #[test]
    fn stroke_outside_drawing_state_is_an_error() {
        let mut pad = SignaturePad::new(test_config());
        assert!(pad.apply_stroke(&diagonal_stroke()).is_err());
        assert!(pad.commit().is_err());
    }

    #[test]
    fn clear_then_restore_draws_nothing() {
        let mut pad = SignaturePad::new(test_config());
        pad.begin().expect("begin");
        pad.apply_stroke(&diagonal_stroke()).expect("stroke");
        pad.commit().expect("commit");

        pad.clear();
        assert_eq!(pad.phase(), PadPhase::Empty);

        let mut preview = RasterImage::new(240, 80);
        preview.set_pixel(5, 5, [9, 9, 9, 255]);
        let placement = pad.restore_preview(&mut preview).expect("restore");
        assert!(placement.is_none());
        assert!(preview.is_blank());
    }

    #[test]
    fn restore_preview_after_resize_redraws_cleanly() {
        let mut pad = SignaturePad::new(test_config());
        pad.begin().expect("begin");
        pad.apply_stroke(&diagonal_stroke()).expect("stroke");
        pad.commit().expect("commit");

        let mut small = RasterImage::new(120, 60);
        let mut large = RasterImage::new(480, 160);
        let small_placement = pad
            .restore_preview(&mut small)
            .expect("restore")
            .expect("placement");
        let large_placement = pad
            .restore_preview(&mut large)
            .expect("restore")
            .expect("placement");
        assert!(large_placement.width > small_placement.width);
    }
}
