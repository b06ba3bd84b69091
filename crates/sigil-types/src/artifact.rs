use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, SigilError};

/// Current artifact schema revision.
pub const ARTIFACT_SCHEMA: u32 = 1;

/// Persisted form of a committed signature: losslessly encoded pixels plus the
/// capture-time dimensions. Dimensions are stored explicitly rather than
/// re-derived from the encoding so a transport that mangles the payload is
/// caught at the decode boundary instead of producing a silently wrong size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureArtifact {
    pub schema: u32,
    pub width: u32,
    pub height: u32,
    /// PNG-encoded pixel payload.
    pub png: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl SignatureArtifact {
    pub fn new(width: u32, height: u32, png: Vec<u8>) -> Self {
        Self {
            schema: ARTIFACT_SCHEMA,
            width,
            height,
            png,
            captured_at: Utc::now(),
        }
    }

    /// Validate a stored payload against the current schema.
    ///
    /// Earlier revisions of the sheet format stored signatures in ad-hoc
    /// shapes; anything that is not a recognized schema is rejected here, at
    /// the decode boundary, rather than branched on downstream.
    pub fn validate_schema(&self) -> Result<()> {
        if self.schema != ARTIFACT_SCHEMA {
            return Err(SigilError::Decode(format!(
                "unsupported signature schema {} (expected {})",
                self.schema, ARTIFACT_SCHEMA
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(SigilError::Decode(format!(
                "artifact has degenerate dimensions {}x{}",
                self.width, self.height
            )));
        }
        if self.png.is_empty() {
            return Err(SigilError::Decode("artifact payload is empty".into()));
        }
        Ok(())
    }
}
