use thiserror::Error;

pub type Result<T, E = SigilError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum SigilError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("raster error: {0}")]
    Raster(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("pad error: {0}")]
    Pad(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("session error: {0}")]
    Session(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SigilError {
    /// Whether this failure means "no usable signature" rather than a hard fault.
    pub fn is_decode(&self) -> bool {
        matches!(self, SigilError::Decode(_))
    }
}
