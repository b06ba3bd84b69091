use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, SigilError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadConfig {
    /// Capture canvas dimensions handed to a pad when signing begins.
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Square pen stamp width in pixels.
    pub pen_width: u32,
    /// Preview surface the committed artifact is restored into.
    pub preview_width: u32,
    pub preview_height: u32,
    /// Interior margin kept clear when fitting an artifact to the preview.
    pub preview_padding: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON sheet document per user.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay before a text edit is flushed to the store.
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Broadcast channel capacity for the in-process event bus.
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigilConfig {
    pub pad: PadConfig,
    pub store: StoreConfig,
    pub session: SessionConfig,
    pub sync: SyncConfig,
    pub ops: OpsConfig,
}

impl SigilConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            SigilError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            SigilError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.pad.canvas_width == 0 || self.pad.canvas_height == 0 {
            return Err(SigilError::Configuration(
                "pad.canvas_width and pad.canvas_height must be greater than zero".into(),
            ));
        }
        if self.pad.pen_width == 0 {
            return Err(SigilError::Configuration(
                "pad.pen_width must be greater than zero".into(),
            ));
        }
        let min_preview = self.pad.preview_width.min(self.pad.preview_height);
        if self.pad.preview_padding * 2 >= min_preview {
            return Err(SigilError::Configuration(
                "pad.preview_padding leaves no interior in the preview rectangle".into(),
            ));
        }
        if self.store.data_dir.is_empty() {
            return Err(SigilError::Configuration(
                "store.data_dir must not be empty".into(),
            ));
        }
        if self.sync.channel_capacity == 0 {
            return Err(SigilError::Configuration(
                "sync.channel_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
