//! Sheet persistence port and its in-memory implementation.

mod file;
mod migrate;

pub use file::JsonFileStore;
pub use migrate::normalize_document;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sigil_types::{
    sheet::{AttendanceRow, AttendanceSheet, RowId},
    Result, SigilError,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Acknowledgement for a completed row save.
#[derive(Debug, Clone)]
pub struct SaveReceipt {
    pub row: RowId,
    pub saved_at: DateTime<Utc>,
}

/// Persistence port for attendance sheets.
///
/// Semantics are last-write-wins at the granularity of one row document; no
/// ordering is guaranteed between saves of different rows. Retry and
/// backpressure are left to callers.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn save_row(&self, user: &str, row: RowId, data: &AttendanceRow) -> Result<SaveReceipt>;
    async fn load_row(&self, user: &str, row: RowId) -> Result<Option<AttendanceRow>>;
    async fn load_sheet(&self, user: &str) -> Result<AttendanceSheet>;
    async fn delete_sheet(&self, user: &str) -> Result<()>;
}

/// In-process store used by tests and the demo flow.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sheets: Arc<Mutex<HashMap<String, AttendanceSheet>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SheetStore for MemoryStore {
    async fn save_row(&self, user: &str, row: RowId, data: &AttendanceRow) -> Result<SaveReceipt> {
        let mut sheets = self.sheets.lock().await;
        let sheet = sheets.entry(user.to_string()).or_default();
        *sheet.row_mut(row) = data.clone();
        debug!(user, %row, "stored row in memory");
        Ok(SaveReceipt {
            row,
            saved_at: Utc::now(),
        })
    }

    async fn load_row(&self, user: &str, row: RowId) -> Result<Option<AttendanceRow>> {
        let sheets = self.sheets.lock().await;
        let data = sheets.get(user).map(|sheet| sheet.row(row).clone());
        Ok(data.filter(|row| !row.is_empty()))
    }

    async fn load_sheet(&self, user: &str) -> Result<AttendanceSheet> {
        let sheets = self.sheets.lock().await;
        Ok(sheets.get(user).cloned().unwrap_or_default())
    }

    async fn delete_sheet(&self, user: &str) -> Result<()> {
        self.sheets.lock().await.remove(user);
        Ok(())
    }
}

pub fn store_error(message: impl Into<String>) -> SigilError {
    SigilError::Store(message.into())
}
