use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sigil_types::{
    sheet::{AttendanceRow, AttendanceSheet, RowId},
    Result,
};
use tokio::{fs, sync::Mutex};
use tracing::debug;

use crate::{normalize_document, store_error, SaveReceipt, SheetStore};

/// File-backed store: one JSON sheet document per user under a data
/// directory. Stands in for the remote document store in the demo and in
/// integration tests.
pub struct JsonFileStore {
    dir: PathBuf,
    // Writes go through a whole-document read-modify-write, so saves for the
    // same user must be serialized or one row's update overwrites another's.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn user_lock(&self, user: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(user.to_string()).or_default())
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| store_error(format!("failed to create data dir {:?}: {err}", self.dir)))
    }

    fn sheet_path(&self, user: &str) -> Result<PathBuf> {
        if user.is_empty()
            || !user
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(store_error(format!("invalid user id {user:?}")));
        }
        Ok(self.dir.join(format!("{user}.json")))
    }

    async fn read_sheet(&self, user: &str) -> Result<AttendanceSheet> {
        let path = self.sheet_path(user)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(AttendanceSheet::default());
            }
            Err(err) => {
                return Err(store_error(format!(
                    "failed to read sheet {}: {err}",
                    path.display()
                )));
            }
        };

        let mut document: Value = serde_json::from_slice(&bytes).map_err(|err| {
            store_error(format!("corrupt sheet document {}: {err}", path.display()))
        })?;
        normalize_document(&mut document);
        let mut sheet: AttendanceSheet = serde_json::from_value(document).map_err(|err| {
            store_error(format!(
                "sheet document {} does not match schema: {err}",
                path.display()
            ))
        })?;
        sheet.normalize();
        Ok(sheet)
    }

    async fn write_sheet(&self, user: &str, sheet: &AttendanceSheet) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.sheet_path(user)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(sheet)
            .map_err(|err| store_error(format!("failed to serialize sheet: {err}")))?;

        fs::write(&tmp, &bytes)
            .await
            .map_err(|err| store_error(format!("failed to write {}: {err}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|err| store_error(format!("failed to replace {}: {err}", path.display())))?;
        debug!(user, path = %path.display(), "sheet document written");
        Ok(())
    }
}

#[async_trait]
impl SheetStore for JsonFileStore {
    async fn save_row(&self, user: &str, row: RowId, data: &AttendanceRow) -> Result<SaveReceipt> {
        let lock = self.user_lock(user).await;
        let _guard = lock.lock().await;
        let mut sheet = self.read_sheet(user).await?;
        *sheet.row_mut(row) = data.clone();
        self.write_sheet(user, &sheet).await?;
        Ok(SaveReceipt {
            row,
            saved_at: Utc::now(),
        })
    }

    async fn load_row(&self, user: &str, row: RowId) -> Result<Option<AttendanceRow>> {
        let sheet = self.read_sheet(user).await?;
        let data = sheet.row(row).clone();
        Ok(if data.is_empty() { None } else { Some(data) })
    }

    async fn load_sheet(&self, user: &str) -> Result<AttendanceSheet> {
        self.read_sheet(user).await
    }

    async fn delete_sheet(&self, user: &str) -> Result<()> {
        let lock = self.user_lock(user).await;
        let _guard = lock.lock().await;
        let path = self.sheet_path(user)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(store_error(format!(
                "failed to delete {}: {err}",
                path.display()
            ))),
        }
    }
}
