//! Row and sheet sessions wiring pads, the store, and the event bus.
//!
//! A row session is the Rust counterpart of one attendance-table row: it
//! owns the row's signature pad, keeps the working copy of the row data,
//! debounces text-field saves, and saves signature and location changes
//! immediately.

use std::sync::{Arc, Mutex};

use sigil_pad::{PenStroke, SignaturePad};
use sigil_raster::Placement;
use sigil_store::SheetStore;
use sigil_sync::EventBus;
use sigil_types::{
    config::{PadConfig, SessionConfig},
    events::{
        EventKind, EventPayload, LifecycleEvent, LifecyclePhase, RowSaveEvent, SaveStatus,
        SignatureAction, SignatureEvent, SystemEvent,
    },
    raster::RasterImage,
    sheet::{AttendanceRow, AttendanceSheet, RowField, RowId},
    Result, SigilError,
};
use tokio::{task::JoinHandle, time::Duration};
use tracing::{debug, info, warn};

/// Sheet-level facade: loads the 16-row document and hands out row sessions.
pub struct SheetSession<S, B> {
    user: Option<String>,
    store: Arc<S>,
    bus: Arc<B>,
    session_config: SessionConfig,
    pad_config: PadConfig,
}

impl<S, B> SheetSession<S, B>
where
    S: SheetStore + 'static,
    B: EventBus + 'static,
{
    pub fn new(
        user: Option<String>,
        session_config: SessionConfig,
        pad_config: PadConfig,
        store: Arc<S>,
        bus: Arc<B>,
    ) -> Self {
        Self {
            user,
            store,
            bus,
            session_config,
            pad_config,
        }
    }

    /// Load and normalize the user's sheet. An anonymous session starts from
    /// a blank sheet without touching the store.
    pub async fn load(&self) -> Result<AttendanceSheet> {
        let mut sheet = match &self.user {
            Some(user) => self.store.load_sheet(user).await?,
            None => AttendanceSheet::default(),
        };
        sheet.normalize();

        self.bus
            .publish(SystemEvent::new(
                EventKind::Lifecycle,
                EventPayload::Lifecycle(LifecycleEvent {
                    phase: LifecyclePhase::SheetLoaded,
                    details: self.user.clone(),
                }),
            ))
            .await?;
        Ok(sheet)
    }

    /// Build the session for one row, seeding its pad from any persisted
    /// signature.
    pub fn row(&self, id: RowId, initial: AttendanceRow) -> RowSession<S, B> {
        let pad = match initial.signature.clone() {
            Some(artifact) => SignaturePad::with_artifact(self.pad_config.clone(), artifact),
            None => SignaturePad::new(self.pad_config.clone()),
        };
        RowSession {
            user: self.user.clone(),
            id,
            row: initial,
            pad,
            status: Arc::new(Mutex::new(SaveStatus::Idle)),
            pending: None,
            debounce: Duration::from_millis(self.session_config.debounce_ms),
            store: Arc::clone(&self.store),
            bus: Arc::clone(&self.bus),
        }
    }
}

/// One attendance row: working data, its signature pad, and save scheduling.
pub struct RowSession<S, B> {
    user: Option<String>,
    id: RowId,
    row: AttendanceRow,
    pad: SignaturePad,
    status: Arc<Mutex<SaveStatus>>,
    pending: Option<JoinHandle<()>>,
    debounce: Duration,
    store: Arc<S>,
    bus: Arc<B>,
}

impl<S, B> RowSession<S, B>
where
    S: SheetStore + 'static,
    B: EventBus + 'static,
{
    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn row(&self) -> &AttendanceRow {
        &self.row
    }

    pub fn status(&self) -> SaveStatus {
        self.status.lock().map(|s| *s).unwrap_or(SaveStatus::Idle)
    }

    pub fn pad(&self) -> &SignaturePad {
        &self.pad
    }

    /// Update a text field and schedule a debounced save; rapid edits
    /// coalesce into one store write.
    pub fn edit_field(&mut self, field: RowField, value: impl Into<String>) {
        self.row.set_field(field, value);
        self.schedule_debounced_save();
    }

    /// Location changes (e.g. from the address lookup) persist immediately.
    pub async fn set_location(&mut self, address: impl Into<String>) -> Result<()> {
        self.row.set_field(RowField::Location, address);
        self.save_now().await
    }

    pub fn begin_signature(&mut self) -> Result<()> {
        self.pad.begin()
    }

    pub fn apply_stroke(&mut self, stroke: &PenStroke) -> Result<()> {
        self.pad.apply_stroke(stroke)
    }

    /// Commit the drawing. A blank canvas is "nothing to save": the prior
    /// signature (if any) stays, and no store write happens.
    pub async fn commit_signature(&mut self) -> Result<Option<(u32, u32)>> {
        let Some(artifact) = self.pad.commit()? else {
            return Ok(None);
        };
        let dims = (artifact.width, artifact.height);

        self.bus
            .publish(SystemEvent::new(
                EventKind::Signature,
                EventPayload::Signature(SignatureEvent {
                    row: self.id,
                    action: SignatureAction::Committed {
                        width: dims.0,
                        height: dims.1,
                    },
                }),
            ))
            .await?;

        self.row.signature = Some(artifact);
        self.save_now().await?;
        Ok(Some(dims))
    }

    /// Clear the slot and persist the explicit null immediately.
    pub async fn clear_signature(&mut self) -> Result<()> {
        self.pad.clear();
        self.row.signature = None;

        self.bus
            .publish(SystemEvent::new(
                EventKind::Signature,
                EventPayload::Signature(SignatureEvent {
                    row: self.id,
                    action: SignatureAction::Cleared,
                }),
            ))
            .await?;
        self.save_now().await
    }

    /// Redraw the committed signature into a preview raster. A decode
    /// failure is "no signature available": the preview is left blank and a
    /// restore-failed event is published instead of propagating the error.
    pub async fn restore_preview(&self, target: &mut RasterImage) -> Result<Option<Placement>> {
        match self.pad.restore_preview(target) {
            Ok(placement) => Ok(placement),
            Err(SigilError::Decode(reason)) => {
                warn!(row = %self.id, %reason, "stored signature unusable; leaving preview blank");
                target.clear();
                self.bus
                    .publish(SystemEvent::new(
                        EventKind::Signature,
                        EventPayload::Signature(SignatureEvent {
                            row: self.id,
                            action: SignatureAction::RestoreFailed,
                        }),
                    ))
                    .await?;
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// Wait for any pending debounced save to finish.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.pending.take() {
            let _ = handle.await;
        }
    }

    fn schedule_debounced_save(&mut self) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        let Some(user) = self.user.clone() else {
            debug!(row = %self.id, "anonymous session; skipping remote save");
            return;
        };

        let snapshot = self.row.clone();
        let delay = self.debounce;
        let id = self.id;
        let store = Arc::clone(&self.store);
        let bus = Arc::clone(&self.bus);
        let status = Arc::clone(&self.status);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            persist_row(store, bus, status, user, id, snapshot).await;
        }));
    }

    async fn save_now(&mut self) -> Result<()> {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        let Some(user) = self.user.clone() else {
            debug!(row = %self.id, "anonymous session; skipping remote save");
            return Ok(());
        };
        persist_row(
            Arc::clone(&self.store),
            Arc::clone(&self.bus),
            Arc::clone(&self.status),
            user,
            self.id,
            self.row.clone(),
        )
        .await;
        Ok(())
    }
}

/// Write one row snapshot, tracking the save-status indicator. On failure
/// the working copy (and its artifact) stays untouched in the session, so a
/// manual re-commit can retry; there is no automatic retry.
async fn persist_row<S, B>(
    store: Arc<S>,
    bus: Arc<B>,
    status: Arc<Mutex<SaveStatus>>,
    user: String,
    id: RowId,
    snapshot: AttendanceRow,
) where
    S: SheetStore,
    B: EventBus,
{
    set_status(&status, SaveStatus::Saving);
    publish_save_event(bus.as_ref(), &user, id, SaveStatus::Saving, None).await;

    match store.save_row(&user, id, &snapshot).await {
        Ok(receipt) => {
            info!(user = %user, row = %id, saved_at = %receipt.saved_at, "row saved");
            set_status(&status, SaveStatus::Saved);
            publish_save_event(bus.as_ref(), &user, id, SaveStatus::Saved, None).await;
        }
        Err(err) => {
            warn!(user = %user, row = %id, %err, "row save failed; keeping local copy for retry");
            set_status(&status, SaveStatus::Error);
            publish_save_event(bus.as_ref(), &user, id, SaveStatus::Error, Some(err.to_string()))
                .await;
        }
    }
}

fn set_status(status: &Mutex<SaveStatus>, value: SaveStatus) {
    if let Ok(mut guard) = status.lock() {
        *guard = value;
    }
}

async fn publish_save_event<B: EventBus>(
    bus: &B,
    user: &str,
    row: RowId,
    status: SaveStatus,
    detail: Option<String>,
) {
    let event = SystemEvent::new(
        EventKind::RowSave,
        EventPayload::RowSave(RowSaveEvent {
            user: user.to_string(),
            row,
            status,
            detail,
        }),
    );
    if let Err(err) = bus.publish(event).await {
        debug!(%err, "failed to publish save event");
    }
}

pub fn session_error(message: impl Into<String>) -> SigilError {
    SigilError::Session(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use sigil_store::{MemoryStore, SaveReceipt};
    use sigil_sync::LocalBus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pad_config() -> PadConfig {
        PadConfig {
            canvas_width: 300,
            canvas_height: 150,
            pen_width: 3,
            preview_width: 240,
            preview_height: 80,
            preview_padding: 10,
        }
    }

    fn sheet_session(
        user: Option<&str>,
        debounce_ms: u64,
        store: Arc<CountingStore>,
    ) -> SheetSession<CountingStore, LocalBus> {
        SheetSession::new(
            user.map(str::to_string),
            SessionConfig { debounce_ms },
            pad_config(),
            store,
            Arc::new(LocalBus::new(32)),
        )
    }

    /// Memory store that counts writes and can be switched to fail them.
    struct CountingStore {
        inner: MemoryStore,
        saves: AtomicUsize,
        fail_saves: std::sync::atomic::AtomicBool,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                saves: AtomicUsize::new(0),
                fail_saves: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SheetStore for CountingStore {
        async fn save_row(
            &self,
            user: &str,
            row: RowId,
            data: &AttendanceRow,
        ) -> Result<SaveReceipt> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(SigilError::Store("simulated outage".into()));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save_row(user, row, data).await
        }

        async fn load_row(&self, user: &str, row: RowId) -> Result<Option<AttendanceRow>> {
            self.inner.load_row(user, row).await
        }

        async fn load_sheet(&self, user: &str) -> Result<AttendanceSheet> {
            self.inner.load_sheet(user).await
        }

        async fn delete_sheet(&self, user: &str) -> Result<()> {
            self.inner.delete_sheet(user).await
        }
    }

    fn scripted_stroke() -> PenStroke {
        PenStroke::from_points(vec![(30, 40), (110, 100), (220, 60)])
    }

    #[tokio::test]
    async fn rapid_edits_coalesce_into_one_save() {
        let store = Arc::new(CountingStore::new());
        let session = sheet_session(Some("alice"), 30, Arc::clone(&store));
        let mut row = session.row(RowId(0), AttendanceRow::default());

        row.edit_field(RowField::MeetingName, "T");
        row.edit_field(RowField::MeetingName, "Tu");
        row.edit_field(RowField::MeetingName, "Tuesday group");
        row.flush().await;

        assert_eq!(store.save_count(), 1);
        let saved = store
            .load_row("alice", RowId(0))
            .await
            .expect("load")
            .expect("present");
        assert_eq!(saved.meeting_name, "Tuesday group");
        assert_eq!(row.status(), SaveStatus::Saved);
    }

    #[tokio::test]
    async fn signature_commit_saves_immediately() {
        let store = Arc::new(CountingStore::new());
        let session = sheet_session(Some("alice"), 10_000, Arc::clone(&store));
        let mut row = session.row(RowId(3), AttendanceRow::default());

        row.begin_signature().expect("begin");
        row.apply_stroke(&scripted_stroke()).expect("stroke");
        let dims = row.commit_signature().await.expect("commit").expect("dims");
        assert!(dims.0 > 0 && dims.1 > 0);

        // No debounce wait: the write already happened.
        assert_eq!(store.save_count(), 1);
        let saved = store
            .load_row("alice", RowId(3))
            .await
            .expect("load")
            .expect("present");
        assert!(saved.signature.is_some());
    }

    #[tokio::test]
    async fn blank_commit_saves_nothing() {
        let store = Arc::new(CountingStore::new());
        let session = sheet_session(Some("alice"), 10, Arc::clone(&store));
        let mut row = session.row(RowId(1), AttendanceRow::default());

        row.begin_signature().expect("begin");
        assert!(row.commit_signature().await.expect("commit").is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn cleared_signature_reads_back_as_empty_row() {
        let store = Arc::new(CountingStore::new());
        let session = sheet_session(Some("alice"), 10, Arc::clone(&store));
        let mut row = session.row(RowId(2), AttendanceRow::default());

        row.begin_signature().expect("begin");
        row.apply_stroke(&scripted_stroke()).expect("stroke");
        row.commit_signature().await.expect("commit");
        row.clear_signature().await.expect("clear");

        // Clearing wrote through immediately, and with no other fields set
        // the stored row is now indistinguishable from a never-filled one.
        assert_eq!(store.save_count(), 2);
        let saved = store.load_row("alice", RowId(2)).await.expect("load");
        assert!(saved.is_none());

        let mut preview = RasterImage::new(240, 80);
        let placement = row.restore_preview(&mut preview).await.expect("restore");
        assert!(placement.is_none());
        assert!(preview.is_blank());
    }

    #[tokio::test]
    async fn cleared_signature_persists_null_when_row_has_text() {
        let store = Arc::new(CountingStore::new());
        let session = sheet_session(Some("alice"), 10, Arc::clone(&store));
        let mut row = session.row(RowId(5), AttendanceRow::default());

        row.set_location("45 Oak Ave").await.expect("set location");
        row.begin_signature().expect("begin");
        row.apply_stroke(&scripted_stroke()).expect("stroke");
        row.commit_signature().await.expect("commit");
        row.clear_signature().await.expect("clear");

        let saved = store
            .load_row("alice", RowId(5))
            .await
            .expect("load")
            .expect("present");
        assert_eq!(saved.location, "45 Oak Ave");
        assert!(saved.signature.is_none());
    }

    #[tokio::test]
    async fn failed_save_keeps_artifact_for_retry() {
        let store = Arc::new(CountingStore::new());
        let session = sheet_session(Some("alice"), 10, Arc::clone(&store));
        let mut row = session.row(RowId(4), AttendanceRow::default());

        row.begin_signature().expect("begin");
        row.apply_stroke(&scripted_stroke()).expect("stroke");

        store.fail_saves.store(true, Ordering::SeqCst);
        row.commit_signature().await.expect("commit");
        assert_eq!(row.status(), SaveStatus::Error);
        // The artifact survives locally for a manual retry.
        assert!(row.row().signature.is_some());
        assert!(row.pad().artifact().is_some());

        store.fail_saves.store(false, Ordering::SeqCst);
        row.set_location("123 Main St").await.expect("retry save");
        assert_eq!(row.status(), SaveStatus::Saved);
        let saved = store
            .load_row("alice", RowId(4))
            .await
            .expect("load")
            .expect("present");
        assert!(saved.signature.is_some());
    }

    #[tokio::test]
    async fn save_lifecycle_events_reach_bus_subscribers() {
        let store = Arc::new(CountingStore::new());
        let bus = Arc::new(LocalBus::new(32));
        let session = SheetSession::new(
            Some("alice".to_string()),
            SessionConfig { debounce_ms: 10 },
            pad_config(),
            Arc::clone(&store),
            Arc::clone(&bus),
        );
        let mut events = bus.subscribe();

        let mut row = session.row(RowId(7), AttendanceRow::default());
        row.set_location("12 Elm St").await.expect("set location");

        for want in [SaveStatus::Saving, SaveStatus::Saved] {
            let event = events.next().await.expect("save event");
            match event.payload {
                EventPayload::RowSave(save) => {
                    assert_eq!(save.row, RowId(7));
                    assert_eq!(save.status, want);
                }
                other => panic!("unexpected payload: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn anonymous_session_skips_remote_saves() {
        let store = Arc::new(CountingStore::new());
        let session = sheet_session(None, 5, Arc::clone(&store));
        let mut row = session.row(RowId(0), AttendanceRow::default());

        row.edit_field(RowField::Date, "08/29");
        row.flush().await;
        row.set_location("somewhere").await.expect("set location");

        assert_eq!(store.save_count(), 0);
        assert_eq!(row.status(), SaveStatus::Idle);
    }

    #[tokio::test]
    async fn sheet_loads_with_persisted_signature_seeding_the_pad() {
        let store = Arc::new(CountingStore::new());
        let session = sheet_session(Some("alice"), 10, Arc::clone(&store));
        let mut row = session.row(RowId(6), AttendanceRow::default());
        row.begin_signature().expect("begin");
        row.apply_stroke(&scripted_stroke()).expect("stroke");
        row.commit_signature().await.expect("commit");

        let sheet = session.load().await.expect("load sheet");
        let reloaded = session.row(RowId(6), sheet.row(RowId(6)).clone());
        assert!(reloaded.pad().artifact().is_some());

        let mut preview = RasterImage::new(240, 80);
        let placement = reloaded
            .restore_preview(&mut preview)
            .await
            .expect("restore");
        assert!(placement.is_some());
        assert!(!preview.is_blank());
    }
}
