//! Operational helpers: logging setup, event journaling, data directory prep.

use std::{path::PathBuf, sync::Arc};

use sigil_types::{config::OpsConfig, events::SystemEvent, Result, SigilError};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| SigilError::Ops(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| SigilError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

/// In-memory journal of bus events, snapshotted by the status view and tests.
#[derive(Clone, Default)]
pub struct EventJournal {
    events: Arc<Mutex<Vec<SystemEvent>>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, event: SystemEvent) -> Result<()> {
        self.events.lock().await.push(event);
        Ok(())
    }

    pub async fn snapshot(&self) -> Vec<SystemEvent> {
        self.events.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

pub fn ensure_data_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    std::fs::create_dir_all(&dir)
        .map_err(|err| SigilError::Ops(format!("failed to create data dir: {err}")))?;
    info!("Data directory ready at {:?}", dir);
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_types::events::{EventKind, EventPayload, OpsEvent};

    #[tokio::test]
    async fn journal_records_in_order() {
        let journal = EventJournal::new();
        assert!(journal.is_empty().await);

        for n in 0..3 {
            journal
                .record(SystemEvent::new(
                    EventKind::Ops,
                    EventPayload::Ops(OpsEvent {
                        message: format!("event {n}"),
                        tags: Vec::new(),
                    }),
                ))
                .await
                .expect("record");
        }

        let snapshot = journal.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        match &snapshot[2].payload {
            EventPayload::Ops(ops) => assert_eq!(ops.message, "event 2"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
