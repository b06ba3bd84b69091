mod ui;

use std::sync::{mpsc, Arc};

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use sigil_ops::{ensure_data_dir, init_tracing, EventJournal};
use sigil_pad::PenStroke;
use sigil_session::{RowSession, SheetSession};
use sigil_store::JsonFileStore;
use sigil_sync::{EventBus, LocalBus};
use sigil_types::{
    config::{OpsConfig, PadConfig, SessionConfig, SigilConfig, StoreConfig, SyncConfig},
    events::{EventKind, EventPayload, LifecycleEvent, LifecyclePhase, SystemEvent},
    raster::RasterImage,
    sheet::{RowField, RowId},
};
use tokio::time::Duration;
use tracing::{info, warn};

/// Attendance-sheet signature demo: capture, persist, and restore one row.
#[derive(Debug, Parser)]
#[command(name = "sigil-cli")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "configs/dev.toml")]
    config: String,

    /// User id the sheet document is stored under.
    #[arg(long, default_value = "demo-user")]
    user: String,

    /// Override the configured sheet data directory.
    #[arg(long)]
    data_dir: Option<String>,

    /// Show the journaled events in a terminal view after the demo.
    #[arg(long)]
    tui: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(&args.config);
    if let Some(dir) = &args.data_dir {
        config.store.data_dir = dir.clone();
    }

    init_tracing(&config.ops)?;
    ensure_data_dir(&config.store.data_dir)?;

    let store = Arc::new(JsonFileStore::new(&config.store.data_dir));
    let bus = Arc::new(LocalBus::new(config.sync.channel_capacity));

    let journal = EventJournal::new();
    let mut events = bus.subscribe();
    let journal_task = {
        let journal = journal.clone();
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let _ = journal.record(event).await;
            }
        })
    };

    bus.publish(lifecycle_event(LifecyclePhase::Boot, "sigil-cli boot"))
        .await?;

    run_demo(&args.user, &config, store, Arc::clone(&bus)).await?;

    bus.publish(lifecycle_event(LifecyclePhase::Shutdown, "demo complete"))
        .await?;

    // Let the journal drain the broadcast backlog before snapshotting.
    tokio::time::sleep(Duration::from_millis(100)).await;
    journal_task.abort();
    info!("journaled {} events", journal.len().await);

    if args.tui {
        let (tx, rx) = mpsc::channel();
        for event in journal.snapshot().await {
            let _ = tx.send(ui::UiMessage::Event(event));
        }

        let summary = format!("user={} data_dir={}", args.user, config.store.data_dir);
        let ui_task = tokio::task::spawn_blocking(move || ui::run(rx, summary));
        ui_task.await??;
        drop(tx);
    }

    Ok(())
}

async fn run_demo(
    user: &str,
    config: &SigilConfig,
    store: Arc<JsonFileStore>,
    bus: Arc<LocalBus>,
) -> Result<()> {
    let session = SheetSession::new(
        Some(user.to_string()),
        config.session.clone(),
        config.pad.clone(),
        store,
        bus,
    );

    let sheet = session.load().await?;
    let mut row = session.row(RowId(0), sheet.row(RowId(0)).clone());

    row.edit_field(RowField::Date, "08/29");
    row.edit_field(RowField::Time, "19:30");
    row.edit_field(RowField::MeetingName, "Thursday step study");
    row.set_location("412 Harbor Ave").await?;

    capture_signature(&mut row, &config.pad).await?;
    row.flush().await;

    let mut preview = RasterImage::new(config.pad.preview_width, config.pad.preview_height);
    match row.restore_preview(&mut preview).await? {
        Some(placement) => info!(
            x = placement.x,
            y = placement.y,
            width = placement.width,
            height = placement.height,
            scale = placement.scale,
            "signature restored into preview"
        ),
        None => warn!("no signature available for preview"),
    }

    Ok(())
}

async fn capture_signature(
    row: &mut RowSession<JsonFileStore, LocalBus>,
    pad: &PadConfig,
) -> Result<()> {
    row.begin_signature()?;
    for stroke in demo_strokes(pad.canvas_width, pad.canvas_height) {
        row.apply_stroke(&stroke)?;
    }
    match row.commit_signature().await? {
        Some((width, height)) => info!(width, height, "signature committed"),
        None => warn!("nothing drawn; no artifact produced"),
    }
    Ok(())
}

/// A scripted squiggle roughly across the middle of the capture canvas.
fn demo_strokes(width: u32, height: u32) -> Vec<PenStroke> {
    let mid = height / 2;
    let quarter = height / 4;
    vec![
        PenStroke::from_points(vec![
            (width / 10, mid),
            (width / 4, mid - quarter / 2),
            (width / 2, mid + quarter / 2),
            (width * 3 / 4, mid - quarter / 3),
            (width * 9 / 10, mid),
        ]),
        PenStroke::from_points(vec![(width / 3, mid + quarter), (width * 2 / 3, mid - quarter)]),
    ]
}

fn lifecycle_event(phase: LifecyclePhase, details: &str) -> SystemEvent {
    SystemEvent::new(
        EventKind::Lifecycle,
        EventPayload::Lifecycle(LifecycleEvent {
            phase,
            details: Some(details.into()),
        }),
    )
}

fn load_config(path: &str) -> SigilConfig {
    match SigilConfig::from_file(path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!("Invalid config in '{path}': {err}. Falling back to internal defaults.");
                default_config()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{path}': {err}. Falling back to internal defaults."
            );
            default_config()
        }
    }
}

fn default_config() -> SigilConfig {
    let config = SigilConfig {
        pad: PadConfig {
            canvas_width: 600,
            canvas_height: 300,
            pen_width: 3,
            preview_width: 240,
            preview_height: 80,
            preview_padding: 10,
        },
        store: StoreConfig {
            data_dir: "sheets".into(),
        },
        session: SessionConfig { debounce_ms: 1000 },
        sync: SyncConfig {
            channel_capacity: 64,
        },
        ops: OpsConfig {
            log_level: "info".into(),
        },
    };
    debug_assert!(config.validate().is_ok());
    config
}
