//! DeckMirror daemon entry point.
//!
//! Wires together all infrastructure services and starts the Tokio async
//! runtime, then hands the session to [`MonitorService::run`].
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML config, defaults on first run
//!  └─ HidDeck::open_first()  -- find a deck on the HID bus
//!  └─ NativeGrabber::new()   -- platform screen-capture backend
//!  └─ EnigoPointer::new()    -- optional click capability
//!  └─ MonitorService::run()
//!       ├─ RefreshController  (Tokio task, paced key repaints)
//!       └─ event pump         (blocking task, key presses → actions)
//! ```

use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use deckmirror::application::monitor::MonitorService;
use deckmirror::infrastructure::capture::NativeGrabber;
use deckmirror::infrastructure::deck::hid::HidDeck;
use deckmirror::infrastructure::deck::SharedDeck;
use deckmirror::infrastructure::pointer::enigo::EnigoPointer;
use deckmirror::infrastructure::pointer::PointerController;
use deckmirror::infrastructure::storage::{load_config, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("DeckMirror starting");

    // A broken config file should be fixed, not silently replaced.
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "could not load config, using defaults");
            AppConfig::default()
        }
    };

    let deck: SharedDeck = Arc::new(Mutex::new(HidDeck::open_first()?));
    let grabber = Arc::new(NativeGrabber::new()?);

    // Pointer control is optional: mirroring still works without it.
    let pointer: Option<Arc<dyn PointerController>> = if config.pointer.enabled {
        match EnigoPointer::new() {
            Ok(pointer) => Some(Arc::new(pointer)),
            Err(e) => {
                warn!(error = %e, "pointer backend unavailable, key clicks disabled");
                None
            }
        }
    } else {
        info!("pointer control disabled by config");
        None
    };

    let mut monitor = MonitorService::new(deck, grabber, pointer, config);
    monitor.run().await?;

    info!("DeckMirror stopped");
    Ok(())
}
