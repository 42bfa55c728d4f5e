//! Scheduled and on-demand scan execution.
//!
//! One worker task owns the orchestrator and is the sole writer of the
//! notes file and the cache. Triggers arrive through a depth-1 channel:
//! the interval ticker and `POST /api/refresh` both `try_send`, and a full
//! channel means a scan is already queued. Triggers are coalesced, never
//! run concurrently. Shutdown simply drops the runtime; an in-flight scan
//! is abandoned.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::cache::CacheStore;
use crate::scan::ScanOrchestrator;

/// Result of requesting a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The scan was queued and will run shortly.
    Queued,
    /// A scan is already queued or running; this request was coalesced.
    AlreadyQueued,
}

/// Cheap cloneable handle for requesting scans (held by the HTTP layer).
#[derive(Clone)]
pub struct ScanTrigger {
    tx: mpsc::Sender<()>,
}

impl ScanTrigger {
    /// Fire-and-forget: never blocks, never waits for scan completion.
    pub fn request(&self) -> TriggerOutcome {
        match self.tx.try_send(()) {
            Ok(()) => TriggerOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(())) => TriggerOutcome::AlreadyQueued,
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("scan worker is gone, trigger dropped");
                TriggerOutcome::AlreadyQueued
            }
        }
    }
}

/// Spawn the interval ticker and the single scan worker.
///
/// The first tick fires immediately, so the process always scans once at
/// startup before serving stale or missing cache data for long.
pub fn spawn_scan_loop(
    orchestrator: ScanOrchestrator,
    cache: Arc<CacheStore>,
    interval_secs: u64,
) -> ScanTrigger {
    let (tx, mut rx) = mpsc::channel::<()>(1);

    let ticker_tx = tx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            // Coalesce with any pending on-demand trigger.
            let _ = ticker_tx.try_send(());
        }
    });

    tokio::spawn(async move {
        info!(interval_secs, "scan worker started");
        while rx.recv().await.is_some() {
            if let Err(err) = orchestrator.run_and_store(&cache).await {
                error!(%err, "scan failed");
            }
        }
    });

    ScanTrigger { tx }
}
