//! Mirror worker - asynchronous JSON snapshot outbox
//!
//! Mirrors order snapshots to local JSON files, one file per order,
//! rewritten after every mutation. The in-memory store stays the
//! authoritative source of truth: the manager's notification side never
//! blocks and never fails a caller.
//!
//! Unlike a fire-and-forget dual write, failures here are observable.
//! Each write is retried with exponential backoff; an order that keeps
//! failing lands in a dead-letter list that [`MirrorMonitor`] exposes
//! together with written/failed counters.
//!
//! ```text
//! OrderManager ──notify(order_id)──▶ mpsc ──▶ MirrorWorker
//!                                               ├─ load OrderWithItems
//!                                               ├─ write order-<id>.json (tmp + rename)
//!                                               ├─ on failure: retry w/ backoff
//!                                               └─ exhausted: dead-letter list
//! ```

use crate::config::Config;
use crate::orders::OrderStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::models::order::{Order, OrderItem};
use shared::util::now_millis;
use shared::{PosError, PosResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// First retry delay; doubles per attempt
const RETRY_BASE_DELAY_SECS: u64 = 5;
/// Backoff ceiling
const RETRY_MAX_DELAY_SECS: u64 = 60;

/// Snapshot file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    /// When this snapshot was written (UTC millis)
    pub mirrored_at: i64,
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Entry for an order whose mirror write failed permanently
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub order_id: u64,
    pub retry_count: u32,
    pub failed_at: i64,
    pub last_error: String,
}

/// Observable mirror state
#[derive(Debug, Clone, Default)]
pub struct MirrorHealth {
    /// Orders waiting for a (re)write
    pub queued: usize,
    /// Snapshots written successfully
    pub written: u64,
    /// Orders that exhausted their retries
    pub failed: u64,
    pub dead_letters: Vec<DeadLetterEntry>,
}

/// Pending mirror write
#[derive(Debug)]
struct PendingMirror {
    retry_count: u32,
    /// Earliest time of the next attempt (UTC millis)
    next_attempt_at: i64,
}

#[derive(Debug, Default)]
struct MirrorState {
    pending: HashMap<u64, PendingMirror>,
    dead_letters: Vec<DeadLetterEntry>,
    written: u64,
    failed: u64,
}

/// Sender side handed to the order manager
#[derive(Debug, Clone)]
pub struct MirrorHandle {
    tx: mpsc::UnboundedSender<u64>,
}

impl MirrorHandle {
    /// Queue an order for mirroring; a closed worker is logged, never
    /// surfaced
    pub fn notify(&self, order_id: u64) {
        if self.tx.send(order_id).is_err() {
            tracing::warn!(order_id, "Mirror worker is gone, snapshot not queued");
        }
    }
}

/// Read-only view of the worker's health
#[derive(Debug, Clone)]
pub struct MirrorMonitor {
    state: Arc<Mutex<MirrorState>>,
}

impl MirrorMonitor {
    pub fn health(&self) -> MirrorHealth {
        let state = self.state.lock();
        MirrorHealth {
            queued: state.pending.len(),
            written: state.written,
            failed: state.failed,
            dead_letters: state.dead_letters.clone(),
        }
    }
}

/// Worker processing the mirror queue
pub struct MirrorWorker {
    store: Arc<OrderStore>,
    dir: PathBuf,
    max_retries: u32,
    scan_interval: Duration,
    tx: mpsc::UnboundedSender<u64>,
    rx: mpsc::UnboundedReceiver<u64>,
    state: Arc<Mutex<MirrorState>>,
}

impl MirrorWorker {
    /// Create a worker writing into the configured mirror directory
    pub fn new(store: Arc<OrderStore>, config: &Config) -> PosResult<Self> {
        let dir = PathBuf::from(&config.mirror_dir);
        std::fs::create_dir_all(&dir)
            .map_err(|e| PosError::internal(format!("create mirror dir {}: {e}", dir.display())))?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            store,
            dir,
            max_retries: config.mirror_max_retries,
            scan_interval: Duration::from_secs(config.mirror_scan_interval_secs.max(1)),
            tx,
            rx,
            state: Arc::new(Mutex::new(MirrorState::default())),
        })
    }

    /// Create the worker and run it on the runtime, unless mirroring is
    /// disabled by configuration
    pub fn spawn(
        store: Arc<OrderStore>,
        config: &Config,
    ) -> PosResult<Option<(MirrorHandle, MirrorMonitor)>> {
        if !config.mirror_enabled {
            tracing::info!("Mirroring disabled by configuration");
            return Ok(None);
        }
        let worker = Self::new(store, config)?;
        let handle = worker.handle();
        let monitor = worker.monitor();
        tokio::spawn(worker.run());
        Ok(Some((handle, monitor)))
    }

    pub fn handle(&self) -> MirrorHandle {
        MirrorHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn monitor(&self) -> MirrorMonitor {
        MirrorMonitor {
            state: self.state.clone(),
        }
    }

    /// Run the worker until every handle is dropped
    pub async fn run(mut self) {
        tracing::info!(dir = %self.dir.display(), "MirrorWorker started");
        let mut scan_interval = tokio::time::interval(self.scan_interval);
        scan_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                order_id = self.rx.recv() => {
                    match order_id {
                        Some(order_id) => {
                            self.enqueue(order_id);
                            self.attempt(order_id);
                        }
                        None => {
                            tracing::info!("Mirror channel closed, shutting down MirrorWorker");
                            break;
                        }
                    }
                }
                _ = scan_interval.tick() => {
                    self.process_due();
                }
            }
        }
    }

    /// Mark an order as needing a write; duplicate notifications coalesce
    fn enqueue(&self, order_id: u64) {
        self.state
            .lock()
            .pending
            .entry(order_id)
            .or_insert(PendingMirror {
                retry_count: 0,
                next_attempt_at: now_millis(),
            });
    }

    /// Retry every pending entry whose backoff has elapsed
    fn process_due(&self) {
        let now = now_millis();
        let due: Vec<u64> = self
            .state
            .lock()
            .pending
            .iter()
            .filter(|(_, p)| p.next_attempt_at <= now)
            .map(|(id, _)| *id)
            .collect();
        for order_id in due {
            self.attempt(order_id);
        }
    }

    /// Try to write one snapshot, updating retry/dead-letter state
    fn attempt(&self, order_id: u64) {
        match self.write_snapshot(order_id) {
            Ok(()) => {
                let mut state = self.state.lock();
                state.pending.remove(&order_id);
                state.written += 1;
                tracing::debug!(order_id, "Order snapshot mirrored");
            }
            Err(PosError::NotFound(_)) => {
                // Orders are never physically deleted; a missing one means
                // the notification outlived the process state it described.
                self.state.lock().pending.remove(&order_id);
                tracing::warn!(order_id, "Mirror notification for unknown order, dropped");
            }
            Err(e) => self.record_failure(order_id, e),
        }
    }

    fn record_failure(&self, order_id: u64, error: PosError) {
        let mut state = self.state.lock();
        let entry = state.pending.entry(order_id).or_insert(PendingMirror {
            retry_count: 0,
            next_attempt_at: now_millis(),
        });
        entry.retry_count += 1;

        if entry.retry_count > self.max_retries {
            let retry_count = entry.retry_count;
            state.pending.remove(&order_id);
            state.failed += 1;
            state.dead_letters.push(DeadLetterEntry {
                order_id,
                retry_count,
                failed_at: now_millis(),
                last_error: error.to_string(),
            });
            tracing::error!(order_id, retry_count, error = %error, "Mirror write failed permanently, dead-lettered");
        } else {
            let delay_secs = (RETRY_BASE_DELAY_SECS << (entry.retry_count - 1).min(8))
                .min(RETRY_MAX_DELAY_SECS);
            entry.next_attempt_at = now_millis() + (delay_secs * 1000) as i64;
            tracing::warn!(order_id, retry = entry.retry_count, delay_secs, error = %error, "Mirror write failed, will retry");
        }
    }

    /// Serialize the order and write it atomically (temp file + rename)
    fn write_snapshot(&self, order_id: u64) -> PosResult<()> {
        let full = self.store.get_order_with_items(order_id)?;
        let snapshot = MirrorSnapshot {
            mirrored_at: now_millis(),
            order: full.order,
            items: full.items,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| PosError::internal(format!("serialize order {order_id}: {e}")))?;

        let path = self.dir.join(format!("order-{order_id}.json"));
        let tmp = self.dir.join(format!("order-{order_id}.json.tmp"));
        std::fs::write(&tmp, &bytes)
            .map_err(|e| PosError::internal(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| PosError::internal(format!("rename {}: {e}", path.display())))?;
        Ok(())
    }
}
