mod sync;

pub(crate) use sync::{start_online_listener, sync_now};

use crate::api::{ApiClient, Transport};
use crate::models::{MemoDraft, MemoSource, QueuedImage};
use crate::storage::{decode_json, encode_json, KeyValueStore, Record, StorageError, TypedStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

pub(crate) const OFFLINE_QUEUE_KEY: &str = "offline_memo_queue";

/// Replay attempts before an operation is discarded.
pub(crate) const MAX_REPLAY_ATTEMPTS: u32 = 3;

/// A memo creation deferred until the network is back.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueuedOperation {
    pub content: String,
    #[serde(default)]
    pub images: Vec<QueuedImage>,
    #[serde(default)]
    pub source: MemoSource,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
}

impl QueuedOperation {
    /// Stable across replays: `retry_count` is the only field a pass changes.
    fn identity(&self) -> (DateTime<Utc>, String) {
        (self.enqueued_at, self.content.clone())
    }
}

pub(crate) struct OfflineQueueRecord;

impl Record for OfflineQueueRecord {
    const KEY: &'static str = OFFLINE_QUEUE_KEY;
    type Value = Vec<QueuedOperation>;

    fn encode(value: &Vec<QueuedOperation>) -> Result<String, StorageError> {
        encode_json(Self::KEY, value)
    }

    fn decode(raw: &str) -> Result<Vec<QueuedOperation>, StorageError> {
        decode_json(Self::KEY, raw)
    }
}

/// Outcome of one `process_queue` pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ReplayReport {
    pub attempted: usize,
    pub synced: usize,
    pub retained: usize,
    pub dropped: usize,
    /// Another pass was already running; nothing was done.
    pub skipped: bool,
}

impl ReplayReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Clears the in-flight flag however the pass ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone, Debug)]
pub(crate) struct OfflineQueue<S> {
    store: TypedStore<S>,
    in_flight: Arc<AtomicBool>,
}

impl<S: KeyValueStore> OfflineQueue<S> {
    pub fn new(backend: S) -> Self {
        Self {
            store: TypedStore::new(backend),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn add(&self, draft: MemoDraft) -> Result<(), StorageError> {
        let mut queue = self.get_queue()?;
        queue.push(QueuedOperation {
            content: draft.content,
            images: draft.images,
            source: draft.source.unwrap_or_default(),
            enqueued_at: Utc::now(),
            retry_count: 0,
        });
        self.store.set::<OfflineQueueRecord>(&queue)?;
        info!(pending = queue.len(), "memo queued for later sync");
        Ok(())
    }

    /// Oldest first.
    pub fn get_queue(&self) -> Result<Vec<QueuedOperation>, StorageError> {
        Ok(self.store.get::<OfflineQueueRecord>()?.unwrap_or_default())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.delete::<OfflineQueueRecord>()
    }

    #[cfg(test)]
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Replay every queued memo through `client`, in order. Never fails;
    /// per-item errors become retry bookkeeping. At most one pass runs at a
    /// time, a concurrent call returns a skipped report.
    pub async fn process_queue<T, A>(&self, client: &ApiClient<T, A>) -> ReplayReport
    where
        T: Transport,
        A: KeyValueStore,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("offline queue replay already running; skipping");
            return ReplayReport::skipped();
        }
        let _guard = InFlight(&self.in_flight);

        let snapshot = match self.get_queue() {
            Ok(q) => q,
            Err(e) => {
                error!(error = %e, "could not read offline queue");
                return ReplayReport::default();
            }
        };
        if snapshot.is_empty() {
            return ReplayReport::default();
        }

        let mut report = ReplayReport {
            attempted: snapshot.len(),
            ..ReplayReport::default()
        };
        let snapshot_ids: HashSet<_> = snapshot.iter().map(QueuedOperation::identity).collect();
        let mut retained = Vec::new();

        for mut op in snapshot {
            match client
                .publish_memo(&op.content, &op.images, op.source)
                .await
            {
                Ok(()) => {
                    info!(enqueued_at = %op.enqueued_at, source = %op.source, "offline memo synced");
                    report.synced += 1;
                }
                Err(e) => {
                    op.retry_count += 1;
                    if op.retry_count < MAX_REPLAY_ATTEMPTS {
                        warn!(
                            error = %e,
                            source = %op.source,
                            retry_count = op.retry_count,
                            "offline memo sync failed; will retry"
                        );
                        retained.push(op);
                    } else {
                        error!(
                            error = %e,
                            source = %op.source,
                            retry_count = op.retry_count,
                            "offline memo sync failed too often; dropping it"
                        );
                        report.dropped += 1;
                    }
                }
            }
        }

        // The queue may have been cleared or appended to while this pass was
        // awaiting the network.
        match self.get_queue() {
            Ok(current) => retained = reconcile(retained, current, &snapshot_ids),
            Err(e) => warn!(error = %e, "could not re-read offline queue"),
        }
        report.retained = retained.len();

        let persisted = if retained.is_empty() {
            self.clear()
        } else {
            self.store.set::<OfflineQueueRecord>(&retained)
        };
        if let Err(e) = persisted {
            error!(error = %e, "could not persist offline queue");
        }

        report
    }
}

/// Retained items still present in storage, followed by items that were not
/// part of the pass's snapshot.
fn reconcile(
    retained: Vec<QueuedOperation>,
    current: Vec<QueuedOperation>,
    snapshot_ids: &HashSet<(DateTime<Utc>, String)>,
) -> Vec<QueuedOperation> {
    let current_ids: HashSet<_> = current.iter().map(QueuedOperation::identity).collect();
    retained
        .into_iter()
        .filter(|op| current_ids.contains(&op.identity()))
        .chain(
            current
                .into_iter()
                .filter(|op| !snapshot_ids.contains(&op.identity())),
        )
        .collect()
}
