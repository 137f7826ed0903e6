use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::model::attendance::AttendanceEvent;
use crate::offline::storage::{QueueError, QueueStorage};

/// Queued payload; `timestamp` only exists while queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineQueueEntry {
    #[serde(flatten)]
    pub event: AttendanceEvent,
    pub timestamp: DateTime<Utc>,
}

/// Shared handle over the queue storage.
///
/// Enqueue and a whole sync run (read, upsert, clear) take the same gate, so a
/// write buffered mid-sync is never wiped by the following clear.
pub struct OfflineQueue {
    storage: Arc<dyn QueueStorage>,
    gate: Mutex<()>,
}

impl OfflineQueue {
    pub fn new(storage: Arc<dyn QueueStorage>) -> Self {
        Self {
            storage,
            gate: Mutex::new(()),
        }
    }

    pub async fn enqueue(&self, event: AttendanceEvent, at: DateTime<Utc>) -> Result<(), QueueError> {
        let _gate = self.gate.lock().await;
        let employee_id = event.employee_id;
        let date = event.date;
        self.storage
            .append(OfflineQueueEntry {
                event,
                timestamp: at,
            })
            .await?;
        info!(employee_id, %date, "Attendance event queued for sync");
        Ok(())
    }

    pub async fn pending(&self) -> Result<usize, QueueError> {
        Ok(self.storage.read().await?.len())
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    pub(crate) fn storage(&self) -> &dyn QueueStorage {
        self.storage.as_ref()
    }
}
