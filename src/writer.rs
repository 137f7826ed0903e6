use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::attendance::AttendanceEvent;
use crate::offline::{OfflineQueue, QueueError};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Persistent attendance table with upsert on `(employee_id, date)`.
#[async_trait]
pub trait AttendanceBackend: Send + Sync {
    /// Inserts or updates every event in one request; returns affected rows.
    async fn upsert(&self, events: &[AttendanceEvent]) -> Result<u64, BackendError>;

    /// Stamps check-out on today's open row; returns affected rows.
    async fn check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<u64, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    Queued,
}

/// Writes a clock-in, falling back to the offline queue when the backend fails.
pub struct RecordWriter {
    backend: Arc<dyn AttendanceBackend>,
    queue: Arc<OfflineQueue>,
}

impl RecordWriter {
    pub fn new(backend: Arc<dyn AttendanceBackend>, queue: Arc<OfflineQueue>) -> Self {
        Self { backend, queue }
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Only a failure of the local queue itself is returned as an error.
    pub async fn write(&self, event: AttendanceEvent) -> Result<WriteOutcome, QueueError> {
        match self.backend.upsert(std::slice::from_ref(&event)).await {
            Ok(_) => {
                info!(
                    employee_id = event.employee_id,
                    date = %event.date,
                    project_id = event.project_id,
                    "Attendance recorded"
                );
                Ok(WriteOutcome::Persisted)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    employee_id = event.employee_id,
                    date = %event.date,
                    "Attendance write failed, buffering offline"
                );
                self.queue.enqueue(event, Utc::now()).await?;
                Ok(WriteOutcome::Queued)
            }
        }
    }
}
