use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::offline::{OfflineQueue, QueueError};
use crate::writer::{AttendanceBackend, BackendError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Sync failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Sync failed: {0}")]
    Queue(#[from] QueueError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
}

impl SyncReport {
    pub fn message(&self) -> String {
        match self.synced {
            0 => "Nothing to sync".to_string(),
            n => format!("Successfully synced {n} records."),
        }
    }
}

/// Flushes the offline queue to the backend as one batch, all-or-nothing.
pub struct SyncReconciler {
    backend: Arc<dyn AttendanceBackend>,
    queue: Arc<OfflineQueue>,
}

impl SyncReconciler {
    pub fn new(backend: Arc<dyn AttendanceBackend>, queue: Arc<OfflineQueue>) -> Self {
        Self { backend, queue }
    }

    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let _gate = self.queue.lock().await;

        let entries = self.queue.storage().read().await?;
        if entries.is_empty() {
            info!("Offline queue empty, nothing to sync");
            return Ok(SyncReport { synced: 0 });
        }

        let events: Vec<_> = entries.into_iter().map(|entry| entry.event).collect();
        if let Err(e) = self.backend.upsert(&events).await {
            error!(error = %e, pending = events.len(), "Offline queue sync failed");
            return Err(e.into());
        }

        self.queue.storage().clear().await?;
        info!(synced = events.len(), "Offline queue synced");

        Ok(SyncReport {
            synced: events.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceEvent, AttendanceStatus, VerificationMethod};
    use crate::offline::MemoryStorage;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Batches {
        fail: AtomicBool,
        calls: AtomicUsize,
        batches: Mutex<Vec<Vec<AttendanceEvent>>>,
    }

    #[async_trait]
    impl AttendanceBackend for Batches {
        async fn upsert(&self, events: &[AttendanceEvent]) -> Result<u64, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(BackendError::Unavailable("503".into()));
            }
            self.batches.lock().unwrap().push(events.to_vec());
            Ok(events.len() as u64)
        }

        async fn check_out(&self, _: u64, _: NaiveDate, _: NaiveTime) -> Result<u64, BackendError> {
            Ok(0)
        }
    }

    fn event(employee_id: u64, day: u32) -> AttendanceEvent {
        AttendanceEvent {
            employee_id,
            date: NaiveDate::from_ymd_opt(2026, 4, day).unwrap(),
            check_in_time: NaiveTime::from_hms_opt(9, 1, 0).unwrap(),
            check_out_time: None,
            status: AttendanceStatus::Present,
            check_in_latitude: Some(1.0),
            check_in_longitude: Some(2.0),
            verification_method: VerificationMethod::FacialRecognition,
            liveness_verified: true,
            is_within_radius: true,
            distance_meters: Some(3.0),
            project_id: 8,
            device_id: "d".into(),
        }
    }

    fn setup() -> (Arc<Batches>, Arc<OfflineQueue>, SyncReconciler) {
        let backend = Arc::new(Batches::default());
        let queue = Arc::new(OfflineQueue::new(Arc::new(MemoryStorage::new())));
        let reconciler = SyncReconciler::new(backend.clone(), queue.clone());
        (backend, queue, reconciler)
    }

    #[tokio::test]
    async fn empty_queue_makes_no_backend_call() {
        let (backend, _queue, reconciler) = setup();

        let report = reconciler.sync().await.unwrap();
        assert_eq!(report.synced, 0);
        assert_eq!(report.message(), "Nothing to sync");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn queued_entries_go_out_as_one_batch() {
        let (backend, queue, reconciler) = setup();
        queue.enqueue(event(1, 1), Utc::now()).await.unwrap();
        queue.enqueue(event(2, 1), Utc::now()).await.unwrap();

        let report = reconciler.sync().await.unwrap();
        assert_eq!(report.synced, 2);
        assert_eq!(report.message(), "Successfully synced 2 records.");
        assert_eq!(queue.pending().await.unwrap(), 0);

        let batches = backend.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![event(1, 1), event(2, 1)]);
    }

    #[tokio::test]
    async fn failure_leaves_queue_untouched() {
        let (backend, queue, reconciler) = setup();
        backend.fail.store(true, Ordering::SeqCst);
        queue.enqueue(event(1, 2), Utc::now()).await.unwrap();
        queue.enqueue(event(1, 3), Utc::now()).await.unwrap();

        let err = reconciler.sync().await.unwrap_err();
        assert!(matches!(err, SyncError::Backend(_)));
        assert_eq!(queue.pending().await.unwrap(), 2);

        backend.fail.store(false, Ordering::SeqCst);
        assert_eq!(reconciler.sync().await.unwrap().synced, 2);
    }

    #[tokio::test]
    async fn concurrent_syncs_submit_once() {
        let (backend, queue, reconciler) = setup();
        queue.enqueue(event(4, 5), Utc::now()).await.unwrap();

        let (a, b) = tokio::join!(reconciler.sync(), reconciler.sync());
        let mut counts = [a.unwrap().synced, b.unwrap().synced];
        counts.sort();

        assert_eq!(counts, [0, 1]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_keeps_its_cause() {
        let err = SyncError::from(BackendError::Unavailable("503".into()));
        assert_eq!(err.to_string(), "Sync failed: Backend unavailable: 503");
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "Backend unavailable: 503");

        let err = SyncError::from(QueueError::from(std::io::Error::other("disk full")));
        assert!(matches!(err, SyncError::Queue(QueueError::Io(_))));
        assert!(std::error::Error::source(&err).is_some());
    }
}
