use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::offline::queue::OfflineQueueEntry;

/// Storage key the queue lives under.
pub const QUEUE_KEY: &str = "attendance_sync_queue";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Offline queue I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Offline queue is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable buffer of attendance writes awaiting sync.
#[async_trait]
pub trait QueueStorage: Send + Sync {
    async fn read(&self) -> Result<Vec<OfflineQueueEntry>, QueueError>;
    async fn append(&self, entry: OfflineQueueEntry) -> Result<(), QueueError>;
    async fn clear(&self) -> Result<(), QueueError>;
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<Vec<OfflineQueueEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStorage for MemoryStorage {
    async fn read(&self) -> Result<Vec<OfflineQueueEntry>, QueueError> {
        Ok(self.entries.lock().await.clone())
    }

    async fn append(&self, entry: OfflineQueueEntry) -> Result<(), QueueError> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn clear(&self) -> Result<(), QueueError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

/// JSON array in `<dir>/attendance_sync_queue.json`, replaced atomically on write.
pub struct JsonFileStorage {
    path: PathBuf,
    io: Mutex<()>,
}

impl JsonFileStorage {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, QueueError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{QUEUE_KEY}.json"));
        debug!(path = %path.display(), "Offline queue opened");

        Ok(Self {
            path,
            io: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<OfflineQueueEntry>, QueueError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&raw).map_err(|e| {
            warn!(error = %e, path = %self.path.display(), "Offline queue could not be parsed");
            QueueError::from(e)
        })
    }

    async fn store(&self, entries: &[OfflineQueueEntry]) -> Result<(), QueueError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(entries)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl QueueStorage for JsonFileStorage {
    async fn read(&self) -> Result<Vec<OfflineQueueEntry>, QueueError> {
        let _io = self.io.lock().await;
        self.load().await
    }

    async fn append(&self, entry: OfflineQueueEntry) -> Result<(), QueueError> {
        let _io = self.io.lock().await;
        let mut entries = self.load().await?;
        entries.push(entry);
        self.store(&entries).await
    }

    async fn clear(&self) -> Result<(), QueueError> {
        let _io = self.io.lock().await;
        self.store(&[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceEvent, AttendanceStatus, VerificationMethod};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn entry(employee_id: u64) -> OfflineQueueEntry {
        OfflineQueueEntry {
            event: AttendanceEvent {
                employee_id,
                date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
                check_in_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                check_out_time: None,
                status: AttendanceStatus::Present,
                check_in_latitude: Some(23.7),
                check_in_longitude: Some(90.4),
                verification_method: VerificationMethod::FacialRecognition,
                liveness_verified: true,
                is_within_radius: true,
                distance_meters: Some(12.5),
                project_id: 3,
                device_id: "tablet-7".into(),
            },
            timestamp: Utc.with_ymd_and_hms(2026, 5, 4, 3, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn memory_storage_round() {
        let storage = MemoryStorage::new();
        assert!(storage.read().await.unwrap().is_empty());
        storage.append(entry(1)).await.unwrap();
        storage.append(entry(2)).await.unwrap();
        assert_eq!(storage.read().await.unwrap().len(), 2);
        storage.clear().await.unwrap();
        assert!(storage.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = JsonFileStorage::open(dir.path()).await.unwrap();
            assert!(storage.read().await.unwrap().is_empty());
            storage.append(entry(1)).await.unwrap();
            storage.append(entry(2)).await.unwrap();
        }

        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        let entries = storage.read().await.unwrap();
        assert_eq!(entries, vec![entry(1), entry(2)]);
        assert_eq!(storage.path(), dir.path().join("attendance_sync_queue.json"));

        storage.clear().await.unwrap();
        assert!(storage.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_is_flat_json_array_with_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        storage.append(entry(9)).await.unwrap();

        let raw = std::fs::read_to_string(storage.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &json.as_array().unwrap()[0];
        assert_eq!(first["employee_id"], 9);
        assert_eq!(first["verification_method"], "facial_recognition");
        assert!(first.get("timestamp").is_some());
        assert!(first.get("event").is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        std::fs::write(storage.path(), b"{not json").unwrap();

        assert!(matches!(storage.read().await, Err(QueueError::Corrupt(_))));
    }
}
