pub mod queue;
pub mod storage;

pub use queue::{OfflineQueue, OfflineQueueEntry};
pub use storage::{JsonFileStorage, MemoryStorage, QueueError, QueueStorage};
