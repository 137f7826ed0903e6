use std::sync::Arc;

use chrono::NaiveTime;

use crate::clock_in::Clock;
use crate::store::{EmployeeDirectory, SiteDirectory};
use crate::sync::SyncReconciler;
use crate::writer::{AttendanceBackend, RecordWriter};

/// Shared handler state.
pub struct AppState {
    pub sites: Arc<dyn SiteDirectory>,
    pub employees: Arc<dyn EmployeeDirectory>,
    pub backend: Arc<dyn AttendanceBackend>,
    pub writer: Arc<RecordWriter>,
    pub reconciler: Arc<SyncReconciler>,
    pub clock: Arc<dyn Clock>,
    pub late_after: Option<NaiveTime>,
}
