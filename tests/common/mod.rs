#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use attendance::clock_in::Clock;
use attendance::device::camera::{Camera, CameraError, CapturedFrame, Facing, VideoStream};
use attendance::device::geolocation::{LocationError, LocationProvider, Position, PositionOptions};
use attendance::geo::EARTH_RADIUS_METERS;
use attendance::model::attendance::AttendanceEvent;
use attendance::model::project_site::ProjectSite;
use attendance::store::{EmployeeDirectory, SiteDirectory};
use attendance::writer::{AttendanceBackend, BackendError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub const SITE_LAT: f64 = 23.8103;
pub const SITE_LNG: f64 = 90.4125;

pub fn site_with_centre() -> ProjectSite {
    ProjectSite {
        id: 7,
        title: "Harbour Tower".into(),
        latitude: Some(SITE_LAT),
        longitude: Some(SITE_LNG),
        radius_meters: 200.0,
    }
}

pub fn site_without_centre() -> ProjectSite {
    ProjectSite {
        id: 8,
        title: "Remote Crew".into(),
        latitude: None,
        longitude: None,
        radius_meters: 200.0,
    }
}

/// Latitude `meters` due north of the test site.
pub fn north_of_site(meters: f64) -> f64 {
    SITE_LAT + (meters / EARTH_RADIUS_METERS).to_degrees()
}

pub fn at(lat: f64, lng: f64) -> Position {
    Position {
        latitude: lat,
        longitude: lng,
        accuracy_meters: Some(5.0),
    }
}

pub enum Fix {
    At(Position),
    Fail(LocationError),
    Hang,
}

pub struct FakeLocator {
    fix: Mutex<Fix>,
    pub requests: AtomicUsize,
    pub high_accuracy: AtomicBool,
}

impl FakeLocator {
    pub fn new(fix: Fix) -> Arc<Self> {
        Arc::new(Self {
            fix: Mutex::new(fix),
            requests: AtomicUsize::new(0),
            high_accuracy: AtomicBool::new(false),
        })
    }

    pub fn set(&self, fix: Fix) {
        *self.fix.lock().unwrap() = fix;
    }
}

#[async_trait]
impl LocationProvider for FakeLocator {
    async fn current_position(&self, options: PositionOptions) -> Result<Position, LocationError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.high_accuracy.store(options.high_accuracy, Ordering::SeqCst);
        let outcome = match &*self.fix.lock().unwrap() {
            Fix::At(p) => Some(Ok(*p)),
            Fix::Fail(e) => Some(Err(e.clone())),
            Fix::Hang => None,
        };
        match outcome {
            Some(result) => result,
            None => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LocationError::Unavailable("never answered".into()))
            }
        }
    }
}

pub struct FakeStream {
    stopped: Arc<AtomicBool>,
    fail_capture: bool,
}

#[async_trait]
impl VideoStream for FakeStream {
    async fn capture_frame(&mut self) -> Result<CapturedFrame, CameraError> {
        if self.fail_capture {
            return Err(CameraError::Capture("sensor glitch".into()));
        }
        Ok(CapturedFrame {
            mime: "image/jpeg".into(),
            width: 640,
            height: 480,
            bytes: vec![0xff, 0xd8, 0xff, 0xe0],
        })
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }
}

pub struct FakeCamera {
    pub denied: bool,
    pub fail_capture: bool,
    pub stopped: Arc<AtomicBool>,
    pub facing: Mutex<Option<Facing>>,
}

impl FakeCamera {
    pub fn working() -> Self {
        Self {
            denied: false,
            fail_capture: false,
            stopped: Arc::new(AtomicBool::new(false)),
            facing: Mutex::new(None),
        }
    }

    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::working()
        }
    }

    pub fn glitchy() -> Self {
        Self {
            fail_capture: true,
            ..Self::working()
        }
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn open(&self, facing: Facing) -> Result<Box<dyn VideoStream>, CameraError> {
        *self.facing.lock().unwrap() = Some(facing);
        if self.denied {
            return Err(CameraError::Denied("NotAllowedError".into()));
        }
        self.stopped.store(false, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            stopped: self.stopped.clone(),
            fail_capture: self.fail_capture,
        }))
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub rows: Mutex<Vec<AttendanceEvent>>,
    pub check_outs: Mutex<Vec<(u64, NaiveDate)>>,
}

impl FakeBackend {
    pub fn failing() -> Arc<Self> {
        let backend = Self::default();
        backend.fail.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn rows(&self) -> Vec<AttendanceEvent> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttendanceBackend for FakeBackend {
    async fn upsert(&self, events: &[AttendanceEvent]) -> Result<u64, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("connection refused".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        for event in events {
            rows.retain(|r| !(r.employee_id == event.employee_id && r.date == event.date));
            rows.push(event.clone());
        }
        Ok(events.len() as u64)
    }

    async fn check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        _time: NaiveTime,
    ) -> Result<u64, BackendError> {
        let open = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.employee_id == employee_id && r.date == date);
        let mut done = self.check_outs.lock().unwrap();
        if !open || done.contains(&(employee_id, date)) {
            return Ok(0);
        }
        done.push((employee_id, date));
        Ok(1)
    }
}

pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn morning() -> Arc<Self> {
        Arc::new(Self(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
        ))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub struct FakeSites(pub Vec<ProjectSite>);

#[async_trait]
impl SiteDirectory for FakeSites {
    async fn find_site(&self, id: u64) -> Result<Option<ProjectSite>, BackendError> {
        Ok(self.0.iter().find(|s| s.id == id).cloned())
    }

    async fn list_sites(&self) -> Result<Vec<ProjectSite>, BackendError> {
        Ok(self.0.clone())
    }
}

/// Maps user 100 to employee 1000; everyone else has no profile.
pub struct FakeEmployees;

#[async_trait]
impl EmployeeDirectory for FakeEmployees {
    async fn employee_for_user(&self, user_id: u64) -> Result<Option<u64>, BackendError> {
        Ok((user_id == 100).then_some(1000))
    }
}
