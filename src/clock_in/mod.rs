//! Clock-in verification flow: site selection, geofence, liveness capture, write.

pub mod error;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::device::camera::{Camera, CameraError, Facing, VideoStream};
use crate::device::geolocation::{LocationError, LocationProvider, Position, PositionOptions};
use crate::geo;
use crate::liveness::{LivenessAction, LivenessController};
use crate::model::attendance::{AttendanceEvent, CheckIn};
use crate::model::project_site::ProjectSite;
use crate::writer::{RecordWriter, WriteOutcome};

pub use error::ClockInError;
pub use state::{ClockInInput, ClockInState, GeofenceFix};

/// Wall clock used to stamp attendance events.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone)]
pub struct ClockInOptions {
    /// `None` waits for the location provider indefinitely.
    pub geolocation_timeout: Option<Duration>,
    pub liveness: LivenessController,
    pub late_after: Option<NaiveTime>,
    pub facing: Facing,
}

impl Default for ClockInOptions {
    fn default() -> Self {
        Self {
            geolocation_timeout: None,
            liveness: LivenessController::default(),
            late_after: None,
            facing: Facing::User,
        }
    }
}

/// One employee's clock-in attempt on one device.
pub struct ClockInFlow {
    employee_id: u64,
    device_id: String,
    state: ClockInState,
    locator: Arc<dyn LocationProvider>,
    stream: Option<Box<dyn VideoStream>>,
    camera_error: Option<CameraError>,
    writer: Arc<RecordWriter>,
    clock: Arc<dyn Clock>,
    options: ClockInOptions,
    action: Option<LivenessAction>,
    progress: watch::Sender<u8>,
    last_error: Option<String>,
}

impl ClockInFlow {
    /// Opens the camera up front; a failure is kept and blocks the biometric step.
    pub async fn mount(
        employee_id: u64,
        device_id: impl Into<String>,
        camera: &dyn Camera,
        locator: Arc<dyn LocationProvider>,
        writer: Arc<RecordWriter>,
        clock: Arc<dyn Clock>,
        options: ClockInOptions,
    ) -> Self {
        let (stream, camera_error) = match camera.open(options.facing).await {
            Ok(stream) => (Some(stream), None),
            Err(e) => {
                warn!(error = %e, employee_id, "Camera unavailable");
                (None, Some(e))
            }
        };
        let last_error = camera_error.as_ref().map(ToString::to_string);
        let (progress, _) = watch::channel(0);

        Self {
            employee_id,
            device_id: device_id.into(),
            state: ClockInState::Init,
            locator,
            stream,
            camera_error,
            writer,
            clock,
            options,
            action: None,
            progress,
            last_error,
        }
    }

    pub fn state(&self) -> &ClockInState {
        &self.state
    }

    pub fn camera_error(&self) -> Option<&CameraError> {
        self.camera_error.as_ref()
    }

    /// Message of the most recent failed step, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn liveness_action(&self) -> Option<LivenessAction> {
        self.action
    }

    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub fn select_site(&mut self, site: ProjectSite) -> Result<(), ClockInError> {
        debug!(site_id = site.id, "Site selected");
        self.apply(ClockInInput::SiteSelected(site))
    }

    pub fn back_to_sites(&mut self) -> Result<(), ClockInError> {
        self.apply(ClockInInput::Abort)
    }

    /// Requests a high-accuracy fix and moves to the biometric step if admitted.
    pub async fn locate(&mut self) -> Result<(), ClockInError> {
        let site = match &self.state {
            ClockInState::Gps { site } => site.clone(),
            other => {
                let state = other.name();
                return self.fail(ClockInError::InvalidTransition {
                    state,
                    action: "request a location",
                });
            }
        };

        let position = match self.request_position().await {
            Ok(position) => position,
            Err(e) => return self.fail(e.into()),
        };

        let verdict = geo::evaluate(&site, position.latitude, position.longitude);
        debug!(
            site_id = site.id,
            distance = ?verdict.distance_meters,
            radius = verdict.radius_meters,
            within = verdict.within_radius,
            "Geofence evaluated"
        );

        if verdict.within_radius {
            if let Some(e) = self.camera_error.clone() {
                return self.fail(e.into());
            }
        }

        self.apply(ClockInInput::Located(GeofenceFix { position, verdict }))?;

        self.action = Some(LivenessAction::random(&mut rand::thread_rng()));
        self.progress.send_replace(0);
        Ok(())
    }

    /// Runs the liveness prompt, captures a frame and writes the attendance event.
    pub async fn capture(&mut self) -> Result<WriteOutcome, ClockInError> {
        let (site, fix) = match &self.state {
            ClockInState::Biometric { site, fix } => (site.clone(), fix.clone()),
            other => {
                let state = other.name();
                return self.fail(ClockInError::InvalidTransition {
                    state,
                    action: "capture",
                });
            }
        };
        let action = *self
            .action
            .get_or_insert_with(|| LivenessAction::random(&mut rand::thread_rng()));

        let captured = match self.stream.as_mut() {
            Some(stream) => {
                self.options
                    .liveness
                    .run(&mut **stream, action, &self.progress)
                    .await
            }
            None => Err(self.camera_error.clone().unwrap_or(CameraError::NotFound)),
        };
        let capture = match captured {
            Ok(capture) => capture,
            Err(e) => return self.fail(e.into()),
        };

        let event = AttendanceEvent::facial_check_in(CheckIn {
            employee_id: self.employee_id,
            site: &site,
            verdict: &fix.verdict,
            position: Some((fix.position.latitude, fix.position.longitude)),
            liveness_verified: true,
            device_id: &self.device_id,
            at: self.clock.now(),
            late_after: self.options.late_after,
        });

        let outcome = match self.writer.write(event.clone()).await {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e.into()),
        };

        self.apply(ClockInInput::Captured {
            event,
            frame: capture.frame,
            outcome,
        })?;
        info!(
            employee_id = self.employee_id,
            site_id = site.id,
            outcome = ?outcome,
            "Clock-in complete"
        );
        Ok(outcome)
    }

    /// Stops the camera. Also runs on drop.
    pub fn teardown(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.stop();
        }
        self.stream = None;
    }

    async fn request_position(&self) -> Result<Position, LocationError> {
        let request = self.locator.current_position(PositionOptions { high_accuracy: true });
        let position = match self.options.geolocation_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| LocationError::Timeout)??,
            None => request.await?,
        };

        if !geo::valid_coordinates(position.latitude, position.longitude) {
            return Err(LocationError::Unavailable(format!(
                "invalid coordinates {}, {}",
                position.latitude, position.longitude
            )));
        }
        Ok(position)
    }

    fn apply(&mut self, input: ClockInInput) -> Result<(), ClockInError> {
        let current = std::mem::replace(&mut self.state, ClockInState::Init);
        match current.transition(input) {
            Ok(next) => {
                debug!(state = next.name(), "Clock-in state changed");
                self.state = next;
                self.last_error = None;
                Ok(())
            }
            Err((unchanged, e)) => {
                self.state = unchanged;
                self.fail(e)
            }
        }
    }

    fn fail<T>(&mut self, e: ClockInError) -> Result<T, ClockInError> {
        warn!(error = %e, state = self.state.name(), employee_id = self.employee_id, "Clock-in step failed");
        self.last_error = Some(e.to_string());
        Err(e)
    }
}

impl Drop for ClockInFlow {
    fn drop(&mut self) {
        self.teardown();
    }
}
