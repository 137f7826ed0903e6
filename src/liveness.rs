//! Timed liveness prompt.
//!
//! This is a user-experience placeholder: progress is driven by a timer and no
//! face matching or anti-spoofing happens anywhere. A captured result is always
//! tagged [`LivenessMode::Simulated`] so downstream code can tell it apart from
//! a server-verified check.

use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};
use tokio::sync::watch;
use tracing::debug;

use crate::device::camera::{CameraError, CapturedFrame, VideoStream};

pub const DEFAULT_TICK: Duration = Duration::from_millis(150);
pub const DEFAULT_STEP_PERCENT: u8 = 10;
const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LivenessAction {
    Smile,
    Blink,
    HeadTurn,
}

impl LivenessAction {
    /// Uniform pick over every action.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let all: Vec<Self> = Self::iter().collect();
        *all.choose(rng).unwrap_or(&LivenessAction::Smile)
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            LivenessAction::Smile => "Please smile at the camera",
            LivenessAction::Blink => "Please blink slowly",
            LivenessAction::HeadTurn => "Please turn your head slowly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessMode {
    Simulated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LivenessCapture {
    pub action: LivenessAction,
    pub mode: LivenessMode,
    pub frame: CapturedFrame,
}

/// Drives the progress counter and grabs a frame at 100%.
#[derive(Debug, Clone)]
pub struct LivenessController {
    tick: Duration,
    step: u8,
}

impl Default for LivenessController {
    fn default() -> Self {
        Self::new(DEFAULT_TICK, DEFAULT_STEP_PERCENT)
    }
}

impl LivenessController {
    pub fn new(tick: Duration, step: u8) -> Self {
        Self {
            tick: tick.max(MIN_TICK),
            step: step.clamp(1, 100),
        }
    }

    /// Time from start to the 100% mark.
    pub fn duration(&self) -> Duration {
        let ticks = 100u32.div_ceil(self.step as u32);
        self.tick * ticks
    }

    /// Runs the prompt for `action`, publishing progress (0..=100) on `progress`.
    pub async fn run(
        &self,
        stream: &mut dyn VideoStream,
        action: LivenessAction,
        progress: &watch::Sender<u8>,
    ) -> Result<LivenessCapture, CameraError> {
        if !stream.is_active() {
            return Err(CameraError::Stopped);
        }

        debug!(action = %action, "Liveness prompt started");
        progress.send_replace(0);

        let mut percent: u8 = 0;
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + self.tick, self.tick);
        while percent < 100 {
            interval.tick().await;
            percent = percent.saturating_add(self.step).min(100);
            progress.send_replace(percent);
        }

        let frame = stream.capture_frame().await?;
        debug!(action = %action, bytes = frame.bytes.len(), "Liveness frame captured");

        Ok(LivenessCapture {
            action,
            mode: LivenessMode::Simulated,
            frame,
        })
    }
}
