use crate::clock_in::error::ClockInError;
use crate::device::camera::CapturedFrame;
use crate::device::geolocation::Position;
use crate::geo::GeofenceVerdict;
use crate::model::attendance::AttendanceEvent;
use crate::model::project_site::ProjectSite;
use crate::writer::WriteOutcome;

/// Position that passed the geofence.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceFix {
    pub position: Position,
    pub verdict: GeofenceVerdict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClockInState {
    Init,
    Gps {
        site: ProjectSite,
    },
    Biometric {
        site: ProjectSite,
        fix: GeofenceFix,
    },
    Success {
        event: AttendanceEvent,
        frame: CapturedFrame,
        outcome: WriteOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClockInInput {
    SiteSelected(ProjectSite),
    Located(GeofenceFix),
    Abort,
    Captured {
        event: AttendanceEvent,
        frame: CapturedFrame,
        outcome: WriteOutcome,
    },
}

impl ClockInInput {
    fn name(&self) -> &'static str {
        match self {
            ClockInInput::SiteSelected(_) => "select a site",
            ClockInInput::Located(_) => "accept a location",
            ClockInInput::Abort => "return to site selection",
            ClockInInput::Captured { .. } => "complete capture",
        }
    }
}

impl ClockInState {
    pub fn name(&self) -> &'static str {
        match self {
            ClockInState::Init => "init",
            ClockInState::Gps { .. } => "gps",
            ClockInState::Biometric { .. } => "biometric",
            ClockInState::Success { .. } => "success",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClockInState::Success { .. })
    }

    /// The only legal moves; anything else leaves `self` untouched.
    pub fn transition(self, input: ClockInInput) -> Result<Self, (Self, ClockInError)> {
        match (self, input) {
            (ClockInState::Init, ClockInInput::SiteSelected(site)) => Ok(ClockInState::Gps { site }),
            (ClockInState::Gps { site }, ClockInInput::Located(fix)) if fix.verdict.within_radius => {
                Ok(ClockInState::Biometric { site, fix })
            }
            (ClockInState::Gps { site }, ClockInInput::Located(fix)) => {
                let (distance_meters, radius_meters) = fix.verdict.rounded();
                Err((
                    ClockInState::Gps { site: site.clone() },
                    ClockInError::OutsideGeofence {
                        site: site.title,
                        distance_meters,
                        radius_meters,
                    },
                ))
            }
            (ClockInState::Gps { .. }, ClockInInput::Abort) => Ok(ClockInState::Init),
            (ClockInState::Biometric { .. }, ClockInInput::Captured { event, frame, outcome }) => {
                Ok(ClockInState::Success {
                    event,
                    frame,
                    outcome,
                })
            }
            (state, input) => {
                let err = ClockInError::InvalidTransition {
                    state: state.name(),
                    action: input.name(),
                };
                Err((state, err))
            }
        }
    }
}
