use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::geo::GeofenceVerdict;
use crate::model::project_site::ProjectSite;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Leave,
    Holiday,
}

impl AttendanceStatus {
    /// `Late` only when a cutoff is configured and check-in is strictly after it.
    pub fn for_check_in(check_in: NaiveTime, late_after: Option<NaiveTime>) -> Self {
        match late_after {
            Some(cutoff) if check_in > cutoff => AttendanceStatus::Late,
            _ => AttendanceStatus::Present,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationMethod {
    FacialRecognition,
}

/// One attendance row per employee per day, keyed on `(employee_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEvent {
    pub employee_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:02:11", value_type = String)]
    pub check_in_time: NaiveTime,
    /// Written by check-out only; upserts leave the stored value alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    pub verification_method: VerificationMethod,
    pub liveness_verified: bool,
    pub is_within_radius: bool,
    pub distance_meters: Option<f64>,
    pub project_id: u64,
    pub device_id: String,
}

/// Inputs gathered by a completed clock-in.
pub struct CheckIn<'a> {
    pub employee_id: u64,
    pub site: &'a ProjectSite,
    pub verdict: &'a GeofenceVerdict,
    pub position: Option<(f64, f64)>,
    pub liveness_verified: bool,
    pub device_id: &'a str,
    pub at: NaiveDateTime,
    pub late_after: Option<NaiveTime>,
}

impl AttendanceEvent {
    pub fn facial_check_in(check_in: CheckIn<'_>) -> Self {
        let time = check_in.at.time();
        Self {
            employee_id: check_in.employee_id,
            date: check_in.at.date(),
            check_in_time: time,
            check_out_time: None,
            status: AttendanceStatus::for_check_in(time, check_in.late_after),
            check_in_latitude: check_in.position.map(|(lat, _)| lat),
            check_in_longitude: check_in.position.map(|(_, lng)| lng),
            verification_method: VerificationMethod::FacialRecognition,
            liveness_verified: check_in.liveness_verified,
            is_within_radius: check_in.verdict.within_radius,
            distance_meters: check_in.verdict.distance_meters,
            project_id: check_in.site.id,
            device_id: check_in.device_id.to_string(),
        }
    }
}
