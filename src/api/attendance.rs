use crate::auth::auth::AuthUser;
use crate::device::camera::CapturedFrame;
use crate::geo::{self, GeofenceVerdict};
use crate::model::attendance::{AttendanceEvent, AttendanceStatus, CheckIn};
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ClockInRequest {
    #[schema(example = 7)]
    pub project_id: u64,

    #[schema(example = 23.8103, nullable = true)]
    pub latitude: Option<f64>,

    #[schema(example = 90.4125, nullable = true)]
    pub longitude: Option<f64>,

    #[schema(example = true)]
    pub liveness_verified: bool,

    /// Captured still frame as `data:image/...;base64,...`
    #[schema(example = "data:image/jpeg;base64,/9j/4A==")]
    pub frame: Option<String>,

    #[schema(example = "kiosk-lobby-2")]
    pub device_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct ClockInResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    #[schema(example = "present")]
    pub status: AttendanceStatus,
    #[schema(example = true)]
    pub is_within_radius: bool,
    #[schema(example = 12.4, nullable = true)]
    pub distance_meters: Option<f64>,
}

async fn resolve_employee(auth: &AuthUser, state: &AppState) -> actix_web::Result<u64> {
    if let Some(id) = auth.employee_id {
        return Ok(id);
    }

    match state.employees.employee_for_user(auth.user_id).await {
        Ok(Some(id)) => Ok(id),
        Ok(None) => {
            warn!(user_id = auth.user_id, username = %auth.username, "No employee profile for user");
            Err(actix_web::error::ErrorForbidden("No employee profile"))
        }
        Err(e) => {
            error!(error = %e, user_id = auth.user_id, username = %auth.username, "Employee lookup failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "message": message.into() }))
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = ClockInRequest,
    responses(
        (status = 200, description = "Checked in (stored or buffered for sync)", body = ClockInResponse),
        (status = 400, description = "Outside geofence, bad coordinates or missing liveness capture", body = Object, example = json!({
            "message": "You are 250m away from Harbour Tower. Required: 200m",
            "distance_meters": 250,
            "radius_meters": 200
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Project site not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<ClockInRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = resolve_employee(&auth, &state).await?;

    let site = match state.sites.find_site(payload.project_id).await {
        Ok(Some(site)) => site,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Project site not found"
            })));
        }
        Err(e) => {
            error!(error = %e, project_id = payload.project_id, "Site lookup failed");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    let position = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lng)) if geo::valid_coordinates(lat, lng) => Some((lat, lng)),
        (None, None) => None,
        _ => return Ok(bad_request("Invalid coordinates")),
    };

    let verdict = match (position, site.centre()) {
        (Some((lat, lng)), _) => geo::evaluate(&site, lat, lng),
        (None, None) => GeofenceVerdict {
            distance_meters: None,
            radius_meters: site.radius_meters,
            within_radius: true,
        },
        (None, Some(_)) => return Ok(bad_request("Location is required to clock in at this site")),
    };

    if !verdict.within_radius {
        let (distance, radius) = verdict.rounded();
        info!(employee_id, site_id = site.id, distance, radius, "Clock-in outside geofence");
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("You are {distance}m away from {}. Required: {radius}m", site.title),
            "distance_meters": distance,
            "radius_meters": radius
        })));
    }

    let frame = payload
        .frame
        .as_deref()
        .map(CapturedFrame::from_data_url)
        .transpose();
    let frame = match frame {
        Ok(Some(frame)) if payload.liveness_verified => frame,
        Ok(_) => return Ok(bad_request("Liveness capture required")),
        Err(e) => return Ok(bad_request(e.to_string())),
    };
    debug!(employee_id, mime = %frame.mime, bytes = frame.bytes.len(), "Liveness frame received");

    let event = AttendanceEvent::facial_check_in(CheckIn {
        employee_id,
        site: &site,
        verdict: &verdict,
        position,
        liveness_verified: true,
        device_id: &payload.device_id,
        at: state.clock.now(),
        late_after: state.late_after,
    });
    let status = event.status;

    // Buffered writes answer exactly like stored ones.
    if let Err(e) = state.writer.write(event).await {
        error!(error = %e, employee_id, "Clock-in could not be stored or buffered");
        return Err(actix_web::error::ErrorInternalServerError(
            "Internal Server Error",
        ));
    }

    Ok(HttpResponse::Ok().json(ClockInResponse {
        message: "Checked in successfully".to_string(),
        status,
        is_within_radius: verdict.within_radius,
        distance_meters: verdict.distance_meters,
    }))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let employee_id = resolve_employee(&auth, &state).await?;
    let now = state.clock.now();

    let affected = state
        .backend
        .check_out(employee_id, now.date(), now.time())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Check-out failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(bad_request("No active check-in found for today"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully"
    })))
}

/// Pending offline attendance writes
#[utoipa::path(
    get,
    path = "/api/attendance/queue",
    responses(
        (status = 200, description = "Queued events awaiting sync", body = Object, example = json!({
            "pending": 2
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn queue_status(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let pending = state.writer.queue().pending().await.map_err(|e| {
        error!(error = %e, "Failed to read offline queue");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "pending": pending })))
}

/// Flush buffered attendance writes
#[utoipa::path(
    post,
    path = "/api/attendance/sync",
    responses(
        (status = 200, description = "Queue synced (or nothing to sync)", body = Object, example = json!({
            "message": "Successfully synced 2 records.",
            "synced": 2
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 502, description = "Backend rejected the batch; queue kept", body = Object, example = json!({
            "message": "Sync failed: Backend unavailable: timeout"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn sync_queue(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    match state.reconciler.sync().await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({
            "message": report.message(),
            "synced": report.synced
        }))),
        Err(e) => {
            error!(error = %e, user_id = auth.user_id, "Offline sync failed");
            Ok(HttpResponse::BadGateway().json(json!({
                "message": e.to_string()
            })))
        }
    }
}
