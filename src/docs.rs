use crate::api::attendance::{ClockInRequest, ClockInResponse};
use crate::auth::handlers::LoginResponse;
use crate::model::attendance::{AttendanceEvent, AttendanceStatus, VerificationMethod};
use crate::model::project_site::ProjectSite;
use crate::models::LoginReqDto;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Clock-In API",
        version = "1.0.0",
        description = r#"
## Attendance Clock-In

Server side of the geofenced clock-in flow.

### Key Features
- **Clock-in** with geofence enforcement (distance is always recomputed here)
  and a captured liveness frame
- **Check-out** for the current day
- **Offline buffer**: writes the database rejects are queued and reported as
  success; HR/Admin can inspect and sync the queue
- **Project sites** with their geofence radius

### Security
Endpoints under `/api` require a **JWT Bearer** access token from `/auth/login`.

Note: the liveness step is a timed prompt, not a biometric verification.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::attendance::clock_in,
        crate::api::attendance::check_out,
        crate::api::attendance::queue_status,
        crate::api::attendance::sync_queue,

        crate::api::project::list_projects
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            ClockInRequest,
            ClockInResponse,
            AttendanceEvent,
            AttendanceStatus,
            VerificationMethod,
            ProjectSite
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Authentication"),
        (name = "Attendance", description = "Clock-in, check-out and offline sync"),
        (name = "Projects", description = "Project sites and geofences"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_clock_in_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        assert!(paths.contains(&"/api/attendance".to_string()));
        assert!(paths.contains(&"/api/attendance/sync".to_string()));
        assert!(paths.contains(&"/auth/login".to_string()));
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer_auth"));
    }
}
