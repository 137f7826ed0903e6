use actix_web::{HttpResponse, Responder, web};
use tracing::error;

use crate::model::project_site::ProjectSite;
use crate::state::AppState;

/// List project sites available for clock-in
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Project sites", body = Vec<ProjectSite>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_projects(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let sites = state.sites.list_sites().await.map_err(|e| {
        error!(error = %e, "Failed to list project sites");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(sites))
}
