use crate::{
    api::{attendance, project},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter; `None` when the builder rejects the settings.
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

/// Attendance and project routes, mounted under the protected prefix.
pub fn attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            // /attendance
            .service(
                web::resource("")
                    .route(web::post().to(attendance::clock_in))
                    .route(web::put().to(attendance::check_out)),
            )
            // /attendance/queue
            .service(web::resource("/queue").route(web::get().to(attendance::queue_status)))
            // /attendance/sync
            .service(web::resource("/sync").route(web::post().to(attendance::sync_queue))),
    )
    .service(web::resource("/projects").route(web::get().to(project::list_projects)));
}

#[derive(Clone)]
pub struct Limiters {
    login: Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>,
    protected: Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>,
}

impl Limiters {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let login = build_limiter(config.rate_login_per_min)
            .ok_or_else(|| anyhow::anyhow!("invalid RATE_LOGIN_PER_MIN"))?;
        let protected = build_limiter(config.rate_protected_per_min)
            .ok_or_else(|| anyhow::anyhow!("invalid RATE_PROTECTED_PER_MIN"))?;

        Ok(Self {
            login: Arc::new(login),
            protected: Arc::new(protected),
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: Limiters) {
    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(limiters.login)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected) // rate limiting
            .configure(attendance_routes),
    );
}
