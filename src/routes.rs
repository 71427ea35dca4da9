use crate::{
    api::{leave_request, wizard},
    auth::middleware::auth_middleware,
    config::Config,
    model::document::MAX_DOCUMENT_BYTES,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Upload bodies above this are cut off by the transport; anything between
/// the document cap and this still gets the document size error.
const UPLOAD_BODY_LIMIT: usize = 2 * MAX_DOCUMENT_BYTES as usize;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> anyhow::Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit of {requests_per_min} per minute"))?;
    Ok(Governor::new(&cfg))
}

pub struct Limiters {
    protected: Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>,
    upload: Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>,
}

impl Limiters {
    /// Built once so every worker shares the same quotas.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
            upload: Arc::new(build_limiter(config.rate_upload_per_min)?),
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(web::resource("").route(web::get().to(leave_request::leave_list)))
                    // /leave/wizard
                    .service(
                        web::resource("/wizard")
                            .route(web::get().to(wizard::wizard_state))
                            .route(web::delete().to(wizard::reset)),
                    )
                    .service(
                        web::resource("/wizard/category").route(web::put().to(wizard::select_category)),
                    )
                    .service(web::resource("/wizard/period").route(web::put().to(wizard::set_period)))
                    .service(web::resource("/wizard/reason").route(web::put().to(wizard::set_reason)))
                    .service(
                        web::resource("/wizard/documents")
                            .wrap(limiters.upload.clone())
                            .app_data(web::PayloadConfig::new(UPLOAD_BODY_LIMIT))
                            .route(web::post().to(wizard::upload_document)),
                    )
                    .service(
                        web::resource("/wizard/documents/{index}")
                            .route(web::delete().to(wizard::remove_document)),
                    )
                    .service(web::resource("/wizard/advance").route(web::post().to(wizard::advance)))
                    .service(web::resource("/wizard/back").route(web::post().to(wizard::back)))
                    .service(
                        web::resource("/wizard/revisit/{step}").route(web::post().to(wizard::revisit)),
                    )
                    .service(web::resource("/wizard/submit").route(web::post().to(wizard::submit)))
                    // self-service
                    .service(web::resource("/balance").route(web::get().to(leave_request::my_balance)))
                    .service(web::resource("/history").route(web::get().to(leave_request::my_history)))
                    // /leave/employees/{employee_id}/balance
                    .service(
                        web::resource("/employees/{employee_id}/balance")
                            .route(web::get().to(leave_request::employee_balance)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/documents/{index}
                    .service(
                        web::resource("/{id}/documents/{index}")
                            .route(web::get().to(leave_request::download_document)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            ),
    );
}
