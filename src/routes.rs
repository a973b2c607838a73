use crate::{
    api::leave_request,
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::json_payload_error,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let burst = requests_per_min.max(1);
    let per_ms = 60_000 / u64::from(burst);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .configure(protected_routes),
    );
}

/// Everything behind authentication, mounted under the API prefix.
pub fn protected_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_payload_error))
        .service(web::resource("/me").route(web::get().to(handlers::me)))
        .service(
            web::scope("/leave")
                // /leave
                .service(
                    web::resource("")
                        .route(web::get().to(leave_request::leave_list))
                        .route(web::post().to(leave_request::create_leave)),
                )
                // static segments before /leave/{id}
                .service(
                    web::resource("/pending").route(web::get().to(leave_request::pending_leaves)),
                )
                .service(
                    web::resource("/balance").route(web::get().to(leave_request::leave_balance)),
                )
                .service(
                    web::resource("/balances")
                        .route(web::get().to(leave_request::leave_balances)),
                )
                .service(web::resource("/stats").route(web::get().to(leave_request::leave_stats)))
                .service(
                    web::resource("/stats/departments")
                        .route(web::get().to(leave_request::leave_stats_by_department)),
                )
                // /leave/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(leave_request::get_leave))
                        .route(web::delete().to(leave_request::withdraw_leave)),
                )
                // /leave/{id}/approve
                .service(
                    web::resource("/{id}/approve")
                        .route(web::put().to(leave_request::approve_leave)),
                )
                // /leave/{id}/reject
                .service(
                    web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)),
                ),
        );
}

// LOGIN
//  └─ access_token (15 min)

// API REQUEST
//  └─ Authorization: Bearer access_token
