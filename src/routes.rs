use crate::{
    api::{hr, leave_request, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

/// Malformed JSON bodies, including dates not in YYYY-MM-DD form, answer 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid request body: {err}. Dates use YYYY-MM-DD.")).into()
    })
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
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::my_leaves))
                            .route(web::post().to(leave_request::create_leave)),
                    ),
            )
            .service(
                web::scope("/hr")
                    // /hr/leave
                    .service(web::resource("/leave").route(web::get().to(hr::leave_panel)))
                    // /hr/leave/{id}/approve
                    .service(
                        web::resource("/leave/{id}/approve")
                            .route(web::put().to(hr::approve_leave)),
                    )
                    // /hr/leave/{id}/reject
                    .service(
                        web::resource("/leave/{id}/reject")
                            .route(web::put().to(hr::reject_leave)),
                    )
                    .service(web::resource("/dashboard").route(web::get().to(hr::dashboard)))
                    .service(web::resource("/overview").route(web::get().to(hr::leave_overview)))
                    // /hr/users
                    .service(
                        web::resource("/users")
                            .route(web::get().to(users::list_users))
                            .route(web::post().to(users::create_user)),
                    )
                    // /hr/users/{id}
                    .service(web::resource("/users/{id}").route(web::put().to(users::update_user)))
                    .service(
                        web::resource("/users/{id}/activate")
                            .route(web::put().to(users::activate_user)),
                    )
                    .service(
                        web::resource("/users/{id}/deactivate")
                            .route(web::put().to(users::deactivate_user)),
                    ),
            ),
    );
}

// LOGIN
//  └─ access_token (15 min)

// API REQUEST
//  └─ Authorization: Bearer access_token
