use crate::{
    api::{document, employee, timesheet},
    config::Config,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{guard, http::header, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond((60_000 / requests_per_min as u64).max(1))
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let api_limiter = Arc::new(build_limiter(config.rate_api_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter) // rate limiting
            .configure(api_routes),
    );
}

/// Lets the configured front end call the API from the browser.
pub fn cors(config: &Config) -> Cors {
    Cors::default()
        .allowed_origin(&config.cors_allowed_origin)
        .allow_any_method()
        .allow_any_header()
}

/// Multipart bodies go to the form handlers, everything else is read as JSON.
fn multipart() -> impl guard::Guard {
    guard::fn_guard(|ctx| {
        ctx.head()
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
    })
}

/// Resource tree below the API prefix.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employees")
            // /employees
            .service(
                web::resource("")
                    .route(web::get().to(employee::list_employees))
                    .route(
                        web::post()
                            .guard(multipart())
                            .to(employee::create_employee_form),
                    )
                    .route(web::post().to(employee::create_employee)),
            )
            // /employees/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(employee::get_employee))
                    .route(
                        web::put()
                            .guard(multipart())
                            .to(employee::replace_employee_form),
                    )
                    .route(web::put().to(employee::replace_employee))
                    .route(web::patch().to(employee::patch_employee))
                    .route(web::delete().to(employee::delete_employee)),
            )
            .service(
                web::resource("/{id}/upload-photo").route(web::post().to(employee::upload_photo)),
            )
            .service(web::resource("/{id}/photo").route(web::get().to(employee::get_photo)))
            .service(
                web::resource("/{id}/upload-document")
                    .route(web::post().to(employee::upload_document)),
            )
            .service(
                web::resource("/{id}/documents").route(web::get().to(employee::list_documents)),
            ),
    )
    .service(
        web::scope("/documents")
            // /documents/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(document::get_document))
                    .route(web::delete().to(document::delete_document)),
            ),
    )
    .service(
        web::scope("/timesheets")
            // /timesheets
            .service(
                web::resource("")
                    .route(web::get().to(timesheet::list_timesheets))
                    .route(web::post().to(timesheet::create_timesheet)),
            )
            // /timesheets/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(timesheet::get_timesheet))
                    .route(web::put().to(timesheet::replace_timesheet))
                    .route(web::delete().to(timesheet::delete_timesheet)),
            ),
    );
}
