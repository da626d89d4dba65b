use crate::error::{ApiError, MessageResponse};
use crate::middleware::MAX_BODY_BYTES;
use actix_web::error::JsonPayloadError;
use actix_web::{get, web, HttpResponse};
use log::debug;
pub mod articles;
pub mod auth;
pub mod client;
pub mod counters;

pub const GREETING: &str = "Hi there!";

#[get("")]
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new(GREETING))
}

/// Body extraction failures answer with the same JSON error shape as handlers.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err, _req| {
            debug!("Rejected JSON body: {}", err);
            match err {
                JsonPayloadError::Overflow => {
                    ApiError::PayloadTooLarge("Request body too large".to_owned()).into()
                }
                _ => ApiError::BadRequest("Invalid JSON body".to_owned()).into(),
            }
        })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        debug!("Rejected path parameters: {}", err);
        ApiError::BadRequest("Invalid path parameters".to_owned()).into()
    })
}

/// Everything under `/api`. Fixed segments are registered before `{slug}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(index)
            .service(articles::popular_articles)
            .service(articles::quick_search)
            .service(articles::search_articles)
            .service(articles::create_article)
            .service(articles::list_articles)
            .service(articles::list_by_category_limited)
            .service(articles::list_by_category)
            .service(articles::count_articles)
            .service(counters::record_view)
            .service(counters::toggle_like)
            .service(counters::like_status)
            .service(articles::get_article)
            .service(auth::login)
            .service(auth::logout)
            .service(auth::check),
    );
}
