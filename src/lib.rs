#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{Condition, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use env_logger::Env;
use log::{info, warn};
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod schema;

use auth::AuthService;
use config::Config;
use middleware::RequestFilter;
use routes::client::ClientBundle;

pub async fn run() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("inkpress=info,actix_web=info"))
        .init();

    let config = Config::from_env()?;
    let pool = db::create_connection_pool(&config.database_url)?;
    db::run_migrations(&pool)?;

    let auth = AuthService::from_config(&config);
    let client = ClientBundle::new(config.client_dir.clone());
    if client.is_present() {
        info!("Serving client bundle from {}", client.root().display());
    } else {
        warn!(
            "No client bundle in {}, serving the API only",
            client.root().display()
        );
    }
    let origin = config.client_origin.clone();
    let show_error_detail = !config.is_production();

    info!(
        "Starting server on {} ({:?})",
        config.bind_address, config.environment
    );
    HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(show_error_detail, middleware::error_detail()))
            .wrap(RequestFilter)
            .wrap(
                Cors::new()
                    .allowed_origin(&origin)
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
                    .supports_credentials()
                    .max_age(3600)
                    .finish(),
            )
            .wrap(middleware::security_headers())
            .wrap(Logger::default())
            .data(pool.clone())
            .data(auth.clone())
            .data(client.clone())
            .app_data(routes::json_config())
            .app_data(routes::path_config())
            .configure(routes::configure)
            .default_service(web::route().to(routes::client::fallback))
    })
    .bind(&config.bind_address)?
    .run()
    .await?;
    Ok(())
}
