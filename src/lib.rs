//! Backend for the club website: relays form submissions to an external
//! webhook, stores uploaded images for a bounded window, and implements the
//! persisted multi-step membership signup flow.
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};

pub mod catalog;
pub mod domain;
pub mod dto;
pub mod forms;
pub mod models;
pub mod routes;
pub mod services;
pub mod signup;
pub mod validation;

use domain::UploadRoot;
use models::config::ServerConfig;
use services::cloudinary::CloudinaryClient;
use services::registry::TempFileRegistry;
use services::relay::SubmissionRelay;
use services::uploads::UploadService;

pub async fn run(config: ServerConfig) -> io::Result<()> {
    let registry = TempFileRegistry::new(
        UploadRoot::new(PathBuf::from(&config.upload_path)),
        Duration::from_secs(config.retention_secs),
    )
    .map_err(io::Error::other)?;
    match registry.sweep_orphans() {
        Ok(0) => {}
        Ok(removed) => log::info!("removed {removed} stale upload(s) from a previous run"),
        Err(err) => log::warn!("orphan sweep failed: {err}"),
    }

    let relay = SubmissionRelay::new(config.webhook_url.clone()).map_err(io::Error::other)?;
    let image_host = match config.cloudinary.clone() {
        Some(cloudinary) => Some(CloudinaryClient::new(cloudinary).map_err(io::Error::other)?),
        None => {
            log::info!("no image host configured, uploads stay on local disk");
            None
        }
    };
    let uploads = UploadService::new(registry, image_host);

    let bind_address = (config.address.clone(), config.port);
    let allowed_origins = config.allowed_origins.clone();
    let config_data = web::Data::new(config);
    let relay_data = web::Data::new(relay);
    let uploads_data = web::Data::new(uploads);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .supports_credentials();
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(config_data.clone())
            .app_data(relay_data.clone())
            .app_data(uploads_data.clone())
            .service(routes::api::relay_email_get)
            .service(routes::api::relay_email_post)
            .service(routes::api::upload_file)
            .service(routes::api::download_file)
            .service(routes::api::health)
            .service(routes::catalog::teams)
            .service(routes::catalog::sponsor_packages)
            .service(routes::catalog::contact)
    })
    .bind(bind_address)?
    .run()
    .await
}
