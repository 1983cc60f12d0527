// src/main.rs
mod config;
mod dtos;
mod handlers;
mod middleware;
mod models;
mod repositories;
mod services;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info, warn};

use crate::config::{AppConfig, StorageBackend};
use crate::repositories::{MemoryRepository, PgRepository, Repository};
use crate::services::auth_services::AuthService;
use crate::services::like_services::LikeLedger;
use crate::services::session_services::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub upload_dir: PathBuf,
}

async fn open_repository(storage: StorageBackend) -> anyhow::Result<Arc<dyn Repository>> {
    match storage {
        StorageBackend::Postgres => {
            info!(
                "Postgres: {}@{}/{} (password {})",
                env::var("PG_USER").unwrap_or_default(),
                env::var("PG_HOST").unwrap_or_default(),
                env::var("PG_DB").unwrap_or_default(),
                if env::var("PG_PASS").is_ok() { "[REDACTED]" } else { "unset" },
            );
            let pool = config::get_pg_pool()?;
            let repo = PgRepository::new(pool);
            repo.init_schema().await?;
            Ok(Arc::new(repo))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on restart");
            Ok(Arc::new(MemoryRepository::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let repo = match open_repository(cfg.storage).await {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to open storage: {:#}", e);
            std::process::exit(1);
        }
    };

    let auth_service = match AuthService::new(repo.clone(), cfg.hash_cost) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to set up password hashing: {}", e);
            std::process::exit(1);
        }
    };
    let auth_data = web::Data::new(auth_service);
    let ledger_data = web::Data::new(LikeLedger::new(repo.clone()));
    if !cfg.secure_cookies {
        warn!("COOKIE_SECURE is off; session cookies will travel over plain HTTP");
    }
    let session_data = web::Data::new(
        SessionStore::new(cfg.session_ttl).with_secure_cookies(cfg.secure_cookies),
    );

    let state = web::Data::new(AppState {
        repo,
        upload_dir: cfg.upload_dir.clone(),
    });

    info!("Uploads go to {}", cfg.upload_dir.display());
    let bind_address = format!("0.0.0.0:{}", cfg.port);
    info!("Starting server on {}", bind_address);

    let allowed_origins = cfg.allowed_origins.clone();
    let max_body_bytes = cfg.max_body_bytes;

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["content-type", "accept", "x-requested-with"])
            .supports_credentials()
            .max_age(3600);

        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .app_data(auth_data.clone())
            .app_data(ledger_data.clone())
            .app_data(session_data.clone())
            .app_data(web::JsonConfig::default().limit(max_body_bytes))
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
