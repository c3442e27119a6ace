use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use educycle::config::{Settings, StoreBackend};
use educycle::core::RadiusExpansion;
use educycle::routes::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use educycle::routes::{configure_routes, AppState, StateOptions};
use educycle::services::{
    AppwriteStore, DocumentStore, GeoResolver, IdentityVerifier, JwtVerifier, MemoryStore,
    PostgresStore, StoreError,
};

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match format {
        "json" => subscriber.json().init(),
        "pretty" => subscriber.pretty().init(),
        _ => subscriber.init(),
    }
}

async fn connect_store(settings: &Settings) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match settings.store.backend {
        StoreBackend::Appwrite => {
            let appwrite = settings
                .appwrite
                .clone()
                .ok_or_else(|| StoreError::ApiError("missing [appwrite] settings".to_string()))?;

            Arc::new(AppwriteStore::new(
                appwrite.endpoint,
                appwrite.api_key,
                appwrite.project_id,
                appwrite.database_id,
            )?)
        }
        StoreBackend::Postgres => {
            let database = settings
                .database
                .as_ref()
                .ok_or_else(|| StoreError::ApiError("missing [database] settings".to_string()))?;

            Arc::new(
                PostgresStore::from_settings(
                    &database.url,
                    database.max_connections,
                    database.min_connections,
                    database.acquire_timeout_secs,
                    database.idle_timeout_secs,
                )
                .await?,
            )
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory document store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(store)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting EduCycle backend...");

    let store = connect_store(&settings).await.map_err(|e| {
        error!("Failed to initialize the document store: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    info!("Document store initialized ({:?})", settings.store.backend);

    let geocoder = GeoResolver::new(
        settings.geocoder.base_url.clone(),
        settings.geocoder.user_agent.clone(),
        Duration::from_secs(settings.geocoder.timeout_secs),
    )
    .map_err(|e| {
        error!("Failed to build geocoding client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let verifier: Arc<dyn IdentityVerifier> = Arc::new(JwtVerifier::new(
        &settings.auth.jwt_secret,
        settings.auth.issuer.as_deref(),
        settings.auth.audience.as_deref(),
    ));

    let options = StateOptions {
        collections: settings.collection.clone().into(),
        reputation: (&settings.reputation).into(),
        visibility: (&settings.visibility).into(),
        expansion: RadiusExpansion::new(settings.pickup.expansion_tiers_km.clone()),
        default_radius_km: settings.pickup.default_radius_km,
        max_radius_km: settings.pickup.max_radius_km,
    };

    info!(
        "Pickup search: default {}km, tiers {:?}",
        options.default_radius_km, settings.pickup.expansion_tiers_km
    );

    let app_state = AppState::new(store, geocoder, verifier, options);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
