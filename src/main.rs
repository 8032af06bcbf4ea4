use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use mematch::config::{Settings, StorageBackend};
use mematch::routes::auth::TokenVerifier;
use mematch::routes::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use mematch::routes::{self, AppState};
use mematch::services::{
    CacheManager, MatchListCache, MatchStore, MemoryStore, MessageStore, PostgresClient, UserStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type Stores = (Arc<dyn UserStore>, Arc<dyn MatchStore>, Arc<dyn MessageStore>);

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

async fn build_stores(settings: &Settings) -> std::io::Result<Stores> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            Ok((store.clone(), store.clone(), store))
        }
        StorageBackend::Postgres => {
            let db = &settings.database;
            let postgres = PostgresClient::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!("PostgreSQL client initialized (max: {} connections)", db.max_connections.unwrap_or(10));
            let store = Arc::new(postgres);
            Ok((store.clone(), store.clone(), store))
        }
    }
}

async fn build_cache(settings: &Settings) -> Option<Arc<dyn MatchListCache>> {
    if !settings.cache.enabled {
        info!("Match list cache disabled");
        return None;
    }

    let ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_size = settings.cache.l1_cache_size.unwrap_or(1000);

    match CacheManager::new(&settings.cache.redis_url, l1_size, ttl).await {
        Ok(cache) => {
            info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_size, ttl);
            Some(Arc::new(cache))
        }
        Err(e) => {
            warn!("Failed to connect to Redis ({}), running without cache", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&settings.logging.level, &settings.logging.format);
    info!("Starting MeMatch service...");

    let (users, matches, messages) = build_stores(&settings).await?;
    let cache = build_cache(&settings).await;
    let tokens = TokenVerifier::new(&settings.auth.jwt_secret);

    let app_state = AppState::new(users, matches, messages, cache, tokens);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
