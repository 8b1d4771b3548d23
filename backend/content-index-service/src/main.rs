use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use chrono::Utc;
use content_index::{
    ContentIndex, MemoryTimestampStore, RedisTimestampStore, SystemClock, TimestampStore,
};
use content_index_service::config::StoreBackend;
use content_index_service::db::{create_pool, PgContentSource, MIGRATOR};
use content_index_service::handlers::{self, ContentIndexState};
use content_index_service::middleware::{JwtAuthMiddleware, JwtValidator};
use redis::aio::ConnectionManager;
use redis::RedisError;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: sqlx::PgPool,
    redis_manager: Option<ConnectionManager>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }

    async fn check_redis(&self, conn: &ConnectionManager) -> Result<(), RedisError> {
        let mut conn = conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(RedisError::from((
                redis::ErrorKind::ResponseError,
                "unexpected PING response",
            )))
        }
    }
}

fn component_check<E: std::fmt::Display>(
    name: &str,
    result: Result<(), E>,
    started: Instant,
) -> ComponentCheck {
    let latency_ms = Some(started.elapsed().as_millis() as u64);
    match result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: format!("{} check successful", name),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("{} check failed: {}", name, e),
            latency_ms,
        },
    }
}

async fn health_summary() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "content-index-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let postgres = component_check("PostgreSQL", state.check_postgres().await, start);
    checks.insert("postgresql".to_string(), postgres);

    if let Some(conn) = &state.redis_manager {
        let start = Instant::now();
        let redis = component_check("Redis", state.check_redis(conn).await, start);
        checks.insert("redis".to_string(), redis);
    }

    let ready = checks
        .values()
        .all(|check| matches!(check.status, ComponentStatus::Healthy));
    let status = if ready {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Content Index Service
///
/// Serves each principal a cached list of the content items they can edit,
/// for the keyboard-driven navigation widget.
///
/// # Routes
///
/// - `GET  /api/v1/content-index/` - the caller's index
/// - `GET  /api/v1/content-index/config` - widget configuration
/// - `POST /api/v1/content-index/events` - content mutation hooks
///
/// Runs on port 8090 by default (CONTENT_INDEX_PORT).
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Support container healthchecks via CLI subcommand: `healthcheck`
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" || cmd == "healthcheck-http" {
                let port = std::env::var("CONTENT_INDEX_PORT").unwrap_or_else(|_| "8090".into());
                let url = format!("http://127.0.0.1:{}/api/v1/health", port);
                match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,content_index=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match content_index_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting content-index-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let validator = match &config.auth.jwt_public_key_pem {
        Some(pem) => Some(Arc::new(
            JwtValidator::from_rsa_pem(pem).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
        )),
        None => {
            tracing::warn!(
                "JWT public key not configured; authentication middleware will reject requests"
            );
            None
        }
    };

    let db_pool = create_pool(&config.database).await.map_err(|e| {
        tracing::error!("Database pool creation failed: {:#}", e);
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to create database pool: {}", e),
        )
    })?;
    tracing::info!("Connected to database");

    MIGRATOR.run(&db_pool).await.map_err(|e| {
        tracing::error!("Database migration failed: {:#}", e);
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to run database migrations: {}", e),
        )
    })?;
    tracing::info!("Database migrations applied");

    let mut redis_manager: Option<ConnectionManager> = None;
    let store: Arc<dyn TimestampStore> = match config.store.backend {
        StoreBackend::Redis => {
            let store = RedisTimestampStore::connect(&config.store.redis_url)
                .await
                .map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::Other,
                        format!("Failed to initialize Redis connection: {e}"),
                    )
                })?;
            redis_manager = Some(store.manager());
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory index store; indexes are not shared across instances");
            Arc::new(MemoryTimestampStore::new())
        }
    };

    let source = Arc::new(PgContentSource::new(
        db_pool.clone(),
        config.index.placeholder_status.clone(),
    ));
    let index = ContentIndex::new(store, source, Arc::new(SystemClock), config.index.clone());

    let index_state = web::Data::new(ContentIndexState {
        index,
        api_url: config.api_url.clone(),
    });
    let health_state = web::Data::new(HealthState {
        db_pool,
        redis_manager,
    });
    let auth = JwtAuthMiddleware::new(validator);

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let auth = auth.clone();
        App::new()
            .app_data(index_state.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(content_index_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .configure(move |cfg| handlers::configure(cfg, auth))
    })
    .bind(&http_bind_address)?
    .workers(4)
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => tracing::info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    tracing::error!("HTTP server returned error: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!("HTTP server task join error: {}", e);
                    return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
                }
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("Content-index-service shutting down");
    Ok(())
}
