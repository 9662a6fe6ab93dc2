#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use std::sync::Arc;
use std::time::Duration;

use assembly_api::{
    assembly::HttpAssemblyClient,
    config::{Config, SyncConfig},
    db::setup_database,
    repo,
    rest::{api_router, ApiDoc, SyncContext},
    sync::{sync_bills, sync_members, PgSyncStore, SyncGuard, SyncOptions},
};
use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use sqlx_postgres::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Roster sizes considered healthy; outside this band the stored roster is
/// treated as stale and re-synced from scratch.
const ROSTER_HEALTHY_RANGE: std::ops::RangeInclusive<i64> = 280..=320;

/// Below this bill count the startup sync runs in full mode instead of
/// incremental.
const FULL_SYNC_THRESHOLD: i64 = 100;

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Re-sync the member roster when the stored one looks stale.
///
/// A healthy roster holds roughly one row per seat; a count far outside
/// that band means a partial or duplicated earlier sync, so the table is
/// wiped and rebuilt.
async fn bootstrap_members(context: &SyncContext) -> Result<(), anyhow::Error> {
    let count = repo::members::count(&context.pool).await?;
    if ROSTER_HEALTHY_RANGE.contains(&count) {
        tracing::info!(count, "member roster looks healthy, skipping bootstrap");
        return Ok(());
    }

    tracing::info!(count, "member roster stale or empty, bootstrapping");
    if count > 0 {
        let removed = repo::members::delete_all(&context.pool).await?;
        tracing::info!(removed, "stale member rows wiped");
    }

    let Some(_permit) = context.guard.try_acquire() else {
        tracing::warn!("sync slot unexpectedly taken during bootstrap, skipping");
        return Ok(());
    };
    let store = PgSyncStore::new(context.pool.clone());
    let outcome = sync_members(&store, context.client.as_ref(), context.term).await?;
    tracing::info!(new = outcome.new, "member roster bootstrapped");
    Ok(())
}

/// Kick off the startup bill sync in the background so the HTTP server is
/// not held back by upstream paging.
fn spawn_bill_sync(context: Arc<SyncContext>, sync_config: SyncConfig) {
    tokio::spawn(async move {
        let Some(_permit) = context.guard.try_acquire() else {
            tracing::warn!("a sync is already running, skipping startup bill sync");
            return;
        };

        let count = match repo::bills::count(&context.pool).await {
            Ok(count) => count,
            Err(err) => {
                tracing::error!(error = %err, "failed to count bills, skipping startup sync");
                return;
            }
        };

        // A nearly-empty table gets a deep full crawl; otherwise a short
        // incremental pass catches up from the low-water mark.
        let options = if count < FULL_SYNC_THRESHOLD {
            SyncOptions {
                incremental: false,
                max_pages: sync_config.max_pages_full,
                ..context.options.clone()
            }
        } else {
            context.options.clone()
        };

        tracing::info!(
            bills = count,
            incremental = options.incremental,
            "starting background bill sync"
        );
        let store = PgSyncStore::new(context.pool.clone());
        match sync_bills(&store, context.client.as_ref(), &options).await {
            Ok(outcome) => tracing::info!(
                new = outcome.new,
                updated = outcome.updated,
                skipped = outcome.skipped,
                "startup bill sync finished"
            ),
            Err(err) => tracing::error!(error = %err, "startup bill sync aborted"),
        }
    });
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin: AllowOrigin = if allowed_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow any origin - not recommended for production");
        AllowOrigin::any()
    } else if allowed_origins.is_empty() {
        tracing::info!(
            "CORS allowed origins not configured - cross-origin requests will be blocked"
        );
        AllowOrigin::list(Vec::<HeaderValue>::new())
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        tracing::info!(origins = ?allowed_origins, "CORS allowed origins configured");
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(allow_origin)
}

fn build_app(pool: PgPool, context: Arc<SyncContext>, config: &Config) -> Router {
    let mut app = Router::new()
        .nest("/api/v1", api_router(pool, context))
        .route("/health", get(health_check))
        .layer(build_cors(&config.cors.allowed_origins))
        .layer(TraceLayer::new_for_http());

    if config.swagger.enabled {
        tracing::info!("Swagger UI enabled at /swagger-ui");
        app = app
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load and validate configuration first (fail-fast)
    let config = Config::load().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up logging from config
    std::env::set_var("RUST_LOG", &config.logging.level);
    tracing_subscriber::fmt::init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "assembly-api starting up"
    );

    if config.assembly.api_key.is_empty() {
        tracing::warn!("no portal API key configured - every upstream call will be rejected");
    }

    tracing::info!("Connecting to database...");
    let pool = setup_database(
        &config.database.connection_url(),
        config.database.max_connections,
    )
    .await?;

    let removed = repo::members::clean_duplicates(&pool).await?;
    if removed > 0 {
        tracing::info!(removed, "duplicate member rows cleaned at startup");
    }

    let client = Arc::new(HttpAssemblyClient::new(
        config.assembly.base_url.clone(),
        config.assembly.api_key.clone(),
        Duration::from_secs(config.assembly.request_timeout_secs),
    ));

    let context = Arc::new(SyncContext {
        pool: pool.clone(),
        client,
        guard: SyncGuard::new(),
        term: config.assembly.term,
        options: SyncOptions {
            term: config.assembly.term,
            max_pages: config.sync.max_pages_incremental,
            page_size: config.sync.page_size,
            update_existing: config.sync.update_existing,
            incremental: true,
            ..SyncOptions::default()
        },
    });

    if config.sync.bootstrap {
        bootstrap_members(&context).await?;
        spawn_bill_sync(Arc::clone(&context), config.sync.clone());
    } else {
        tracing::info!("startup sync disabled by configuration");
    }

    let app = build_app(pool, context, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server at http://{addr}/api/v1");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
