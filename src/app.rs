//! Router assembly and shared request state.

use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};
use thiserror::Error;
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info, Level};

use crate::config::{AppConfig, KvBackend};
use crate::database::{self, DatabaseError, ItemRepository, SqliteItemRepository};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::kv::{KvNamespace, KvStoreError, MemoryKv, SqliteKv};
use crate::middleware::{cors_policy, handle_panic, jwt_auth_middleware, with_security_headers};
use crate::services::{ItemService, KvService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("KV backend unavailable: {0}")]
    Kv(#[from] KvStoreError),

    #[error("Schema initialization failed: {0}")]
    Schema(String),
}

/// Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub kv: KvService,
    pub items: ItemService,
}

impl AppState {
    pub fn new(config: AppConfig, kv: Arc<dyn KvNamespace>, repo: Arc<dyn ItemRepository>) -> Self {
        Self {
            config: Arc::new(config),
            kv: KvService::new(kv),
            items: ItemService::new(repo),
        }
    }

    /// Open the database, pick the KV backend and, when
    /// `database.auto_migrate` is set, apply the items schema.
    pub async fn bootstrap(config: AppConfig) -> Result<Self, StartupError> {
        let pool = database::connect(&config.database.url, config.database.max_connections).await?;
        database::health_check(&pool).await?;

        let kv: Arc<dyn KvNamespace> = match config.kv.backend {
            KvBackend::Memory => Arc::new(MemoryKv::new()),
            KvBackend::Sqlite => {
                let kv = SqliteKv::new(pool.clone());
                kv.ensure_schema().await?;
                Arc::new(kv)
            }
        };
        info!("KV backend: {:?}", config.kv.backend);

        let auto_migrate = config.database.auto_migrate;
        let state = Self::new(config, kv, Arc::new(SqliteItemRepository::new(pool)));
        if auto_migrate {
            state
                .items
                .initialize_schema()
                .await
                .map_err(|err| StartupError::Schema(err.to_string()))?;
            info!("Items schema applied");
        }
        Ok(state)
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("not_found")
}

/// Build the full router: security headers → tracing → panic guard →
/// routes, with CORS on `/api` and bearer auth on the protected routes.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/profile", get(protected::profile_get))
        .route("/kv", get(protected::kv::kv_list))
        .route(
            "/kv/*key",
            get(protected::kv::kv_get)
                .put(protected::kv::kv_put)
                .delete(protected::kv::kv_delete),
        )
        .route("/d1/init", get(protected::items::schema_init))
        .route(
            "/d1/items",
            get(protected::items::items_list).post(protected::items::item_create),
        )
        .route(
            "/d1/items/:id",
            get(protected::items::item_get)
                .put(protected::items::item_update)
                .delete(protected::items::item_delete),
        )
        .route_layer(middleware::from_fn(jwt_auth_middleware));

    let api = Router::new()
        .route("/time", get(public::time_get))
        .merge(protected)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.clone(), cors_policy));

    let router = Router::new()
        .route("/healthz", get(public::healthz_get))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        );

    with_security_headers(router)
}
