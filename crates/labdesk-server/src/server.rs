use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Request, Response},
    middleware,
    routing::{get, patch},
};
use labdesk_storage::DynLabStorage;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

use crate::config::{AppConfig, StorageBackend};
use crate::handlers::{health, lab_tests, orders, patients};
use crate::middleware::{self as app_middleware, RequestId};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub storage: DynLabStorage,
}

pub struct LabDeskServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig, storage: DynLabStorage) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let state = AppState { storage };

    let api = Router::new()
        .route(
            "/patients",
            get(patients::list_patients)
                .post(patients::create_patient)
                .patch(patients::update_patient),
        )
        .route("/patients/{id}", get(patients::get_patient))
        .route(
            "/tests",
            get(lab_tests::list_lab_tests).post(lab_tests::create_lab_test),
        )
        .route("/tests/{id}", patch(lab_tests::update_lab_test))
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/orders/{id}",
            get(orders::get_order).patch(orders::update_order_status),
        );

    Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .nest("/api", api)
        .with_state(state)
        // Last layer runs first: request id -> trace -> cors -> compression -> body limit
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.as_str().to_owned())
                        .unwrap_or_default();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = tracing::field::Empty,
                        request_id = %req_id
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                    span.record(
                        "http.status_code",
                        tracing::field::display(res.status().as_u16()),
                    );
                    tracing::info!(
                        http.status = %res.status().as_u16(),
                        elapsed_ms = %latency.as_millis(),
                        "request handled"
                    );
                }),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

/// Opens the storage backend named by the configuration.
pub async fn connect_storage(cfg: &AppConfig) -> anyhow::Result<DynLabStorage> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Ok(labdesk_db_memory::create_storage())
        }
        StorageBackend::Postgres => {
            let pg = cfg.storage.postgres.to_backend_config();
            let storage: DynLabStorage = labdesk_db_postgres::create_storage(pg).await?;
            Ok(storage)
        }
    }
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    storage: Option<DynLabStorage>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            storage: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses an already opened backend instead of the configured one.
    pub fn with_storage(mut self, storage: DynLabStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub async fn build(self) -> anyhow::Result<LabDeskServer> {
        let storage = match self.storage {
            Some(storage) => storage,
            None => connect_storage(&self.config).await?,
        };
        tracing::info!(backend = storage.backend_name(), "Storage ready");

        if self.config.bootstrap.seed_demo_data {
            crate::bootstrap::seed_demo_data(storage.as_ref()).await?;
        }

        Ok(LabDeskServer {
            addr: self.addr,
            app: build_app(&self.config, storage),
        })
    }
}

impl LabDeskServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
