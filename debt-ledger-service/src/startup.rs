//! Application startup and lifecycle management.

use crate::config::{LedgerConfig, StoreBackend};
use crate::handlers::{customers, health, summary, transactions};
use crate::services::{InMemoryLedgerStore, LedgerStore, MongoLedgerStore};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, permissive_cors, request_id_middleware, security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service_name: Arc<str>,
    pub store: Arc<dyn LedgerStore>,
}

impl AppState {
    pub fn new(service_name: &str, store: Arc<dyn LedgerStore>) -> Self {
        Self {
            service_name: Arc::from(service_name),
            store,
        }
    }
}

/// Open the configured store, creating indexes when it is MongoDB.
pub async fn connect_store(config: &LedgerConfig) -> Result<Arc<dyn LedgerStore>, AppError> {
    match config.store.backend {
        StoreBackend::Mongo => {
            let store = MongoLedgerStore::connect(
                &config.mongodb.uri,
                &config.mongodb.database,
                config.store.summary,
            )
            .await?;
            store.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
    }
}

/// Every route plus the middleware stack.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/getCustomers", get(customers::list_customers))
        .route("/getCustomer", get(customers::get_customer))
        .route("/getSummary", get(summary::get_summary))
        .route("/addCustomer", post(customers::add_customer))
        .route("/updateCustomer", post(customers::update_customer))
        .route("/deleteCustomer", post(customers::delete_customer))
        .route("/addDebt", post(transactions::add_debt))
        .route("/addPayment", post(transactions::add_payment))
        .route("/deleteTransaction", post(transactions::delete_transaction));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .nest("/api", api)
        // Runs after routing so the matched template is available for labels
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: LedgerConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        Self::with_store(&config, store).await
    }

    /// Bind the listener around an already-open store (port 0 picks a free port).
    pub async fn with_store(
        config: &LedgerConfig,
        store: Arc<dyn LedgerStore>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(&config.service_name, store);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            store = state.store.backend(),
            "Debt ledger service listening"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> Arc<dyn LedgerStore> {
        self.state.store.clone()
    }

    /// Serve until Ctrl+C or SIGTERM, letting in-flight requests finish.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
