use axum::{routing::{get, post}, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, PaymentsConfig};
use crate::error::{ShopError, ShopResult};
use crate::gateway::GatewayState;
use crate::quote::QuoteBuilder;

pub mod payments;

/// Request-independent state, fixed at startup.
#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayState,
    pub quotes: Arc<QuoteBuilder>,
    pub allowed_countries: Arc<[String]>,
    pub payments: Arc<PaymentsConfig>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(GatewayState::from_config(&config.payments), config)
    }

    /// Build state around an already resolved gateway.
    pub fn new(gateway: GatewayState, config: &AppConfig) -> Self {
        Self {
            gateway,
            quotes: Arc::new(config.catalog.quote_builder()),
            allowed_countries: config.catalog.allowed_countries().into(),
            payments: Arc::new(config.payments.clone()),
        }
    }
}

/// Assemble the router. Unmatched paths fall through to `static_dir` when set.
pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/quote", get(payments::preview_quote))
        .route("/create-checkout-session", post(payments::create_checkout_session))
        .with_state(state);

    if let Some(dir) = &config.server.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn run_http_server(config: AppConfig) -> ShopResult<()> {
    let state = AppState::from_config(&config);
    let app = router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| ShopError::Internal(format!("invalid server address: {err}")))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ShopError::Internal(format!("failed to bind server: {err}")))?;

    tracing::info!(%addr, "checkout server listening");

    axum::serve(listener, app)
        .await
        .map_err(|err| ShopError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
