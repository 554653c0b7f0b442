use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::PaymentsConfig;
use crate::error::{ShopError, ShopResult};
use crate::model::PriceQuote;

pub mod stripe;

pub use self::stripe::StripeGateway;

/// Everything the processor needs to open a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub quote: PriceQuote,
    /// Uppercase ISO-3166 alpha-2 shipping destinations.
    pub allowed_countries: Vec<String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Session handle returned by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// A processor able to create hosted checkout sessions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: &SessionRequest) -> ShopResult<CheckoutSession>;
}

/// Gateway availability, decided once at startup.
#[derive(Clone)]
pub enum GatewayState {
    Configured(Arc<dyn PaymentGateway>),
    Unconfigured,
}

impl GatewayState {
    /// Resolve the gateway from payments configuration. A missing or
    /// malformed secret key leaves the service running but unconfigured.
    pub fn from_config(payments: &PaymentsConfig) -> Self {
        match payments.stripe_secret_key.as_deref().map(str::trim) {
            None | Some("") => {
                tracing::warn!("no Stripe secret key configured; checkout requests will fail");
                GatewayState::Unconfigured
            }
            Some(key) if !is_stripe_secret_key(key) => {
                tracing::warn!(
                    "Stripe secret key does not look like a secret or restricted key; checkout requests will fail"
                );
                GatewayState::Unconfigured
            }
            Some(key) => {
                tracing::info!("Stripe gateway configured");
                GatewayState::Configured(Arc::new(StripeGateway::new(key)))
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, GatewayState::Configured(_))
    }

    /// Create a session, failing fast when no gateway is available.
    pub async fn create_session(&self, request: &SessionRequest) -> ShopResult<CheckoutSession> {
        match self {
            GatewayState::Configured(gateway) => gateway.create_session(request).await,
            GatewayState::Unconfigured => Err(ShopError::GatewayUnconfigured),
        }
    }
}

impl fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayState::Configured(_) => f.write_str("Configured"),
            GatewayState::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}

fn is_stripe_secret_key(key: &str) -> bool {
    key.starts_with("sk_") || key.starts_with("rk_")
}
