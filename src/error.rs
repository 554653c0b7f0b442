use thiserror::Error;

/// Central error type for checkout operations.
#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Payment gateway is not configured")]
    GatewayUnconfigured,

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for checkout results.
pub type ShopResult<T> = Result<T, ShopError>;
