pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod quote;
pub mod server;

pub use config::{AppConfig, CatalogConfig, PaymentsConfig, ServerConfig};
pub use error::{ShopError, ShopResult};
pub use gateway::{CheckoutSession, GatewayState, PaymentGateway, SessionRequest};
pub use model::*;
pub use quote::{build_quote, QuoteBuilder, QuoteInput};
