use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ShopError;
use crate::gateway::SessionRequest;
use crate::model::PriceQuote;
use crate::quote::QuoteInput;
use crate::server::AppState;

/// Body of `POST /create-checkout-session`. Fields stay raw JSON so that any
/// shape can be normalised instead of rejected.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutSessionRequest {
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub currency: Option<Value>,
}

impl CheckoutSessionRequest {
    /// Parse a request body, falling back to an empty request when the body
    /// is missing or is not a JSON object.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "unparseable checkout body; using defaults");
            Self::default()
        })
    }

    pub fn input(&self) -> QuoteInput {
        QuoteInput::from_raw(self.quantity.as_ref(), self.currency.as_ref())
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuotePreviewResponse {
    pub quote: PriceQuote,
    /// Minor-unit total including shipping.
    pub total: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse { error: self.message });
        (self.status, body).into_response()
    }
}

pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input = CheckoutSessionRequest::from_body(&body).input();
    let quote = state.quotes.build_from(&input);

    let request = SessionRequest {
        quote,
        allowed_countries: state.allowed_countries.to_vec(),
        success_url: state.payments.success_url.clone(),
        cancel_url: state.payments.cancel_url.clone(),
    };

    let session = state.gateway.create_session(&request).await.map_err(|err| {
        tracing::error!(
            quantity = input.quantity,
            currency = %request.quote.currency,
            error = %err,
            "checkout session creation failed"
        );
        ApiError::from(err)
    })?;

    tracing::info!(
        quantity = input.quantity,
        units = %request.quote.unit_count(),
        currency = %request.quote.currency,
        session_id = %session.id,
        "checkout session created"
    );

    Ok(Json(CheckoutSessionResponse {
        id: session.id,
        url: session.url,
    }))
}

pub async fn preview_quote(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let quantity = params.get("quantity").cloned().map(Value::String);
    let currency = params.get("currency").cloned().map(Value::String);
    let input = QuoteInput::from_raw(quantity.as_ref(), currency.as_ref());

    let quote = state.quotes.build_from(&input);
    let total = quote.total_amount();
    Json(QuotePreviewResponse { quote, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_defaults() {
        let input = CheckoutSessionRequest::from_body(b"").input();
        assert_eq!(input.quantity, 1);
        assert_eq!(input.currency, "");
    }

    #[test]
    fn test_malformed_body_defaults() {
        let input = CheckoutSessionRequest::from_body(b"{not json").input();
        assert_eq!(input.quantity, 1);
        let input = CheckoutSessionRequest::from_body(br#""hello""#).input();
        assert_eq!(input.quantity, 1);
    }

    #[test]
    fn test_body_fields_are_normalised() {
        let input = CheckoutSessionRequest::from_body(br#"{"quantity":"4","currency":"EUR"}"#).input();
        assert_eq!(input.quantity, 4);
        assert_eq!(input.currency, "eur");
    }

    #[test]
    fn test_shop_error_maps_to_500() {
        let response = ApiError::from(ShopError::GatewayUnconfigured).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
