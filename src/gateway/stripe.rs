use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stripe::{
    CheckoutSessionMode, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionPaymentMethodTypes, CreateCheckoutSessionShippingAddressCollection,
    CreateCheckoutSessionShippingAddressCollectionAllowedCountries,
    CreateCheckoutSessionShippingOptions, CreateCheckoutSessionShippingOptionsShippingRateData,
    CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimate,
    CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimateMaximum,
    CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimateMaximumUnit,
    CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimateMinimum,
    CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimateMinimumUnit,
    CreateCheckoutSessionShippingOptionsShippingRateDataFixedAmount,
    CreateCheckoutSessionShippingOptionsShippingRateDataType, Currency,
};

use super::{CheckoutSession, PaymentGateway, SessionRequest};
use crate::error::{ShopError, ShopResult};
use crate::model::{LineItem, ShippingTerm};

/// Creates hosted checkout sessions through the Stripe API.
#[derive(Clone)]
pub struct StripeGateway {
    client: stripe::Client,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: stripe::Client::new(secret_key.into()),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, request: &SessionRequest) -> ShopResult<CheckoutSession> {
        let params = checkout_params(request)?;

        let session = stripe::CheckoutSession::create(&self.client, params)
            .await
            .map_err(|err| ShopError::Gateway(format!("stripe checkout error: {err}")))?;

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url: session.url,
        })
    }
}

/// Compose one-off `payment` mode parameters: inline prices for every
/// quote line, one fixed-amount shipping option and the country allow-list.
pub fn checkout_params(request: &SessionRequest) -> ShopResult<CreateCheckoutSession<'_>> {
    let currency = parse_currency(&request.quote.currency)?;

    let mut params = CreateCheckoutSession::new();
    params.mode = Some(CheckoutSessionMode::Payment);
    params.success_url = Some(request.success_url.as_str());
    params.cancel_url = Some(request.cancel_url.as_str());
    params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
    params.line_items = Some(
        request
            .quote
            .line_items
            .iter()
            .map(|item| line_item(item, currency))
            .collect(),
    );
    params.shipping_options = Some(vec![shipping_option(&request.quote.shipping, currency)]);

    let countries = allowed_countries(&request.allowed_countries);
    if countries.is_empty() {
        tracing::warn!("no recognised shipping countries; address collection disabled");
    } else {
        params.shipping_address_collection = Some(CreateCheckoutSessionShippingAddressCollection {
            allowed_countries: countries,
        });
    }

    Ok(params)
}

fn line_item(item: &LineItem, currency: Currency) -> CreateCheckoutSessionLineItems {
    let images = if item.image_url.is_empty() {
        None
    } else {
        Some(vec![item.image_url.clone()])
    };
    let description = if item.description.is_empty() {
        None
    } else {
        Some(item.description.clone())
    };

    CreateCheckoutSessionLineItems {
        quantity: Some(item.quantity),
        price_data: Some(CreateCheckoutSessionLineItemsPriceData {
            currency,
            unit_amount: Some(i64::from(item.unit_amount)),
            product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                name: item.name.clone(),
                description,
                images,
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn shipping_option(shipping: &ShippingTerm, currency: Currency) -> CreateCheckoutSessionShippingOptions {
    CreateCheckoutSessionShippingOptions {
        shipping_rate_data: Some(CreateCheckoutSessionShippingOptionsShippingRateData {
            display_name: shipping.label.clone(),
            type_: Some(CreateCheckoutSessionShippingOptionsShippingRateDataType::FixedAmount),
            fixed_amount: Some(CreateCheckoutSessionShippingOptionsShippingRateDataFixedAmount {
                amount: i64::from(shipping.fee_amount),
                currency,
                ..Default::default()
            }),
            delivery_estimate: Some(
                CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimate {
                    minimum: Some(
                        CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimateMinimum {
                            unit: CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimateMinimumUnit::BusinessDay,
                            value: i64::from(shipping.estimated_min_days),
                        },
                    ),
                    maximum: Some(
                        CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimateMaximum {
                            unit: CreateCheckoutSessionShippingOptionsShippingRateDataDeliveryEstimateMaximumUnit::BusinessDay,
                            value: i64::from(shipping.estimated_max_days),
                        },
                    ),
                },
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn parse_currency(code: &str) -> ShopResult<Currency> {
    from_code(code).ok_or_else(|| ShopError::Gateway(format!("unsupported currency '{code}'")))
}

fn allowed_countries(
    codes: &[String],
) -> Vec<CreateCheckoutSessionShippingAddressCollectionAllowedCountries> {
    codes
        .iter()
        .filter_map(|code| {
            let parsed = from_code(code);
            if parsed.is_none() {
                tracing::warn!(country = %code, "skipping unrecognised shipping country");
            }
            parsed
        })
        .collect()
}

// Stripe's enums deserialize from their wire codes.
fn from_code<T: DeserializeOwned>(code: &str) -> Option<T> {
    serde_json::from_value(Value::String(code.to_string())).ok()
}
