use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{LineItem, LineKind, PriceQuote, PriceTable, ProductInfo, ShippingTerm};

// ---------------------------------------------------------------------------
// Input normalisation: raw request values -> (quantity, currency)
// ---------------------------------------------------------------------------

/// Coerce a raw JSON quantity to an integer of at least 1.
///
/// Integers are taken as-is, fractional numbers and numeric strings are
/// truncated toward zero. Anything else counts as missing.
pub fn normalize_quantity(raw: Option<&Value>) -> i64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().and_then(truncate_float)),
        Some(Value::String(s)) => parse_quantity_str(s),
        _ => None,
    };
    parsed.unwrap_or(1).max(1)
}

/// Coerce a raw JSON currency to a trimmed lowercase code. Non-strings are
/// treated as absent and map to the empty code, which prices as the default.
pub fn normalize_currency(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) => s.trim().to_lowercase(),
        _ => String::new(),
    }
}

fn parse_quantity_str(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate_float))
}

// `f64::from_str` accepts "inf" and "NaN"; those count as missing.
fn truncate_float(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

/// Normalised quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub quantity: i64,
    pub currency: String,
}

impl QuoteInput {
    pub fn from_raw(quantity: Option<&Value>, currency: Option<&Value>) -> Self {
        Self {
            quantity: normalize_quantity(quantity),
            currency: normalize_currency(currency),
        }
    }
}

// ---------------------------------------------------------------------------
// QuoteBuilder: the tiered bundling policy
// ---------------------------------------------------------------------------

/// Delivery estimate shown with every shipping option, in business days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingWindow {
    pub min_days: u32,
    pub max_days: u32,
}

impl Default for ShippingWindow {
    fn default() -> Self {
        Self {
            min_days: 5,
            max_days: 7,
        }
    }
}

pub const PAID_SHIPPING_LABEL: &str = "Standard shipping";
pub const FREE_SHIPPING_LABEL: &str = "Free shipping";

/// Prices quantities against an immutable table. Holds no mutable state, so
/// one instance can be shared by every request.
#[derive(Debug, Clone, Default)]
pub struct QuoteBuilder {
    prices: PriceTable,
    product: ProductInfo,
    shipping_window: ShippingWindow,
}

impl QuoteBuilder {
    pub fn new(prices: PriceTable, product: ProductInfo, shipping_window: ShippingWindow) -> Self {
        Self {
            prices,
            product,
            shipping_window,
        }
    }

    /// Price `quantity` units in `currency`.
    ///
    /// Quantities below 1 are priced as 1 and unknown currencies as `usd`.
    /// One unit pays shipping; two units are a single bundle line; beyond
    /// that every extra unit is billed on a second line. Shipping is free
    /// from two units up.
    pub fn build(&self, quantity: i64, currency: &str) -> PriceQuote {
        let quantity = quantity.max(1) as u64;
        let (code, prices) = self.prices.resolve(currency);

        let mut line_items = Vec::with_capacity(2);
        let fee_amount = if quantity == 1 {
            line_items.push(self.single_line(prices.single));
            prices.shipping
        } else {
            line_items.push(self.bundle_line(prices.double));
            if quantity > 2 {
                line_items.push(self.additional_line(prices.extra, quantity - 2));
            }
            0
        };

        PriceQuote {
            currency: code.to_string(),
            line_items,
            shipping: self.shipping_term(fee_amount),
        }
    }

    pub fn build_from(&self, input: &QuoteInput) -> PriceQuote {
        self.build(input.quantity, &input.currency)
    }

    fn single_line(&self, unit_amount: u32) -> LineItem {
        LineItem {
            kind: LineKind::Single,
            name: self.product.name.clone(),
            description: self.product.description.clone(),
            image_url: self.product.image_url.clone(),
            unit_amount,
            quantity: 1,
        }
    }

    fn bundle_line(&self, unit_amount: u32) -> LineItem {
        LineItem {
            kind: LineKind::Bundle,
            name: format!("{} (2-pack)", self.product.name),
            description: format!("Two-unit bundle. {}", self.product.description),
            image_url: self.product.image_url.clone(),
            unit_amount,
            quantity: 1,
        }
    }

    fn additional_line(&self, unit_amount: u32, quantity: u64) -> LineItem {
        LineItem {
            kind: LineKind::Additional,
            name: format!("{} (additional unit)", self.product.name),
            description: "Each unit beyond the 2-pack".to_string(),
            image_url: self.product.image_url.clone(),
            unit_amount,
            quantity,
        }
    }

    fn shipping_term(&self, fee_amount: u32) -> ShippingTerm {
        let label = if fee_amount == 0 {
            FREE_SHIPPING_LABEL
        } else {
            PAID_SHIPPING_LABEL
        };
        ShippingTerm {
            fee_amount,
            label: label.to_string(),
            estimated_min_days: self.shipping_window.min_days,
            estimated_max_days: self.shipping_window.max_days,
        }
    }
}

/// Price a quantity against the built-in table and product.
pub fn build_quote(quantity: i64, currency: &str) -> PriceQuote {
    QuoteBuilder::default().build(quantity, currency)
}
