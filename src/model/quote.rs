use serde::{Deserialize, Serialize};

/// What a line item stands for under the bundling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// One unit bought on its own.
    Single,
    /// The fixed-price two-unit bundle.
    Bundle,
    /// Units beyond the bundle.
    Additional,
}

impl LineKind {
    /// Physical units covered by one `quantity` of this line.
    pub fn units(self) -> u128 {
        match self {
            LineKind::Bundle => 2,
            LineKind::Single | LineKind::Additional => 1,
        }
    }
}

/// One invoiced line on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineKind,
    pub name: String,
    pub description: String,
    pub image_url: String,
    /// Minor-unit price of one `quantity`.
    pub unit_amount: u32,
    pub quantity: u64,
}

impl LineItem {
    /// Minor-unit subtotal of this line.
    pub fn subtotal(&self) -> u128 {
        u128::from(self.unit_amount) * u128::from(self.quantity)
    }
}

/// Shipping fee and delivery estimate attached to a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingTerm {
    /// Minor-unit fee; zero when shipping is waived.
    pub fee_amount: u32,
    pub label: String,
    /// Estimated delivery window in business days.
    pub estimated_min_days: u32,
    pub estimated_max_days: u32,
}

impl ShippingTerm {
    pub fn is_free(&self) -> bool {
        self.fee_amount == 0
    }
}

/// Result of pricing a requested quantity in a currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Lowercase ISO code the amounts are expressed in.
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub shipping: ShippingTerm,
}

impl PriceQuote {
    /// Number of physical units the quote covers.
    pub fn unit_count(&self) -> u128 {
        self.line_items
            .iter()
            .map(|item| item.kind.units() * u128::from(item.quantity))
            .sum()
    }

    /// Minor-unit total including shipping. Wide enough that no quantity
    /// can overflow it.
    pub fn total_amount(&self) -> u128 {
        self.line_items.iter().map(LineItem::subtotal).sum::<u128>()
            + u128::from(self.shipping.fee_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(unit_amount: u32, quantity: u64) -> LineItem {
        LineItem {
            kind: LineKind::Additional,
            name: "Widget".to_string(),
            description: String::new(),
            image_url: String::new(),
            unit_amount,
            quantity,
        }
    }

    #[test]
    fn test_total_includes_shipping() {
        let quote = PriceQuote {
            currency: "usd".to_string(),
            line_items: vec![item(100, 1), item(50, 3)],
            shipping: ShippingTerm {
                fee_amount: 25,
                label: "Standard shipping".to_string(),
                estimated_min_days: 5,
                estimated_max_days: 7,
            },
        };
        assert_eq!(quote.total_amount(), 275);
        assert!(!quote.shipping.is_free());
        assert_eq!(quote.unit_count(), 4);
    }

    #[test]
    fn test_subtotal_does_not_overflow() {
        let line = item(u32::MAX, u64::MAX);
        assert_eq!(line.subtotal(), u128::from(u32::MAX) * u128::from(u64::MAX));
    }
}
