use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Currency every request falls back to when the requested one is unknown.
pub const DEFAULT_CURRENCY: &str = "usd";

// ---------------------------------------------------------------------------
// PriceSet: the four minor-unit amounts a currency is priced with
// ---------------------------------------------------------------------------

/// Minor-unit prices for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSet {
    /// Price of a single unit.
    pub single: u32,
    /// Shipping fee, charged only when exactly one unit is ordered.
    pub shipping: u32,
    /// Price of the two-unit bundle, invoiced as one item.
    pub double: u32,
    /// Price of each unit beyond the bundle.
    pub extra: u32,
}

impl PriceSet {
    pub const fn new(single: u32, shipping: u32, double: u32, extra: u32) -> Self {
        Self {
            single,
            shipping,
            double,
            extra,
        }
    }
}

// ---------------------------------------------------------------------------
// PriceTable: currency code -> PriceSet, always containing the default
// ---------------------------------------------------------------------------

/// Immutable currency price table. Codes are stored lowercase and the
/// default currency is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    entries: BTreeMap<String, PriceSet>,
    fallback: PriceSet,
}

impl PriceTable {
    /// Build a table from arbitrary entries. Codes are lowercased and a
    /// missing default currency is filled in from the built-in table.
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PriceSet)>,
        K: AsRef<str>,
    {
        let mut entries: BTreeMap<String, PriceSet> = entries
            .into_iter()
            .map(|(code, prices)| (code.as_ref().trim().to_lowercase(), prices))
            .collect();

        let fallback = *entries
            .entry(DEFAULT_CURRENCY.to_string())
            .or_insert_with(builtin_usd);

        Self { entries, fallback }
    }

    /// Resolve a requested currency code to the code actually used and its
    /// prices. Lookup is case-insensitive; unknown codes resolve to `usd`.
    pub fn resolve(&self, code: &str) -> (&str, &PriceSet) {
        let wanted = code.trim().to_lowercase();
        match self.entries.get_key_value(&wanted) {
            Some((code, prices)) => (code.as_str(), prices),
            None => (DEFAULT_CURRENCY, &self.fallback),
        }
    }

    pub fn get(&self, code: &str) -> Option<&PriceSet> {
        self.entries.get(&code.trim().to_lowercase())
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new([
            ("usd", builtin_usd()),
            ("eur", PriceSet::new(74_900, 3_500, 119_900, 65_000)),
            ("gbp", PriceSet::new(64_900, 3_000, 104_900, 56_000)),
            ("try", PriceSet::new(2_799_000, 150_000, 4_599_000, 2_400_000)),
        ])
    }
}

fn builtin_usd() -> PriceSet {
    PriceSet::new(79_900, 4_000, 129_900, 70_000)
}

// ---------------------------------------------------------------------------
// ProductInfo: display metadata shown on the hosted checkout page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub description: String,
    pub image_url: String,
}

impl Default for ProductInfo {
    fn default() -> Self {
        Self {
            name: "Smart Home Hub".to_string(),
            description: "Wireless hub with app control and voice assistant support".to_string(),
            image_url: "https://example.com/images/smart-home-hub.png".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_usd() {
        let table = PriceTable::default();
        assert_eq!(table.get("usd"), Some(&PriceSet::new(79_900, 4_000, 129_900, 70_000)));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let table = PriceTable::default();
        let (code, prices) = table.resolve("  TRY ");
        assert_eq!(code, "try");
        assert_eq!(prices.double, 4_599_000);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_usd() {
        let table = PriceTable::default();
        let (code, prices) = table.resolve("xyz");
        assert_eq!(code, "usd");
        assert_eq!(prices.single, 79_900);
        assert_eq!(table.resolve("").0, "usd");
    }

    #[test]
    fn test_new_inserts_missing_default() {
        let table = PriceTable::new([("JPY", PriceSet::new(12_000, 800, 20_000, 9_000))]);
        assert_eq!(table.currencies().collect::<Vec<_>>(), vec!["jpy", "usd"]);
        assert!(table.get("jpy").is_some());
        assert!(table.get("usd").is_some());
    }

    #[test]
    fn test_builtin_bundles_are_discounted() {
        let table = PriceTable::default();
        for code in table.currencies() {
            let prices = table.get(code).unwrap();
            assert!(prices.double < 2 * prices.single, "{code} bundle not discounted");
            assert!(prices.extra < prices.single, "{code} extra not discounted");
        }
    }
}
