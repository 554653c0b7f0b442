use crate::error::{ShopError, ShopResult};
use crate::model::{PriceSet, PriceTable, ProductInfo};
use crate::quote::{QuoteBuilder, ShippingWindow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Fallback variable consulted when no secret key is set through the
/// prefixed configuration sources.
pub const STRIPE_SECRET_ENV: &str = "STRIPE_SECRET_KEY";

/// Shipping destinations accepted when none are configured.
pub const DEFAULT_ALLOWED_COUNTRIES: &[&str] = &[
    "US", "CA", "GB", "IE", "DE", "FR", "NL", "BE", "LU", "AT", "CH", "IT", "ES", "PT", "DK", "SE",
    "NO", "FI", "PL", "CZ", "TR", "AU", "NZ", "JP",
];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub payments: PaymentsConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the front-end, served for unmatched paths.
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    pub provider: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub product_name: String,
    pub product_description: String,
    pub product_image_url: String,
    pub shipping_min_days: u32,
    pub shipping_max_days: u32,
    #[serde(default)]
    pub allowed_countries: Vec<String>,
    #[serde(default)]
    pub prices: HashMap<String, PriceSet>,
}

impl CatalogConfig {
    /// Price table for this catalog; the built-in table when none is configured.
    pub fn price_table(&self) -> PriceTable {
        if self.prices.is_empty() {
            PriceTable::default()
        } else {
            PriceTable::new(self.prices.iter().map(|(code, prices)| (code, *prices)))
        }
    }

    /// Uppercased, de-duplicated shipping destinations.
    pub fn allowed_countries(&self) -> Vec<String> {
        let source: Vec<String> = if self.allowed_countries.is_empty() {
            DEFAULT_ALLOWED_COUNTRIES.iter().map(|c| c.to_string()).collect()
        } else {
            self.allowed_countries.clone()
        };

        let mut countries: Vec<String> = Vec::with_capacity(source.len());
        for code in source {
            let code = code.trim().to_uppercase();
            if !code.is_empty() && !countries.contains(&code) {
                countries.push(code);
            }
        }
        countries
    }

    pub fn product(&self) -> ProductInfo {
        ProductInfo {
            name: self.product_name.clone(),
            description: self.product_description.clone(),
            image_url: self.product_image_url.clone(),
        }
    }

    pub fn quote_builder(&self) -> QuoteBuilder {
        QuoteBuilder::new(
            self.price_table(),
            self.product(),
            ShippingWindow {
                min_days: self.shipping_min_days,
                max_days: self.shipping_max_days,
            },
        )
    }
}

/// Load configuration from built-in defaults, `config.*` in the working
/// directory, an optional explicit file and `CHECKOUT__*` environment
/// variables, in increasing precedence.
pub fn load_config(path: Option<&Path>) -> ShopResult<AppConfig> {
    let product = ProductInfo::default();
    let window = ShippingWindow::default();

    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")
        .and_then(|b| b.set_default("server.port", 4242))
        .and_then(|b| b.set_default("payments.success_url", "http://localhost:4242/success.html"))
        .and_then(|b| b.set_default("payments.cancel_url", "http://localhost:4242/canceled.html"))
        .and_then(|b| b.set_default("catalog.product_name", product.name))
        .and_then(|b| b.set_default("catalog.product_description", product.description))
        .and_then(|b| b.set_default("catalog.product_image_url", product.image_url))
        .and_then(|b| b.set_default("catalog.shipping_min_days", window.min_days))
        .and_then(|b| b.set_default("catalog.shipping_max_days", window.max_days))
        .map_err(|err| ShopError::Config(err.to_string()))?
        .add_source(File::with_name("config").required(false));

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(false));
    }

    builder = builder.add_source(Environment::with_prefix("CHECKOUT").separator("__"));

    let config = builder
        .build()
        .map_err(|err| ShopError::Config(err.to_string()))?;

    let mut parsed: AppConfig = config
        .try_deserialize()
        .map_err(|err| ShopError::Config(err.to_string()))?;

    parsed.payments.stripe_secret_key = resolve_secret_key(
        parsed.payments.stripe_secret_key.take(),
        std::env::var(STRIPE_SECRET_ENV).ok(),
    );

    validate(&parsed)?;
    Ok(parsed)
}

/// A blank configured key counts as unset and defers to the fallback.
fn resolve_secret_key(configured: Option<String>, fallback: Option<String>) -> Option<String> {
    let present = |key: &String| !key.trim().is_empty();
    configured.filter(present).or(fallback.filter(present))
}

fn validate(config: &AppConfig) -> ShopResult<()> {
    if let Some(provider) = &config.payments.provider {
        if provider.to_lowercase() != "stripe" {
            return Err(ShopError::Config(format!(
                "unsupported payments.provider '{}'; expected 'stripe'",
                provider
            )));
        }
    }

    if config.catalog.shipping_min_days > config.catalog.shipping_max_days {
        return Err(ShopError::Config(format!(
            "catalog.shipping_min_days ({}) exceeds catalog.shipping_max_days ({})",
            config.catalog.shipping_min_days, config.catalog.shipping_max_days
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // Config loading reads the process environment, so tests touching it
    // run one at a time.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sets variables for the lifetime of the guard.
    struct EnvVars(Vec<&'static str>);

    impl EnvVars {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self(vars.iter().map(|(key, _)| *key).collect())
        }
    }

    impl Drop for EnvVars {
        fn drop(&mut self) {
            for key in &self.0 {
                std::env::remove_var(key);
            }
        }
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_load_without_files() {
        let _lock = lock_env();
        let config = load_config(None).unwrap();
        assert_eq!(config.server.port, 4242);
        assert_eq!(config.catalog.price_table(), PriceTable::default());
        assert!(config.catalog.allowed_countries().contains(&"US".to_string()));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let _lock = lock_env();
        let file = write_config(
            r#"
[server]
port = 8080

[payments]
success_url = "https://shop.example/success"

[catalog]
product_name = "Desk Lamp"
allowed_countries = ["us", "ca", "US"]

[catalog.prices.usd]
single = 5000
shipping = 500
double = 9000
extra = 4000
"#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.payments.success_url, "https://shop.example/success");
        assert_eq!(config.catalog.allowed_countries(), vec!["US", "CA"]);

        let quote = config.catalog.quote_builder().build(1, "usd");
        assert_eq!(quote.line_items[0].name, "Desk Lamp");
        assert_eq!(quote.line_items[0].unit_amount, 5000);
        assert_eq!(quote.shipping.fee_amount, 500);
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let _lock = lock_env();
        let file = write_config("[payments]\nprovider = \"paypal\"\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ShopError::Config(_)));
    }

    #[test]
    fn test_rejects_inverted_shipping_window() {
        let _lock = lock_env();
        let file = write_config("[catalog]\nshipping_min_days = 9\nshipping_max_days = 3\n");
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _lock = lock_env();
        let file = write_config("[server]\nport = 8080\n");
        let _vars = EnvVars::set(&[
            ("CHECKOUT__SERVER__PORT", "9191"),
            ("CHECKOUT__PAYMENTS__SUCCESS_URL", "https://env.example/ok"),
            (STRIPE_SECRET_ENV, "sk_test_from_env"),
        ]);

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.payments.success_url, "https://env.example/ok");
        assert_eq!(config.payments.stripe_secret_key.as_deref(), Some("sk_test_from_env"));
    }

    #[test]
    fn test_prefixed_secret_wins_over_fallback() {
        let _lock = lock_env();
        let _vars = EnvVars::set(&[
            ("CHECKOUT__PAYMENTS__STRIPE_SECRET_KEY", "sk_test_prefixed"),
            (STRIPE_SECRET_ENV, "sk_test_plain"),
        ]);

        let config = load_config(None).unwrap();
        assert_eq!(config.payments.stripe_secret_key.as_deref(), Some("sk_test_prefixed"));
    }

    #[test]
    fn test_blank_secret_defers_to_fallback() {
        let fallback = Some("sk_test_plain".to_string());
        assert_eq!(
            resolve_secret_key(Some("  ".to_string()), fallback.clone()),
            fallback
        );
        assert_eq!(resolve_secret_key(Some(String::new()), None), None);
        assert_eq!(resolve_secret_key(None, Some(" ".to_string())), None);
        assert_eq!(
            resolve_secret_key(Some("sk_test_a".to_string()), fallback),
            Some("sk_test_a".to_string())
        );
    }

    #[test]
    fn test_configured_table_keeps_usd_fallback() {
        let mut prices = HashMap::new();
        prices.insert("EUR".to_string(), PriceSet::new(1, 2, 3, 4));
        let catalog = CatalogConfig {
            product_name: "x".to_string(),
            product_description: String::new(),
            product_image_url: String::new(),
            shipping_min_days: 1,
            shipping_max_days: 2,
            allowed_countries: Vec::new(),
            prices,
        };
        let table = catalog.price_table();
        assert_eq!(table.get("eur"), Some(&PriceSet::new(1, 2, 3, 4)));
        assert_eq!(table.resolve("chf").0, "usd");
    }
}
