use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "shop_checkout=info,tower_http=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // A subscriber may already be installed, e.g. by a test harness.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
