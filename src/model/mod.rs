pub mod price;
pub mod quote;

pub use price::{PriceSet, PriceTable, ProductInfo, DEFAULT_CURRENCY};
pub use quote::{LineItem, LineKind, PriceQuote, ShippingTerm};
