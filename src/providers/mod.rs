//! Spot price provider implementations

pub mod catalog;
pub mod http;
pub mod parser;

pub use catalog::{CustomFormat, ProviderChoice, ProviderConfig, ProviderKind};
pub use http::HttpPriceProvider;
pub use parser::parse_price;
