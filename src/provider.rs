//! Provider abstraction for fetching spot prices from external APIs

use crate::{error::PriceFetchError, types::Metal};
use async_trait::async_trait;

/// Trait for spot price providers
///
/// One call fetches one metal. Implementations never retry; the tracker's
/// fixed refresh interval is the only retry policy.
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    /// Fetches the current USD-per-ounce price for a metal
    ///
    /// # Arguments
    /// * `metal` - The metal to fetch the price for
    ///
    /// # Returns
    /// A positive price, or an error naming the provider and the reason
    async fn fetch_price(&self, metal: Metal) -> Result<f64, PriceFetchError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &str;
}
