//! Provider configurations and URL templating

use crate::{
    constants::{
        API_KEY_PLACEHOLDER, METALS_API_URL, METALS_DEV_API_URL, METAL_PLACEHOLDER,
        METAL_PRICE_API_URL, SYMBOL_PLACEHOLDER,
    },
    error::{ConfigError, FetchErrorKind, PriceFetchError},
    types::Metal,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a user-defined provider's response is read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFormat {
    /// JSON pointer to the price, e.g. `/data/{SYMBOL}/price`
    pub price_pointer: String,
    /// The value is "metal per USD" and must be inverted
    #[serde(default)]
    pub invert: bool,
}

/// Known provider response shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderKind {
    /// metals.dev: `{ "rate": { "price": p } }`
    MetalsDev,
    /// metals-api.com: `{ "rates": { "XAG": r } }`, r = ounces per USD
    MetalsApi,
    /// metalpriceapi.com: same shape as metals-api.com
    MetalPriceApi,
    /// Anything else, read through a JSON pointer
    Custom(CustomFormat),
}

impl ProviderKind {
    /// Canonical provider name
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::MetalsDev => "METALS_DEV",
            ProviderKind::MetalsApi => "METALS_API",
            ProviderKind::MetalPriceApi => "METAL_PRICE_API",
            ProviderKind::Custom(_) => "CUSTOM",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Built-in provider selector, as read from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChoice {
    MetalsDev,
    MetalsApi,
    MetalPriceApi,
    Custom,
}

impl FromStr for ProviderChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "METALS_DEV" => Ok(ProviderChoice::MetalsDev),
            "METALS_API" => Ok(ProviderChoice::MetalsApi),
            "METAL_PRICE_API" => Ok(ProviderChoice::MetalPriceApi),
            "CUSTOM" => Ok(ProviderChoice::Custom),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Static description of a provider endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Response shape and parser selector
    pub kind: ProviderKind,
    /// Name reported in quotes, logs and errors
    pub name: String,
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Endpoint template per metal, appended to `base_url`
    pub endpoints: BTreeMap<Metal, String>,
    /// Substituted for `{API_KEY}`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// metals.dev, one request per metal
    pub fn metals_dev(api_key: Option<String>) -> Self {
        Self::builtin(ProviderKind::MetalsDev, METALS_DEV_API_URL, api_key, |metal| {
            format!(
                "/metal/spot?api_key={}&metal={}&currency=USD",
                API_KEY_PLACEHOLDER,
                metal.name()
            )
        })
    }

    /// metals-api.com
    pub fn metals_api(api_key: Option<String>) -> Self {
        Self::builtin(ProviderKind::MetalsApi, METALS_API_URL, api_key, |metal| {
            format!(
                "/latest?access_key={}&base=USD&symbols={}",
                API_KEY_PLACEHOLDER,
                metal.symbol()
            )
        })
    }

    /// metalpriceapi.com
    pub fn metal_price_api(api_key: Option<String>) -> Self {
        Self::builtin(ProviderKind::MetalPriceApi, METAL_PRICE_API_URL, api_key, |metal| {
            format!(
                "/latest?api_key={}&base=USD&currencies={}",
                API_KEY_PLACEHOLDER,
                metal.symbol()
            )
        })
    }

    /// User-defined provider sharing one endpoint template for every metal
    ///
    /// `{METAL}` and `{SYMBOL}` in the template are replaced per request.
    pub fn custom(
        base_url: impl Into<String>,
        endpoint_template: &str,
        format: CustomFormat,
        api_key: Option<String>,
    ) -> Self {
        let endpoints = Metal::all()
            .iter()
            .map(|m| (*m, endpoint_template.to_string()))
            .collect();
        Self {
            name: ProviderKind::Custom(format.clone()).name().to_string(),
            kind: ProviderKind::Custom(format),
            base_url: trim_base(base_url.into()),
            endpoints,
            api_key,
        }
    }

    fn builtin(
        kind: ProviderKind,
        base_url: &str,
        api_key: Option<String>,
        endpoint: impl Fn(Metal) -> String,
    ) -> Self {
        let endpoints = Metal::all().iter().map(|m| (*m, endpoint(*m))).collect();
        Self {
            name: kind.name().to_string(),
            kind,
            base_url: base_url.to_string(),
            endpoints,
            api_key,
        }
    }

    /// Points the provider at another host, e.g. a proxy or a mock server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url.into());
        self
    }

    /// Builds the request URL for `metal`
    pub fn build_url(&self, metal: Metal) -> Result<String, PriceFetchError> {
        let endpoint = self
            .endpoints
            .get(&metal)
            .ok_or_else(|| PriceFetchError::new(&self.name, FetchErrorKind::UnsupportedMetal(metal)))?;

        let mut url = format!("{}{}", self.base_url, endpoint);
        if url.contains(API_KEY_PLACEHOLDER) {
            let key = self
                .api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| PriceFetchError::new(&self.name, FetchErrorKind::MissingApiKey))?;
            url = url.replace(API_KEY_PLACEHOLDER, key.trim());
        }

        Ok(substitute_metal(&url, metal))
    }
}

/// Replaces `{METAL}` and `{SYMBOL}`
pub(crate) fn substitute_metal(template: &str, metal: Metal) -> String {
    template
        .replace(METAL_PLACEHOLDER, metal.name())
        .replace(SYMBOL_PLACEHOLDER, metal.symbol())
}

fn trim_base(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}
