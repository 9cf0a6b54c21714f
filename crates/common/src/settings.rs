//! Adapter settings.
//!
//! Settings are read from TOML and merged with environment variables prefixed
//! with `INSTICATOR__`. For example `INSTICATOR__BIDDER__BID_TTL=600` overrides
//! `bidder.bid_ttl`.

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use validator::{Validate, ValidationError};

use crate::constants::{DEFAULT_ANALYTICS_ENDPOINT, DEFAULT_BIDDER_ENDPOINT, DEFAULT_BID_TTL};
use crate::error::InsticatorError;

pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "INSTICATOR";
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

const DEFAULT_SETTINGS_TOML: &str = include_str!("../../../insticator.toml");

/// Bid adapter configuration (`[bidder]`).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BidderSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// OpenRTB endpoint receiving the auction request.
    #[serde(default = "default_endpoint_url")]
    #[validate(url)]
    pub endpoint_url: String,

    /// Fallback TTL in seconds for bids that carry no `exp`.
    #[serde(default = "default_bid_ttl")]
    #[validate(range(min = 1, max = 86400))]
    pub bid_ttl: u32,

    /// Publisher-level parameters forwarded as `ext.insticator`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Json>>,

    /// Fields merged over the generated `device` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Map<String, Json>>,
}

impl Default for BidderSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint_url: default_endpoint_url(),
            bid_ttl: default_bid_ttl(),
            params: None,
            device: None,
        }
    }
}

/// Analytics adapter configuration (`[analytics]`).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AnalyticsSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Site identifier reported as `targetSite`.
    #[serde(default)]
    pub site: String,

    #[serde(default = "default_analytics_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// Falls back to the host debug flag when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,

    /// Probability that a session forwards events at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub sampling: Option<f64>,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            site: String::new(),
            endpoint: default_analytics_endpoint(),
            debug: None,
            sampling: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_analytics_site"))]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub bidder: BidderSettings,

    #[serde(default)]
    #[validate(nested)]
    pub analytics: AnalyticsSettings,
}

fn validate_analytics_site(settings: &Settings) -> Result<(), ValidationError> {
    if settings.analytics.enabled && settings.analytics.site.trim().is_empty() {
        return Err(ValidationError::new("analytics_site_required"));
    }
    Ok(())
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint_url() -> String {
    DEFAULT_BIDDER_ENDPOINT.to_string()
}

fn default_bid_ttl() -> u32 {
    DEFAULT_BID_TTL
}

fn default_analytics_endpoint() -> String {
    DEFAULT_ANALYTICS_ENDPOINT.to_string()
}

impl Settings {
    /// Load the settings embedded at build time, merged with the environment.
    ///
    /// # Errors
    ///
    /// Returns [`InsticatorError::Configuration`] if the merged settings fail
    /// to deserialize or validate.
    pub fn new() -> Result<Self, Report<InsticatorError>> {
        Self::from_toml(DEFAULT_SETTINGS_TOML)
    }

    /// Parse settings from a TOML string, merged with `INSTICATOR__*` variables.
    ///
    /// # Errors
    ///
    /// Returns [`InsticatorError::Configuration`] on TOML syntax errors, type
    /// mismatches or failed validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<InsticatorError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR);

        let settings: Self = Config::builder()
            .add_source(File::from_str(toml_str, FileFormat::Toml))
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .change_context(InsticatorError::Configuration {
                message: "Failed to build settings".to_string(),
            })?;

        settings
            .validate()
            .change_context(InsticatorError::Configuration {
                message: "Settings validation failed".to_string(),
            })?;

        Ok(settings)
    }

    /// Serialize the effective settings back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`InsticatorError::Serialization`] when a configured value has
    /// no TOML representation (for example a JSON `null`).
    pub fn to_canonical_toml(&self) -> Result<String, Report<InsticatorError>> {
        toml::to_string_pretty(self).change_context(InsticatorError::Serialization {
            message: "Failed to serialize settings to TOML".to_string(),
        })
    }
}
