//! Bid adapter framework.
//!
//! Adapters implement [`BidAdapter`] and are discovered from settings by
//! [`build_bid_adapters`]. Concrete adapters live in the `integrations` module
//! (e.g. `crate::integrations::insticator`).

use std::collections::BTreeMap;
use std::sync::Arc;

use error_stack::Report;

use crate::error::InsticatorError;
use crate::host::HostEnvironment;
use crate::settings::Settings;

pub mod adapter;
pub mod types;

pub use adapter::BidAdapter;
pub use types::{
    AdSize, BidRequest, BidderRequest, MediaType, NormalizedBid, ServerRequest, ServerResponse,
    SyncOptions, UserSync, WonBid,
};

/// Type alias for bid adapter builder functions.
type BidAdapterBuilder = fn(&Settings, &Arc<dyn HostEnvironment>) -> Option<Arc<dyn BidAdapter>>;

/// Returns every known bid adapter builder.
///
/// Each builder checks settings for its own section and returns an adapter
/// only when enabled.
fn adapter_builders() -> &'static [BidAdapterBuilder] {
    &[crate::integrations::insticator::register_bid_adapter]
}

/// Bid adapters keyed by bidder code.
#[derive(Default)]
pub struct BidderRegistry {
    adapters: BTreeMap<String, Arc<dyn BidAdapter>>,
}

impl BidderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bid adapter, replacing any adapter with the same code.
    pub fn register(&mut self, adapter: Arc<dyn BidAdapter>) {
        let code = adapter.code().to_string();
        log::info!("Registering bid adapter: {code}");
        self.adapters.insert(code, adapter);
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Arc<dyn BidAdapter>> {
        self.adapters.get(code)
    }

    /// Look up an adapter, failing with the list of registered codes.
    ///
    /// # Errors
    ///
    /// Returns [`InsticatorError::Configuration`] if no adapter is registered
    /// under `code`.
    pub fn require(&self, code: &str) -> Result<&Arc<dyn BidAdapter>, Report<InsticatorError>> {
        self.get(code).ok_or_else(|| {
            Report::new(InsticatorError::Configuration {
                message: format!(
                    "Bidder '{}' is not registered. Available bidders: {:?}",
                    code,
                    self.codes()
                ),
            })
        })
    }

    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }
}

/// Build the bidder registry for the current settings.
#[must_use]
pub fn build_bid_adapters(settings: &Settings, env: &Arc<dyn HostEnvironment>) -> BidderRegistry {
    let mut registry = BidderRegistry::new();
    for builder in adapter_builders() {
        if let Some(adapter) = builder(settings, env) {
            registry.register(adapter);
        }
    }

    log::info!(
        "Bidder registry built with {} adapters",
        registry.adapter_count()
    );
    registry
}

/// Run one bidder's request phase the way the host does: validate every slot
/// addressed to it, then build requests for the survivors.
#[must_use]
pub fn request_bids(
    adapter: &dyn BidAdapter,
    bidder_request: &BidderRequest,
) -> Vec<ServerRequest> {
    let valid_bids: Vec<BidRequest> = bidder_request
        .bids
        .iter()
        .filter(|bid| bid.bidder.is_empty() || bid.bidder == adapter.code())
        .filter(|bid| adapter.is_bid_request_valid(bid))
        .cloned()
        .collect();

    log::debug!(
        "{}: {} of {} slots passed validation",
        adapter.code(),
        valid_bids.len(),
        bidder_request.bids.len()
    );

    adapter.build_requests(&valid_bids, bidder_request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tests::{bidder_request, create_test_settings, test_environment};

    fn env() -> Arc<dyn HostEnvironment> {
        Arc::new(test_environment())
    }

    #[test]
    fn build_bid_adapters_registers_insticator() {
        let registry = build_bid_adapters(&create_test_settings(), &env());

        assert_eq!(registry.adapter_count(), 1);
        assert_eq!(registry.codes(), vec!["insticator"]);
        assert!(registry.get("insticator").is_some());
    }

    #[test]
    fn build_bid_adapters_skips_disabled_bidder() {
        let mut settings = create_test_settings();
        settings.bidder.enabled = false;

        let registry = build_bid_adapters(&settings, &env());
        assert_eq!(registry.adapter_count(), 0);
    }

    #[test]
    fn require_reports_unknown_bidder() {
        let registry = build_bid_adapters(&create_test_settings(), &env());

        let err = registry
            .require("appnexus")
            .err()
            .expect("should not find unregistered bidder");
        assert!(err.to_string().contains("appnexus"));
    }

    #[test]
    fn request_bids_drops_invalid_slots() {
        let registry = build_bid_adapters(&create_test_settings(), &env());
        let adapter = registry.require("insticator").expect("should find insticator");

        let mut request = bidder_request();
        request.bids[1].params.ad_unit_id = None;

        let requests = request_bids(adapter.as_ref(), &request);
        assert_eq!(requests.len(), 1);

        let body: serde_json::Value =
            serde_json::from_str(&requests[0].data).expect("should parse body");
        assert_eq!(body["imp"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn request_bids_without_valid_slots_builds_nothing() {
        let registry = build_bid_adapters(&create_test_settings(), &env());
        let adapter = registry.require("insticator").expect("should find insticator");

        let mut request = bidder_request();
        for bid in &mut request.bids {
            bid.media_types.banner = None;
        }

        assert!(request_bids(adapter.as_ref(), &request).is_empty());
    }
}
