//! Analytics adapters and event dispatch.
//!
//! Concrete adapters live in the `integrations` module
//! (e.g. `crate::integrations::insticator_analytics`).

use std::sync::Arc;

use crate::host::{EventTransport, HostEnvironment};
use crate::settings::Settings;

pub mod adapter;
pub mod events;

pub use adapter::AnalyticsAdapter;
pub use events::{AuctionEvent, EventType};

/// Type alias for analytics adapter builder functions.
type AnalyticsBuilder = fn(
    &Settings,
    &dyn HostEnvironment,
    &Arc<dyn EventTransport>,
    &[AuctionEvent],
) -> Option<Arc<dyn AnalyticsAdapter>>;

fn analytics_builders() -> &'static [AnalyticsBuilder] {
    &[crate::integrations::insticator_analytics::register_analytics_adapter]
}

/// Enable every analytics adapter turned on in settings.
///
/// `history` holds the events the host emitted before analytics were
/// enabled; adapters may replay them.
#[must_use]
pub fn build_analytics_adapters(
    settings: &Settings,
    env: &dyn HostEnvironment,
    transport: &Arc<dyn EventTransport>,
    history: &[AuctionEvent],
) -> Vec<Arc<dyn AnalyticsAdapter>> {
    let adapters: Vec<_> = analytics_builders()
        .iter()
        .filter_map(|builder| builder(settings, env, transport, history))
        .collect();

    log::info!("Enabled {} analytics adapters", adapters.len());
    adapters
}

/// Dispatch one event to every adapter subscribed to it.
pub fn dispatch_event(adapters: &[Arc<dyn AnalyticsAdapter>], event: &AuctionEvent) {
    for adapter in adapters {
        if adapter.is_subscribed(event.event_type) {
            adapter.track(event);
        }
    }
}
