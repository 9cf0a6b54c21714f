//! Trait definition for analytics adapters.

use super::events::{AuctionEvent, EventType};
use crate::constants::ANALYTICS_TYPE;

/// Receives auction lifecycle events from the host.
///
/// `track` must not fail the auction: delivery problems are logged by the
/// implementation and swallowed.
pub trait AnalyticsAdapter: Send + Sync {
    /// Code publishers use to enable this adapter.
    fn code(&self) -> &'static str;

    /// Host analytics category.
    fn analytics_type(&self) -> &'static str {
        ANALYTICS_TYPE
    }

    /// Events the host should dispatch to [`AnalyticsAdapter::track`].
    fn subscribed_events(&self) -> &'static [EventType];

    /// Handle one dispatched event.
    fn track(&self, event: &AuctionEvent);

    fn is_subscribed(&self, event_type: EventType) -> bool {
        self.subscribed_events().contains(&event_type)
    }
}
