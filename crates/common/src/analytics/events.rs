//! Auction lifecycle events emitted by the host runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Lifecycle event names as the host spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    AuctionInit,
    AuctionEnd,
    BidRequested,
    BidResponse,
    BidTimeout,
    BidAdjustment,
    BidderDone,
    BidWon,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuctionInit => "auctionInit",
            Self::AuctionEnd => "auctionEnd",
            Self::BidRequested => "bidRequested",
            Self::BidResponse => "bidResponse",
            Self::BidTimeout => "bidTimeout",
            Self::BidAdjustment => "bidAdjustment",
            Self::BidderDone => "bidderDone",
            Self::BidWon => "bidWon",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emitted event and its payload.
///
/// `args` is whatever the host attached: a bid, a bidder request, or a list
/// of timed-out bidders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub args: Json,
}

impl AuctionEvent {
    #[must_use]
    pub fn new(event_type: EventType, args: Json) -> Self {
        Self { event_type, args }
    }
}
