//! Trait definition for bid adapters.

use super::types::{
    BidRequest, BidderRequest, MediaType, NormalizedBid, ServerRequest, ServerResponse,
    SyncOptions, UserSync, WonBid,
};

/// Lifecycle hooks a host auction runtime calls on every registered bidder.
///
/// Hooks never fail from the host's point of view: malformed input yields
/// `false` or an empty list, with the reason logged.
pub trait BidAdapter: Send + Sync {
    /// Bidder code used by publishers to address this adapter.
    fn code(&self) -> &'static str;

    /// Media types this adapter can bid on.
    fn supported_media_types(&self) -> &'static [MediaType] {
        &[MediaType::Banner]
    }

    /// Validate a single ad slot before it enters the auction.
    fn is_bid_request_valid(&self, bid: &BidRequest) -> bool;

    /// Build the outbound requests for every slot that passed validation.
    fn build_requests(
        &self,
        valid_bids: &[BidRequest],
        bidder_request: &BidderRequest,
    ) -> Vec<ServerRequest>;

    /// Map a bidder response onto normalized bids.
    fn interpret_response(
        &self,
        response: &ServerResponse,
        request: &ServerRequest,
    ) -> Vec<NormalizedBid>;

    /// Collect user-sync pixels announced in responses.
    fn get_user_syncs(&self, _options: &SyncOptions, _responses: &[ServerResponse]) -> Vec<UserSync> {
        Vec::new()
    }

    /// Called once this adapter's bid wins, before the creative renders.
    fn on_bid_won(&self, _won: &mut WonBid) {}

    /// Check if this adapter supports a specific media type.
    fn supports_media_type(&self, media_type: MediaType) -> bool {
        self.supported_media_types().contains(&media_type)
    }
}
