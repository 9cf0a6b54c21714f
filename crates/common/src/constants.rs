pub const BIDDER_CODE: &str = "insticator";
pub const ANALYTICS_CODE: &str = "insticator";
pub const ANALYTICS_TYPE: &str = "endpoint";

pub const DEFAULT_BIDDER_ENDPOINT: &str = "https://ex.hunchme.com/v1/openrtb";
pub const DEFAULT_ANALYTICS_ENDPOINT: &str = "https://event.hunchme.com/v1/event";

pub const USER_ID_KEY: &str = "hb_insticator_uid";
pub const USER_ID_LENGTH: usize = 36;
// 30 days
pub const USER_ID_COOKIE_EXPIRY_MS: i64 = 2_592_000_000;

pub const DEFAULT_BID_TTL: u32 = 300;
pub const DEFAULT_CURRENCY: &str = "USD";

pub const AUCTION_PRICE_B64_MACRO: &str = "${AUCTION_PRICE:B64}";
pub const ANALYTICS_EVENT_NAME_PREFIX: &str = "event_prebid-";

pub const CONTENT_TYPE_JSON: &str = "application/json";
