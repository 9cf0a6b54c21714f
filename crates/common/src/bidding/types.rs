//! Host-facing objects exchanged through the bid adapter hooks.
//!
//! Field names follow the host runtime's camelCase JSON so fixtures captured
//! from a live page deserialize unchanged.

use error_stack::{Report, ResultExt};
use http::header;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as Json};

use crate::constants::CONTENT_TYPE_JSON;
use crate::error::InsticatorError;

/// Media type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Banner,
    Video,
    Native,
}

/// Creative dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSize {
    pub width: u32,
    pub height: u32,
}

/// One ad slot the host asks this bidder to price.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    #[serde(default)]
    pub bidder: String,
    #[serde(default)]
    pub params: BidParams,
    /// Legacy size list; untyped until validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Json>,
    #[serde(default)]
    pub media_types: MediaTypes,
    #[serde(default)]
    pub ad_unit_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub bid_id: String,
    #[serde(default)]
    pub bidder_request_id: String,
    #[serde(default)]
    pub auction_id: String,
}

/// Bidder-specific parameters attached to an ad slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_unit_id: Option<Json>,
    #[serde(default, flatten)]
    pub extra: Map<String, Json>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaTypes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<BannerMediaType>,
    #[serde(default, flatten)]
    pub other: Map<String, Json>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BannerMediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Json>,
}

/// Parse `[[w, h], ...]`; `None` unless the list is non-empty and every entry
/// is a pair of non-negative whole numbers (`300` and `300.0` both qualify).
#[must_use]
pub fn parse_sizes(value: &Json) -> Option<Vec<AdSize>> {
    let entries = value.as_array()?;
    if entries.is_empty() {
        return None;
    }

    entries
        .iter()
        .map(|entry| match entry.as_array().map(Vec::as_slice) {
            Some([w, h]) => Some(AdSize {
                width: size_dimension(w)?,
                height: size_dimension(h)?,
            }),
            _ => None,
        })
        .collect()
}

fn size_dimension(value: &Json) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let n = value.as_f64()?;
    if n.fract() != 0.0 || n < 0.0 || n > f64::from(u32::MAX) {
        return None;
    }
    Some(n as u32)
}

impl BidRequest {
    /// Sizes from `mediaTypes.banner.sizes`, falling back to `sizes`.
    #[must_use]
    pub fn banner_sizes(&self) -> Option<Vec<AdSize>> {
        self.media_types
            .banner
            .as_ref()
            .and_then(|banner| banner.sizes.as_ref())
            .and_then(parse_sizes)
            .or_else(|| self.sizes.as_ref().and_then(parse_sizes))
    }

    /// Whether `params.adUnitId` holds a usable (truthy) value.
    #[must_use]
    pub fn has_ad_unit_id(&self) -> bool {
        match &self.params.ad_unit_id {
            None | Some(Json::Null) => false,
            Some(Json::String(s)) => !s.is_empty(),
            Some(Json::Bool(b)) => *b,
            Some(Json::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(_) => true,
        }
    }
}

/// Shared auction context for every slot handed to this bidder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderRequest {
    #[serde(default)]
    pub auction_id: String,
    #[serde(default)]
    pub bidder_request_id: String,
    /// Auction timeout in milliseconds.
    #[serde(default)]
    pub timeout: u32,
    #[serde(default)]
    pub referer_info: RefererInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdpr_consent: Option<GdprConsent>,
    #[serde(default)]
    pub bids: Vec<BidRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefererInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GdprConsent {
    /// Accepts `true`/`false` as well as `1`/`0`.
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub gdpr_applies: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_string: Option<String>,
}

fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Json::deserialize(deserializer)?;
    Ok(match value {
        Json::Null => false,
        Json::Bool(b) => b,
        Json::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub content_type: String,
    pub with_credentials: bool,
}

/// Outbound request the host sends on the adapter's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRequest {
    pub method: String,
    pub url: String,
    pub options: RequestOptions,
    /// Serialized JSON body.
    pub data: String,
    /// Auction context the response is correlated against.
    pub bidder_request: BidderRequest,
}

impl ServerRequest {
    /// Convert into an [`http::Request`] for hosts built on the `http` crate.
    ///
    /// # Errors
    ///
    /// Returns [`InsticatorError::Serialization`] if the method or URL is not
    /// a valid HTTP request line.
    pub fn to_http_request(&self) -> Result<http::Request<Vec<u8>>, Report<InsticatorError>> {
        http::Request::builder()
            .method(self.method.as_str())
            .uri(self.url.as_str())
            .header(header::CONTENT_TYPE, self.options.content_type.as_str())
            .body(self.data.clone().into_bytes())
            .change_context(InsticatorError::Serialization {
                message: format!("Failed to build HTTP request for {}", self.url),
            })
    }

    pub(crate) fn json_post(url: String, data: String, bidder_request: BidderRequest) -> Self {
        Self {
            method: http::Method::POST.to_string(),
            url,
            options: RequestOptions {
                content_type: CONTENT_TYPE_JSON.to_string(),
                with_credentials: true,
            },
            data,
            bidder_request,
        }
    }
}

/// Response body as received by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerResponse {
    #[serde(default)]
    pub body: Option<Json>,
}

/// Bid handed back to the host runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBid {
    pub request_id: String,
    pub creative_id: Option<String>,
    pub cpm: f64,
    pub currency: String,
    pub net_revenue: bool,
    /// Seconds the bid may be rendered for.
    pub ttl: u32,
    pub width: u32,
    pub height: u32,
    pub media_type: MediaType,
    pub ad: Option<String>,
    pub ad_unit_code: String,
}

/// User-sync pixel or iframe requested by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSync {
    #[serde(rename = "type")]
    pub sync_type: String,
    pub url: String,
}

/// Which sync kinds the host allows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    #[serde(default)]
    pub iframe_enabled: bool,
    #[serde(default)]
    pub pixel_enabled: bool,
}

/// Winning bid passed to the post-win hook before render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WonBid {
    pub cpm: f64,
    #[serde(default)]
    pub ad: String,
    #[serde(default, flatten)]
    pub extra: Map<String, Json>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_sizes_accepts_numeric_pairs() {
        let sizes = parse_sizes(&json!([[300, 250], [728, 90]])).expect("should parse sizes");
        assert_eq!(
            sizes,
            vec![
                AdSize {
                    width: 300,
                    height: 250
                },
                AdSize {
                    width: 728,
                    height: 90
                },
            ]
        );
    }

    #[test]
    fn parse_sizes_rejects_malformed_entries() {
        assert!(parse_sizes(&json!([])).is_none());
        assert!(parse_sizes(&json!([["123", "foo"]])).is_none());
        assert!(parse_sizes(&json!([[300]])).is_none());
        assert!(parse_sizes(&json!([[300, 250, 1]])).is_none());
        assert!(parse_sizes(&json!("300x250")).is_none());
        assert!(parse_sizes(&json!([[300.5, 250]])).is_none());
        assert!(parse_sizes(&json!([[-300.0, 250]])).is_none());
    }

    #[test]
    fn parse_sizes_accepts_whole_floats() {
        let sizes = parse_sizes(&json!([[300.0, 250.0]])).expect("should parse float sizes");
        assert_eq!(
            sizes,
            vec![AdSize {
                width: 300,
                height: 250
            }]
        );
    }

    #[test]
    fn banner_sizes_prefers_media_types() {
        let bid: BidRequest = serde_json::from_value(json!({
            "sizes": [[320, 50]],
            "mediaTypes": { "banner": { "sizes": [[300, 600]] } }
        }))
        .expect("should parse bid request");

        let sizes = bid.banner_sizes().expect("should have sizes");
        assert_eq!(sizes[0].height, 600);
    }

    #[test]
    fn banner_sizes_falls_back_to_legacy_sizes() {
        let bid: BidRequest = serde_json::from_value(json!({
            "sizes": [[320, 50]],
            "mediaTypes": { "banner": {} }
        }))
        .expect("should parse bid request");

        let sizes = bid.banner_sizes().expect("should have sizes");
        assert_eq!(sizes[0].width, 320);
    }

    #[test]
    fn has_ad_unit_id_follows_truthiness() {
        let mut bid = BidRequest::default();
        assert!(!bid.has_ad_unit_id());

        bid.params.ad_unit_id = Some(json!(""));
        assert!(!bid.has_ad_unit_id());

        bid.params.ad_unit_id = Some(json!(0));
        assert!(!bid.has_ad_unit_id());

        bid.params.ad_unit_id = Some(json!("123456"));
        assert!(bid.has_ad_unit_id());

        bid.params.ad_unit_id = Some(json!(42));
        assert!(bid.has_ad_unit_id());
    }

    #[test]
    fn gdpr_applies_accepts_numbers() {
        let consent: GdprConsent =
            serde_json::from_value(json!({ "gdprApplies": 1, "consentString": "foobar" }))
                .expect("should parse consent");
        assert!(consent.gdpr_applies);

        let consent: GdprConsent = serde_json::from_value(json!({ "gdprApplies": false }))
            .expect("should parse consent");
        assert!(!consent.gdpr_applies);
        assert_eq!(consent.consent_string, None);
    }

    #[test]
    fn server_request_converts_to_http_request() {
        let request = ServerRequest::json_post(
            "https://ex.example.com/v1/openrtb".to_string(),
            "{}".to_string(),
            BidderRequest::default(),
        );

        let http_request = request
            .to_http_request()
            .expect("should build http request");
        assert_eq!(http_request.method(), http::Method::POST);
        assert_eq!(
            http_request
                .headers()
                .get(header::CONTENT_TYPE)
                .expect("should have content type"),
            "application/json"
        );
        assert_eq!(http_request.body(), b"{}");
    }
}
