use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Subset of an OpenRTB 2.x bid request sent to the Insticator exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRtbRequest {
    /// Unique ID of the bid request; the host's bidder request id.
    pub id: String,
    /// Auction timeout in milliseconds.
    pub tmax: u32,
    pub source: Source,
    pub site: Site,
    /// Generated device fields with the configured overrides merged on top.
    pub device: Map<String, Value>,
    pub regs: Regs,
    pub user: User,
    pub imp: Vec<Imp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<RequestExt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// 1 when the upstream decision is made by the exchange.
    pub fd: u8,
    pub tid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub domain: String,
    pub page: String,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Regs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<RegsExt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegsExt {
    pub gdpr: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr_consent_string: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imp {
    pub id: String,
    pub tagid: String,
    pub banner: Banner,
    pub ext: ImpExt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub format: Vec<Format>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpExt {
    pub insticator: InsticatorImpExt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsticatorImpExt {
    pub ad_unit_id: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestExt {
    pub insticator: Map<String, Value>,
}

/// Subset of an OpenRTB 2.x bid response returned by the exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenRtbResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seatbid: Option<Vec<SeatBid>>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeatBid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    /// Kept untyped so one malformed bid does not discard the whole seat.
    #[serde(default)]
    pub bid: Vec<Value>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    #[serde(default)]
    pub id: Option<String>,
    pub impid: String,
    pub price: f64,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub crid: Option<String>,
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
    #[serde(default)]
    pub adm: Option<String>,
    /// Seconds the bid stays valid.
    #[serde(default)]
    pub exp: Option<u32>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// Accept ids sent as strings or bare numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected string or number id, got {other}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_regs_serializes_as_empty_object() {
        let value = serde_json::to_value(Regs::default()).expect("should serialize regs");
        assert_eq!(value, json!({}));
    }

    #[test]
    fn site_referrer_uses_ref_key() {
        let site = Site {
            domain: "example.com".to_string(),
            page: "https://example.com/".to_string(),
            referrer: Some("https://google.com/".to_string()),
        };
        let value = serde_json::to_value(site).expect("should serialize site");
        assert_eq!(value["ref"], json!("https://google.com/"));
    }

    #[test]
    fn response_keeps_unparsed_bids() {
        let response: OpenRtbResponse = serde_json::from_value(json!({
            "id": "req-1",
            "seatbid": [{ "seat": "insticator", "bid": [{ "impid": "a" }, { "impid": "b", "price": 1.2 }] }],
            "cur": "USD"
        }))
        .expect("should parse response");

        let seatbid = response.seatbid.expect("should have seatbid");
        assert_eq!(seatbid[0].bid.len(), 2);
        assert_eq!(response.extra.get("cur"), Some(&json!("USD")));

        let bid: Bid =
            serde_json::from_value(seatbid[0].bid[1].clone()).expect("should parse bid");
        assert_eq!(bid.impid, "b");
        assert!((bid.price - 1.2).abs() < f64::EPSILON);
        assert_eq!(bid.exp, None);
    }

    #[test]
    fn bid_accepts_numeric_creative_id() {
        let bid: Bid = serde_json::from_value(json!({ "impid": "a", "price": 0.5, "crid": 98765 }))
            .expect("should parse bid with numeric crid");
        assert_eq!(bid.crid.as_deref(), Some("98765"));

        let bid: Bid = serde_json::from_value(json!({ "impid": "a", "price": 0.5 }))
            .expect("should parse bid without crid");
        assert_eq!(bid.crid, None);
    }
}
