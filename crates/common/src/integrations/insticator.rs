//! Insticator bid adapter.
//!
//! Translates the host's ad slots into a single OpenRTB request against the
//! Insticator exchange and maps the seat bids it returns back onto the
//! originating slots.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use error_stack::{Report, ResultExt};
use serde_json::{json, Map, Value as Json};

use crate::bidding::adapter::BidAdapter;
use crate::bidding::types::{
    BidRequest, BidderRequest, MediaType, NormalizedBid, ServerRequest, ServerResponse,
    SyncOptions, UserSync, WonBid,
};
use crate::constants::{AUCTION_PRICE_B64_MACRO, BIDDER_CODE, DEFAULT_BID_TTL, DEFAULT_CURRENCY};
use crate::error::InsticatorError;
use crate::host::HostEnvironment;
use crate::openrtb::{
    Banner, Bid, Format, Imp, ImpExt, InsticatorImpExt, OpenRtbRequest,
    OpenRtbResponse, Regs, RegsExt, RequestExt, Site, Source, User,
};
use crate::settings::{BidderSettings, Settings};
use crate::user_id::get_or_generate_user_id;

pub struct InsticatorBidAdapter {
    config: BidderSettings,
    env: Arc<dyn HostEnvironment>,
}

impl InsticatorBidAdapter {
    #[must_use]
    pub fn new(config: BidderSettings, env: Arc<dyn HostEnvironment>) -> Self {
        Self { config, env }
    }

    fn endpoint_url(&self) -> String {
        self.config.endpoint_url.clone()
    }

    fn bid_ttl(&self) -> u32 {
        if self.config.bid_ttl > 0 {
            self.config.bid_ttl
        } else {
            DEFAULT_BID_TTL
        }
    }

    fn build_impression(bid: &BidRequest) -> Imp {
        let format = bid
            .banner_sizes()
            .unwrap_or_default()
            .into_iter()
            .map(|size| Format {
                w: size.width,
                h: size.height,
            })
            .collect();

        Imp {
            id: bid.bid_id.clone(),
            tagid: bid.ad_unit_code.clone(),
            banner: Banner { format },
            ext: ImpExt {
                insticator: InsticatorImpExt {
                    ad_unit_id: bid.params.ad_unit_id.clone().unwrap_or(Json::Null),
                },
            },
        }
    }

    fn build_device(&self) -> Map<String, Json> {
        let viewport = self.env.viewport();
        let mut device = Map::new();
        device.insert("w".to_string(), Json::from(viewport.width));
        device.insert("h".to_string(), Json::from(viewport.height));
        device.insert("js".to_string(), Json::Bool(true));
        device.insert(
            "ext".to_string(),
            json!({
                "localStorage": self.env.local_storage_enabled(),
                "cookies": self.env.cookies_enabled(),
            }),
        );

        if let Some(overrides) = &self.config.device {
            apply_device_overrides(&mut device, overrides);
        }
        device
    }

    fn build_regs(bidder_request: &BidderRequest) -> Regs {
        Regs {
            ext: bidder_request.gdpr_consent.as_ref().map(|consent| RegsExt {
                gdpr: u8::from(consent.gdpr_applies),
                gdpr_consent_string: consent.consent_string.clone(),
            }),
        }
    }

    fn build_user(&self) -> User {
        User {
            id: get_or_generate_user_id(self.env.as_ref()),
        }
    }

    /// Convert the valid slots and auction context to the exchange request.
    fn to_openrtb(&self, valid_bids: &[BidRequest], bidder_request: &BidderRequest) -> OpenRtbRequest {
        let page = self.env.page();

        OpenRtbRequest {
            id: bidder_request.bidder_request_id.clone(),
            tmax: bidder_request.timeout,
            source: Source {
                fd: 1,
                tid: bidder_request.auction_id.clone(),
            },
            site: Site {
                domain: page.hostname,
                page: page.href,
                referrer: bidder_request.referer_info.referer.clone(),
            },
            device: self.build_device(),
            regs: Self::build_regs(bidder_request),
            user: self.build_user(),
            imp: valid_bids.iter().map(Self::build_impression).collect(),
            ext: self.config.params.as_ref().map(|params| RequestExt {
                insticator: params.clone(),
            }),
        }
    }

    fn build_bid(&self, raw: &Json, bidder_request: &BidderRequest) -> Option<NormalizedBid> {
        let bid: Bid = match serde_json::from_value(raw.clone()) {
            Ok(bid) => bid,
            Err(e) => {
                log::warn!("Insticator: skipping malformed bid: {e}");
                return None;
            }
        };

        let Some(original) = bidder_request.bids.iter().find(|b| b.bid_id == bid.impid) else {
            log::warn!(
                "Insticator: bid for impid '{}' matches no requested slot",
                bid.impid
            );
            return None;
        };

        Some(NormalizedBid {
            request_id: bid.impid,
            creative_id: bid.crid,
            cpm: bid.price,
            currency: DEFAULT_CURRENCY.to_string(),
            net_revenue: true,
            ttl: bid.exp.filter(|exp| *exp > 0).unwrap_or_else(|| self.bid_ttl()),
            width: bid.w,
            height: bid.h,
            media_type: MediaType::Banner,
            ad: bid.adm,
            ad_unit_code: original.ad_unit_code.clone(),
        })
    }
}

/// Check one slot, naming the first missing requirement.
fn validate_bid_request(bid: &BidRequest) -> Result<(), Report<InsticatorError>> {
    let invalid = |message: &str| {
        Report::new(InsticatorError::InvalidBidRequest {
            message: message.to_string(),
        })
    };

    if !bid.has_ad_unit_id() {
        return Err(invalid("missing adUnitId bid parameter"));
    }
    if bid.media_types.banner.is_none() {
        return Err(invalid("expected banner in mediaTypes"));
    }
    if bid.banner_sizes().is_none() {
        return Err(invalid("banner sizes not specified or invalid"));
    }
    Ok(())
}

/// Parse the response body and check it answers this auction.
fn parse_response(
    response: &ServerResponse,
    bidder_request: &BidderRequest,
) -> Result<OpenRtbResponse, Report<InsticatorError>> {
    let body = response.body.as_ref().ok_or_else(|| {
        Report::new(InsticatorError::Response {
            message: "response has no body".to_string(),
        })
    })?;

    let parsed: OpenRtbResponse =
        serde_json::from_value(body.clone()).change_context(InsticatorError::Response {
            message: "response body is not an OpenRTB bid response".to_string(),
        })?;

    if parsed.id.as_deref() != Some(bidder_request.bidder_request_id.as_str()) {
        return Err(Report::new(InsticatorError::Response {
            message: format!(
                "response id {:?} does not match bidderRequestId '{}'",
                parsed.id, bidder_request.bidder_request_id
            ),
        }));
    }

    Ok(parsed)
}

fn log_rejection(report: &Report<InsticatorError>) {
    let error = report.current_context();
    log::error!("Insticator [{}]: {}", error.kind(), error);
}

/// Shallow-merge configured fields over the generated device object.
///
/// Top-level keys are replaced wholesale, so an `ext` override drops the
/// generated storage flags.
fn apply_device_overrides(device: &mut Map<String, Json>, overrides: &Map<String, Json>) {
    device.extend(
        overrides
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
}

/// Base64 of the clearing price as the host prints it (`0.5` -> `MC41`).
fn encode_price(cpm: f64) -> String {
    BASE64.encode(cpm.to_string())
}

impl BidAdapter for InsticatorBidAdapter {
    fn code(&self) -> &'static str {
        BIDDER_CODE
    }

    fn is_bid_request_valid(&self, bid: &BidRequest) -> bool {
        match validate_bid_request(bid) {
            Ok(()) => true,
            Err(e) => {
                log_rejection(&e);
                false
            }
        }
    }

    fn build_requests(
        &self,
        valid_bids: &[BidRequest],
        bidder_request: &BidderRequest,
    ) -> Vec<ServerRequest> {
        if valid_bids.is_empty() {
            return Vec::new();
        }

        log::info!(
            "Insticator: requesting bids for {} slots",
            valid_bids.len()
        );

        let openrtb = self.to_openrtb(valid_bids, bidder_request);
        let data = match serde_json::to_string(&openrtb) {
            Ok(data) => data,
            Err(e) => {
                log::error!("Insticator: failed to serialize OpenRTB request: {e}");
                return Vec::new();
            }
        };
        log::debug!("Insticator OpenRTB request to {}: {}", self.config.endpoint_url, data);

        vec![ServerRequest::json_post(
            self.endpoint_url(),
            data,
            bidder_request.clone(),
        )]
    }

    fn interpret_response(
        &self,
        response: &ServerResponse,
        request: &ServerRequest,
    ) -> Vec<NormalizedBid> {
        let bidder_request = &request.bidder_request;

        let parsed = match parse_response(response, bidder_request) {
            Ok(parsed) => parsed,
            Err(e) => {
                log_rejection(&e);
                return Vec::new();
            }
        };

        let Some(seatbids) = parsed.seatbid else {
            return Vec::new();
        };

        let bids: Vec<NormalizedBid> = seatbids
            .iter()
            .flat_map(|seatbid| seatbid.bid.iter())
            .filter_map(|raw| self.build_bid(raw, bidder_request))
            .collect();

        log::info!("Insticator returned {} bids", bids.len());
        bids
    }

    fn get_user_syncs(&self, _options: &SyncOptions, responses: &[ServerResponse]) -> Vec<UserSync> {
        responses
            .iter()
            .filter_map(|response| response.body.as_ref())
            .filter_map(|body| body.get("ext")?.get("sync")?.as_array())
            .flatten()
            .filter_map(|sync| match serde_json::from_value::<UserSync>(sync.clone()) {
                Ok(sync) => Some(sync),
                Err(e) => {
                    log::debug!("Insticator: skipping malformed user sync: {e}");
                    None
                }
            })
            .collect()
    }

    fn on_bid_won(&self, won: &mut WonBid) {
        won.ad = won
            .ad
            .replacen(AUCTION_PRICE_B64_MACRO, &encode_price(won.cpm), 1);
    }
}

/// Build the Insticator bid adapter when enabled in settings.
#[must_use]
pub fn register_bid_adapter(
    settings: &Settings,
    env: &Arc<dyn HostEnvironment>,
) -> Option<Arc<dyn BidAdapter>> {
    if !settings.bidder.enabled {
        log::info!("Insticator bid adapter not registered: disabled");
        return None;
    }

    log::info!(
        "Registering Insticator bid adapter (endpoint_url={})",
        settings.bidder.endpoint_url
    );
    Some(Arc::new(InsticatorBidAdapter::new(
        settings.bidder.clone(),
        Arc::clone(env),
    )))
}
