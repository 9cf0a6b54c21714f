//! Insticator analytics adapter.
//!
//! Forwards bid lifecycle events to the Insticator event collector, one POST
//! per event. Whether a session reports at all is decided once when the
//! adapter is enabled.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use error_stack::{Report, ResultExt};
use http::header;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use serde_json::Value as Json;
use url::Url;

use crate::analytics::adapter::AnalyticsAdapter;
use crate::analytics::events::{AuctionEvent, EventType};
use crate::constants::{ANALYTICS_CODE, ANALYTICS_EVENT_NAME_PREFIX, CONTENT_TYPE_JSON};
use crate::error::InsticatorError;
use crate::host::{EventTransport, HostEnvironment};
use crate::settings::{AnalyticsSettings, Settings};

static MOBILE_USER_AGENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(ios|ipod|ipad|iphone|android)")
        .expect("mobile user agent regex should compile")
});

/// Leading decimal number of a string, the way the host's `parseFloat` reads it.
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading number regex should compile")
});

/// Host helper fields and markup that never leave the page.
const STRIPPED_BID_RESPONSE_FIELDS: [&str; 3] = ["ad", "getSize", "getStatusCode"];

const SUBSCRIBED_EVENTS: &[EventType] = &[
    EventType::BidRequested,
    EventType::BidResponse,
    EventType::BidTimeout,
    EventType::BidWon,
];

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsOptions {
    pub site: String,
    pub endpoint: String,
    pub debug: bool,
    pub sampling: Option<f64>,
}

impl AnalyticsOptions {
    /// Resolve options, taking `debug` from the host when not configured.
    #[must_use]
    pub fn from_settings(settings: &AnalyticsSettings, env: &dyn HostEnvironment) -> Self {
        Self {
            site: settings.site.clone(),
            endpoint: settings.endpoint.clone(),
            debug: settings.debug.unwrap_or_else(|| env.debug_enabled()),
            sampling: settings.sampling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Web,
}

impl DeviceClass {
    #[must_use]
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        match user_agent {
            Some(ua) if MOBILE_USER_AGENT.is_match(ua) => Self::Mobile,
            _ => Self::Web,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload<'a> {
    event_type: EventType,
    original_device: DeviceClass,
    data: Json,
    target_site: &'a str,
    timestamp: String,
}

pub struct InsticatorAnalytics {
    options: AnalyticsOptions,
    sampled: bool,
    device: DeviceClass,
    transport: Arc<dyn EventTransport>,
}

impl InsticatorAnalytics {
    /// Enable the adapter for one session.
    ///
    /// Rolls the sampling decision with `rng`. A sampled session first
    /// replays the subscribed events in `history`.
    pub fn enable_analytics<R: Rng>(
        options: AnalyticsOptions,
        env: &dyn HostEnvironment,
        history: &[AuctionEvent],
        transport: Arc<dyn EventTransport>,
        rng: &mut R,
    ) -> Self {
        let sampled = options
            .sampling
            .map_or(true, |rate| rng.gen::<f64>() < rate);

        let analytics = Self {
            device: DeviceClass::from_user_agent(env.user_agent().as_deref()),
            options,
            sampled,
            transport,
        };

        if sampled {
            let mut replayed = 0;
            for event in history {
                if analytics.is_subscribed(event.event_type) {
                    analytics.forward(event);
                    replayed += 1;
                }
            }
            log::debug!("Insticator Analytics: replayed {replayed} earlier events");
        } else {
            log::info!("Insticator Analytics: analytics disabled by sampling");
        }

        analytics
    }

    #[must_use]
    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    #[must_use]
    pub fn options(&self) -> &AnalyticsOptions {
        &self.options
    }

    fn forward(&self, event: &AuctionEvent) {
        let mut data = event.args.clone();
        if event.event_type == EventType::BidResponse {
            strip_bid_response(&mut data);
        }

        if let Err(e) = self.send_data_event(event.event_type, data, Utc::now()) {
            log::error!(
                "Insticator Analytics: failed to send {} event: {e:?}",
                event.event_type
            );
        }
    }

    fn event_url(&self, event_type: EventType) -> Result<Url, Report<InsticatorError>> {
        let mut url = Url::parse(&self.options.endpoint).change_context(
            InsticatorError::Analytics {
                message: format!("Invalid analytics endpoint: {}", self.options.endpoint),
            },
        )?;

        let event_name = format!(
            "{ANALYTICS_EVENT_NAME_PREFIX}{}",
            event_type.as_str().to_lowercase()
        );
        url.query_pairs_mut().append_pair("event_name", &event_name);
        Ok(url)
    }

    fn build_payload(
        &self,
        event_type: EventType,
        mut data: Json,
        now: DateTime<Utc>,
    ) -> Result<Json, Report<InsticatorError>> {
        add_revenue(&mut data);

        let payload = EventPayload {
            event_type,
            original_device: self.device,
            data,
            target_site: &self.options.site,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        serde_json::to_value(payload).change_context(InsticatorError::Serialization {
            message: format!("Failed to serialize {event_type} payload"),
        })
    }

    fn send_data_event(
        &self,
        event_type: EventType,
        data: Json,
        now: DateTime<Utc>,
    ) -> Result<(), Report<InsticatorError>> {
        let url = self.event_url(event_type)?;
        let payload = self.build_payload(event_type, data, now)?;
        let body = serde_json::to_vec(&payload).change_context(InsticatorError::Serialization {
            message: "Failed to serialize analytics payload".to_string(),
        })?;

        if self.options.debug {
            log::info!("Insticator Analytics: {event_type} -> {url}: {payload}");
        }

        let request = http::Request::builder()
            .method(http::Method::POST)
            .uri(url.as_str())
            .header(header::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body)
            .change_context(InsticatorError::Analytics {
                message: format!("Failed to build analytics request for {url}"),
            })?;

        self.transport.send(request)
    }
}

impl AnalyticsAdapter for InsticatorAnalytics {
    fn code(&self) -> &'static str {
        ANALYTICS_CODE
    }

    fn subscribed_events(&self) -> &'static [EventType] {
        SUBSCRIBED_EVENTS
    }

    fn track(&self, event: &AuctionEvent) {
        if !self.sampled || !self.is_subscribed(event.event_type) {
            return;
        }
        self.forward(event);
    }
}

fn strip_bid_response(data: &mut Json) {
    if let Json::Object(fields) = data {
        for field in STRIPPED_BID_RESPONSE_FIELDS {
            fields.remove(field);
        }
    }
}

/// Add `revenue = cpm / 1000` to payloads carrying a `cpm`.
///
/// String prices are read up to the first non-numeric character (`"1.5 USD"`
/// is 1.5). A `cpm` with no leading number reports `revenue: null`.
fn add_revenue(data: &mut Json) {
    let Json::Object(fields) = data else {
        return;
    };
    let Some(cpm) = fields.get("cpm") else {
        return;
    };

    let cpm = match cpm {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => parse_leading_number(s),
        _ => None,
    };
    let revenue = cpm
        .map(|cpm| cpm / 1000.0)
        .and_then(serde_json::Number::from_f64)
        .map_or(Json::Null, Json::Number);

    fields.insert("revenue".to_string(), revenue);
}

fn parse_leading_number(s: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Enable Insticator analytics when configured.
#[must_use]
pub fn register_analytics_adapter(
    settings: &Settings,
    env: &dyn HostEnvironment,
    transport: &Arc<dyn EventTransport>,
    history: &[AuctionEvent],
) -> Option<Arc<dyn AnalyticsAdapter>> {
    if !settings.analytics.enabled {
        log::info!("Insticator analytics not enabled");
        return None;
    }

    log::info!(
        "Enabling Insticator analytics (site={}, endpoint={})",
        settings.analytics.site,
        settings.analytics.endpoint
    );
    let options = AnalyticsOptions::from_settings(&settings.analytics, env);
    Some(Arc::new(InsticatorAnalytics::enable_analytics(
        options,
        env,
        history,
        Arc::clone(transport),
        &mut rand::thread_rng(),
    )))
}
