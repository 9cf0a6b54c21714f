#[cfg(test)]
pub mod tests {
    use std::sync::{Arc, Mutex};

    use error_stack::Report;
    use http::header;
    use serde_json::{json, Value as Json};

    use crate::bidding::types::{BidRequest, BidderRequest};
    use crate::environment::MemoryEnvironment;
    use crate::error::InsticatorError;
    use crate::host::{EventTransport, PageInfo, Viewport};
    use crate::integrations::insticator::InsticatorBidAdapter;
    use crate::settings::{BidderSettings, Settings};

    pub fn crate_test_settings_str() -> String {
        r#"
            [bidder]
            enabled = true
            endpoint_url = "https://ex.hunchme.com/v1/openrtb"
            bid_ttl = 300

            [analytics]
            enabled = true
            site = "example"
            endpoint = "https://event.test-insticator.com/v1/event"
            "#
        .to_string()
    }

    pub fn create_test_settings() -> Settings {
        let toml_str = crate_test_settings_str();
        Settings::from_toml(&toml_str).expect("Invalid config")
    }

    /// Page at `http://localhost:9876/context.html` with a 100x100 viewport.
    pub fn test_environment() -> MemoryEnvironment {
        MemoryEnvironment::new(
            PageInfo {
                hostname: "localhost".to_string(),
                href: "http://localhost:9876/context.html".to_string(),
            },
            Viewport {
                width: 100,
                height: 100,
            },
        )
    }

    pub fn test_adapter() -> (InsticatorBidAdapter, Arc<MemoryEnvironment>) {
        let env = Arc::new(test_environment());
        let adapter = InsticatorBidAdapter::new(BidderSettings::default(), env.clone());
        (adapter, env)
    }

    pub fn test_adapter_with(config: BidderSettings, env: MemoryEnvironment) -> InsticatorBidAdapter {
        InsticatorBidAdapter::new(config, Arc::new(env))
    }

    pub fn valid_bid() -> BidRequest {
        serde_json::from_value(json!({
            "bidder": "insticator",
            "params": { "adUnitId": "123456" },
            "sizes": [[300, 250], [300, 600]],
            "mediaTypes": { "banner": { "sizes": [[300, 250], [300, 600]] } },
            "adUnitCode": "div-gpt-ad-837465923534-0",
            "transactionId": "f160fc1d-3db4-4dbe-ab1d-b2814e5c2d57",
            "bidId": "1234abcd",
            "bidderRequestId": "123d12231aa",
            "auctionId": "ccaabb112233"
        }))
        .expect("should parse bid fixture")
    }

    pub fn valid_bid2() -> BidRequest {
        serde_json::from_value(json!({
            "bidder": "insticator",
            "params": { "adUnitId": "234567" },
            "sizes": [[300, 600]],
            "mediaTypes": { "banner": { "sizes": [[300, 600]] } },
            "adUnitCode": "div-gpt-ad-4645345744-0",
            "transactionId": "b47af70a-cecd-4974-8a01-50721d6033cb",
            "bidId": "2345abcd",
            "bidderRequestId": "123d12231aa",
            "auctionId": "ccaabb112233"
        }))
        .expect("should parse bid fixture")
    }

    pub fn bidder_request() -> BidderRequest {
        BidderRequest {
            auction_id: "ccaabb112233".to_string(),
            bidder_request_id: "123d12231aa".to_string(),
            timeout: 200,
            referer_info: serde_json::from_value(json!({ "referer": "http://domain.com/foo" }))
                .expect("should parse referer fixture"),
            gdpr_consent: None,
            bids: vec![valid_bid(), valid_bid2()],
        }
    }

    pub fn valid_response() -> Json {
        json!({
            "id": "123d12231aa",
            "seatbid": [
                {
                    "seat": "insticator",
                    "group": 0,
                    "bid": [
                        {
                            "id": "bid123456",
                            "w": 300,
                            "h": 250,
                            "impid": "1234abcd",
                            "price": 0.5,
                            "crid": "987654321",
                            "adm": "<div>ad</div>"
                        }
                    ]
                }
            ],
            "ext": {
                "sync": [
                    { "type": "image", "url": "http://ex.ingage.tech/sync/1234567" }
                ]
            }
        })
    }

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: String,
        pub uri: String,
        pub content_type: Option<String>,
        pub body: Json,
    }

    /// Transport that keeps every request it is handed.
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl RecordingTransport {
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().expect("should lock recorder").clone()
        }
    }

    impl EventTransport for RecordingTransport {
        fn send(&self, request: http::Request<Vec<u8>>) -> Result<(), Report<InsticatorError>> {
            let content_type = request
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let recorded = RecordedRequest {
                method: request.method().to_string(),
                uri: request.uri().to_string(),
                content_type,
                body: serde_json::from_slice(request.body()).unwrap_or(Json::Null),
            };
            self.requests
                .lock()
                .expect("should lock recorder")
                .push(recorded);
            Ok(())
        }
    }

    /// Transport that rejects everything.
    pub struct FailingTransport;

    impl EventTransport for FailingTransport {
        fn send(&self, _request: http::Request<Vec<u8>>) -> Result<(), Report<InsticatorError>> {
            Err(Report::new(InsticatorError::Transport {
                message: "connection refused".to_string(),
            }))
        }
    }
}
