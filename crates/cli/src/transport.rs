//! Event transports used when replaying analytics offline.

use std::sync::atomic::{AtomicUsize, Ordering};

use error_stack::Report;
use http::header;
use insticator_common::error::InsticatorError;
use insticator_common::host::EventTransport;

/// Sends events over HTTP with `ureq`.
#[derive(Default)]
pub struct UreqTransport {
    sent: AtomicUsize,
}

impl UreqTransport {
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

impl EventTransport for UreqTransport {
    fn send(&self, request: http::Request<Vec<u8>>) -> Result<(), Report<InsticatorError>> {
        let uri = request.uri().to_string();
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        let response = ureq::post(&uri)
            .header("Content-Type", &content_type)
            .send(request.body().as_slice())
            .map_err(|e| {
                Report::new(InsticatorError::Transport {
                    message: format!("Failed to send event to {}: {}", uri, e),
                })
            })?;

        log::debug!("Event sent to {}: HTTP {}", uri, response.status());
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Prints events instead of sending them.
#[derive(Default)]
pub struct DryRunTransport {
    sent: AtomicUsize,
}

impl DryRunTransport {
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    pub(crate) fn describe(request: &http::Request<Vec<u8>>) -> String {
        let body = String::from_utf8_lossy(request.body());
        format!("{} {}\n{}", request.method(), request.uri(), body)
    }
}

impl EventTransport for DryRunTransport {
    fn send(&self, request: http::Request<Vec<u8>>) -> Result<(), Report<InsticatorError>> {
        println!("[Dry Run] {}", Self::describe(&request));
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
