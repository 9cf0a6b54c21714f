//! Capabilities the host auction runtime provides to the adapters.
//!
//! The adapters never touch a page, a cookie store or the network directly.
//! Hosts implement these traits and hand them to the adapters at registration.

use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::error::InsticatorError;

/// Location of the page running the auction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub hostname: String,
    pub href: String,
}

/// Visible viewport in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Browser-like environment exposed by the host.
///
/// Cookie methods follow `document.cookie` semantics: [`cookie_header`]
/// returns every visible `name=value` pair and [`set_cookie`] accepts a single
/// cookie assignment including attributes.
///
/// [`cookie_header`]: HostEnvironment::cookie_header
/// [`set_cookie`]: HostEnvironment::set_cookie
pub trait HostEnvironment: Send + Sync {
    fn page(&self) -> PageInfo;

    fn viewport(&self) -> Viewport;

    fn user_agent(&self) -> Option<String>;

    /// Whether the host runs in debug mode.
    fn debug_enabled(&self) -> bool {
        false
    }

    fn local_storage_enabled(&self) -> bool;

    fn local_storage_get(&self, key: &str) -> Option<String>;

    fn local_storage_set(&self, key: &str, value: &str);

    fn cookies_enabled(&self) -> bool;

    fn cookie_header(&self) -> Option<String>;

    fn set_cookie(&self, cookie: &str);
}

/// Outbound channel for fire-and-forget requests such as analytics beacons.
pub trait EventTransport: Send + Sync {
    /// Hand a request to the host for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`InsticatorError::Transport`] if the host could not accept
    /// the request.
    fn send(&self, request: http::Request<Vec<u8>>) -> Result<(), Report<InsticatorError>>;
}
