//! Insticator header-bidding adapters.
//!
//! This crate provides the bid adapter and analytics adapter a host auction
//! runtime loads for the Insticator exchange, together with the host-facing
//! traits they are driven through.
//!
//! # Modules
//!
//! - [`analytics`]: Analytics adapter trait, lifecycle events and dispatch
//! - [`bidding`]: Bid adapter trait, host bid objects and the bidder registry
//! - [`constants`]: Bidder codes, endpoints and storage keys
//! - [`cookies`]: Cookie parsing and generation utilities
//! - [`environment`]: In-memory host environment for offline hosts and tests
//! - [`error`]: Error types and error handling utilities
//! - [`host`]: Capabilities the host runtime provides to adapters
//! - [`integrations`]: The Insticator bid and analytics adapters
//! - [`openrtb`]: OpenRTB request and response wire types
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Testing utilities and fixtures
//! - [`user_id`]: First-party user identifier handling

pub mod analytics;
pub mod bidding;
pub mod constants;
pub mod cookies;
pub mod environment;
pub mod error;
pub mod host;
pub mod integrations;
pub mod openrtb;
pub mod settings;
pub mod test_support;
pub mod user_id;
