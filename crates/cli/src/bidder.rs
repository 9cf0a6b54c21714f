//! Bid adapter commands: build requests, interpret responses, collect syncs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use insticator_common::bidding::{
    build_bid_adapters, request_bids, BidderRequest, NormalizedBid, ServerRequest,
    ServerResponse, SyncOptions, UserSync, WonBid,
};
use insticator_common::constants::BIDDER_CODE;
use insticator_common::environment::MemoryEnvironment;
use insticator_common::host::HostEnvironment;
use insticator_common::settings::Settings;
use serde_json::Value as Json;

use crate::error::CliError;
use crate::fixtures::{load_environment, read_json, save_environment};

/// Validate the auction's slots and build the outbound bid requests.
pub(crate) fn build_requests(
    settings: &Settings,
    env: Arc<MemoryEnvironment>,
    bidder_request: &BidderRequest,
) -> Result<Vec<ServerRequest>, CliError> {
    let env: Arc<dyn HostEnvironment> = env;
    let registry = build_bid_adapters(settings, &env);
    let adapter = registry.require(BIDDER_CODE)?;
    Ok(request_bids(adapter.as_ref(), bidder_request))
}

pub(crate) fn interpret(
    settings: &Settings,
    request: &ServerRequest,
    response: &ServerResponse,
) -> Result<Vec<NormalizedBid>, CliError> {
    let env: Arc<dyn HostEnvironment> = Arc::new(MemoryEnvironment::default());
    let registry = build_bid_adapters(settings, &env);
    let adapter = registry.require(BIDDER_CODE)?;
    Ok(adapter.interpret_response(response, request))
}

pub(crate) fn user_syncs(
    settings: &Settings,
    options: &SyncOptions,
    responses: &[ServerResponse],
) -> Result<Vec<UserSync>, CliError> {
    let env: Arc<dyn HostEnvironment> = Arc::new(MemoryEnvironment::default());
    let registry = build_bid_adapters(settings, &env);
    let adapter = registry.require(BIDDER_CODE)?;
    Ok(adapter.get_user_syncs(options, responses))
}

pub(crate) fn bid_won(settings: &Settings, mut won: WonBid) -> Result<WonBid, CliError> {
    let env: Arc<dyn HostEnvironment> = Arc::new(MemoryEnvironment::default());
    let registry = build_bid_adapters(settings, &env);
    let adapter = registry.require(BIDDER_CODE)?;
    adapter.on_bid_won(&mut won);
    Ok(won)
}

/// Accept either one request or the array printed by `request`.
fn select_request(value: Json, index: usize) -> Result<ServerRequest, CliError> {
    let value = match value {
        Json::Array(mut requests) => {
            if index >= requests.len() {
                return Err(CliError::Fixture(format!(
                    "Request index {} out of range ({} requests)",
                    index,
                    requests.len()
                )));
            }
            requests.swap_remove(index)
        }
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

/// Accept a bare response body or `{ "body": ... }`.
fn to_server_response(value: Json) -> ServerResponse {
    if let Json::Object(fields) = &value {
        if let (1, Some(body)) = (fields.len(), fields.get("body")) {
            return ServerResponse {
                body: Some(body.clone()),
            };
        }
    }
    ServerResponse { body: Some(value) }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run_request(
    settings: &Settings,
    auction: &Path,
    environment: Option<PathBuf>,
) -> Result<(), CliError> {
    let bidder_request: BidderRequest = read_json(auction)?;
    let env = Arc::new(load_environment(environment.as_deref())?);

    let requests = build_requests(settings, Arc::clone(&env), &bidder_request)?;
    if requests.is_empty() {
        log::warn!("No valid ad slots in {}", auction.display());
    }

    if let Some(path) = environment {
        save_environment(&path, &env)?;
    }

    print_json(&requests)
}

pub fn run_interpret(
    settings: &Settings,
    request: &Path,
    response: &Path,
    index: usize,
) -> Result<(), CliError> {
    let request = select_request(read_json(request)?, index)?;
    let response = to_server_response(read_json(response)?);

    print_json(&interpret(settings, &request, &response)?)
}

pub fn run_syncs(
    settings: &Settings,
    responses: &[PathBuf],
    options: SyncOptions,
) -> Result<(), CliError> {
    let responses = responses
        .iter()
        .map(|path| read_json(path).map(to_server_response))
        .collect::<Result<Vec<_>, _>>()?;

    print_json(&user_syncs(settings, &options, &responses)?)
}

pub fn run_won(settings: &Settings, bid: &Path) -> Result<(), CliError> {
    let won: WonBid = read_json(bid)?;
    print_json(&bid_won(settings, won)?)
}
