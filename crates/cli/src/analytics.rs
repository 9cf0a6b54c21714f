//! Analytics replay command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use insticator_common::analytics::{build_analytics_adapters, AuctionEvent};
use insticator_common::host::EventTransport;
use insticator_common::settings::Settings;

use crate::error::CliError;
use crate::fixtures::{load_environment, read_json};
use crate::transport::{DryRunTransport, UreqTransport};

/// Enable analytics with `events` as the host's event history.
///
/// Returns the number of adapters that were enabled.
pub(crate) fn replay_events(
    settings: &Settings,
    environment: Option<&Path>,
    events: &[AuctionEvent],
    transport: &Arc<dyn EventTransport>,
) -> Result<usize, CliError> {
    if !settings.analytics.enabled {
        return Err(CliError::Config(
            "analytics are disabled in settings ([analytics] enabled = false)".to_string(),
        ));
    }

    let env = load_environment(environment)?;
    let adapters = build_analytics_adapters(settings, &env, transport, events);
    Ok(adapters.len())
}

pub fn replay(
    settings: &Settings,
    events: &Path,
    environment: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), CliError> {
    let events: Vec<AuctionEvent> = read_json(events)?;
    log::info!("Replaying {} events", events.len());

    let sent = if dry_run {
        let transport = Arc::new(DryRunTransport::default());
        let shared: Arc<dyn EventTransport> = transport.clone();
        replay_events(settings, environment.as_deref(), &events, &shared)?;
        transport.sent()
    } else {
        let transport = Arc::new(UreqTransport::default());
        let shared: Arc<dyn EventTransport> = transport.clone();
        replay_events(settings, environment.as_deref(), &events, &shared)?;
        transport.sent()
    };

    println!("Sent {} of {} events", sent, events.len());
    Ok(())
}
