//! Sentinel Sync - headless console
//!
//! Usage: `sentinel-sync [FOLDER [WHITELIST_PATH...]]`
//!
//! Without arguments it only watches the service. With a folder it starts
//! monitoring it (after whitelisting the remaining paths) and stops it
//! again on Ctrl-C.

use sentinel_sync::constants;
use sentinel_sync::{SentinelConfig, SentinelSession, StatusSummary};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = SentinelConfig::from_env();
    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);
    log::info!("   Server: {}", config.api_url);
    log::info!("   Poll interval: {}ms", config.poll_interval_ms);

    let session = SentinelSession::connect(config)?;
    let state = session.state();

    let mut args = std::env::args().skip(1);
    let target = args.next();

    for path in args {
        if let Err(e) = session.commands().add_to_whitelist(&path) {
            log::warn!("Skipping whitelist path {}: {}", path, e);
        }
    }

    let mut started_here = false;
    if let Some(folder) = target {
        match session.commands().start_monitoring(&folder).await {
            Ok(confirmed) => {
                log::info!("Watching {}", confirmed);
                started_here = true;
            }
            Err(e) => log::error!("Could not start monitoring: {}", e),
        }
    }

    let mut changes = state.subscribe();
    let mut last = state.view();
    report(None, &last.summary());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down due to ctrl-c...");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() || state.is_closed() {
                    break;
                }
                let view = state.view();
                report(Some(&last.summary()), &view.summary());
                if view.last_error != last.last_error {
                    if let Some(message) = &view.last_error {
                        log::warn!("{}", message);
                    }
                }
                last = view;
            }
        }
    }

    if started_here && state.is_monitoring() {
        if let Err(e) = session.commands().stop_monitoring().await {
            log::error!("Stop failed: {}", e);
        }
    }

    session.shutdown().await;
    Ok(())
}

/// Log what changed between two summaries
fn report(previous: Option<&StatusSummary>, current: &StatusSummary) {
    let Some(previous) = previous else {
        log::info!("Status: {} ({:?})", current.status_text(), current.connection);
        return;
    };

    if previous.connection != current.connection {
        log::info!("Connection: {:?}", current.connection);
    }
    if previous.phase != current.phase {
        log::info!("Status: {}", current.status_text());
    }
    if previous.threat_score != current.threat_score {
        log::info!("Threat score: {}", current.threat_score);
    }
    if current.quarantined_count > previous.quarantined_count {
        log::warn!("Quarantined files: {}", current.quarantined_count);
    }
    if current.alert_count > previous.alert_count {
        log::warn!("Critical alerts: {}", current.alert_count);
    }
}
