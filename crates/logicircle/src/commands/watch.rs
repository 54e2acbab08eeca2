//! `watch` command handler: run the bridge until Ctrl-C.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use logicircle_core::{Availability, Bridge, BridgeConfig, EntityState};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    bridge_config: BridgeConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bridge_config =
        config::with_watch_overrides(bridge_config, args.interval, args.failure_threshold)?;
    let color = output::should_color(&global.color);
    let interval = bridge_config.refresh_interval.as_secs();

    let bridge = Bridge::new(bridge_config);
    bridge.start().await?;

    let entities = bridge.entities();
    if !global.quiet {
        eprintln!(
            "watching {} camera(s) every {interval}s, Ctrl-C to stop",
            entities.len()
        );
    }

    let reporters: Vec<JoinHandle<()>> = entities
        .values()
        .map(|e| {
            tokio::spawn(report_changes(
                e.name().to_owned(),
                e.subscribe(),
                color,
                global.quiet,
            ))
        })
        .collect();

    let signal = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
    bridge.shutdown().await;
    for reporter in reporters {
        reporter.abort();
    }
    signal?;
    Ok(())
}

type ChangeKey = (Availability, Option<DateTime<Utc>>, u32);

/// Print one line per observable change of an entity.
async fn report_changes(
    name: String,
    mut rx: watch::Receiver<EntityState>,
    color: bool,
    quiet: bool,
) {
    let mut last: Option<ChangeKey> = None;
    while rx.changed().await.is_ok() {
        let line = {
            let state = rx.borrow_and_update();
            let key = (
                state.availability,
                state.snapshot.as_ref().map(|s| s.captured_at),
                state.consecutive_failures,
            );
            if last == Some(key) {
                continue;
            }
            last = Some(key);
            format_line(&name, &state, color)
        };
        if !quiet {
            println!("{line}");
        }
    }
}

fn format_line(name: &str, state: &EntityState, color: bool) -> String {
    let now = Utc::now().format("%H:%M:%S").to_string();
    let label = output::availability_label(state.availability == Availability::Available, color);

    let detail = match (&state.snapshot, &state.last_error) {
        (_, Some(err)) => format!("{} failure(s): {err}", state.consecutive_failures),
        (Some(snapshot), None) => format!("{} bytes", snapshot.len()),
        (None, None) => String::new(),
    };
    let stale = if state.is_stale() { " (stale image)" } else { "" };

    format!(
        "{}  {name}  {label}  {}{stale}",
        output::muted(&now, color),
        output::muted(&detail, color)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use logicircle_core::Snapshot;

    use super::*;

    #[test]
    fn line_shows_size_or_failure() {
        let mut state = EntityState {
            availability: Availability::Available,
            snapshot: Some(Arc::new(Snapshot {
                bytes: vec![0xFF, 0xD8, 0xFF, 0xD9].into(),
                content_type: "image/jpeg".into(),
                captured_at: Utc::now(),
            })),
            ..EntityState::default()
        };
        let line = format_line("Front Door", &state, false);
        assert!(line.contains("Front Door  available  4 bytes"), "{line}");

        state.availability = Availability::Unavailable;
        state.consecutive_failures = 3;
        state.last_error = Some("HTTP 503".into());
        let line = format_line("Front Door", &state, false);
        assert!(line.contains("unavailable  3 failure(s): HTTP 503 (stale image)"), "{line}");
    }
}
