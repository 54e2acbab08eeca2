//! `snapshot` command handler.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use logicircle_core::{BridgeConfig, CoreError, SnapshotFetcher, find_accessory};

use crate::cli::{GlobalOpts, SnapshotArgs};
use crate::error::CliError;

pub async fn handle(
    config: &BridgeConfig,
    args: SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Refuse before any network call rather than dump JPEG into a terminal.
    if args.output.is_none() && io::stdout().is_terminal() {
        return Err(CliError::Validation {
            field: "output".into(),
            reason: "refusing to write image data to a terminal; use --output FILE".into(),
        });
    }

    let conn = super::connect(config).await?;
    let accessory = find_accessory(&conn.accessories, &args.accessory).ok_or_else(|| {
        CoreError::AccessoryNotFound {
            identifier: args.accessory.clone(),
        }
    })?;

    let snapshot = SnapshotFetcher::new(Arc::clone(&conn.cloud))
        .fetch(&conn.session, &accessory.id)
        .await?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &snapshot.bytes)?;
            if !global.quiet {
                eprintln!(
                    "{}: {} bytes ({}) -> {}",
                    accessory.name,
                    snapshot.len(),
                    snapshot.content_type,
                    path.display()
                );
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&snapshot.bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
