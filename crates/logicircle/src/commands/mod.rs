//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod cameras;
pub mod config_cmd;
pub mod snapshot;
pub mod watch;

use std::sync::Arc;

use logicircle_core::{
    Accessory, AccessoryDirectory, BridgeConfig, CloudSession, Session, cloud_session,
};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: BridgeConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Cameras => cameras::handle(&config, global).await,
        Command::Snapshot(args) => snapshot::handle(&config, args, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// One-shot connection for commands that don't run the bridge.
pub(crate) struct Connection {
    pub cloud: Arc<CloudSession>,
    pub session: Session,
    pub accessories: Vec<Accessory>,
}

/// Authenticate and list the account's accessories.
pub(crate) async fn connect(config: &BridgeConfig) -> Result<Connection, CliError> {
    config.validate()?;
    let cloud = Arc::new(cloud_session(config)?);
    let session = cloud.authenticate().await?;
    let accessories = AccessoryDirectory::new(Arc::clone(&cloud), config.name.as_str())
        .list_accessories_with_backoff(config.discovery_backoff)
        .await?;
    Ok(Connection {
        cloud,
        session,
        accessories,
    })
}
