//! `cameras` command handler.

use tabled::Tabled;

use logicircle_core::{Accessory, BridgeConfig, UNIQUE_ID_PREFIX};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CameraRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Entity")]
    entity: String,
}

impl From<&Accessory> for CameraRow {
    fn from(a: &Accessory) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            node: a.node_id.clone().unwrap_or_else(|| "-".into()),
            entity: format!("{UNIQUE_ID_PREFIX}{}", a.id),
        }
    }
}

pub async fn handle(config: &BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let conn = super::connect(config).await?;

    let out = output::render_list(
        &global.format,
        &conn.accessories,
        |a: &Accessory| CameraRow::from(a),
        |a| a.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
