// Wire models for the camera cloud.
//
// Only the fields the bridge consumes are declared; serde ignores the
// rest, so schema additions on the service side are harmless.

use serde::Deserialize;

/// One camera accessory as reported by `/api/accessories`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryRecord {
    /// Stable identifier, unique within the account.
    pub accessory_id: String,
    /// User-assigned display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Host serving this accessory's live still image.
    #[serde(default)]
    pub node_id: Option<String>,
}
