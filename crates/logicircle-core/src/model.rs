// ── Domain model ──
//
// Accessories as discovered, snapshots as cached, and the per-entity
// state the host observes.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use logicircle_api::AccessoryRecord;

/// A single physical camera registered under the account.
///
/// Immutable once discovered; entities hold it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accessory {
    /// Stable identifier, unique within the account.
    pub id: String,
    pub name: String,
    /// Image node reported at discovery time. Informational only:
    /// fetches always re-resolve it.
    pub node_id: Option<String>,
}

impl Accessory {
    /// Convert a wire record, falling back to `default_name` when the
    /// accessory has no name of its own.
    pub fn from_record(record: AccessoryRecord, default_name: &str) -> Self {
        let name = record
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{default_name} {}", record.accessory_id));
        Self {
            id: record.accessory_id,
            name,
            node_id: record.node_id,
        }
    }

    /// Match by exact id or case-insensitive name.
    pub fn matches(&self, identifier: &str) -> bool {
        self.id == identifier || self.name.eq_ignore_ascii_case(identifier)
    }
}

/// Find an accessory by id or name.
pub fn find_accessory<'a>(accessories: &'a [Accessory], identifier: &str) -> Option<&'a Accessory> {
    accessories
        .iter()
        .find(|a| a.id == identifier)
        .or_else(|| accessories.iter().find(|a| a.matches(identifier)))
}

/// The most recently fetched still image for one accessory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Image bytes exactly as served (typically JPEG).
    pub bytes: Bytes,
    pub content_type: String,
    /// When the image request was issued.
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Entity availability as exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// No successful fetch yet, or the failure threshold was crossed.
    #[default]
    Unavailable,
    /// Serving a snapshot from a recent successful fetch.
    Available,
}

/// Observable state of one camera entity.
#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub availability: Availability,
    pub snapshot: Option<std::sync::Arc<Snapshot>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl EntityState {
    /// Unavailable but still holding an older image.
    pub fn is_stale(&self) -> bool {
        self.availability == Availability::Unavailable && self.snapshot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_accessory_gets_default_name() {
        let record = AccessoryRecord {
            accessory_id: "abc".into(),
            name: Some("   ".into()),
            node_id: None,
        };
        let accessory = Accessory::from_record(record, "Logi Cam");
        assert_eq!(accessory.name, "Logi Cam abc");
    }

    #[test]
    fn find_prefers_id_over_name() {
        let cams = vec![
            Accessory {
                id: "backyard".into(),
                name: "Front Door".into(),
                node_id: None,
            },
            Accessory {
                id: "front door".into(),
                name: "Garage".into(),
                node_id: None,
            },
        ];
        assert_eq!(find_accessory(&cams, "front door").map(|a| a.name.as_str()), Some("Garage"));
        assert_eq!(find_accessory(&cams, "FRONT DOOR").map(|a| a.id.as_str()), Some("backyard"));
        assert!(find_accessory(&cams, "attic").is_none());
    }

    #[test]
    fn availability_renders_lowercase() {
        assert_eq!(Availability::Available.to_string(), "available");
        assert_eq!(
            "unavailable".parse::<Availability>().ok(),
            Some(Availability::Unavailable)
        );
    }

    #[test]
    fn stale_only_when_unavailable_with_image() {
        let mut state = EntityState::default();
        assert!(!state.is_stale());

        state.snapshot = Some(std::sync::Arc::new(Snapshot {
            bytes: Bytes::from_static(b"\xFF\xD8"),
            content_type: "image/jpeg".into(),
            captured_at: Utc::now(),
        }));
        assert!(state.is_stale());

        state.availability = Availability::Available;
        assert!(!state.is_stale());
    }
}
