// ── Snapshot fetcher ──
//
// Resolve the accessory's image node, build a fresh still image URL, and
// download it. The URL embeds a timestamp and is never reused. A rejected
// session gets exactly one re-authentication and one retry; every other
// failure is returned as-is, since cadence belongs to the entity.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::error::FetchError;
use crate::model::Snapshot;
use crate::session::{CloudSession, Session};

/// Outcome of one attempt, before any re-authentication.
enum Attempt {
    Done(Snapshot),
    Rejected { status: u16 },
}

pub struct SnapshotFetcher {
    cloud: Arc<CloudSession>,
}

impl SnapshotFetcher {
    pub fn new(cloud: Arc<CloudSession>) -> Self {
        Self { cloud }
    }

    /// Fetch the current snapshot of one accessory.
    ///
    /// An invalid session is refreshed before any request is made.
    pub async fn fetch(&self, session: &Session, accessory_id: &str) -> Result<Snapshot, FetchError> {
        let session = self.cloud.ensure_valid(session).await?;

        match self.attempt(&session, accessory_id).await? {
            Attempt::Done(snapshot) => Ok(snapshot),
            Attempt::Rejected { status } => {
                debug!(accessory_id, status, "snapshot rejected, re-authenticating once");
                self.cloud.invalidate(&session);
                let fresh = self.cloud.ensure_valid(&session).await?;
                match self.attempt(&fresh, accessory_id).await? {
                    Attempt::Done(snapshot) => Ok(snapshot),
                    Attempt::Rejected { status } => {
                        self.cloud.invalidate(&fresh);
                        Err(FetchError::Unauthorized { status })
                    }
                }
            }
        }
    }

    async fn attempt(&self, session: &Session, accessory_id: &str) -> Result<Attempt, FetchError> {
        let client = self.cloud.client();
        let token = session.token();

        // (a) resolve the node serving this accessory's image
        let record = match client.get_accessory(token, accessory_id).await {
            Ok(record) => record,
            Err(logicircle_api::Error::SessionExpired { status }) => {
                return Ok(Attempt::Rejected { status });
            }
            Err(e) => {
                return Err(FetchError::Resolve {
                    accessory_id: accessory_id.to_owned(),
                    message: e.to_string(),
                });
            }
        };
        let node_id = record
            .node_id
            .filter(|n| !n.is_empty())
            .ok_or_else(|| FetchError::NoNode {
                accessory_id: accessory_id.to_owned(),
            })?;

        // (b) download from a URL built for this request only
        let requested_at = Utc::now();
        let url = client
            .still_image_url(&node_id, accessory_id, requested_at)
            .map_err(|e| FetchError::Resolve {
                accessory_id: accessory_id.to_owned(),
                message: e.to_string(),
            })?;
        let payload = match client.fetch_image(url, token).await {
            Ok(payload) => payload,
            Err(logicircle_api::Error::SessionExpired { status }) => {
                return Ok(Attempt::Rejected { status });
            }
            Err(e) => {
                return Err(FetchError::Request {
                    accessory_id: accessory_id.to_owned(),
                    message: e.to_string(),
                });
            }
        };

        // (c) only a non-empty image body counts as a snapshot
        let content_type = match payload.content_type {
            Some(ct) if is_image_content_type(&ct) => ct,
            other => {
                return Err(FetchError::NotAnImage {
                    accessory_id: accessory_id.to_owned(),
                    content_type: other,
                });
            }
        };
        if payload.bytes.is_empty() {
            return Err(FetchError::EmptyImage {
                accessory_id: accessory_id.to_owned(),
            });
        }

        debug!(accessory_id, bytes = payload.bytes.len(), %content_type, "snapshot fetched");
        Ok(Attempt::Done(Snapshot {
            bytes: payload.bytes,
            content_type,
            captured_at: requested_at,
        }))
    }
}

fn is_image_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().to_ascii_lowercase().starts_with("image/"))
}

#[cfg(test)]
mod tests {
    use super::is_image_content_type;

    #[test]
    fn image_content_types() {
        assert!(is_image_content_type("image/jpeg"));
        assert!(is_image_content_type("Image/PNG; charset=binary"));
        assert!(!is_image_content_type("application/json"));
        assert!(!is_image_content_type("text/html; charset=utf-8"));
        assert!(!is_image_content_type(""));
    }
}
