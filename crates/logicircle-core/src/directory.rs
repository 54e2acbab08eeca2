// ── Accessory directory ──
//
// Enumerates the cameras on the account. The service order is kept so
// entity registration is stable across restarts.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::BackoffPolicy;
use crate::error::DirectoryError;
use crate::model::Accessory;
use crate::session::{CloudSession, Session};

pub struct AccessoryDirectory {
    cloud: Arc<CloudSession>,
    default_name: String,
}

impl AccessoryDirectory {
    pub fn new(cloud: Arc<CloudSession>, default_name: impl Into<String>) -> Self {
        Self {
            cloud,
            default_name: default_name.into(),
        }
    }

    /// List the account's accessories in service order.
    ///
    /// A rejected session is re-authenticated once and the listing retried
    /// once; a second rejection or a failed login is reported as
    /// [`DirectoryError::Auth`].
    pub async fn list_accessories(&self, session: &Session) -> Result<Vec<Accessory>, DirectoryError> {
        let client = self.cloud.client();

        let records = match client.list_accessories(session.token()).await {
            Err(e) if e.is_auth_expired() => {
                debug!(error = %e, "accessory listing rejected, re-authenticating");
                self.cloud.invalidate(session);
                let fresh = self.cloud.ensure_valid(session).await?;
                match client.list_accessories(fresh.token()).await {
                    Err(e) if e.is_auth_expired() => {
                        self.cloud.invalidate(&fresh);
                        return Err(e.into());
                    }
                    other => other?,
                }
            }
            other => other?,
        };

        let accessories: Vec<Accessory> = records
            .into_iter()
            .map(|r| Accessory::from_record(r, &self.default_name))
            .collect();
        debug!(count = accessories.len(), "listed accessories");
        Ok(accessories)
    }

    /// List accessories, retrying transient failures with exponential
    /// backoff. Authentication failures are returned immediately.
    pub async fn list_accessories_with_backoff(
        &self,
        policy: BackoffPolicy,
    ) -> Result<Vec<Accessory>, DirectoryError> {
        let mut attempt = 1;
        loop {
            let session = self.cloud.current().await?;
            match self.list_accessories(&session).await {
                Ok(accessories) => {
                    if attempt > 1 {
                        info!(attempt, "accessory discovery recovered");
                    }
                    return Ok(accessories);
                }
                Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "accessory discovery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
