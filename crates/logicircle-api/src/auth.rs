// Account authentication
//
// Email/password login against the authorization endpoint. The service
// answers with a `prod_session` cookie; that cookie is the session token
// for every later call.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::{CircleClient, SESSION_COOKIE};
use crate::error::Error;

const AUTHORIZATION_PATH: [&str; 3] = ["api", "accounts", "authorization"];

/// Session cookie issued by a successful login.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    /// Opaque cookie value.
    pub token: SecretString,
    /// Expiry announced by the cookie (`Max-Age` wins over `Expires`).
    pub expires_at: Option<DateTime<Utc>>,
}

impl CircleClient {
    /// Authenticate with the account email and password.
    ///
    /// Any non-success status, or a success without a session cookie, is
    /// reported as [`Error::Authentication`]. Transport failures and
    /// timeouts keep their own variants.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SessionCookie, Error> {
        let url = self.endpoint(&AUTHORIZATION_PATH)?;
        debug!("logging in at {}", url);

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let now = Utc::now();
        let cookie = resp
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| SessionCookie {
                token: SecretString::from(c.value().to_owned()),
                expires_at: cookie_expiry(now, c.max_age(), c.expires()),
            })
            .ok_or_else(|| Error::Authentication {
                message: format!("login response carried no {SESSION_COOKIE} cookie"),
            })?;

        debug!(expires_at = ?cookie.expires_at, "login successful");
        Ok(cookie)
    }
}

fn cookie_expiry(
    now: DateTime<Utc>,
    max_age: Option<std::time::Duration>,
    expires: Option<SystemTime>,
) -> Option<DateTime<Utc>> {
    if let Some(age) = max_age {
        return chrono::Duration::from_std(age).ok().map(|age| now + age);
    }
    expires.map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn max_age_takes_precedence_over_expires() {
        let now = Utc::now();
        let expires = UNIX_EPOCH + Duration::from_secs(1_000);
        let at = cookie_expiry(now, Some(Duration::from_secs(60)), Some(expires));
        assert_eq!(at, Some(now + chrono::Duration::seconds(60)));
    }

    #[test]
    fn expires_used_without_max_age() {
        let expires = UNIX_EPOCH + Duration::from_secs(1_000);
        let at = cookie_expiry(Utc::now(), None, Some(expires));
        assert_eq!(at.map(|t| t.timestamp()), Some(1_000));
    }

    #[test]
    fn session_cookie_without_attributes_never_expires() {
        assert_eq!(cookie_expiry(Utc::now(), None, None), None);
    }
}
