// Camera cloud HTTP client
//
// Wraps `reqwest::Client` with endpoint URL construction, explicit session
// cookie injection, and status/timeout mapping. Endpoint groups (auth,
// accessories, image) are implemented as inherent methods in separate
// files to keep this module focused on transport mechanics.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Name of the cookie carrying the authenticated session.
pub const SESSION_COOKIE: &str = "prod_session";

/// Production API root.
pub const DEFAULT_API_URL: &str = "https://video.logi.com";

/// Raw HTTP client for the Logi Circle cloud.
///
/// Stateless with respect to authentication: every authenticated call takes
/// the session token explicitly, so the caller decides which session a
/// request runs under. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CircleClient {
    http: reqwest::Client,
    api_url: Url,
    timeout: Duration,
}

impl CircleClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `api_url` is the service root (e.g. `https://video.logi.com`).
    /// Node image hosts are contacted with the same scheme as the root.
    pub fn new(api_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            api_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, api_url: Url) -> Self {
        Self {
            http,
            api_url,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The service root URL.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Scheme used for node-hosted image URLs.
    pub(crate) fn node_scheme(&self) -> &str {
        self.api_url.scheme()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL under the API root from path segments, e.g.
    /// `["api", "accessories", id]`. Each segment is percent-encoded, so an
    /// id can never change the request target.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Attach the session cookie to a request.
    pub(crate) fn with_session(
        builder: reqwest::RequestBuilder,
        token: &SecretString,
    ) -> reqwest::RequestBuilder {
        builder.header(
            reqwest::header::COOKIE,
            format!("{SESSION_COOKIE}={}", token.expose_secret()),
        )
    }

    /// Send a request, mapping timeouts and rejected sessions.
    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        let resp = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = resp.status();
        trace!(%status, url = %resp.url(), "response received");

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::SessionExpired {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(resp)
    }

    /// Send an authenticated GET and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &SecretString,
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let builder = Self::with_session(
            self.http
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json"),
            token,
        );
        let resp = self.send(builder).await?;
        let body = resp.text().await.map_err(|e| self.map_transport(e))?;

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    pub(crate) fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(root: &str) -> CircleClient {
        CircleClient::with_client(reqwest::Client::new(), Url::parse(root).unwrap())
    }

    #[test]
    fn endpoint_keeps_root_prefix() {
        let url = client("http://127.0.0.1:9000/cloud/")
            .endpoint(&["api", "accessories"])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/cloud/api/accessories");
    }

    #[test]
    fn endpoint_escapes_each_segment() {
        let url = client("https://video.logi.com")
            .endpoint(&["api", "accessories", "../accounts?x=1#y"])
            .unwrap();
        assert_eq!(url.path(), "/api/accessories/..%2Faccounts%3Fx=1%23y");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }
}
