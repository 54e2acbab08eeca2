// Still image endpoint
//
// Images are served by the accessory's node host, not the API root. The
// URL carries an `anticache` millisecond stamp, so it is only good for the
// request it was built for.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tracing::debug;
use url::Url;

use crate::client::CircleClient;
use crate::error::Error;

/// Raw image response, exactly as served.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Bytes,
    /// `Content-Type` header value, if the node sent one.
    pub content_type: Option<String>,
}

impl CircleClient {
    /// Build the still image URL for an accessory on its node host.
    ///
    /// `{scheme}://{node_id}/api/accessories/{accessory_id}/image?anticache={ms}`
    pub fn still_image_url(
        &self,
        node_id: &str,
        accessory_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Url, Error> {
        let scheme = self.node_scheme();
        let mut url = Url::parse(&format!("{scheme}://{node_id}/"))?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["api", "accessories", accessory_id, "image"]);
        url.query_pairs_mut()
            .append_pair("anticache", &at.timestamp_millis().to_string());
        Ok(url)
    }

    /// Download an image with the session cookie attached.
    pub async fn fetch_image(&self, url: Url, token: &SecretString) -> Result<ImagePayload, Error> {
        debug!("GET {}", url);

        let builder = Self::with_session(
            self.http()
                .get(url)
                .header(reqwest::header::CACHE_CONTROL, "no-cache"),
            token,
        );
        let resp = self.send(builder).await?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = resp.bytes().await.map_err(|e| self.map_transport(e))?;

        Ok(ImagePayload {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn still_image_url_follows_api_scheme() {
        let client = CircleClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9000").unwrap(),
        );
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let url = client.still_image_url("node-7.logi.com", "abc123", at).unwrap();

        assert_eq!(
            url.as_str(),
            "http://node-7.logi.com/api/accessories/abc123/image?anticache=1700000000123"
        );
    }

    #[test]
    fn still_image_url_escapes_accessory_id() {
        let client = CircleClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://video.logi.com").unwrap(),
        );
        let at = Utc.timestamp_millis_opt(1).unwrap();
        let url = client.still_image_url("node-7.logi.com", "a/b?c#d", at).unwrap();

        assert_eq!(url.host_str(), Some("node-7.logi.com"));
        assert_eq!(url.path(), "/api/accessories/a%2Fb%3Fc%23d/image");
        assert_eq!(url.query(), Some("anticache=1"));
        assert_eq!(url.fragment(), None);
    }
}
