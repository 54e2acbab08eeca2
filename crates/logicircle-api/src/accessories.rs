// Accessory endpoints
//
// Account-wide listing and per-accessory info. The info call is what
// yields the current node id for the image host.

use secrecy::SecretString;

use crate::client::CircleClient;
use crate::error::Error;
use crate::models::AccessoryRecord;

impl CircleClient {
    /// List every accessory registered on the account, in service order.
    ///
    /// `GET /api/accessories`
    pub async fn list_accessories(&self, token: &SecretString) -> Result<Vec<AccessoryRecord>, Error> {
        let url = self.endpoint(&["api", "accessories"])?;
        self.get_json(url, token).await
    }

    /// Fetch the current record of a single accessory.
    ///
    /// `GET /api/accessories/{accessory_id}`
    pub async fn get_accessory(
        &self,
        token: &SecretString,
        accessory_id: &str,
    ) -> Result<AccessoryRecord, Error> {
        let url = self.endpoint(&["api", "accessories", accessory_id])?;
        self.get_json(url, token).await
    }
}
