//! Daily content endpoints

use crate::client::ApiClient;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::models::{DailyContent, FaithType};

/// Default number of entries returned by [`ContentApi::historical`]
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

const CONTENT_PREFIX: &str = "/api/content";

/// Daily content endpoints, obtained from [`ApiClient::content`]
pub struct ContentApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ContentApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn request(endpoint: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/{}", CONTENT_PREFIX, endpoint))
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        Ok(self.client.send(request).await?.data)
    }

    /// Content for `faith` on `date` (`YYYY-MM-DD`), or today when omitted
    pub async fn daily(&self, faith: FaithType, date: Option<&str>) -> Result<DailyContent> {
        self.fetch(Self::request("daily").param("faith", faith).opt_param("date", date))
            .await
    }

    /// A single content entry
    pub async fn by_id(&self, id: &str) -> Result<DailyContent> {
        self.fetch(Self::request(id)).await
    }

    /// Past entries for `faith`.
    ///
    /// `limit` defaults to [`DEFAULT_HISTORY_LIMIT`].
    pub async fn historical(
        &self,
        faith: FaithType,
        limit: Option<u32>,
    ) -> Result<Vec<DailyContent>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        self.fetch(Self::request("historical").param("faith", faith).param("limit", limit))
            .await
    }
}
