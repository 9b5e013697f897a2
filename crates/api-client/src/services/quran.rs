//! Quran endpoints

use super::ISLAM_PREFIX;
use crate::client::ApiClient;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::models::{Bookmark, Surah, SurahDetail, Verse};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookmarkRequest<'a> {
    surah_id: u32,
    verse_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

/// Quran endpoints, obtained from [`ApiClient::quran`]
pub struct QuranApi<'a> {
    client: &'a ApiClient,
}

impl<'a> QuranApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// All surahs
    pub async fn surahs(&self) -> Result<Vec<Surah>> {
        self.client.get(&format!("{}/quran/surahs", ISLAM_PREFIX)).await
    }

    /// One surah with its verses
    pub async fn surah(&self, id: u32) -> Result<SurahDetail> {
        self.client.get(&format!("{}/quran/surah/{}", ISLAM_PREFIX, id)).await
    }

    /// Full-text verse search
    pub async fn search(&self, query: &str) -> Result<Vec<Verse>> {
        let request = ApiRequest::get(format!("{}/quran/search", ISLAM_PREFIX)).param("q", query);
        Ok(self.client.send(request).await?.data)
    }

    /// Bookmark a verse
    pub async fn add_bookmark(
        &self,
        surah_id: u32,
        verse_number: u32,
        note: Option<&str>,
    ) -> Result<Bookmark> {
        self.client
            .post(
                &format!("{}/quran/bookmarks", ISLAM_PREFIX),
                &BookmarkRequest { surah_id, verse_number, note },
            )
            .await
    }

    /// The user's bookmarks
    pub async fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.client.get(&format!("{}/quran/bookmarks", ISLAM_PREFIX)).await
    }
}
