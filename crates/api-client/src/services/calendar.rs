//! Islamic calendar endpoints

use super::ISLAM_PREFIX;
use crate::client::ApiClient;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::models::{CalendarDate, IslamicEvent};
use serde_json::Value;

/// Default look-ahead window for upcoming events, in days
pub const DEFAULT_UPCOMING_DAYS: u32 = 90;

/// Calendar endpoints, obtained from [`ApiClient::calendar`]
pub struct CalendarApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CalendarApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn request(endpoint: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/calendar/{}", ISLAM_PREFIX, endpoint))
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        Ok(self.client.send(request).await?.data)
    }

    /// Today's date in both calendars
    pub async fn today(&self, timezone: Option<&str>) -> Result<CalendarDate> {
        self.fetch(Self::request("today").opt_param("timezone", timezone)).await
    }

    /// Convert a Gregorian date (`YYYY-MM-DD`) to Hijri
    pub async fn to_hijri(&self, date: &str, timezone: Option<&str>) -> Result<CalendarDate> {
        let request = Self::request("convert/to-hijri")
            .param("date", date)
            .opt_param("timezone", timezone);
        self.fetch(request).await
    }

    /// Convert a Hijri date to Gregorian
    pub async fn to_gregorian(
        &self,
        year: i32,
        month: u32,
        day: u32,
        timezone: Option<&str>,
    ) -> Result<CalendarDate> {
        let request = Self::request("convert/to-gregorian")
            .param("year", year)
            .param("month", month)
            .param("day", day)
            .opt_param("timezone", timezone);
        self.fetch(request).await
    }

    /// Calendar grid for a Gregorian month
    pub async fn gregorian_month(
        &self,
        year: i32,
        month: u32,
        timezone: Option<&str>,
    ) -> Result<Value> {
        let request = Self::request("gregorian-month")
            .param("year", year)
            .param("month", month)
            .opt_param("timezone", timezone);
        self.fetch(request).await
    }

    /// Calendar grid for a Hijri month
    pub async fn hijri_month(&self, year: i32, month: u32, timezone: Option<&str>) -> Result<Value> {
        let request = Self::request("hijri-month")
            .param("year", year)
            .param("month", month)
            .opt_param("timezone", timezone);
        self.fetch(request).await
    }

    /// All known Islamic events
    pub async fn events(&self) -> Result<Vec<IslamicEvent>> {
        self.fetch(Self::request("events")).await
    }

    /// Events in the next `days` days ([`DEFAULT_UPCOMING_DAYS`] when `None`)
    pub async fn upcoming_events(
        &self,
        days: Option<u32>,
        timezone: Option<&str>,
    ) -> Result<Value> {
        let request = Self::request("events/upcoming")
            .param("days", days.unwrap_or(DEFAULT_UPCOMING_DAYS))
            .opt_param("timezone", timezone);
        self.fetch(request).await
    }

    /// Hijri month names
    pub async fn months(&self) -> Result<Value> {
        self.fetch(Self::request("months")).await
    }
}
