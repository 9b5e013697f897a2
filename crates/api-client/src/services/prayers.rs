//! Prayer time and prayer log endpoints

use super::ISLAM_PREFIX;
use crate::client::ApiClient;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::models::{PrayerLog, PrayerStats, PrayerStatus, PrayerTimes};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogPrayerRequest<'a> {
    prayer_name: &'a str,
    date: &'a str,
    status: PrayerStatus,
}

/// Prayer endpoints, obtained from [`ApiClient::prayers`]
pub struct PrayerApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PrayerApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn path(endpoint: &str) -> String {
        format!("{}/prayers/{}", ISLAM_PREFIX, endpoint)
    }

    /// Prayer times at a location, for `date` (today when `None`)
    pub async fn times(
        &self,
        lat: f64,
        lng: f64,
        date: Option<&str>,
        method: Option<&str>,
    ) -> Result<PrayerTimes> {
        let request = ApiRequest::get(Self::path("times"))
            .param("lat", lat)
            .param("lng", lng)
            .opt_param("date", date)
            .opt_param("method", method);
        Ok(self.client.send(request).await?.data)
    }

    /// Current and next prayer at a location
    pub async fn current(&self, lat: f64, lng: f64) -> Result<Value> {
        let request = ApiRequest::get(Self::path("current")).param("lat", lat).param("lng", lng);
        Ok(self.client.send(request).await?.data)
    }

    /// Record a performed prayer
    pub async fn log(&self, prayer_name: &str, date: &str, status: PrayerStatus) -> Result<PrayerLog> {
        self.client
            .post(&Self::path("log"), &LogPrayerRequest { prayer_name, date, status })
            .await
    }

    /// Logged prayers, optionally bounded by dates
    pub async fn logs(&self, start_date: Option<&str>, end_date: Option<&str>) -> Result<Vec<PrayerLog>> {
        let request = ApiRequest::get(Self::path("logs"))
            .opt_param("startDate", start_date)
            .opt_param("endDate", end_date);
        Ok(self.client.send(request).await?.data)
    }

    /// Aggregated statistics
    pub async fn stats(&self) -> Result<PrayerStats> {
        self.client.get(&Self::path("stats")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_body() {
        let body = serde_json::to_value(LogPrayerRequest {
            prayer_name: "Fajr",
            date: "2024-03-11",
            status: PrayerStatus::OnTime,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"prayerName": "Fajr", "date": "2024-03-11", "status": "on_time"})
        );
    }
}
