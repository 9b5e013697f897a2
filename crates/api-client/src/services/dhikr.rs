//! Dhikr counter and goal endpoints

use super::ISLAM_PREFIX;
use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{DhikrCounter, DhikrGoal, GoalPeriod};
use serde::de::IgnoredAny;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCounterRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_count: Option<u32>,
}

#[derive(Serialize)]
struct UpdateCounterRequest {
    count: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGoalRequest<'a> {
    counter_id: &'a str,
    target_count: u32,
    period: GoalPeriod,
}

/// Dhikr endpoints, obtained from [`ApiClient::dhikr`]
pub struct DhikrApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DhikrApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn path(endpoint: &str) -> String {
        format!("{}/dhikr/{}", ISLAM_PREFIX, endpoint)
    }

    /// The user's counters
    pub async fn counters(&self) -> Result<Vec<DhikrCounter>> {
        self.client.get(&Self::path("counters")).await
    }

    /// Create a counter
    pub async fn create_counter(&self, name: &str, target_count: Option<u32>) -> Result<DhikrCounter> {
        self.client
            .post(&Self::path("counters"), &CreateCounterRequest { name, target_count })
            .await
    }

    /// Set a counter's count
    pub async fn update_counter(&self, id: &str, count: u32) -> Result<DhikrCounter> {
        self.client
            .patch(&Self::path(&format!("counters/{}", id)), &UpdateCounterRequest { count })
            .await
    }

    /// Delete a counter
    pub async fn delete_counter(&self, id: &str) -> Result<()> {
        self.client
            .delete::<IgnoredAny>(&Self::path(&format!("counters/{}", id)))
            .await
            .map(|_| ())
    }

    /// Create a goal for a counter
    pub async fn create_goal(
        &self,
        counter_id: &str,
        target_count: u32,
        period: GoalPeriod,
    ) -> Result<DhikrGoal> {
        self.client
            .post(&Self::path("goals"), &CreateGoalRequest { counter_id, target_count, period })
            .await
    }

    /// The user's goals
    pub async fn goals(&self) -> Result<Vec<DhikrGoal>> {
        self.client.get(&Self::path("goals")).await
    }

    /// Aggregated statistics
    pub async fn stats(&self) -> Result<Value> {
        self.client.get(&Self::path("stats")).await
    }

    /// Counting history
    pub async fn history(&self) -> Result<Value> {
        self.client.get(&Self::path("history")).await
    }
}
