//! `/analytics` endpoints.

use portal_core::{Activity, DashboardData};
use tracing::instrument;

use super::{ApiClient, ApiError, Filters, required};

/// Typed access to the backend's analytics reports.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AnalyticsApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Overview numbers for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardData, ApiError> {
        const ENDPOINT: &str = "/analytics/dashboard";
        required(self.client.get(ENDPOINT).await?, ENDPOINT)
    }

    /// Recent user activity, narrowed by backend-defined query parameters.
    ///
    /// An empty response means no activity.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, params))]
    pub async fn user_activity(&self, params: &Filters) -> Result<Vec<Activity>, ApiError> {
        let activity: Option<Vec<Activity>> = self
            .client
            .get_with_query("/analytics/user-activity", params)
            .await?;
        Ok(activity.unwrap_or_default())
    }
}
