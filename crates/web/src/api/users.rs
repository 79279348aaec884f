//! `/users` endpoints.

use portal_core::{PageRequest, Paginated, RecordId, UserInput, UserRecord};
use tracing::instrument;

use super::{ApiClient, ApiError, Filters, item_endpoint, list_query, required};
use crate::pagination::PageFetcher;

/// Typed access to the backend's user records.
#[derive(Debug, Clone, Copy)]
pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// List one page of users.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or `ApiError::Page` if the response breaks
    /// the page invariants.
    #[instrument(skip(self, filters), fields(page = request.page(), limit = request.limit()))]
    pub async fn list(
        &self,
        request: PageRequest,
        filters: &Filters,
    ) -> Result<Paginated<UserRecord>, ApiError> {
        let query = list_query(request, filters);
        let page: Option<Paginated<UserRecord>> =
            self.client.get_with_query("/users", &query).await?;
        Ok(required(page, "/users")?.validate()?.fits(request)?)
    }

    /// Fetch one user.
    ///
    /// # Errors
    ///
    /// Returns the backend error (`is_not_found()` for unknown IDs).
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get(&self, id: &RecordId) -> Result<UserRecord, ApiError> {
        let endpoint = item_endpoint("/users", id)?;
        required(self.client.get(&endpoint).await?, &endpoint)
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &UserInput) -> Result<UserRecord, ApiError> {
        required(self.client.post("/users", input).await?, "/users")
    }

    /// Update a user; unset fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidEndpoint` for an id that would leave
    /// `/users`, otherwise the backend error.
    #[instrument(skip(self, input), fields(user_id = %id))]
    pub async fn update(&self, id: &RecordId, input: &UserInput) -> Result<UserRecord, ApiError> {
        let endpoint = item_endpoint("/users", id)?;
        required(self.client.put(&endpoint, input).await?, &endpoint)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: &RecordId) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self.client.delete(&item_endpoint("/users", id)?).await?;
        Ok(())
    }
}

impl PageFetcher<UserRecord> for UsersApi<'_> {
    async fn fetch_page(
        &self,
        request: PageRequest,
        filters: &Filters,
    ) -> Result<Paginated<UserRecord>, ApiError> {
        self.list(request, filters).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::PortalConfig;

    async fn setup() -> (MockServer, ApiClient) {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        let client = ApiClient::new(&PortalConfig::for_backend(url)).unwrap();
        (server, client)
    }

    fn user_json(id: i64) -> serde_json::Value {
        json!({ "id": id, "name": format!("User {id}"), "email": format!("u{id}@example.com"), "role": "user", "status": "active" })
    }

    #[tokio::test]
    async fn test_list_sends_page_and_filters() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "2"))
            .and(query_param("role", "admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [user_json(3), user_json(4)],
                "total": 5,
                "page": 2,
                "limit": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let filters = vec![("role".to_string(), "admin".to_string())];
        let page = client
            .users()
            .list(PageRequest::new(2, 2).unwrap(), &filters)
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.data[0].id, RecordId::Number(3));
    }

    #[tokio::test]
    async fn test_list_rejects_overfull_page() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [user_json(1), user_json(2)],
                "total": 2,
                "page": 1,
                "limit": 1
            })))
            .mount(&server)
            .await;

        let err = client
            .users()
            .list(PageRequest::new(1, 1).unwrap(), &Filters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Page(_)));
    }

    #[tokio::test]
    async fn test_get_missing_user_is_not_found() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/users/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "nope" })))
            .mount(&server)
            .await;

        let err = client.users().get(&RecordId::from(99)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_with_empty_body_is_empty_body_error() {
        let (server, client) = setup().await;
        Mock::given(method("PUT"))
            .and(path("/api/users/1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let input = UserInput {
            status: Some("disabled".to_string()),
            ..UserInput::default()
        };
        let err = client
            .users()
            .update(&RecordId::from(1), &input)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::EmptyBody(_)));
    }

    #[tokio::test]
    async fn test_update_refuses_id_that_leaves_users() {
        let (server, client) = setup().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(5)))
            .expect(0)
            .mount(&server)
            .await;

        let input = UserInput {
            status: Some("disabled".to_string()),
            ..UserInput::default()
        };
        for id in ["../documents/5", "5/../../documents/5", ".."] {
            let err = client
                .users()
                .update(&RecordId::from(id), &input)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidEndpoint(_)), "{id:?}: {err}");
        }
    }

    #[tokio::test]
    async fn test_delete_accepts_no_content() {
        let (server, client) = setup().await;
        Mock::given(method("DELETE"))
            .and(path("/api/users/usr_1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client.users().delete(&RecordId::from("usr_1")).await.unwrap();
    }
}
