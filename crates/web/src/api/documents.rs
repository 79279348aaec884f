//! `/documents` endpoints.

use portal_core::{Document, DocumentInput, PageRequest, Paginated, RecordId};
use tracing::instrument;

use super::{ApiClient, ApiError, Filters, item_endpoint, list_query, required};
use crate::pagination::PageFetcher;

/// Typed access to the backend's documents.
#[derive(Debug, Clone, Copy)]
pub struct DocumentsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DocumentsApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// List one page of documents.
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
    ) -> Result<Paginated<Document>, ApiError> {
        let query = list_query(request, filters);
        let page: Option<Paginated<Document>> =
            self.client.get_with_query("/documents", &query).await?;
        Ok(required(page, "/documents")?.validate()?.fits(request)?)
    }

    /// # Errors
    ///
    /// Returns the backend error (`is_not_found()` for unknown IDs).
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn get(&self, id: &RecordId) -> Result<Document, ApiError> {
        let endpoint = item_endpoint("/documents", id)?;
        required(self.client.get(&endpoint).await?, &endpoint)
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &DocumentInput) -> Result<Document, ApiError> {
        required(self.client.post("/documents", input).await?, "/documents")
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, input), fields(document_id = %id))]
    pub async fn update(&self, id: &RecordId, input: &DocumentInput) -> Result<Document, ApiError> {
        let endpoint = item_endpoint("/documents", id)?;
        required(self.client.put(&endpoint, input).await?, &endpoint)
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn delete(&self, id: &RecordId) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> =
            self.client.delete(&item_endpoint("/documents", id)?).await?;
        Ok(())
    }
}

impl PageFetcher<Document> for DocumentsApi<'_> {
    async fn fetch_page(
        &self,
        request: PageRequest,
        filters: &Filters,
    ) -> Result<Paginated<Document>, ApiError> {
        self.list(request, filters).await
    }
}
