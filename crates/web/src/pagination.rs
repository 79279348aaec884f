//! Page/limit state over any paginated backend collection.
//!
//! A [`Paginator`] owns the current page coordinates, the last page of items
//! and the last error for one list view. Every fetch takes a ticket from a
//! monotonically increasing counter; a response is applied only while its
//! ticket is still the newest, so a slow response can never overwrite the
//! result of a later navigation.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use portal_core::{PageRequest, Paginated};
use tracing::debug;

use crate::api::{ApiError, Filters};

/// Something that can fetch one page of `T`.
pub trait PageFetcher<T>: Send + Sync {
    /// Fetch the page described by `request`, with extra query `filters`.
    fn fetch_page(
        &self,
        request: PageRequest,
        filters: &Filters,
    ) -> impl Future<Output = Result<Paginated<T>, ApiError>> + Send;
}

/// Whether a finished fetch changed the paginator's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The response (or its error) is now the current state.
    Applied,
    /// A newer fetch was issued meanwhile; this response was discarded.
    Superseded,
}

#[derive(Debug)]
struct PageState<T> {
    request: PageRequest,
    items: Vec<T>,
    total: u64,
    loading: bool,
    error: Option<String>,
}

/// Paginated list state driven by a [`PageFetcher`].
pub struct Paginator<T, F> {
    fetcher: F,
    filters: Filters,
    state: Mutex<PageState<T>>,
    sequence: AtomicU64,
}

impl<T, F> Paginator<T, F>
where
    T: Clone + Send,
    F: PageFetcher<T>,
{
    /// Create a paginator at `request` with fixed `filters`. Nothing is
    /// fetched until [`Paginator::load`].
    pub fn new(fetcher: F, request: PageRequest, filters: Filters) -> Self {
        Self {
            fetcher,
            filters,
            state: Mutex::new(PageState {
                request,
                items: Vec::new(),
                total: 0,
                loading: false,
                error: None,
            }),
            sequence: AtomicU64::new(0),
        }
    }

    /// Fetch with the current page and limit.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when it is applied; the error message is also
    /// kept in [`Paginator::error`].
    pub async fn load(&self) -> Result<PageOutcome, ApiError> {
        let request = self.with_state(|s| s.request);
        self.fetch(request).await
    }

    /// Move to page `page` (same limit) and fetch it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Page` for page 0, otherwise as [`Paginator::load`].
    pub async fn change_page(&self, page: u32) -> Result<PageOutcome, ApiError> {
        let request = self.with_state(|s| s.request).with_page(page)?;
        self.fetch(request).await
    }

    /// Switch to `limit` items per page, back at page 1, and fetch.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Page` for an out-of-range limit, otherwise as
    /// [`Paginator::load`].
    pub async fn change_limit(&self, limit: u32) -> Result<PageOutcome, ApiError> {
        let request = PageRequest::with_limit(limit)?;
        self.fetch(request).await
    }

    /// Re-fetch the current page.
    ///
    /// # Errors
    ///
    /// As [`Paginator::load`].
    pub async fn refresh(&self) -> Result<PageOutcome, ApiError> {
        self.load().await
    }

    async fn fetch(&self, request: PageRequest) -> Result<PageOutcome, ApiError> {
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.with_state(|s| {
            s.request = request;
            s.loading = true;
        });

        let result = self
            .fetcher
            .fetch_page(request, &self.filters)
            .await
            .and_then(|page| page.fits(request).map_err(ApiError::from));

        let mut state = self.lock();
        if self.sequence.load(Ordering::SeqCst) != ticket {
            debug!(ticket, page = request.page(), "Discarding superseded page response");
            return Ok(PageOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(page) => {
                state.items = page.data;
                state.total = page.total;
                state.error = None;
                Ok(PageOutcome::Applied)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Current 1-based page.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.with_state(|s| s.request.page())
    }

    /// Current page size.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.with_state(|s| s.request.limit())
    }

    /// Total items across all pages, as of the last applied response.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.with_state(|s| s.total)
    }

    /// Items of the last applied response.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.with_state(|s| s.items.clone())
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.with_state(|s| s.loading)
    }

    /// Message of the last applied error, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.with_state(|s| s.error.clone())
    }

    /// The filters every fetch sends.
    #[must_use]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Consume the paginator, returning its state as a page.
    #[must_use]
    pub fn into_page(self) -> Paginated<T> {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Paginated {
            data: state.items,
            total: state.total,
            page: state.request.page(),
            limit: state.request.limit(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState<T>> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PageState<T>) -> R) -> R {
        f(&mut self.lock())
    }
}
