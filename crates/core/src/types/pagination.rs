//! Page-bounded slices of backend collections.
//!
//! List endpoints take `page`/`limit` query parameters and answer with
//! `{ data, total, page, limit }`. [`PageRequest`] is the validated request
//! side, [`Paginated`] the response side.

use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size the front end will ask for.
pub const MAX_LIMIT: u32 = 100;

/// Errors for page parameters and malformed page responses.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Page numbers start at 1.
    #[error("page must be at least 1")]
    ZeroPage,
    /// A page must hold at least one item.
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange {
        /// Maximum allowed limit.
        max: u32,
    },
    /// The backend returned more items than the page limit allows.
    #[error("page holds {len} items but limit is {limit}")]
    Overfull {
        /// Number of items received.
        len: usize,
        /// Limit reported for the page.
        limit: u32,
    },
}

/// Requested page coordinates.
///
/// ## Constraints
///
/// - `page >= 1`
/// - `1 <= limit <= MAX_LIMIT`
///
/// ## Examples
///
/// ```
/// use portal_core::PageRequest;
///
/// let req = PageRequest::new(2, 25).unwrap();
/// assert_eq!(req.offset(), 25);
///
/// assert!(PageRequest::new(0, 10).is_err());
/// assert!(PageRequest::new(1, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Create a validated page request.
    ///
    /// # Errors
    ///
    /// Returns `PageError::ZeroPage` if `page` is 0 and
    /// `PageError::LimitOutOfRange` if `limit` is 0 or above [`MAX_LIMIT`].
    pub const fn new(page: u32, limit: u32) -> Result<Self, PageError> {
        if page == 0 {
            return Err(PageError::ZeroPage);
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PageError::LimitOutOfRange { max: MAX_LIMIT });
        }
        Ok(Self { page, limit })
    }

    /// Build a request from optional query values, falling back to defaults
    /// for anything missing and clamping out-of-range values.
    #[must_use]
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// The page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items that precede this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// The same limit, at a different page.
    ///
    /// # Errors
    ///
    /// Returns `PageError::ZeroPage` if `page` is 0.
    pub const fn with_page(self, page: u32) -> Result<Self, PageError> {
        Self::new(page, self.limit)
    }

    /// A different limit, back at page 1.
    ///
    /// # Errors
    ///
    /// Returns `PageError::LimitOutOfRange` if `limit` is out of range.
    pub const fn with_limit(limit: u32) -> Result<Self, PageError> {
        Self::new(1, limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// A page of items plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page, in backend order.
    pub data: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl<T> Paginated<T> {
    /// An empty first page.
    #[must_use]
    pub const fn empty(request: PageRequest) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: request.page,
            limit: request.limit,
        }
    }

    /// Check the page invariants on a freshly decoded response.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` or `limit` is 0, or if the page holds more
    /// items than its limit.
    pub fn validate(self) -> Result<Self, PageError> {
        if self.page == 0 {
            return Err(PageError::ZeroPage);
        }
        if self.limit == 0 {
            return Err(PageError::LimitOutOfRange { max: MAX_LIMIT });
        }
        if self.data.len() > self.limit as usize {
            return Err(PageError::Overfull {
                len: self.data.len(),
                limit: self.limit,
            });
        }
        Ok(self)
    }

    /// Check that the page fits the request it answers, whatever limit the
    /// backend reported.
    ///
    /// # Errors
    ///
    /// Returns `PageError::Overfull` if the page holds more items than
    /// `request.limit()`.
    pub fn fits(self, request: PageRequest) -> Result<Self, PageError> {
        if self.data.len() > request.limit as usize {
            return Err(PageError::Overfull {
                len: self.data.len(),
                limit: request.limit,
            });
        }
        Ok(self)
    }

    /// Total number of pages (at least 1).
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.limit)).max(1)
    }

    /// Whether a later page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}
