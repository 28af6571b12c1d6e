//! Page-number pagination primitives.
//!
//! Endpoints accept a one-based page number and a page size, translate them
//! into `OFFSET`/`LIMIT` pairs for the persistence layer, and describe the
//! resulting window with [`PageMeta`]. The arithmetic lives here so every
//! adapter reports the same `first_item`/`last_item` semantics.
//!
//! # Examples
//!
//! ```
//! use pagination::{PageMeta, PageRequest};
//!
//! let request = PageRequest::new(2, 10)?;
//! assert_eq!(request.offset(), 10);
//!
//! let meta = PageMeta::new(request, 25);
//! assert_eq!(meta.last_page, 3);
//! assert_eq!(meta.first_item, 11);
//! assert_eq!(meta.last_item, 20);
//! # Ok::<(), pagination::PageRequestError>(())
//! ```

use serde::{Deserialize, Serialize};

/// Page number used when a client does not supply one.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when a client does not supply one.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Validation failures raised by [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Page numbers start at one.
    #[error("page must be greater than 0")]
    PageOutOfRange,
    /// A page must hold at least one item.
    #[error("items per page must be greater than 0")]
    PerPageOutOfRange,
}

/// Requested page window.
///
/// ## Invariants
/// - `page >= 1`
/// - `per_page >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Validate and construct a page request.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when either value is zero.
    pub const fn new(page: u32, per_page: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::PageOutOfRange);
        }
        if per_page == 0 {
            return Err(PageRequestError::PerPageOutOfRange);
        }
        Ok(Self { page, per_page })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of rows to skip before the page starts.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)).saturating_mul(self.limit())
    }

    /// Maximum number of rows on the page.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Summary of a page window over `total` matching rows.
///
/// `first_item` and `last_item` are one-based positions of the rows on the
/// page and are both zero when the page lies past the last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Page that was requested.
    pub current_page: u64,
    /// Highest page holding rows; zero when nothing matched.
    pub last_page: u64,
    /// Position of the first row on the page.
    pub first_item: u64,
    /// Position of the last row on the page.
    pub last_item: u64,
    /// Requested page size.
    pub items_per_page: u64,
    /// Number of rows matching the query.
    pub total: u64,
}

impl PageMeta {
    /// Compute the metadata for `request` over `total` rows.
    #[must_use]
    pub fn new(request: PageRequest, total: u64) -> Self {
        let per_page = request.limit();
        let offset = request.offset();
        let last_page = total.div_ceil(per_page);
        let (first_item, last_item) = if offset < total {
            (offset + 1, offset.saturating_add(per_page).min(total))
        } else {
            (0, 0)
        };

        Self {
            current_page: u64::from(request.page()),
            last_page,
            first_item,
            last_item,
            items_per_page: per_page,
            total,
        }
    }

    /// Metadata reported when no rows are returned at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            current_page: 0,
            last_page: 0,
            first_item: 0,
            last_item: 0,
            items_per_page: 0,
            total: 0,
        }
    }

    /// Whether the described page holds at least one row.
    #[must_use]
    pub const fn has_items(&self) -> bool {
        self.first_item > 0
    }
}

/// A page of items together with its window metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    /// Items on the page, in query order.
    pub data: Vec<T>,
    /// Window description.
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    /// Pair a page of items with metadata computed from `request` and `total`.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta::new(request, total),
        }
    }

    /// Transform each item while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }

    /// Whether the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
