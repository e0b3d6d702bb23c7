//! Page-number pagination for the product listing
//!
//! Pages are 1-based. The page size comes from the client's `per_page`
//! parameter, falls back to the configured default when absent or not a
//! positive integer, and is clamped to the configured maximum.
//!
//! ```rust
//! use catalog_service::handlers::ListQuery;
//! use catalog_service::pagination::PaginationPolicy;
//!
//! let policy = PaginationPolicy::default();
//! let target = policy.target(&ListQuery::new().with_page("3").with_per_page("500")).unwrap();
//! let request = target.resolve(1000);
//! assert_eq!(request.page, 3);
//! assert_eq!(request.size, 100);
//! assert_eq!(request.window().offset, 200);
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::config::PaginationConfig;
use crate::handlers::ListQuery;
use crate::repository::Pagination;

/// Keyword accepted in place of a number to request the final page
pub const LAST_PAGE: &str = "last";

/// Path the navigation links point at
pub const COLLECTION_PATH: &str = "/api/v1/products/";

/// Page request that cannot be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// `page` is not a positive integer (or `last`)
    Invalid(String),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(raw) => write!(f, "invalid page number: {raw:?}"),
        }
    }
}

impl std::error::Error for PageError {}

/// Page size rules and query parameter names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPolicy {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub page_param: String,
    pub size_param: String,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self::from_config(&PaginationConfig::default())
    }
}

impl PaginationPolicy {
    pub fn from_config(config: &PaginationConfig) -> Self {
        let max_page_size = u64::from(config.max_page_size.max(1));
        Self {
            default_page_size: u64::from(config.default_page_size).clamp(1, max_page_size),
            max_page_size,
            page_param: config.page_query_param.clone(),
            size_param: config.page_size_query_param.clone(),
        }
    }

    /// Pick the paging parameters out of the raw query string pairs
    pub fn read_query(&self, params: &HashMap<String, String>) -> ListQuery {
        ListQuery {
            page: params.get(&self.page_param).cloned(),
            per_page: params.get(&self.size_param).cloned(),
        }
    }

    /// Effective page size for a raw `per_page` value
    pub fn page_size(&self, raw: Option<&str>) -> u64 {
        raw.and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|size| *size > 0)
            .map_or(self.default_page_size, |size| size.min(self.max_page_size))
    }

    /// Validate the paging parameters of `query`
    ///
    /// The result still needs the collection size to become a concrete
    /// page, see [`PageTarget::resolve`].
    pub fn target(&self, query: &ListQuery) -> Result<PageTarget, PageError> {
        let position = match query.page.as_deref().map(str::trim) {
            None => PagePosition::Number(1),
            Some(LAST_PAGE) => PagePosition::Last,
            Some(raw) => match raw.parse::<u64>() {
                Ok(page) if page > 0 => PagePosition::Number(page),
                _ => return Err(PageError::Invalid(raw.to_string())),
            },
        };
        Ok(PageTarget {
            position,
            size: self.page_size(query.per_page.as_deref()),
            size_requested: query.per_page.is_some(),
        })
    }

    /// Navigation links for `request` over a collection of `count` items
    ///
    /// A page past the end has no `next`, and its `previous` points at the
    /// last page that holds items.
    pub fn links(&self, request: &PageRequest, count: u64) -> PageLinks {
        let last = page_count(count, request.size);
        let next = (request.page < last).then(|| self.link(request.page + 1, request));
        let previous = if request.page > last {
            (last > 0).then(|| self.link(last, request))
        } else {
            (request.page > 1).then(|| self.link(request.page - 1, request))
        };
        PageLinks { next, previous }
    }

    fn link(&self, page: u64, request: &PageRequest) -> String {
        if request.size_requested {
            format!(
                "{COLLECTION_PATH}?{}={page}&{}={}",
                self.page_param, self.size_param, request.size
            )
        } else {
            format!("{COLLECTION_PATH}?{}={page}", self.page_param)
        }
    }
}

/// Number of pages needed for `count` items
pub fn page_count(count: u64, size: u64) -> u64 {
    if size == 0 {
        return 0;
    }
    count.div_ceil(size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePosition {
    /// 1-based page index
    Number(u64),
    /// Whatever page is last once the collection size is known
    Last,
}

/// Validated paging parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTarget {
    pub position: PagePosition,
    pub size: u64,
    pub size_requested: bool,
}

impl PageTarget {
    /// Concrete page over a collection of `count` items
    pub fn resolve(&self, count: u64) -> PageRequest {
        let page = match self.position {
            PagePosition::Number(page) => page,
            PagePosition::Last => page_count(count, self.size).max(1),
        };
        PageRequest {
            page,
            size: self.size,
            size_requested: self.size_requested,
        }
    }
}

/// A page position resolved against the collection size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page index
    pub page: u64,
    pub size: u64,
    /// Whether the client chose the size (kept in navigation links)
    pub size_requested: bool,
}

impl PageRequest {
    /// Offset and limit for the storage query
    pub fn window(&self) -> Pagination {
        Pagination::page(self.page, self.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// One page of results with navigation metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole collection
    pub count: u64,
    pub links: PageLinks,
}
