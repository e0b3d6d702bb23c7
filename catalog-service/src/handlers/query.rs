//! Query parameters for the list operation
//!
//! Values are kept as the raw strings the client sent so that the
//! pagination policy can tell "absent" from "malformed".
//!
//! # Example
//!
//! ```rust
//! use catalog_service::handlers::ListQuery;
//!
//! let query = ListQuery::new().with_page("2").with_per_page("50");
//! assert_eq!(query.page.as_deref(), Some("2"));
//! assert_eq!(query.per_page.as_deref(), Some("50"));
//! ```

use serde::{Deserialize, Serialize};

/// Raw paging parameters of a list request
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page index, or `last`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Requested page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<String>,
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: impl Into<String>) -> Self {
        self.per_page = Some(per_page.into());
        self
    }
}
