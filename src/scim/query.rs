//! SCIM Search Queries
//!
//! A [`Query`] bundles a compiled filter with sort and paging parameters
//! (RFC 7644 Section 3.4.2). Queries are assembled through a [`QueryBuilder`]
//! and never change afterwards: paging derives a new query from the old one.
//!
//! ## Paging
//!
//! Start indexes are 1-based. Moving forward adds the page size, moving back
//! subtracts it and clamps to 1:
//!
//! ```text
//! startIndex=1 count=3  --next_page-->  startIndex=4  --previous_page-->  startIndex=1
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    attribute::{AttrPath, Attribute},
    error::QueryError,
    filter::Filter,
    schema::ResourceType,
    types::{ScimListParams, ScimListResponse},
};

/// Page size assumed when a query leaves `count` to the server.
pub const DEFAULT_COUNT_PER_PAGE: u32 = 100;

/// Index of the first result in a SCIM list.
pub const FIRST_START_INDEX: u32 = 1;

/// Sort direction for `sortOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable search request against one resource endpoint.
///
/// The filter is compiled when the query is built, so a `Query` carries the
/// exact wire string that will be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    resource: ResourceType,
    filter: Option<String>,
    sort_by: Option<AttrPath>,
    sort_order: Option<SortOrder>,
    start_index: Option<u32>,
    count_per_page: Option<u32>,
}

impl Query {
    /// Start a new query against `resource`.
    pub fn builder(resource: ResourceType) -> QueryBuilder {
        QueryBuilder::new(resource)
    }

    /// Unfiltered query with server defaults.
    pub fn all(resource: ResourceType) -> Self {
        Self {
            resource,
            filter: None,
            sort_by: None,
            sort_order: None,
            start_index: None,
            count_per_page: None,
        }
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    /// Compiled filter expression, if any.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn sort_by(&self) -> Option<&AttrPath> {
        self.sort_by.as_ref()
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.sort_order
    }

    /// Effective 1-based start index.
    pub fn start_index(&self) -> u32 {
        self.start_index.unwrap_or(FIRST_START_INDEX)
    }

    /// Requested page size, if one was set.
    pub fn count_per_page(&self) -> Option<u32> {
        self.count_per_page
    }

    /// Page size used for paging arithmetic.
    pub fn effective_count(&self) -> u32 {
        self.count_per_page.unwrap_or(DEFAULT_COUNT_PER_PAGE)
    }

    /// The following page: `startIndex + count`, everything else unchanged.
    pub fn next_page(&self) -> Self {
        self.at(self.start_index().saturating_add(self.effective_count()))
    }

    /// The preceding page: `startIndex - count`, never below 1.
    pub fn previous_page(&self) -> Self {
        self.at(
            self.start_index()
                .saturating_sub(self.effective_count())
                .max(FIRST_START_INDEX),
        )
    }

    /// The page after `result`, or `None` when `result` was the last page.
    ///
    /// Advances by the number of resources the server actually returned, so a
    /// server that caps the page size below `count` is still walked without gaps.
    pub fn next_page_after<T>(&self, result: &ScimListResponse<T>) -> Option<Self> {
        result.next_start_index().map(|next| self.at(next))
    }

    /// The page before `result`, or `None` when `result` started at index 1.
    pub fn previous_page_before<T>(&self, result: &ScimListResponse<T>) -> Option<Self> {
        let current = result.start_index().max(FIRST_START_INDEX);
        (current > FIRST_START_INDEX).then(|| {
            self.at(
                current
                    .saturating_sub(self.effective_count())
                    .max(FIRST_START_INDEX),
            )
        })
    }

    /// Same query positioned at `start_index` (clamped to 1).
    pub fn at(&self, start_index: u32) -> Self {
        Self {
            start_index: Some(start_index.max(FIRST_START_INDEX)),
            ..self.clone()
        }
    }

    /// Transport parameters; unset components are omitted.
    pub fn params(&self) -> ScimListParams {
        ScimListParams {
            filter: self.filter.clone(),
            sort_by: self.sort_by.as_ref().map(ToString::to_string),
            sort_order: self.sort_order,
            start_index: self.start_index,
            count: self.count_per_page,
        }
    }

    /// `(name, value)` pairs in wire order: filter, sortBy, sortOrder, startIndex, count.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.params().to_pairs()
    }

    /// Form-urlencoded query string, e.g. `filter=userName+eq+%22bjensen%22&count=10`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource.endpoint())?;
        let query = self.to_query_string();
        if !query.is_empty() {
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

/// Accumulates query settings until [`build`](QueryBuilder::build).
///
/// Fields are public so the builder can be filled in as a plain struct; the
/// `with_*` methods are shorthands.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub resource: ResourceType,
    pub filter: Option<Filter>,
    /// Pre-compiled filter text. Takes precedence over `filter`.
    pub raw_filter: Option<String>,
    pub sort_by: Option<AttrPath>,
    pub sort_order: Option<SortOrder>,
    pub start_index: Option<u32>,
    pub count_per_page: Option<u32>,
}

impl QueryBuilder {
    pub fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            filter: None,
            raw_filter: None,
            sort_by: None,
            sort_order: None,
            start_index: None,
            count_per_page: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Use an already-compiled filter string verbatim.
    pub fn with_raw_filter(mut self, filter: impl Into<String>) -> Self {
        self.raw_filter = Some(filter.into());
        self
    }

    pub fn with_sort_by(mut self, attr: &impl Attribute) -> Self {
        self.sort_by = Some(attr.attr_path().clone());
        self
    }

    pub fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = Some(start_index);
        self
    }

    pub fn with_count_per_page(mut self, count: u32) -> Self {
        self.count_per_page = Some(count);
        self
    }

    /// Freeze the settings into a [`Query`], compiling the filter.
    pub fn build(self) -> Result<Query, QueryError> {
        if let Some(start_index) = self.start_index
            && start_index < FIRST_START_INDEX
        {
            return Err(QueryError::InvalidStartIndex(start_index));
        }
        if self.count_per_page == Some(0) {
            return Err(QueryError::InvalidCount(0));
        }

        let filter = match (self.raw_filter, self.filter) {
            (Some(raw), _) => {
                let raw = raw.trim().to_string();
                if raw.is_empty() {
                    return Err(QueryError::EmptyFilter);
                }
                Some(raw)
            }
            (None, Some(filter)) => Some(filter.compile()),
            (None, None) => None,
        };

        let query = Query {
            resource: self.resource,
            filter,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            start_index: self.start_index,
            count_per_page: self.count_per_page,
        };

        debug!(
            resource = %query.resource,
            filter = query.filter.as_deref().unwrap_or(""),
            start_index = query.start_index(),
            count = ?query.count_per_page,
            "Built SCIM query"
        );

        Ok(query)
    }
}

// =============================================================================
// Tests
// =============================================================================
