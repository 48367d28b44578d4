//! SCIM 2.0 Protocol Types
//!
//! Schema URIs, the ListResponse message returned by searches (RFC 7644
//! Section 3.4.2) and the query parameters that request it.

use serde::{Deserialize, Serialize};

use super::query::SortOrder;

// =============================================================================
// Schema URIs
// =============================================================================

/// SCIM Core User schema URI
pub const SCHEMA_USER: &str = "urn:ietf:params:scim:schemas:core:2.0:User";

/// SCIM Core Group schema URI
pub const SCHEMA_GROUP: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

/// SCIM Enterprise User extension schema URI
pub const SCHEMA_ENTERPRISE_USER: &str =
    "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

/// SCIM ListResponse schema URI
pub const SCHEMA_LIST_RESPONSE: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";

/// SCIM Error schema URI
pub const SCHEMA_ERROR: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

// =============================================================================
// List Response
// =============================================================================

/// One page of search results.
///
/// Produced by the search collaborator and never mutated afterwards. The echoed
/// paging fields drive [`Query::next_page_after`](super::query::Query::next_page_after)
/// and [`Query::previous_page_before`](super::query::Query::previous_page_before).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimListResponse<T> {
    /// SCIM schema URIs
    #[serde(default = "default_list_schemas")]
    schemas: Vec<String>,

    /// Total number of results matching the query
    total_results: u64,

    /// Number of results returned in this response
    #[serde(default)]
    items_per_page: u32,

    /// 1-based index of the first result in this response
    #[serde(default = "default_start_index")]
    start_index: u32,

    /// The list of resources. Servers may omit it when nothing matched.
    #[serde(rename = "Resources", default = "Vec::new")]
    resources: Vec<T>,
}

impl<T> ScimListResponse<T> {
    /// Create a new list response
    pub fn new(resources: Vec<T>, total_results: u64, start_index: u32) -> Self {
        let items_per_page = u32::try_from(resources.len()).unwrap_or(u32::MAX);
        Self {
            schemas: default_list_schemas(),
            total_results,
            items_per_page,
            start_index,
            resources,
        }
    }

    /// Create an empty list response
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 1)
    }

    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    pub fn resources(&self) -> &[T] {
        &self.resources
    }

    pub fn into_resources(self) -> Vec<T> {
        self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Start index of the page after this one, or `None` on the last page.
    ///
    /// Counts the resources actually returned rather than `itemsPerPage`,
    /// since some servers echo the requested count there. An empty page
    /// always ends paging.
    pub fn next_start_index(&self) -> Option<u32> {
        let returned = u32::try_from(self.resources.len()).ok()?;
        if returned == 0 {
            return None;
        }
        let next = self.start_index.max(1).checked_add(returned)?;
        (u64::from(next) <= self.total_results).then_some(next)
    }

    /// Whether more results follow this page.
    pub fn has_next_page(&self) -> bool {
        self.next_start_index().is_some()
    }
}

fn default_list_schemas() -> Vec<String> {
    vec![SCHEMA_LIST_RESPONSE.to_string()]
}

fn default_start_index() -> u32 {
    1
}

// =============================================================================
// List Parameters
// =============================================================================

/// Query parameters for list operations.
///
/// The serializable form of a [`Query`](super::query::Query); unset fields are
/// omitted so the server applies its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimListParams {
    /// Compiled SCIM filter expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Attribute to sort by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    /// Sort order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,

    /// 1-based start index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,

    /// Number of results per page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl ScimListParams {
    /// Parameters in wire order, ready for a URL query string.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(filter) = &self.filter {
            pairs.push(("filter", filter.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy", sort_by.clone()));
        }
        if let Some(sort_order) = self.sort_order {
            pairs.push(("sortOrder", sort_order.to_string()));
        }
        if let Some(start_index) = self.start_index {
            pairs.push(("startIndex", start_index.to_string()));
        }
        if let Some(count) = self.count {
            pairs.push(("count", count.to_string()));
        }
        pairs
    }
}

// =============================================================================
// Tests
// =============================================================================
