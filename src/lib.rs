//! Typed SCIM 2.0 search queries.
//!
//! Build filters against a typed attribute catalog, compile them to the SCIM
//! filter grammar, page through results and execute searches over HTTP.
//!
//! ```no_run
//! use scim_query::{
//!     HttpSearchClient, Query, ResourceType, ScimListResponse, ScimSearch, SortOrder,
//!     scim::schema::user,
//! };
//! use serde_json::Value;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let query = Query::builder(ResourceType::User)
//!     .with_filter(user::TITLE.equal_to("Dr.").and(user::ACTIVE.equal_to(true)))
//!     .with_sort_by(&user::USER_NAME)
//!     .with_sort_order(SortOrder::Ascending)
//!     .with_count_per_page(50)
//!     .build()?;
//!
//! let client = HttpSearchClient::new("https://idp.example.com/scim/v2", Some("token".into()))?;
//! let page: ScimListResponse<Value> = client.search(&query).await?;
//! if let Some(next) = query.next_page_after(&page) {
//!     let _more: ScimListResponse<Value> = client.search(&next).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod scim;

#[cfg(test)]
mod tests;

pub use client::{HttpSearchClient, ScimSearch, SearchError, fetch_all};
pub use config::{ClientConfig, ConfigError, PagingConfig};
pub use scim::{Filter, Query, QueryBuilder, ResourceType, ScimListResponse, SortOrder};
