//! SCIM 2.0 Query Construction
//!
//! Typed building blocks for SCIM searches: an attribute catalog, a filter
//! tree that compiles to the RFC 7644 filter grammar, and paged queries.
//!
//! ## RFC References
//!
//! - RFC 7643: SCIM Core Schema
//! - RFC 7644: SCIM Protocol (Section 3.4.2: Filtering, Sorting, Pagination)
//!
//! ## Module Structure
//!
//! - [`attribute`]: Typed attribute paths and their comparison methods
//! - [`schema`]: Attribute catalog for User, Enterprise User and Group
//! - [`filter`]: Filter tree, combinators and compiler
//! - [`query`]: Query builder, sort order and paging
//! - [`types`]: ListResponse and list parameters
//! - [`error`]: Construction errors and SCIM error responses

pub mod attribute;
pub mod error;
pub mod filter;
pub mod query;
pub mod schema;
pub mod types;

pub use attribute::{
    AttrKind, AttrPath, Attribute, BoolAttr, DateAttr, DecimalAttr, IntegerAttr, StringAttr,
};
pub use error::*;
pub use filter::{CompareOp, Filter, FilterValue, group, not};
pub use query::{DEFAULT_COUNT_PER_PAGE, FIRST_START_INDEX, Query, QueryBuilder, SortOrder};
pub use schema::ResourceType;
pub use types::*;
