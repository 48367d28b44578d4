//! SCIM Error Types
//!
//! Construction-time errors for filters and queries, plus the SCIM error
//! response body (RFC 7644 Section 3.12) that servers return on failure.

use serde::{Deserialize, Deserializer, Serialize};

use super::{attribute::AttrKind, filter::CompareOp, types::SCHEMA_ERROR};

/// Errors raised while constructing a filter.
///
/// These are configuration errors: they surface when the filter is built and
/// never reach the compiler or the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Malformed attribute path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Operator '{op}' is not supported for {kind} attribute '{attr}'")]
    IllegalOperator {
        attr: String,
        op: CompareOp,
        kind: AttrKind,
    },

    #[error("Attribute '{attr}' is of kind {kind} but was compared with a {literal} literal")]
    LiteralMismatch {
        attr: String,
        kind: AttrKind,
        literal: AttrKind,
    },
}

impl FilterError {
    pub(crate) fn malformed_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by [`QueryBuilder::build`](super::query::QueryBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("startIndex must be at least 1, got {0}")]
    InvalidStartIndex(u32),

    #[error("count must be at least 1, got {0}")]
    InvalidCount(u32),

    #[error("Filter must not be empty")]
    EmptyFilter,
}

/// SCIM error response per RFC 7644.
///
/// Servers return this body together with a non-2xx status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimErrorResponse {
    /// SCIM schema URIs (always contains the Error schema)
    #[serde(default = "default_error_schemas")]
    pub schemas: Vec<String>,

    /// HTTP status code as a string (e.g., "400", "404").
    /// Some servers send a JSON number instead; both are accepted.
    #[serde(deserialize_with = "string_or_number")]
    pub status: String,

    /// SCIM-specific error type (optional, per RFC 7644)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scim_type: Option<ScimErrorType>,

    /// Human-readable error detail
    #[serde(default)]
    pub detail: String,
}

impl ScimErrorResponse {
    /// The status as a number, if it parses.
    pub fn status_code(&self) -> Option<u16> {
        self.status.parse().ok()
    }
}

fn default_error_schemas() -> Vec<String> {
    vec![SCHEMA_ERROR.to_string()]
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Status {
        Text(String),
        Number(u64),
    }

    Ok(match Status::deserialize(deserializer)? {
        Status::Text(s) => s,
        Status::Number(n) => n.to_string(),
    })
}

/// SCIM error types per RFC 7644 Section 3.12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScimErrorType {
    /// Filter syntax is invalid or unsupported
    InvalidFilter,

    /// Too many results for the server to return
    TooMany,

    /// Uniqueness constraint violated
    Uniqueness,

    /// Attempt to modify read-only or immutable attribute
    Mutability,

    /// Request body has invalid syntax
    InvalidSyntax,

    /// Attribute path is invalid
    InvalidPath,

    /// PATCH operation missing a target
    NoTarget,

    /// Attribute value is invalid for its type
    InvalidValue,

    /// Unsupported protocol version
    InvalidVers,

    /// Request cannot be completed because of sensitive information in the URI
    Sensitive,

    /// Any scimType this client does not know about
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ScimErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScimErrorType::InvalidFilter => write!(f, "invalidFilter"),
            ScimErrorType::TooMany => write!(f, "tooMany"),
            ScimErrorType::Uniqueness => write!(f, "uniqueness"),
            ScimErrorType::Mutability => write!(f, "mutability"),
            ScimErrorType::InvalidSyntax => write!(f, "invalidSyntax"),
            ScimErrorType::InvalidPath => write!(f, "invalidPath"),
            ScimErrorType::NoTarget => write!(f, "noTarget"),
            ScimErrorType::InvalidValue => write!(f, "invalidValue"),
            ScimErrorType::InvalidVers => write!(f, "invalidVers"),
            ScimErrorType::Sensitive => write!(f, "sensitive"),
            ScimErrorType::Other => write!(f, "other"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
