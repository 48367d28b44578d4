//! Consolidated test modules.
//!
//! End-to-end search tests against a mock SCIM service.
