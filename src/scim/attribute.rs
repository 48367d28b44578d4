//! SCIM Attribute Metamodel
//!
//! Typed descriptors for the attributes a filter predicate may reference.
//!
//! Every attribute carries a value kind, and the kind decides which comparison
//! operators are available. Rather than one attribute type with runtime checks,
//! each kind has its own capability-restricted type:
//!
//! | Kind    | Type            | Operators                          |
//! |---------|-----------------|------------------------------------|
//! | string  | [`StringAttr`]  | `eq`, `co`, `sw`, `pr`             |
//! | date    | [`DateAttr`]    | `eq`, `gt`, `ge`, `lt`, `le`, `pr` |
//! | boolean | [`BoolAttr`]    | `eq`, `pr`                         |
//! | integer | [`IntegerAttr`] | `eq`, `gt`, `ge`, `lt`, `le`, `pr` |
//! | decimal | [`DecimalAttr`] | `eq`, `gt`, `ge`, `lt`, `le`, `pr` |
//!
//! Calling `greater_than` on a [`BoolAttr`] therefore does not compile.
//! Catalog constants live in [`super::schema`]; attributes outside the catalog
//! (custom or extension attributes) are created through the checked
//! constructors, which reject malformed paths immediately.

use std::{borrow::Cow, fmt};

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    error::FilterError,
    filter::{CompareOp, Filter, FilterValue},
};

/// Value kind of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrKind {
    String,
    Date,
    Boolean,
    Integer,
    Decimal,
}

impl AttrKind {
    /// Whether `op` may be applied to an attribute of this kind.
    pub fn supports(self, op: CompareOp) -> bool {
        match self {
            AttrKind::String => matches!(op, CompareOp::Eq | CompareOp::Co | CompareOp::Sw),
            AttrKind::Boolean => op == CompareOp::Eq,
            AttrKind::Date | AttrKind::Integer | AttrKind::Decimal => matches!(
                op,
                CompareOp::Eq | CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le
            ),
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttrKind::String => "string",
            AttrKind::Date => "date",
            AttrKind::Boolean => "boolean",
            AttrKind::Integer => "integer",
            AttrKind::Decimal => "decimal",
        };
        write!(f, "{}", s)
    }
}

/// A queryable attribute path.
///
/// Core attributes render as their dotted path (`name.familyName`).
/// Namespaced attributes render as `namespace:path`, which covers both full
/// schema URNs and short prefixes such as `extension:gender`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrPath {
    namespace: Option<Cow<'static, str>>,
    path: Cow<'static, str>,
    kind: AttrKind,
}

impl AttrPath {
    /// Catalog constructor. The path is trusted and not validated.
    pub(crate) const fn core(path: &'static str, kind: AttrKind) -> Self {
        Self {
            namespace: None,
            path: Cow::Borrowed(path),
            kind,
        }
    }

    /// Catalog constructor for schema extension attributes. Not validated.
    pub(crate) const fn in_namespace(
        namespace: &'static str,
        path: &'static str,
        kind: AttrKind,
    ) -> Self {
        Self {
            namespace: Some(Cow::Borrowed(namespace)),
            path: Cow::Borrowed(path),
            kind,
        }
    }

    /// Create a core attribute path from dotted text, e.g. `name.familyName`.
    pub fn new(path: impl Into<String>, kind: AttrKind) -> Result<Self, FilterError> {
        let path = path.into();
        validate_path(&path)?;
        Ok(Self {
            namespace: None,
            path: Cow::Owned(path),
            kind,
        })
    }

    /// Create an extension attribute path (`namespace:field`).
    pub fn namespaced(
        namespace: impl Into<String>,
        field: impl Into<String>,
        kind: AttrKind,
    ) -> Result<Self, FilterError> {
        let namespace = namespace.into();
        let field = field.into();
        validate_namespace(&namespace, &field)?;
        validate_path(&field)?;
        Ok(Self {
            namespace: Some(Cow::Owned(namespace)),
            path: Cow::Owned(field),
            kind,
        })
    }

    /// The declared value kind.
    pub fn kind(&self) -> AttrKind {
        self.kind
    }

    /// The extension namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The dotted path without namespace.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Dotted path segments, e.g. `["name", "familyName"]`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }

    /// Case-insensitive comparison against rendered text.
    ///
    /// SCIM attribute names are case-insensitive (RFC 7643 Section 2.1).
    pub fn matches(&self, text: &str) -> bool {
        match (&self.namespace, text.rsplit_once(':')) {
            (Some(ns), Some((text_ns, text_path))) => {
                ns.eq_ignore_ascii_case(text_ns) && self.path.eq_ignore_ascii_case(text_path)
            }
            (None, None) => self.path.eq_ignore_ascii_case(text),
            _ => false,
        }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{}:", ns)?;
        }
        write!(f, "{}", self.path)
    }
}

fn validate_path(path: &str) -> Result<(), FilterError> {
    if path.is_empty() {
        return Err(FilterError::malformed_path(path, "path is empty"));
    }
    for segment in path.split('.') {
        let mut chars = segment.chars();
        match chars.next() {
            None => return Err(FilterError::malformed_path(path, "empty path segment")),
            Some(c) if !c.is_ascii_alphabetic() => {
                return Err(FilterError::malformed_path(
                    path,
                    format!("segment '{}' must start with a letter", segment),
                ));
            }
            _ => {}
        }
        if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-')) {
            return Err(FilterError::malformed_path(
                path,
                format!("invalid character '{}' in segment '{}'", c, segment),
            ));
        }
    }
    Ok(())
}

fn validate_namespace(namespace: &str, field: &str) -> Result<(), FilterError> {
    let rendered = format!("{}:{}", namespace, field);
    if namespace.is_empty() {
        return Err(FilterError::malformed_path(rendered, "namespace is empty"));
    }
    if namespace.ends_with(':') {
        return Err(FilterError::malformed_path(
            rendered,
            "namespace must not end with ':'",
        ));
    }
    if let Some(c) = namespace
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '"' | '(' | ')' | '[' | ']'))
    {
        return Err(FilterError::malformed_path(
            rendered,
            format!("invalid character '{}' in namespace", c),
        ));
    }
    Ok(())
}

/// Anything that names an attribute path, e.g. a sort key.
pub trait Attribute {
    fn attr_path(&self) -> &AttrPath;
}

impl Attribute for AttrPath {
    fn attr_path(&self) -> &AttrPath {
        self
    }
}

/// Declares a typed attribute wrapper with its constructors.
macro_rules! typed_attr {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(AttrPath);

        impl $name {
            /// The value kind every instance of this type carries.
            pub const KIND: AttrKind = $kind;

            /// A core attribute that is not part of the built-in catalog.
            pub fn custom(path: impl Into<String>) -> Result<Self, FilterError> {
                AttrPath::new(path, Self::KIND).map(Self)
            }

            /// An extension attribute referenced by namespace and field name.
            pub fn extension(
                namespace: impl Into<String>,
                field: impl Into<String>,
            ) -> Result<Self, FilterError> {
                AttrPath::namespaced(namespace, field, Self::KIND).map(Self)
            }

            pub fn path(&self) -> &AttrPath {
                &self.0
            }

            /// `attr pr`
            pub fn present(&self) -> Filter {
                Filter::present_unchecked(self.0.clone())
            }

            fn compare(&self, op: CompareOp, value: FilterValue) -> Filter {
                Filter::compare_unchecked(self.0.clone(), op, value)
            }
        }

        impl Attribute for $name {
            fn attr_path(&self) -> &AttrPath {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

/// Ordering comparisons shared by the date and numeric kinds.
macro_rules! ordered_comparisons {
    ($name:ident, $value:ty, $into:expr) => {
        impl $name {
            pub fn equal_to(&self, value: $value) -> Filter {
                self.compare(CompareOp::Eq, $into(value))
            }

            pub fn greater_than(&self, value: $value) -> Filter {
                self.compare(CompareOp::Gt, $into(value))
            }

            pub fn greater_equals(&self, value: $value) -> Filter {
                self.compare(CompareOp::Ge, $into(value))
            }

            pub fn less_than(&self, value: $value) -> Filter {
                self.compare(CompareOp::Lt, $into(value))
            }

            pub fn less_equals(&self, value: $value) -> Filter {
                self.compare(CompareOp::Le, $into(value))
            }
        }
    };
}

typed_attr!(
    /// A string attribute: equality, substring and prefix matching.
    StringAttr,
    AttrKind::String
);

typed_attr!(
    /// A date-time attribute: equality and ordering.
    DateAttr,
    AttrKind::Date
);

typed_attr!(
    /// A boolean attribute: equality only.
    BoolAttr,
    AttrKind::Boolean
);

typed_attr!(IntegerAttr, AttrKind::Integer);

typed_attr!(DecimalAttr, AttrKind::Decimal);

/// Catalog constructor for the kinds the built-in catalog declares.
macro_rules! catalog_attr {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub(crate) const fn new(path: &'static str) -> Self {
                    Self(AttrPath::core(path, Self::KIND))
                }
            }
        )*
    };
}

catalog_attr!(StringAttr, DateAttr, BoolAttr);

impl StringAttr {
    /// Catalog constructor for schema extension attributes.
    pub(crate) const fn namespaced(namespace: &'static str, path: &'static str) -> Self {
        Self(AttrPath::in_namespace(namespace, path, Self::KIND))
    }

    /// `attr eq "value"`
    pub fn equal_to(&self, value: impl Into<String>) -> Filter {
        self.compare(CompareOp::Eq, FilterValue::String(value.into()))
    }

    /// `attr co "value"`
    pub fn contains(&self, value: impl Into<String>) -> Filter {
        self.compare(CompareOp::Co, FilterValue::String(value.into()))
    }

    /// `attr sw "value"`
    pub fn starts_with(&self, value: impl Into<String>) -> Filter {
        self.compare(CompareOp::Sw, FilterValue::String(value.into()))
    }
}

impl BoolAttr {
    /// `attr eq true|false`
    pub fn equal_to(&self, value: bool) -> Filter {
        self.compare(CompareOp::Eq, FilterValue::Bool(value))
    }
}

// Dates take any time zone; the literal is always rendered in UTC.
impl DateAttr {
    pub fn equal_to<Tz: TimeZone>(&self, value: DateTime<Tz>) -> Filter {
        self.compare(CompareOp::Eq, date_value(value))
    }

    pub fn greater_than<Tz: TimeZone>(&self, value: DateTime<Tz>) -> Filter {
        self.compare(CompareOp::Gt, date_value(value))
    }

    pub fn greater_equals<Tz: TimeZone>(&self, value: DateTime<Tz>) -> Filter {
        self.compare(CompareOp::Ge, date_value(value))
    }

    pub fn less_than<Tz: TimeZone>(&self, value: DateTime<Tz>) -> Filter {
        self.compare(CompareOp::Lt, date_value(value))
    }

    pub fn less_equals<Tz: TimeZone>(&self, value: DateTime<Tz>) -> Filter {
        self.compare(CompareOp::Le, date_value(value))
    }
}

fn date_value<Tz: TimeZone>(value: DateTime<Tz>) -> FilterValue {
    FilterValue::DateTime(value.with_timezone(&Utc))
}

ordered_comparisons!(IntegerAttr, i64, FilterValue::Integer);
ordered_comparisons!(DecimalAttr, Decimal, FilterValue::Decimal);

// =============================================================================
// Tests
// =============================================================================
