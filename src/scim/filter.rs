//! SCIM 2.0 Filter Expressions
//!
//! Typed filter tree and its compiler to the wire grammar of RFC 7644
//! Section 3.4.2.2.
//!
//! ## Grammar (as emitted)
//!
//! ```text
//! filter     = predicate | "not" "(" filter ")" | filter ("and" | "or") filter | "(" filter ")"
//! predicate  = attrPath "pr" | attrPath compareOp compValue
//! compareOp  = "eq" | "co" | "sw" | "gt" | "ge" | "lt" | "le"
//! compValue  = STRING | DATETIME | "true" | "false" | NUMBER
//! ```
//!
//! ## Parenthesization
//!
//! The tree is serialized exactly as built. An `and`/`or` node is wrapped in
//! parentheses only when its parent joins with the other keyword, so
//! `a and b and c` prints flat while `a and (b or c)` keeps its group.
//! `not` always wraps its operand, and [`Filter::group`] always prints one
//! pair of parentheses.
//!
//! ## Examples
//!
//! ```text
//! userName eq "bjensen"
//! title eq "Dr." and nickName eq "Barbara" and displayName eq "BarbaraJ."
//! meta.created gt "2000-05-23T13:12:45.672Z" and (userName eq "marissa" or userName eq "hsimpson")
//! not (photos.type eq "thumbnail")
//! ```

use std::{fmt, ops};

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    attribute::{AttrKind, AttrPath},
    error::FilterError,
};

/// A SCIM filter expression.
///
/// Values are immutable: combinators consume their operands and return a new
/// node. Clone a sub-filter to reuse it in several expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Attribute comparison (e.g., `userName eq "john"`)
    Compare {
        attr: AttrPath,
        op: CompareOp,
        value: FilterValue,
    },
    /// Attribute presence check (e.g., `name pr`)
    Present { attr: AttrPath },
    /// Logical AND of two filters
    And(Box<Filter>, Box<Filter>),
    /// Logical OR of two filters
    Or(Box<Filter>, Box<Filter>),
    /// Logical NOT of a filter
    Not(Box<Filter>),
    /// Explicit parenthesized group
    Group(Box<Filter>),
}

/// Join keyword of the enclosing node while compiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    And,
    Or,
}

impl Filter {
    /// Build a comparison against a runtime attribute path.
    ///
    /// Typed catalog attributes make illegal combinations unrepresentable;
    /// this constructor is for paths resolved at runtime and checks that the
    /// operator and literal fit the attribute's kind.
    pub fn compare(attr: AttrPath, op: CompareOp, value: FilterValue) -> Result<Self, FilterError> {
        if !attr.kind().supports(op) {
            return Err(FilterError::IllegalOperator {
                attr: attr.to_string(),
                op,
                kind: attr.kind(),
            });
        }
        if value.kind() != attr.kind() {
            return Err(FilterError::LiteralMismatch {
                attr: attr.to_string(),
                kind: attr.kind(),
                literal: value.kind(),
            });
        }
        Ok(Self::compare_unchecked(attr, op, value))
    }

    /// Presence check against a runtime attribute path. Legal for every kind.
    pub fn present(attr: AttrPath) -> Self {
        Self::present_unchecked(attr)
    }

    pub(crate) fn compare_unchecked(attr: AttrPath, op: CompareOp, value: FilterValue) -> Self {
        Filter::Compare { attr, op, value }
    }

    pub(crate) fn present_unchecked(attr: AttrPath) -> Self {
        Filter::Present { attr }
    }

    /// `self and other`
    pub fn and(self, other: impl Into<Filter>) -> Self {
        Filter::And(Box::new(self), Box::new(other.into()))
    }

    /// `self or other`
    pub fn or(self, other: impl Into<Filter>) -> Self {
        Filter::Or(Box::new(self), Box::new(other.into()))
    }

    /// `not (self)`
    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Treat `filter` as a single parenthesized unit.
    pub fn group(filter: impl Into<Filter>) -> Self {
        Filter::Group(Box::new(filter.into()))
    }

    /// Serialize to the wire grammar.
    ///
    /// Pure and deterministic: the same tree always yields the same bytes.
    pub fn compile(&self) -> String {
        self.to_string()
    }

    /// Number of comparison and presence leaves in the tree.
    pub fn predicate_count(&self) -> usize {
        match self {
            Filter::Compare { .. } | Filter::Present { .. } => 1,
            Filter::And(left, right) | Filter::Or(left, right) => {
                left.predicate_count() + right.predicate_count()
            }
            Filter::Not(inner) | Filter::Group(inner) => inner.predicate_count(),
        }
    }

    fn write_joined(
        f: &mut fmt::Formatter<'_>,
        join: Join,
        parent: Option<Join>,
        left: &Filter,
        right: &Filter,
    ) -> fmt::Result {
        let keyword = match join {
            Join::And => "and",
            Join::Or => "or",
        };
        let parenthesize = parent.is_some_and(|p| p != join);
        if parenthesize {
            write!(f, "(")?;
        }
        left.write_node(f, Some(join))?;
        write!(f, " {} ", keyword)?;
        right.write_node(f, Some(join))?;
        if parenthesize {
            write!(f, ")")?;
        }
        Ok(())
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, parent: Option<Join>) -> fmt::Result {
        match self {
            Filter::Compare { attr, op, value } => write!(f, "{} {} {}", attr, op, value),
            Filter::Present { attr } => write!(f, "{} pr", attr),
            Filter::And(left, right) => Self::write_joined(f, Join::And, parent, left, right),
            Filter::Or(left, right) => Self::write_joined(f, Join::Or, parent, left, right),
            Filter::Not(inner) => {
                // A group directly under `not` already gets its parentheses here.
                let inner = match inner.as_ref() {
                    Filter::Group(grouped) => grouped.as_ref(),
                    other => other,
                };
                write!(f, "not (")?;
                inner.write_node(f, None)?;
                write!(f, ")")
            }
            Filter::Group(inner) => {
                write!(f, "(")?;
                inner.write_node(f, None)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, None)
    }
}

impl ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        self.negate()
    }
}

/// `not (filter)`
pub fn not(filter: impl Into<Filter>) -> Filter {
    filter.into().negate()
}

/// `(filter)`
pub fn group(filter: impl Into<Filter>) -> Filter {
    Filter::group(filter)
}

/// Comparison operators per RFC 7644.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    /// Equal
    Eq,
    /// Contains
    Co,
    /// Starts with
    Sw,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "eq",
            CompareOp::Co => "co",
            CompareOp::Sw => "sw",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
        };
        write!(f, "{}", s)
    }
}

/// Filter comparison literals.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    DateTime(DateTime<Utc>),
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
}

impl FilterValue {
    /// The attribute kind this literal can be compared with.
    pub fn kind(&self) -> AttrKind {
        match self {
            FilterValue::String(_) => AttrKind::String,
            FilterValue::DateTime(_) => AttrKind::Date,
            FilterValue::Bool(_) => AttrKind::Boolean,
            FilterValue::Integer(_) => AttrKind::Integer,
            FilterValue::Decimal(_) => AttrKind::Decimal,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // compValue strings are JSON strings (RFC 7644 Section 3.4.2.2)
            FilterValue::String(s) => {
                let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                f.write_str(&quoted)
            }
            FilterValue::DateTime(dt) => {
                write!(f, "\"{}\"", dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Integer(n) => write!(f, "{}", n),
            FilterValue::Decimal(d) => write!(f, "{}", d),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;
    use crate::scim::{
        attribute::{BoolAttr, DateAttr, IntegerAttr, StringAttr},
        schema::user,
    };

    fn attr(name: &str) -> StringAttr {
        StringAttr::custom(name).unwrap()
    }

    #[test]
    fn test_single_predicate_has_no_parentheses() {
        let filter = user::USER_NAME.equal_to("bjensen");
        assert_eq!(filter.compile(), "userName eq \"bjensen\"");
    }

    #[test]
    fn test_compile_is_deterministic() {
        let filter = user::TITLE
            .equal_to("Dr.")
            .and(user::NICK_NAME.equal_to("Barbara"))
            .or(not(user::ACTIVE.equal_to(false)));

        assert_eq!(filter.compile(), filter.compile());
        assert_eq!(filter.compile(), filter.to_string());
    }

    #[test]
    fn test_multiple_fields_and_chain() {
        let filter = user::TITLE
            .equal_to("Dr.")
            .and(user::NICK_NAME.equal_to("Barbara"))
            .and(user::DISPLAY_NAME.equal_to("BarbaraJ."));

        assert_eq!(
            filter.compile(),
            "title eq \"Dr.\" and nickName eq \"Barbara\" and displayName eq \"BarbaraJ.\""
        );
    }

    #[test]
    fn test_three_way_or_is_flat() {
        let filter = user::USER_NAME
            .equal_to("a")
            .or(user::USER_NAME.equal_to("b"))
            .or(user::USER_NAME.equal_to("c"));

        assert_eq!(
            filter.compile(),
            "userName eq \"a\" or userName eq \"b\" or userName eq \"c\""
        );
    }

    #[test]
    fn test_same_kind_on_right_is_flat() {
        let filter = attr("a")
            .equal_to("1")
            .and(attr("b").equal_to("2").and(attr("c").equal_to("3")));

        assert_eq!(filter.compile(), "a eq \"1\" and b eq \"2\" and c eq \"3\"");
    }

    #[test]
    fn test_or_inside_and_is_parenthesized() {
        let inner = user::USER_NAME
            .equal_to("marissa")
            .or(user::USER_NAME.equal_to("hsimpson"));
        let created = Utc.with_ymd_and_hms(2000, 5, 23, 13, 12, 45).unwrap()
            + chrono::Duration::milliseconds(672);
        let filter = user::meta::CREATED.greater_than(created).and(inner);

        assert_eq!(
            filter.compile(),
            "meta.created gt \"2000-05-23T13:12:45.672Z\" and \
             (userName eq \"marissa\" or userName eq \"hsimpson\")"
        );
    }

    #[test]
    fn test_and_inside_or_is_parenthesized_on_both_sides() {
        let left = attr("a").equal_to("1").and(attr("b").equal_to("2"));
        let right = attr("c").equal_to("3").and(attr("d").equal_to("4"));

        assert_eq!(
            left.or(right).compile(),
            "(a eq \"1\" and b eq \"2\") or (c eq \"3\" and d eq \"4\")"
        );
    }

    #[test]
    fn test_not_always_parenthesizes() {
        assert_eq!(
            not(user::photos::TYPE.equal_to("thumbnail")).compile(),
            "not (photos.type eq \"thumbnail\")"
        );

        let either = attr("a").equal_to("1").or(attr("b").equal_to("2"));
        assert_eq!((!either).compile(), "not (a eq \"1\" or b eq \"2\")");
    }

    #[test]
    fn test_not_inside_and_chain() {
        let filter = user::ACTIVE
            .equal_to(true)
            .and(not(user::photos::TYPE.equal_to("thumbnail")))
            .and(user::USER_NAME.starts_with("user"));

        assert_eq!(
            filter.compile(),
            "active eq true and not (photos.type eq \"thumbnail\") and userName sw \"user\""
        );
    }

    #[test]
    fn test_explicit_group() {
        let filter = group(user::USER_NAME.equal_to("marissa"));
        assert_eq!(filter.compile(), "(userName eq \"marissa\")");

        let chained = group(attr("a").equal_to("1").and(attr("b").equal_to("2")))
            .and(attr("c").equal_to("3"));
        assert_eq!(
            chained.compile(),
            "(a eq \"1\" and b eq \"2\") and c eq \"3\""
        );
    }

    #[test]
    fn test_group_under_not_is_not_doubled() {
        let filter = not(group(attr("a").equal_to("1")));
        assert_eq!(filter.compile(), "not (a eq \"1\")");
    }

    #[test]
    fn test_nested_groups_are_kept() {
        let filter = group(group(attr("a").equal_to("1")));
        assert_eq!(filter.compile(), "((a eq \"1\"))");
    }

    #[test]
    fn test_reused_subfilter() {
        let shared = user::USER_NAME.equal_to("bjensen");
        let first = shared.clone().and(user::ACTIVE.equal_to(true));
        let second = shared.clone().or(user::ACTIVE.equal_to(false));

        assert_eq!(shared.compile(), "userName eq \"bjensen\"");
        assert_eq!(first.compile(), "userName eq \"bjensen\" and active eq true");
        assert_eq!(second.compile(), "userName eq \"bjensen\" or active eq false");
    }

    #[rstest]
    #[case::plain("bjensen", r#""bjensen""#)]
    #[case::quote(r#"say "hi""#, r#""say \"hi\"""#)]
    #[case::backslash(r"C:\temp", r#""C:\\temp""#)]
    #[case::empty("", r#""""#)]
    #[case::unicode("Jürgen", r#""Jürgen""#)]
    #[case::newline("line1\nline2", r#""line1\nline2""#)]
    #[case::tab("a\tb", r#""a\tb""#)]
    #[case::control("bell\u{7}", r#""bell\u0007""#)]
    fn test_string_literal_escaping(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(FilterValue::String(input.to_string()).to_string(), expected);
    }

    #[test]
    fn test_date_literal_millisecond_precision() {
        let created = Utc.with_ymd_and_hms(2014, 1, 27, 14, 32, 11).unwrap();
        assert_eq!(
            FilterValue::DateTime(created).to_string(),
            "\"2014-01-27T14:32:11.000Z\""
        );

        let attr = DateAttr::custom("meta.lastModified").unwrap();
        assert_eq!(
            attr.less_equals(created).compile(),
            "meta.lastModified le \"2014-01-27T14:32:11.000Z\""
        );
    }

    #[test]
    fn test_number_and_boolean_literals() {
        assert_eq!(FilterValue::Integer(1_000_000).to_string(), "1000000");
        assert_eq!(FilterValue::Integer(-5).to_string(), "-5");
        assert_eq!(FilterValue::Decimal(Decimal::new(-55, 1)).to_string(), "-5.5");
        assert_eq!(FilterValue::Bool(true).to_string(), "true");
        assert_eq!(FilterValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_presence_operator() {
        assert_eq!(user::name::FAMILY_NAME.present().compile(), "name.familyName pr");
        assert_eq!(
            BoolAttr::custom("verified").unwrap().present().compile(),
            "verified pr"
        );
    }

    #[test]
    fn test_all_operators() {
        let age = IntegerAttr::custom("age").unwrap();
        assert_eq!(age.equal_to(21).compile(), "age eq 21");
        assert_eq!(age.greater_than(21).compile(), "age gt 21");
        assert_eq!(age.greater_equals(21).compile(), "age ge 21");
        assert_eq!(age.less_than(21).compile(), "age lt 21");
        assert_eq!(age.less_equals(21).compile(), "age le 21");

        assert_eq!(user::USER_NAME.contains("jen").compile(), "userName co \"jen\"");
        assert_eq!(user::USER_NAME.starts_with("bj").compile(), "userName sw \"bj\"");
    }

    #[test]
    fn test_runtime_compare_checks_operator() {
        let active = AttrPath::new("active", AttrKind::Boolean).unwrap();
        let err = Filter::compare(active, CompareOp::Gt, FilterValue::Bool(true)).unwrap_err();
        assert!(matches!(
            err,
            FilterError::IllegalOperator {
                op: CompareOp::Gt,
                kind: AttrKind::Boolean,
                ..
            }
        ));
    }

    #[test]
    fn test_runtime_compare_checks_literal() {
        let user_name = AttrPath::new("userName", AttrKind::String).unwrap();
        let err =
            Filter::compare(user_name.clone(), CompareOp::Eq, FilterValue::Integer(3)).unwrap_err();
        assert!(matches!(err, FilterError::LiteralMismatch { .. }));

        let ok = Filter::compare(
            user_name,
            CompareOp::Sw,
            FilterValue::String("bj".to_string()),
        )
        .unwrap();
        assert_eq!(ok.compile(), "userName sw \"bj\"");
    }

    #[test]
    fn test_predicate_count() {
        let filter = attr("a")
            .equal_to("1")
            .and(not(attr("b").present()))
            .or(group(attr("c").equal_to("3")));
        assert_eq!(filter.predicate_count(), 3);
    }

    #[test]
    fn test_filter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Filter>();
    }
}
