//! Predicate trees evaluated against a [`MultiFieldIndex`](crate::MultiFieldIndex)

use serde::{Deserialize, Serialize};

/// Filter predicate over indexed fields
///
/// Leaves are single-field lookups; `And`, `Or` and `Not` combine them with
/// intersect, union and difference against all indexed ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterExpr {
    /// Case-insensitive exact match
    Eq {
        /// Field name
        field: String,
        /// Expected value
        value: String,
    },
    /// Case-insensitive prefix match
    Prefix {
        /// Field name
        field: String,
        /// Expected prefix
        value: String,
    },
    /// Case-insensitive substring match
    Contains {
        /// Field name
        field: String,
        /// Expected substring
        value: String,
    },
    /// All sub-expressions match; empty means everything
    And(Vec<FilterExpr>),
    /// Any sub-expression matches; empty means nothing
    Or(Vec<FilterExpr>),
    /// Sub-expression does not match
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Exact-match leaf
    #[inline]
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Prefix leaf
    #[inline]
    #[must_use]
    pub fn prefix(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Prefix {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Substring leaf
    #[inline]
    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Negation
    #[inline]
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Fields referenced anywhere in the tree
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Eq { field, .. } | Self::Prefix { field, .. } | Self::Contains { field, .. } => {
                out.push(field);
            }
            Self::And(exprs) | Self::Or(exprs) => {
                for e in exprs {
                    e.collect_fields(out);
                }
            }
            Self::Not(inner) => inner.collect_fields(out),
        }
    }
}
