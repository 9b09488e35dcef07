//! Comparison operators, connectors, and operator validation.
//!
//! Every [`Comparison`] has a fixed arity contract and a fixed set of type
//! families it may target. [`validate`] and [`validate_arity`] enforce both
//! before any value is converted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::value::TypeFamily;

/// Comparison operator of a where clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    #[default]
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    Like,
    In,
    NotIn,
    Between,
}

/// Number of values a comparison consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one value.
    Single,
    /// Any number of values, including none.
    List,
    /// Exactly two values.
    Pair,
}

impl Comparison {
    /// Returns `true` for operators that only apply to text.
    pub fn is_text_op(self) -> bool {
        matches!(
            self,
            Comparison::Contains | Comparison::StartsWith | Comparison::EndsWith | Comparison::Like
        )
    }

    /// Returns `true` for the ordering operators.
    pub fn is_ordering_op(self) -> bool {
        matches!(
            self,
            Comparison::GreaterThan
                | Comparison::GreaterThanOrEqual
                | Comparison::LessThan
                | Comparison::LessThanOrEqual
        )
    }

    /// Returns `true` for set membership operators.
    pub fn is_list_op(self) -> bool {
        matches!(self, Comparison::In | Comparison::NotIn)
    }

    pub fn arity(self) -> Arity {
        match self {
            Comparison::In | Comparison::NotIn => Arity::List,
            Comparison::Between => Arity::Pair,
            _ => Arity::Single,
        }
    }

    /// Returns the display name of this comparison.
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Equal => "equal",
            Comparison::NotEqual => "notEqual",
            Comparison::GreaterThan => "greaterThan",
            Comparison::GreaterThanOrEqual => "greaterThanOrEqual",
            Comparison::LessThan => "lessThan",
            Comparison::LessThanOrEqual => "lessThanOrEqual",
            Comparison::Contains => "contains",
            Comparison::StartsWith => "startsWith",
            Comparison::EndsWith => "endsWith",
            Comparison::Like => "like",
            Comparison::In => "in",
            Comparison::NotIn => "notIn",
            Comparison::Between => "between",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a clause joins the sibling after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connector::And => f.write_str("and"),
            Connector::Or => f.write_str("or"),
        }
    }
}

/// Checks that `comparison` may target a property of the given family.
pub fn validate(family: TypeFamily, comparison: Comparison) -> Result<()> {
    let allowed = match family {
        TypeFamily::Text => !comparison.is_ordering_op() && comparison != Comparison::Between,
        TypeFamily::Ordered => !comparison.is_text_op(),
        TypeFamily::Equatable => {
            !comparison.is_text_op()
                && !comparison.is_ordering_op()
                && comparison != Comparison::Between
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(QueryError::validation(format!(
            "cannot perform {comparison} on a {family} property"
        )))
    }
}

/// Like [`validate`], but also rejects the set operators.
///
/// Used where the caller is about to build a single-value comparison.
pub fn validate_single(family: TypeFamily, comparison: Comparison) -> Result<()> {
    validate(family, comparison)?;
    if comparison.arity() != Arity::Single {
        return Err(QueryError::validation(format!(
            "cannot perform {comparison} as a single-value comparison"
        )));
    }
    Ok(())
}

/// Checks the number of supplied values against the comparison's arity.
pub fn validate_arity(comparison: Comparison, count: usize) -> Result<()> {
    let expected = match comparison.arity() {
        Arity::List => return Ok(()),
        Arity::Single => 1,
        Arity::Pair => 2,
    };
    if count != expected {
        return Err(QueryError::validation(format!(
            "{comparison} requires exactly {expected} value{}, but {count} were provided",
            if expected == 1 { "" } else { "s" }
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rejects_ordering_and_between() {
        assert!(validate(TypeFamily::Text, Comparison::Equal).is_ok());
        assert!(validate(TypeFamily::Text, Comparison::Like).is_ok());
        assert!(validate(TypeFamily::Text, Comparison::In).is_ok());
        assert!(validate(TypeFamily::Text, Comparison::GreaterThan).is_err());
        assert!(validate(TypeFamily::Text, Comparison::LessThanOrEqual).is_err());
        assert!(validate(TypeFamily::Text, Comparison::Between).is_err());
    }

    #[test]
    fn ordered_rejects_text_ops() {
        assert!(validate(TypeFamily::Ordered, Comparison::GreaterThan).is_ok());
        assert!(validate(TypeFamily::Ordered, Comparison::Between).is_ok());
        assert!(validate(TypeFamily::Ordered, Comparison::NotIn).is_ok());
        assert!(validate(TypeFamily::Ordered, Comparison::Contains).is_err());
        assert!(validate(TypeFamily::Ordered, Comparison::Like).is_err());
    }

    #[test]
    fn equatable_allows_equality_and_membership_only() {
        assert!(validate(TypeFamily::Equatable, Comparison::NotEqual).is_ok());
        assert!(validate(TypeFamily::Equatable, Comparison::In).is_ok());
        assert!(validate(TypeFamily::Equatable, Comparison::GreaterThan).is_err());
        assert!(validate(TypeFamily::Equatable, Comparison::Between).is_err());
        assert!(validate(TypeFamily::Equatable, Comparison::StartsWith).is_err());
    }

    #[test]
    fn single_rejects_set_operators() {
        assert!(validate_single(TypeFamily::Text, Comparison::Equal).is_ok());
        assert!(validate_single(TypeFamily::Text, Comparison::In).is_err());
        assert!(validate_single(TypeFamily::Ordered, Comparison::NotIn).is_err());
    }

    #[test]
    fn arity_contracts() {
        assert!(validate_arity(Comparison::Equal, 1).is_ok());
        assert!(validate_arity(Comparison::Equal, 0).is_err());
        assert!(validate_arity(Comparison::Equal, 2).is_err());
        assert!(validate_arity(Comparison::Between, 2).is_ok());
        assert!(validate_arity(Comparison::Between, 1).is_err());
        assert!(validate_arity(Comparison::Between, 3).is_err());
        assert!(validate_arity(Comparison::In, 0).is_ok());
        assert!(validate_arity(Comparison::NotIn, 17).is_ok());
    }

    #[test]
    fn arity_message_counts() {
        let err = validate_arity(Comparison::Between, 1).unwrap_err();
        assert!(err
            .to_string()
            .contains("between requires exactly 2 values, but 1 were provided"));
    }

    #[test]
    fn comparison_serde_names() {
        let parsed: Comparison = serde_json::from_str("\"greaterThanOrEqual\"").unwrap();
        assert_eq!(parsed, Comparison::GreaterThanOrEqual);
        assert_eq!(Comparison::NotIn.to_string(), "notIn");
        assert_eq!(Connector::default(), Connector::And);
    }
}
