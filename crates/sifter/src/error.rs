//! Error types for the sifter crate.

use std::fmt;

use thiserror::Error;

use crate::comparison::Comparison;
use crate::value::ValueType;

/// Boxed error raised by a user-supplied hook.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The clause being compiled when an error was raised.
///
/// Rendered into error messages so a failure can be traced back to the
/// offending node of the client's where tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseContext {
    pub path: String,
    pub comparison: Comparison,
    pub negate: bool,
}

impl ClauseContext {
    pub fn new(path: impl Into<String>, comparison: Comparison, negate: bool) -> Self {
        ClauseContext {
            path: path.into(),
            comparison,
            negate,
        }
    }
}

impl fmt::Display for ClauseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "path: {}, comparison: {}, negate: {}",
            self.path, self.comparison, self.negate
        )
    }
}

fn clause_suffix(clause: &Option<ClauseContext>) -> String {
    match clause {
        Some(ctx) => format!(" ({ctx})"),
        None => String::new(),
    }
}

fn token_display(token: &Option<String>) -> String {
    match token {
        Some(t) => format!("{t:?}"),
        None => "null".to_string(),
    }
}

/// Errors that can occur while compiling or applying query arguments.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A path segment does not name an accessible property.
    #[error("cannot resolve path '{path}' on {type_name}: {reason}{}", clause_suffix(.clause))]
    PathResolution {
        type_name: &'static str,
        path: String,
        reason: String,
        clause: Option<ClauseContext>,
    },

    /// Operator not permitted for the property's type family, or wrong value count.
    #[error("invalid clause: {reason}{}", clause_suffix(.clause))]
    Validation {
        reason: String,
        clause: Option<ClauseContext>,
    },

    /// A raw token could not be parsed into the property's representation.
    #[error("cannot convert {} to {target}{}", token_display(.token), clause_suffix(.clause))]
    Conversion {
        token: Option<String>,
        target: ValueType,
        clause: Option<ClauseContext>,
    },

    /// Pipeline options or arguments that cannot be applied together, such as
    /// skip/take over a source without a deterministic order.
    #[error("cannot apply {operation}: {reason}")]
    Configuration {
        operation: &'static str,
        reason: String,
    },

    /// Error raised by a custom predicate, sort or clause hook.
    #[error(transparent)]
    Hook(BoxError),
}

impl QueryError {
    pub(crate) fn path(type_name: &'static str, path: &str, reason: impl Into<String>) -> Self {
        QueryError::PathResolution {
            type_name,
            path: path.to_string(),
            reason: reason.into(),
            clause: None,
        }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        QueryError::Validation {
            reason: reason.into(),
            clause: None,
        }
    }

    pub(crate) fn conversion(token: Option<&str>, target: ValueType) -> Self {
        QueryError::Conversion {
            token: token.map(str::to_string),
            target,
            clause: None,
        }
    }

    pub(crate) fn configuration(operation: &'static str, reason: impl Into<String>) -> Self {
        QueryError::Configuration {
            operation,
            reason: reason.into(),
        }
    }

    /// Wraps an error raised inside a hook.
    pub fn hook(err: impl Into<BoxError>) -> Self {
        QueryError::Hook(err.into())
    }

    /// Attaches the clause being compiled, unless one is already recorded.
    ///
    /// Hook errors pass through untouched.
    pub fn in_clause(mut self, ctx: &ClauseContext) -> Self {
        match &mut self {
            QueryError::PathResolution { clause, .. }
            | QueryError::Validation { clause, .. }
            | QueryError::Conversion { clause, .. } => {
                if clause.is_none() {
                    *clause = Some(ctx.clone());
                }
            }
            QueryError::Configuration { .. } | QueryError::Hook(_) => {}
        }
        self
    }

    /// Returns the clause context, if the error was raised while compiling one.
    pub fn clause(&self) -> Option<&ClauseContext> {
        match self {
            QueryError::PathResolution { clause, .. }
            | QueryError::Validation { clause, .. }
            | QueryError::Conversion { clause, .. } => clause.as_ref(),
            _ => None,
        }
    }
}

/// Result type for sifter operations.
pub type Result<T> = std::result::Result<T, QueryError>;
