//! Where-clause trees as sent by clients.
//!
//! A where argument is a list of [`ClauseNode`]s. Each node is either a leaf
//! (`path`, `comparison`, `value`) or a group of child nodes, and carries the
//! [`Connector`] that joins it to the sibling after it:
//!
//! ```json
//! [
//!   { "path": "name", "comparison": "startsWith", "value": ["J"] },
//!   { "groupedExpressions": [
//!       { "path": "age", "comparison": "greaterThan", "value": ["30"], "connector": "or" },
//!       { "path": "age", "comparison": "lessThan", "value": ["18"] }
//!   ] }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::comparison::{Comparison, Connector};

/// One node of a where tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseNode {
    /// Property path of a leaf. Ignored for groups.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub comparison: Comparison,
    /// Raw operand tokens; `null` entries are null operands.
    #[serde(default, rename = "value")]
    pub values: Vec<Option<String>>,
    /// Inverts the node's result.
    #[serde(default)]
    pub negate: bool,
    /// Joins this node to the next sibling. Ignored on the last node.
    #[serde(default)]
    pub connector: Connector,
    /// Child nodes. Present (even if empty) makes this node a group.
    #[serde(
        default,
        rename = "groupedExpressions",
        skip_serializing_if = "Option::is_none"
    )]
    pub children: Option<Vec<ClauseNode>>,
}

impl ClauseNode {
    /// A leaf comparing `path` against the given tokens.
    pub fn leaf<I, S>(path: impl Into<String>, comparison: Comparison, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClauseNode {
            path: path.into(),
            comparison,
            values: values.into_iter().map(|v| Some(v.into())).collect(),
            ..ClauseNode::default()
        }
    }

    /// A group of child nodes.
    pub fn group(children: Vec<ClauseNode>) -> Self {
        ClauseNode {
            children: Some(children),
            ..ClauseNode::default()
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = connector;
        self
    }

    /// Shorthand for joining the next sibling with `or`.
    pub fn or(self) -> Self {
        self.with_connector(Connector::Or)
    }

    /// Replaces the operand tokens, allowing null entries.
    pub fn with_values(mut self, values: Vec<Option<String>>) -> Self {
        self.values = values;
        self
    }

    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }
}
