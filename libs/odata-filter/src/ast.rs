//! Filter syntax tree.
//!
//! The tree keeps the source text of its leaves. A `Primary` is either a
//! literal (`'abc'`, `42`, `true`, `null`, a timestamp, a spatial literal) or a
//! slash-separated property path; telling them apart is left to
//! [`crate::literal::is_literal`].

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    #[must_use]
    pub fn sql(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "and"),
            LogicalOperator::Or => write!(f, "or"),
        }
    }
}

/// A function invocation such as `startswith(Name, 'ab')`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<FilterNode>,
    /// Source text of the whole call, parentheses included.
    pub raw: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterNode {
    Primary(String),
    Function(FunctionCall),
    Not(Box<FilterNode>),
    Group(Box<FilterNode>),
    /// `op` is the lower-cased operator keyword (`eq`, `ne`, ...).
    Comparison {
        op: String,
        left: Box<FilterNode>,
        right: Box<FilterNode>,
    },
    Logical {
        op: LogicalOperator,
        left: Box<FilterNode>,
        right: Box<FilterNode>,
    },
    /// `values` hold the raw text of each list entry.
    In {
        left: Box<FilterNode>,
        values: Vec<String>,
    },
}

impl FilterNode {
    #[must_use]
    pub fn primary(text: impl Into<String>) -> Self {
        FilterNode::Primary(text.into())
    }

    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<FilterNode>) -> Self {
        let name = name.into();
        let raw = format!(
            "{name}({})",
            args.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        );
        FilterNode::Function(FunctionCall { name, args, raw })
    }

    #[must_use]
    pub fn comparison(op: impl Into<String>, left: FilterNode, right: FilterNode) -> Self {
        FilterNode::Comparison {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn and(self, other: FilterNode) -> Self {
        FilterNode::Logical {
            op: LogicalOperator::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    #[must_use]
    pub fn or(self, other: FilterNode) -> Self {
        FilterNode::Logical {
            op: LogicalOperator::Or,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        FilterNode::Not(Box::new(self))
    }

    #[must_use]
    pub fn grouped(self) -> Self {
        FilterNode::Group(Box::new(self))
    }

    #[must_use]
    pub fn is_logical(&self) -> bool {
        matches!(self, FilterNode::Logical { .. })
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Primary(text) => f.write_str(text),
            FilterNode::Function(call) => f.write_str(&call.raw),
            FilterNode::Not(inner) => write!(f, "not {inner}"),
            FilterNode::Group(inner) => write!(f, "({inner})"),
            FilterNode::Comparison { op, left, right } => write!(f, "{left} {op} {right}"),
            FilterNode::Logical { op, left, right } => write!(f, "{left} {op} {right}"),
            FilterNode::In { left, values } => write!(f, "{left} in ({})", values.join(",")),
        }
    }
}
