// ============================================================================
// Module: Abstract Syntax Tree
// Description: The single `Node` type shared by calculation formulas, rule
//              conditions, and stage-detection criteria.
// Purpose: Give the parser one output shape and the evaluator one input
//          shape, regardless of which surface produced the text.
// Dependencies: curing-core
// ============================================================================

//! ## Overview
//! Every expression the engine parses — whether a calculation formula, a
//! rule condition, or a stage-detection criterion — becomes the same `Node`
//! tree. Block constructs (`if`, `while`, `for`, `switch`, `break`,
//! `continue`, `return`) are represented here so the grammar is uniform, but
//! no evaluator path in this engine drives them; they are reachable only
//! through [`crate::parser::parse`] and structural inspection such as
//! [`Node::has_comparison`].

use std::collections::BTreeMap;

use curing_core::Value;

/// A unary prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Logical negation, `not x` / `!x`.
    Not,
}

/// A binary infix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `and` / `&&`
    And,
    /// `or` / `||`
    Or,
}

impl BinaryOp {
    /// Returns true for the six structural comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Eq | Self::Ne | Self::Gt | Self::Ge | Self::Lt | Self::Le)
    }
}

/// Names of registry functions that count as comparisons for
/// `has_comparison` detection even though they are calls, not operators.
pub const COMPOSITE_COMPARATORS: &[&str] = &["EQ", "NE", "GT", "GE", "LT", "LE", "IN_RANGE"];

/// One node of an expression or condition's parsed form.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal value (int, float, string, bool, null, or a literal list).
    Literal(Value),
    /// A bare identifier, resolved from the evaluation environment.
    Variable(String),
    /// A bracketed list expression `[a, b, c]`.
    List(Vec<Node>),
    /// A unary expression.
    Unary {
        /// The operator applied.
        op: UnaryOp,
        /// The operand.
        operand: Box<Node>,
    },
    /// A binary expression.
    Binary {
        /// The operator applied.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Node>,
        /// Right operand.
        rhs: Box<Node>,
    },
    /// A function call, `name(pos, pos, key=value, ...)`.
    Call {
        /// Callee name, looked up case-insensitively in the operator
        /// registry before falling back to built-ins.
        name: String,
        /// Positional arguments.
        args: Vec<Node>,
        /// Keyword arguments.
        kwargs: BTreeMap<String, Node>,
    },
    /// `name = value`; valid only inside a block body.
    Assign {
        /// Target variable name.
        name: String,
        /// Assigned expression.
        value: Box<Node>,
    },
    /// `if (cond) { then } else { otherwise }`.
    If {
        /// The branch condition.
        cond: Box<Node>,
        /// Statements run when `cond` is true.
        then_branch: Vec<Node>,
        /// Statements run otherwise (empty when there is no `else`).
        else_branch: Vec<Node>,
    },
    /// `while (cond) { body }`.
    While {
        /// The loop condition.
        cond: Box<Node>,
        /// Loop body statements.
        body: Vec<Node>,
    },
    /// `for (init; cond; update) { body }`.
    For {
        /// Initializer statement.
        init: Box<Node>,
        /// Loop condition.
        cond: Box<Node>,
        /// Statement run after each iteration.
        update: Box<Node>,
        /// Loop body statements.
        body: Vec<Node>,
    },
    /// `switch (subject) { case v: ...; default: ... }`.
    Switch {
        /// The value being matched.
        subject: Box<Node>,
        /// Each case's match literal and body.
        cases: Vec<(Node, Vec<Node>)>,
        /// The default body, if any.
        default: Vec<Node>,
    },
    /// `break`.
    Break,
    /// `continue`.
    Continue,
    /// `return expr?`.
    Return(Option<Box<Node>>),
}

impl Node {
    /// Detects whether this expression's AST contains a structural
    /// comparison: a comparison operator node, or a call to one of the
    /// [`COMPOSITE_COMPARATORS`].
    #[must_use]
    pub fn has_comparison(&self) -> bool {
        match self {
            Self::Binary { op, lhs, rhs } => {
                op.is_comparison() || lhs.has_comparison() || rhs.has_comparison()
            }
            Self::Unary { operand, .. } => operand.has_comparison(),
            Self::List(items) => items.iter().any(Self::has_comparison),
            Self::Call { name, args, kwargs } => {
                COMPOSITE_COMPARATORS.contains(&name.to_ascii_uppercase().as_str())
                    || args.iter().any(Self::has_comparison)
                    || kwargs.values().any(Self::has_comparison)
            }
            Self::Assign { value, .. } => value.has_comparison(),
            Self::Literal(_) | Self::Variable(_) | Self::Break | Self::Continue => false,
            Self::If {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.has_comparison()
                    || then_branch.iter().any(Self::has_comparison)
                    || else_branch.iter().any(Self::has_comparison)
            }
            Self::While { cond, body } => cond.has_comparison() || body.iter().any(Self::has_comparison),
            Self::For {
                init,
                cond,
                update,
                body,
            } => {
                init.has_comparison()
                    || cond.has_comparison()
                    || update.has_comparison()
                    || body.iter().any(Self::has_comparison)
            }
            Self::Switch {
                subject,
                cases,
                default,
            } => {
                subject.has_comparison()
                    || cases.iter().any(|(value, body)| value.has_comparison() || body.iter().any(Self::has_comparison))
                    || default.iter().any(Self::has_comparison)
            }
            Self::Return(value) => value.as_deref().is_some_and(Self::has_comparison),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_comparison_operator_node() {
        let node = Node::Binary {
            op: BinaryOp::Gt,
            lhs: Box::new(Node::Variable("x".to_string())),
            rhs: Box::new(Node::Literal(Value::Int(5))),
        };
        assert!(node.has_comparison());
    }

    #[test]
    fn detects_composite_comparator_call() {
        let node = Node::Call {
            name: "IN_RANGE".to_string(),
            args: vec![Node::Variable("x".to_string())],
            kwargs: BTreeMap::new(),
        };
        assert!(node.has_comparison());
    }

    #[test]
    fn plain_arithmetic_has_no_comparison() {
        let node = Node::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Node::Literal(Value::Int(1))),
            rhs: Box::new(Node::Literal(Value::Int(2))),
        };
        assert!(!node.has_comparison());
    }
}
