//! Expression nodes.

use super::NodeId;
use crate::token::{Literal, Token};

/// An expression node: a stable [`NodeId`] (used by the resolver's `locals`
/// table) paired with the expression's shape.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
}

/// The closed set of expression shapes the parser can produce.
///
/// `Get`, `Set`, `Super`, and `This` round out the grammar's class-member
/// syntax so the parser can recognize it, but the interpreter rejects all
/// four at evaluation time; no user-visible class support is implemented.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: Token,
    },
    Grouping {
        expression: Box<Expr>,
    },
    Literal {
        value: Literal,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    Super {
        keyword: Token,
        method: Token,
    },
    This {
        keyword: Token,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        name: Token,
    },
}

impl Expr {
    #[must_use]
    pub fn new(id: NodeId, kind: ExprKind) -> Self {
        Self { id, kind }
    }
}
