//! Expression node payloads (spec.md §3, §4.6).

use crate::ast::NodeRef;
use crate::token::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Decimal,
    String,
    Date,
    Time,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    And,
    Or,
    Xor,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

/// A `[ elem { , elem } ]` element: a bare expression or one end of a range.
#[derive(Debug, Clone)]
pub enum SetElement {
    Single(NodeRef),
    Range {
        low: Option<NodeRef>,
        high: Option<NodeRef>,
    },
}

#[derive(Debug, Clone)]
pub enum ExprNode {
    Identifier {
        name: String,
        quoted: bool,
        span: Span,
    },
    MemberAccess {
        target: NodeRef,
        member: String,
        span: Span,
    },
    Call {
        callee: NodeRef,
        args: Vec<NodeRef>,
        span: Span,
    },
    Literal {
        kind: LiteralKind,
        text: String,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: NodeRef,
        span: Span,
    },
    SetLiteral {
        elements: Vec<SetElement>,
        span: Span,
    },
    Range {
        low: Option<NodeRef>,
        high: Option<NodeRef>,
        span: Span,
    },
    OptionAccess {
        type_name: String,
        member: String,
        span: Span,
    },
}

impl ExprNode {
    pub fn span(&self) -> Span {
        match self {
            ExprNode::Identifier { span, .. }
            | ExprNode::MemberAccess { span, .. }
            | ExprNode::Call { span, .. }
            | ExprNode::Literal { span, .. }
            | ExprNode::Binary { span, .. }
            | ExprNode::Unary { span, .. }
            | ExprNode::SetLiteral { span, .. }
            | ExprNode::Range { span, .. }
            | ExprNode::OptionAccess { span, .. } => *span,
        }
    }
}
