//! Expression precedence climbing: OR/XOR, AND, NOT, comparison, additive,
//! multiplicative, unary, postfix, primary — plus set literals/ranges
//! (spec.md §4.6).

use super::Parser;
use crate::ast::{AstNode, BinaryOp, ExprNode, LiteralKind, NodeRef, SetElement, UnaryOp};
use crate::token::{Span, Token, TokenKind};

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> NodeRef {
        self.parse_or_xor()
    }

    fn parse_or_xor(&mut self) -> NodeRef {
        let mut left = self.parse_and();
        loop {
            let op = match self.current_kind() {
                TokenKind::Or => BinaryOp::Or,
                TokenKind::Xor => BinaryOp::Xor,
                _ => break,
            };
            self.advance();
            let right = self.parse_and();
            left = self.make_binary(op, left, right);
        }
        left
    }

    fn parse_and(&mut self) -> NodeRef {
        let mut left = self.parse_not();
        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_not();
            left = self.make_binary(BinaryOp::And, left, right);
        }
        left
    }

    fn parse_not(&mut self) -> NodeRef {
        if self.check(TokenKind::Not) {
            let tok = self.advance();
            let operand = self.parse_not();
            let span = Span::new(tok.start_offset, self.node_span(operand).end);
            return self.alloc(AstNode::Expr(ExprNode::Unary {
                op: UnaryOp::Not,
                operand,
                span,
            }));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> NodeRef {
        let left = self.parse_additive();
        let op = match self.current_kind() {
            TokenKind::Equal => Some(BinaryOp::Eq),
            TokenKind::NotEqual => Some(BinaryOp::NotEq),
            TokenKind::Less => Some(BinaryOp::Lt),
            TokenKind::LessEqual => Some(BinaryOp::LtEq),
            TokenKind::Greater => Some(BinaryOp::Gt),
            TokenKind::GreaterEqual => Some(BinaryOp::GtEq),
            TokenKind::In => Some(BinaryOp::In),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let right = self.parse_additive();
                self.make_binary(op, left, right)
            }
            None => left,
        }
    }

    fn parse_additive(&mut self) -> NodeRef {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative();
            left = self.make_binary(op, left, right);
        }
        left
    }

    fn parse_multiplicative(&mut self) -> NodeRef {
        let mut left = self.parse_unary();
        loop {
            let op = match self.current_kind() {
                TokenKind::Multiply => BinaryOp::Mul,
                TokenKind::Divide => BinaryOp::Div,
                TokenKind::Div => BinaryOp::IntDiv,
                TokenKind::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary();
            left = self.make_binary(op, left, right);
        }
        left
    }

    fn parse_unary(&mut self) -> NodeRef {
        match self.current_kind() {
            TokenKind::Minus => {
                let tok = self.advance();
                let operand = self.parse_unary();
                let span = Span::new(tok.start_offset, self.node_span(operand).end);
                self.alloc(AstNode::Expr(ExprNode::Unary {
                    op: UnaryOp::Neg,
                    operand,
                    span,
                }))
            }
            TokenKind::Plus => {
                let tok = self.advance();
                let operand = self.parse_unary();
                let span = Span::new(tok.start_offset, self.node_span(operand).end);
                self.alloc(AstNode::Expr(ExprNode::Unary {
                    op: UnaryOp::Plus,
                    operand,
                    span,
                }))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> NodeRef {
        let mut expr = self.parse_primary();
        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let member_tok = self.advance();
                    let span = Span::new(self.node_span(expr).start, member_tok.end_offset);
                    expr = self.alloc(AstNode::Expr(ExprNode::MemberAccess {
                        target: expr,
                        member: member_tok.value,
                        span,
                    }));
                }
                TokenKind::DoubleColon => {
                    self.advance();
                    let member_tok = self.advance();
                    let type_name = match self.ast.get(expr) {
                        AstNode::Expr(ExprNode::Identifier { name, .. }) => name.clone(),
                        _ => String::new(),
                    };
                    let span = Span::new(self.node_span(expr).start, member_tok.end_offset);
                    expr = self.alloc(AstNode::Expr(ExprNode::OptionAccess {
                        type_name,
                        member: member_tok.value,
                        span,
                    }));
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RightParen) {
                        loop {
                            args.push(self.parse_expression());
                            if self.eat(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    let end_tok = self.expect(TokenKind::RightParen, ") to close call arguments");
                    let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
                    let span = Span::new(self.node_span(expr).start, end);
                    expr = self.alloc(AstNode::Expr(ExprNode::Call { callee: expr, args, span }));
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> NodeRef {
        if self.expr_depth >= self.config.max_expression_depth {
            let tok = self.current().clone();
            self.error(
                format!(
                    "Expression nesting exceeds the configured limit of {} levels",
                    self.config.max_expression_depth
                ),
                tok.clone(),
            );
            return self.alloc(AstNode::Expr(ExprNode::Literal {
                kind: LiteralKind::Integer,
                text: String::new(),
                span: Span::new(tok.start_offset, tok.start_offset),
            }));
        }
        self.expr_depth += 1;
        let result = self.parse_primary_inner();
        self.expr_depth -= 1;
        result
    }

    fn parse_primary_inner(&mut self) -> NodeRef {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Integer => {
                self.advance();
                self.alloc_literal(LiteralKind::Integer, tok)
            }
            TokenKind::Decimal => {
                self.advance();
                self.alloc_literal(LiteralKind::Decimal, tok)
            }
            TokenKind::String => {
                self.advance();
                self.alloc_literal(LiteralKind::String, tok)
            }
            TokenKind::Date => {
                self.advance();
                self.alloc_literal(LiteralKind::Date, tok)
            }
            TokenKind::Time => {
                self.advance();
                self.alloc_literal(LiteralKind::Time, tok)
            }
            TokenKind::DateTime => {
                self.advance();
                self.alloc_literal(LiteralKind::DateTime, tok)
            }
            TokenKind::Identifier => {
                self.advance();
                self.alloc(AstNode::Expr(ExprNode::Identifier {
                    name: tok.value,
                    quoted: false,
                    span: tok.span(),
                }))
            }
            TokenKind::QuotedIdentifier => {
                self.advance();
                self.alloc(AstNode::Expr(ExprNode::Identifier {
                    name: tok.value,
                    quoted: true,
                    span: tok.span(),
                }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression();
                self.expect(TokenKind::RightParen, ") to close parenthesized expression");
                inner
            }
            TokenKind::LeftBracket => self.parse_set_literal(),
            kind if kind.is_type_spelling_word() => {
                self.advance();
                self.alloc(AstNode::Expr(ExprNode::Identifier {
                    name: tok.value,
                    quoted: false,
                    span: tok.span(),
                }))
            }
            _ => {
                self.error(format!("Unexpected {:?}; expected expression", tok.kind), tok.clone());
                self.alloc(AstNode::Expr(ExprNode::Identifier {
                    name: String::new(),
                    quoted: false,
                    span: Span::new(tok.start_offset, tok.start_offset),
                }))
            }
        }
    }

    fn alloc_literal(&mut self, kind: LiteralKind, tok: Token) -> NodeRef {
        self.alloc(AstNode::Expr(ExprNode::Literal {
            kind,
            text: tok.value,
            span: tok.span(),
        }))
    }

    fn make_binary(&mut self, op: BinaryOp, left: NodeRef, right: NodeRef) -> NodeRef {
        let span = Span::new(self.node_span(left).start, self.node_span(right).end);
        self.alloc(AstNode::Expr(ExprNode::Binary { op, left, right, span }))
    }

    // ---- set literals / ranges ----

    fn parse_set_literal(&mut self) -> NodeRef {
        let start_tok = self.advance(); // '['
        let mut elements = Vec::new();
        if !self.check(TokenKind::RightBracket) {
            loop {
                if self.check(TokenKind::RightBracket) {
                    break; // trailing comma tolerated
                }
                elements.push(self.parse_set_element());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let end_tok = self.expect(TokenKind::RightBracket, "] to close set literal");
        let end = match &end_tok {
            Some(t) => t.end_offset,
            None => {
                let tok = self.current().clone();
                self.error("Unterminated set literal", tok);
                self.current().start_offset
            }
        };
        let span = Span::new(start_tok.start_offset, end);
        self.alloc(AstNode::Expr(ExprNode::SetLiteral { elements, span }))
    }

    fn parse_set_element(&mut self) -> SetElement {
        if self.check(TokenKind::DotDot) {
            self.advance();
            let high = self.parse_range_high();
            return SetElement::Range { low: None, high };
        }
        let first = self.parse_expression();
        if self.eat(TokenKind::DotDot).is_some() {
            let high = self.parse_range_high();
            return SetElement::Range {
                low: Some(first),
                high,
            };
        }
        SetElement::Single(first)
    }

    fn parse_range_high(&mut self) -> Option<NodeRef> {
        if self.is_valid_expression_start() {
            Some(self.parse_expression())
        } else {
            let tok = self.current().clone();
            self.error("expected expression after '..'", tok);
            None
        }
    }

    fn is_valid_expression_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Integer
                | TokenKind::Decimal
                | TokenKind::String
                | TokenKind::Date
                | TokenKind::Time
                | TokenKind::DateTime
                | TokenKind::Identifier
                | TokenKind::QuotedIdentifier
                | TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Not
        ) || self.current_kind().is_type_spelling_word()
    }

    /// Used by CASE label parsing for bare (non-bracketed) ranges like `1..5:`.
    pub(crate) fn parse_case_label(&mut self) -> NodeRef {
        let first = self.parse_expression();
        if self.eat(TokenKind::DotDot).is_some() {
            let high = self.parse_range_high();
            let end = high.map(|h| self.node_span(h).end).unwrap_or_else(|| self.node_span(first).end);
            let start = self.node_span(first).start;
            return self.alloc(AstNode::Expr(ExprNode::Range {
                low: Some(first),
                high,
                span: Span::new(start, end),
            }));
        }
        first
    }
}
