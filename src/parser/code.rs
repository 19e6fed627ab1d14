//! CODE section, procedures, VAR declarations, and statements (spec.md §4.6).

use super::Parser;
use crate::ast::{AstNode, CaseBranch, NodeRef, Parameter, Procedure, StmtNode, Variable};
use crate::token::{Span, TokenKind};

impl Parser {
    /// Parses a `CODE { ... }` section body directly into the accumulators
    /// owned by `parse_object`, so top-level variables and `ELEMENTS`/`DATASET`
    /// extraction can be merged into one `CodeSection` regardless of which
    /// order those constructs appear in (spec.md §4.6).
    pub(crate) fn parse_code_section_body(
        &mut self,
        variables: &mut Vec<NodeRef>,
        procedures: &mut Vec<NodeRef>,
    ) -> Span {
        let start = self.current().start_offset;
        self.advance(); // CODE
        self.expect(TokenKind::LeftBrace, "{ to open CODE section");

        loop {
            match self.current_kind() {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Var => {
                    variables.extend(self.parse_var_decls());
                }
                TokenKind::Procedure | TokenKind::Local | TokenKind::Function => {
                    procedures.push(self.parse_procedure());
                }
                TokenKind::Begin => {
                    self.parse_block_statements();
                    self.eat(TokenKind::Dot);
                    self.eat(TokenKind::Semicolon);
                }
                _ if self.current_is_section_keyword() => {
                    let tok = self.current().clone();
                    self.error("Expected } to close CODE section", tok);
                    break;
                }
                _ => {
                    let tok = self.advance();
                    self.warn(format!("Skipping unexpected {:?} inside CODE section", tok.kind), tok);
                }
            }
        }

        Span::new(start, self.last_consumed_end(start))
    }

    // ---- VAR declarations ----

    pub(crate) fn parse_var_decls(&mut self) -> Vec<NodeRef> {
        self.advance(); // VAR
        let mut vars = Vec::new();
        while matches!(self.current_kind(), TokenKind::Identifier | TokenKind::QuotedIdentifier) {
            let group_start = self.current().start_offset;
            let mut names = vec![self.advance().value];
            while self.eat(TokenKind::Comma).is_some() {
                if matches!(self.current_kind(), TokenKind::Identifier | TokenKind::QuotedIdentifier) {
                    names.push(self.advance().value);
                } else {
                    break;
                }
            }
            self.expect(TokenKind::Colon, ": before a variable's type");
            let (data_type, is_temporary) = self.parse_type_spec_until(|k| matches!(k, TokenKind::Semicolon | TokenKind::Eof));
            let end = self.last_consumed_end(group_start);
            for name in names {
                let v = Variable {
                    name,
                    data_type: data_type.clone(),
                    is_temporary,
                    at_number: None,
                    span: Span::new(group_start, end),
                };
                vars.push(self.alloc(AstNode::Variable(v)));
            }
            self.eat(TokenKind::Semicolon);
        }
        vars
    }

    // ---- procedures ----

    fn parse_procedure(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        let is_local = self.eat(TokenKind::Local).is_some();
        self.advance(); // PROCEDURE / FUNCTION
        let name = match self.current_kind() {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => self.advance().value,
            _ => {
                let tok = self.current().clone();
                self.error("Expected a procedure name", tok);
                String::new()
            }
        };
        // Tolerate a legacy "@<id>" marker some exports carry after the name.
        if self.check(TokenKind::Unknown) && self.current().value == "@" {
            self.advance();
            self.eat(TokenKind::Integer);
        }

        let mut parameters = Vec::new();
        if self.eat(TokenKind::LeftParen).is_some() {
            if !self.check(TokenKind::RightParen) {
                loop {
                    parameters.push(self.parse_parameter());
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RightParen, ") to close parameter list");
        }

        let mut return_type = None;
        if self.eat(TokenKind::Colon).is_some() {
            let (text, _) = self.parse_type_spec_until(|k| {
                matches!(k, TokenKind::Semicolon | TokenKind::Var | TokenKind::Begin | TokenKind::Eof)
            });
            return_type = Some(text);
        }
        self.eat(TokenKind::Semicolon);

        let mut variables = Vec::new();
        while self.check(TokenKind::Var) {
            variables.extend(self.parse_var_decls());
        }

        let body = if self.check(TokenKind::Begin) {
            self.parse_block_statements()
        } else {
            Vec::new()
        };
        self.eat(TokenKind::Semicolon);

        let end = self.last_consumed_end(start);
        self.alloc(AstNode::Procedure(Procedure {
            name,
            is_local,
            parameters,
            return_type,
            variables,
            body,
            span: Span::new(start, end),
        }))
    }

    fn parse_parameter(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        let is_var = self.eat(TokenKind::Var).is_some();
        let name = match self.current_kind() {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => self.advance().value,
            _ => {
                let tok = self.current().clone();
                self.error("Expected a parameter name", tok);
                String::new()
            }
        };
        self.expect(TokenKind::Colon, ": before a parameter's type");
        let (data_type, _) =
            self.parse_type_spec_until(|k| matches!(k, TokenKind::Comma | TokenKind::RightParen | TokenKind::Eof));
        let end = self.last_consumed_end(start);
        self.alloc(AstNode::Parameter(Parameter {
            name,
            data_type,
            is_var,
            span: Span::new(start, end),
        }))
    }

    // ---- statements ----

    pub(crate) fn parse_block_statements(&mut self) -> Vec<NodeRef> {
        self.expect(TokenKind::Begin, "BEGIN");
        let mut statements = Vec::new();
        while !self.check(TokenKind::End) && !self.at_eof() {
            let before = self.mark();
            statements.push(self.parse_statement());
            self.force_progress(before);
            self.eat(TokenKind::Semicolon);
        }
        self.expect(TokenKind::End, "END to close BEGIN block");
        statements
    }

    fn parse_block(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        let statements = self.parse_block_statements();
        let end = self.last_consumed_end(start);
        self.alloc(AstNode::Stmt(StmtNode::BeginEnd {
            statements,
            span: Span::new(start, end),
        }))
    }

    fn parse_statement(&mut self) -> NodeRef {
        match self.current_kind() {
            TokenKind::Begin => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::For => self.parse_for(),
            TokenKind::With => self.parse_with(),
            TokenKind::Case => self.parse_case(),
            TokenKind::Exit => self.parse_exit(),
            TokenKind::Semicolon | TokenKind::End => {
                let tok = self.current().clone();
                self.alloc(AstNode::Stmt(StmtNode::Empty {
                    span: Span::new(tok.start_offset, tok.start_offset),
                }))
            }
            _ => self.parse_expression_or_assignment_statement(),
        }
    }

    /// Used where a statement is optional — after `THEN`/`DO`/etc. — per
    /// spec.md §4.6: an absent body becomes a zero-span `EmptyStatement`.
    fn parse_optional_statement(&mut self) -> NodeRef {
        if self.statement_follows() {
            self.parse_statement()
        } else {
            let tok = self.current().clone();
            self.alloc(AstNode::Stmt(StmtNode::Empty {
                span: Span::new(tok.start_offset, tok.start_offset),
            }))
        }
    }

    fn statement_follows(&self) -> bool {
        !matches!(
            self.current_kind(),
            TokenKind::Semicolon | TokenKind::End | TokenKind::Else | TokenKind::Until | TokenKind::Eof
        )
    }

    fn parse_if(&mut self) -> NodeRef {
        let start_tok = self.advance(); // IF
        let condition = self.parse_expression();
        self.expect(TokenKind::Then, "THEN after IF condition");
        let then_branch = self.parse_optional_statement();
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            Some(self.parse_optional_statement())
        } else {
            None
        };
        let end = self.node_span(else_branch.unwrap_or(then_branch)).end;
        self.alloc(AstNode::Stmt(StmtNode::If {
            condition,
            then_branch,
            else_branch,
            span: Span::new(start_tok.start_offset, end),
        }))
    }

    fn parse_while(&mut self) -> NodeRef {
        let start_tok = self.advance(); // WHILE
        let condition = self.parse_expression();
        self.expect(TokenKind::Do, "DO after WHILE condition");
        let body = self.parse_optional_statement();
        let end = self.node_span(body).end;
        self.alloc(AstNode::Stmt(StmtNode::While {
            condition,
            body,
            span: Span::new(start_tok.start_offset, end),
        }))
    }

    fn parse_repeat(&mut self) -> NodeRef {
        let start_tok = self.advance(); // REPEAT
        let mut body = Vec::new();
        while !self.check(TokenKind::Until) && !self.at_eof() {
            let before = self.mark();
            body.push(self.parse_statement());
            self.force_progress(before);
            self.eat(TokenKind::Semicolon);
        }
        self.expect(TokenKind::Until, "UNTIL to close REPEAT");
        let condition = self.parse_expression();
        let end = self.node_span(condition).end;
        self.alloc(AstNode::Stmt(StmtNode::Repeat {
            body,
            condition,
            span: Span::new(start_tok.start_offset, end),
        }))
    }

    fn parse_for(&mut self) -> NodeRef {
        let start_tok = self.advance(); // FOR
        let var = match self.current_kind() {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => self.advance().value,
            _ => {
                let tok = self.current().clone();
                self.error("Expected a loop variable", tok);
                String::new()
            }
        };
        self.expect(TokenKind::Assign, ":= after FOR loop variable");
        let from = self.parse_expression();
        let downto = if self.eat(TokenKind::Downto).is_some() {
            true
        } else {
            self.expect(TokenKind::To, "TO or DOWNTO");
            false
        };
        let to = self.parse_expression();
        self.expect(TokenKind::Do, "DO after FOR range");
        let body = self.parse_optional_statement();
        let end = self.node_span(body).end;
        self.alloc(AstNode::Stmt(StmtNode::For {
            var,
            from,
            to,
            downto,
            body,
            span: Span::new(start_tok.start_offset, end),
        }))
    }

    fn parse_with(&mut self) -> NodeRef {
        let start_tok = self.advance(); // WITH
        let target = self.parse_expression();
        self.expect(TokenKind::Do, "DO after WITH target");
        let body = self.parse_optional_statement();
        let end = self.node_span(body).end;
        self.alloc(AstNode::Stmt(StmtNode::With {
            target,
            body,
            span: Span::new(start_tok.start_offset, end),
        }))
    }

    fn parse_case(&mut self) -> NodeRef {
        let start_tok = self.advance(); // CASE
        let subject = self.parse_expression();
        self.expect(TokenKind::Of, "OF after CASE subject");
        let mut branches = Vec::new();
        let mut else_branch = None;
        loop {
            if self.check(TokenKind::End) || self.at_eof() {
                break;
            }
            if self.eat(TokenKind::Else).is_some() {
                else_branch = Some(self.parse_optional_statement());
                self.eat(TokenKind::Semicolon);
                break;
            }
            let before = self.mark();
            let mut labels = vec![self.parse_case_label()];
            while self.eat(TokenKind::Comma).is_some() {
                labels.push(self.parse_case_label());
            }
            self.expect(TokenKind::Colon, ": after CASE label");
            let body = self.parse_optional_statement();
            branches.push(CaseBranch { labels, body });
            self.eat(TokenKind::Semicolon);
            self.force_progress(before);
        }
        let end_tok = self.expect(TokenKind::End, "END to close CASE");
        let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
        self.alloc(AstNode::Stmt(StmtNode::Case {
            subject,
            branches,
            else_branch,
            span: Span::new(start_tok.start_offset, end),
        }))
    }

    fn parse_exit(&mut self) -> NodeRef {
        let start_tok = self.advance(); // EXIT
        let mut end = start_tok.end_offset;
        let mut value = None;
        if self.eat(TokenKind::LeftParen).is_some() {
            if !self.check(TokenKind::RightParen) {
                let v = self.parse_expression();
                end = self.node_span(v).end;
                value = Some(v);
            }
            if let Some(tok) = self.expect(TokenKind::RightParen, ") to close EXIT value") {
                end = tok.end_offset;
            }
        }
        self.alloc(AstNode::Stmt(StmtNode::Exit {
            value,
            span: Span::new(start_tok.start_offset, end),
        }))
    }

    fn parse_expression_or_assignment_statement(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        let expr = self.parse_expression();
        if self.eat(TokenKind::Assign).is_some() {
            let value = self.parse_expression();
            let end = self.node_span(value).end;
            self.alloc(AstNode::Stmt(StmtNode::Assignment {
                target: expr,
                value,
                span: Span::new(start, end),
            }))
        } else {
            let end = self.node_span(expr).end;
            self.alloc(AstNode::Stmt(StmtNode::ExpressionStatement {
                expr,
                span: Span::new(start, end),
            }))
        }
    }
}
