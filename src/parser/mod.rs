//! Recursive-descent parser: entry point, section dispatch, and recovery
//! primitives (spec.md §4.6). Grounded on the donor's `src/parser/mod.rs`
//! split-by-grammar-area pattern and its never-throws contract.

pub mod code;
pub mod elements;
pub mod expr;
pub mod fields;
pub mod object;

pub(crate) use elements::ElementsSectionKind;

use crate::ast::{Ast, AstNode, CALDocument, NodeRef};
use crate::diagnostic::Diagnostic;
use crate::keywords::is_section_keyword;
use crate::token::{Span, Token, TokenKind};

/// Parser-tunable limits (spec.md §9: "an explicit expression-depth counter
/// with a diagnostic at an arbitrary large limit... prevents pathological
/// inputs from overflowing").
#[derive(Debug, Clone, Copy)]
pub struct ParserConfig {
    pub max_expression_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_expression_depth: 512,
        }
    }
}

/// Never panics and never loops without making progress: every loop that
/// might fail to consume a token has an explicit single-token skip guard
/// (spec.md §4.6, "Error recovery").
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    ast: Ast,
    diagnostics: Vec<Diagnostic>,
    config: ParserConfig,
    expr_depth: usize,
    /// `Variable`s extracted from Query `ELEMENTS` / Report `DATASET` rows
    /// (spec.md §4.6), appended to the object's `code.variables` once the
    /// whole object has been parsed, regardless of section order.
    pending_elements_vars: Vec<NodeRef>,
}

pub fn parse(tokens: Vec<Token>) -> (Ast, Vec<Diagnostic>) {
    parse_with_config(tokens, ParserConfig::default())
}

pub fn parse_with_config(tokens: Vec<Token>, config: ParserConfig) -> (Ast, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens, config);
    parser.parse_document();
    (parser.ast, parser.diagnostics)
}

impl Parser {
    fn new(tokens: Vec<Token>, config: ParserConfig) -> Self {
        let tokens = if tokens.is_empty() {
            vec![Token::eof(1, 1, 0)]
        } else {
            tokens
        };
        Parser {
            tokens,
            pos: 0,
            ast: Ast::new(),
            diagnostics: Vec::new(),
            config,
            expr_depth: 0,
            pending_elements_vars: Vec::new(),
        }
    }

    // ---- cursor ----

    pub(crate) fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream is never empty"))
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    pub(crate) fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consumes `kind` if present; otherwise records a diagnostic and leaves
    /// the cursor untouched so the caller can synchronize (spec.md §4.6
    /// parsePrimary fallback rule, generalized to every `expect`-style call).
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if let Some(tok) = self.eat(kind) {
            Some(tok)
        } else {
            let tok = self.current().clone();
            self.error(format!("Expected {what}"), tok);
            None
        }
    }

    pub(crate) fn error(&mut self, message: impl Into<String>, token: Token) {
        self.diagnostics.push(Diagnostic::error(message, token));
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>, token: Token) {
        self.diagnostics.push(Diagnostic::warning(message, token));
    }

    pub(crate) fn alloc(&self, node: AstNode) -> NodeRef {
        self.ast.alloc(node)
    }

    pub(crate) fn node_span(&self, id: NodeRef) -> Span {
        match self.ast.get(id) {
            AstNode::Expr(e) => e.span(),
            AstNode::Stmt(s) => s.span(),
            _ => Span::new(0, 0),
        }
    }

    pub(crate) fn last_consumed_end(&self, fallback: usize) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.end_offset)
            .unwrap_or(fallback)
    }

    pub(crate) fn current_is_section_keyword(&self) -> bool {
        is_section_keyword(&self.current().value) || self.check(TokenKind::Code)
    }

    /// Reads tokens up to (not including) the first one matching `stop`,
    /// joining their `value`s with a single space wherever source had any
    /// whitespace between them and no space where they were adjacent
    /// (spec.md §4.6, "Property value whitespace").
    pub(crate) fn join_tokens_until(&mut self, stop: impl Fn(TokenKind) -> bool) -> String {
        let mut out = String::new();
        let mut prev_end: Option<usize> = None;
        while !stop(self.current_kind()) && !self.at_eof() {
            let tok = self.advance();
            if let Some(prev_end) = prev_end {
                if tok.start_offset > prev_end {
                    out.push(' ');
                }
            }
            out.push_str(&tok.value);
            prev_end = Some(tok.end_offset);
        }
        out
    }

    pub(crate) fn parse_type_spec_until(&mut self, stop: impl Fn(TokenKind) -> bool) -> (String, bool) {
        let text = self.join_tokens_until(stop);
        let is_temporary = text.split_whitespace().any(|w| w.eq_ignore_ascii_case("TEMPORARY"));
        (text, is_temporary)
    }

    pub(crate) fn parse_uint_field(&mut self) -> u32 {
        if let Some(tok) = self.eat(TokenKind::Integer) {
            tok.value.parse().unwrap_or(0)
        } else {
            let tok = self.current().clone();
            self.error("Expected an integer", tok);
            0
        }
    }

    /// The field row's second column: empty (immediately `;`) or a single
    /// legacy flag token. Presence of any token there is treated as "set".
    pub(crate) fn parse_enabled_flag(&mut self) -> bool {
        if self.check(TokenKind::Semicolon) {
            false
        } else {
            self.advance();
            true
        }
    }

    pub(crate) fn parse_comma_field_list(&mut self, stop: TokenKind) -> Vec<String> {
        let mut fields = Vec::new();
        if self.current_kind() == stop {
            return fields;
        }
        loop {
            let name = self.join_tokens_until(move |k| k == TokenKind::Comma || k == stop || k == TokenKind::Eof);
            if !name.is_empty() {
                fields.push(name);
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        fields
    }

    /// Records the cursor position before a sub-parse that must make
    /// progress; pair with [`Parser::force_progress`].
    pub(crate) fn mark(&self) -> usize {
        self.pos
    }

    /// If the cursor hasn't moved since `before`, force-skips one token so
    /// the enclosing loop can't spin forever on the same bad input.
    pub(crate) fn force_progress(&mut self, before: usize) {
        if self.pos == before && !self.at_eof() {
            let tok = self.advance();
            self.warn(format!("Skipping unexpected {:?} to avoid a stalled parse", tok.kind), tok);
        }
    }

    pub(crate) fn skip_one_column(&mut self) {
        while !matches!(self.current_kind(), TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof) {
            self.advance();
        }
    }

    fn parse_document(&mut self) {
        let start = self.current().start_offset;
        let object = self.parse_top_level();
        let end_offset = self.tokens.last().map(|t| t.end_offset).unwrap_or(start);
        let doc = CALDocument {
            object,
            start_offset: start,
            end_offset,
        };
        let root = self.alloc(AstNode::Document(doc));
        self.ast.root = Some(root);
    }

    /// Skips tokens until `OBJECT` or EOF (spec.md §4.6's top-level recovery
    /// rule). Returns the parsed object, if one was found.
    fn parse_top_level(&mut self) -> Option<NodeRef> {
        loop {
            match self.current_kind() {
                TokenKind::Eof => return None,
                TokenKind::Object => return Some(self.parse_object()),
                _ => {
                    let tok = self.advance();
                    self.warn(format!("Skipping unexpected {:?} at top level", tok.kind), tok);
                }
            }
        }
    }
}
