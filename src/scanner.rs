//! The context-aware scanner (spec.md §4.1–§4.3). This is the crate's
//! hardest-working module: tokenization of identical text depends on the
//! `ContextStack`/`ContextFlags` state threaded through every call to
//! `next_token`.
//!
//! Grounded on the donor's `Lexer`/`LineLexer` dispatch-table shape
//! (`src/lexer.rs`), rebuilt single-stage since C/AL has no
//! significant-indentation layer to split out as a separate pass.

use crate::context::{ContextFlags, ContextStack, ContextState, FieldDefColumn, LexMode, SectionType};
use crate::keywords::lookup_plain;
use crate::token::{Token, TokenKind};
use crate::trace::{ContextEventKind, TraceEvent, TraceSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeftBraceAction {
    Comment,
    ObjectOpen,
    SectionOpen(SectionKw),
    RowOpen,
    Bare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKw {
    Properties,
    Code,
    Generic(SectionType),
}

pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    context: ContextStack,
    flags: ContextFlags,
    trace: TraceSink,
    last_token_kind: Option<TokenKind>,
    header_history: [Option<TokenKind>; 4],
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            context: ContextStack::new(),
            flags: ContextFlags::new(),
            trace: TraceSink::none(),
            last_token_kind: None,
            header_history: [None; 4],
        }
    }

    pub fn with_trace(source: &'a str, callback: Box<dyn FnMut(TraceEvent)>) -> Self {
        let mut scanner = Scanner::new(source);
        scanner.trace = TraceSink::new(Some(callback));
        scanner
    }

    pub fn context_state(&self) -> ContextState {
        ContextState {
            context_stack: self.context.as_strings(),
            brace_depth: self.flags.brace_depth,
            bracket_depth: self.flags.bracket_depth,
            in_property_value: self.flags.in_property_value,
            field_def_column: self.flags.field_def_column.as_str(),
            current_section_type: self.flags.current_section_type.map(SectionType::as_str),
            context_underflow_detected: self.context.underflow_detected(),
        }
    }

    /// Resets per-scan state (spec.md §3 lifecycle: "context is reset on
    /// each new tokenize() call") and returns the whole token stream.
    pub fn tokenize(&mut self) -> Vec<Token> {
        self.pos = 0;
        self.line = 1;
        self.column = 1;
        self.context = ContextStack::new();
        self.flags = ContextFlags::new();
        self.last_token_kind = None;
        self.header_history = [None; 4];
        self.trace.reset_for_new_scan();

        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            self.trace.emit(TraceEvent::Token {
                kind: token_kind_name(tok.kind),
                line: tok.line,
                column: tok.column,
            });
            self.remember_token(tok.kind);
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn remember_token(&mut self, kind: TokenKind) {
        self.last_token_kind = Some(kind);
        self.header_history.rotate_left(1);
        self.header_history[3] = Some(kind);
    }

    fn saw_object_header(&self) -> bool {
        matches!(
            self.header_history,
            [Some(TokenKind::Object), Some(k), Some(TokenKind::Integer), Some(TokenKind::Identifier)]
                | [Some(TokenKind::Object), Some(k), Some(TokenKind::Integer), Some(TokenKind::QuotedIdentifier)]
                if k.is_type_spelling_word()
        )
    }

    // ---- low-level cursor helpers ----

    fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push_context(&mut self, mode: LexMode) {
        self.context.push(mode);
        self.trace.emit(TraceEvent::Context {
            kind: ContextEventKind::Push,
            mode: mode.as_str(),
            line: self.line,
            column: self.column,
        });
    }

    fn pop_context(&mut self) {
        let popped = self.context.pop();
        self.trace.emit(TraceEvent::Context {
            kind: ContextEventKind::Pop,
            mode: popped.map(LexMode::as_str).unwrap_or(LexMode::Normal.as_str()),
            line: self.line,
            column: self.column,
        });
    }

    /// Emits `flag-change` (spec.md §4.4) for any `ContextFlags` mutation,
    /// a no-op when `old == new` so e.g. a saturating decrement at zero
    /// doesn't generate noise.
    fn emit_flag_change(&mut self, flag: &'static str, old: &str, new: &str) {
        if old == new {
            return;
        }
        self.trace.emit(TraceEvent::FlagChange {
            flag,
            old: old.to_string(),
            new: new.to_string(),
            line: self.line,
            column: self.column,
        });
    }

    // ---- trivia ----

    /// Decides, without consuming anything, what a `{` at the cursor means.
    fn classify_left_brace(&self) -> LeftBraceAction {
        if self.saw_object_header() && self.context.top() == LexMode::Normal {
            return LeftBraceAction::ObjectOpen;
        }
        if self.context.top() == LexMode::ObjectLevel && self.flags.current_section_type.is_none() {
            if let Some(kw) = self.last_token_kind.and_then(section_kw_for_token) {
                return LeftBraceAction::SectionOpen(kw);
            }
        }
        if self.context.top() == LexMode::ObjectLevel
            && self.flags.current_section_type.is_some()
            && self.flags.field_def_column == FieldDefColumn::None
        {
            return LeftBraceAction::RowOpen;
        }
        match self.context.top() {
            LexMode::String | LexMode::MlBracket => LeftBraceAction::Bare,
            _ => LeftBraceAction::Comment,
        }
    }

    /// Skips whitespace and trivia comments. Returns `Some(token)` only when
    /// an unterminated comment must surface as an `Unknown` token
    /// (spec.md §4.3.6/§4.3.7).
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            while let Some(c) = self.peek() {
                if c.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }
            if self.at_eof() {
                return None;
            }
            let top = self.context.top();
            let c = self.peek().unwrap();
            let c2 = self.peek_at(1);

            if top != LexMode::MlBracket && c == '/' && c2 == Some('/') {
                self.advance();
                self.advance();
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            if top != LexMode::MlBracket && c == '/' && c2 == Some('*') {
                let start_line = self.line;
                let start_col = self.column;
                let start = self.pos;
                self.advance();
                self.advance();
                let mut closed = false;
                while let Some(ch) = self.peek() {
                    if ch == '*' && self.peek_at(1) == Some('/') {
                        self.advance();
                        self.advance();
                        closed = true;
                        break;
                    }
                    self.advance();
                }
                if !closed {
                    return Some(Token::new(
                        TokenKind::Unknown,
                        &self.source[start..self.pos],
                        start_line,
                        start_col,
                        start,
                        self.pos,
                    ));
                }
                continue;
            }

            if c == '{' && self.classify_left_brace() == LeftBraceAction::Comment {
                let start_line = self.line;
                let start_col = self.column;
                let start = self.pos;
                self.advance();
                let mut closed = false;
                while let Some(ch) = self.peek() {
                    if ch == '}' {
                        self.advance();
                        closed = true;
                        break;
                    }
                    self.advance();
                }
                if !closed {
                    return Some(Token::new(
                        TokenKind::Unknown,
                        &self.source[start..self.pos],
                        start_line,
                        start_col,
                        start,
                        self.pos,
                    ));
                }
                continue;
            }

            break;
        }
        None
    }

    // ---- main dispatch ----

    pub fn next_token(&mut self) -> Token {
        if let Some(unknown) = self.skip_trivia() {
            return unknown;
        }
        let start = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let Some(c) = self.peek() else {
            return Token::eof(self.line, self.column, self.pos);
        };

        let kind = if c.is_ascii_digit() {
            return self.scan_number(start, start_line, start_col);
        } else if c == '\'' {
            return self.scan_string(start, start_line, start_col);
        } else if c == '"' {
            return self.scan_quoted_identifier(start, start_line, start_col);
        } else if is_ident_start(c) {
            return self.scan_word(start, start_line, start_col);
        } else {
            self.scan_punct(c)
        };

        let end = self.pos;
        Token::new(kind, &self.source[start..end], start_line, start_col, start, end)
    }

    fn scan_punct(&mut self, c: char) -> TokenKind {
        match c {
            '{' => {
                let action = self.classify_left_brace();
                self.advance();
                self.apply_left_brace(action)
            }
            '}' => {
                self.advance();
                self.apply_right_brace()
            }
            '[' => {
                self.advance();
                let old = self.flags.bracket_depth;
                self.flags.bracket_depth += 1;
                self.emit_flag_change("bracket_depth", &old.to_string(), &self.flags.bracket_depth.to_string());
                if self.flags.in_property_value {
                    self.push_context(LexMode::MlBracket);
                }
                TokenKind::LeftBracket
            }
            ']' => {
                self.advance();
                let old = self.flags.bracket_depth;
                self.flags.bracket_depth = self.flags.bracket_depth.saturating_sub(1);
                self.emit_flag_change("bracket_depth", &old.to_string(), &self.flags.bracket_depth.to_string());
                if self.context.top() == LexMode::MlBracket {
                    self.pop_context();
                }
                TokenKind::RightBracket
            }
            '(' => {
                self.advance();
                TokenKind::LeftParen
            }
            ')' => {
                self.advance();
                TokenKind::RightParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ';' => {
                self.advance();
                self.apply_semicolon()
            }
            ':' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Assign
                } else if self.peek() == Some(':') {
                    self.advance();
                    TokenKind::DoubleColon
                } else {
                    TokenKind::Colon
                }
            }
            '.' => {
                self.advance();
                if self.peek() == Some('.') {
                    self.advance();
                    TokenKind::DotDot
                } else {
                    TokenKind::Dot
                }
            }
            '+' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::MultiplyAssign
                } else {
                    TokenKind::Multiply
                }
            }
            '/' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::DivideAssign
                } else {
                    TokenKind::Divide
                }
            }
            '=' => {
                self.advance();
                self.maybe_enter_property_value();
                TokenKind::Equal
            }
            '<' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        TokenKind::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        TokenKind::NotEqual
                    }
                    _ => TokenKind::Less,
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            _ => {
                self.advance();
                TokenKind::Unknown
            }
        }
    }

    fn apply_left_brace(&mut self, action: LeftBraceAction) -> TokenKind {
        if action != LeftBraceAction::Comment {
            let old = self.flags.brace_depth;
            self.flags.brace_depth += 1;
            self.emit_flag_change("brace_depth", &old.to_string(), &self.flags.brace_depth.to_string());
        }
        match action {
            LeftBraceAction::ObjectOpen => {
                self.push_context(LexMode::ObjectLevel);
            }
            LeftBraceAction::SectionOpen(SectionKw::Properties) => {
                self.push_context(LexMode::Properties);
            }
            LeftBraceAction::SectionOpen(SectionKw::Code) => {
                self.push_context(LexMode::CodeBlock);
                let old = self.flags.code_block_depth;
                self.flags.code_block_depth = 0;
                self.emit_flag_change("code_block_depth", &old.to_string(), "0");
            }
            LeftBraceAction::SectionOpen(SectionKw::Generic(section)) => {
                let old = self.flags.current_section_type.map(SectionType::as_str).unwrap_or("NONE");
                self.flags.current_section_type = Some(section);
                self.emit_flag_change("current_section_type", old, section.as_str());
            }
            LeftBraceAction::RowOpen => {
                self.push_context(LexMode::FieldDef);
                let old = self.flags.field_def_column.as_str();
                self.flags.enter_field_row();
                self.emit_flag_change("field_def_column", old, self.flags.field_def_column.as_str());
            }
            LeftBraceAction::Comment | LeftBraceAction::Bare => {}
        }
        TokenKind::LeftBrace
    }

    fn apply_right_brace(&mut self) -> TokenKind {
        if self.context.top() != LexMode::Normal {
            let old = self.flags.brace_depth;
            self.flags.brace_depth = self.flags.brace_depth.saturating_sub(1);
            self.emit_flag_change("brace_depth", &old.to_string(), &self.flags.brace_depth.to_string());
        }
        match self.context.top() {
            LexMode::FieldDef => {
                self.pop_context();
                let old = self.flags.field_def_column.as_str();
                self.flags.exit_field_row();
                self.emit_flag_change("field_def_column", old, self.flags.field_def_column.as_str());
                self.emit_flag_change("in_property_value", &self.flags.in_property_value.to_string(), "false");
                self.flags.in_property_value = false;
                TokenKind::RightBrace
            }
            LexMode::CodeBlock => {
                if self.flags.code_block_depth == 0 {
                    self.pop_context();
                }
                TokenKind::RightBrace
            }
            LexMode::Properties => {
                self.pop_context();
                self.emit_flag_change("in_property_value", &self.flags.in_property_value.to_string(), "false");
                self.flags.in_property_value = false;
                TokenKind::RightBrace
            }
            LexMode::ObjectLevel => {
                if self.flags.current_section_type.is_some() {
                    let old_section = self.flags.current_section_type.map(SectionType::as_str).unwrap_or("NONE");
                    self.flags.current_section_type = None;
                    self.emit_flag_change("current_section_type", old_section, "NONE");
                    self.emit_flag_change("in_property_value", &self.flags.in_property_value.to_string(), "false");
                    self.flags.in_property_value = false;
                    TokenKind::RightBrace
                } else {
                    self.pop_context();
                    TokenKind::RightBrace
                }
            }
            LexMode::Normal => TokenKind::Unknown,
            _ => {
                self.pop_context();
                TokenKind::RightBrace
            }
        }
    }

    fn apply_semicolon(&mut self) -> TokenKind {
        if self.context.top() == LexMode::FieldDef {
            let old = self.flags.field_def_column.as_str();
            self.flags.advance_field_column();
            self.emit_flag_change("field_def_column", old, self.flags.field_def_column.as_str());
        }
        if self.flags.bracket_depth == 0 {
            self.emit_flag_change("in_property_value", &self.flags.in_property_value.to_string(), "false");
            self.flags.in_property_value = false;
        }
        TokenKind::Semicolon
    }

    fn maybe_enter_property_value(&mut self) {
        let in_properties_row = self.context.top() == LexMode::Properties;
        let in_field_properties = self.context.top() == LexMode::FieldDef
            && self.flags.field_def_column == FieldDefColumn::Properties;
        if in_properties_row || in_field_properties {
            self.emit_flag_change("in_property_value", &self.flags.in_property_value.to_string(), "true");
            self.flags.in_property_value = true;
        }
    }

    // ---- numbers, including date/time literals ----

    fn scan_number(&mut self, start: usize, line: usize, col: usize) -> Token {
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let digit_len = self.pos - digits_start;

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            return self.make_token(TokenKind::Decimal, start, line, col);
        }

        match self.peek() {
            Some(c) if (c == 'D' || c == 'd') && is_date_like_len(digit_len) => {
                self.advance();
                let after_d = self.pos;
                let time_digits_start = self.pos;
                let mut n = 0;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                    n += 1;
                }
                let time_digit_len = self.pos - time_digits_start;
                if n > 0
                    && is_time_like_len(time_digit_len)
                    && matches!(self.peek(), Some('T') | Some('t'))
                {
                    self.advance();
                    self.make_token(TokenKind::DateTime, start, line, col)
                } else {
                    // rollback: the trailing digits (if any) are not a valid
                    // time suffix; they belong to the next token.
                    self.rewind_to(after_d);
                    self.make_token(TokenKind::Date, start, line, col)
                }
            }
            Some(c) if (c == 'T' || c == 't') && is_time_like_len(digit_len) => {
                self.advance();
                self.make_token(TokenKind::Time, start, line, col)
            }
            _ => self.make_token(TokenKind::Integer, start, line, col),
        }
    }

    fn rewind_to(&mut self, target: usize) {
        while self.pos > target {
            // Walk back one char at a time so line/column stay correct;
            // target is always a previously-visited position on the same line.
            self.pos -= 1;
            if self.bytes[self.pos] == b'\n' {
                self.line -= 1;
            } else {
                self.column -= 1;
            }
        }
    }

    fn make_token(&self, kind: TokenKind, start: usize, line: usize, col: usize) -> Token {
        Token::new(kind, &self.source[start..self.pos], line, col, start, self.pos)
    }

    // ---- strings and quoted identifiers ----

    fn scan_string(&mut self, start: usize, line: usize, col: usize) -> Token {
        self.push_context(LexMode::String);
        self.advance(); // opening '
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    self.pop_context();
                    return self.make_token(TokenKind::Unknown, start, line, col);
                }
                Some('\'') => {
                    if self.peek_at(1) == Some('\'') {
                        value.push('\'');
                        self.advance();
                        self.advance();
                    } else {
                        self.advance();
                        self.pop_context();
                        let end = self.pos;
                        return Token::new(TokenKind::String, value, line, col, start, end);
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_quoted_identifier(&mut self, start: usize, line: usize, col: usize) -> Token {
        self.advance(); // opening "
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return self.make_token(TokenKind::Unknown, start, line, col);
                }
                Some('"') => {
                    self.advance();
                    let end = self.pos;
                    return Token::new(TokenKind::QuotedIdentifier, value, line, col, start, end);
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    // ---- words: keywords, types, identifiers, compound tokens ----

    fn scan_word(&mut self, start: usize, line: usize, col: usize) -> Token {
        self.consume_ident_chars();
        let word = &self.source[start..self.pos];

        if self.flags.field_def_column == FieldDefColumn::Col3 {
            return self.make_token(TokenKind::Identifier, start, line, col);
        }

        if let Some(tok) = self.try_compound(word, start, line, col) {
            return tok;
        }

        let upper = word.to_ascii_uppercase();
        let kind = match upper.as_str() {
            "BEGIN" => {
                if self.context.top() == LexMode::CodeBlock {
                    let old = self.flags.code_block_depth;
                    self.flags.code_block_depth += 1;
                    self.emit_flag_change("code_block_depth", &old.to_string(), &self.flags.code_block_depth.to_string());
                }
                self.emit_flag_change("in_declaration_list", &self.flags.in_declaration_list.to_string(), "false");
                self.flags.in_declaration_list = false;
                TokenKind::Begin
            }
            "END" => {
                if self.context.top() == LexMode::CodeBlock {
                    let old = self.flags.code_block_depth;
                    self.flags.code_block_depth = self.flags.code_block_depth.saturating_sub(1);
                    self.emit_flag_change("code_block_depth", &old.to_string(), &self.flags.code_block_depth.to_string());
                }
                TokenKind::End
            }
            "CASE" => {
                if self.context.top() == LexMode::CodeBlock {
                    let old = self.flags.code_block_depth;
                    self.flags.code_block_depth += 1;
                    self.emit_flag_change("code_block_depth", &old.to_string(), &self.flags.code_block_depth.to_string());
                }
                TokenKind::Case
            }
            "REPEAT" => {
                if self.context.top() == LexMode::CodeBlock {
                    let old = self.flags.code_block_depth;
                    self.flags.code_block_depth += 1;
                    self.emit_flag_change("code_block_depth", &old.to_string(), &self.flags.code_block_depth.to_string());
                }
                TokenKind::Repeat
            }
            "UNTIL" => {
                if self.context.top() == LexMode::CodeBlock {
                    let old = self.flags.code_block_depth;
                    self.flags.code_block_depth = self.flags.code_block_depth.saturating_sub(1);
                    self.emit_flag_change("code_block_depth", &old.to_string(), &self.flags.code_block_depth.to_string());
                }
                TokenKind::Until
            }
            "VAR" => {
                self.emit_flag_change("in_declaration_list", &self.flags.in_declaration_list.to_string(), "true");
                self.flags.in_declaration_list = true;
                TokenKind::Var
            }
            "PROCEDURE" => {
                self.emit_flag_change("in_declaration_list", &self.flags.in_declaration_list.to_string(), "true");
                self.flags.in_declaration_list = true;
                TokenKind::Procedure
            }
            "CODE" => self.classify_code_word(),
            "DATE" => self.classify_type_word(TokenKind::DateType),
            "TIME" => self.classify_type_word(TokenKind::TimeType),
            "BOOLEAN" => self.classify_type_word(TokenKind::Boolean),
            _ => lookup_plain(word).unwrap_or(TokenKind::Identifier),
        };
        self.make_token(kind, start, line, col)
    }

    fn consume_ident_chars(&mut self) {
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
    }

    /// True in a `VAR`/parameter-list/return-type position (spec.md §4.3
    /// rule 1): a `:`/`OF` only counts when `in_declaration_list` is set,
    /// so the same preceding `Colon` from a `CASE` label or a `<label> :`
    /// doesn't get mistaken for a declaration colon.
    fn is_declaration_type_position(&self) -> bool {
        (self.flags.in_declaration_list
            && matches!(self.last_token_kind, Some(TokenKind::Colon) | Some(TokenKind::Of)))
            || self.flags.field_def_column == FieldDefColumn::Col4
    }

    fn classify_type_word(&self, type_kind: TokenKind) -> TokenKind {
        if self.is_declaration_type_position() {
            return type_kind;
        }
        let in_property_space = self.context.top() == LexMode::Properties
            || (self.context.top() == LexMode::FieldDef
                && self.flags.field_def_column == FieldDefColumn::Properties);
        if in_property_space {
            type_kind
        } else {
            TokenKind::Identifier
        }
    }

    fn classify_code_word(&mut self) -> TokenKind {
        if self.is_declaration_type_position() {
            return TokenKind::CodeType;
        }
        if self.context.top() == LexMode::ObjectLevel
            && self.flags.current_section_type.is_none()
            && self.next_significant_char_is_left_brace()
        {
            return TokenKind::Code;
        }
        let in_property_space = self.context.top() == LexMode::Properties
            || (self.context.top() == LexMode::FieldDef
                && self.flags.field_def_column == FieldDefColumn::Properties);
        if in_property_space {
            TokenKind::CodeType
        } else {
            TokenKind::Identifier
        }
    }

    /// Cheap, non-destructive lookahead used only to disambiguate `CODE` as
    /// a section keyword: true if the next non-whitespace, non-comment
    /// character is `{`.
    fn next_significant_char_is_left_brace(&self) -> bool {
        let mut i = self.pos;
        let bytes = self.bytes;
        loop {
            while i < bytes.len() && (bytes[i] as char).is_whitespace() {
                i += 1;
            }
            if i + 1 < bytes.len() && bytes[i] == b'/' && bytes[i + 1] == b'/' {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            if i + 1 < bytes.len() && bytes[i] == b'/' && bytes[i + 1] == b'*' {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                continue;
            }
            break;
        }
        i < bytes.len() && bytes[i] == b'{'
    }

    fn try_compound(&mut self, word: &str, start: usize, line: usize, col: usize) -> Option<Token> {
        let upper = word.to_ascii_uppercase();
        let (connector, tail, kind) = match upper.as_str() {
            "OBJECT" => ('-', "PROPERTIES", TokenKind::ObjectProperties),
            "FORMAT" => ('/', "EVALUATE", TokenKind::FormatEvaluate),
            _ => return None,
        };
        if self.peek() != Some(connector) {
            return None;
        }
        let after_connector = self.pos + connector.len_utf8();
        let tail_text: String = self.source[after_connector..]
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if tail_text.to_ascii_uppercase() != tail {
            return None;
        }
        // Commit: consume connector + tail.
        self.advance();
        for _ in 0..tail_text.chars().count() {
            self.advance();
        }
        Some(self.make_token(kind, start, line, col))
    }
}

fn section_kw_for_token(kind: TokenKind) -> Option<SectionKw> {
    match kind {
        TokenKind::Properties => Some(SectionKw::Properties),
        TokenKind::Code => Some(SectionKw::Code),
        TokenKind::Fields => Some(SectionKw::Generic(SectionType::Fields)),
        TokenKind::Keys => Some(SectionKw::Generic(SectionType::Keys)),
        TokenKind::FieldGroups => Some(SectionKw::Generic(SectionType::FieldGroups)),
        TokenKind::Controls => Some(SectionKw::Generic(SectionType::Controls)),
        TokenKind::Actions => Some(SectionKw::Generic(SectionType::Actions)),
        TokenKind::Elements => Some(SectionKw::Generic(SectionType::Elements)),
        TokenKind::Dataset => Some(SectionKw::Generic(SectionType::Dataset)),
        TokenKind::RequestPage => Some(SectionKw::Generic(SectionType::RequestPage)),
        TokenKind::Labels => Some(SectionKw::Generic(SectionType::Labels)),
        _ => None,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_date_like_len(len: usize) -> bool {
    len == 6 || len == 8
}

fn is_time_like_len(len: usize) -> bool {
    len == 6 || len == 9
}

pub fn token_kind_name(kind: TokenKind) -> &'static str {
    // Only used for trace events; a plain Debug-derived string would leak
    // the private enum's representation into the public trace API, so we
    // keep an explicit table instead.
    match kind {
        TokenKind::LeftBrace => "LeftBrace",
        TokenKind::RightBrace => "RightBrace",
        TokenKind::LeftBracket => "LeftBracket",
        TokenKind::RightBracket => "RightBracket",
        TokenKind::LeftParen => "LeftParen",
        TokenKind::RightParen => "RightParen",
        TokenKind::Comma => "Comma",
        TokenKind::Semicolon => "Semicolon",
        TokenKind::Colon => "Colon",
        TokenKind::DoubleColon => "DoubleColon",
        TokenKind::Dot => "Dot",
        TokenKind::DotDot => "DotDot",
        TokenKind::Plus => "Plus",
        TokenKind::Minus => "Minus",
        TokenKind::Multiply => "Multiply",
        TokenKind::Divide => "Divide",
        TokenKind::Assign => "Assign",
        TokenKind::DivideAssign => "DivideAssign",
        TokenKind::PlusAssign => "PlusAssign",
        TokenKind::MinusAssign => "MinusAssign",
        TokenKind::MultiplyAssign => "MultiplyAssign",
        TokenKind::Equal => "Equal",
        TokenKind::NotEqual => "NotEqual",
        TokenKind::Less => "Less",
        TokenKind::LessEqual => "LessEqual",
        TokenKind::Greater => "Greater",
        TokenKind::GreaterEqual => "GreaterEqual",
        TokenKind::And => "And",
        TokenKind::Or => "Or",
        TokenKind::Xor => "Xor",
        TokenKind::Not => "Not",
        TokenKind::Div => "Div",
        TokenKind::Mod => "Mod",
        TokenKind::In => "In",
        TokenKind::ObjectProperties => "ObjectProperties",
        TokenKind::FormatEvaluate => "FormatEvaluate",
        TokenKind::Object => "Object",
        TokenKind::Table => "Table",
        TokenKind::Page => "Page",
        TokenKind::Codeunit => "Codeunit",
        TokenKind::Report => "Report",
        TokenKind::Query => "Query",
        TokenKind::XmlPort => "XMLport",
        TokenKind::MenuSuite => "MenuSuite",
        TokenKind::Properties => "Properties",
        TokenKind::Fields => "Fields",
        TokenKind::Keys => "Keys",
        TokenKind::FieldGroups => "FieldGroups",
        TokenKind::Controls => "Controls",
        TokenKind::Actions => "Actions",
        TokenKind::Elements => "Elements",
        TokenKind::Dataset => "Dataset",
        TokenKind::RequestPage => "RequestPage",
        TokenKind::Labels => "Labels",
        TokenKind::Code => "Code",
        TokenKind::Var => "Var",
        TokenKind::Temporary => "Temporary",
        TokenKind::Local => "Local",
        TokenKind::Procedure => "Procedure",
        TokenKind::Function => "Function",
        TokenKind::Begin => "Begin",
        TokenKind::End => "End",
        TokenKind::If => "If",
        TokenKind::Then => "Then",
        TokenKind::Else => "Else",
        TokenKind::While => "While",
        TokenKind::Do => "Do",
        TokenKind::Repeat => "Repeat",
        TokenKind::Until => "Until",
        TokenKind::For => "For",
        TokenKind::To => "To",
        TokenKind::Downto => "Downto",
        TokenKind::With => "With",
        TokenKind::Of => "Of",
        TokenKind::Case => "Case",
        TokenKind::Exit => "Exit",
        TokenKind::IntegerType => "Integer_Type",
        TokenKind::DecimalType => "Decimal_Type",
        TokenKind::Boolean => "Boolean",
        TokenKind::DateType => "Date_Type",
        TokenKind::TimeType => "Time_Type",
        TokenKind::DateTimeType => "DateTime_Type",
        TokenKind::CodeType => "Code_Type",
        TokenKind::TextType => "Text_Type",
        TokenKind::OptionType => "Option_Type",
        TokenKind::Record => "Record",
        TokenKind::Integer => "Integer",
        TokenKind::Decimal => "Decimal",
        TokenKind::String => "String",
        TokenKind::Date => "Date",
        TokenKind::Time => "Time",
        TokenKind::DateTime => "DateTime",
        TokenKind::Identifier => "Identifier",
        TokenKind::QuotedIdentifier => "QuotedIdentifier",
        TokenKind::Unknown => "Unknown",
        TokenKind::Eof => "EOF",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn field_name_containing_begin_is_identifier() {
        let src = "FIELDS\n{\n  { 1 ; ; \"Time Begin\" ; Date }\n}\n";
        let mut scanner = Scanner::new(src);
        let tokens = scanner.tokenize();
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::Unknown));
        let left_braces = tokens.iter().filter(|t| t.kind == TokenKind::LeftBrace).count();
        let right_braces = tokens.iter().filter(|t| t.kind == TokenKind::RightBrace).count();
        assert_eq!(left_braces, 2);
        assert_eq!(right_braces, 2);
    }

    #[test]
    fn code_type_inside_var_declaration() {
        let src = "OBJECT Table 50000 Customer\n{\n  CODE\n  {\n    VAR\n      CustomerCode : Code[20];\n  }\n}\n";
        let tokens = Scanner::new(src).tokenize();
        let code_tokens: Vec<_> = tokens.iter().filter(|t| t.value.eq_ignore_ascii_case("code")).collect();
        assert_eq!(code_tokens.len(), 2);
        assert_eq!(code_tokens[0].kind, TokenKind::Code);
        assert_eq!(code_tokens[1].kind, TokenKind::CodeType);
    }

    #[test]
    fn object_properties_compound_token() {
        let tokens = kinds("OBJECT-PROPERTIES");
        assert_eq!(tokens, vec![TokenKind::ObjectProperties, TokenKind::Eof]);

        let tokens2 = kinds("OBJECT - 5");
        assert_eq!(
            tokens2,
            vec![TokenKind::Object, TokenKind::Minus, TokenKind::Integer, TokenKind::Eof]
        );
    }

    #[test]
    fn url_in_ml_property_has_no_unknown_tokens() {
        let src = "InstructionalTextML=[ENU=Visit https://example.com]";
        let tokens = Scanner::new(src).tokenize();
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::Unknown));
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::LeftBracket).count(), 1);
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::RightBracket).count(), 1);
    }

    #[test]
    fn case_with_brace_comment_has_two_end_keywords_and_no_braces() {
        let src = "BEGIN CASE x OF 1: y := 1; { comment } 2: z := 2; END; END";
        let tokens = Scanner::new(src).tokenize();
        let end_count = tokens.iter().filter(|t| t.kind == TokenKind::End).count();
        assert_eq!(end_count, 2);
        assert!(!tokens
            .iter()
            .any(|t| t.kind == TokenKind::Identifier && t.value.eq_ignore_ascii_case("end")));
        assert!(!tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::LeftBrace | TokenKind::RightBrace)));
    }

    #[test]
    fn well_formed_object_ends_with_empty_context() {
        let src = "OBJECT Table 50000 Customer\n{\n  PROPERTIES\n  {\n    CaptionML=ENU=Customer;\n  }\n}\n";
        let mut scanner = Scanner::new(src);
        let _ = scanner.tokenize();
        assert_eq!(scanner.flags.brace_depth, 0);
        assert!(scanner.context.is_normal());
    }

    #[test]
    fn date_time_and_datetime_literals() {
        let tokens = kinds("123199D 235959T");
        assert_eq!(tokens, vec![TokenKind::Date, TokenKind::Time, TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_emits_unknown() {
        let tokens = kinds("'unterminated");
        assert_eq!(tokens, vec![TokenKind::Unknown, TokenKind::Eof]);
    }

    #[test]
    fn single_quote_escape_collapses() {
        let mut scanner = Scanner::new("'it''s'");
        let tokens = scanner.tokenize();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "it's");
    }

    #[test]
    fn case_label_colon_does_not_trigger_declaration_type() {
        let src = "BEGIN CASE Rec.Field OF 1: Date := WorkDate; END; END";
        let tokens = Scanner::new(src).tokenize();
        let date_tokens: Vec<_> = tokens.iter().filter(|t| t.value.eq_ignore_ascii_case("date")).collect();
        assert_eq!(date_tokens.len(), 1);
        assert_eq!(date_tokens[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn var_declaration_colon_still_yields_type_token() {
        let src = "VAR\n  X : Date;\nBEGIN\n  CASE X OF 1: Date := X; END;\nEND";
        let tokens = Scanner::new(src).tokenize();
        let date_tokens: Vec<_> = tokens.iter().filter(|t| t.value.eq_ignore_ascii_case("date")).collect();
        assert_eq!(date_tokens.len(), 2);
        assert_eq!(date_tokens[0].kind, TokenKind::DateType);
        assert_eq!(date_tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn flag_change_events_cover_bracket_and_field_column_mutations() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let src = "OBJECT Table 50000 Customer\n{\n  FIELDS\n  {\n    { 1 ; ; Name ; Code[20] }\n  }\n}\n";
        let mut scanner = Scanner::with_trace(src, Box::new(move |event| sink.borrow_mut().push(event)));
        scanner.tokenize();
        let events = events.borrow();
        let flag_names: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                TraceEvent::FlagChange { flag, .. } => Some(*flag),
                _ => None,
            })
            .collect();
        assert!(flag_names.contains(&"field_def_column"));
        assert!(flag_names.contains(&"brace_depth"));
        assert!(flag_names.contains(&"bracket_depth"));
        assert!(flag_names.contains(&"current_section_type"));
    }
}
