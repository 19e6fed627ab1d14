//! Context-aware lexer and error-recovering parser for legacy NAV/C/AL
//! object text (spec.md §1–§2). Grounded on the donor's `lib.rs`: one
//! `pub mod` per concern, plus a thin `pub fn`-per-operation surface at the
//! crate root rather than a single god-struct API.

pub mod arena;
pub mod ast;
pub mod context;
pub mod diagnostic;
pub mod keywords;
pub mod parser;
pub mod position_validator;
pub mod scanner;
pub mod token;
pub mod trace;

pub use ast::{Ast, CALDocument, NodeRef};
pub use context::ContextState;
pub use diagnostic::{Diagnostic, DiagnosticSeverity};
pub use parser::{parse, parse_with_config, ParserConfig};
pub use position_validator::{validate_positions, ValidationReport};
pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};
pub use trace::{ContextEventKind, TraceEvent};

/// The events a [`tokenize`] call collected, in emission order (spec.md
/// §4.4). Bare `tokenize()` has no subscriber of its own, so it wires up an
/// internal collecting closure and hands the result back instead of
/// discarding it — callers who want a live callback use
/// [`tokenize_with_trace`] instead.
pub type TraceLog = Vec<TraceEvent>;

/// Tokenizes `source` and returns every trace event emitted along the way.
///
/// Equivalent to `tokenize_with_trace` with a callback that simply appends
/// to a `Vec`, collected via `Rc<RefCell<_>>` since [`trace::TraceSink`]
/// only accepts a boxed `FnMut`.
pub fn tokenize(source: &str) -> (Vec<Token>, TraceLog) {
    use std::cell::RefCell;
    use std::rc::Rc;

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let mut scanner = Scanner::with_trace(
        source,
        Box::new(move |event| sink.borrow_mut().push(event)),
    );
    let tokens = scanner.tokenize();
    let log = Rc::try_unwrap(log)
        .map(RefCell::into_inner)
        .unwrap_or_default();
    (tokens, log)
}

/// Tokenizes `source`, forwarding trace events to `trace` as they occur
/// (spec.md §4.4). `None` tokenizes with the trace bus disabled, matching
/// the donor's opt-in tracing default.
pub fn tokenize_with_trace(source: &str, trace: Option<Box<dyn FnMut(TraceEvent)>>) -> Vec<Token> {
    let mut scanner = match trace {
        Some(callback) => Scanner::with_trace(source, callback),
        None => Scanner::new(source),
    };
    scanner.tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_collects_one_trace_event_per_token() {
        let (tokens, log) = tokenize("OBJECT Table 50000 Foo { }");
        assert!(!tokens.is_empty());
        let token_events = log
            .iter()
            .filter(|e| matches!(e, TraceEvent::Token { .. }))
            .count();
        assert_eq!(token_events, tokens.len());
    }

    #[test]
    fn tokenize_with_trace_none_still_tokenizes() {
        let tokens = tokenize_with_trace("OBJECT Table 1 X { }", None);
        assert!(!tokens.is_empty());
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn tokenize_with_trace_some_invokes_callback() {
        use std::cell::Cell;
        use std::rc::Rc;

        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        let tokens = tokenize_with_trace(
            "OBJECT Table 1 X { }",
            Some(Box::new(move |_event| count2.set(count2.get() + 1))),
        );
        assert!(count.get() >= tokens.len());
    }

    #[test]
    fn parse_then_validate_round_trip() {
        let source = "OBJECT Table 50000 Foo\n{\n  FIELDS\n  {\n    { 1;;Bar;Integer }\n  }\n}\n";
        let (tokens, _) = tokenize(source);
        let report = validate_positions(source, &tokens);
        assert!(report.valid, "unexpected validation errors: {:?}", report.errors);

        let (ast, diagnostics) = parse(tokens);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        let doc = ast.document();
        assert!(doc.object.is_some());
    }

    #[test]
    fn parse_with_config_honors_expression_depth() {
        let nested = "(".repeat(5) + "1" + &")".repeat(5);
        let source = format!(
            "OBJECT Codeunit 1 X\n{{\n  CODE\n  {{\n    BEGIN\n      X := {};\n    END;\n  }}\n}}\n",
            nested
        );
        let (tokens, _) = tokenize(&source);
        let (_ast, diagnostics) = parse_with_config(tokens, ParserConfig { max_expression_depth: 2 });
        assert!(diagnostics.iter().any(|d| d.message.contains("nesting")));
    }
}
