//! Crate-level integration tests for the ten scenario seeds of spec.md §8,
//! exercised through the public `tokenize`/`parse`/`validate_positions` API
//! (unit-level coverage for the same scanner behaviors lives beside the
//! scanner in `src/scanner.rs`).

use cal_front::{parse, tokenize, validate_positions, Diagnostic, Token, TokenKind};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn token_kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).0.into_iter().map(|t| t.kind).collect()
}

// 1. Field name containing keyword.
#[test]
fn field_name_containing_keyword_is_not_unknown() {
    let src = "FIELDS\n{\n  { 1 ; ; \"Time Begin\" ; Date }\n}\n";
    let (tokens, _) = tokenize(src);
    assert!(!tokens.iter().any(|t| t.kind == TokenKind::Unknown));
    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::LeftBrace).count(), 2);
    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::RightBrace).count(), 2);
    let quoted = tokens
        .iter()
        .find(|t| t.kind == TokenKind::QuotedIdentifier)
        .expect("quoted field name token");
    assert_eq!(quoted.value, "Time Begin");
}

// 2. CODE-type disambiguation.
#[test]
fn code_keyword_and_code_type_are_distinguished() {
    let src = "OBJECT Table 50000 Customer\n{\n  CODE\n  {\n    VAR\n      CustomerCode : Code[20];\n  }\n}\n";
    let kinds = token_kinds(src);
    assert!(kinds.contains(&TokenKind::Code));
    assert!(kinds.contains(&TokenKind::CodeType));
}

// 3. OBJECT-PROPERTIES compound.
#[test]
fn object_properties_compound_token_vs_minus() {
    let kinds = token_kinds("OBJECT-PROPERTIES");
    assert_eq!(kinds, vec![TokenKind::ObjectProperties, TokenKind::Eof]);

    let kinds2 = token_kinds("OBJECT - 5");
    assert_eq!(
        kinds2,
        vec![TokenKind::Object, TokenKind::Minus, TokenKind::Integer, TokenKind::Eof]
    );
    assert!(!kinds2.contains(&TokenKind::ObjectProperties));
}

// 4. URL in ML property.
#[test]
fn url_inside_bracketed_ml_property_has_no_unknown_tokens() {
    let src = "InstructionalTextML=[DAN=Visit https://example.com;\n    ENU=Visit https://example.com]";
    let (tokens, _) = tokenize(src);
    assert!(!tokens.iter().any(|t| t.kind == TokenKind::Unknown));
    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::LeftBracket).count(), 1);
    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::RightBracket).count(), 1);
}

// 5. CASE with brace comment in branch.
#[test]
fn case_branch_comment_does_not_leak_braces_or_fake_end_identifiers() {
    let src = "BEGIN CASE x OF 1: y := 1; { comment } 2: z := 2; END; END";
    let (tokens, _) = tokenize(src);
    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::End).count(), 2);
    assert!(!tokens
        .iter()
        .any(|t| t.kind == TokenKind::Identifier && t.value.eq_ignore_ascii_case("end")));
    assert!(!tokens
        .iter()
        .any(|t| matches!(t.kind, TokenKind::LeftBrace | TokenKind::RightBrace)));
}

// 6. Missing `}` on CODE, immediately followed by KEYS.
#[test]
fn missing_close_brace_on_code_recovers_at_keys() {
    init();
    let src = "OBJECT Table 50000 Customer\n{\n  CODE\n  {\n    VAR\n      X : Integer;\n  KEYS\n  {\n    { X ; }\n  }\n}\n";
    let (tokens, _) = tokenize(src);
    let (ast, diagnostics) = parse(tokens);
    assert!(diagnostics
        .iter()
        .any(|d| d.message == "Expected } to close CODE section"));
    let obj_id = ast.document().object.expect("object parsed");
    let obj = ast.object(obj_id);
    assert!(obj.keys.is_some());
    assert!(obj.code.is_some());
}

// 7. Empty control-flow body.
#[test]
fn empty_if_body_parses_as_empty_statement_with_no_diagnostics() {
    use cal_front::ast::{AstNode, StmtNode};

    let src = "OBJECT Codeunit 50000 Test\n{\n  CODE\n  {\n    PROCEDURE Run();\n    BEGIN\n      IF TRUE THEN END;\n  }\n}\n";
    let (tokens, _) = tokenize(src);
    let (ast, diagnostics) = parse(tokens);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);

    let obj_id = ast.document().object.expect("object parsed");
    let obj = ast.object(obj_id);
    let code_id = obj.code.expect("code section");
    let AstNode::CodeSection(code) = ast.get(code_id) else {
        panic!("expected CodeSection node");
    };
    let proc_id = code.procedures[0];
    let AstNode::Procedure(procedure) = ast.get(proc_id) else {
        panic!("expected Procedure node");
    };
    let if_id = procedure.body[0];
    let AstNode::Stmt(StmtNode::If { then_branch, .. }) = ast.get(if_id) else {
        panic!("expected If statement");
    };
    let AstNode::Stmt(StmtNode::Empty { .. }) = ast.get(*then_branch) else {
        panic!("expected then-branch to be EmptyStatement");
    };
}

// 8. Set literal errors.
#[test]
fn malformed_set_ranges_report_expected_expression_after_dotdot() {
    init();
    let src = "OBJECT Codeunit 50000 Test\n{\n  CODE\n  {\n    PROCEDURE Run();\n    BEGIN\n      IF x IN [1..;] THEN X := 1;\n    END;\n  }\n}\n";
    let (tokens, _) = tokenize(src);
    let (_ast, diagnostics) = parse(tokens);
    let found = diagnostics.iter().find(|d| {
        d.message.to_lowercase().contains("expected expression after '..'") && d.token.value == ";"
    });
    assert!(found.is_some(), "diagnostics: {:?}", diagnostics);

    let src2 = "OBJECT Codeunit 50000 Test\n{\n  CODE\n  {\n    PROCEDURE Run();\n    BEGIN\n      IF x IN [..] THEN X := 1;\n    END;\n  }\n}\n";
    let (tokens2, _) = tokenize(src2);
    let (_ast2, diagnostics2) = parse(tokens2);
    let found2 = diagnostics2.iter().find(|d| {
        d.message.to_lowercase().contains("expected expression after '..'") && d.token.value == "]"
    });
    assert!(found2.is_some(), "diagnostics: {:?}", diagnostics2);

    // The surrounding IF still parses: a bracketed EXIT case should still
    // produce an ExitStatement then-branch.
    use cal_front::ast::{AstNode, StmtNode};
    let src3 = "OBJECT Codeunit 50000 Test\n{\n  CODE\n  {\n    PROCEDURE Run();\n    BEGIN\n      IF x IN [..] THEN EXIT;\n    END;\n  }\n}\n";
    let (tokens3, _) = tokenize(src3);
    let (ast3, _diagnostics3) = parse(tokens3);
    let obj_id = ast3.document().object.expect("object parsed");
    let obj = ast3.object(obj_id);
    let code_id = obj.code.expect("code section");
    let AstNode::CodeSection(code) = ast3.get(code_id) else {
        panic!("expected CodeSection node");
    };
    let AstNode::Procedure(procedure) = ast3.get(code.procedures[0]) else {
        panic!("expected Procedure node");
    };
    let AstNode::Stmt(StmtNode::If { then_branch, .. }) = ast3.get(procedure.body[0]) else {
        panic!("expected If statement");
    };
    assert!(matches!(ast3.get(*then_branch), AstNode::Stmt(StmtNode::Exit { .. })));
}

// 9. Query ELEMENTS extraction.
#[test]
fn query_elements_column_row_is_extracted_into_code_variables() {
    use cal_front::ast::AstNode;

    let src = "OBJECT Query 50001 \"Posting Query\"\n{\n  ELEMENTS\n  {\n    { 1 ; 0 ; DataItem ; Ledger Entry ; }\n    { 2 ; 1 ; Column ; PostingDate ; }\n  }\n}\n";
    let (tokens, _) = tokenize(src);
    let (ast, _diagnostics) = parse(tokens);
    let obj_id = ast.document().object.expect("object parsed");
    let obj = ast.object(obj_id);
    let code_id = obj.code.expect("code section synthesized from ELEMENTS extraction");
    let AstNode::CodeSection(code) = ast.get(code_id) else {
        panic!("expected CodeSection node");
    };
    let found = code.variables.iter().any(|v| match ast.get(*v) {
        AstNode::Variable(variable) => variable.name == "PostingDate",
        _ => false,
    });
    assert!(found, "expected a PostingDate variable extracted from ELEMENTS");
}

// 10. Position validator sanitization.
#[test]
fn corrupted_token_value_never_leaks_into_validation_messages() {
    let source = "ABC";
    let tokens = vec![
        Token::new(TokenKind::Identifier, "PROPRIETARY_X", 1, 1, 0, 3),
        Token::eof(1, 4, 3),
    ];
    let report = validate_positions(source, &tokens);
    assert!(!report.valid);
    for message in report.errors.iter().chain(report.warnings.iter()) {
        assert!(
            !message.contains("PROPRIETARY_X"),
            "leaked corrupted token value: {message}"
        );
    }
}

fn diagnostic_messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.message.clone()).collect()
}

#[test]
fn parse_never_panics_on_truncated_input() {
    init();
    let (tokens, _) = tokenize("OBJECT Table 1 X\n{\n  FIELDS\n  {\n    { 1");
    let (_ast, diagnostics) = parse(tokens);
    // Just reaching this line means parse() didn't panic; also sanity-check
    // at least one diagnostic was raised for the unterminated structure.
    assert!(!diagnostic_messages(&diagnostics).is_empty());
}
