//! Object header and section dispatch loop (spec.md §4.6).

use super::Parser;
use crate::ast::{
    AstNode, CodeSection, NodeRef, ObjectDeclaration, ObjectKind, PropertiesSection,
};
use crate::token::{Span, TokenKind};

impl Parser {
    pub(crate) fn parse_object(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.advance(); // OBJECT
        let object_kind = self.parse_object_kind();
        let object_id = self.parse_uint_field();
        let object_name = self.parse_object_name();

        let mut obj = ObjectDeclaration {
            object_kind,
            object_id,
            object_name,
            properties: None,
            fields: None,
            keys: None,
            field_groups: None,
            controls: None,
            actions: None,
            elements: None,
            dataset: None,
            code: None,
            span: Span::new(start, start),
        };

        self.pending_elements_vars.clear();
        let mut code_variables = Vec::new();
        let mut code_procedures = Vec::new();
        let mut code_seen = false;
        let mut code_span = Span::new(start, start);

        self.expect(TokenKind::LeftBrace, "{ to open object body");

        loop {
            match self.current_kind() {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    let tok = self.current().clone();
                    self.error("Expected } to close object body", tok);
                    break;
                }
                TokenKind::Code => {
                    code_span = self.parse_code_section_body(&mut code_variables, &mut code_procedures);
                    code_seen = true;
                }
                _ => self.parse_section(&mut obj),
            }
        }

        let extracted = std::mem::take(&mut self.pending_elements_vars);
        code_variables.extend(extracted);
        if code_seen || !code_variables.is_empty() {
            let section = CodeSection {
                procedures: code_procedures,
                variables: code_variables,
                span: code_span,
            };
            obj.code = Some(self.alloc(AstNode::CodeSection(section)));
        }

        let end = self.last_consumed_end(start);
        obj.span = Span::new(start, end);
        self.alloc(AstNode::Object(obj))
    }

    fn parse_object_kind(&mut self) -> ObjectKind {
        let kind = match self.current_kind() {
            TokenKind::Table => ObjectKind::Table,
            TokenKind::Page => ObjectKind::Page,
            TokenKind::Codeunit => ObjectKind::Codeunit,
            TokenKind::Report => ObjectKind::Report,
            TokenKind::Query => ObjectKind::Query,
            TokenKind::XmlPort => ObjectKind::XmlPort,
            TokenKind::MenuSuite => ObjectKind::MenuSuite,
            _ => {
                let tok = self.current().clone();
                self.error(
                    "Expected an object kind (Table, Page, Codeunit, Report, Query, XMLport, MenuSuite)",
                    tok,
                );
                return ObjectKind::Table;
            }
        };
        self.advance();
        kind
    }

    fn parse_object_name(&mut self) -> String {
        match self.current_kind() {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => self.advance().value,
            _ => {
                let tok = self.current().clone();
                self.error("Expected an object name", tok);
                String::new()
            }
        }
    }

    fn parse_section(&mut self, obj: &mut ObjectDeclaration) {
        match self.current_kind() {
            TokenKind::Properties => {
                let id = self.parse_properties_section();
                obj.properties = Some(id);
            }
            TokenKind::Fields => {
                let id = self.parse_fields_section();
                obj.fields = Some(id);
            }
            TokenKind::Keys => {
                let id = self.parse_keys_section();
                obj.keys = Some(id);
            }
            TokenKind::FieldGroups => {
                let id = self.parse_field_groups_section();
                obj.field_groups = Some(id);
            }
            TokenKind::Controls => {
                let id = self.parse_controls_section();
                obj.controls = Some(id);
            }
            TokenKind::Actions => {
                let id = self.parse_actions_section();
                obj.actions = Some(id);
            }
            TokenKind::Elements => {
                let id = self.parse_elements_section(super::ElementsSectionKind::Elements);
                obj.elements = Some(id);
            }
            TokenKind::Dataset => {
                let id = self.parse_elements_section(super::ElementsSectionKind::Dataset);
                obj.dataset = Some(id);
            }
            TokenKind::RequestPage | TokenKind::Labels => {
                self.skip_unimplemented_section();
            }
            _ => {
                let tok = self.advance();
                self.warn(format!("Skipping unexpected {:?} inside object body", tok.kind), tok);
            }
        }
    }

    fn parse_properties_section(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.advance(); // PROPERTIES
        self.expect(TokenKind::LeftBrace, "{ to open PROPERTIES section");
        let mut properties = Vec::new();
        let mut triggers = Vec::new();
        self.parse_property_list(&mut properties, &mut triggers, TokenKind::RightBrace, false);
        let end_tok = self.expect(TokenKind::RightBrace, "} to close PROPERTIES section");
        let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
        self.alloc(AstNode::PropertiesSection(PropertiesSection {
            properties,
            span: Span::new(start, end),
        }))
    }

    /// `REQUESTPAGE`/`LABELS` bodies are consumed and discarded: they have no
    /// dedicated AST payload in this crate (spec.md's Non-goals place full
    /// `DATASET`/request-page internal structure out of scope).
    fn skip_unimplemented_section(&mut self) {
        self.advance(); // keyword
        if self.eat(TokenKind::LeftBrace).is_none() {
            return;
        }
        let mut depth: u32 = 1;
        while depth > 0 && !self.at_eof() {
            match self.current_kind() {
                TokenKind::LeftBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RightBrace => {
                    depth -= 1;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}
