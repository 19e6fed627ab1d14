//! Query `ELEMENTS` / Report `DATASET` row extraction into `Variable`s
//! (spec.md §4.6, §9 Open Question 3).

use super::Parser;
use crate::ast::{AstNode, Element, ElementsSection, NodeRef, Variable};
use crate::token::{Span, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementsSectionKind {
    Elements,
    Dataset,
}

impl ElementsSectionKind {
    fn label(self) -> &'static str {
        match self {
            ElementsSectionKind::Elements => "ELEMENTS",
            ElementsSectionKind::Dataset => "DATASET",
        }
    }
}

impl Parser {
    pub(crate) fn parse_elements_section(&mut self, kind: ElementsSectionKind) -> NodeRef {
        let start = self.current().start_offset;
        self.advance(); // ELEMENTS / DATASET
        self.expect(TokenKind::LeftBrace, "{ to open section");
        let mut elements = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::LeftBrace => {
                    let (node, extracted) = self.parse_element_row();
                    elements.push(node);
                    if let Some(v) = extracted {
                        self.pending_elements_vars.push(v);
                    }
                }
                TokenKind::Eof => break,
                _ if self.current_is_section_keyword() => {
                    let tok = self.current().clone();
                    self.error(format!("Expected }} to close {} section", kind.label()), tok);
                    break;
                }
                _ => {
                    let tok = self.advance();
                    self.warn(format!("Skipping unexpected {:?} in {} section", tok.kind, kind.label()), tok);
                }
            }
        }
        let end = self.last_consumed_end(start);
        self.alloc(AstNode::ElementsSection(ElementsSection {
            elements,
            span: Span::new(start, end),
        }))
    }

    /// Returns the `Element` row node plus, when its `kind` column is
    /// `Column`/`Filter` and its `name` column is non-empty, a synthesized
    /// `Variable` for it (spec.md §4.6, "Query/Report element extraction").
    fn parse_element_row(&mut self) -> (NodeRef, Option<NodeRef>) {
        let start = self.current().start_offset;
        self.expect(TokenKind::LeftBrace, "{ to open element row");
        let id = self.parse_uint_field();
        self.expect(TokenKind::Semicolon, "; after element id");
        let parent_id = self.parse_uint_field();
        self.expect(TokenKind::Semicolon, "; after element parent id");
        let kind_text = self.join_tokens_until(|k| matches!(k, TokenKind::Semicolon | TokenKind::RightBrace));
        self.eat(TokenKind::Semicolon);
        let name = self.join_tokens_until(|k| matches!(k, TokenKind::Semicolon | TokenKind::RightBrace));

        let mut properties = Vec::new();
        let mut triggers = Vec::new();
        if self.eat(TokenKind::Semicolon).is_some() {
            self.parse_property_list(&mut properties, &mut triggers, TokenKind::RightBrace, false);
        }
        let end_tok = self.expect(TokenKind::RightBrace, "} to close element row");
        let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
        let span = Span::new(start, end);

        let extracted = if (kind_text.eq_ignore_ascii_case("Column") || kind_text.eq_ignore_ascii_case("Filter"))
            && !name.trim().is_empty()
        {
            let v = Variable {
                name: name.clone(),
                data_type: String::new(),
                is_temporary: false,
                at_number: None,
                span,
            };
            Some(self.alloc(AstNode::Variable(v)))
        } else {
            None
        };

        let element = Element {
            id,
            parent_id,
            kind: kind_text,
            name,
            properties,
            span,
        };
        (self.alloc(AstNode::Element(element)), extracted)
    }
}
