//! FIELDS/FIELDGROUPS/KEYS/CONTROLS/ACTIONS row parsing and the shared
//! property-list parser, including field-level trigger bodies (spec.md
//! §4.6). Control/Action property lists deliberately do not special-case
//! trigger names (see DESIGN.md): only a field's property list does, per
//! the spec's literal wording.

use super::Parser;
use crate::ast::{
    Action, ActionContainer, ActionsSection, AstNode, Control, ControlsSection, Field,
    FieldGroup, FieldGroupSection, FieldProperty, FieldsSection, Key, KeysSection, NodeRef,
};
use crate::keywords::is_trigger_name;
use crate::token::{Span, TokenKind};

impl Parser {
    // ---- FIELDS ----

    pub(crate) fn parse_fields_section(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.advance(); // FIELDS
        self.expect(TokenKind::LeftBrace, "{ to open FIELDS section");
        let mut fields = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::LeftBrace => fields.push(self.parse_field_row()),
                TokenKind::Eof => break,
                _ if self.current_is_section_keyword() => {
                    let tok = self.current().clone();
                    self.error("Expected } to close FIELDS section", tok);
                    break;
                }
                _ => {
                    let tok = self.advance();
                    self.warn(format!("Skipping unexpected {:?} in FIELDS section", tok.kind), tok);
                }
            }
        }
        let end = self.last_consumed_end(start);
        self.alloc(AstNode::FieldsSection(FieldsSection {
            fields,
            span: Span::new(start, end),
        }))
    }

    fn parse_field_row(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.expect(TokenKind::LeftBrace, "{ to open field row");
        let field_no = self.parse_uint_field();
        self.expect(TokenKind::Semicolon, "; after field number");
        let field_enabled = self.parse_enabled_flag();
        self.expect(TokenKind::Semicolon, "; after enabled flag");
        let field_name = self.join_tokens_until(|k| matches!(k, TokenKind::Semicolon));
        self.expect(TokenKind::Semicolon, "; after field name");
        let (data_type, _) = self.parse_type_spec_until(|k| matches!(k, TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof));

        let mut properties = Vec::new();
        let mut triggers = Vec::new();
        if self.eat(TokenKind::Semicolon).is_some() {
            self.parse_property_list(&mut properties, &mut triggers, TokenKind::RightBrace, true);
        }
        let end_tok = self.expect(TokenKind::RightBrace, "} to close field row");
        let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
        self.alloc(AstNode::Field(Field {
            field_no,
            field_enabled,
            field_name,
            data_type,
            properties,
            triggers,
            span: Span::new(start, end),
        }))
    }

    // ---- shared property list (Name=value; / Name=BEGIN..END;) ----

    /// Parses `Name=value;` entries until `stop_kind` or EOF. When
    /// `allow_triggers` is set, a property whose name matches a known
    /// trigger name is parsed as a `Trigger` (optional `VAR` block plus a
    /// `BEGIN … END` body) instead of a flat joined value.
    pub(crate) fn parse_property_list(
        &mut self,
        properties: &mut Vec<NodeRef>,
        triggers: &mut Vec<NodeRef>,
        stop_kind: TokenKind,
        allow_triggers: bool,
    ) {
        while self.current_kind() != stop_kind && !self.at_eof() {
            let before = self.mark();
            let prop_start = self.current().start_offset;
            let name_tok = self.advance();
            let name = name_tok.value;

            if self.expect(TokenKind::Equal, "= after property name").is_some() {
                if allow_triggers && is_trigger_name(&name) {
                    let trigger = self.parse_trigger_body(name, prop_start);
                    triggers.push(trigger);
                } else {
                    let value = self.join_tokens_until(|k| matches!(k, TokenKind::Semicolon));
                    let end = self.last_consumed_end(prop_start);
                    let prop = FieldProperty {
                        name,
                        value,
                        trigger: None,
                        span: Span::new(prop_start, end),
                    };
                    properties.push(self.alloc(AstNode::FieldProperty(prop)));
                }
            }
            self.eat(TokenKind::Semicolon);
            self.force_progress(before);
        }
    }

    fn parse_trigger_body(&mut self, name: String, start: usize) -> NodeRef {
        let mut variables = Vec::new();
        while self.check(TokenKind::Var) {
            variables.extend(self.parse_var_decls());
        }
        let body = if self.check(TokenKind::Begin) {
            self.parse_block_statements()
        } else {
            let tok = self.current().clone();
            self.error(format!("Expected BEGIN for trigger {name}"), tok);
            Vec::new()
        };
        let end = self.last_consumed_end(start);
        self.alloc(AstNode::Trigger(crate::ast::Trigger {
            name,
            variables,
            body,
            span: Span::new(start, end),
        }))
    }

    // ---- FIELDGROUPS ----

    pub(crate) fn parse_field_groups_section(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.advance(); // FIELDGROUPS
        self.expect(TokenKind::LeftBrace, "{ to open FIELDGROUPS section");
        let mut groups = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::LeftBrace => groups.push(self.parse_field_group_row()),
                TokenKind::Eof => break,
                _ if self.current_is_section_keyword() => {
                    let tok = self.current().clone();
                    self.error("Expected } to close FIELDGROUPS section", tok);
                    break;
                }
                _ => {
                    let tok = self.advance();
                    self.warn(format!("Skipping unexpected {:?} in FIELDGROUPS section", tok.kind), tok);
                }
            }
        }
        let end = self.last_consumed_end(start);
        self.alloc(AstNode::FieldGroupSection(FieldGroupSection {
            groups,
            span: Span::new(start, end),
        }))
    }

    fn parse_field_group_row(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.expect(TokenKind::LeftBrace, "{ to open field group row");
        let id = self.parse_uint_field();
        self.expect(TokenKind::Semicolon, "; after field group id");
        let name = self.join_tokens_until(|k| matches!(k, TokenKind::Semicolon));
        self.expect(TokenKind::Semicolon, "; after field group name");
        let fields = self.parse_comma_field_list(TokenKind::RightBrace);
        let end_tok = self.expect(TokenKind::RightBrace, "} to close field group row");
        let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
        self.alloc(AstNode::FieldGroup(FieldGroup {
            id,
            name,
            fields,
            span: Span::new(start, end),
        }))
    }

    // ---- KEYS ----

    pub(crate) fn parse_keys_section(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.advance(); // KEYS
        self.expect(TokenKind::LeftBrace, "{ to open KEYS section");
        let mut keys = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::LeftBrace => keys.push(self.parse_key_row()),
                TokenKind::Eof => break,
                _ if self.current_is_section_keyword() => {
                    let tok = self.current().clone();
                    self.error("Expected } to close KEYS section", tok);
                    break;
                }
                _ => {
                    let tok = self.advance();
                    self.warn(format!("Skipping unexpected {:?} in KEYS section", tok.kind), tok);
                }
            }
        }
        let end = self.last_consumed_end(start);
        self.alloc(AstNode::KeysSection(KeysSection {
            keys,
            span: Span::new(start, end),
        }))
    }

    fn parse_key_row(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.expect(TokenKind::LeftBrace, "{ to open key row");
        let fields = self.parse_comma_field_list(TokenKind::Semicolon);
        let mut properties = Vec::new();
        let mut triggers = Vec::new();
        if self.eat(TokenKind::Semicolon).is_some() {
            self.parse_property_list(&mut properties, &mut triggers, TokenKind::RightBrace, false);
        }
        let end_tok = self.expect(TokenKind::RightBrace, "} to close key row");
        let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
        self.alloc(AstNode::Key(Key {
            fields,
            properties,
            span: Span::new(start, end),
        }))
    }

    // ---- CONTROLS ----

    pub(crate) fn parse_controls_section(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.advance(); // CONTROLS
        self.expect(TokenKind::LeftBrace, "{ to open CONTROLS section");
        let mut controls = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::LeftBrace => controls.push(self.parse_control_row()),
                TokenKind::Eof => break,
                _ if self.current_is_section_keyword() => {
                    let tok = self.current().clone();
                    self.error("Expected } to close CONTROLS section", tok);
                    break;
                }
                _ => {
                    let tok = self.advance();
                    self.warn(format!("Skipping unexpected {:?} in CONTROLS section", tok.kind), tok);
                }
            }
        }
        let end = self.last_consumed_end(start);
        self.alloc(AstNode::ControlsSection(ControlsSection {
            controls,
            span: Span::new(start, end),
        }))
    }

    fn parse_control_row(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.expect(TokenKind::LeftBrace, "{ to open control row");
        let control_no = self.parse_uint_field();
        self.expect(TokenKind::Semicolon, "; after control number");
        self.skip_one_column(); // parent/indent column, not modeled
        self.expect(TokenKind::Semicolon, "; after control parent column");
        let control_type = self.join_tokens_until(|k| matches!(k, TokenKind::Semicolon | TokenKind::RightBrace));
        let mut properties = Vec::new();
        let mut triggers = Vec::new();
        if self.eat(TokenKind::Semicolon).is_some() {
            self.parse_property_list(&mut properties, &mut triggers, TokenKind::RightBrace, false);
        }
        let end_tok = self.expect(TokenKind::RightBrace, "} to close control row");
        let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
        self.alloc(AstNode::Control(Control {
            control_no,
            control_type,
            properties,
            span: Span::new(start, end),
        }))
    }

    // ---- ACTIONS ----

    pub(crate) fn parse_actions_section(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.advance(); // ACTIONS
        self.expect(TokenKind::LeftBrace, "{ to open ACTIONS section");
        let mut actions = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::LeftBrace => actions.push(self.parse_action_row()),
                TokenKind::Eof => break,
                _ if self.current_is_section_keyword() => {
                    let tok = self.current().clone();
                    self.error("Expected } to close ACTIONS section", tok);
                    break;
                }
                _ => {
                    let tok = self.advance();
                    self.warn(format!("Skipping unexpected {:?} in ACTIONS section", tok.kind), tok);
                }
            }
        }
        let end = self.last_consumed_end(start);
        let container = ActionContainer {
            actions,
            span: Span::new(start, end),
        };
        let container_id = self.alloc(AstNode::ActionContainer(container));
        self.alloc(AstNode::ActionsSection(ActionsSection {
            containers: vec![container_id],
            span: Span::new(start, end),
        }))
    }

    fn parse_action_row(&mut self) -> NodeRef {
        let start = self.current().start_offset;
        self.expect(TokenKind::LeftBrace, "{ to open action row");
        let action_no = self.parse_uint_field();
        self.expect(TokenKind::Semicolon, "; after action number");
        self.skip_one_column(); // parent/indent column, not modeled
        self.expect(TokenKind::Semicolon, "; after action parent column");
        let action_name = self.join_tokens_until(|k| matches!(k, TokenKind::Semicolon | TokenKind::RightBrace));
        let mut properties = Vec::new();
        // Actions' OnAction trigger is still parsed as a real trigger body
        // (consuming its VAR block/BEGIN..END) so it never gets mistokenized
        // as a flat property value; Action has no dedicated triggers field,
        // so the Trigger node itself is discarded after parsing.
        let mut triggers = Vec::new();
        if self.eat(TokenKind::Semicolon).is_some() {
            self.parse_property_list(&mut properties, &mut triggers, TokenKind::RightBrace, true);
        }
        let end_tok = self.expect(TokenKind::RightBrace, "} to close action row");
        let end = end_tok.map(|t| t.end_offset).unwrap_or_else(|| self.current().start_offset);
        self.alloc(AstNode::Action(Action {
            action_no,
            action_name,
            properties,
            span: Span::new(start, end),
        }))
    }
}
