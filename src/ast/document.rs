//! Object-declaration level AST payloads (spec.md §3).

use crate::ast::NodeRef;
use crate::token::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Page,
    Codeunit,
    Report,
    Query,
    XmlPort,
    MenuSuite,
}

#[derive(Debug, Clone)]
pub struct CALDocument {
    pub object: Option<NodeRef>,
    pub start_offset: usize,
    pub end_offset: usize,
}

#[derive(Debug, Clone)]
pub struct ObjectDeclaration {
    pub object_kind: ObjectKind,
    pub object_id: u32,
    pub object_name: String,
    pub properties: Option<NodeRef>,
    pub fields: Option<NodeRef>,
    pub keys: Option<NodeRef>,
    pub field_groups: Option<NodeRef>,
    pub controls: Option<NodeRef>,
    pub actions: Option<NodeRef>,
    pub elements: Option<NodeRef>,
    pub dataset: Option<NodeRef>,
    pub code: Option<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct PropertiesSection {
    pub properties: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldProperty {
    pub name: String,
    pub value: String,
    pub trigger: Option<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub field_no: u32,
    pub field_enabled: bool,
    pub field_name: String,
    pub data_type: String,
    pub properties: Vec<NodeRef>,
    pub triggers: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldsSection {
    pub fields: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldGroup {
    pub id: u32,
    pub name: String,
    pub fields: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldGroupSection {
    pub groups: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Key {
    pub fields: Vec<String>,
    pub properties: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct KeysSection {
    pub keys: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Control {
    pub control_no: u32,
    pub control_type: String,
    pub properties: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ControlsSection {
    pub controls: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Action {
    pub action_no: u32,
    pub action_name: String,
    pub properties: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ActionContainer {
    pub actions: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ActionsSection {
    pub containers: Vec<NodeRef>,
    pub span: Span,
}

/// A row of a Query `ELEMENTS` section or Report `DATASET` section.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: u32,
    pub parent_id: u32,
    pub kind: String,
    pub name: String,
    pub properties: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ElementsSection {
    pub elements: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub data_type: String,
    pub is_var: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub data_type: String,
    pub is_temporary: bool,
    pub at_number: Option<u32>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: String,
    pub variables: Vec<NodeRef>,
    pub body: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    pub is_local: bool,
    pub parameters: Vec<NodeRef>,
    pub return_type: Option<String>,
    pub variables: Vec<NodeRef>,
    pub body: Vec<NodeRef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CodeSection {
    pub procedures: Vec<NodeRef>,
    pub variables: Vec<NodeRef>,
    pub span: Span,
}
