//! The typed AST (spec.md §3, §6). All nodes live in one `Ast` arena per
//! document and reference each other by `NodeRef`, never by token pointer
//! (spec.md §5) — grounded on the donor's `src/ast/mod.rs` module split,
//! generalized to a single sum-type arena per spec.md §9's design note.

pub mod document;
pub mod expr;
pub mod stmt;

pub use document::*;
pub use expr::{BinaryOp, ExprNode, LiteralKind, SetElement, UnaryOp};
pub use stmt::{CaseBranch, StmtNode};

use crate::arena::{Arena, NodeId};

/// Every AST node, document root included, is one variant of this sum type,
/// allocated into a single `Arena<AstNode>` per document.
#[derive(Debug, Clone)]
pub enum AstNode {
    Document(CALDocument),
    Object(ObjectDeclaration),
    PropertiesSection(PropertiesSection),
    FieldProperty(FieldProperty),
    Field(Field),
    FieldsSection(FieldsSection),
    FieldGroup(FieldGroup),
    FieldGroupSection(FieldGroupSection),
    Key(Key),
    KeysSection(KeysSection),
    Control(Control),
    ControlsSection(ControlsSection),
    Action(Action),
    ActionContainer(ActionContainer),
    ActionsSection(ActionsSection),
    Element(Element),
    ElementsSection(ElementsSection),
    Parameter(Parameter),
    Variable(Variable),
    Trigger(Trigger),
    Procedure(Procedure),
    CodeSection(CodeSection),
    Expr(ExprNode),
    Stmt(StmtNode),
}

pub type NodeRef = NodeId<AstNode>;

/// Owns every node of one parsed document.
pub struct Ast {
    arena: Arena<AstNode>,
    pub root: Option<NodeRef>,
}

impl Ast {
    pub fn new() -> Self {
        Ast {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn alloc(&self, node: AstNode) -> NodeRef {
        self.arena.alloc(node)
    }

    pub fn get(&self, id: NodeRef) -> &AstNode {
        self.arena.get(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn document(&self) -> &CALDocument {
        let root = self.root.expect("Ast::document called before the root was set");
        match self.get(root) {
            AstNode::Document(doc) => doc,
            _ => panic!("Ast root is not a Document node"),
        }
    }

    pub fn object(&self, id: NodeRef) -> &ObjectDeclaration {
        match self.get(id) {
            AstNode::Object(obj) => obj,
            other => panic!("expected Object node, found {:?}", discriminant_name(other)),
        }
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

fn discriminant_name(node: &AstNode) -> &'static str {
    match node {
        AstNode::Document(_) => "Document",
        AstNode::Object(_) => "Object",
        AstNode::PropertiesSection(_) => "PropertiesSection",
        AstNode::FieldProperty(_) => "FieldProperty",
        AstNode::Field(_) => "Field",
        AstNode::FieldsSection(_) => "FieldsSection",
        AstNode::FieldGroup(_) => "FieldGroup",
        AstNode::FieldGroupSection(_) => "FieldGroupSection",
        AstNode::Key(_) => "Key",
        AstNode::KeysSection(_) => "KeysSection",
        AstNode::Control(_) => "Control",
        AstNode::ControlsSection(_) => "ControlsSection",
        AstNode::Action(_) => "Action",
        AstNode::ActionContainer(_) => "ActionContainer",
        AstNode::ActionsSection(_) => "ActionsSection",
        AstNode::Element(_) => "Element",
        AstNode::ElementsSection(_) => "ElementsSection",
        AstNode::Parameter(_) => "Parameter",
        AstNode::Variable(_) => "Variable",
        AstNode::Trigger(_) => "Trigger",
        AstNode::Procedure(_) => "Procedure",
        AstNode::CodeSection(_) => "CodeSection",
        AstNode::Expr(_) => "Expr",
        AstNode::Stmt(_) => "Stmt",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Span;

    #[test]
    fn empty_document_has_no_object() {
        let ast = Ast::new();
        let doc = CALDocument {
            object: None,
            start_offset: 0,
            end_offset: 0,
        };
        let root = ast.alloc(AstNode::Document(doc));
        assert!(matches!(ast.get(root), AstNode::Document(d) if d.object.is_none()));
    }

    #[test]
    fn object_lookup_panics_on_wrong_kind() {
        let ast = Ast::new();
        let id = ast.alloc(AstNode::Expr(ExprNode::Identifier {
            name: "x".into(),
            quoted: false,
            span: Span::new(0, 1),
        }));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ast.object(id);
        }));
        assert!(result.is_err());
    }
}
