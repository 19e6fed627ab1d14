//! The lexical context stack and scratch flags that drive the scanner's
//! Moore machine (spec.md §3, §4.2).

/// A lexical mode tag. The bottom of the stack is always `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    Normal,
    ObjectLevel,
    Properties,
    CodeBlock,
    FieldDef,
    MlBracket,
    String,
    BraceComment,
    CComment,
    LineComment,
}

impl LexMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LexMode::Normal => "NORMAL",
            LexMode::ObjectLevel => "OBJECT_LEVEL",
            LexMode::Properties => "PROPERTIES",
            LexMode::CodeBlock => "CODE_BLOCK",
            LexMode::FieldDef => "FIELD_DEF",
            LexMode::MlBracket => "ML_BRACKET",
            LexMode::String => "STRING",
            LexMode::BraceComment => "BRACE_COMMENT",
            LexMode::CComment => "C_COMMENT",
            LexMode::LineComment => "LINE_COMMENT",
        }
    }
}

/// Which semicolon-delimited column of a `{ n ; enabled ; name ; type ; props }`
/// field row the scanner currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefColumn {
    None,
    Col1,
    Col2,
    Col3,
    Col4,
    Properties,
}

/// Which section the scanner is currently inside, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    Fields,
    Keys,
    FieldGroups,
    Controls,
    Elements,
    DataItems,
    Actions,
    Dataset,
    RequestPage,
    Labels,
}

/// The push/pop stack of lexical modes. Underflow (popping past the bottom
/// `Normal` entry) never panics; it is recorded in `underflow_detected`.
#[derive(Debug, Clone)]
pub struct ContextStack {
    stack: Vec<LexMode>,
    underflow_detected: bool,
}

impl ContextStack {
    pub fn new() -> Self {
        ContextStack {
            stack: vec![LexMode::Normal],
            underflow_detected: false,
        }
    }

    pub fn push(&mut self, mode: LexMode) {
        self.stack.push(mode);
    }

    /// Pops the top mode. A no-op (with `underflow_detected` set) if only
    /// `Normal` remains.
    pub fn pop(&mut self) -> Option<LexMode> {
        if self.stack.len() <= 1 {
            self.underflow_detected = true;
            return None;
        }
        self.stack.pop()
    }

    pub fn top(&self) -> LexMode {
        *self.stack.last().expect("stack is never empty")
    }

    pub fn underflow_detected(&self) -> bool {
        self.underflow_detected
    }

    pub fn is_normal(&self) -> bool {
        self.stack.len() == 1
    }

    pub fn as_strings(&self) -> Vec<String> {
        self.stack.iter().map(|m| m.as_str().to_string()).collect()
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide scratch flags for a single `tokenize()` call (spec.md §3).
#[derive(Debug, Clone)]
pub struct ContextFlags {
    pub brace_depth: u32,
    pub bracket_depth: u32,
    pub in_property_value: bool,
    pub field_def_column: FieldDefColumn,
    pub current_section_type: Option<SectionType>,
    /// Counts `BEGIN`/`CASE`/`REPEAT` against matching `END`/`UNTIL` inside a
    /// CODE section, so the closing `}` of CODE can be told apart from a
    /// stray brace inside a trigger body (spec.md §9, Open Question 2).
    pub code_block_depth: u32,
    /// Set on `VAR`/`PROCEDURE`, cleared on `BEGIN` (spec.md §4.3 rule 1).
    /// Tells a declaration-position colon (`X : Date`, a parameter type, a
    /// return type) apart from a statement-level colon (a `CASE` label, a
    /// `<label> :`) that happens to precede the same type-spelling word.
    pub in_declaration_list: bool,
}

impl ContextFlags {
    pub fn new() -> Self {
        ContextFlags {
            brace_depth: 0,
            bracket_depth: 0,
            in_property_value: false,
            field_def_column: FieldDefColumn::None,
            current_section_type: None,
            code_block_depth: 0,
            in_declaration_list: false,
        }
    }

    /// Advances the field-def column state machine. Per spec.md §9 Open
    /// Question 1, this is driven strictly by `;`, never by newlines.
    pub fn advance_field_column(&mut self) {
        self.field_def_column = match self.field_def_column {
            FieldDefColumn::None => FieldDefColumn::None,
            FieldDefColumn::Col1 => FieldDefColumn::Col2,
            FieldDefColumn::Col2 => FieldDefColumn::Col3,
            FieldDefColumn::Col3 => FieldDefColumn::Col4,
            FieldDefColumn::Col4 => FieldDefColumn::Properties,
            FieldDefColumn::Properties => FieldDefColumn::Properties,
        };
    }

    pub fn enter_field_row(&mut self) {
        self.field_def_column = FieldDefColumn::Col1;
    }

    pub fn exit_field_row(&mut self) {
        self.field_def_column = FieldDefColumn::None;
    }
}

impl Default for ContextFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of lexer context suitable for diagnostics (spec.md §6,
/// `getContextState()`).
#[derive(Debug, Clone)]
pub struct ContextState {
    pub context_stack: Vec<String>,
    pub brace_depth: u32,
    pub bracket_depth: u32,
    pub in_property_value: bool,
    pub field_def_column: &'static str,
    pub current_section_type: Option<&'static str>,
    pub context_underflow_detected: bool,
}

impl FieldDefColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldDefColumn::None => "NONE",
            FieldDefColumn::Col1 => "COL_1",
            FieldDefColumn::Col2 => "COL_2",
            FieldDefColumn::Col3 => "COL_3",
            FieldDefColumn::Col4 => "COL_4",
            FieldDefColumn::Properties => "PROPERTIES",
        }
    }
}

impl SectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Fields => "FIELDS",
            SectionType::Keys => "KEYS",
            SectionType::FieldGroups => "FIELDGROUPS",
            SectionType::Controls => "CONTROLS",
            SectionType::Elements => "ELEMENTS",
            SectionType::DataItems => "DATAITEMS",
            SectionType::Actions => "ACTIONS",
            SectionType::Dataset => "DATASET",
            SectionType::RequestPage => "REQUESTPAGE",
            SectionType::Labels => "LABELS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underflow_is_recorded_not_fatal() {
        let mut ctx = ContextStack::new();
        assert!(ctx.pop().is_none());
        assert!(ctx.underflow_detected());
        assert_eq!(ctx.top(), LexMode::Normal);
    }

    #[test]
    fn push_pop_round_trips() {
        let mut ctx = ContextStack::new();
        ctx.push(LexMode::ObjectLevel);
        ctx.push(LexMode::Properties);
        assert_eq!(ctx.top(), LexMode::Properties);
        assert_eq!(ctx.pop(), Some(LexMode::Properties));
        assert_eq!(ctx.top(), LexMode::ObjectLevel);
        assert!(!ctx.underflow_detected());
    }

    #[test]
    fn field_column_advances_only_through_explicit_calls() {
        let mut flags = ContextFlags::new();
        flags.enter_field_row();
        assert_eq!(flags.field_def_column, FieldDefColumn::Col1);
        flags.advance_field_column();
        assert_eq!(flags.field_def_column, FieldDefColumn::Col2);
        flags.advance_field_column();
        flags.advance_field_column();
        assert_eq!(flags.field_def_column, FieldDefColumn::Col4);
        flags.advance_field_column();
        assert_eq!(flags.field_def_column, FieldDefColumn::Properties);
        // Past the last column, further advances are idempotent.
        flags.advance_field_column();
        assert_eq!(flags.field_def_column, FieldDefColumn::Properties);
    }
}
