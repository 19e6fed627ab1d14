//! Case-insensitive keyword tables. Centralized here per spec.md §9's
//! design note ("Implementers should centralize this in one function to
//! keep the rule set auditable").

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::token::TokenKind;

/// Keywords whose meaning does *not* depend on surrounding context.
static PLAIN_KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("OBJECT", Object),
        ("TABLE", Table),
        ("PAGE", Page),
        ("CODEUNIT", Codeunit),
        ("REPORT", Report),
        ("QUERY", Query),
        ("XMLPORT", XmlPort),
        ("MENUSUITE", MenuSuite),
        ("PROPERTIES", Properties),
        ("FIELDS", Fields),
        ("KEYS", Keys),
        ("FIELDGROUPS", FieldGroups),
        ("CONTROLS", Controls),
        ("ACTIONS", Actions),
        ("ELEMENTS", Elements),
        ("DATASET", Dataset),
        ("REQUESTPAGE", RequestPage),
        ("LABELS", Labels),
        ("VAR", Var),
        ("TEMPORARY", Temporary),
        ("LOCAL", Local),
        ("PROCEDURE", Procedure),
        ("FUNCTION", Function),
        ("IF", If),
        ("THEN", Then),
        ("ELSE", Else),
        ("WHILE", While),
        ("DO", Do),
        ("REPEAT", Repeat),
        ("UNTIL", Until),
        ("FOR", For),
        ("TO", To),
        ("DOWNTO", Downto),
        ("WITH", With),
        ("OF", Of),
        ("CASE", Case),
        ("EXIT", Exit),
        ("AND", And),
        ("OR", Or),
        ("XOR", Xor),
        ("NOT", Not),
        ("DIV", Div),
        ("MOD", Mod),
        ("IN", In),
        ("BOOLEAN", Boolean),
        ("OPTION", OptionType),
        ("RECORD", Record),
        ("TEXT", TextType),
        ("INTEGER", IntegerType),
        ("DECIMAL", DecimalType),
    ])
});

/// The section keywords named in spec.md §4.6's recovery rule and §4.2's
/// push table. Order-independent; membership is what matters.
pub const SECTION_KEYWORD_SPELLINGS: &[&str] = &[
    "FIELDS",
    "KEYS",
    "PROPERTIES",
    "CONTROLS",
    "ACTIONS",
    "ELEMENTS",
    "DATASET",
    "FIELDGROUPS",
    "REQUESTPAGE",
    "LABELS",
];

/// Trigger property names (field-level and object-level) that expect an
/// optional `VAR` block then a `BEGIN … END` body (spec.md §4.6).
pub const TRIGGER_NAMES: &[&str] = &[
    "ONVALIDATE",
    "ONLOOKUP",
    "ONINSERT",
    "ONMODIFY",
    "ONDELETE",
    "ONRENAME",
    "ONRUN",
    "ONOPENPAGE",
    "ONCLOSEPAGE",
    "ONAFTERGETRECORD",
    "ONPREDATAITEM",
    "ONAFTERGETCURRROW",
    "ONACTION",
];

/// Looks up the case-insensitive keyword for `text`, if any, ignoring
/// context-dependent spellings (CODE/Date/Time/Boolean — those are
/// resolved by the scanner's disambiguator, not this table).
pub fn lookup_plain(text: &str) -> Option<TokenKind> {
    PLAIN_KEYWORDS.get(text.to_ascii_uppercase().as_str()).copied()
}

pub fn is_section_keyword(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    SECTION_KEYWORD_SPELLINGS.contains(&upper.as_str())
}

pub fn is_trigger_name(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    TRIGGER_NAMES.contains(&upper.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup_plain("begin"), None); // BEGIN/END handled specially by the scanner
        assert_eq!(lookup_plain("if"), Some(TokenKind::If));
        assert_eq!(lookup_plain("IF"), Some(TokenKind::If));
        assert_eq!(lookup_plain("If"), Some(TokenKind::If));
    }

    #[test]
    fn unknown_word_is_not_a_keyword() {
        assert_eq!(lookup_plain("CustomerCode"), None);
    }

    #[test]
    fn section_keyword_membership() {
        assert!(is_section_keyword("fields"));
        assert!(is_section_keyword("DATASET"));
        assert!(!is_section_keyword("CODE"));
    }

    #[test]
    fn trigger_name_membership() {
        assert!(is_trigger_name("OnValidate"));
        assert!(!is_trigger_name("OnBogus"));
    }
}
