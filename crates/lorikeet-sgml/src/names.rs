//! Name character classes and case folding.
//!
//! Two grammars are supported. The strict one is the ASCII reference concrete
//! syntax: a name starts with a Latin letter and continues with letters,
//! digits, `.`, `-`, `_` and `:`. The XML 1.0 grammar widens both classes to
//! the productions below.

/// The name grammar in effect for a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameSyntax {
    /// ASCII-only reference concrete syntax.
    #[default]
    Strict,
    /// XML 1.0 `NameStartChar` / `NameChar`.
    Xml10,
}

impl NameSyntax {
    /// Pick the grammar from the `accept_xml_1_0_names` option.
    #[must_use]
    pub const fn from_flag(accept_xml_1_0_names: bool) -> Self {
        if accept_xml_1_0_names {
            Self::Xml10
        } else {
            Self::Strict
        }
    }

    /// May `c` begin a name?
    #[must_use]
    pub const fn is_name_start(self, c: char) -> bool {
        match self {
            Self::Strict => c.is_ascii_alphabetic(),
            Self::Xml10 => is_xml_name_start_char(c as u32),
        }
    }

    /// May `c` continue a name?
    #[must_use]
    pub const fn is_name_char(self, c: char) -> bool {
        match self {
            Self::Strict => c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'),
            Self::Xml10 => is_xml_name_char(c as u32),
        }
    }
}

/// ```text
/// [4] NameStartChar ::= ":" | [A-Z] | "_" | [a-z] | [#xC0-#xD6] | [#xD8-#xF6] | [#xF8-#x2FF]
///                     | [#x370-#x37D] | [#x37F-#x1FFF] | [#x200C-#x200D] | [#x2070-#x218F]
///                     | [#x2C00-#x2FEF] | [#x3001-#xD7FF] | [#xF900-#xFDCF] | [#xFDF0-#xFFFD]
///                     | [#x10000-#xEFFFF]
/// ```
const fn is_xml_name_start_char(c: u32) -> bool {
    matches!(c,
        0x3A
        | 0x41..=0x5A
        | 0x5F
        | 0x61..=0x7A
        | 0xC0..=0xD6
        | 0xD8..=0xF6
        | 0xF8..=0x2FF
        | 0x370..=0x37D
        | 0x37F..=0x1FFF
        | 0x200C..=0x200D
        | 0x2070..=0x218F
        | 0x2C00..=0x2FEF
        | 0x3001..=0xD7FF
        | 0xF900..=0xFDCF
        | 0xFDF0..=0xFFFD
        | 0x10000..=0xEFFFF
    )
}

/// ```text
/// [4a] NameChar ::= NameStartChar | "-" | "." | [0-9] | #xB7 | [#x0300-#x036F] | [#x203F-#x2040]
/// ```
const fn is_xml_name_char(c: u32) -> bool {
    is_xml_name_start_char(c)
        || matches!(c,
            0x2D..=0x2E
            | 0x30..=0x39
            | 0xB7
            | 0x300..=0x36F
            | 0x203F..=0x2040
        )
}

/// Separator characters: space, tab, line feed, carriage return, form feed.
#[must_use]
pub const fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

/// Lookup key for a name: upper-cased when folding is enabled, otherwise the
/// name itself.
#[must_use]
pub fn fold(name: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        name.to_uppercase()
    } else {
        name.to_string()
    }
}

/// Compare a name against an upper-case keyword, honoring the folding option.
#[must_use]
pub fn keyword_eq(name: &str, keyword: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        name.eq_ignore_ascii_case(keyword)
    } else {
        name == keyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_name_start_is_latin_letter() {
        let syntax = NameSyntax::Strict;
        assert!(syntax.is_name_start('a'));
        assert!(syntax.is_name_start('Z'));
        assert!(!syntax.is_name_start('1'));
        assert!(!syntax.is_name_start('_'));
        assert!(!syntax.is_name_start('é'));
    }

    #[test]
    fn test_strict_name_chars() {
        let syntax = NameSyntax::Strict;
        for c in ['a', '9', '.', '-', '_', ':'] {
            assert!(syntax.is_name_char(c), "{c:?}");
        }
        assert!(!syntax.is_name_char('/'));
        assert!(!syntax.is_name_char(' '));
    }

    #[test]
    fn test_xml_names() {
        let syntax = NameSyntax::Xml10;
        assert!(syntax.is_name_start('_'));
        assert!(syntax.is_name_start('é'));
        assert!(!syntax.is_name_start('-'));
        assert!(syntax.is_name_char('\u{00B7}'));
        assert!(!syntax.is_name_char('\u{00D7}'));
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("meta", true), "META");
        assert_eq!(fold("meta", false), "meta");
        assert!(keyword_eq("doctype", "DOCTYPE", true));
        assert!(!keyword_eq("doctype", "DOCTYPE", false));
    }
}
