// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

/// Odin keywords; none of them may be used as a type or package name.
const ODIN_KEYWORDS: &[&str] = &[
    "asm",
    "auto_cast",
    "bit_field",
    "bit_set",
    "break",
    "case",
    "cast",
    "context",
    "continue",
    "defer",
    "distinct",
    "do",
    "dynamic",
    "else",
    "enum",
    "fallthrough",
    "for",
    "foreign",
    "if",
    "import",
    "in",
    "map",
    "matrix",
    "not_in",
    "or_break",
    "or_continue",
    "or_else",
    "or_return",
    "package",
    "proc",
    "return",
    "struct",
    "switch",
    "transmute",
    "typeid",
    "union",
    "using",
    "when",
    "where",
];

/// One `#assert(size_of(T) == N)` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertionLine<'a> {
    pub foreign_name: &'a str,
    pub byte_size: u64,
}

impl fmt::Display for AssertionLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#assert(size_of({}) == {})",
            self.foreign_name, self.byte_size
        )
    }
}

/// Package declaration that opens the generated file.
pub fn package_header(package: &str) -> String {
    format!("package {package}")
}

/// `true` for an ASCII Odin identifier that is not a keyword.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic());
    head_ok && chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) && !is_keyword(name)
}

pub fn is_keyword(name: &str) -> bool {
    ODIN_KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_line_format() {
        let line = AssertionLine {
            foreign_name: "Rect",
            byte_size: 16,
        };
        assert_eq!(line.to_string(), "#assert(size_of(Rect) == 16)");
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("Config_Stack_Vec2"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("2D_Rect"));
        assert!(!is_identifier("Nine-Slice"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("context"));
        assert!(is_identifier("Context"));
    }
}
