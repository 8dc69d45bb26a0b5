//! Keyword table for the built-in lexical surface.
//!
//! Identifiers come out of the flat scanner as [`TokenKind::Ident`] and are
//! promoted to keyword kinds here, so the raw token rules stay independent
//! of the keyword set.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use super::token::TokenKind;

static KEYWORDS: LazyLock<FxHashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = FxHashMap::default();
    map.insert("type", TokenKind::TypeKw);
    map.insert("interface", TokenKind::InterfaceKw);
    map.insert("fn", TokenKind::FnKw);
    map.insert("let", TokenKind::LetKw);
    map.insert("return", TokenKind::ReturnKw);
    map.insert("if", TokenKind::IfKw);
    map.insert("else", TokenKind::ElseKw);
    map.insert("while", TokenKind::WhileKw);
    map.insert("for", TokenKind::ForKw);
    map.insert("true", TokenKind::TrueKw);
    map.insert("false", TokenKind::FalseKw);
    map.insert("null", TokenKind::NullKw);
    map
});

/// Look up the keyword kind for an identifier, if it is one.
pub fn keyword_kind(ident: &str) -> Option<TokenKind> {
    KEYWORDS.get(ident).copied()
}
