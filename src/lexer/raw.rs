//! Logos-based flat scanner for the default lexer state.
//!
//! Multi-line constructs are not handled here: `/*` and `<<<` surface as
//! state-entry tokens and the stateful driver in [`super`] takes over.

use logos::Logos;

use super::token::TokenKind;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"\r?\n")]
    Newline,

    #[regex(r"//[^\n]*")]
    LineComment,

    // =========================================================================
    // STATE ENTRY (handled by the stateful driver)
    // =========================================================================
    #[token("/*")]
    BlockCommentOpen,

    #[token("<<<")]
    HeredocOpen,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    // Escapes never swallow a line break; no token crosses a newline.
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,

    // =========================================================================
    // PUNCTUATION (multi-character first)
    // =========================================================================
    #[token("->")]
    Arrow,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> Self {
        use RawToken::*;
        match raw {
            Whitespace => TokenKind::Whitespace,
            Newline => TokenKind::Newline,
            LineComment => TokenKind::LineComment,

            // The driver replaces these before a token is emitted.
            BlockCommentOpen => TokenKind::BlockComment,
            HeredocOpen => TokenKind::HeredocStart,

            Ident => TokenKind::Ident,
            Number => TokenKind::Number,
            String => TokenKind::String,

            Arrow => TokenKind::Arrow,
            LBrace => TokenKind::LBrace,
            RBrace => TokenKind::RBrace,
            LParen => TokenKind::LParen,
            RParen => TokenKind::RParen,
            LBracket => TokenKind::LBracket,
            RBracket => TokenKind::RBracket,
            Semicolon => TokenKind::Semicolon,
            Comma => TokenKind::Comma,
            Dot => TokenKind::Dot,
            Colon => TokenKind::Colon,
            Eq => TokenKind::Eq,
            Lt => TokenKind::Lt,
            Gt => TokenKind::Gt,
            Plus => TokenKind::Plus,
            Minus => TokenKind::Minus,
            Star => TokenKind::Star,
            Slash => TokenKind::Slash,
            Percent => TokenKind::Percent,
            Amp => TokenKind::Amp,
            Pipe => TokenKind::Pipe,
            Bang => TokenKind::Bang,
            Question => TokenKind::Question,
        }
    }
}
