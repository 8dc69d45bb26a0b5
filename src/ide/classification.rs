//! Syntax classification.
//!
//! A fixed kind-to-category table over the token sequence; no tree
//! traversal involved. Pure function of one parse result.

use text_size::TextRange;

use crate::lexer::TokenKind;
use crate::syntax::ParseResult;

/// Display category for a classified span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Keyword,
    Identifier,
    Number,
    String,
    Comment,
    Operator,
    Punctuation,
}

/// A classified region of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedSpan {
    pub range: TextRange,
    pub category: Category,
}

/// The fixed classification table. Whitespace and malformed input carry no
/// category.
pub fn classify_kind(kind: TokenKind) -> Option<Category> {
    use TokenKind::*;
    let category = match kind {
        Whitespace | Newline | Error => return None,

        LineComment | BlockComment | BlockCommentContinuation => Category::Comment,

        Ident => Category::Identifier,
        Number => Category::Number,
        String | HeredocStart | HeredocBody | HeredocEnd => Category::String,

        Arrow | Eq | Lt | Gt | Plus | Minus | Star | Slash | Percent | Amp | Pipe | Bang
        | Question => Category::Operator,

        LBrace | RBrace | LParen | RParen | LBracket | RBracket | Semicolon | Comma | Dot
        | Colon => Category::Punctuation,

        TypeKw | InterfaceKw | FnKw | LetKw | ReturnKw | IfKw | ElseKw | WhileKw | ForKw
        | TrueKw | FalseKw | NullKw => Category::Keyword,
    };
    Some(category)
}

/// Classified spans for every token intersecting `range`, in source order.
pub fn classification_spans(result: &ParseResult, range: TextRange) -> Vec<ClassifiedSpan> {
    let tokens = result.tokens();
    let first = tokens.partition_point(|t| t.end() <= range.start());

    tokens[first..]
        .iter()
        .take_while(|t| t.offset < range.end())
        .filter_map(|t| {
            classify_kind(t.kind).map(|category| ClassifiedSpan {
                range: t.range(),
                category,
            })
        })
        .collect()
}
