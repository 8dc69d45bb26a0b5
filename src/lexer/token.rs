//! Token representation.

use text_size::{TextRange, TextSize};

/// Which stream a token belongs to.
///
/// Trivia (whitespace and comments) is kept in the token sequence so it
/// stays classifiable, but structural parsing only looks at the default
/// channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Default,
    Trivia,
}

/// Closed set of token kinds for the built-in lexical surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    Whitespace,
    Newline,
    LineComment,
    /// A block comment opened with `/*` on this line.
    BlockComment,
    /// The portion of a block comment carried onto a subsequent line.
    BlockCommentContinuation,

    // =========================================================================
    // LITERALS
    // =========================================================================
    Ident,
    Number,
    String,
    /// `<<<LABEL` opening a multi-line string.
    HeredocStart,
    /// A line segment inside a multi-line string body.
    HeredocBody,
    /// The closing line whose identifier matches the opening label.
    HeredocEnd,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Colon,
    Arrow,
    Eq,
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Bang,
    Question,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    TypeKw,
    InterfaceKw,
    FnKw,
    LetKw,
    ReturnKw,
    IfKw,
    ElseKw,
    WhileKw,
    ForKw,
    TrueKw,
    FalseKw,
    NullKw,

    /// A character sequence no rule matched.
    Error,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::BlockCommentContinuation
        )
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::TypeKw
                | TokenKind::InterfaceKw
                | TokenKind::FnKw
                | TokenKind::LetKw
                | TokenKind::ReturnKw
                | TokenKind::IfKw
                | TokenKind::ElseKw
                | TokenKind::WhileKw
                | TokenKind::ForKw
                | TokenKind::TrueKw
                | TokenKind::FalseKw
                | TokenKind::NullKw
        )
    }

    pub fn channel(self) -> Channel {
        if self.is_trivia() {
            Channel::Trivia
        } else {
            Channel::Default
        }
    }
}

/// A token with its kind and position.
///
/// Tokens are contiguous: each starts where the previous one ended, and
/// together they cover the lexed range exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: TextSize,
    pub len: TextSize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: TextSize, len: TextSize) -> Self {
        Self { kind, offset, len }
    }

    pub fn end(&self) -> TextSize {
        self.offset + self.len
    }

    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.len)
    }

    pub fn channel(&self) -> Channel {
        self.kind.channel()
    }

    /// The token's text within the snapshot it was lexed from.
    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia_channel() {
        assert_eq!(TokenKind::Whitespace.channel(), Channel::Trivia);
        assert_eq!(TokenKind::BlockCommentContinuation.channel(), Channel::Trivia);
        assert_eq!(TokenKind::Ident.channel(), Channel::Default);
        assert_eq!(TokenKind::HeredocBody.channel(), Channel::Default);
    }

    #[test]
    fn test_token_range() {
        let token = Token::new(TokenKind::Ident, TextSize::new(4), TextSize::new(5));
        assert_eq!(token.end(), TextSize::new(9));
        assert_eq!(token.text("let value = 1;"), "value");
    }
}
