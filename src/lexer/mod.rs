//! Stateful tokenizer with incremental re-lexing.
//!
//! Flat scanning of ordinary code uses **logos**; the multi-line constructs
//! (block comments, `<<<LABEL` strings) are driven by an explicit
//! [`LexerState`] value threaded through the scan. Every line boundary is a
//! token boundary, so the state cached at token boundaries is enough to
//! resume lexing at any line start.
//!
//! Incremental re-lexing lives in [`TokenCache::relex`]: after an edit, only
//! the affected region is re-scanned, and scanning stops at the first line
//! boundary where the recomputed state equals the previously cached one.

mod incremental;
mod keywords;
mod raw;
mod state;
mod token;

pub use incremental::{Relex, TokenCache};
pub use keywords::keyword_kind;
pub use state::LexerState;
pub use token::{Channel, Token, TokenKind};

use logos::Logos;
use smol_str::SmolStr;
use text_size::TextSize;
use unicode_ident::{is_xid_continue, is_xid_start};

use raw::RawToken;

/// Tokenize an entire buffer from the initial state.
pub fn tokenize(text: &str) -> TokenCache {
    TokenCache::new(text)
}

/// The transition function: scans one token at a time, threading the
/// [`LexerState`] as a value. Re-entrant; a scanner positioned at a line
/// start with the cached state for that boundary produces exactly the same
/// tokens a full scan would.
pub(crate) struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    state: LexerState,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(text: &'a str, pos: usize, state: LexerState) -> Self {
        Self { text, pos, state }
    }

    pub(crate) fn state(&self) -> &LexerState {
        &self.state
    }

    pub(crate) fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let kind = match self.state.clone() {
            LexerState::Default => self.scan_default(),
            LexerState::BlockComment => self.scan_block_comment(),
            LexerState::Heredoc { label, brace_depth } => self.scan_heredoc(&label, brace_depth),
        };
        Some(Token::new(
            kind,
            TextSize::new(start as u32),
            TextSize::new((self.pos - start) as u32),
        ))
    }

    // =========================================================================
    // Default state
    // =========================================================================

    fn scan_default(&mut self) -> TokenKind {
        let rest = &self.text[self.pos..];
        // A fresh logos lexer per token keeps scanning restartable at every
        // boundary; only the first match is taken.
        let mut lexer = RawToken::lexer(rest);
        match lexer.next() {
            Some(Ok(RawToken::BlockCommentOpen)) => {
                self.pos += 2;
                self.finish_comment_line(TokenKind::BlockComment)
            }
            Some(Ok(RawToken::HeredocOpen)) => {
                self.pos += 3;
                self.scan_heredoc_open()
            }
            Some(Ok(RawToken::Ident)) => {
                let slice = lexer.slice();
                self.pos += slice.len();
                keyword_kind(slice).unwrap_or(TokenKind::Ident)
            }
            Some(Ok(raw)) => {
                self.pos += lexer.slice().len();
                raw.into()
            }
            Some(Err(())) | None => {
                let len = lexer.slice().len();
                if len > 0 {
                    self.pos += len;
                } else {
                    self.pos += rest.chars().next().map_or(1, char::len_utf8);
                }
                TokenKind::Error
            }
        }
    }

    // =========================================================================
    // Block comments
    // =========================================================================

    fn scan_block_comment(&mut self) -> TokenKind {
        if let Some(len) = line_break_len(self.text, self.pos) {
            self.pos += len;
            return TokenKind::Newline;
        }
        self.finish_comment_line(TokenKind::BlockCommentContinuation)
    }

    /// Consume comment content up to `*/` or the end of the line.
    fn finish_comment_line(&mut self, kind: TokenKind) -> TokenKind {
        let bytes = self.text.as_bytes();
        let mut i = self.pos;
        while i < bytes.len() && line_break_len(self.text, i).is_none() {
            if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                self.pos = i + 2;
                self.state = LexerState::Default;
                return kind;
            }
            i += 1;
        }
        self.pos = i;
        self.state = LexerState::BlockComment;
        kind
    }

    // =========================================================================
    // Heredoc strings
    // =========================================================================

    /// Called with the `<<<` already consumed.
    fn scan_heredoc_open(&mut self) -> TokenKind {
        let rest = &self.text[self.pos..];
        let label_len = leading_ident_len(rest);
        if label_len == 0 {
            // `<<<` without a label does not open a string.
            return TokenKind::Error;
        }
        let label = SmolStr::new(&rest[..label_len]);
        self.pos += label_len;
        self.state = LexerState::Heredoc {
            label,
            brace_depth: 0,
        };
        TokenKind::HeredocStart
    }

    fn scan_heredoc(&mut self, label: &str, brace_depth: u32) -> TokenKind {
        if let Some(len) = line_break_len(self.text, self.pos) {
            self.pos += len;
            return TokenKind::Newline;
        }

        // The closing line is only recognized at interpolation depth zero,
        // and only when its leading identifier matches the label exactly.
        if brace_depth == 0 && self.at_line_start() {
            if let Some(close_len) = match_heredoc_close(&self.text[self.pos..], label) {
                self.pos += close_len;
                self.state = LexerState::Default;
                return TokenKind::HeredocEnd;
            }
        }

        // Body segment to the end of the line, folding interpolation braces
        // into the nesting depth.
        let mut depth = brace_depth;
        let bytes = self.text.as_bytes();
        let mut i = self.pos;
        while i < bytes.len() && line_break_len(self.text, i).is_none() {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }
        self.pos = i;
        self.state = LexerState::Heredoc {
            label: SmolStr::new(label),
            brace_depth: depth,
        };
        TokenKind::HeredocBody
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.text.as_bytes()[self.pos - 1] == b'\n'
    }
}

/// Length of the line break at `pos`, if there is one.
fn line_break_len(text: &str, pos: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes.get(pos) {
        Some(b'\n') => Some(1),
        Some(b'\r') if bytes.get(pos + 1) == Some(&b'\n') => Some(2),
        _ => None,
    }
}

/// Byte length of the identifier at the start of `text` (0 if none).
fn leading_ident_len(text: &str) -> usize {
    let mut len = 0;
    for c in text.chars() {
        let continues = if len == 0 {
            is_xid_start(c) || c == '_'
        } else {
            is_xid_continue(c)
        };
        if !continues {
            break;
        }
        len += c.len_utf8();
    }
    len
}

/// Match a heredoc closing line: the label, an optional `;`, then a line
/// break or end of input. Returns the number of bytes the close token
/// covers.
fn match_heredoc_close(rest: &str, label: &str) -> Option<usize> {
    let ident_len = leading_ident_len(rest);
    if ident_len == 0 || &rest[..ident_len] != label {
        return None;
    }
    let mut end = ident_len;
    if rest[end..].starts_with(';') {
        end += 1;
    }
    if end == rest.len() || line_break_len(rest, end).is_some() {
        Some(end)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).tokens().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_declaration() {
        assert_eq!(
            kinds("type Vehicle {}"),
            vec![
                TokenKind::TypeKw,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::LBrace,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn test_tokens_are_contiguous() {
        let cache = tokenize("fn f() -> x { return 1.5e3; } // done\n");
        let mut expected = TextSize::new(0);
        for token in cache.tokens() {
            assert_eq!(token.offset, expected);
            assert!(token.len > TextSize::new(0));
            expected = token.end();
        }
        assert_eq!(expected, TextSize::new(38));
    }

    #[test]
    fn test_line_comment_stops_at_newline() {
        assert_eq!(
            kinds("// note\nx"),
            vec![TokenKind::LineComment, TokenKind::Newline, TokenKind::Ident]
        );
    }

    #[test]
    fn test_block_comment_single_line() {
        assert_eq!(
            kinds("/* note */ x"),
            vec![
                TokenKind::BlockComment,
                TokenKind::Whitespace,
                TokenKind::Ident,
            ]
        );
        let cache = tokenize("/* note */ x");
        assert_eq!(cache.end_state(), LexerState::Default);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        assert_eq!(
            kinds("/* a\nb\nc */ x"),
            vec![
                TokenKind::BlockComment,
                TokenKind::Newline,
                TokenKind::BlockCommentContinuation,
                TokenKind::Newline,
                TokenKind::BlockCommentContinuation,
                TokenKind::Whitespace,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_state() {
        let cache = tokenize("/* open\nstill inside");
        assert_eq!(cache.end_state(), LexerState::BlockComment);
    }

    #[test]
    fn test_heredoc_round_trip() {
        assert_eq!(
            kinds("<<<EOT\nhello\nEOT;\nx"),
            vec![
                TokenKind::HeredocStart,
                TokenKind::Newline,
                TokenKind::HeredocBody,
                TokenKind::Newline,
                TokenKind::HeredocEnd,
                TokenKind::Newline,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_heredoc_mismatched_label_does_not_close() {
        // `EOF` must not terminate a string opened with `EOT`.
        let cache = tokenize("<<<EOT\nhello\nEOF\nworld");
        let kinds: Vec<_> = cache.tokens().iter().map(|t| t.kind).collect();
        assert!(!kinds.contains(&TokenKind::HeredocEnd));
        assert_eq!(
            cache.end_state(),
            LexerState::Heredoc {
                label: SmolStr::new("EOT"),
                brace_depth: 0,
            }
        );
    }

    #[test]
    fn test_heredoc_close_requires_line_start() {
        // The label mid-line is body text, not a terminator.
        let cache = tokenize("<<<EOT\nsay EOT now\nEOT\n");
        let kinds: Vec<_> = cache.tokens().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds.iter().filter(|&&k| k == TokenKind::HeredocEnd).count(),
            1
        );
        assert_eq!(cache.end_state(), LexerState::Default);
    }

    #[test]
    fn test_heredoc_braces_defer_close() {
        // An open interpolation brace keeps the label line from closing.
        let cache = tokenize("<<<EOT\n{\nEOT\n}\nEOT\n");
        let tokens = cache.tokens();
        let end_index = tokens
            .iter()
            .position(|t| t.kind == TokenKind::HeredocEnd)
            .unwrap();
        // The first `EOT` line sits at brace depth 1 and stays body text;
        // only the one after `}` closes.
        let body_count = tokens[..end_index]
            .iter()
            .filter(|t| t.kind == TokenKind::HeredocBody)
            .count();
        assert_eq!(body_count, 3);
        assert_eq!(cache.end_state(), LexerState::Default);
    }

    #[test]
    fn test_heredoc_open_without_label() {
        assert_eq!(kinds("<<< x"), vec![
            TokenKind::Error,
            TokenKind::Whitespace,
            TokenKind::Ident,
        ]);
    }

    #[test]
    fn test_crlf_newlines() {
        assert_eq!(
            kinds("x\r\ny"),
            vec![TokenKind::Ident, TokenKind::Newline, TokenKind::Ident]
        );
    }

    #[test]
    fn test_string_and_number_literals() {
        assert_eq!(
            kinds(r#"let s = "a\"b";"#),
            vec![
                TokenKind::LetKw,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::Eq,
                TokenKind::Whitespace,
                TokenKind::String,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_unmatched_character_is_error() {
        assert!(kinds("a # b").contains(&TokenKind::Error));
    }
}
