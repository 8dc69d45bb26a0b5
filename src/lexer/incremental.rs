//! Token cache and incremental re-lexing.
//!
//! The cache stores the lexer state at every token boundary. After an edit,
//! re-lexing starts at the last line boundary before the edit and stops at
//! the first line boundary past it where the recomputed state equals the
//! cached one (the fixed point); everything beyond is reused with shifted
//! offsets. The spliced result is always identical to lexing the whole new
//! buffer from the initial state.

use std::ops::Range;

use text_size::TextSize;
use tokio_util::sync::CancellationToken;

use crate::base::TextEdit;

use super::state::LexerState;
use super::token::{Token, TokenKind};
use super::Scanner;

/// How many tokens to lex between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// A token sequence with the lexer state cached at every boundary.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    tokens: Vec<Token>,
    /// `states[i]` is the state after `tokens[i]`.
    states: Vec<LexerState>,
}

/// Outcome of an incremental re-lex.
#[derive(Debug)]
pub struct Relex {
    pub cache: TokenCache,
    /// Indices of the tokens that were freshly scanned (everything outside
    /// this range was reused from the previous cache).
    pub fresh: Range<usize>,
}

impl TokenCache {
    /// Lex an entire buffer from the initial state.
    pub fn new(text: &str) -> Self {
        Self::build(text, &CancellationToken::new()).unwrap_or_default()
    }

    /// Lex an entire buffer, checking `cancel` at bounded intervals.
    /// Returns `None` if the token was signalled mid-scan.
    pub fn build(text: &str, cancel: &CancellationToken) -> Option<Self> {
        let mut scanner = Scanner::new(text, 0, LexerState::Default);
        let mut tokens = Vec::new();
        let mut states = Vec::new();
        while let Some(token) = scanner.next_token() {
            tokens.push(token);
            states.push(scanner.state().clone());
            if tokens.len() % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return None;
            }
        }
        Some(Self { tokens, states })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The cached state after token `index`.
    pub fn state_after(&self, index: usize) -> Option<&LexerState> {
        self.states.get(index)
    }

    /// The state at the end of the lexed range.
    pub fn end_state(&self) -> LexerState {
        self.states.last().cloned().unwrap_or_default()
    }

    /// Byte length of the text this cache was lexed from.
    pub fn end_offset(&self) -> TextSize {
        self.tokens.last().map_or(TextSize::new(0), Token::end)
    }

    /// Re-lex after an edit.
    ///
    /// `new_text` must be the result of applying `edit` to the text this
    /// cache was built from; if the edit does not fit the cache, the whole
    /// buffer is lexed from scratch.
    pub fn relex(&self, new_text: &str, edit: TextEdit) -> Relex {
        if usize::from(edit.replaced.end()) > usize::from(self.end_offset()) {
            let cache = TokenCache::new(new_text);
            let fresh = 0..cache.len();
            return Relex { cache, fresh };
        }

        let edit_start = usize::from(edit.replaced.start());
        let prefix_len = self.line_start_boundary(edit_start);
        let (start_pos, start_state) = if prefix_len == 0 {
            (0, LexerState::Default)
        } else {
            (
                usize::from(self.tokens[prefix_len - 1].end()),
                self.states[prefix_len - 1].clone(),
            )
        };

        let mut tokens = self.tokens[..prefix_len].to_vec();
        let mut states = self.states[..prefix_len].to_vec();

        let delta = edit.delta();
        let new_edit_end = usize::from(edit.new_end());

        let mut scanner = Scanner::new(new_text, start_pos, start_state);
        let mut fresh_count = 0;
        while let Some(token) = scanner.next_token() {
            let kind = token.kind;
            let end = usize::from(token.end());
            tokens.push(token);
            states.push(scanner.state().clone());
            fresh_count += 1;

            // A line boundary past the edit is a fixed-point candidate: if
            // the previous lex reached the matching boundary in the same
            // state, the edit's effect cannot propagate further.
            if kind == TokenKind::Newline && end >= new_edit_end {
                let old_end = end as i64 - delta;
                if old_end < 0 {
                    continue;
                }
                if let Some(index) = self.boundary_at(old_end as usize) {
                    if self.tokens[index].kind == TokenKind::Newline
                        && self.states[index] == *scanner.state()
                    {
                        self.splice_suffix(index, delta, &mut tokens, &mut states);
                        return Relex {
                            cache: TokenCache { tokens, states },
                            fresh: prefix_len..prefix_len + fresh_count,
                        };
                    }
                }
            }
        }

        // No fixed point before end of buffer.
        Relex {
            cache: TokenCache { tokens, states },
            fresh: prefix_len..prefix_len + fresh_count,
        }
    }

    /// Number of leading tokens to reuse: everything up to and including
    /// the last newline token ending at or before `offset`.
    fn line_start_boundary(&self, offset: usize) -> usize {
        let upper = self
            .tokens
            .partition_point(|t| usize::from(t.end()) <= offset);
        self.tokens[..upper]
            .iter()
            .rposition(|t| t.kind == TokenKind::Newline)
            .map_or(0, |i| i + 1)
    }

    /// Index of the token ending exactly at `end`, if any.
    fn boundary_at(&self, end: usize) -> Option<usize> {
        self.tokens
            .binary_search_by_key(&end, |t| usize::from(t.end()))
            .ok()
    }

    /// Append the cached tokens after `index` with offsets shifted by
    /// `delta`.
    fn splice_suffix(
        &self,
        index: usize,
        delta: i64,
        tokens: &mut Vec<Token>,
        states: &mut Vec<LexerState>,
    ) {
        for (token, state) in self.tokens[index + 1..]
            .iter()
            .zip(&self.states[index + 1..])
        {
            let offset = TextSize::new((i64::from(u32::from(token.offset)) + delta) as u32);
            tokens.push(Token::new(token.kind, offset, token.len));
            states.push(state.clone());
        }
    }
}
