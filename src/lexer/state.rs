//! Resumable lexer state.

use smol_str::SmolStr;

/// The context needed to resume lexing at a token boundary.
///
/// This is pure data: scanning never mutates a shared state, it threads a
/// value through the transition function. Two states compare equal iff all
/// fields match, which is what the incremental re-lexer relies on to prove
/// an edit's effect has stopped propagating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LexerState {
    /// Ordinary scanning.
    #[default]
    Default,
    /// Inside a `/* ... */` comment that has not closed yet.
    BlockComment,
    /// Inside a `<<<LABEL` string.
    ///
    /// `brace_depth` counts interpolation braces; the closing line is only
    /// recognized at depth zero, and only when its identifier matches
    /// `label` exactly.
    Heredoc { label: SmolStr, brace_depth: u32 },
}

impl LexerState {
    pub fn is_default(&self) -> bool {
        matches!(self, LexerState::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_field_wise() {
        let a = LexerState::Heredoc {
            label: SmolStr::new("EOT"),
            brace_depth: 1,
        };
        let b = LexerState::Heredoc {
            label: SmolStr::new("EOT"),
            brace_depth: 1,
        };
        let c = LexerState::Heredoc {
            label: SmolStr::new("EOF"),
            brace_depth: 1,
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, LexerState::BlockComment);
    }
}
