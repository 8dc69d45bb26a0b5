//! Parse results and diagnostics.

use std::time::Duration;

use text_size::TextRange;
use thiserror::Error;

use crate::base::Snapshot;
use crate::lexer::{Token, TokenCache};

use super::node::StructuralNode;

/// Upper bound on diagnostics collected in one run. Recording past the cap
/// aborts the run and marks the result as overflowed, which keeps cost
/// bounded on pathological input (binary files misdetected as source).
pub const MAX_DIAGNOSTICS: usize = 100;

/// A syntax problem tied to a source range. Diagnostics are data, never
/// control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub range: TextRange,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.range, self.message)
    }
}

/// Why a parse run produced no result.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    /// The run observed its cancellation token. Not a failure: the
    /// scheduler starts a fresh run for the newest snapshot.
    #[error("parse run cancelled")]
    Cancelled,
    /// The run panicked. Caught at the run boundary so the pipeline stays
    /// usable; the previous published result remains current.
    #[error("parse run panicked: {0}")]
    Panicked(String),
}

/// Everything one parse run produced, bound to one snapshot version.
///
/// Immutable once published. Consumers share it behind an `Arc` and must
/// never combine tokens or tree with artifacts of a different version.
#[derive(Debug)]
pub struct ParseResult {
    snapshot: Snapshot,
    tokens: TokenCache,
    root: StructuralNode,
    diagnostics: Vec<Diagnostic>,
    diagnostics_overflowed: bool,
    elapsed: Duration,
}

impl ParseResult {
    pub(crate) fn new(
        snapshot: Snapshot,
        tokens: TokenCache,
        root: StructuralNode,
        diagnostics: Vec<Diagnostic>,
        diagnostics_overflowed: bool,
        elapsed: Duration,
    ) -> Self {
        Self {
            snapshot,
            tokens,
            root,
            diagnostics,
            diagnostics_overflowed,
            elapsed,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Version of the snapshot this result describes.
    pub fn version(&self) -> u64 {
        self.snapshot.version()
    }

    pub fn tokens(&self) -> &[Token] {
        self.tokens.tokens()
    }

    /// The token cache, for incremental reuse by a later lex.
    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn root(&self) -> &StructuralNode {
        &self.root
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True if the run hit [`MAX_DIAGNOSTICS`] and returned early with a
    /// partial tree.
    pub fn diagnostics_overflowed(&self) -> bool {
        self.diagnostics_overflowed
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Collects diagnostics up to [`MAX_DIAGNOSTICS`].
#[derive(Debug, Default)]
pub(crate) struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    overflowed: bool,
}

impl DiagnosticSink {
    /// Record a diagnostic. Returns `false` once the cap is hit; the
    /// overflowing diagnostic itself is not recorded and the caller is
    /// expected to stop.
    pub(crate) fn push(&mut self, diagnostic: Diagnostic) -> bool {
        if self.diagnostics.len() >= MAX_DIAGNOSTICS {
            self.overflowed = true;
            return false;
        }
        self.diagnostics.push(diagnostic);
        true
    }

    pub(crate) fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub(crate) fn into_parts(self) -> (Vec<Diagnostic>, bool) {
        (self.diagnostics, self.overflowed)
    }
}
