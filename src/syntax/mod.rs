//! Structural model: tree, diagnostics, and the [`ParseResult`] bundle.
//!
//! A parse run turns one [`Snapshot`] into one immutable [`ParseResult`].
//! Everything downstream (classification, outlining, navigation) is a pure
//! projection of that bundle.

mod builder;
mod node;
mod result;

pub use node::{NodeKind, StructuralNode};
pub use result::{Diagnostic, MAX_DIAGNOSTICS, ParseResult, RunError};

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::base::Snapshot;
use crate::lexer::TokenCache;

/// Parse a snapshot to completion, without cancellation.
///
/// The background scheduler drives [`parse_with`] instead; this entry point
/// serves synchronous callers and tests.
pub fn parse(snapshot: Snapshot) -> ParseResult {
    match parse_with(snapshot, None, &CancellationToken::new()) {
        Ok(result) => result,
        Err(_) => unreachable!("a fresh cancellation token is never signalled"),
    }
}

/// Run one parse: lex (or reuse a token cache), build the structural tree,
/// and bundle the outcome.
///
/// `cache`, when given, must have been produced from `snapshot`'s text;
/// the run then skips lexing entirely.
pub fn parse_with(
    snapshot: Snapshot,
    cache: Option<TokenCache>,
    cancel: &CancellationToken,
) -> Result<ParseResult, RunError> {
    let started = Instant::now();

    let cache = match cache {
        Some(cache) => cache,
        None => TokenCache::build(snapshot.text(), cancel).ok_or(RunError::Cancelled)?,
    };

    let (root, diagnostics, overflowed) = builder::build(cache.tokens(), cancel)?;

    Ok(ParseResult::new(
        snapshot,
        cache,
        root,
        diagnostics,
        overflowed,
        started.elapsed(),
    ))
}
