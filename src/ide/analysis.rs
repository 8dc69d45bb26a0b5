//! Analyzer — the per-buffer pipeline facade.
//!
//! Owns the editing-surface state (current snapshot plus an incrementally
//! maintained token cache) and the background parser. Edits re-lex only
//! the touched region synchronously, then hand the spliced cache to the
//! scheduler so the structural build never starts from cold tokens.
//!
//! ## Usage
//!
//! ```ignore
//! let mut analyzer = Analyzer::new("type Car { }");
//!
//! // Apply an edit; analysis is requested in the background.
//! analyzer.apply_edit(range, "fn start() { }");
//!
//! // Consume the latest published result.
//! if let Some(result) = analyzer.current() {
//!     let outline = outline_regions(&result);
//! }
//! ```

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use text_size::TextRange;

use crate::base::{Snapshot, TextEdit, TextSize};
use crate::lexer::TokenCache;
use crate::sched::{BackgroundParser, SchedulerOptions};
use crate::syntax::ParseResult;

use super::classification::{ClassifiedSpan, classification_spans};
use super::navigation::{NavigationTarget, navigation_targets};
use super::outline::{OutlineRegion, outline_regions};

/// Per-buffer analysis pipeline.
pub struct Analyzer {
    snapshot: Snapshot,
    cache: TokenCache,
    parser: BackgroundParser,
}

impl Analyzer {
    pub fn new(text: &str) -> Self {
        Self::with_options(text, SchedulerOptions::default())
    }

    pub fn with_options(text: &str, options: SchedulerOptions) -> Self {
        let snapshot = Snapshot::new(text);
        let cache = TokenCache::new(snapshot.text());
        let parser = BackgroundParser::new(options);
        parser.set_input(snapshot.clone(), Some(cache.clone()));
        parser.request_parse(false);
        Self {
            snapshot,
            cache,
            parser,
        }
    }

    /// Apply an edit: build the successor snapshot, incrementally re-lex,
    /// and request a background parse for the new version.
    pub fn apply_edit(&mut self, replaced: TextRange, inserted: &str) {
        let next = self.snapshot.apply_edit(replaced, inserted);
        let edit = TextEdit::new(replaced, TextSize::of(inserted));

        let relex = self.cache.relex(next.text(), edit);
        self.cache = relex.cache;
        self.snapshot = next;

        self.parser
            .set_input(self.snapshot.clone(), Some(self.cache.clone()));
        self.parser.request_parse(false);
    }

    /// The editing surface's current snapshot (possibly newer than the
    /// latest published parse result).
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The incrementally maintained token cache for the current snapshot.
    pub fn tokens(&self) -> &TokenCache {
        &self.cache
    }

    /// The most recently published parse result.
    pub fn current(&self) -> Option<Arc<ParseResult>> {
        self.parser.latest()
    }

    /// Push notification for every published result.
    pub fn subscribe(&self) -> Receiver<Arc<ParseResult>> {
        self.parser.subscribe()
    }

    /// The underlying scheduler (for requesting immediate parses or
    /// inspecting stats).
    pub fn scheduler(&self) -> &BackgroundParser {
        &self.parser
    }

    // ==================== Projections over the current result ====================

    /// Outline regions of the latest result, or empty before the first
    /// publish.
    pub fn outline(&self) -> Vec<OutlineRegion> {
        self.current().map_or_else(Vec::new, |r| outline_regions(&r))
    }

    /// Navigation targets of the latest result, or empty before the first
    /// publish.
    pub fn navigation(&self) -> Vec<NavigationTarget> {
        self.current()
            .map_or_else(Vec::new, |r| navigation_targets(&r))
    }

    /// Classified spans of the latest result within `range`.
    pub fn classification(&self, range: TextRange) -> Vec<ClassifiedSpan> {
        self.current()
            .map_or_else(Vec::new, |r| classification_spans(&r, range))
    }
}
