//! Immutable, versioned buffer snapshots.
//!
//! An edit never mutates an existing snapshot; it produces a new one with a
//! strictly larger version and a record of the delta that created it.

use std::sync::Arc;

use text_size::{TextRange, TextSize};

/// The delta that turned one snapshot into its successor.
///
/// Coordinates are relative to the *old* snapshot: `replaced` is the range
/// that was removed, `inserted_len` the length of the text put in its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextEdit {
    pub replaced: TextRange,
    pub inserted_len: TextSize,
}

impl TextEdit {
    pub fn new(replaced: TextRange, inserted_len: TextSize) -> Self {
        Self {
            replaced,
            inserted_len,
        }
    }

    /// End of the inserted text in the *new* snapshot's coordinates.
    pub fn new_end(&self) -> TextSize {
        self.replaced.start() + self.inserted_len
    }

    /// Signed length difference between the new and old snapshot.
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.inserted_len)) - i64::from(u32::from(self.replaced.len()))
    }

    /// Map an offset located at or after the replaced range into the new
    /// snapshot's coordinates.
    pub fn map_offset(&self, offset: TextSize) -> TextSize {
        debug_assert!(offset >= self.replaced.end());
        TextSize::new((i64::from(u32::from(offset)) + self.delta()) as u32)
    }
}

/// Immutable view of buffer text at a point in time.
///
/// Snapshots are cheap to clone (the text is shared) and carry a
/// monotonically increasing version. Everything derived from a snapshot
/// (tokens, trees, feature projections) names the version it describes, so
/// consumers can always detect stale data.
#[derive(Debug, Clone)]
pub struct Snapshot {
    text: Arc<str>,
    version: u64,
    edit: Option<TextEdit>,
}

impl Snapshot {
    /// Create the initial snapshot (version 0, no producing edit).
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            version: 0,
            edit: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The edit that produced this snapshot from its predecessor, if any.
    pub fn edit(&self) -> Option<TextEdit> {
        self.edit
    }

    pub fn len(&self) -> TextSize {
        TextSize::of(self.text.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Range covering the whole snapshot.
    pub fn full_range(&self) -> TextRange {
        TextRange::up_to(self.len())
    }

    /// Produce the successor snapshot with `replaced` substituted by
    /// `inserted`.
    ///
    /// # Panics
    ///
    /// Panics if `replaced` is out of bounds or not on char boundaries.
    pub fn apply_edit(&self, replaced: TextRange, inserted: &str) -> Snapshot {
        assert!(
            replaced.end() <= self.len(),
            "edit range {replaced:?} out of bounds for snapshot of length {:?}",
            self.len()
        );

        let start = usize::from(replaced.start());
        let end = usize::from(replaced.end());

        let mut text = String::with_capacity(self.text.len() - (end - start) + inserted.len());
        text.push_str(&self.text[..start]);
        text.push_str(inserted);
        text.push_str(&self.text[end..]);

        Snapshot {
            text: text.into(),
            version: self.version + 1,
            edit: Some(TextEdit::new(replaced, TextSize::of(inserted))),
        }
    }
}
