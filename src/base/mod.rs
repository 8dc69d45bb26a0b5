//! Foundation types for the analysis pipeline.
//!
//! This module provides the primitives the rest of the crate builds on:
//! - [`Snapshot`] - Immutable, versioned view of buffer text
//! - [`TextEdit`] - The delta that produced a snapshot from its predecessor
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//!
//! This module has NO dependencies on other strata modules.

mod snapshot;

pub use snapshot::{Snapshot, TextEdit};
pub use text_size::{TextRange, TextSize};

// Re-export text-size for convenience
pub use text_size;
