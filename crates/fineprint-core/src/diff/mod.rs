//! Line diffing for policy documents.
//!
//! Compares two versions of a document and produces a minimal edit script
//! plus a unified-diff rendering of it for downstream review.
//!
//! ## Entry points
//!
//! ```
//! use fineprint_core::diff::{diff_strings, to_unified};
//!
//! let before = "Section 1: we keep data for 30 days.\n";
//! let after = "Section 1: we keep data for 7 days.\n";
//! let edits = diff_strings(before, after);
//! let rendered = to_unified("previous-policy", "current-policy", before, after, &edits, 3)?;
//! assert!(rendered.contains("-Section 1: we keep data for 30 days."));
//! # Ok::<(), fineprint_core::errors::FinePrintError>(())
//! ```
//!
//! ## Guarantees
//!
//! - **Minimality**: the number of inserted plus deleted lines is the edit
//!   distance between the inputs.
//! - **Determinism**: ties are broken by the canonical Myers trace.
//! - **Coalescing**: consecutive lines of the same kind form one [`Edit`].
//! - **No normalization**: lines keep their terminators; a final
//!   unterminated line is its own element.

pub mod lines;
pub mod model;
pub mod myers;
pub mod patch;
pub mod unified;

pub use lines::split_lines;
pub use model::{edit_distance, validate_script, Edit};
pub use myers::compute_edits;
pub use patch::apply_unified;
pub use unified::{hunks, to_unified, Hunk, HunkLine, LineKind};

use crate::errors::Result;

/// Split both texts into lines and compute the edit script between them
pub fn diff_strings(before: &str, after: &str) -> Vec<Edit> {
    compute_edits(&split_lines(before), &split_lines(after))
}

/// Diff two texts and render the result in one step
///
/// Returns an empty string when the texts are identical.
///
/// # Errors
///
/// Never fails for edits produced here; the error path exists because the
/// renderer always validates its input.
pub fn unified_diff(
    before_label: &str,
    after_label: &str,
    before: &str,
    after: &str,
    context_lines: usize,
) -> Result<String> {
    let edits = diff_strings(before, after);
    to_unified(before_label, after_label, before, after, &edits, context_lines)
}
