//! Edit script types.

use crate::errors::{FinePrintError, Result};
use std::ops::Range;

/// One step of an edit script
///
/// Ranges are half-open line indices into the "before" and "after"
/// sequences. Every edit also records where it sits in the other sequence,
/// so an edit script fully describes the alignment of both inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edit {
    /// `before[before]` and `after[after]` are identical runs
    Equal {
        before: Range<usize>,
        after: Range<usize>,
    },
    /// `before[before]` was removed; the after-sequence is at `after_at`
    Delete { before: Range<usize>, after_at: usize },
    /// `after[after]` was added at before-position `before_at`
    Insert { before_at: usize, after: Range<usize> },
}

impl Edit {
    /// Span of this edit in the before-sequence (empty for inserts)
    pub fn before_range(&self) -> Range<usize> {
        match self {
            Edit::Equal { before, .. } | Edit::Delete { before, .. } => before.clone(),
            Edit::Insert { before_at, .. } => *before_at..*before_at,
        }
    }

    /// Span of this edit in the after-sequence (empty for deletes)
    pub fn after_range(&self) -> Range<usize> {
        match self {
            Edit::Equal { after, .. } | Edit::Insert { after, .. } => after.clone(),
            Edit::Delete { after_at, .. } => *after_at..*after_at,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, Edit::Equal { .. })
    }

    /// Number of lines covered by this edit
    pub fn len(&self) -> usize {
        match self {
            Edit::Equal { before, .. } | Edit::Delete { before, .. } => before.len(),
            Edit::Insert { after, .. } => after.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Total inserted plus deleted lines of a script
pub fn edit_distance(edits: &[Edit]) -> usize {
    edits
        .iter()
        .filter(|e| !e.is_equal())
        .map(Edit::len)
        .sum()
}

/// Check that `edits` replays exactly onto `before` and `after`
///
/// Spans must be contiguous in both sequences, cover them completely, and
/// equal spans must actually be equal.
///
/// # Errors
///
/// `InconsistentEdits` describing the first violation found.
pub fn validate_script<T: PartialEq>(edits: &[Edit], before: &[T], after: &[T]) -> Result<()> {
    let mut b = 0usize;
    let mut a = 0usize;

    for (i, edit) in edits.iter().enumerate() {
        let br = edit.before_range();
        let ar = edit.after_range();

        if br.start != b || ar.start != a {
            return Err(inconsistent(format!(
                "edit {i} starts at before:{} after:{} but replay is at before:{b} after:{a}",
                br.start, ar.start
            )));
        }
        if br.start > br.end || ar.start > ar.end {
            return Err(inconsistent(format!("edit {i} has an inverted range")));
        }
        if br.end > before.len() || ar.end > after.len() {
            return Err(inconsistent(format!(
                "edit {i} reaches past the input (before:{} of {}, after:{} of {})",
                br.end,
                before.len(),
                ar.end,
                after.len()
            )));
        }
        if let Edit::Equal { .. } = edit {
            if br.len() != ar.len() {
                return Err(inconsistent(format!(
                    "equal edit {i} pairs {} before-lines with {} after-lines",
                    br.len(),
                    ar.len()
                )));
            }
            if before[br.clone()] != after[ar.clone()] {
                return Err(inconsistent(format!(
                    "equal edit {i} covers lines that differ"
                )));
            }
        }

        b = br.end;
        a = ar.end;
    }

    if b != before.len() || a != after.len() {
        return Err(inconsistent(format!(
            "script ends at before:{b} after:{a} but inputs have {} and {} lines",
            before.len(),
            after.len()
        )));
    }
    Ok(())
}

fn inconsistent(reason: String) -> FinePrintError {
    FinePrintError::InconsistentEdits { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_for_each_variant() {
        let ins = Edit::Insert {
            before_at: 2,
            after: 3..5,
        };
        assert_eq!(ins.before_range(), 2..2);
        assert_eq!(ins.after_range(), 3..5);
        assert_eq!(ins.len(), 2);

        let del = Edit::Delete {
            before: 1..4,
            after_at: 1,
        };
        assert_eq!(del.after_range(), 1..1);
        assert_eq!(del.len(), 3);
    }

    #[test]
    fn test_validate_rejects_gap() {
        let before = ["a", "b"];
        let after = ["a", "b"];
        let edits = vec![Edit::Equal {
            before: 0..1,
            after: 0..1,
        }];
        let err = validate_script(&edits, &before, &after).unwrap_err();
        assert!(matches!(err, FinePrintError::InconsistentEdits { .. }));
    }

    #[test]
    fn test_validate_rejects_equal_over_different_lines() {
        let before = ["a"];
        let after = ["b"];
        let edits = vec![Edit::Equal {
            before: 0..1,
            after: 0..1,
        }];
        assert!(validate_script(&edits, &before, &after).is_err());
    }

    #[test]
    fn test_edit_distance_ignores_equal_runs() {
        let edits = vec![
            Edit::Equal {
                before: 0..5,
                after: 0..5,
            },
            Edit::Delete {
                before: 5..7,
                after_at: 5,
            },
            Edit::Insert {
                before_at: 7,
                after: 5..6,
            },
        ];
        assert_eq!(edit_distance(&edits), 3);
    }
}
