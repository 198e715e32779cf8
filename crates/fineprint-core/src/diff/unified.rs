//! Unified-diff rendering of an edit script.

use crate::diff::lines::split_lines;
use crate::diff::model::{validate_script, Edit};
use crate::errors::Result;
use std::fmt::Write as _;

/// Marker GNU diff prints after a line that lacks a trailing newline
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Delete,
    Insert,
}

impl LineKind {
    pub fn prefix(self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Delete => '-',
            LineKind::Insert => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine<'a> {
    pub kind: LineKind,
    /// Line text including its terminator, if it had one
    pub text: &'a str,
}

/// A contiguous region of the diff with surrounding context
///
/// Starts are 0-based indices of the first line of the hunk; header
/// rendering converts them to 1-based line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk<'a> {
    pub before_start: usize,
    pub before_count: usize,
    pub after_start: usize,
    pub after_count: usize,
    pub lines: Vec<HunkLine<'a>>,
}

impl<'a> Hunk<'a> {
    fn open(before_start: usize, after_start: usize) -> Self {
        Self {
            before_start,
            before_count: 0,
            after_start,
            after_count: 0,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, kind: LineKind, text: &'a str) {
        match kind {
            LineKind::Context => {
                self.before_count += 1;
                self.after_count += 1;
            }
            LineKind::Delete => self.before_count += 1,
            LineKind::Insert => self.after_count += 1,
        }
        self.lines.push(HunkLine { kind, text });
    }

    /// `@@ -a,b +c,d @@` with GNU numbering: an empty side reports the
    /// line after which the change applies.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            display_start(self.before_start, self.before_count),
            self.before_count,
            display_start(self.after_start, self.after_count),
            self.after_count
        )
    }
}

fn display_start(start: usize, count: usize) -> usize {
    if count == 0 {
        start
    } else {
        start + 1
    }
}

/// Group an edit script into hunks with `context` lines around each change
///
/// Two changes separated by an equal run of at most `2 * context` lines
/// share a hunk, with the whole run as connecting context; a longer run
/// splits them. `edits` must already be valid for the given lines.
pub fn hunks<'a>(
    before: &[&'a str],
    after: &[&'a str],
    edits: &[Edit],
    context: usize,
) -> Vec<Hunk<'a>> {
    let Some(last_change) = edits.iter().rposition(|e| !e.is_equal()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut current: Option<Hunk<'a>> = None;

    for (i, edit) in edits.iter().enumerate() {
        match edit {
            Edit::Equal { before: run, .. } => {
                let Some(hunk) = current.as_mut() else {
                    // Leading context is taken when the next change opens a hunk.
                    continue;
                };
                if i < last_change && run.len() <= 2 * context {
                    for line in &before[run.clone()] {
                        hunk.push(LineKind::Context, line);
                    }
                } else {
                    let trailing = run.start..run.start + context.min(run.len());
                    for line in &before[trailing] {
                        hunk.push(LineKind::Context, line);
                    }
                    out.extend(current.take());
                }
            }
            Edit::Delete { before: span, .. } => {
                let hunk = current.get_or_insert_with(|| open_hunk(before, edits, i, context));
                for line in &before[span.clone()] {
                    hunk.push(LineKind::Delete, line);
                }
            }
            Edit::Insert { after: span, .. } => {
                let hunk = current.get_or_insert_with(|| open_hunk(before, edits, i, context));
                for line in &after[span.clone()] {
                    hunk.push(LineKind::Insert, line);
                }
            }
        }
    }

    out.extend(current);
    out
}

/// Open a hunk for the change at `edits[i]`, seeding it with the tail of
/// the preceding equal run.
fn open_hunk<'a>(before: &[&'a str], edits: &[Edit], i: usize, context: usize) -> Hunk<'a> {
    let change = &edits[i];
    let lead = match i.checked_sub(1).map(|p| &edits[p]) {
        Some(Edit::Equal { before: run, .. }) => context.min(run.len()),
        _ => 0,
    };

    let before_start = change.before_range().start - lead;
    let after_start = change.after_range().start - lead;
    let mut hunk = Hunk::open(before_start, after_start);
    for line in &before[before_start..before_start + lead] {
        hunk.push(LineKind::Context, line);
    }
    hunk
}

/// Render `edits` as a unified diff of `before_text` against `after_text`
///
/// Returns the empty string when the script contains no changes.
///
/// # Errors
///
/// `InconsistentEdits` when replaying `edits` does not reproduce both texts.
/// That is a caller contract violation rather than a runtime condition, but
/// it is always checked.
pub fn to_unified(
    before_label: &str,
    after_label: &str,
    before_text: &str,
    after_text: &str,
    edits: &[Edit],
    context_lines: usize,
) -> Result<String> {
    let before = split_lines(before_text);
    let after = split_lines(after_text);
    validate_script(edits, &before, &after)?;

    let hunks = hunks(&before, &after, edits, context_lines);
    if hunks.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "--- {before_label}");
    let _ = writeln!(out, "+++ {after_label}");
    for hunk in &hunks {
        out.push_str(&hunk.header());
        out.push('\n');
        for line in &hunk.lines {
            out.push(line.kind.prefix());
            out.push_str(line.text);
            if !line.text.ends_with('\n') {
                out.push('\n');
                out.push_str(NO_NEWLINE_MARKER);
                out.push('\n');
            }
        }
    }
    Ok(out)
}
