//! Applying a unified diff back onto its source text.
//!
//! Only the subset produced by [`to_unified`](crate::diff::to_unified) is
//! understood: optional `---`/`+++` headers, `@@ -a,b +c,d @@` hunks, and
//! the no-newline marker.

use crate::diff::lines::split_lines;
use crate::errors::{FinePrintError, Result};

struct ParsedHunk {
    header_line: usize,
    before_start: usize,
    before_count: usize,
    after_count: usize,
    body: Vec<(char, String)>,
}

/// Apply `unified` to `before`, returning the patched text
///
/// Context and deleted lines are checked against `before`; the empty diff
/// returns `before` unchanged.
///
/// # Errors
///
/// `MalformedPatch` when a header cannot be parsed, hunk counts disagree
/// with their bodies, hunks overlap or run backwards, or a context/deleted
/// line does not match the source.
pub fn apply_unified(before: &str, unified: &str) -> Result<String> {
    let source = split_lines(before);
    let hunks = parse_hunks(unified)?;

    let mut out = String::with_capacity(before.len());
    let mut cursor = 0usize;

    for hunk in hunks {
        if hunk.before_start < cursor || hunk.before_start > source.len() {
            return Err(malformed(
                hunk.header_line,
                format!(
                    "hunk starts at line {} but the patch is already at line {}",
                    hunk.before_start + 1,
                    cursor + 1
                ),
            ));
        }
        for line in &source[cursor..hunk.before_start] {
            out.push_str(line);
        }
        cursor = hunk.before_start;

        for (offset, (kind, text)) in hunk.body.iter().enumerate() {
            let line_no = hunk.header_line + offset + 1;
            match kind {
                ' ' | '-' => {
                    let Some(existing) = source.get(cursor) else {
                        return Err(malformed(line_no, "hunk runs past the end of the source"));
                    };
                    if *existing != text.as_str() {
                        return Err(malformed(
                            line_no,
                            format!("expected {:?}, source has {:?}", text, existing),
                        ));
                    }
                    if *kind == ' ' {
                        out.push_str(existing);
                    }
                    cursor += 1;
                }
                _ => out.push_str(text),
            }
        }
    }

    for line in &source[cursor..] {
        out.push_str(line);
    }
    Ok(out)
}

fn parse_hunks(unified: &str) -> Result<Vec<ParsedHunk>> {
    let lines = split_lines(unified);
    let mut hunks: Vec<ParsedHunk> = Vec::new();
    let mut i = 0usize;

    while i < lines.len() {
        let line = lines[i];
        if hunks.is_empty() && (line.starts_with("--- ") || line.starts_with("+++ ")) {
            i += 1;
            continue;
        }
        if !line.starts_with("@@ ") {
            return Err(malformed(i + 1, format!("expected hunk header, got {:?}", line)));
        }

        let (before_start, before_count, after_count) = parse_header(line, i + 1)?;
        let mut hunk = ParsedHunk {
            header_line: i + 1,
            before_start,
            before_count,
            after_count,
            body: Vec::new(),
        };
        i += 1;

        while i < lines.len() && !lines[i].starts_with("@@ ") {
            let body_line = lines[i];
            if body_line.starts_with('\\') {
                match hunk.body.last_mut() {
                    Some((_, text)) if text.ends_with('\n') => {
                        text.pop();
                    }
                    _ => {
                        return Err(malformed(i + 1, "no-newline marker without a line before it"))
                    }
                }
                i += 1;
                continue;
            }
            let mut chars = body_line.chars();
            let kind = chars.next().unwrap_or(' ');
            if !matches!(kind, ' ' | '-' | '+') {
                return Err(malformed(i + 1, format!("unexpected line {:?}", body_line)));
            }
            hunk.body.push((kind, chars.as_str().to_string()));
            i += 1;
        }

        let removed = hunk.body.iter().filter(|(k, _)| *k != '+').count();
        let added = hunk.body.iter().filter(|(k, _)| *k != '-').count();
        if removed != hunk.before_count || added != hunk.after_count {
            return Err(malformed(
                hunk.header_line,
                format!(
                    "header promises -{} +{} lines, body has -{} +{}",
                    hunk.before_count, hunk.after_count, removed, added
                ),
            ));
        }
        hunks.push(hunk);
    }

    Ok(hunks)
}

/// Parse `@@ -a[,b] +c[,d] @@`, returning the 0-based before start and the counts.
fn parse_header(line: &str, line_no: usize) -> Result<(usize, usize, usize)> {
    let bad = || malformed(line_no, format!("bad hunk header {:?}", line.trim_end()));

    let rest = line.strip_prefix("@@ -").ok_or_else(bad)?;
    let (before, rest) = rest.split_once(" +").ok_or_else(bad)?;
    let (after, _) = rest.split_once(" @@").ok_or_else(bad)?;

    let (before_start, before_count) = parse_range(before).ok_or_else(bad)?;
    let (_, after_count) = parse_range(after).ok_or_else(bad)?;

    // An empty side names the line *after which* the change applies.
    let start0 = if before_count == 0 {
        before_start
    } else {
        before_start.checked_sub(1).ok_or_else(bad)?
    };
    Ok((start0, before_count, after_count))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> FinePrintError {
    FinePrintError::MalformedPatch {
        line,
        reason: reason.into(),
    }
}
