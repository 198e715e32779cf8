//! Myers shortest-edit-script search.
//!
//! Greedy forward search over diagonals recording the furthest-reaching
//! `x` per diagonal for every edit count `d`, followed by a backtrack over
//! the recorded frontiers. Frame `d` keeps only diagonals `-d..=d`, so time
//! is O((N+M)·D) and the trace holds O(D²) entries.

use crate::diff::model::Edit;

/// One line-level step produced by the backtrack, before coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// before[x] == after[y]
    Equal(usize, usize),
    /// before[x] removed while the after-sequence is at y
    Delete(usize, usize),
    /// after[y] added while the before-sequence is at x
    Insert(usize, usize),
}

/// Compute the minimal edit script turning `before` into `after`
///
/// Runs of the same kind are coalesced, so identical inputs produce a
/// single `Equal` and an empty side produces a single `Insert`/`Delete`.
pub fn compute_edits<T: PartialEq>(before: &[T], after: &[T]) -> Vec<Edit> {
    let n = before.len();
    let m = after.len();

    match (n, m) {
        (0, 0) => return Vec::new(),
        (0, _) => {
            return vec![Edit::Insert {
                before_at: 0,
                after: 0..m,
            }]
        }
        (_, 0) => {
            return vec![Edit::Delete {
                before: 0..n,
                after_at: 0,
            }]
        }
        _ => {}
    }

    let trace = forward_trace(before, after);
    let steps = backtrack(&trace, n, m);
    coalesce(&steps)
}

/// Read the frontier at diagonal `k = x - y`; `offset` shifts k to an index.
fn at(v: &[isize], offset: isize, k: isize) -> isize {
    v[(k + offset) as usize]
}

/// Whether the path onto diagonal `k` at step `d` comes from `k + 1`
/// (a downward move, i.e. an insertion) rather than `k - 1`.
fn moves_down(v: &[isize], offset: isize, d: isize, k: isize) -> bool {
    k == -d || (k != d && at(v, offset, k - 1) < at(v, offset, k + 1))
}

/// Run the forward search, returning the frontier as it stood before each `d`
///
/// Frame `d` covers diagonals `-d..=d`; index it with offset `d`.
fn forward_trace<T: PartialEq>(before: &[T], after: &[T]) -> Vec<Vec<isize>> {
    let n = before.len() as isize;
    let m = after.len() as isize;
    let max = before.len() + after.len();

    let offset = max as isize + 1;
    let mut v = vec![0isize; 2 * max + 3];
    let mut trace = Vec::new();

    for d in 0..=(max as isize) {
        trace.push(v[(offset - d) as usize..=(offset + d) as usize].to_vec());

        let mut k = -d;
        while k <= d {
            let mut x = if moves_down(&v, offset, d, k) {
                at(&v, offset, k + 1)
            } else {
                at(&v, offset, k - 1) + 1
            };
            let mut y = x - k;

            while x < n && y < m && before[x as usize] == after[y as usize] {
                x += 1;
                y += 1;
            }
            v[(k + offset) as usize] = x;

            if x >= n && y >= m {
                return trace;
            }
            k += 2;
        }
    }

    // The loop always reaches (n, m) by d = n + m.
    trace
}

/// Walk the recorded frontiers from (n, m) back to (0, 0).
fn backtrack(trace: &[Vec<isize>], n: usize, m: usize) -> Vec<Step> {
    let mut steps = Vec::with_capacity(n + m);
    let mut x = n as isize;
    let mut y = m as isize;

    for (d, frame) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;

        // Every path starts at the origin.
        let (prev_x, prev_y) = if d == 0 {
            (0, 0)
        } else {
            let prev_k = if moves_down(frame, d, d, k) {
                k + 1
            } else {
                k - 1
            };
            let prev_x = at(frame, d, prev_k);
            (prev_x, prev_x - prev_k)
        };

        while x > prev_x && y > prev_y {
            steps.push(Step::Equal((x - 1) as usize, (y - 1) as usize));
            x -= 1;
            y -= 1;
        }

        if d > 0 {
            if x == prev_x {
                steps.push(Step::Insert(x as usize, (y - 1) as usize));
            } else {
                steps.push(Step::Delete((x - 1) as usize, y as usize));
            }
        }

        x = prev_x;
        y = prev_y;
    }

    steps.reverse();
    steps
}

/// Merge consecutive steps of the same kind into maximal edits.
fn coalesce(steps: &[Step]) -> Vec<Edit> {
    let mut edits: Vec<Edit> = Vec::new();

    for step in steps {
        let extended = match (edits.last_mut(), *step) {
            (Some(Edit::Equal { before, after }), Step::Equal(x, y))
                if before.end == x && after.end == y =>
            {
                before.end += 1;
                after.end += 1;
                true
            }
            (Some(Edit::Delete { before, after_at }), Step::Delete(x, y))
                if before.end == x && *after_at == y =>
            {
                before.end += 1;
                true
            }
            (Some(Edit::Insert { before_at, after }), Step::Insert(x, y))
                if *before_at == x && after.end == y =>
            {
                after.end += 1;
                true
            }
            _ => false,
        };

        if !extended {
            edits.push(match *step {
                Step::Equal(x, y) => Edit::Equal {
                    before: x..x + 1,
                    after: y..y + 1,
                },
                Step::Delete(x, y) => Edit::Delete {
                    before: x..x + 1,
                    after_at: y,
                },
                Step::Insert(x, y) => Edit::Insert {
                    before_at: x,
                    after: y..y + 1,
                },
            });
        }
    }

    edits
}
