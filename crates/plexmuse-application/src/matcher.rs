// SPDX-License-Identifier: GPL-3.0-or-later

//! Fuzzy title matching.
//!
//! Similarity is the Ratcliff/Obershelp "gestalt" ratio `2*M / T`, where `M`
//! is the number of characters covered by the recursively found longest
//! common blocks and `T` the combined length of both strings.

use crate::normalize::normalize;
use plexmuse_domain::TrackCandidate;
use tracing::trace;

/// Minimum similarity for a track found in the resolved artist's own catalog.
pub const TRACK_MATCH_THRESHOLD: f64 = 0.85;

/// Minimum similarity for a track found by the library-wide fallback search.
pub const FALLBACK_MATCH_THRESHOLD: f64 = 0.75;

/// Similarity of two strings in `[0.0, 1.0]`. Two empty strings score 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

/// Sum of the sizes of all matching blocks between `a` and `b`.
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_block(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_block(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    // run[k] = length of the common run ending at a[i - 1], b[blo + k - 1]
    let mut previous = vec![0usize; width + 1];
    let mut current = vec![0usize; width + 1];

    for i in alo..ahi {
        for k in 1..=width {
            let j = blo + k - 1;
            current[k] = if a[i] == b[j] { previous[k - 1] + 1 } else { 0 };
            let size = current[k];
            if size > best.2 {
                best = (i + 1 - size, j + 1 - size, size);
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}

/// Best candidate for `target` by normalized title similarity.
///
/// Returns `(None, 0.0)` unless some candidate reaches `threshold`. A perfect
/// score ends the scan; otherwise the first candidate with the highest score
/// wins.
pub fn find_best_match<'a>(
    candidates: &'a [TrackCandidate],
    target: &str,
    threshold: f64,
) -> (Option<&'a TrackCandidate>, f64) {
    let wanted = normalize(target);
    let mut best: (Option<&'a TrackCandidate>, f64) = (None, 0.0);

    for candidate in candidates {
        let score = similarity(&wanted, &normalize(&candidate.title));
        if score < threshold {
            continue;
        }
        if score >= 1.0 {
            trace!(target: "matcher", target_title = target, candidate = %candidate.title, "exact match");
            return (Some(candidate), score);
        }
        if score > best.1 {
            best = (Some(candidate), score);
        }
    }

    trace!(
        target: "matcher",
        target_title = target,
        matched = best.0.map(|c| c.title.as_str()),
        score = best.1,
        candidates = candidates.len(),
        "best match search finished"
    );
    best
}
