//! Block-matching similarity ratio.
//!
//! The score is the classic "gestalt" ratio: find the longest contiguous block common to both
//! sequences, recurse on the unmatched text to its left and right, sum the matched lengths `M`,
//! and report `2·M / T` where `T` is the combined length. It is not an edit distance, and it
//! scores differently from Levenshtein-based similarity.
//!
//! Tie-breaking and the popular-element heuristic follow Python's `difflib.SequenceMatcher`
//! so that scores line up with templates and thresholds tuned against it:
//!
//! - Among equally long blocks, the one starting earliest in `a` wins, then earliest in `b`.
//! - When `b` has at least 200 elements, any element occurring more than `len(b) / 100 + 1`
//!   times is "popular" (autojunk). Popular elements never seed a block but can extend one.

use std::collections::HashMap;

const AUTOJUNK_MIN_LEN: usize = 200;

/// Tuning knobs for [`ratio_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityOptions {
    /// Ignore very frequent characters of the second sequence when seeding matches.
    pub autojunk: bool,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self { autojunk: true }
    }
}

/// Similarity of `a` and `b` in `[0, 1]` with default options.
pub fn ratio(a: &str, b: &str) -> f64 {
    ratio_with(a, b, SimilarityOptions::default())
}

/// Similarity of `a` and `b` in `[0, 1]`.
///
/// Two empty strings are identical and score `1.0`.
pub fn ratio_with(a: &str, b: &str, options: SimilarityOptions) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = BlockMatcher::new(&a, &b, options).matched_len();
    2.0 * matched as f64 / total as f64
}

/// A common block: `a[a_start..a_start + len] == b[b_start..b_start + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Block {
    pub(crate) a_start: usize,
    pub(crate) b_start: usize,
    pub(crate) len: usize,
}

pub(crate) struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each non-popular element of `b`, ascending.
    b_index: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    pub(crate) fn new(a: &'a [char], b: &'a [char], options: SimilarityOptions) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (position, element) in b.iter().enumerate() {
            b_index.entry(*element).or_default().push(position);
        }

        if options.autojunk && b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b_index.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b_index }
    }

    /// Longest block within `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
    ///
    /// Returns a zero-length block at `(a_lo, b_lo)` when nothing matches.
    pub(crate) fn longest_block(
        &self,
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
    ) -> Block {
        let (a, b) = (self.a, self.b);
        let mut best = Block {
            a_start: a_lo,
            b_start: b_lo,
            len: 0,
        };

        // run_len[j] = length of the block ending at a[i - 1], b[j].
        let mut run_len: HashMap<usize, usize> = HashMap::new();
        for (i, element) in a.iter().enumerate().take(a_hi).skip(a_lo) {
            let mut next_run_len = HashMap::new();
            if let Some(positions) = self.b_index.get(element) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let len = j
                        .checked_sub(1)
                        .and_then(|previous| run_len.get(&previous))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_len.insert(j, len);
                    if len > best.len {
                        best = Block {
                            a_start: i + 1 - len,
                            b_start: j + 1 - len,
                            len,
                        };
                    }
                }
            }
            run_len = next_run_len;
        }

        // Grow the block with equal elements the index skipped (popular ones).
        while best.a_start > a_lo
            && best.b_start > b_lo
            && a[best.a_start - 1] == b[best.b_start - 1]
        {
            best.a_start -= 1;
            best.b_start -= 1;
            best.len += 1;
        }
        while best.a_start + best.len < a_hi
            && best.b_start + best.len < b_hi
            && a[best.a_start + best.len] == b[best.b_start + best.len]
        {
            best.len += 1;
        }

        best
    }

    /// All non-overlapping common blocks, ordered by position.
    pub(crate) fn matching_blocks(&self) -> Vec<Block> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let block = self.longest_block(a_lo, a_hi, b_lo, b_hi);
            if block.len == 0 {
                continue;
            }
            if a_lo < block.a_start && b_lo < block.b_start {
                pending.push((a_lo, block.a_start, b_lo, block.b_start));
            }
            let a_end = block.a_start + block.len;
            let b_end = block.b_start + block.len;
            if a_end < a_hi && b_end < b_hi {
                pending.push((a_end, a_hi, b_end, b_hi));
            }
            blocks.push(block);
        }

        blocks.sort_unstable();
        blocks
    }

    /// Total number of matched elements across all blocks.
    pub(crate) fn matched_len(&self) -> usize {
        self.matching_blocks().iter().map(|block| block.len).sum()
    }
}
