//! Sliding-window chunking over characters.
//!
//! Documents are split into fixed-size windows that overlap, so that a sentence cut by one
//! boundary still appears whole in the neighbouring window. Highlights:
//!
//! - Offsets and sizes count characters (Unicode scalar values), never bytes, so multi-byte
//!   text is never split inside a code point.
//! - Window `k` starts at `k * (chunk_size - overlap)`. Iteration stops once a window reaches
//!   the end of the text; the last window may be shorter than `chunk_size`.
//! - Parameters are validated when the [`ChunkingConfig`] is built. An overlap that is not
//!   strictly smaller than the window would never advance, so it is rejected up front.

use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

use super::types::{Chunk, ChunkingError};

/// Validated window parameters for [`chunk_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    /// Build a configuration, rejecting sizes that could not make progress.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ChunkingError::InvalidConfiguration {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Maximum characters per chunk.
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks.
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the start offsets of consecutive chunks.
    pub const fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split `text` into overlapping windows.
///
/// Returns an empty vector for empty input. Use [`chunk_iter`] to produce windows lazily.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<Chunk> {
    chunk_iter(text, config).collect()
}

/// Lazily iterate over the overlapping windows of `text`.
pub fn chunk_iter(text: &str, config: ChunkingConfig) -> ChunkIter<'_> {
    let boundaries = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    ChunkIter {
        text,
        boundaries,
        config,
        next_start: Some(0),
    }
}

/// Iterator returned by [`chunk_iter`].
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    text: &'a str,
    /// Byte offset of every character start, followed by `text.len()`.
    boundaries: Vec<usize>,
    config: ChunkingConfig,
    next_start: Option<usize>,
}

impl ChunkIter<'_> {
    fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start?;
        let total = self.char_len();
        if start >= total {
            self.next_start = None;
            return None;
        }

        let end = (start + self.config.chunk_size).min(total);
        self.next_start = if end == total {
            None
        } else {
            Some(start + self.config.stride())
        };

        Some(Chunk {
            start,
            text: self.text[self.boundaries[start]..self.boundaries[end]].to_string(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let Some(start) = self.next_start else {
            return (0, Some(0));
        };
        let total = self.char_len();
        if start >= total {
            return (0, Some(0));
        }
        let remaining = total - start;
        let count = if remaining <= self.config.chunk_size {
            1
        } else {
            1 + (remaining - self.config.chunk_size).div_ceil(self.config.stride())
        };
        (count, Some(count))
    }
}

impl ExactSizeIterator for ChunkIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|chunk| chunk.text.as_str()).collect()
    }

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig::new(chunk_size, overlap).expect("valid config")
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn splits_with_overlap_and_clips_the_last_window() {
        let chunks = chunk_text("abcdef", config(4, 2));
        assert_eq!(texts(&chunks), vec!["abcd", "cdef"]);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[1].start, 2);
    }

    #[test]
    fn final_window_may_be_shorter() {
        let chunks = chunk_text("abcdefg", config(4, 1));
        assert_eq!(texts(&chunks), vec!["abcd", "defg"]);

        let chunks = chunk_text("abcdefgh", config(4, 1));
        assert_eq!(texts(&chunks), vec!["abcd", "defg", "gh"]);
        assert_eq!(chunks[2].start, 6);
    }

    #[test]
    fn short_text_fits_in_one_chunk() {
        let chunks = chunk_text("hello", ChunkingConfig::default());
        assert_eq!(texts(&chunks), vec!["hello"]);
    }

    #[test]
    fn zero_overlap_partitions_the_text() {
        let chunks = chunk_text("abcdefghij", config(3, 0));
        assert_eq!(texts(&chunks), vec!["abc", "def", "ghi", "j"]);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_window() {
        assert!(matches!(
            ChunkingConfig::new(10, 10),
            Err(ChunkingError::InvalidConfiguration {
                chunk_size: 10,
                overlap: 10
            })
        ));
        assert!(ChunkingConfig::new(5, 10).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "héllo wörld ñ";
        let chunks = chunk_text(text, config(5, 2));
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 5);
            let expected: String = text.chars().skip(chunk.start).take(5).collect();
            assert_eq!(chunk.text, expected);
        }
        assert_eq!(chunks[0].text, "héllo");
        assert_eq!(chunks[1].start, 3);
    }

    #[test]
    fn consecutive_chunks_share_exactly_the_overlap() {
        let text = "The quick brown fox jumps over the lazy dog, twice over.";
        let cfg = config(12, 4);
        let chunks = chunk_text(text, cfg);
        for pair in chunks.windows(2) {
            let previous: Vec<char> = pair[0].text.chars().collect();
            let tail: String = previous[previous.len() - cfg.overlap()..].iter().collect();
            assert!(pair[1].text.starts_with(&tail));
            assert_eq!(pair[1].start - pair[0].start, cfg.stride());
        }
    }

    #[test]
    fn stride_prefixes_reconstruct_the_source() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod.";
        for (size, overlap) in [(1, 0), (7, 3), (10, 9), (16, 5), (100, 20)] {
            let cfg = config(size, overlap);
            let chunks = chunk_text(text, cfg);
            let mut rebuilt = String::new();
            let last = chunks.len() - 1;
            for (index, chunk) in chunks.iter().enumerate() {
                if index == last {
                    rebuilt.push_str(&chunk.text);
                } else {
                    rebuilt.extend(chunk.text.chars().take(cfg.stride()));
                }
            }
            assert_eq!(rebuilt, text, "size={size} overlap={overlap}");
        }
    }

    #[test]
    fn every_character_is_covered() {
        let text = "abcdefghijklmnopqrstuvwxyz0123456789";
        let cfg = config(8, 3);
        let chunks = chunk_text(text, cfg);
        let total = text.chars().count();
        let mut covered = vec![false; total];
        for chunk in &chunks {
            for offset in chunk.start..chunk.start + chunk.text.chars().count() {
                covered[offset] = true;
            }
        }
        assert!(covered.into_iter().all(|seen| seen));
    }

    #[test]
    fn size_hint_matches_chunk_count() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        for (size, overlap) in [(4, 2), (5, 0), (26, 1), (30, 29), (3, 2)] {
            let iter = chunk_iter(text, config(size, overlap));
            let hinted = iter.len();
            assert_eq!(hinted, iter.count(), "size={size} overlap={overlap}");
        }
        assert_eq!(chunk_iter("", ChunkingConfig::default()).len(), 0);
    }
}
