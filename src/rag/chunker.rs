//! Word-window chunking.
//!
//! Text is split on whitespace and emitted as windows of `window_size` words,
//! each starting `window_size - overlap` words after the previous one. The
//! last window is the first one that reaches the end of the text, so it may
//! be shorter than `window_size`.

use super::error::ChunkingError;

pub const DEFAULT_WINDOW_SIZE: usize = 400;
pub const DEFAULT_OVERLAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordChunker {
    window_size: usize,
    overlap: usize,
}

impl WordChunker {
    pub fn new(window_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if window_size == 0 || overlap >= window_size {
            return Err(ChunkingError::InvalidWindow {
                window_size,
                overlap,
            });
        }
        Ok(Self {
            window_size,
            overlap,
        })
    }

    fn stride(&self) -> usize {
        self.window_size - self.overlap
    }

    /// Lazily yields the chunks of `text`. Every call starts from the beginning.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            words: text.split_whitespace().collect(),
            window_size: self.window_size,
            stride: self.stride(),
            next_start: Some(0),
        }
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Iterator over the word windows of one document.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    words: Vec<&'a str>,
    window_size: usize,
    stride: usize,
    next_start: Option<usize>,
}

impl Iterator for Chunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;
        if start >= self.words.len() {
            self.next_start = None;
            return None;
        }

        let end = (start + self.window_size).min(self.words.len());
        self.next_start = (end < self.words.len()).then(|| start + self.stride);
        Some(self.words[start..end].join(" "))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next_start {
            None => 0,
            Some(start) if start >= self.words.len() => 0,
            Some(start) => {
                let words_left = self.words.len() - start;
                if words_left <= self.window_size {
                    1
                } else {
                    1 + (words_left - self.window_size).div_ceil(self.stride)
                }
            }
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn expected_count(word_count: usize, window_size: usize, overlap: usize) -> usize {
        (word_count - overlap).div_ceil(window_size - overlap)
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = WordChunker::default();
        assert_eq!(chunker.chunks("").count(), 0);
        assert_eq!(chunker.chunks("   \n\t ").count(), 0);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = WordChunker::new(10, 3).expect("valid window");
        let chunks: Vec<String> = chunker.chunks("Python is widely used in machine learning.").collect();
        assert_eq!(chunks, vec!["Python is widely used in machine learning.".to_string()]);

        let exact: Vec<String> = chunker.chunks(&words(10)).collect();
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn overlap_must_be_smaller_than_window() {
        assert_eq!(
            WordChunker::new(50, 50),
            Err(ChunkingError::InvalidWindow {
                window_size: 50,
                overlap: 50
            })
        );
        assert!(WordChunker::new(10, 20).is_err());
        assert!(WordChunker::new(0, 0).is_err());
    }

    #[test]
    fn chunk_count_matches_window_formula() {
        for &(window_size, overlap) in &[(400, 50), (10, 0), (10, 9), (7, 3), (1, 0)] {
            let chunker = WordChunker::new(window_size, overlap).expect("valid window");
            for word_count in (overlap + 1)..(overlap + 3 * window_size + 5) {
                let text = words(word_count);
                let chunks = chunker.chunks(&text);
                assert_eq!(
                    chunks.len(),
                    expected_count(word_count, window_size, overlap),
                    "size_hint for W={} window={} overlap={}",
                    word_count,
                    window_size,
                    overlap
                );
                assert_eq!(
                    chunks.count(),
                    expected_count(word_count, window_size, overlap),
                    "W={} window={} overlap={}",
                    word_count,
                    window_size,
                    overlap
                );
            }
        }
    }

    #[test]
    fn windows_overlap_and_last_window_holds_remainder() {
        let chunker = WordChunker::new(4, 1).expect("valid window");
        let chunks: Vec<String> = chunker.chunks("a b c d e f g h i").collect();
        assert_eq!(chunks, vec!["a b c d", "d e f g", "g h i"]);
    }

    #[test]
    fn chunks_cover_every_word_in_order() {
        let chunker = WordChunker::new(5, 2).expect("valid window");
        let text = words(23);
        let chunks: Vec<String> = chunker.chunks(&text).collect();

        let first_words: Vec<&str> = chunks
            .iter()
            .map(|c| c.split(' ').next().unwrap_or_default())
            .collect();
        assert_eq!(first_words[0], "w0");
        assert_eq!(first_words[1], "w3");
        assert!(chunks.last().unwrap().ends_with("w22"));
    }

    #[test]
    fn iteration_is_restartable() {
        let chunker = WordChunker::new(3, 1).expect("valid window");
        let text = "one two three four five six";
        let first: Vec<String> = chunker.chunks(text).collect();
        let second: Vec<String> = chunker.chunks(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        let chunker = WordChunker::new(10, 0).expect("valid window");
        let chunks: Vec<String> = chunker.chunks("alpha\n\n  beta\tgamma ").collect();
        assert_eq!(chunks, vec!["alpha beta gamma"]);
    }
}
