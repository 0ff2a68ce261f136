//! Paragraph-based text splitter.
//!
//! Splits on a fixed separator, then greedily merges the pieces into chunks
//! of at most `chunk_size` characters, carrying up to `chunk_overlap`
//! characters of trailing pieces into the next chunk. A single piece longer
//! than `chunk_size` becomes its own oversized chunk.

use std::collections::VecDeque;
use tracing::warn;

/// Paragraph break.
const SEPARATOR: &str = "\n\n";

/// Splits a document into overlapping chunks. Sizes are counted in chars.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = text.split(SEPARATOR).filter(|p| !p.is_empty()).collect();
        self.merge(&pieces)
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let sep_len = SEPARATOR.chars().count();
        let mut chunks = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;
        let joiner_for = |pieces_held: usize| if pieces_held == 0 { 0 } else { sep_len };

        for &piece in pieces {
            let len = piece.chars().count();
            if total + len + joiner_for(current.len()) > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        size = total,
                        limit = self.chunk_size,
                        "Created a chunk larger than the configured size"
                    );
                }
                if !current.is_empty() {
                    self.push_joined(&current, &mut chunks);

                    while total > self.chunk_overlap
                        || (total > 0 && total + len + joiner_for(current.len()) > self.chunk_size)
                    {
                        let Some((_, first_len)) = current.pop_front() else {
                            break;
                        };
                        let first_joiner = if current.is_empty() { 0 } else { sep_len };
                        total = total.saturating_sub(first_len + first_joiner);
                    }
                }
            }

            current.push_back((piece, len));
            total += len;
            if current.len() > 1 {
                total += sep_len;
            }
        }

        self.push_joined(&current, &mut chunks);
        chunks
    }

    fn push_joined(&self, current: &VecDeque<(&str, usize)>, chunks: &mut Vec<String>) {
        let joined = current
            .iter()
            .map(|(p, _)| *p)
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        let trimmed = joined.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
    }
}
