//! Fixed-size overlapping windows over a document.
//!
//! Offsets and sizes are counted in characters (Unicode scalar values), so a
//! window never splits a multi-byte character.

use std::iter::FusedIterator;

use crate::error::{RagError, Result};

/// Window of the source document submitted to the embedding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Text of the window, borrowed from the source.
    pub text: &'a str,
    /// Character offset of the first character in the source.
    pub start_offset: usize,
    /// Exclusive character offset of the end of the window.
    pub end_offset: usize,
}

impl Chunk<'_> {
    /// Number of characters covered by the chunk.
    pub fn char_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

/// Validated chunk size / overlap pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Builds a chunker; `overlap` must be strictly smaller than a non-zero `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::invalid("chunk size must be positive"));
        }
        if overlap >= chunk_size {
            return Err(RagError::invalid(format!(
                "overlap {overlap} must be smaller than chunk size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Maximum characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive start offsets.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Lazily splits `text`. Calling this again restarts from the beginning.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            char_len: text.chars().count(),
            chunk_size: self.chunk_size,
            step: self.step(),
            start_char: 0,
            start_byte: 0,
            finished: text.is_empty(),
        }
    }
}

/// Iterator returned by [`Chunker::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    char_len: usize,
    chunk_size: usize,
    step: usize,
    start_char: usize,
    start_byte: usize,
    finished: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let end_char = (self.start_char + self.chunk_size).min(self.char_len);
        let end_byte = advance(self.text, self.start_byte, end_char - self.start_char);
        let chunk = Chunk {
            text: &self.text[self.start_byte..end_byte],
            start_offset: self.start_char,
            end_offset: end_char,
        };
        self.start_char += self.step;
        if self.start_char >= self.char_len {
            self.finished = true;
        } else {
            self.start_byte = advance(self.text, self.start_byte, self.step);
        }
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.finished {
            0
        } else {
            (self.char_len - self.start_char).div_ceil(self.step)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl FusedIterator for Chunks<'_> {}

/// Byte index reached after moving `chars` characters forward from byte `from`.
fn advance(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(idx, _)| from + idx)
}
