//! Separator-aware document chunking.
//!
//! [`SeparatorChunker`] splits a document into chunks of at most `chunk_size`
//! characters, cutting at the most natural boundary available within the
//! window: paragraph break, then line break, then sentence-ending
//! punctuation, then whitespace, then a hard character boundary. Each chunk
//! after the first is prefixed with the last `overlap` characters of its
//! predecessor so context survives the cut.

use crate::document::{Chunk, PolicyDocument};
use crate::error::{AssistantError, Result};

/// Boundary preference, tried in order within each window.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", "! ", "? "];

/// Splits documents into overlapping chunks at natural separators.
///
/// Output is deterministic for identical input. Stripping the overlap prefix
/// from each chunk and concatenating what remains reconstructs the source
/// text exactly.
#[derive(Debug, Clone)]
pub struct SeparatorChunker {
    chunk_size: usize,
    overlap: usize,
}

impl SeparatorChunker {
    /// Create a new chunker.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if `chunk_size` is zero or
    /// `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AssistantError::Config("chunk_size must be greater than zero".to_string()));
        }
        if overlap >= chunk_size {
            return Err(AssistantError::Config(format!(
                "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Split a document into chunks.
    ///
    /// A document shorter than `chunk_size` yields exactly one chunk; an
    /// empty document yields none. `sequence_index` increases by one per
    /// chunk, starting at 0.
    pub fn split(&self, document: &PolicyDocument) -> Vec<Chunk> {
        let text = &document.text;
        if text.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut pos = 0;
        let mut overlap_prefix = String::new();

        while pos < text.len() {
            let budget = self.chunk_size - overlap_prefix.chars().count();
            let taken = take_len(&text[pos..], budget);
            let chunk_text = format!("{overlap_prefix}{}", &text[pos..pos + taken]);
            pos += taken;

            overlap_prefix = tail_chars(&chunk_text, self.overlap);
            chunks.push(Chunk {
                text: chunk_text,
                source_id: document.source_id.clone(),
                sequence_index: chunks.len(),
            });
        }

        chunks
    }
}

/// Byte length of the prefix of `rest` to consume, at most `budget` characters.
///
/// Prefers to cut just after the highest-priority separator found inside the
/// window, then after the last space, then hard-cuts at the window edge.
/// Always returns at least one byte.
fn take_len(rest: &str, budget: usize) -> usize {
    // Byte index just past the first `budget` characters, or the whole
    // remainder if it fits.
    let window = match rest.char_indices().nth(budget) {
        Some((idx, _)) => idx,
        None => return rest.len(),
    };

    let head = &rest[..window];
    for separator in SEPARATORS {
        if let Some(idx) = head.rfind(separator) {
            return idx + separator.len();
        }
    }
    if let Some(idx) = head.rfind(' ') {
        return idx + 1;
    }
    window
}

/// The last `n` characters of `text` as an owned string.
fn tail_chars(text: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let total = text.chars().count();
    if total <= n {
        return text.to_string();
    }
    let start = text.char_indices().nth(total - n).map(|(idx, _)| idx).unwrap_or(0);
    text[start..].to_string()
}
