//! Buffered and streaming line transforms.

use std::sync::Arc;

/// A user-supplied output transform, applied to one line at a time.
pub type Transform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Separator used to split output into lines.
pub const LINE_SEPARATOR: char = '\n';

/// Transform that returns every line unchanged.
pub fn identity() -> Transform {
    Arc::new(|line: &str| line.to_string())
}

/// Transform that prepends `prefix` and a space to every line.
pub fn prefix(prefix: impl Into<String>) -> Transform {
    let prefix = prefix.into();
    Arc::new(move |line: &str| format!("{} {}", prefix, line))
}

/// Apply `transform` to each non-empty line of `text`.
///
/// Empty lines are left untouched so that separators are never tagged,
/// and the text is rejoined with the same separator.
pub fn apply_to_buffer(transform: &Transform, text: &str) -> String {
    text.split(LINE_SEPARATOR)
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                transform(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Streaming stage that applies a transform to chunked output.
///
/// Chunks need not end on a line boundary. Complete lines are transformed
/// and emitted as soon as their separator arrives; a trailing partial line
/// is held back until the next chunk completes it or [`finish`] flushes it.
/// The concatenated output is therefore identical to [`apply_to_buffer`]
/// over the whole stream.
///
/// [`finish`]: LineTransformer::finish
pub struct LineTransformer {
    transform: Transform,
    pending: Vec<u8>,
}

impl LineTransformer {
    /// Create a streaming stage for `transform`.
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            pending: Vec::new(),
        }
    }

    /// Feed a chunk, returning the transformed text of any completed lines.
    pub fn push(&mut self, chunk: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(chunk);

        let split_at = self.pending.iter().rposition(|&b| b == b'\n')? + 1;
        let rest = self.pending.split_off(split_at);
        let complete = std::mem::replace(&mut self.pending, rest);

        Some(apply_to_buffer(
            &self.transform,
            &String::from_utf8_lossy(&complete),
        ))
    }

    /// Flush a trailing partial line at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let remainder = std::mem::take(&mut self.pending);
        Some(apply_to_buffer(
            &self.transform,
            &String::from_utf8_lossy(&remainder),
        ))
    }

    /// Number of buffered bytes still waiting for a line separator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl std::fmt::Debug for LineTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineTransformer")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
