//! The working text of one obfuscation run.
//!
//! Every edit is a span splice. Batches of splices must be applied from the
//! highest offset down: replacing text at offset `n` shifts everything after
//! `n`, so spans computed from one parse stay valid only for the text before
//! the last splice.

use crate::result::{Error, Result};
use crate::tree::Span;

/// One pending replacement of `span` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub span: Span,
    pub text: String,
}

impl Splice {
    pub fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBuffer {
    text: String,
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Replaces the whole buffer, used by passes that rewrite globally.
    pub fn replace_all(&mut self, text: String) {
        self.text = text;
    }

    /// Replaces `[span.start, span.end)` with `text`.
    pub fn splice(&mut self, span: Span, text: &str) -> Result<()> {
        if span.start > span.end
            || span.end > self.text.len()
            || !self.text.is_char_boundary(span.start)
            || !self.text.is_char_boundary(span.end)
        {
            return Err(Error::InvalidSpan {
                start: span.start,
                end: span.end,
                len: self.text.len(),
            });
        }
        self.text.replace_range(span.start..span.end, text);
        Ok(())
    }

    /// Applies a batch of splices computed against the current text.
    ///
    /// The batch is sorted by descending start offset first; overlapping
    /// spans are rejected before anything is written.
    pub fn splice_descending(&mut self, mut splices: Vec<Splice>) -> Result<usize> {
        splices.sort_by(|a, b| b.span.start.cmp(&a.span.start));

        let mut floor = usize::MAX;
        for splice in &splices {
            if splice.span.end > floor {
                return Err(Error::SpliceOrder(splice.span.start));
            }
            floor = splice.span.start;
        }

        let count = splices.len();
        for splice in splices {
            self.splice(splice.span, &splice.text)?;
        }
        Ok(count)
    }
}

impl std::fmt::Display for SourceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
