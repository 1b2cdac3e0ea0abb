//! Offset bookkeeping for passes that rewrite a script.
//!
//! A pass builds its output from spans copied out of its input plus generated text.
//! Recording those pieces lets a diagnostic found in a later pass's input be traced back
//! to the text the author wrote.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    output: usize,
    input: usize,
    len: usize,
    copied: bool,
}

/// Maps offsets in a rewritten script back to the script it was produced from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    segments: Vec<Segment>,
}

impl OffsetMap {
    /// Map of a pass that left its input unchanged
    pub fn identity(len: usize) -> Self {
        let mut map = Self::default();
        map.push_copied(0, 0, len);
        map
    }

    pub fn push_copied(&mut self, output: usize, input: usize, len: usize) {
        if len > 0 {
            self.segments.push(Segment { output, input, len, copied: true });
        }
    }

    /// Generated text. Every offset inside it maps to `input`, where it was inserted.
    pub fn push_generated(&mut self, output: usize, input: usize, len: usize) {
        if len > 0 {
            self.segments.push(Segment { output, input, len, copied: false });
        }
    }

    /// Offset in the input that produced `offset` of the output
    pub fn to_input(&self, offset: usize) -> usize {
        let index = self.segments.partition_point(|segment| segment.output <= offset);
        let Some(segment) = index.checked_sub(1).map(|i| self.segments[i]) else {
            return offset;
        };
        if segment.copied {
            segment.input + (offset - segment.output).min(segment.len)
        } else {
            segment.input
        }
    }
}

/// Output buffer that records where each piece of it came from
pub struct Rewriter<'a> {
    input: &'a str,
    output: String,
    map: OffsetMap,
}

impl<'a> Rewriter<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            output: String::with_capacity(input.len()),
            map: OffsetMap::default(),
        }
    }

    /// Copy `range` of the input verbatim
    pub fn copy(&mut self, range: Range<usize>) {
        self.map.push_copied(self.output.len(), range.start, range.len());
        self.output.push_str(&self.input[range]);
    }

    /// Emit generated text standing in for input at offset `at`
    pub fn insert(&mut self, text: &str, at: usize) {
        self.map.push_generated(self.output.len(), at, text.len());
        self.output.push_str(text);
    }

    pub fn finish(self) -> (String, OffsetMap) {
        (self.output, self.map)
    }
}
