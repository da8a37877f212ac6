//! # Chunker
//!
//! Splits source text into top-level chunks, each of which becomes one
//! notebook cell. A new chunk starts at a non-indented line that directly
//! follows a wholly blank line.
//!
//! This is a boundary heuristic, not a parser: a blank line inside a
//! multi-line string or bracket that happens to precede an unindented line
//! is still treated as a split point. Shim digests assume the same
//! splitting on both the wrap and unwrap paths, so the heuristic must stay
//! exactly as it is.
//!
//! Joining the produced chunks with `\n` reproduces the input byte for byte.

use std::str::Split;

/// Lazy iterator over the chunks of a sequence of lines.
///
/// Cloning the iterator (when the underlying line iterator is `Clone`)
/// restarts the split from the same position.
#[derive(Debug, Clone)]
pub struct Chunks<'a, I> {
    lines: I,
    acc: Vec<&'a str>,
    // Set once the accumulator holds a line that is not blank.
    started: bool,
    prev: Option<&'a str>,
    done: bool,
}

impl<'a, I> Chunks<'a, I>
where
    I: Iterator<Item = &'a str>,
{
    /// Chunk an ordered sequence of lines without newline terminators.
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            acc: Vec::new(),
            started: false,
            prev: None,
            done: false,
        }
    }

    fn flush(&mut self) -> String {
        let chunk = self.acc.join("\n");
        self.acc.clear();
        self.started = false;
        chunk
    }
}

impl<'a, I> Iterator for Chunks<'a, I>
where
    I: Iterator<Item = &'a str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        while let Some(line) = self.lines.next() {
            let mut emitted = None;
            if starts_statement(line) && self.prev == Some("") && self.started {
                emitted = Some(self.flush());
            }

            self.acc.push(line);
            if !line.is_empty() {
                self.started = true;
            }
            self.prev = Some(line);

            if emitted.is_some() {
                return emitted;
            }
        }

        self.done = true;
        if self.acc.is_empty() {
            None
        } else {
            Some(self.flush())
        }
    }
}

/// Split `source` into top-level chunks.
pub fn split_toplevel(source: &str) -> Chunks<'_, Split<'_, char>> {
    Chunks::new(source.split('\n'))
}

/// Number of split points `split_toplevel` will find in `source`.
///
/// Counts blank lines followed by a non-indented line, ignoring those
/// that occur before the first non-blank line.
pub fn count_boundaries(source: &str) -> usize {
    let mut count = 0;
    let mut seen_content = false;
    let mut prev: Option<&str> = None;
    for line in source.split('\n') {
        if starts_statement(line) && prev == Some("") && seen_content {
            count += 1;
        }
        if !line.is_empty() {
            seen_content = true;
        }
        prev = Some(line);
    }
    count
}

fn starts_statement(line: &str) -> bool {
    line.chars().next().is_some_and(|c| !c.is_whitespace())
}
