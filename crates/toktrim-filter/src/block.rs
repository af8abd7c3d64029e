//! Stateful line scanner that groups multi-line reports (compiler errors,
//! test failures) into blocks.
//!
//! A block opens on a line accepted by the start predicate and grows while
//! lines satisfy the continuation predicate. It closes when:
//!
//! - another start line appears (which opens the next block),
//! - a non-blank line is neither a start nor a continuation, or
//! - `Termination::blank_run` consecutive blank lines arrive after the block
//!   already holds more than `Termination::min_lines` lines.
//!
//! Shorter blank runs stay inside the block so spacing within stack traces
//! survives; trailing blanks are trimmed when a block is flushed. Lines
//! outside any block are yielded as [`Segment::Line`] so callers can still
//! classify them.

/// One item produced by [`BlockScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Block(Vec<&'a str>),
    Line(&'a str),
}

impl<'a> Segment<'a> {
    pub fn into_block(self) -> Option<Vec<&'a str>> {
        match self {
            Self::Block(lines) => Some(lines),
            Self::Line(_) => None,
        }
    }
}

/// Blank-line policy for closing a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    pub blank_run: usize,
    pub min_lines: usize,
}

impl Default for Termination {
    fn default() -> Self {
        Self {
            blank_run: 2,
            min_lines: 1,
        }
    }
}

/// Lazy block scanner over any line iterator.
pub struct BlockScanner<'a, I, S, C> {
    lines: I,
    starts: S,
    continues: C,
    termination: Termination,
    current: Vec<&'a str>,
    in_block: bool,
    blank_run: usize,
    queued: Option<Segment<'a>>,
}

impl<'a, I, S, C> BlockScanner<'a, I, S, C>
where
    I: Iterator<Item = &'a str>,
    S: Fn(&str) -> bool,
    C: Fn(&str) -> bool,
{
    pub fn new(lines: I, starts: S, continues: C) -> Self {
        Self {
            lines,
            starts,
            continues,
            termination: Termination::default(),
            current: Vec::new(),
            in_block: false,
            blank_run: 0,
            queued: None,
        }
    }

    #[must_use]
    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    fn open(&mut self, line: &'a str) {
        self.in_block = true;
        self.blank_run = 0;
        self.current.push(line);
    }

    fn flush(&mut self) -> Option<Segment<'a>> {
        if !self.in_block {
            return None;
        }
        self.in_block = false;
        self.blank_run = 0;
        let mut block = std::mem::take(&mut self.current);
        while block.last().is_some_and(|l| l.trim().is_empty()) {
            block.pop();
        }
        Some(Segment::Block(block))
    }
}

impl<'a, I, S, C> Iterator for BlockScanner<'a, I, S, C>
where
    I: Iterator<Item = &'a str>,
    S: Fn(&str) -> bool,
    C: Fn(&str) -> bool,
{
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if let Some(queued) = self.queued.take() {
            return Some(queued);
        }

        while let Some(line) = self.lines.next() {
            if !self.in_block {
                if (self.starts)(line) {
                    self.open(line);
                    continue;
                }
                return Some(Segment::Line(line));
            }

            if line.trim().is_empty() {
                self.blank_run += 1;
                if self.blank_run >= self.termination.blank_run
                    && self.current.len() > self.termination.min_lines
                {
                    return self.flush();
                }
                self.current.push(line);
                continue;
            }

            self.blank_run = 0;
            if (self.starts)(line) {
                let finished = self.flush();
                self.open(line);
                return finished;
            }
            if (self.continues)(line) {
                self.current.push(line);
                continue;
            }
            let finished = self.flush();
            self.queued = Some(Segment::Line(line));
            return finished;
        }

        self.flush()
    }
}

/// Scan `text` line by line.
pub fn scan<S, C>(
    text: &str,
    starts: S,
    continues: C,
) -> BlockScanner<'_, std::str::Lines<'_>, S, C>
where
    S: Fn(&str) -> bool,
    C: Fn(&str) -> bool,
{
    BlockScanner::new(text.lines(), starts, continues)
}

/// Continuation by indentation: the line starts with a space or tab.
pub fn is_indented(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}
