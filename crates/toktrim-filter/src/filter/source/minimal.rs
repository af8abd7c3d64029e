use super::{Language, Quote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Str(Quote),
    LineComment,
    BlockComment,
    /// Documentation or shebang: copied through to end of line.
    KeptLine,
    /// Documentation block: copied through to the closing delimiter.
    KeptBlock,
}

fn at(chars: &[char], i: usize, pat: &str) -> bool {
    pat.chars()
        .enumerate()
        .all(|(k, p)| chars.get(i + k) == Some(&p))
}

fn starts_any(chars: &[char], i: usize, pats: &[&str]) -> Option<usize> {
    pats.iter()
        .find(|p| at(chars, i, p))
        .map(|p| p.chars().count())
}

/// `#` opens a comment only at line start or after whitespace.
fn comment_allowed(marker: &str, line: &str) -> bool {
    marker != "#" || line.is_empty() || line.ends_with(char::is_whitespace)
}

/// Rust-style `'`: a char literal (`'a'`, `'\n'`, `'\u{1F600}'`), not a
/// lifetime.
fn is_char_literal(chars: &[char], i: usize) -> bool {
    match chars.get(i + 1) {
        Some('\\') => true,
        Some(_) => chars.get(i + 2) == Some(&'\''),
        None => false,
    }
}

struct Stripper<'l> {
    lang: &'l Language,
    lines: Vec<(String, bool)>,
    line: String,
    touched: bool,
    state: State,
}

impl Stripper<'_> {
    fn end_line(&mut self) {
        match self.state {
            State::Str(q) if !q.multiline => self.state = State::Code,
            State::LineComment | State::KeptLine => self.state = State::Code,
            _ => {}
        }
        let line = std::mem::take(&mut self.line);
        self.lines.push((line, self.touched));
        self.touched = self.state == State::BlockComment;
    }

    /// Handle a code character at `i`; returns how many chars were consumed.
    fn code(&mut self, chars: &[char], i: usize) -> usize {
        let lang = self.lang;
        if self.lines.is_empty() && self.line.is_empty() && at(chars, i, "#!") {
            self.state = State::KeptLine;
            self.line.push_str("#!");
            return 2;
        }
        if let Some((open, _)) = lang.block_comment {
            if let Some(n) = starts_any(chars, i, lang.doc_block_prefixes)
                && !at(chars, i, "/**/")
            {
                self.state = State::KeptBlock;
                self.line.extend(&chars[i..i + n]);
                return n;
            }
            if at(chars, i, open) {
                self.state = State::BlockComment;
                self.touched = true;
                trim_end_in_place(&mut self.line);
                return open.chars().count();
            }
        }
        if let Some(n) = starts_any(chars, i, lang.doc_line_prefixes) {
            self.state = State::KeptLine;
            self.line.extend(&chars[i..i + n]);
            return n;
        }
        for marker in lang.line_comments {
            if at(chars, i, marker) && comment_allowed(marker, &self.line) {
                self.state = State::LineComment;
                self.touched = true;
                trim_end_in_place(&mut self.line);
                return marker.chars().count();
            }
        }
        let c = chars[i];
        if c == '\'' && lang.lifetimes && !is_char_literal(chars, i) {
            self.line.push(c);
            return 1;
        }
        if let Some(q) = lang.quotes.iter().find(|q| at(chars, i, q.open)) {
            self.state = State::Str(*q);
            self.line.push_str(q.open);
            return q.open.chars().count();
        }
        self.line.push(c);
        1
    }

    fn step(&mut self, chars: &[char], i: usize) -> usize {
        let c = chars[i];
        match self.state {
            State::Code => self.code(chars, i),
            State::Str(q) => {
                if c == '\\' {
                    self.line.push(c);
                    if let Some(&next) = chars.get(i + 1)
                        && next != '\n'
                    {
                        self.line.push(next);
                        return 2;
                    }
                    return 1;
                }
                if at(chars, i, q.close) {
                    self.line.push_str(q.close);
                    self.state = State::Code;
                    return q.close.chars().count();
                }
                self.line.push(c);
                1
            }
            State::LineComment => 1,
            State::BlockComment => match self.lang.block_comment {
                Some((_, close)) if at(chars, i, close) => {
                    self.state = State::Code;
                    close.chars().count()
                }
                _ => 1,
            },
            State::KeptLine => {
                self.line.push(c);
                1
            }
            State::KeptBlock => {
                if let Some((_, close)) = self.lang.block_comment
                    && at(chars, i, close)
                {
                    self.line.push_str(close);
                    self.state = State::Code;
                    return close.chars().count();
                }
                self.line.push(c);
                1
            }
        }
    }
}

fn trim_end_in_place(line: &mut String) {
    let len = line.trim_end().len();
    line.truncate(len);
}

/// Remove comments from `text`. Lines left blank by a removal disappear;
/// lines that were blank to begin with stay.
pub fn strip_comments(text: &str, lang: &Language) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut s = Stripper {
        lang,
        lines: Vec::new(),
        line: String::new(),
        touched: false,
        state: State::Code,
    };
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\n' {
            s.end_line();
            i += 1;
            continue;
        }
        i += s.step(&chars, i).max(1);
    }
    s.end_line();

    s.lines
        .into_iter()
        .filter(|(line, touched)| !(*touched && line.trim().is_empty()))
        .map(|(line, _)| line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Squeeze runs of three or more blank lines down to two.
pub fn collapse_blank_runs(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blanks = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blanks += 1;
            if blanks > 2 {
                continue;
            }
        } else {
            blanks = 0;
        }
        out.push(line);
    }
    out.join("\n")
}

/// Comments stripped, blank runs squeezed, outer whitespace trimmed.
pub fn minimal(text: &str, lang: &Language) -> String {
    collapse_blank_runs(&strip_comments(text, lang))
        .trim()
        .to_string()
}
