//! Signature-only view of a source file.
//!
//! Comments go first (see [`minimal`]). What remains is reduced to imports,
//! exports, top-level constants and declaration lines; every function body
//! becomes a single `...` line.

use super::Language;
use super::minimal::minimal;
use super::shape::{
    brace_delta, indent_of, indent_width, is_brace_only, is_constant, is_container,
    is_function, is_import,
};

#[derive(Debug, Clone, Copy)]
enum Skip {
    /// Brace body: skip until depth falls back to this level.
    Depth(isize),
    /// Indented body: skip lines indented deeper than this.
    Indent(usize),
}

/// A function signature that spans lines, waiting for its body opener.
struct Pending {
    indent: String,
    width: usize,
}

fn placeholder(indent: &str) -> String {
    format!("{indent}    ...")
}

struct Reducer<'l> {
    lang: &'l Language,
    out: Vec<String>,
    depth: isize,
    skip: Option<Skip>,
    pending: Option<Pending>,
}

impl Reducer<'_> {
    fn add_depth(&mut self, delta: isize) {
        self.depth = (self.depth + delta).max(0);
    }

    /// Returns true if `line` was swallowed by a body being skipped.
    fn skipping(&mut self, line: &str) -> bool {
        match self.skip {
            None => false,
            Some(Skip::Indent(base)) => {
                if line.trim().is_empty() || indent_width(line) > base {
                    self.add_depth(brace_delta(line));
                    return true;
                }
                self.skip = None;
                false
            }
            Some(Skip::Depth(base)) => {
                self.add_depth(brace_delta(line));
                if self.depth <= base {
                    self.skip = None;
                    if line.trim_start().starts_with('}') {
                        self.out.push(line.to_string());
                    }
                }
                true
            }
        }
    }

    /// Emit a signature line and open its body if this line starts one.
    fn signature(&mut self, line: &str, indent: &str, width: usize) {
        let trimmed = line.trim_end();
        self.out.push(line.to_string());
        if self.lang.indent_blocks {
            if trimmed.ends_with(':') {
                self.out.push(placeholder(indent));
                self.skip = Some(Skip::Indent(width));
            } else {
                self.pending = Some(Pending {
                    indent: indent.to_string(),
                    width,
                });
            }
            self.add_depth(brace_delta(line));
            return;
        }
        let delta = brace_delta(line);
        if delta > 0 {
            self.out.push(placeholder(indent));
            self.skip = Some(Skip::Depth(self.depth));
        } else if !trimmed.ends_with(';') && !trimmed.ends_with('}') {
            self.pending = Some(Pending {
                indent: indent.to_string(),
                width,
            });
        }
        self.add_depth(delta);
    }

    fn line(&mut self, line: &str) {
        if self.skipping(line) {
            return;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if let Some(Pending { indent, width }) = self.pending.take() {
            self.signature(line, &indent, width);
            return;
        }
        if is_function(line) {
            self.signature(line, indent_of(line), indent_width(line));
            return;
        }
        let top_level = self.depth == 0 && indent_width(line) == 0;
        let keep = is_container(line)
            || is_import(line)
            || (top_level && is_constant(line))
            || (self.depth > 0 && is_brace_only(line));
        if keep {
            self.out.push(line.to_string());
        }
        self.add_depth(brace_delta(line));
    }
}

/// Imports, exports, top-level constants and signatures with collapsed
/// bodies.
pub fn aggressive(text: &str, lang: &Language) -> String {
    let stripped = minimal(text, lang);
    let mut reducer = Reducer {
        lang,
        out: Vec::new(),
        depth: 0,
        skip: None,
        pending: None,
    };
    for line in stripped.lines() {
        reducer.line(line);
    }
    reducer.out.join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::super::language_for;
    use super::*;

    fn lang(path: &str) -> &'static Language {
        language_for(path).unwrap()
    }

    #[test]
    fn rust_bodies_collapsed() {
        let src = "\
use std::fmt;

// helper
const LIMIT: usize = 3;

pub struct Point {
    x: i32,
}

impl Point {
    pub fn new(x: i32) -> Self {
        let p = Self { x };
        p
    }
}

fn main() {
    println!(\"{}\", LIMIT);
}
";
        let out = aggressive(src, lang("main.rs"));
        assert_eq!(
            out,
            "use std::fmt;\nconst LIMIT: usize = 3;\npub struct Point {\n}\nimpl Point {\n    pub fn new(x: i32) -> Self {\n        ...\n    }\n}\nfn main() {\n    ...\n}"
        );
    }

    #[test]
    fn multiline_signature() {
        let src = "fn long(\n    a: u8,\n    b: u8,\n) -> u8 {\n    a + b\n}\n";
        let out = aggressive(src, lang("a.rs"));
        assert_eq!(out, "fn long(\n    a: u8,\n    b: u8,\n) -> u8 {\n    ...\n}");
    }

    #[test]
    fn trait_declarations_kept() {
        let src = "pub trait Shape {\n    fn area(&self) -> f64;\n    fn name(&self) -> String {\n        String::new()\n    }\n}";
        let out = aggressive(src, lang("a.rs"));
        assert_eq!(
            out,
            "pub trait Shape {\n    fn area(&self) -> f64;\n    fn name(&self) -> String {\n        ...\n    }\n}"
        );
    }

    #[test]
    fn python_indent_bodies() {
        let src = "\
import os
from typing import List

MAX_SIZE = 10

class Loader:
    \"\"\"Loads things.\"\"\"
    cache = {}

    def load(self, path):
        with open(path) as f:
            return f.read()

def main():
    Loader().load(os.getcwd())
";
        let out = aggressive(src, lang("tool.py"));
        assert_eq!(
            out,
            "import os\nfrom typing import List\nMAX_SIZE = 10\nclass Loader:\n    def load(self, path):\n        ...\ndef main():\n    ..."
        );
    }

    #[test]
    fn typescript_exports() {
        let src = "import { a } from './a';\n\nexport function run(x: number): number {\n  const y = x * 2;\n  return y;\n}\n\nexport const VERSION = '1.0';\n";
        let out = aggressive(src, lang("index.ts"));
        assert_eq!(
            out,
            "import { a } from './a';\nexport function run(x: number): number {\n    ...\n}\nexport const VERSION = '1.0';"
        );
    }
}
