//! Language-agnostic line shapes: imports, declarations, constants, braces.

use std::sync::LazyLock;

use regex::Regex;

use crate::pattern::builtin;

const MODIFIERS: &str = r#"(?:(?:pub(?:\([^)]*\))?|export|default|async|static|public|private|protected|internal|override|final|abstract|virtual|inline|unsafe|extern(?:\s+"[^"]*")?|const|sealed|data|open|partial|suspend|declare)\s+)*"#;

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^\s*(?:
            import\b
          | from\s+\S+\s+import\b
          | (?:pub(?:\([^)]*\))?\s+)?use\s
          | (?:pub(?:\([^)]*\))?\s+)?mod\s+\w+\s*;
          | export\b
          | module\.exports\b
          | require\b
          | \#\s*(?:include|import)\b
          | package\s
          | extern\s+crate\b
          | using\s
          | (?:const|let|var)\s+\S+\s*=\s*require\(
        )",
    )
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    builtin(&format!(
        r"^\s*{MODIFIERS}(?:fn|function\*?|def|func|fun|sub|proc)\b"
    ))
});

static CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    builtin(&format!(
        r"^\s*{MODIFIERS}(?:class|struct|enum|trait|impl|interface|type|module|mod|namespace|object|protocol|extension|union)\b"
    ))
});

static CONSTANT: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"^(?:(?:pub(?:\([^)]*\))?|export)\s+)?(?:const|static|let|var|val|final)\b|^#define\b|^[A-Z_][A-Z0-9_]*\s*(?::[^=]+)?=",
    )
});

static BRACE_ONLY: LazyLock<Regex> = LazyLock::new(|| builtin(r"^\s*[{}()\[\];,]+\s*$"));

pub fn is_import(line: &str) -> bool {
    IMPORT.is_match(line)
}

pub fn is_function(line: &str) -> bool {
    FUNCTION.is_match(line)
}

pub fn is_container(line: &str) -> bool {
    CONTAINER.is_match(line)
}

pub fn is_signature(line: &str) -> bool {
    is_function(line) || is_container(line)
}

/// Constant/static declaration starting at column 0.
pub fn is_constant(line: &str) -> bool {
    CONSTANT.is_match(line)
}

pub fn is_brace_only(line: &str) -> bool {
    BRACE_ONLY.is_match(line)
}

pub fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

pub fn indent_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Net `{` minus `}` outside double-quoted and backtick strings.
pub fn brace_delta(line: &str) -> isize {
    let mut delta = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in line.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '`') => quote = Some(c),
            (None, '{') => delta += 1,
            (None, '}') => delta -= 1,
            (None, _) => {}
        }
    }
    delta
}
