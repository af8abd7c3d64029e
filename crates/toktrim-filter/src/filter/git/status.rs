//! `git status` in porcelain/short or long format, bucketed.

const STAGED_SHOWN: usize = 5;
const MODIFIED_SHOWN: usize = 5;
const UNTRACKED_SHOWN: usize = 3;

const CLEAN: &str = "Clean working tree";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Status<'a> {
    pub branch: Option<&'a str>,
    pub staged: Vec<&'a str>,
    pub modified: Vec<&'a str>,
    pub untracked: Vec<&'a str>,
    pub conflicts: Vec<&'a str>,
}

impl Status<'_> {
    fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.untracked.is_empty()
            && self.conflicts.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = Vec::new();
        if let Some(branch) = self.branch {
            out.push(format!("On {branch}"));
        }
        if self.is_clean() {
            out.push(CLEAN.to_string());
            return out.join("\n");
        }
        bucket(&mut out, "Conflicts", &self.conflicts, usize::MAX);
        bucket(&mut out, "Staged", &self.staged, STAGED_SHOWN);
        bucket(&mut out, "Modified", &self.modified, MODIFIED_SHOWN);
        bucket(&mut out, "Untracked", &self.untracked, UNTRACKED_SHOWN);
        out.join("\n")
    }
}

fn bucket(out: &mut Vec<String>, title: &str, files: &[&str], cap: usize) {
    if files.is_empty() {
        return;
    }
    let mut shown: Vec<String> = files.iter().take(cap).map(ToString::to_string).collect();
    if files.len() > cap {
        shown.push(format!("+{} more", files.len() - cap));
    }
    out.push(format!("{title} ({}): {}", files.len(), shown.join(", ")));
}

/// Bucket one porcelain entry by its two-letter code.
fn classify<'a>(status: &mut Status<'a>, x: char, y: char, path: &'a str) {
    match (x, y) {
        ('?', '?') => status.untracked.push(path),
        ('!', '!') => {}
        ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => status.conflicts.push(path),
        _ => {
            if matches!(x, 'M' | 'A' | 'D' | 'R' | 'C' | 'T') {
                status.staged.push(path);
            }
            if matches!(y, 'M' | 'D' | 'T') {
                status.modified.push(path);
            }
        }
    }
}

fn parse_porcelain(output: &str) -> Option<Status<'_>> {
    let mut status = Status::default();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(branch) = line.strip_prefix("## ") {
            status.branch = Some(branch.trim());
            continue;
        }
        let mut chars = line.chars();
        let (Some(x), Some(y), Some(' ')) = (chars.next(), chars.next(), chars.next()) else {
            return None;
        };
        if !x.is_ascii() || !y.is_ascii() {
            return None;
        }
        let path = line[3..].trim();
        let path = path.rsplit_once(" -> ").map_or(path, |(_, to)| to);
        classify(&mut status, x, y, path);
    }
    Some(status)
}

#[derive(Clone, Copy)]
enum Section {
    None,
    Staged,
    Modified,
    Untracked,
    Conflicts,
}

const LONG_MARKERS: &[&str] = &[
    "On branch ",
    "HEAD detached ",
    "Not currently on any branch",
    "Changes to be committed:",
    "Changes not staged for commit:",
    "Untracked files:",
    "Unmerged paths:",
    "nothing to commit",
];

fn is_long_format(output: &str) -> bool {
    output
        .lines()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|first| LONG_MARKERS.iter().any(|m| first.starts_with(m)))
}

/// Drop a long-format `modified:   ` style prefix.
fn strip_change_kind(entry: &str) -> &str {
    entry
        .split_once(":   ")
        .or_else(|| entry.split_once(": "))
        .filter(|(kind, _)| kind.chars().all(|c| c.is_ascii_lowercase() || c == ' '))
        .map_or(entry, |(_, path)| path.trim())
}

fn parse_long(output: &str) -> Status<'_> {
    let mut status = Status::default();
    let mut section = Section::None;
    for line in output.lines() {
        if let Some(branch) = line.strip_prefix("On branch ") {
            status.branch = Some(branch.trim());
            continue;
        }
        section = match line.trim_end() {
            "Changes to be committed:" => Section::Staged,
            "Changes not staged for commit:" => Section::Modified,
            "Untracked files:" => Section::Untracked,
            "Unmerged paths:" => Section::Conflicts,
            _ => section,
        };
        if !line.starts_with('\t') {
            if !line.starts_with(' ') && !line.trim().is_empty() && !line.ends_with(':') {
                section = Section::None;
            }
            continue;
        }
        let entry = line.trim();
        let path = match section {
            Section::Untracked => entry,
            _ => strip_change_kind(entry),
        };
        let path = path.rsplit_once(" -> ").map_or(path, |(_, to)| to);
        match section {
            Section::Staged => status.staged.push(path),
            Section::Modified => status.modified.push(path),
            Section::Untracked => status.untracked.push(path),
            Section::Conflicts => status.conflicts.push(path),
            Section::None => {}
        }
    }
    status
}

/// Parse either format. `None` for porcelain-looking output with a line
/// that is not a status entry.
pub fn parse(output: &str) -> Option<Status<'_>> {
    if is_long_format(output) {
        Some(parse_long(output))
    } else {
        parse_porcelain(output)
    }
}

/// Bucketed summary of `git status` output; empty output is a clean tree.
/// Output that cannot be parsed is returned as is.
pub fn compact_status(output: &str) -> String {
    parse(output).map_or_else(|| output.to_string(), |s| s.render())
}
