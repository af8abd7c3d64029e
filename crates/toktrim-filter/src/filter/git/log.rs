//! `git log`: one line per commit, clipped and counted.

use std::sync::LazyLock;

use regex::Regex;

use crate::filter::clip;
use crate::pattern::builtin;

const LINE_WIDTH: usize = 120;

static COMMIT: LazyLock<Regex> = LazyLock::new(|| builtin(r"^commit ([0-9a-f]{7,64})\b"));

/// Condense full-format entries (`commit`, `Author:`, `Date:`, indented
/// message) into `<sha8> <subject> (<author>, <date>)`.
fn condense_full(output: &str) -> Vec<String> {
    #[derive(Default)]
    struct Entry<'a> {
        sha: &'a str,
        author: &'a str,
        date: &'a str,
        subject: Option<&'a str>,
    }

    impl Entry<'_> {
        fn line(&self) -> String {
            let sha = self.sha.get(..8).unwrap_or(self.sha);
            let subject = self.subject.unwrap_or("");
            match (self.author.is_empty(), self.date.is_empty()) {
                (false, false) => format!("{sha} {subject} ({}, {})", self.author, self.date),
                (false, true) => format!("{sha} {subject} ({})", self.author),
                (true, false) => format!("{sha} {subject} ({})", self.date),
                (true, true) => format!("{sha} {subject}"),
            }
        }
    }

    let mut entries: Vec<Entry<'_>> = Vec::new();
    for line in output.lines() {
        if let Some(caps) = COMMIT.captures(line) {
            entries.push(Entry {
                sha: caps.get(1).map_or("", |m| m.as_str()),
                ..Entry::default()
            });
            continue;
        }
        let Some(entry) = entries.last_mut() else {
            continue;
        };
        if let Some(author) = line.strip_prefix("Author:") {
            let author = author.trim();
            entry.author = author.split_once(" <").map_or(author, |(name, _)| name);
        } else if let Some(date) = line.strip_prefix("Date:") {
            entry.date = date.trim();
        } else if entry.subject.is_none() && line.starts_with("    ") && !line.trim().is_empty() {
            entry.subject = Some(line.trim());
        }
    }
    entries.iter().map(Entry::line).collect()
}

/// Compact `git log` output to at most `max_commits` clipped lines with a
/// `+N more commits` trailer. `None` for empty output.
pub fn compact_log(output: &str, max_commits: usize) -> Option<String> {
    let lines: Vec<String> = if output.lines().any(|l| COMMIT.is_match(l)) {
        condense_full(output)
    } else {
        output
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.trim_end().to_string())
            .collect()
    };
    if lines.is_empty() {
        return None;
    }

    let mut out: Vec<String> = lines
        .iter()
        .take(max_commits)
        .map(|l| clip(l, LINE_WIDTH).into_owned())
        .collect();
    if lines.len() > max_commits {
        out.push(format!("+{} more commits", lines.len() - max_commits));
    }
    Some(out.join("\n"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn full_format_condensed() {
        let out = "\
commit 3f2a9c1d8e7b6a5f4e3d2c1b0a9f8e7d6c5b4a3f
Author: Ada Lovelace <ada@example.com>
Date:   Mon Jan 6 10:00:00 2025 +0000

    Add analytical engine driver

    Longer body text that is dropped.

commit 1111111122222222333333334444444455555555
Merge: aaaaaaa bbbbbbb
Author: Charles Babbage <cb@example.com>
Date:   Sun Jan 5 09:00:00 2025 +0000

    Merge branch 'difference'
";
        let text = compact_log(out, 20).unwrap();
        assert_eq!(
            text,
            "3f2a9c1d Add analytical engine driver (Ada Lovelace, Mon Jan 6 10:00:00 2025 +0000)\n\
             11111111 Merge branch 'difference' (Charles Babbage, Sun Jan 5 09:00:00 2025 +0000)"
        );
    }

    #[test]
    fn oneline_capped() {
        let out: String = (0..25).map(|i| format!("abc{i:04} commit number {i}\n")).collect();
        let text = compact_log(&out, 20).unwrap();
        assert_eq!(text.lines().count(), 21);
        assert!(text.ends_with("+5 more commits"));
    }

    #[test]
    fn long_lines_clipped() {
        let out = format!("abc1234 {}", "word ".repeat(60));
        let text = compact_log(&out, 20).unwrap();
        assert_eq!(text.chars().count(), 120);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn empty_log() {
        assert_eq!(compact_log("", 20), None);
    }
}
