//! `git diff`: per-file headers, hunk ranges and a capped slice of the
//! changed lines. Context lines are dropped.

const HUNK_LINES: usize = 10;

/// Running state for the file currently being read.
struct FileDiff {
    path: String,
    note: Option<&'static str>,
    renamed_from: Option<String>,
    lines: Vec<String>,
    added: usize,
    removed: usize,
    in_hunk: bool,
    hunk_shown: usize,
    hunk_hidden: usize,
}

impl FileDiff {
    fn new(header: &str) -> Self {
        let path = header
            .rsplit_once(" b/")
            .map_or(header, |(_, path)| path)
            .to_string();
        Self {
            path,
            note: None,
            renamed_from: None,
            lines: Vec::new(),
            added: 0,
            removed: 0,
            in_hunk: false,
            hunk_shown: 0,
            hunk_hidden: 0,
        }
    }

    fn close_hunk(&mut self) {
        if self.hunk_hidden > 0 {
            self.lines
                .push(format!("  ... +{} more lines", self.hunk_hidden));
        }
        self.hunk_shown = 0;
        self.hunk_hidden = 0;
    }

    fn read(&mut self, line: &str) {
        if line.starts_with("@@") {
            self.close_hunk();
            self.in_hunk = true;
            self.lines.push(line.to_string());
            return;
        }
        if self.in_hunk && (line.starts_with('+') || line.starts_with('-')) {
            if line.starts_with('+') {
                self.added += 1;
            } else {
                self.removed += 1;
            }
            if self.hunk_shown < HUNK_LINES {
                self.hunk_shown += 1;
                self.lines.push(line.to_string());
            } else {
                self.hunk_hidden += 1;
            }
            return;
        }
        if line.starts_with("Binary files ") {
            self.lines.push(line.to_string());
        } else if line.starts_with("new file mode") {
            self.note = Some("new file");
        } else if line.starts_with("deleted file mode") {
            self.note = Some("deleted");
        } else if let Some(from) = line.strip_prefix("rename from ") {
            self.renamed_from = Some(from.to_string());
        } else if let Some(to) = line.strip_prefix("rename to ") {
            self.path = to.to_string();
        }
    }

    fn finish(mut self, out: &mut Vec<String>) {
        self.close_hunk();
        let name = match &self.renamed_from {
            Some(from) => format!("{from} → {}", self.path),
            None => self.path.clone(),
        };
        let note = self.note.map(|n| format!(" ({n})")).unwrap_or_default();
        out.push(format!("📄 {name}{note}"));
        out.append(&mut self.lines);
        out.push(format!("  +{} -{}", self.added, self.removed));
    }
}

/// Compact a unified git diff. `None` when there is no `diff --git` header,
/// e.g. for `--stat` or `--name-only` output.
pub fn compact_diff(output: &str, max_lines: usize) -> Option<String> {
    let mut out = Vec::new();
    let mut current: Option<FileDiff> = None;
    for line in output.lines() {
        if let Some(header) = line.strip_prefix("diff --git ") {
            if let Some(done) = current.take() {
                done.finish(&mut out);
            }
            current = Some(FileDiff::new(header));
        } else if let Some(file) = current.as_mut() {
            file.read(line);
        }
    }
    current?.finish(&mut out);

    if out.len() > max_lines {
        let hidden = out.len() - max_lines;
        out.truncate(max_lines);
        out.push(format!("... diff truncated: {hidden} more lines"));
    }
    Some(out.join("\n"))
}
