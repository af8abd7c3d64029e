//! Git output compaction, dispatched by subcommand.

mod diff;
mod log;
mod status;

pub use diff::compact_diff;
pub use log::compact_log;
pub use status::compact_status;

use toktrim_common::config::types::GitConfig;

use crate::Outcome;
use crate::pattern;

/// Apply to the output of a `git diff`, `git status` or `git log` command.
/// Any other subcommand is not handled.
pub fn filter(command: &str, output: &str, config: &GitConfig) -> Outcome {
    let compacted = match pattern::git_subcommand(command).as_deref() {
        Some("diff") => compact_diff(output, config.max_diff_lines),
        Some("status") => status::parse(output).map(|s| s.render()),
        Some("log") => compact_log(output, config.max_log_commits),
        _ => return Outcome::Inapplicable,
    };
    match compacted {
        Some(text) if text != output.trim_end() => Outcome::Changed(text),
        _ => Outcome::Unchanged,
    }
}
