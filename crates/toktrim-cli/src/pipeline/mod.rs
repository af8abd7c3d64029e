//! The orchestrator: runs the filter chain over one tool invocation.
//!
//! Stage order is fixed:
//!
//! ```text
//! ansi → [shell] build → test → linter → git → search
//!      → [file]  source → structure-truncation
//!      → truncation
//! ```
//!
//! Every enabled stage is attempted and sees the previous stage's output.
//! A stage that panics is skipped with a warning; a fault anywhere else
//! returns the raw input untouched.

use std::panic::{self, AssertUnwindSafe};

use toktrim_common::config::types::PipelineConfig;
use toktrim_common::tracking::types::{MetricRecord, calculate_savings};
use toktrim_filter::Outcome;
use toktrim_filter::filter::{ansi, build, git, lint, search, source, test_run, truncate};

/// Where the text being filtered came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Output of a shell-executing tool running this command line.
    Command(String),
    /// Contents of this file, from a file-reading tool.
    File(String),
    /// Anything else: only the ANSI and truncation stages apply.
    Other,
}

/// Identifies one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub tool: String,
    pub origin: Origin,
    pub session_id: String,
}

impl InvocationContext {
    pub fn shell(tool: &str, command: &str, session_id: &str) -> Self {
        Self {
            tool: tool.to_string(),
            origin: Origin::Command(command.to_string()),
            session_id: session_id.to_string(),
        }
    }

    pub fn file_read(tool: &str, path: &str, session_id: &str) -> Self {
        Self {
            tool: tool.to_string(),
            origin: Origin::File(path.to_string()),
            session_id: session_id.to_string(),
        }
    }
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub output: String,
    /// Comma-joined labels of the stages that changed the text.
    pub technique: Option<String>,
    pub changed: bool,
    /// Present exactly when `changed` is true.
    pub record: Option<MetricRecord>,
}

impl Processed {
    fn passthrough(raw: &str) -> Self {
        Self {
            output: raw.to_string(),
            technique: None,
            changed: false,
            record: None,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return s;
    }
    payload
        .downcast_ref::<String>()
        .map_or("unknown panic", String::as_str)
}

/// Text flowing through the stages plus the labels of those that changed it.
pub(crate) struct Chain {
    pub(crate) text: String,
    pub(crate) labels: Vec<&'static str>,
}

impl Chain {
    pub(crate) fn new(raw: &str) -> Self {
        Self {
            text: raw.to_string(),
            labels: Vec::new(),
        }
    }

    /// Run one stage. A panicking stage leaves the text as it was.
    pub(crate) fn apply(&mut self, label: &'static str, stage: impl FnOnce(&str) -> Outcome) {
        let text = &self.text;
        match panic::catch_unwind(AssertUnwindSafe(|| stage(text))) {
            Ok(Outcome::Changed(next)) => {
                tracing::debug!(
                    stage = label,
                    before = self.text.len(),
                    after = next.len(),
                    "stage changed output"
                );
                self.text = next;
                self.labels.push(label);
            }
            Ok(Outcome::Unchanged) => tracing::debug!(stage = label, "stage left output unchanged"),
            Ok(Outcome::Inapplicable) => tracing::debug!(stage = label, "stage not applicable"),
            Err(payload) => {
                tracing::warn!(
                    stage = label,
                    "filter stage failed, keeping its input: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    fn finish(self, ctx: &InvocationContext, raw: &str) -> Processed {
        if self.text == raw {
            return Processed::passthrough(raw);
        }
        let technique = self.labels.join(",");
        let original_chars = raw.chars().count();
        let filtered_chars = self.text.chars().count();
        let record = MetricRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            session_id: ctx.session_id.clone(),
            tool: ctx.tool.clone(),
            technique: technique.clone(),
            original_chars,
            filtered_chars,
            savings_percent: calculate_savings(original_chars, filtered_chars),
        };
        Processed {
            output: self.text,
            technique: Some(technique),
            changed: true,
            record: Some(record),
        }
    }
}

/// A configured filter chain. Configuration is fixed for the pipeline's
/// lifetime.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Filter `raw`. Never fails: the worst case is the raw text back.
    pub fn process(&self, ctx: &InvocationContext, raw: &str) -> Processed {
        if !self.config.enabled {
            return Processed::passthrough(raw);
        }
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(ctx, raw))) {
            Ok(processed) => processed,
            Err(payload) => {
                tracing::warn!(
                    tool = %ctx.tool,
                    "pipeline failed, passing output through: {}",
                    panic_message(payload.as_ref())
                );
                Processed::passthrough(raw)
            }
        }
    }

    fn run(&self, ctx: &InvocationContext, raw: &str) -> Processed {
        let t = &self.config.techniques;
        let mut chain = Chain::new(raw);

        if t.ansi.enabled {
            chain.apply("ansi", ansi::filter);
        }
        match &ctx.origin {
            Origin::Command(command) => {
                if t.build.enabled {
                    chain.apply("build", |text| build::filter(command, text));
                }
                if t.test.enabled {
                    chain.apply("test", |text| test_run::filter(command, text));
                }
                if t.linter.enabled {
                    chain.apply("linter", |text| lint::filter(command, text));
                }
                if t.git.enabled {
                    chain.apply("git", |text| git::filter(command, text, &t.git));
                }
                if t.search.enabled {
                    chain.apply("search", |text| search::filter(command, text, &t.search));
                }
            }
            Origin::File(path) => {
                if t.source.enabled {
                    let level = t.source.level;
                    chain.apply(level.label(), |text| source::filter(path, text, level));
                }
                if t.structure_truncation.enabled {
                    let max_lines = t.structure_truncation.max_lines;
                    chain.apply("structure-truncation", |text| {
                        source::truncate_structure(path, text, max_lines)
                    });
                }
            }
            Origin::Other => {}
        }
        if t.truncation.enabled {
            let max_chars = t.truncation.max_chars;
            chain.apply("truncation", |text| truncate::filter(text, max_chars));
        }

        chain.finish(ctx, raw)
    }
}

#[cfg(test)]
mod tests;
