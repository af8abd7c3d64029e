pub mod block;
pub mod filter;
pub mod pattern;

/// What a single filter did with its input.
///
/// `Inapplicable` and `Unchanged` are deliberately distinct: only a filter
/// that recognized the input *and* altered it earns a place in the technique
/// label chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command, path or content is not something this filter handles.
    Inapplicable,
    /// The filter handled the input but had nothing to remove.
    Unchanged,
    /// The filter produced new text.
    Changed(String),
}

impl Outcome {
    /// `Changed` if `filtered` differs from `original`, else `Unchanged`.
    pub fn compare(original: &str, filtered: String) -> Self {
        if filtered == original {
            Self::Unchanged
        } else {
            Self::Changed(filtered)
        }
    }

    pub const fn is_applicable(&self) -> bool {
        !matches!(self, Self::Inapplicable)
    }

    /// The new text, if any.
    pub fn changed(self) -> Option<String> {
        match self {
            Self::Changed(text) => Some(text),
            Self::Inapplicable | Self::Unchanged => None,
        }
    }
}
