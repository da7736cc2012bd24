//! Options for rendering pair tables back to text.

/// Controls how BPSEQ and CT tables are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit entry comments (`#comment` lines in BPSEQ, trailing ` # comment` in CT).
    pub comments: bool,
}

impl RenderOptions {
    pub fn with_comments() -> Self {
        Self { comments: true }
    }
}

/// Strips a trailing `#` comment, returning `(content, comment)`.
pub(crate) fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find('#') {
        Some(hash) => (line[..hash].trim(), Some(line[hash + 1..].trim())),
        None => (line.trim(), None),
    }
}
