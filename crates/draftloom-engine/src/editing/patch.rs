/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    /// Indices of blocks whose content, order, focus, or cached layout
    /// changed. Structural edits renumber, so they report every index.
    pub changed: Vec<usize>,
    /// Block index that should take the caret, when the command moved it.
    pub new_focus: Option<usize>,
    /// Document version after the command.
    pub version: u64,
}

impl Patch {
    /// Patch for a command that matched nothing; the version is the
    /// document's current one, unchanged.
    pub(crate) fn unchanged(version: u64) -> Self {
        Self {
            changed: Vec::new(),
            new_focus: None,
            version,
        }
    }
}
