use std::path::PathBuf;

/// How to handle characters that the metrics or encoding tables do not cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Missing metrics and missing encoding entries are errors.
    #[default]
    Strict,
    /// Missing metrics fall back to the metrics of character 126 and
    /// missing encoding entries fall back to the legacy code point mapping.
    /// Each substitution is logged at warn level.
    Lenient,
}

/// Options for a conversion.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub strictness: Strictness,
    /// Directories searched, in order, for `<font>.tfm` files.
    pub font_dirs: Vec<PathBuf>,
    /// JSON file mapping font names to character code tables.
    pub encodings: Option<PathBuf>,
}

impl Options {
    pub fn lenient(mut self) -> Self {
        self.strictness = Strictness::Lenient;
        self
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }
}
