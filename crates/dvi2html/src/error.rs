use std::path::PathBuf;

/// Error returned when converting a DVI file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Dvi(#[from] dvi::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// No font metrics file could be found for the font.
    #[error("no metrics found for font `{font}` (searched {searched:?})")]
    FontNotFound { font: String, searched: Vec<PathBuf> },
    /// A metrics file was found but could not be read or parsed.
    #[error("failed to load metrics for font `{font}`: {source}")]
    Metrics {
        font: String,
        #[source]
        source: crate::tfm::Error,
    },
    #[error("font number {0} was enabled before it was defined")]
    UndefinedFont(u32),
    #[error("text was typeset before any font was enabled")]
    NoActiveFont,
    /// The font metrics have no entry for the character.
    #[error("font `{font}` has no metrics for character {code}")]
    MissingGlyph { font: String, code: u8 },
    /// The encoding table has no entry for the character.
    #[error("no encoding entry for character {code} in font `{font}`")]
    MissingEncoding { font: String, code: u8 },
    /// A character op referenced a code that does not fit in a byte.
    #[error("character code {0} is out of range")]
    CharOutOfRange(u32),
    #[error("pop with an empty position stack")]
    PositionStackUnderflow,
    #[error("color pop with an empty color stack")]
    ColorStackUnderflow,
    #[error("invalid papersize special `{0}`")]
    Papersize(String),
    #[error("PostScript error: {0}")]
    PostScript(#[from] crate::postscript::Error),
    #[error("invalid encoding table: {0}")]
    Encodings(#[from] serde_json::Error),
}
