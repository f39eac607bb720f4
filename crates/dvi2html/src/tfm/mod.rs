//! TeX font metrics.
//!
//! A [`FontMetrics`] value holds the parts of a TeX font metric (.tfm) file
//! that are needed to position text: the design size and the per-character
//! dimensions, plus the lig/kern program and font parameters.
//!
//! All dimensions are in the raw TFM fixed-point representation: a value of
//! `1 << 20` is equal to the design size of the font.
//!
//! Metrics are obtained by name through a [`MetricsProvider`].

use std::collections::HashMap;
use std::path::PathBuf;

mod deserialize;

/// Error returned when a TFM file cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file is too small to contain the file length and sub-file sizes.
    #[error("the file is only {0} bytes long")]
    TooShort(usize),
    /// The file length in the file does not match the actual length.
    ///
    /// The variant payload is the claimed length (in words) and the actual
    /// file size (in bytes).
    #[error("the file claims to be {0} words long but has {1} bytes")]
    InvalidFileLength(i16, usize),
    #[error("one of the sub-file sizes is negative: {0:?}")]
    SubFileSizeIsNegative(SubFileSizes),
    #[error("the header length is only {0}")]
    HeaderLengthIsTooSmall(i16),
    #[error("the character code range {0}..{1} is illegal")]
    InvalidCharacterRange(i16, i16),
    #[error("incomplete sub-files for character dimensions: {0:?}")]
    IncompleteSubFiles(SubFileSizes),
    /// The sub-file sizes do not add up to the file length.
    #[error("sub-file sizes don't add up to the stated total {0}: {1:?}")]
    InconsistentSubFileSizes(i16, SubFileSizes),
    /// A char info entry points past the end of a dimension table.
    #[error("character {0} refers to a missing dimension")]
    InvalidCharInfo(u8),
    /// A kern instruction points past the end of the kern table.
    #[error("lig/kern instruction {0} refers to a missing kern")]
    InvalidKernIndex(usize),
    #[error("failed to read font metrics: {0}")]
    Io(#[from] std::io::Error),
}

/// Sizes of the sub-files of a TFM file, in words.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct SubFileSizes {
    /// Length of the header data.
    pub lh: i16,
    /// Smallest character code in the font.
    pub bc: i16,
    /// Largest character code in the font.
    pub ec: i16,
    pub nw: i16,
    pub nh: i16,
    pub nd: i16,
    pub ni: i16,
    pub nl: i16,
    pub nk: i16,
    pub ne: i16,
    pub np: i16,
}

/// Dimensions of a single character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharMetrics {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub italic_correction: i32,
    /// Start of the character's program in the lig/kern table, if it has one.
    pub lig_kern_index: Option<usize>,
}

impl CharMetrics {
    pub fn new(width: i32, height: i32, depth: i32) -> Self {
        CharMetrics {
            width,
            height,
            depth,
            ..Default::default()
        }
    }
}

/// What a lig/kern instruction does when its next character matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LigKernOperation {
    /// Insert a kern of the given size between the two characters.
    Kern(i32),
    /// Insert a ligature character.
    Ligature {
        char: u8,
        delete_current: bool,
        delete_next: bool,
        /// Number of characters to pass over after the insertion.
        skip: u8,
    },
}

/// A single instruction of a lig/kern program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LigKernInstruction {
    /// Number of instructions to skip to reach the next instruction of the
    /// same program. Ignored if this is the last instruction.
    pub skip: u8,
    /// True if this is the last instruction of its program.
    pub stop: bool,
    pub next_char: u8,
    pub operation: LigKernOperation,
}

/// Metrics for a single font.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontMetrics {
    pub checksum: u32,
    /// Design size in points, as a fixed-point number with 20 fractional bits.
    pub design_size: i32,
    pub characters: HashMap<u8, CharMetrics>,
    pub lig_kern: Vec<LigKernInstruction>,
    /// Font parameters (slant, space, stretch, shrink, x-height, quad, ...).
    pub params: Vec<i32>,
}

impl FontMetrics {
    /// Creates metrics with no characters.
    pub fn new(design_size: i32) -> Self {
        FontMetrics {
            design_size,
            ..Default::default()
        }
    }

    /// Parses the contents of a TFM file.
    pub fn from_tfm(b: &[u8]) -> Result<Self, Error> {
        deserialize::deserialize(b)
    }

    pub fn with_char(mut self, code: u8, metrics: CharMetrics) -> Self {
        self.characters.insert(code, metrics);
        self
    }

    pub fn character(&self, code: u8) -> Option<&CharMetrics> {
        self.characters.get(&code)
    }

    /// Returns the instructions of the lig/kern program starting at the index.
    pub fn lig_kern_program(&self, index: usize) -> LigKernProgram<'_> {
        LigKernProgram {
            instructions: &self.lig_kern,
            next: Some(index),
        }
    }

    /// Returns the kern between the two characters, if the lig/kern program of
    /// the left character has one.
    pub fn kern(&self, left: u8, right: u8) -> Option<i32> {
        let index = self.character(left)?.lig_kern_index?;
        self.lig_kern_program(index)
            .find(|instruction| instruction.next_char == right)
            .and_then(|instruction| match instruction.operation {
                LigKernOperation::Kern(k) => Some(k),
                LigKernOperation::Ligature { .. } => None,
            })
    }

    /// Returns a font parameter; parameters are numbered from 1.
    pub fn param(&self, number: usize) -> Option<i32> {
        number.checked_sub(1).and_then(|i| self.params.get(i)).copied()
    }
}

/// Iterator over the instructions of a lig/kern program.
pub struct LigKernProgram<'a> {
    instructions: &'a [LigKernInstruction],
    next: Option<usize>,
}

impl<'a> Iterator for LigKernProgram<'a> {
    type Item = &'a LigKernInstruction;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let instruction = self.instructions.get(index)?;
        self.next = if instruction.stop {
            None
        } else {
            Some(index + instruction.skip as usize + 1)
        };
        Some(instruction)
    }
}

/// A source of font metrics, looked up by font name.
pub trait MetricsProvider {
    fn load(&self, font: &str) -> Result<FontMetrics, crate::Error>;
}

/// Looks up `<font>.tfm` in a list of directories.
#[derive(Debug, Clone, Default)]
pub struct TfmDirectory {
    dirs: Vec<PathBuf>,
}

impl TfmDirectory {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        TfmDirectory { dirs }
    }
}

impl MetricsProvider for TfmDirectory {
    fn load(&self, font: &str) -> Result<FontMetrics, crate::Error> {
        let mut searched = vec![];
        for dir in &self.dirs {
            let path = dir.join(format!("{font}.tfm"));
            if !path.is_file() {
                searched.push(path);
                continue;
            }
            tracing::debug!(font, path = %path.display(), "loading font metrics");
            let metrics = std::fs::read(&path)
                .map_err(Error::from)
                .and_then(|b| FontMetrics::from_tfm(&b))
                .map_err(|source| crate::Error::Metrics {
                    font: font.to_string(),
                    source,
                })?;
            return Ok(metrics);
        }
        Err(crate::Error::FontNotFound {
            font: font.to_string(),
            searched,
        })
    }
}

impl MetricsProvider for HashMap<String, FontMetrics> {
    fn load(&self, font: &str) -> Result<FontMetrics, crate::Error> {
        self.get(font)
            .cloned()
            .ok_or_else(|| crate::Error::FontNotFound {
                font: font.to_string(),
                searched: vec![],
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kern(next_char: u8, k: i32, stop: bool) -> LigKernInstruction {
        LigKernInstruction {
            skip: 0,
            stop,
            next_char,
            operation: LigKernOperation::Kern(k),
        }
    }

    #[test]
    fn lig_kern_program_follows_skips() {
        let mut metrics = FontMetrics::new(10 << 20);
        metrics.lig_kern = vec![
            LigKernInstruction {
                skip: 1,
                ..kern(b'A', 5, false)
            },
            kern(b'X', 99, true),
            kern(b'B', 7, true),
        ];
        let next_chars: Vec<u8> = metrics.lig_kern_program(0).map(|i| i.next_char).collect();
        assert_eq!(next_chars, vec![b'A', b'B']);
    }

    #[test]
    fn kern_between_characters() {
        let mut metrics = FontMetrics::new(10 << 20).with_char(
            b'A',
            CharMetrics {
                lig_kern_index: Some(0),
                ..CharMetrics::new(1 << 19, 1 << 19, 0)
            },
        );
        metrics.lig_kern = vec![kern(b'V', -3000, false), kern(b'W', -2000, true)];
        assert_eq!(metrics.kern(b'A', b'W'), Some(-2000));
        assert_eq!(metrics.kern(b'A', b'Z'), None);
        assert_eq!(metrics.kern(b'V', b'A'), None);
    }

    #[test]
    fn hash_map_provider() {
        let mut fonts = HashMap::new();
        fonts.insert("cmr10".to_string(), FontMetrics::new(10 << 20));
        assert_eq!(fonts.load("cmr10").unwrap().design_size, 10 << 20);
        assert!(matches!(
            fonts.load("cmbx12"),
            Err(crate::Error::FontNotFound { .. })
        ));
    }

    #[test]
    fn directory_provider_reports_searched_paths() {
        let provider = TfmDirectory::new(vec![PathBuf::from("/nonexistent/fonts")]);
        match provider.load("cmr10") {
            Err(crate::Error::FontNotFound { font, searched }) => {
                assert_eq!(font, "cmr10");
                assert_eq!(searched, vec![PathBuf::from("/nonexistent/fonts/cmr10.tfm")]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
