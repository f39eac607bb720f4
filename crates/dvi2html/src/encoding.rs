//! Mapping from font character codes to Unicode.

use crate::{Error, Strictness};
use std::collections::HashMap;
use std::path::Path;

/// Per-font tables mapping character codes to Unicode code points.
///
/// The JSON form is an object keyed by font name whose values map decimal
/// character codes to code points:
///
/// ```
/// let encodings = dvi2html::Encodings::from_json(r#"{"cmr10": {"0": 915, "65": 65}}"#).unwrap();
/// assert_eq!(encodings.lookup("cmr10", 0), Some('Γ'));
/// assert_eq!(encodings.lookup("cmr10", 1), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct Encodings {
    fonts: HashMap<String, HashMap<u8, u32>>,
}

impl Encodings {
    pub fn from_json(s: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn insert(&mut self, font: &str, code: u8, c: char) {
        self.fonts
            .entry(font.to_string())
            .or_default()
            .insert(code, c as u32);
    }

    pub fn lookup(&self, font: &str, code: u8) -> Option<char> {
        self.fonts
            .get(font)?
            .get(&code)
            .copied()
            .and_then(char::from_u32)
    }

    /// Resolves a character for output.
    ///
    /// Without a table entry this is an error in strict mode; in lenient
    /// mode the code is passed through [`legacy_codepoint`].
    pub fn resolve(&self, font: &str, code: u8, strictness: Strictness) -> Result<char, Error> {
        if let Some(c) = self.lookup(font, code) {
            return Ok(c);
        }
        match strictness {
            Strictness::Strict => Err(Error::MissingEncoding {
                font: font.to_string(),
                code,
            }),
            Strictness::Lenient => {
                let c = legacy_codepoint(code);
                tracing::warn!(font, code, substitute = %c, "no encoding entry for character");
                Ok(c)
            }
        }
    }
}

/// Moves the control range of a font encoding out of the way of control
/// characters, following the remapping used by older TeX-to-web tools.
pub fn legacy_codepoint(code: u8) -> char {
    let c = code as u32;
    let mapped = match code {
        0..=9 => 161 + c,
        10..=19 => 173 + (c - 10),
        20 => 0x2219,
        21..=32 => 184 + (c - 21),
        127 => 196,
        _ => c,
    };
    char::from_u32(mapped).unwrap_or(char::REPLACEMENT_CHARACTER)
}
