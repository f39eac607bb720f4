//! Plain text output.

use crate::encoding::{legacy_codepoint, Encodings};
use crate::machine::{Machine, MachineState};
use crate::tfm::MetricsProvider;
use crate::{Error, Strictness};
use std::io::Write;

/// A run of text and where it was typeset, in DVI units.
#[derive(Debug, Clone, PartialEq)]
struct Snippet {
    h: f64,
    v: f64,
    end_h: f64,
    font_size: f64,
    text: String,
}

/// A machine that extracts the text of each page in reading order.
///
/// Lines are broken wherever the baseline moves down and words are separated
/// wherever the gap between two runs is larger than a fifth of the font size.
/// Pages are separated by form feeds.
pub struct TextMachine<W> {
    state: MachineState,
    output: W,
    encodings: Encodings,
    strictness: Strictness,
    snippets: Vec<Snippet>,
    pages: usize,
}

impl<W: Write> TextMachine<W> {
    pub fn new(output: W, provider: impl MetricsProvider + 'static) -> Self {
        TextMachine {
            state: MachineState::new(provider),
            output,
            encodings: Default::default(),
            strictness: Default::default(),
            snippets: vec![],
            pages: 0,
        }
    }

    pub fn with_encodings(mut self, encodings: Encodings) -> Self {
        self.encodings = encodings;
        self
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn write_page(&mut self) -> Result<(), Error> {
        let mut snippets = std::mem::take(&mut self.snippets);
        snippets.sort_by(|a, b| a.v.total_cmp(&b.v).then(a.h.total_cmp(&b.h)));
        let mut previous: Option<&Snippet> = None;
        for snippet in &snippets {
            if let Some(previous) = previous {
                if snippet.v > previous.v {
                    self.output.write_all(b"\n")?;
                } else if snippet.h - previous.end_h > 0.2 * previous.font_size {
                    self.output.write_all(b" ")?;
                }
            }
            self.output.write_all(snippet.text.as_bytes())?;
            previous = Some(snippet);
        }
        if !snippets.is_empty() {
            self.output.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl<W: Write> Machine for TextMachine<W> {
    fn state(&self) -> &MachineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    fn begin_page(&mut self, _parameters: &[i32; 10]) -> Result<(), Error> {
        if self.pages > 0 {
            self.output.write_all(b"\x0c")?;
        }
        self.pages += 1;
        self.snippets.clear();
        let state = self.state_mut();
        while state.stack_depth() > 0 {
            state.pop()?;
        }
        state.position = Default::default();
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), Error> {
        self.write_page()
    }

    fn post_post(&mut self) -> Result<(), Error> {
        self.output.flush()?;
        Ok(())
    }

    fn put_text(&mut self, text: &[u8]) -> Result<f64, Error> {
        let font = self.state.current_font()?;
        let extent = font.measure(text, self.strictness)?;
        let text = text
            .iter()
            .map(|&code| {
                self.encodings
                    .lookup(&font.name, code)
                    .unwrap_or_else(|| legacy_codepoint(code))
            })
            .collect();
        let position = self.state.position;
        self.snippets.push(Snippet {
            h: position.h,
            v: position.v,
            end_h: position.h + extent.width,
            font_size: font.scale_factor as f64,
            text,
        });
        Ok(extent.width)
    }
}
