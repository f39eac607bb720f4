use crate::font::FontProperties;
use crate::machine::Machine;
use crate::specials::psfile;
use crate::{postscript, Error};
use dvi::Var;

/// A single instruction for a [`Machine`].
///
/// Commands are produced from DVI ops and then rewritten by the specials
/// stages, which replace recognized [`Command::Special`] payloads with the
/// typed commands below.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetPreamble {
        numerator: u32,
        denominator: u32,
        magnification: u32,
        comment: String,
    },
    BeginPage {
        parameters: [i32; 10],
    },
    EndPage,
    Push,
    Pop,
    /// Typeset text and move right by its width.
    SetText(Vec<u8>),
    /// Typeset text without moving.
    PutText(Vec<u8>),
    /// Draw a rule and move right by its width.
    SetRule {
        height: i32,
        width: i32,
    },
    /// Draw a rule without moving.
    PutRule {
        height: i32,
        width: i32,
    },
    MoveRight(i32),
    MoveDown(i32),
    /// Move by a variable, after setting it if an amount is given.
    MoveVar {
        var: Var,
        amount: Option<i32>,
    },
    FontDef {
        number: u32,
        properties: FontProperties,
    },
    SetFont(u32),
    /// A special that no stage recognized.
    Special(String),
    Post,
    PostPost,
    PushColor(String),
    PopColor,
    /// Paper size in points.
    SetPapersize {
        width: f64,
        height: f64,
    },
    /// SVG markup to write verbatim.
    RawSvg(String),
    /// PostScript code to interpret.
    PostScript(String),
    /// Attributes of an embedded image file.
    PostScriptFile(String),
}

impl Command {
    pub fn execute(&self, machine: &mut dyn Machine) -> Result<(), Error> {
        match self {
            Command::SetPreamble {
                numerator,
                denominator,
                magnification,
                comment,
            } => machine.preamble(*numerator, *denominator, *magnification, comment),
            Command::BeginPage { parameters } => machine.begin_page(parameters),
            Command::EndPage => machine.end_page(),
            Command::Push => {
                machine.push();
                Ok(())
            }
            Command::Pop => machine.pop(),
            Command::SetText(text) => {
                let width = machine.put_text(text)?;
                machine.move_right(width);
                Ok(())
            }
            Command::PutText(text) => machine.put_text(text).map(|_| ()),
            Command::SetRule { height, width } => {
                machine.put_rule(*height, *width)?;
                machine.move_right(*width as f64);
                Ok(())
            }
            Command::PutRule { height, width } => machine.put_rule(*height, *width),
            Command::MoveRight(d) => {
                machine.move_right(*d as f64);
                Ok(())
            }
            Command::MoveDown(d) => {
                machine.move_down(*d as f64);
                Ok(())
            }
            Command::MoveVar { var, amount } => {
                let position = &mut machine.state_mut().position;
                if let Some(amount) = amount {
                    position.set_var(*var, *amount as f64);
                }
                let distance = position.var(*var);
                if var.is_horizontal() {
                    machine.move_right(distance);
                } else {
                    machine.move_down(distance);
                }
                Ok(())
            }
            Command::FontDef { number, properties } => {
                machine.define_font(*number, properties.clone())
            }
            Command::SetFont(number) => machine.enable_font(*number),
            Command::Special(payload) => {
                tracing::debug!(payload = %payload, "ignoring unrecognized special");
                Ok(())
            }
            Command::Post => machine.post(),
            Command::PostPost => machine.post_post(),
            Command::PushColor(color) => machine.push_color(color),
            Command::PopColor => machine.pop_color(),
            Command::SetPapersize { width, height } => machine.set_papersize(*width, *height),
            Command::RawSvg(svg) => machine.put_svg(svg),
            Command::PostScript(code) => postscript::Interpreter::new().execute(machine, code),
            Command::PostScriptFile(attributes) => psfile::execute(attributes, machine),
        }
    }
}
