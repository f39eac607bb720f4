//! Conversion of DVI ops into machine commands.

use crate::command::Command;
use crate::font::FontProperties;
use crate::merge::merge;
use crate::Error;
use dvi::Op;

/// Converts a stream of ops into commands.
///
/// No-ops are dropped and decode errors are passed through.
pub fn commands<I>(ops: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Op, dvi::Error>>,
{
    ops.into_iter().filter_map(|op| match op {
        Ok(op) => command(op).transpose(),
        Err(err) => Some(Err(err.into())),
    })
}

fn command(op: Op) -> Result<Option<Command>, Error> {
    Ok(Some(match op {
        Op::TypesetChar { char, move_h } => {
            let code: u8 = char.try_into().map_err(|_| Error::CharOutOfRange(char))?;
            if move_h {
                Command::SetText(vec![code])
            } else {
                Command::PutText(vec![code])
            }
        }
        Op::TypesetRule {
            height,
            width,
            move_h,
        } => {
            if move_h {
                Command::SetRule { height, width }
            } else {
                Command::PutRule { height, width }
            }
        }
        Op::NoOp => return Ok(None),
        Op::BeginPage { parameters, .. } => Command::BeginPage { parameters },
        Op::EndPage => Command::EndPage,
        Op::Push => Command::Push,
        Op::Pop => Command::Pop,
        Op::Right(d) => Command::MoveRight(d),
        Op::Down(d) => Command::MoveDown(d),
        Op::Move(var) => Command::MoveVar { var, amount: None },
        Op::SetVar(var, amount) => Command::MoveVar {
            var,
            amount: Some(amount),
        },
        Op::EnableFont(number) => Command::SetFont(number),
        Op::Special(payload) => Command::Special(String::from_utf8_lossy(&payload).into_owned()),
        Op::DefineFont {
            number,
            checksum,
            at_size,
            design_size,
            name,
            ..
        } => Command::FontDef {
            number,
            properties: FontProperties {
                name,
                checksum,
                scale_factor: at_size,
                design_size,
            },
        },
        Op::Preamble {
            unit_numerator,
            unit_denominator,
            magnification,
            comment,
            ..
        } => Command::SetPreamble {
            numerator: unit_numerator,
            denominator: unit_denominator,
            magnification,
            comment,
        },
        Op::BeginPostamble { .. } => Command::Post,
        Op::EndPostamble { .. } => Command::PostPost,
    }))
}

/// Combines each run of adjacent [`Command::SetText`] commands into one.
pub fn merge_text<I>(commands: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Command, Error>>,
{
    merge(
        commands,
        |command: &Result<Command, Error>| matches!(command, Ok(Command::SetText(_))),
        |run: Vec<Result<Command, Error>>| {
            let text: Vec<u8> = run
                .into_iter()
                .flat_map(|command| match command {
                    Ok(Command::SetText(text)) => text,
                    _ => vec![],
                })
                .collect();
            [Ok(Command::SetText(text))]
        },
    )
}
