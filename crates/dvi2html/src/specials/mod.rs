//! Stages that turn recognized specials into typed commands.
//!
//! Each stage scans the command stream and rewrites the [`Command::Special`]
//! payloads with its prefix. Everything else, including errors, passes
//! through unchanged.

use crate::command::Command;
use crate::Error;

pub mod color;
pub mod papersize;
pub mod ps;
pub mod psfile;
pub mod svg;

/// Runs all of the specials stages, in order.
pub fn specials<I>(commands: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Command, Error>>,
{
    let commands = papersize::papersize(commands);
    let commands = color::color(commands);
    let commands = ps::ps(commands);
    let commands = psfile::psfile(commands);
    svg::svg(commands)
}

/// Applies `f` to the payload of every special that starts with `prefix`.
///
/// The payload is passed without the prefix. Returning `None` drops the
/// special from the stream.
fn rewrite<I, F>(
    commands: I,
    prefix: &'static str,
    mut f: F,
) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Command, Error>>,
    F: FnMut(&str) -> Option<Result<Command, Error>>,
{
    commands.into_iter().filter_map(move |command| match command {
        Ok(Command::Special(payload)) => match payload.strip_prefix(prefix) {
            Some(rest) => {
                tracing::debug!(special = %payload, "rewriting special");
                f(rest)
            }
            None => Some(Ok(Command::Special(payload))),
        },
        other => Some(other),
    })
}
