//! Assembly of the conversion pipeline and the driver that executes it.

use crate::command::Command;
use crate::encoding::Encodings;
use crate::html::HtmlMachine;
use crate::machine::Machine;
use crate::text::TextMachine;
use crate::tfm::TfmDirectory;
use crate::{parser, specials, Error, Options};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Builds the full command stream for a sequence of decoded ops.
///
/// The stages are: conversion to commands, text merging, then the specials
/// stages. Errors are passed downstream as items.
pub fn pipeline<I>(ops: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<dvi::Op, dvi::Error>>,
{
    specials::specials(parser::merge_text(parser::commands(ops)))
}

/// Executes commands against a machine until the stream ends or a command fails.
pub fn execute<I>(commands: I, machine: &mut dyn Machine) -> Result<(), Error>
where
    I: IntoIterator<Item = Result<Command, Error>>,
{
    for command in commands {
        let command = command?;
        tracing::trace!(?command, "executing command");
        command.execute(machine)?;
    }
    Ok(())
}

fn font_directory(options: &Options) -> TfmDirectory {
    if options.font_dirs.is_empty() {
        TfmDirectory::new(vec![PathBuf::from(".")])
    } else {
        TfmDirectory::new(options.font_dirs.clone())
    }
}

fn encodings(options: &Options) -> Result<Encodings, Error> {
    match &options.encodings {
        None => Ok(Encodings::default()),
        Some(path) => {
            let encodings = Encodings::from_file(path)?;
            tracing::debug!(path = %path.display(), "loaded encodings");
            Ok(encodings)
        }
    }
}

/// Converts a DVI stream to HTML, writing the markup to `writer`.
pub fn dvi2html<R: Read, W: Write>(
    reader: R,
    writer: W,
    options: &Options,
) -> Result<HtmlMachine<W>, Error> {
    let mut machine = HtmlMachine::new(writer, font_directory(options))
        .with_encodings(encodings(options)?)
        .with_strictness(options.strictness);
    execute(pipeline(dvi::Reader::new(reader)), &mut machine)?;
    Ok(machine)
}

/// Extracts the text of a DVI stream, writing it to `writer`.
pub fn dvi2text<R: Read, W: Write>(
    reader: R,
    writer: W,
    options: &Options,
) -> Result<TextMachine<W>, Error> {
    let mut machine = TextMachine::new(writer, font_directory(options))
        .with_encodings(encodings(options)?)
        .with_strictness(options.strictness);
    execute(pipeline(dvi::Reader::new(reader)), &mut machine)?;
    Ok(machine)
}
