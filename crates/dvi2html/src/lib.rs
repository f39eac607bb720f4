//! # DVI to HTML
//!
//! This crate converts DVI files into HTML with inline SVG, so that TeX
//! output can be embedded directly in a web page.
//!
//! Conversion is a pipeline of lazy iterators:
//!
//! - the [`dvi`] crate decodes ops from the input stream,
//!
//! - [`parser::commands`] turns ops into [`Command`]s and
//!     [`parser::merge_text`] merges adjacent characters into runs,
//!
//! - the [`specials`] stages recognize `papersize`, `color`, `ps:`,
//!     `psfile=` and `dvisvgm:raw` specials and turn them into typed commands.
//!
//! Each command is then executed against a [`Machine`], which tracks the
//! DVI registers, fonts and graphics state. [`HtmlMachine`] writes HTML and
//! SVG; [`TextMachine`] extracts plain text.
//!
//! Every stage yields `Result`s. Errors travel down the pipeline as items
//! and the driver ([`execute`]) stops at the first one.
//!
//! Font metrics come from TFM files ([`TfmDirectory`]) or any other
//! [`MetricsProvider`]. Characters are mapped to Unicode through per-font
//! [`Encodings`].

pub mod command;
mod config;
pub mod encoding;
mod error;
pub mod font;
pub mod html;
pub mod machine;
pub mod matrix;
mod merge;
pub mod parser;
mod pipeline;
pub mod postscript;
pub mod specials;
pub mod text;
pub mod tfm;

pub use command::Command;
pub use config::{Options, Strictness};
pub use encoding::Encodings;
pub use error::Error;
pub use html::HtmlMachine;
pub use machine::{BaseMachine, Machine, MachineState};
pub use matrix::Matrix;
pub use merge::merge;
pub use pipeline::{dvi2html, dvi2text, execute, pipeline};
pub use text::TextMachine;
pub use tfm::{CharMetrics, FontMetrics, MetricsProvider, TfmDirectory};
