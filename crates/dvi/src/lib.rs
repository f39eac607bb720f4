//! # DVI file format
//!
//! This crate decodes (and, for tooling and tests, encodes) the DVI
//! ("device-independent") format written by TeX and friends.
//!
//! The central type is [`Op`], which describes a single command in a DVI
//! file. A DVI file is a flat list of such commands: a preamble, a sequence
//! of pages each delimited by [`Op::BeginPage`] and [`Op::EndPage`], and a
//! postamble.
//!
//! [`Reader`] pulls bytes from any [`std::io::Read`] in small chunks and
//! yields `Result<Op, Error>`. It never reads further ahead than needed to
//! complete the next op. In-memory data is read through a byte slice.
//!
//! The inverse of deserialization is [`serialize()`].
//!
//! Numbers that occupy more than one byte are big endian. Four-byte
//! parameters, and shorter parameters that denote distances, are signed
//! two's complement values.

mod deserialize;
mod serialize;

use std::io::Read;

/// A variable in DVI data.
///
/// DVI data has access to four "sticky" spacing variables.
/// [`Op::SetVar`] assigns a variable and moves by its new value;
/// [`Op::Move`] moves by the variable's current value.
/// _w_ and _x_ move the horizontal cursor _h_,
/// _y_ and _z_ move the vertical cursor _v_.
///
/// ```
/// // These two sequences move the cursor by the same amount.
/// let long = vec![dvi::Op::Down(300), dvi::Op::Down(300)];
/// let short = vec![dvi::Op::SetVar(dvi::Var::Y, 300), dvi::Op::Move(dvi::Var::Y)];
/// assert!(dvi::serialize(short).len() < dvi::serialize(long).len());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Var {
    W = 0,
    X = 1,
    Y = 2,
    Z = 3,
}

impl Var {
    /// Whether this variable moves the horizontal cursor.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Var::W | Var::X)
    }
}

/// Operation that appears in DVI data.
///
/// Commands that are logically connected share a variant.
/// For example `set_char_0`, `set1` and `put1` are all
/// [`Op::TypesetChar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Typeset a character from the current font with its reference point
    /// at (_h_,_v_).
    ///
    /// `set_char_N`, `setN` (`move_h` true) and `putN` (`move_h` false).
    TypesetChar {
        char: u32,
        /// If true, _h_ is increased by the width of the character afterwards.
        move_h: bool,
    },
    /// Typeset a solid rectangle with its bottom left corner at (_h_,_v_).
    /// Nothing is drawn unless both dimensions are positive.
    ///
    /// `set_rule` (`move_h` true) and `put_rule` (`move_h` false).
    TypesetRule {
        height: i32,
        width: i32,
        /// If true, _h_ is increased by the width afterwards,
        /// even when nothing is drawn.
        move_h: bool,
    },
    /// `nop`.
    NoOp,
    /// Beginning of a page (`bop`).
    ///
    /// Resets (_h_,_v_,_w_,_x_,_y_,_z_) to zero and empties the stack.
    BeginPage {
        /// The values of `\count0`..`\count9` at shipout.
        parameters: [i32; 10],
        /// Byte offset of the previous `bop`, or -1 on the first page.
        previous_begin_page: i32,
    },
    /// End of page (`eop`). The stack should be empty at this point.
    EndPage,
    /// Push (_h_,_v_,_w_,_x_,_y_,_z_) onto the stack. The font is not pushed.
    Push,
    /// Pop (_h_,_v_,_w_,_x_,_y_,_z_) off the stack.
    Pop,
    /// Move _h_ right by the payload (`rightN`).
    Right(i32),
    /// Move by the current value of a variable (`w0`, `x0`, `y0`, `z0`).
    Move(Var),
    /// Set a variable and move by its new value (`wN`, `xN`, `yN`, `zN`).
    SetVar(Var, i32),
    /// Move _v_ down by the payload (`downN`).
    Down(i32),
    /// Make the font with the given number current (`fnt_num_N`, `fntN`).
    EnableFont(u32),
    /// An opaque payload for the DVI driver (`xxxN`), usually text such as
    /// `color push rgb 1 0 0` or `ps: 1 2 scale`.
    Special(Vec<u8>),
    /// Font definition (`fnt_defN`).
    ///
    /// Appears before the font is first enabled, and again in the postamble.
    DefineFont {
        number: u32,
        /// Checksum of the TFM file TeX used.
        checksum: u32,
        /// Scale factor ("at size") in DVI units.
        at_size: u32,
        /// Design size in DVI units.
        design_size: u32,
        /// Directory of the font; empty for the standard area.
        area: String,
        name: String,
    },
    /// The preamble (`pre`). This must come first.
    ///
    /// Multiplying a DVI dimension by `unit_numerator / unit_denominator`
    /// gives a length in units of 10^-7 meters. TeX uses
    /// 25400000 / 473628672, making DVI units scaled points.
    Preamble {
        dvi_format: u8,
        unit_numerator: u32,
        unit_denominator: u32,
        /// 1000 times the desired magnification.
        magnification: u32,
        comment: String,
    },
    /// Start of the postamble (`post`).
    BeginPostamble {
        final_begin_page: i32,
        unit_numerator: u32,
        unit_denominator: u32,
        magnification: u32,
        largest_height: u32,
        largest_width: u32,
        max_stack_depth: u16,
        num_pages: u16,
    },
    /// End of the postamble (`post_post`), including the trailing 223 bytes.
    EndPostamble {
        postamble: i32,
        dvi_format: u8,
        num_223_bytes: usize,
    },
}

impl Op {
    /// Deserialize the next operation from the provided binary slice.
    ///
    /// On success returns the op and the unconsumed tail of the slice.
    ///
    /// ```
    /// let data = vec![128, 4, 129, 1, 0];
    /// let (op, tail) = dvi::Op::deserialize(&data).unwrap().unwrap();
    /// assert_eq![op, dvi::Op::TypesetChar{char: 4, move_h: true}];
    /// assert_eq![tail, &[129, 1, 0]];
    /// ```
    ///
    /// An exhausted slice returns [`None`]; invalid data returns an error:
    ///
    /// ```
    /// assert!(matches!(dvi::Op::deserialize(&[]), Ok(None)));
    /// assert!(matches!(
    ///     dvi::Op::deserialize(&[129, 1]),
    ///     Err(dvi::Error::Truncated(129)),
    /// ));
    /// ```
    pub fn deserialize(b: &[u8]) -> Result<Option<(Self, &[u8])>, Error> {
        deserialize::deserialize(b)
    }

    /// Serialize this operation and append the bytes to the provided vector.
    ///
    /// ```
    /// let mut data = vec![];
    /// dvi::Op::Right(256).serialize(&mut data);
    /// assert_eq![data, vec![144, 1, 0]];
    /// ```
    pub fn serialize(&self, b: &mut Vec<u8>) {
        serialize::serialize(self, b)
    }
}

/// Error returned when DVI data cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An op code outside the DVI command set (250-255) appeared.
    #[error("invalid op code {0}")]
    InvalidOpCode(u8),
    /// The data ended while parsing the payload of an operation.
    /// The op code of the operation is provided.
    #[error("data ended while parsing payload for op code {0}")]
    Truncated(u8),
    /// Reading from the underlying source failed.
    #[error("failed to read DVI data: {0}")]
    Io(#[from] std::io::Error),
}

/// Number of bytes the [`Reader`] requests from its source at a time.
pub const CHUNK_SIZE: usize = 256;

/// Streaming iterator that decodes ops from a [`Read`] source.
///
/// Bytes are requested from the source in chunks of [`CHUNK_SIZE`], and only
/// when the buffered bytes do not hold a complete op.
/// After the first error the iterator is exhausted.
///
/// ```
/// let data: Vec<u8> = vec![141, 143, 7, 142];
/// let ops: Result<Vec<dvi::Op>, dvi::Error> = dvi::Reader::new(data.as_slice()).collect();
/// assert_eq![
///     ops.unwrap(),
///     vec![dvi::Op::Push, dvi::Op::Right(7), dvi::Op::Pop],
/// ];
/// ```
///
/// Ops before invalid data are still returned:
///
/// ```
/// let invalid_data: Vec<u8> = vec![158, 1, 0, 255];
/// let mut reader = dvi::Reader::new(invalid_data.as_slice());
/// assert_eq!(reader.next().unwrap().unwrap(), dvi::Op::Down(256));
/// assert!(matches!(reader.next(), Some(Err(dvi::Error::InvalidOpCode(255)))));
/// assert!(reader.next().is_none());
/// ```
pub struct Reader<R> {
    source: R,
    buffer: Vec<u8>,
    start: usize,
    eof: bool,
    done: bool,
}

impl<R: Read> Reader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            buffer: Vec::with_capacity(CHUNK_SIZE),
            start: 0,
            eof: false,
            done: false,
        }
    }

    /// Reads one more chunk into the buffer. Returns false at end of input.
    fn fill(&mut self) -> Result<bool, Error> {
        if self.start > 0 {
            self.buffer.drain(..self.start);
            self.start = 0;
        }
        let mut chunk = [0_u8; CHUNK_SIZE];
        loop {
            match self.source.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    return Ok(true);
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn next_op(&mut self) -> Result<Option<Op>, Error> {
        loop {
            let pending = &self.buffer[self.start..];
            match Op::deserialize(pending) {
                Ok(Some((op, tail))) => {
                    // The end-of-file padding after post_post may continue
                    // in the next chunk.
                    let is_open_postamble =
                        matches!(op, Op::EndPostamble { .. }) && tail.is_empty() && !self.eof;
                    if !is_open_postamble {
                        self.start = self.buffer.len() - tail.len();
                        return Ok(Some(op));
                    }
                }
                Ok(None) => {
                    if self.eof {
                        return Ok(None);
                    }
                }
                Err(Error::Truncated(op_code)) => {
                    if self.eof {
                        return Err(Error::Truncated(op_code));
                    }
                }
                Err(err) => return Err(err),
            }
            self.fill()?;
        }
    }
}

impl<R: Read> Iterator for Reader<R> {
    type Item = Result<Op, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_op() {
            Ok(Some(op)) => Some(Ok(op)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Serialize operations to DVI data bytes.
///
/// ```
/// let ops = vec![
///     dvi::Op::Down(256),
///     dvi::Op::TypesetChar{char: 'D' as u32, move_h: true},
///     dvi::Op::TypesetChar{char: 'V' as u32, move_h: true},
///     dvi::Op::TypesetChar{char: 'I' as u32, move_h: true},
/// ];
/// let data = dvi::serialize(ops);
/// assert_eq!(data, vec![158, 1, 0, 68, 86, 73]);
/// ```
pub fn serialize<I: IntoIterator<Item = Op>>(i: I) -> Vec<u8> {
    let mut v = vec![];
    for op in i {
        op.serialize(&mut v);
    }
    v
}
