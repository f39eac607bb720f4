use super::*;

/// Deserialize a TeX font metric (.tfm) file.
pub(super) fn deserialize(b: &[u8]) -> Result<FontMetrics, Error> {
    if b.len() < 24 {
        return Err(Error::TooShort(b.len()));
    }
    let lf = i16::deserialize(b);
    if lf <= 0 || (lf as usize) * 4 > b.len() {
        return Err(Error::InvalidFileLength(lf, b.len()));
    }
    let sub_file_sizes = SubFileSizes::deserialize(&b[2..]);
    sub_file_sizes.validate(lf)?;
    #[rustfmt::skip]
    let [
        raw_header,
        raw_char_infos,
        raw_widths,
        raw_heights,
        raw_depths,
        raw_italic_corrections,
        raw_lig_kern,
        raw_kerns,
        _raw_extensible_chars,
        raw_params,
    ] = sub_file_sizes.partition(&b[24..]);

    let widths: Vec<i32> = Deserializable::deserialize(raw_widths);
    let heights: Vec<i32> = Deserializable::deserialize(raw_heights);
    let depths: Vec<i32> = Deserializable::deserialize(raw_depths);
    let italic_corrections: Vec<i32> = Deserializable::deserialize(raw_italic_corrections);
    let kerns: Vec<i32> = Deserializable::deserialize(raw_kerns);
    let raw_lig_kern: Vec<RawInstruction> = Deserializable::deserialize(raw_lig_kern);
    let lig_kern = raw_lig_kern
        .iter()
        .enumerate()
        .map(|(i, raw)| raw.resolve(&kerns).ok_or(Error::InvalidKernIndex(i)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut characters = HashMap::new();
    let char_infos: Vec<RawCharInfo> = Deserializable::deserialize(raw_char_infos);
    for (code, info) in (sub_file_sizes.bc..).zip(char_infos) {
        // The range was validated to be within 0..=255.
        let code = code as u8;
        if info.width_index == 0 {
            continue;
        }
        let lookup = |table: &[i32], i: u8| {
            table
                .get(i as usize)
                .copied()
                .ok_or(Error::InvalidCharInfo(code))
        };
        let lig_kern_index = match info.tag {
            // A first instruction with a skip byte above 128 holds the real
            // start of the program.
            1 => Some(match raw_lig_kern.get(info.remainder as usize) {
                Some(first) if first.skip_byte > 128 => {
                    256 * first.op_byte as usize + first.remainder as usize
                }
                _ => info.remainder as usize,
            }),
            _ => None,
        };
        characters.insert(
            code,
            CharMetrics {
                width: lookup(&widths, info.width_index)?,
                height: lookup(&heights, info.height_index)?,
                depth: lookup(&depths, info.depth_index)?,
                italic_correction: lookup(&italic_corrections, info.italic_index)?,
                lig_kern_index,
            },
        );
    }

    Ok(FontMetrics {
        checksum: u32::deserialize(raw_header),
        design_size: i32::deserialize(&raw_header[4..]),
        characters,
        lig_kern,
        params: Deserializable::deserialize(raw_params),
    })
}

trait Deserializable: Sized {
    fn deserialize(b: &[u8]) -> Self;
}

/// Implementations of this trait consume a fixed number of bytes when deserializing.
trait DeserializableFixed: Deserializable {
    const NUM_BYTES: usize;
}

impl Deserializable for i16 {
    #[inline]
    fn deserialize(b: &[u8]) -> Self {
        i16::from_be_bytes([b[0], b[1]])
    }
}

impl Deserializable for u32 {
    #[inline]
    fn deserialize(b: &[u8]) -> Self {
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }
}

impl Deserializable for i32 {
    #[inline]
    fn deserialize(b: &[u8]) -> Self {
        i32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }
}

impl DeserializableFixed for i32 {
    const NUM_BYTES: usize = 4;
}

impl<T: DeserializableFixed> Deserializable for Vec<T> {
    fn deserialize(b: &[u8]) -> Self {
        b.chunks_exact(T::NUM_BYTES).map(T::deserialize).collect()
    }
}

impl Deserializable for SubFileSizes {
    fn deserialize(b: &[u8]) -> Self {
        Self {
            lh: i16::deserialize(&b[0..2]),
            bc: i16::deserialize(&b[2..4]),
            ec: i16::deserialize(&b[4..6]),
            nw: i16::deserialize(&b[6..8]),
            nh: i16::deserialize(&b[8..10]),
            nd: i16::deserialize(&b[10..12]),
            ni: i16::deserialize(&b[12..14]),
            nl: i16::deserialize(&b[14..16]),
            nk: i16::deserialize(&b[16..18]),
            ne: i16::deserialize(&b[18..20]),
            np: i16::deserialize(&b[20..22]),
        }
    }
}

impl SubFileSizes {
    fn validate(&self, lf: i16) -> Result<(), Error> {
        let all = [
            self.lh, self.bc, self.ec, self.nw, self.nh, self.nd, self.ni, self.nl, self.nk,
            self.ne, self.np,
        ];
        if all.iter().any(|&n| n < 0) {
            return Err(Error::SubFileSizeIsNegative(self.clone()));
        }
        if self.lh < 2 {
            return Err(Error::HeaderLengthIsTooSmall(self.lh));
        }
        if self.ec > 255 || self.bc > self.ec + 1 {
            return Err(Error::InvalidCharacterRange(self.bc, self.ec));
        }
        if self.nw == 0 || self.nh == 0 || self.nd == 0 || self.ni == 0 {
            return Err(Error::IncompleteSubFiles(self.clone()));
        }
        let total = 6
            + self.lh as i32
            + (self.ec as i32 - self.bc as i32 + 1)
            + [
                self.nw, self.nh, self.nd, self.ni, self.nl, self.nk, self.ne, self.np,
            ]
            .iter()
            .map(|&n| n as i32)
            .sum::<i32>();
        if lf as i32 != total {
            return Err(Error::InconsistentSubFileSizes(lf, self.clone()));
        }
        Ok(())
    }

    fn partition<'a>(&self, mut b: &'a [u8]) -> [&'a [u8]; 10] {
        let lens = [
            self.lh,
            self.ec - self.bc + 1,
            self.nw,
            self.nh,
            self.nd,
            self.ni,
            self.nl,
            self.nk,
            self.ne,
            self.np,
        ];
        let mut r: [&[u8]; 10] = [&[0_u8; 0]; 10];
        for (i, len) in lens.into_iter().enumerate() {
            let len = (len as usize) * 4;
            r[i] = &b[..len];
            b = &b[len..];
        }
        r
    }
}

struct RawCharInfo {
    width_index: u8,
    height_index: u8,
    depth_index: u8,
    italic_index: u8,
    tag: u8,
    remainder: u8,
}

impl Deserializable for RawCharInfo {
    fn deserialize(b: &[u8]) -> Self {
        RawCharInfo {
            width_index: b[0],
            height_index: b[1] / (1 << 4),
            depth_index: b[1] % (1 << 4),
            italic_index: b[2] / (1 << 2),
            tag: b[2] % (1 << 2),
            remainder: b[3],
        }
    }
}

impl DeserializableFixed for RawCharInfo {
    const NUM_BYTES: usize = 4;
}

struct RawInstruction {
    skip_byte: u8,
    next_char: u8,
    op_byte: u8,
    remainder: u8,
}

impl Deserializable for RawInstruction {
    fn deserialize(b: &[u8]) -> Self {
        RawInstruction {
            skip_byte: b[0],
            next_char: b[1],
            op_byte: b[2],
            remainder: b[3],
        }
    }
}

impl DeserializableFixed for RawInstruction {
    const NUM_BYTES: usize = 4;
}

impl RawInstruction {
    fn resolve(&self, kerns: &[i32]) -> Option<LigKernInstruction> {
        let operation = if self.op_byte < 128 {
            LigKernOperation::Ligature {
                char: self.remainder,
                delete_current: (self.op_byte / 2) % 2 == 0,
                delete_next: self.op_byte % 2 == 0,
                skip: self.op_byte / 4,
            }
        } else {
            let index = 256 * (self.op_byte as usize - 128) + self.remainder as usize;
            LigKernOperation::Kern(*kerns.get(index)?)
        };
        Some(LigKernInstruction {
            skip: self.skip_byte % 128,
            stop: self.skip_byte >= 128,
            next_char: self.next_char,
            operation,
        })
    }
}
