use crate::command::Command;
use crate::machine::Machine;
use crate::matrix::Num;
use crate::Error;
use std::collections::HashMap;

/// Rewrites `psfile=...` specials into [`Command::PostScriptFile`].
///
/// The prefix is matched case-insensitively and the whole payload is kept,
/// since the file name is one of its attributes.
pub fn psfile<I>(commands: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Command, Error>>,
{
    commands.into_iter().map(|command| match command {
        Ok(Command::Special(payload)) if is_psfile(&payload) => {
            tracing::debug!(special = %payload, "rewriting special");
            Ok(Command::PostScriptFile(payload))
        }
        other => other,
    })
}

fn is_psfile(payload: &str) -> bool {
    payload
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("psfile="))
}

/// Parses `key=value` pairs separated by whitespace. Values may be quoted
/// and keys are lowercased.
fn attributes(payload: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut rest = payload.trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = &rest[key_end..];
        let value = match rest.strip_prefix('=') {
            Some(value) => match value.strip_prefix('"') {
                Some(quoted) => {
                    let end = quoted.find('"').unwrap_or(quoted.len());
                    rest = quoted.get(end + 1..).unwrap_or("");
                    &quoted[..end]
                }
                None => {
                    let end = value.find(char::is_whitespace).unwrap_or(value.len());
                    rest = &value[end..];
                    &value[..end]
                }
            },
            None => "",
        };
        attributes.insert(key, value.to_string());
        rest = rest.trim_start();
    }
    attributes
}

/// Draws the image described by the attributes of a `psfile` special.
///
/// Specials with a degenerate bounding box or a zero requested size are
/// skipped.
pub fn execute(payload: &str, machine: &mut dyn Machine) -> Result<(), Error> {
    let attributes = attributes(payload);
    let number = |key: &str, default: f64| -> f64 {
        match attributes.get(key) {
            None => default,
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = %value, "invalid psfile attribute");
                default
            }),
        }
    };
    let Some(file) = attributes.get("psfile").filter(|f| !f.is_empty()) else {
        return Ok(());
    };
    let file = file.strip_suffix(".eps").unwrap_or(file);

    // Bounding box of the image, in PostScript points.
    let llx = number("llx", 0.0);
    let lly = number("lly", 0.0);
    let urx = number("urx", 0.0);
    let ury = number("ury", 0.0);
    // Requested width and height, in tenths of a point.
    let rwi = number("rwi", -1.0) / 10.0;
    let rhi = number("rhi", -1.0) / 10.0;
    if rwi == 0.0 || rhi == 0.0 || urx == llx || ury == lly {
        tracing::debug!(file, "skipping empty psfile image");
        return Ok(());
    }
    let hoffset = number("hoffset", 0.0);
    let voffset = number("voffset", 0.0);
    let hscale = number("hscale", 100.0);
    let vscale = number("vscale", 100.0);
    let angle = number("angle", 0.0);

    let mut sx = rwi / (llx - urx).abs();
    let mut sy = rhi / (lly - ury).abs();
    if sx < 0.0 {
        sx = sy;
    }
    if sy < 0.0 {
        sy = sx;
    }
    if sx < 0.0 {
        sx = 1.0;
        sy = 1.0;
    }

    let (x, y) = machine.current_position();
    let mut matrix = *machine.matrix();
    matrix
        .translate(x + hoffset, y - voffset)
        .scale(hscale / 100.0, vscale / 100.0)
        .rotate(-angle)
        .scale(sx, sy)
        .translate(-llx, -ury);
    let svg = format!(
        r#"<image x="{}" y="{}" width="{}" height="{}" href="{}"{}></image>"#,
        Num(llx),
        Num(lly),
        Num(urx - llx),
        Num(ury - lly),
        html_escape::encode_double_quoted_attribute(file),
        matrix.to_svg_transform(),
    );
    machine.put_svg(&svg)
}
