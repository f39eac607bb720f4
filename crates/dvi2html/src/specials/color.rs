use crate::command::Command;
use crate::Error;

/// Rewrites `color push <spec>` and `color pop` specials into
/// [`Command::PushColor`] and [`Command::PopColor`].
///
/// Other `color` specials are dropped.
pub fn color<I>(commands: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Command, Error>>,
{
    super::rewrite(commands, "color ", |directive| {
        if let Some(spec) = directive.strip_prefix("push ") {
            Some(Ok(Command::PushColor(css_color(spec))))
        } else if directive.starts_with("pop") {
            Some(Ok(Command::PopColor))
        } else {
            tracing::warn!(directive, "ignoring color special");
            None
        }
    })
}

/// Converts a TeX color specification into a CSS color.
///
/// Unsupported specifications are black.
pub fn css_color(spec: &str) -> String {
    match spec {
        "gray 0" => return "black".into(),
        "gray 1" => return "white".into(),
        _ => {}
    }
    let components: Option<Vec<f64>> = if let Some(rgb) = spec.strip_prefix("rgb ") {
        rgb.split_whitespace().map(|c| c.parse().ok()).collect()
    } else if let Some(gray) = spec.strip_prefix("gray ") {
        gray.trim().parse().ok().map(|g| vec![g, g, g])
    } else {
        None
    };
    match components.as_deref() {
        Some(&[r, g, b]) => format!("#{}{}{}", hex(r), hex(g), hex(b)),
        _ => "black".into(),
    }
}

fn hex(component: f64) -> String {
    let n = (component * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("{n:02x}")
}
