use crate::command::Command;
use crate::Error;

/// Rewrites `papersize=<W>pt,<H>pt` specials into [`Command::SetPapersize`].
pub fn papersize<I>(commands: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Command, Error>>,
{
    super::rewrite(commands, "papersize=", |sizes| Some(parse(sizes)))
}

fn parse(sizes: &str) -> Result<Command, Error> {
    let invalid = || Error::Papersize(sizes.to_string());
    let points = |s: &str| -> Result<f64, Error> {
        s.trim()
            .strip_suffix("pt")
            .and_then(|n| n.trim().parse().ok())
            .ok_or_else(invalid)
    };
    match sizes.split(',').collect::<Vec<_>>()[..] {
        [width, height] => Ok(Command::SetPapersize {
            width: points(width)?,
            height: points(height)?,
        }),
        _ => Err(invalid()),
    }
}
