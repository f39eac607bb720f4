use crate::command::Command;
use crate::merge::merge;
use crate::Error;

/// Rewrites `dvisvgm:raw <fragment>` specials into [`Command::RawSvg`].
///
/// Adjacent fragments are concatenated into one command and the `{?nl}`
/// placeholder is removed.
pub fn svg<I>(commands: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Command, Error>>,
{
    let commands = super::rewrite(commands, "dvisvgm:raw ", |fragment| {
        Some(Ok(Command::RawSvg(fragment.to_string())))
    });
    merge(
        commands,
        |command: &Result<Command, Error>| matches!(command, Ok(Command::RawSvg(_))),
        |run: Vec<Result<Command, Error>>| {
            let svg: String = run
                .into_iter()
                .filter_map(|command| match command {
                    Ok(Command::RawSvg(fragment)) => Some(fragment),
                    _ => None,
                })
                .collect();
            [Ok(Command::RawSvg(svg.replace("{?nl}", "")))]
        },
    )
}
