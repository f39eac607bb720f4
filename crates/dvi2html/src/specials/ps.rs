use crate::command::Command;
use crate::merge::merge;
use crate::Error;

/// Rewrites `ps: <code>` specials into [`Command::PostScript`].
///
/// Adjacent specials are joined with a space into a single command, since a
/// long piece of code may be split across several specials.
pub fn ps<I>(commands: I) -> impl Iterator<Item = Result<Command, Error>>
where
    I: IntoIterator<Item = Result<Command, Error>>,
{
    let commands = super::rewrite(commands, "ps: ", |code| {
        Some(Ok(Command::PostScript(code.to_string())))
    });
    merge(
        commands,
        |command: &Result<Command, Error>| matches!(command, Ok(Command::PostScript(_))),
        |run: Vec<Result<Command, Error>>| {
            let code: Vec<String> = run
                .into_iter()
                .filter_map(|command| match command {
                    Ok(Command::PostScript(code)) => Some(code),
                    _ => None,
                })
                .collect();
            [Ok(Command::PostScript(code.join(" ")))]
        },
    )
}
