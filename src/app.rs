use std::{
    io::Write,
    ops::{Deref, DerefMut},
};

use tracing::debug;

use crate::{
    command::Command, env::Environ, exit_code, handler::Context, help, parse::Parser,
    ParseError, Resolved, Result,
};

/// Parse-wide switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    /// Whether `-abc` may stand for `-a -b -c`. Any token starting with `-`
    /// then looks like a flag, so negative numbers are only accepted by
    /// options that allow a `-` prefix.
    pub allow_group_short_flags: bool,
}

/// The root command of a program, plus the driver that parses argv and runs
/// whatever it resolves to.
///
/// Dereferences to the root [`Command`], so the tree is configured through
/// it directly.
#[derive(Debug)]
pub struct Application {
    command: Command,
    settings: Settings,
}

impl Application {
    pub fn new(name: &str, desc: &str) -> Self {
        Application { command: Command::new(name, desc), settings: Settings::default() }
    }

    pub fn allow_group_short_flags(&mut self, allow: bool) {
        self.settings.allow_group_short_flags = allow;
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Parses `args`, where `args[0]` is the program name.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Result<Resolved<'_>> {
        let args = args.iter().map(|it| it.as_ref().to_string()).collect::<Vec<_>>();
        let Some((program, rest)) = args.split_first() else {
            return Err(ParseError::MissingProgram);
        };
        debug!(%program, args = rest.len(), "parsing");
        Parser::new(&self.command, rest, self.settings).parse()
    }

    pub fn parse_env(&self, env: &Environ) -> Result<Resolved<'_>> {
        self.parse(env.args())
    }

    /// Parses the environ's args and runs the resolved command.
    ///
    /// Missing or extra arguments also print the failing command's usage to
    /// stdout before the error is returned.
    pub fn main_env(&self, ctx: &Context, env: &mut Environ) -> anyhow::Result<()> {
        let resolved = match self.parse_env(env) {
            Ok(it) => it,
            Err(err) => {
                let usage = err
                    .command()
                    .filter(|_| err.shows_usage())
                    .and_then(|path| help::usage_for(&self.command, path));
                if let Some(usage) = usage {
                    env.stdout().write_all(usage.as_bytes())?;
                }
                return Err(err.into());
            }
        };
        debug!(command = %resolved.name(), help = resolved.is_help(), "running");
        resolved.run(ctx, env)
    }

    /// Runs against the process environment, reporting failures on stderr.
    /// Returns the exit code.
    pub fn main(&self, ctx: &Context) -> i32 {
        let mut env = Environ::default();
        match self.main_env(ctx, &mut env) {
            Ok(()) => 0,
            Err(err) => {
                self.ferror(env.stderr(), &err);
                exit_code(&err)
            }
        }
    }

    /// Writes `<program>: error: <message>`.
    pub fn ferror(&self, w: &mut dyn Write, err: &anyhow::Error) {
        drop(writeln!(w, "{}: error: {err:#}", self.command.name));
    }
}

impl Deref for Application {
    type Target = Command;

    fn deref(&self) -> &Command {
        &self.command
    }
}

impl DerefMut for Application {
    fn deref_mut(&mut self) -> &mut Command {
        &mut self.command
    }
}
