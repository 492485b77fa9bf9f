//! The dispatcher: walks argv against a command tree.
//!
//! Every token is tried, in order, as the `--` escape, a flag of the current
//! command or one of its ancestors, `-h`/`--help`, the next positional slot,
//! and finally a child command. Anything left over is an error.

use std::iter;

use tracing::{debug, trace};

use crate::{
    app::Settings,
    command::Command,
    env::Environ,
    flag::{Arg, ArgParser, Flag},
    handler::Context,
    help,
    source::{ArgArgs, FlagArgs},
    CommandPath, ParseError, Result,
};

pub(crate) struct Parser<'a, 'p> {
    args: &'p [String],
    pos: usize,
    cur: &'a Command,
    parents: Vec<&'a Command>,
    carg: usize,
    can_flag: bool,
    help: bool,
    group_short_flags: bool,
    maybe_flag: fn(&str) -> bool,
}

/// Default flag-likeness: `--anything` or a lone `-x`.
fn maybe_flag(arg: &str) -> bool {
    arg.starts_with("--") || (arg.len() == 2 && arg.starts_with('-'))
}

/// Flag-likeness when `-abc` may be a group of short flags.
fn maybe_flag_grouped(arg: &str) -> bool {
    arg.starts_with('-')
}

impl<'a, 'p> Parser<'a, 'p> {
    /// `args` excludes the program name.
    pub(crate) fn new(root: &'a Command, args: &'p [String], settings: Settings) -> Self {
        let group_short_flags = settings.allow_group_short_flags;
        Parser {
            args,
            pos: 0,
            cur: root,
            parents: Vec::new(),
            carg: 0,
            can_flag: true,
            help: false,
            group_short_flags,
            maybe_flag: if group_short_flags { maybe_flag_grouped } else { maybe_flag },
        }
    }

    pub(crate) fn parse(mut self) -> Result<Resolved<'a>> {
        let res = match self.parse_tokens() {
            Ok(()) => self.finish(),
            Err(err) => Err(err),
        };
        if let Err(err) = &res {
            debug!(%err, "parse failed");
        }
        res
    }

    fn parse_tokens(&mut self) -> Result<()> {
        let args = self.args;
        while let Some(arg) = args.get(self.pos) {
            let cur = self.cur;
            trace!(
                token = %arg,
                cur = %cur.name,
                carg = self.carg,
                can_flag = self.can_flag,
                "next token"
            );

            if self.can_flag {
                if arg == "--" {
                    self.can_flag = false;
                    self.pos += 1;
                    continue;
                }

                if let Some((flag, rem)) = self.lookup_flag(arg) {
                    self.parse_flag(flag, arg, rem)?;
                    continue;
                }

                if self.group_short_flags {
                    if let Some(group) = self.lookup_group(arg) {
                        self.parse_group(&group)?;
                        continue;
                    }
                }

                if !cur.no_help && (arg == "-h" || arg == "--help") {
                    debug!(cur = %cur.name, "help requested");
                    self.help = true;
                    self.pos += 1;
                    continue;
                }

                let slot = cur.args.get(self.carg);
                if (self.maybe_flag)(arg) && !slot.is_some_and(|it| it.can(arg)) {
                    return Err(ParseError::ExtraFlag {
                        command: self.command_path(),
                        flag: arg.clone(),
                    });
                }
            }

            if let Some(slot) = cur.args.get(self.carg) {
                self.parse_positional(slot)?;
                self.carg += 1;
                continue;
            }

            if let Some(cmd) = cur.lookup_cmd(arg) {
                debug!(parent = %cur.name, cmd = %cmd.name, "entering command");
                self.parents.push(cur);
                self.cur = cmd;
                self.carg = 0;
                self.pos += 1;
                continue;
            }

            return Err(ParseError::ExtraArgs {
                command: self.command_path(),
                args: args[self.pos..].to_vec(),
            });
        }
        Ok(())
    }

    fn finish(self) -> Result<Resolved<'a>> {
        if self.help {
            if self.cur.no_help {
                return Err(ParseError::HelpDisabled { command: self.command_path() });
            }
            return Ok(self.resolved(true));
        }

        if let Some(missing) = self.cur.args.get(self.carg..).filter(|it| !it.is_empty()) {
            return Err(ParseError::MissingArgs {
                command: self.command_path(),
                args: missing.iter().map(Arg::describe).collect(),
            });
        }

        for cmd in self.lineage() {
            for flag in &cmd.flags {
                let Some(default) = &flag.default else { continue };
                if flag.option.is_set() {
                    continue;
                }
                debug!(flag = %flag.names(), default = %default.literal, "applying default");
                flag.option.parse_default(&default.literal).map_err(|error| {
                    ParseError::FlagParse {
                        command: self.command_path(),
                        flag: default.literal.clone(),
                        error,
                    }
                })?;
            }
        }

        Ok(self.resolved(false))
    }

    /// The current command, then its ancestors up to the root.
    fn lineage(&self) -> impl Iterator<Item = &'a Command> + '_ {
        iter::once(self.cur).chain(self.parents.iter().rev().copied())
    }

    fn lookup_flag(&self, arg: &str) -> Option<(&'a Flag, usize)> {
        self.lineage()
            .find_map(|cmd| cmd.lookup_flag(arg).map(|(idx, rem)| (&cmd.flags[idx], rem)))
    }

    fn lookup_short(&self, short: char) -> Option<&'a Flag> {
        self.lineage().find_map(|cmd| cmd.find_short(short).map(|idx| &cmd.flags[idx]))
    }

    /// Resolves `-abc` as `-a -b -c`, if every letter is a known short flag.
    fn lookup_group(&self, arg: &str) -> Option<Vec<&'a Flag>> {
        let shorts = arg.strip_prefix('-').filter(|it| !it.starts_with('-'))?;
        if shorts.chars().count() < 2 {
            return None;
        }
        shorts.chars().map(|short| self.lookup_short(short)).collect()
    }

    fn parse_flag(&mut self, flag: &Flag, arg: &str, rem: usize) -> Result<()> {
        debug!(flag = %flag.names(), token = %arg, "matched flag");
        let args = self.args;
        if rem == 0 {
            self.pos += 1;
        }
        let mut src = FlagArgs::new(args, &mut self.pos, rem);
        let res = flag.option.parse_arg(&mut src);
        let unconsumed = src.unconsumed();

        if let Err(error) = res {
            return Err(ParseError::FlagParse {
                command: self.command_path(),
                flag: arg.to_string(),
                error,
            });
        }
        if unconsumed {
            return Err(ParseError::FlagValueUnconsumed {
                command: self.command_path(),
                flag: arg[..rem - 1].to_string(),
                value: arg[rem..].to_string(),
            });
        }
        Ok(())
    }

    /// Every member but the last sees no value; the last may take the next
    /// token.
    fn parse_group(&mut self, group: &[&'a Flag]) -> Result<()> {
        debug!(flags = group.len(), "matched short flag group");
        let args = self.args;
        self.pos += 1;
        for (i, flag) in group.iter().enumerate() {
            let res = if i + 1 == group.len() {
                flag.option.parse_arg(&mut FlagArgs::new(args, &mut self.pos, 0))
            } else {
                flag.option.parse_arg(&mut FlagArgs::new(&[], &mut 0, 0))
            };
            res.map_err(|error| ParseError::FlagParse {
                command: self.command_path(),
                flag: flag.short.map(|it| format!("-{it}")).unwrap_or_else(|| flag.names()),
                error,
            })?;
        }
        Ok(())
    }

    fn parse_positional(&mut self, slot: &Arg) -> Result<()> {
        debug!(arg = %slot.name, carg = self.carg, "filling positional");
        let args = self.args;
        let token = &args[self.pos];
        let mut src =
            ArgArgs::new(slot, args, &mut self.pos, &mut self.can_flag, self.maybe_flag);
        let res = match &slot.parser {
            ArgParser::One(it) => it.parse_arg(&mut src),
            ArgParser::Many(it) => it.parse_many(&mut src),
        };
        let unconsumed = src.unconsumed();

        if let Err(error) = res {
            return Err(ParseError::ArgParse {
                command: self.command_path(),
                arg: slot.name.clone(),
                error,
            });
        }
        if unconsumed {
            return Err(ParseError::ArgValueUnconsumed {
                command: self.command_path(),
                arg: token.clone(),
            });
        }
        Ok(())
    }

    fn command_path(&self) -> CommandPath {
        command_path(&self.parents, self.cur)
    }

    fn resolved(self, help: bool) -> Resolved<'a> {
        Resolved { parents: self.parents, cur: self.cur, help }
    }
}

fn command_path(parents: &[&Command], cur: &Command) -> CommandPath {
    let names = parents.iter().copied().chain(iter::once(cur)).skip(1);
    CommandPath::new(names.map(|it| it.name.clone()).collect())
}

/// The command a parse ended at, with the commands walked to reach it.
#[derive(Debug)]
pub struct Resolved<'a> {
    parents: Vec<&'a Command>,
    cur: &'a Command,
    help: bool,
}

impl<'a> Resolved<'a> {
    pub fn command(&self) -> &'a Command {
        self.cur
    }

    /// Every command from the root down to [`Resolved::command`].
    pub fn path(&self) -> Vec<&'a Command> {
        self.parents.iter().copied().chain(iter::once(self.cur)).collect()
    }

    /// The full dotted name, root included, e.g. `prog.cmd.sub`.
    pub fn name(&self) -> String {
        self.path().iter().map(|it| it.name.as_str()).collect::<Vec<_>>().join(".")
    }

    /// The path below the root, as used to qualify error messages.
    pub fn command_path(&self) -> CommandPath {
        command_path(&self.parents, self.cur)
    }

    /// Whether `-h`/`--help` was given; running prints usage instead.
    pub fn is_help(&self) -> bool {
        self.help
    }

    /// Prints usage when help was requested, else calls the handler.
    ///
    /// A command with children but no handler was expected to be followed
    /// by a subcommand, which fails with [`ParseError::MissingCommand`]. A
    /// leaf without a handler does nothing.
    pub fn run(&self, ctx: &Context, env: &mut Environ) -> anyhow::Result<()> {
        if self.help {
            help::write_usage(env.stdout(), self)?;
            return Ok(());
        }
        match &self.cur.handler {
            Some(handler) => handler(ctx, env),
            None if !self.cur.cmds.is_empty() => {
                Err(ParseError::MissingCommand { command: self.command_path() }.into())
            }
            None => Ok(()),
        }
    }
}
