use std::{fmt, rc::Rc};

use crate::{
    env::Environ,
    flag::{Arg, Flag},
    handler::{Context, Handler},
    opt::Bindable,
    ConfigError,
};

/// A node of the command tree.
///
/// Configured once at startup: each of flags, args, commands, handler and
/// details may be set a single time. Lookup tables are built when flags and
/// commands are set, so parsing only does binary searches.
pub struct Command {
    pub(crate) name: String,
    pub(crate) desc: String,
    pub(crate) detail: String,
    pub(crate) flags: Vec<Flag>,
    pub(crate) args: Vec<Arg>,
    pub(crate) cmds: Vec<Command>,
    pub(crate) handler: Option<Handler>,
    pub(crate) no_help: bool,
    // Indices into `flags`/`cmds`, sorted by short, long and command name.
    shorts: Vec<usize>,
    longs: Vec<usize>,
    names: Vec<usize>,
    configured: Configured,
}

#[derive(Default)]
struct Configured {
    flags: bool,
    args: bool,
    cmds: bool,
}

impl Command {
    pub fn new(name: &str, desc: &str) -> Self {
        Command {
            name: name.to_string(),
            desc: desc.to_string(),
            detail: String::new(),
            flags: Vec::new(),
            args: Vec::new(),
            cmds: Vec::new(),
            handler: None,
            no_help: false,
            shorts: Vec::new(),
            longs: Vec::new(),
            names: Vec::new(),
            configured: Configured::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.desc
    }

    fn redefined(&self, what: &'static str) -> ConfigError {
        ConfigError::Redefined { command: self.name.clone(), what }
    }

    /// Sets this command's flags.
    ///
    /// # Panics
    ///
    /// If two flags share a short or a long identifier.
    pub fn flags(&mut self, flags: impl IntoIterator<Item = Flag>) -> Result<(), ConfigError> {
        if self.configured.flags {
            return Err(self.redefined("flags"));
        }
        self.configured.flags = true;
        self.flags = flags.into_iter().collect();

        let flags = &self.flags;
        let mut shorts = (0..flags.len()).filter(|&i| flags[i].short.is_some()).collect::<Vec<_>>();
        shorts.sort_by_key(|&i| flags[i].short);
        for pair in shorts.windows(2) {
            if flags[pair[0]].short == flags[pair[1]].short {
                panic!("{}: multiple short definitions for {}", self.name, flags[pair[0]].names());
            }
        }

        let mut longs = (0..flags.len()).filter(|&i| flags[i].long.is_some()).collect::<Vec<_>>();
        longs.sort_by(|&a, &b| flags[a].long.cmp(&flags[b].long));
        for pair in longs.windows(2) {
            if flags[pair[0]].long == flags[pair[1]].long {
                panic!("{}: multiple long definitions for {}", self.name, flags[pair[0]].names());
            }
        }

        self.shorts = shorts;
        self.longs = longs;
        Ok(())
    }

    /// Sets this command's positionals, matched in order.
    ///
    /// # Panics
    ///
    /// If a variadic positional is not the last one.
    pub fn args(&mut self, args: impl IntoIterator<Item = Arg>) -> Result<(), ConfigError> {
        if self.configured.args {
            return Err(self.redefined("args"));
        }
        self.configured.args = true;
        self.args = args.into_iter().collect();
        if let Some(arg) = self.args.iter().rev().skip(1).find(|it| it.is_many()) {
            panic!("{}: variadic {} must be the last positional", self.name, arg.describe());
        }
        Ok(())
    }

    /// Sets this command's children.
    ///
    /// # Panics
    ///
    /// If two children share a name.
    pub fn commands(
        &mut self,
        cmds: impl IntoIterator<Item = Command>,
    ) -> Result<(), ConfigError> {
        if self.configured.cmds {
            return Err(self.redefined("commands"));
        }
        self.configured.cmds = true;
        self.cmds = cmds.into_iter().collect();

        let cmds = &self.cmds;
        let mut names = (0..cmds.len()).filter(|&i| !cmds[i].name.is_empty()).collect::<Vec<_>>();
        names.sort_by(|&a, &b| cmds[a].name.cmp(&cmds[b].name));
        for pair in names.windows(2) {
            if cmds[pair[0]].name == cmds[pair[1]].name {
                panic!("{}: multiple definitions for command {}", self.name, cmds[pair[0]].name);
            }
        }
        self.names = names;
        Ok(())
    }

    pub fn runs(
        &mut self,
        handler: impl Fn(&Context, &mut Environ) -> anyhow::Result<()> + 'static,
    ) -> Result<(), ConfigError> {
        if self.handler.is_some() {
            return Err(self.redefined("handler"));
        }
        self.handler = Some(Box::new(handler));
        Ok(())
    }

    /// Longer help text, reflowed when printed.
    pub fn details(&mut self, detail: &str) -> Result<(), ConfigError> {
        if !self.detail.is_empty() {
            return Err(self.redefined("detail"));
        }
        self.detail = detail.to_string();
        Ok(())
    }

    /// Like [`Command::details`], and points each option's help here.
    pub fn details_for(
        &mut self,
        detail: &str,
        opts: impl IntoIterator<Item = Rc<dyn Bindable>>,
    ) -> Result<(), ConfigError> {
        self.details(detail)?;
        for opt in opts {
            opt.add_see_also(&self.name);
        }
        Ok(())
    }

    /// Turns off the implicit `-h, --help`.
    pub fn suppress_help(&mut self) {
        self.no_help = true;
    }

    /// Clears every option bound anywhere below this command, so the tree can
    /// be parsed again.
    pub fn reset(&self) {
        for flag in &self.flags {
            flag.option.reset();
        }
        for arg in &self.args {
            arg.reset();
        }
        for cmd in &self.cmds {
            cmd.reset();
        }
    }

    /// The flag for `-x`, `--name` or `--name=value`, with the byte offset of
    /// an embedded value (0 if there is none).
    pub(crate) fn lookup_flag(&self, arg: &str) -> Option<(usize, usize)> {
        if arg.len() < 2 || !arg.starts_with('-') {
            return None;
        }
        if let Some(long) = arg.strip_prefix("--") {
            if let Some(idx) = self.find_long(long) {
                return Some((idx, 0));
            }
            let eq = arg.find('=').filter(|&eq| eq >= 3)?;
            return self.find_long(&arg[2..eq]).map(|idx| (idx, eq + 1));
        }
        let mut chars = arg[1..].chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) => self.find_short(short).map(|idx| (idx, 0)),
            _ => None,
        }
    }

    pub(crate) fn find_short(&self, short: char) -> Option<usize> {
        let pos = self.shorts.binary_search_by_key(&Some(short), |&i| self.flags[i].short).ok()?;
        Some(self.shorts[pos])
    }

    fn find_long(&self, long: &str) -> Option<usize> {
        let pos = self
            .longs
            .binary_search_by(|&i| self.flags[i].long.as_deref().cmp(&Some(long)))
            .ok()?;
        Some(self.longs[pos])
    }

    pub(crate) fn lookup_cmd(&self, arg: &str) -> Option<&Command> {
        let pos = self.names.binary_search_by(|&i| self.cmds[i].name.as_str().cmp(arg)).ok()?;
        Some(&self.cmds[self.names[pos]])
    }

    /// Follows `names` down from this command.
    pub fn find(&self, names: &[String]) -> Option<&Command> {
        names.iter().try_fold(self, |cmd, name| cmd.lookup_cmd(name))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("args", &self.args)
            .field("cmds", &self.cmds)
            .finish()
    }
}
