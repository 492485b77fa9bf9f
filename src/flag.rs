use std::{fmt, rc::Rc};

use crate::opt::{Bindable, Dash, ParsesArg, ParsesMany};

/// An option bound to a command as `-s` and/or `--long`.
#[derive(Clone)]
pub struct Flag {
    pub(crate) option: Rc<dyn ParsesArg>,
    pub(crate) short: Option<char>,
    pub(crate) long: Option<String>,
    pub(crate) hint: Option<String>,
    pub(crate) default: Option<FlagDefault>,
}

#[derive(Debug, Clone)]
pub(crate) struct FlagDefault {
    pub(crate) literal: String,
    pub(crate) shown: String,
}

impl Flag {
    pub(crate) fn new(option: Rc<dyn ParsesArg>) -> Self {
        Flag { option, short: None, long: None, hint: None, default: None }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn long(mut self, long: &str) -> Self {
        self.long = Some(long.to_string());
        self
    }

    /// Placeholder shown in help, as in `--out=FILE`.
    pub fn hint(mut self, placeholder: &str) -> Self {
        self.hint = Some(placeholder.to_string());
        self
    }

    /// Parsed into the option after a successful parse that left it unset.
    pub fn default(self, literal: &str) -> Self {
        self.default_shown(literal, literal)
    }

    /// Like [`Flag::default`], with a different representation in help.
    pub fn default_shown(mut self, literal: &str, shown: &str) -> Self {
        self.default = Some(FlagDefault { literal: literal.to_string(), shown: shown.to_string() });
        self
    }

    /// `-s, --long`, or whichever of the two exists.
    pub fn names(&self) -> String {
        let mut names = Vec::new();
        if let Some(short) = self.short {
            names.push(format!("-{short}"));
        }
        if let Some(long) = &self.long {
            names.push(format!("--{long}"));
        }
        names.join(", ")
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("short", &self.short)
            .field("long", &self.long)
            .field("option", &self.option.name())
            .finish()
    }
}

#[derive(Clone)]
pub(crate) enum ArgParser {
    One(Rc<dyn ParsesArg>),
    Many(Rc<dyn ParsesMany>),
}

/// An option bound to a command by position.
#[derive(Clone)]
pub struct Arg {
    pub(crate) parser: ArgParser,
    pub(crate) name: String,
}

impl Arg {
    pub(crate) fn one(option: Rc<dyn ParsesArg>, name: &str) -> Self {
        Arg { parser: ArgParser::One(option), name: name.to_string() }
    }

    pub(crate) fn many(option: Rc<dyn ParsesMany>, name: &str) -> Self {
        Arg { parser: ArgParser::Many(option), name: name.to_string() }
    }

    pub fn is_many(&self) -> bool {
        matches!(self.parser, ArgParser::Many(_))
    }

    pub(crate) fn description(&self) -> String {
        match &self.parser {
            ArgParser::One(it) => it.description(),
            ArgParser::Many(it) => it.description(),
        }
    }

    pub(crate) fn reset(&self) {
        match &self.parser {
            ArgParser::One(it) => it.reset(),
            ArgParser::Many(it) => it.reset(),
        }
    }

    pub(crate) fn dash(&self) -> Dash {
        match &self.parser {
            ArgParser::One(it) => it.dash(),
            ArgParser::Many(it) => it.dash(),
        }
    }

    /// Whether a dash-prefixed token may still fill this slot.
    pub fn can(&self, token: &str) -> bool {
        self.dash().accepts(token)
    }

    /// `<name>`, or `<name> ...` for a variadic slot.
    pub fn describe(&self) -> String {
        let mut desc = format!("<{}>", self.name);
        if self.is_many() {
            desc.push_str(" ...");
        }
        desc
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arg").field("name", &self.name).field("many", &self.is_many()).finish()
    }
}
