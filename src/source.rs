//! Views over the remaining argv handed to option parsers.
//!
//! Options pull exactly the tokens they need through these traits; consuming a
//! token advances the dispatcher's cursor, so the parse loop never has to know
//! how many tokens an option takes.

use crate::{flag::Arg, opt::Dash};

/// Tokens available to a flag's value.
pub trait FlagArgSource {
    /// The next value without consuming it.
    fn peek(&self) -> Option<&str>;
    /// Consumes and returns the next value.
    fn next(&mut self) -> Option<&str>;
}

/// Tokens available to a positional slot.
pub trait ArgSource: FlagArgSource {
    /// The next token a variadic positional may still take.
    ///
    /// A bare `--` is swallowed once (turning flag recognition off), and a
    /// token that looks like a flag the slot does not accept ends the run.
    fn peek_many(&mut self) -> Option<&str>;
}

/// Value source for a matched flag, either embedded (`--name=value`) or the
/// token that follows it.
pub(crate) struct FlagArgs<'p> {
    args: &'p [String],
    pos: &'p mut usize,
    /// Byte offset of the embedded value inside `args[*pos]`, or 0.
    rem: usize,
    need_consume: bool,
}

impl<'p> FlagArgs<'p> {
    pub(crate) fn new(args: &'p [String], pos: &'p mut usize, rem: usize) -> Self {
        FlagArgs { args, pos, rem, need_consume: rem > 0 }
    }

    /// Whether an embedded value was left behind.
    pub(crate) fn unconsumed(&self) -> bool {
        self.need_consume
    }
}

impl FlagArgSource for FlagArgs<'_> {
    fn peek(&self) -> Option<&str> {
        if self.rem > 0 && !self.need_consume {
            return None;
        }
        let arg = self.args.get(*self.pos)?;
        if self.need_consume {
            Some(&arg[self.rem..])
        } else {
            Some(arg)
        }
    }

    fn next(&mut self) -> Option<&str> {
        self.peek()?;
        let args = self.args;
        let arg = &args[*self.pos];
        let value = if self.need_consume { &arg[self.rem..] } else { arg.as_str() };
        *self.pos += 1;
        self.need_consume = false;
        Some(value)
    }
}

/// Positional source bound to one [`Arg`] slot.
pub(crate) struct ArgArgs<'p> {
    /// The slot's predicate, taken before its option starts parsing.
    dash: Dash,
    args: &'p [String],
    pos: &'p mut usize,
    need_consume: bool,
    can_flag: &'p mut bool,
    maybe_flag: fn(&str) -> bool,
}

impl<'p> ArgArgs<'p> {
    pub(crate) fn new(
        arg: &'p Arg,
        args: &'p [String],
        pos: &'p mut usize,
        can_flag: &'p mut bool,
        maybe_flag: fn(&str) -> bool,
    ) -> Self {
        ArgArgs { dash: arg.dash(), args, pos, need_consume: true, can_flag, maybe_flag }
    }

    /// Whether the slot finished without taking a single token.
    pub(crate) fn unconsumed(&self) -> bool {
        self.need_consume
    }
}

impl FlagArgSource for ArgArgs<'_> {
    fn peek(&self) -> Option<&str> {
        self.args.get(*self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<&str> {
        let args = self.args;
        let value = args.get(*self.pos)?;
        *self.pos += 1;
        self.need_consume = false;
        Some(value)
    }
}

impl ArgSource for ArgArgs<'_> {
    fn peek_many(&mut self) -> Option<&str> {
        let args = self.args;
        loop {
            let arg = args.get(*self.pos)?;
            if *self.can_flag {
                if arg == "--" {
                    *self.can_flag = false;
                    *self.pos += 1;
                    continue;
                }
                if (self.maybe_flag)(arg) && !self.dash.accepts(arg) {
                    return None;
                }
            }
            return Some(arg);
        }
    }
}
