//! Command line parsing and dispatch over a tree of commands.
//!
//! Values live in typed cells ([`Opt`], [`Many`]) that are bound to a
//! [`Command`] as flags or positionals. Parsing fills the cells in place and
//! finds the command argv names; running that command calls its handler.
//!
//! ```
//! use cmdtree::{Application, Opt};
//!
//! let mut app = Application::new("hello", "Greets someone.");
//! let name = Opt::string("name", "Who to greet.");
//! let emoji = Opt::toggle("emoji", "Be enthusiastic.");
//! app.flags([emoji.flag().short('e')]).unwrap();
//! app.args([name.pos("name")]).unwrap();
//!
//! let resolved = app.parse(&["hello", "-e", "world"]).unwrap();
//! assert_eq!(resolved.name(), "hello");
//! assert_eq!(name.value(), "world");
//! assert!(emoji.value());
//!
//! app.reset();
//! let err = app.parse(&["hello"]).unwrap_err();
//! assert_eq!(err.to_string(), r#"expected "<name>""#);
//! ```
//!
//! A tree must not be parsed from two places at once: the cells are shared
//! and written during parsing. Call [`Command::reset`] between parses.

mod app;
mod command;
mod env;
mod error;
mod flag;
mod handler;
pub mod help;
mod many;
mod opt;
mod parse;
mod source;

pub use crate::{
    app::{Application, Settings},
    command::Command,
    env::Environ,
    error::{exit_code, CommandPath, ConfigError, ExitError, ParseError, ValueError},
    flag::{Arg, Flag},
    handler::{
        handler0, handler1, handler2, handler3, handler4, handler5, handler6, Context, Hardcoded,
        Param, Singleton,
    },
    many::Many,
    opt::{Bindable, Dash, NamedValue, Opt, ParsesArg, ParsesMany},
    parse::Resolved,
    source::{ArgSource, FlagArgSource},
};

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
