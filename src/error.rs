use std::fmt;

use thiserror::Error;

/// Names of the commands walked from the root to the one a message is about.
///
/// The root itself is left out, so an empty path means the root command. When
/// displayed, a non-empty path renders as `a.b: ` and an empty one as nothing,
/// which lets error messages be written as `"{command}message"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPath(Vec<String>);

impl CommandPath {
    pub(crate) fn new(names: Vec<String>) -> Self {
        CommandPath(names)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, "{}: ", self.0.join("."))
    }
}

/// A failure turning argv into a resolved command.
///
/// Every variant carries the command it happened in; none of them is raised as
/// a panic.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("program name: missing")]
    MissingProgram,

    #[error("{command}help requested")]
    HelpDisabled { command: CommandPath },

    #[error("{command}expected <command>")]
    MissingCommand { command: CommandPath },

    #[error("{command}unused: {flag}: {value:?}")]
    FlagValueUnconsumed { command: CommandPath, flag: String, value: String },

    #[error("{command}{flag}: {error}")]
    FlagParse { command: CommandPath, flag: String, error: ValueError },

    #[error("{command}unused: {arg:?}")]
    ArgValueUnconsumed { command: CommandPath, arg: String },

    #[error("{command}{arg}: {error}")]
    ArgParse { command: CommandPath, arg: String, error: ValueError },

    #[error("{command}unexpected flag: {flag}")]
    ExtraFlag { command: CommandPath, flag: String },

    #[error("{command}{}", extra_args(.args))]
    ExtraArgs { command: CommandPath, args: Vec<String> },

    #[error("{command}expected {:?}", .args.join(" "))]
    MissingArgs { command: CommandPath, args: Vec<String> },
}

impl ParseError {
    /// The command the failure was detected in.
    pub fn command(&self) -> Option<&CommandPath> {
        match self {
            ParseError::MissingProgram => None,
            ParseError::HelpDisabled { command }
            | ParseError::MissingCommand { command }
            | ParseError::FlagValueUnconsumed { command, .. }
            | ParseError::FlagParse { command, .. }
            | ParseError::ArgValueUnconsumed { command, .. }
            | ParseError::ArgParse { command, .. }
            | ParseError::ExtraFlag { command, .. }
            | ParseError::ExtraArgs { command, .. }
            | ParseError::MissingArgs { command, .. } => Some(command),
        }
    }

    /// Whether the driver should re-print the failing command's usage.
    pub fn shows_usage(&self) -> bool {
        matches!(self, ParseError::ExtraArgs { .. } | ParseError::MissingArgs { .. })
    }
}

fn extra_args(args: &[String]) -> String {
    match args {
        [arg] => format!("unexpected argument: {arg:?}"),
        _ => format!("unexpected arguments: {}", args.join(" ")),
    }
}

/// Names listed in a [`ValueError::NotOneOf`] message before eliding them.
const MAX_LISTED_NAMES: usize = 8;

/// A single value rejected by an option's parser or validator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("no argument provided")]
    Missing,

    #[error("{}", not_one_of(.value, .names))]
    NotOneOf { value: String, names: Vec<String> },

    #[error("parsing {value:?} as {ty}: {reason}")]
    Invalid { value: String, ty: &'static str, reason: String },

    #[error("{0}")]
    Rejected(String),
}

fn not_one_of(value: &str, names: &[String]) -> String {
    if names.len() < MAX_LISTED_NAMES {
        let names = names.iter().map(|it| format!("{it:?}")).collect::<Vec<_>>();
        format!("{value:?} not one of {}", names.join(", "))
    } else {
        format!("{value:?} unsupported value")
    }
}

/// A command was configured twice.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{command} {what}: already set")]
    Redefined { command: String, what: &'static str },
}

/// Error carrying an explicit process exit code.
///
/// Handlers return this (possibly wrapped in context) to choose the status
/// [`crate::Application::main`] exits with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExitError {
    code: i32,
    message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        ExitError { code, message: message.into() }
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

/// Exit status for a failed invocation: the first [`ExitError`] in the chain,
/// else 1.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain().find_map(|it| it.downcast_ref::<ExitError>()).map_or(1, ExitError::code)
}
