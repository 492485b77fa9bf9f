//! Typed value cells.
//!
//! An [`Opt`] is a cheap handle: clones share one cell, so the same option can
//! be bound as a flag, as a positional, and read back by a handler.

use std::{
    any::type_name,
    cell::RefCell,
    fmt,
    num::{ParseFloatError, ParseIntError},
    ops::Add,
    path::PathBuf,
    rc::Rc,
    str::FromStr,
};

use crate::{
    flag::{Arg, Flag},
    handler::{Param, Singleton},
    source::{ArgSource, FlagArgSource},
    ValueError,
};

pub(crate) type ParseFn<T> = Rc<dyn Fn(&str) -> Result<T, ValueError>>;
pub(crate) type ValidateFn<T> = Rc<dyn Fn(&T) -> Result<(), ValueError>>;

/// Metadata and lifecycle shared by every bindable value cell.
pub trait Bindable {
    fn name(&self) -> String;
    fn description(&self) -> String;
    /// Commands whose help explains this option further.
    fn see_also(&self) -> Vec<String>;
    fn add_see_also(&self, command: &str);
    /// Parses and stores `value` without marking the cell as set.
    fn parse_default(&self, value: &str) -> Result<(), ValueError>;
    fn dash(&self) -> Dash;
    fn is_set(&self) -> bool;
    /// Restores the freshly-constructed state.
    fn reset(&self);
}

/// A cell that can take its value from a flag or a single positional.
pub trait ParsesArg: Bindable {
    fn parse_arg(&self, src: &mut dyn FlagArgSource) -> Result<(), ValueError>;
}

/// A cell that can soak up a run of positionals.
pub trait ParsesMany: Bindable {
    fn parse_many(&self, src: &mut dyn ArgSource) -> Result<(), ValueError>;
}

/// Which dash-prefixed tokens an option accepts in positional context.
///
/// By default a token that looks like a flag must resolve to one. An option
/// can opt in to a dash prefix (`-` lets `-12` through but not `--x`) or to
/// literal values such as `-` for stdin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dash {
    prefix: String,
    values: Vec<String>,
}

impl Dash {
    pub(crate) fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_string();
    }

    pub(crate) fn add_values(&mut self, values: &[&str]) {
        self.values.extend(values.iter().map(|it| it.to_string()));
    }

    pub fn accepts(&self, token: &str) -> bool {
        if self.values.iter().any(|it| it == token) {
            return true;
        }
        match token.find(|c| c != '-') {
            Some(non_dash) => self.prefix.starts_with(&token[..non_dash]),
            None => false,
        }
    }
}

enum Takes<T> {
    /// Consumes one token.
    Value,
    /// Presence-only; derives the new value from the current one.
    Nothing(Rc<dyn Fn(&T) -> T>),
}

impl<T> Clone for Takes<T> {
    fn clone(&self) -> Self {
        match self {
            Takes::Value => Takes::Value,
            Takes::Nothing(f) => Takes::Nothing(Rc::clone(f)),
        }
    }
}

struct State<T> {
    name: String,
    desc: String,
    parse: ParseFn<T>,
    validate: Option<ValidateFn<T>>,
    takes: Takes<T>,
    dash: Dash,
    see: Vec<String>,
    default: Option<T>,
    value: Option<T>,
    set: bool,
}

pub(crate) struct OptCell<T> {
    state: RefCell<State<T>>,
}

/// A named, typed, validated value filled from one token.
pub struct Opt<T> {
    cell: Rc<OptCell<T>>,
}

impl<T> Clone for Opt<T> {
    fn clone(&self) -> Self {
        Opt { cell: Rc::clone(&self.cell) }
    }
}

impl<T: fmt::Debug> fmt::Debug for Opt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.cell.state.borrow();
        f.debug_struct("Opt")
            .field("name", &state.name)
            .field("value", &state.value)
            .field("set", &state.set)
            .finish()
    }
}

impl Opt<String> {
    pub fn string(name: &str, desc: &str) -> Self {
        Opt::string_like(name, desc)
    }

    /// An option restricted to `names`.
    pub fn one_string_of(name: &str, desc: &str, names: &[&str]) -> Self {
        let names = names.iter().map(|it| NamedValue::new(*it, it.to_string())).collect();
        Opt::one_name_of(name, desc, names)
    }
}

impl Opt<PathBuf> {
    /// A path, where `-` (stdin/stdout) is also accepted positionally.
    pub fn file(name: &str, desc: &str) -> Self {
        Opt::string_like(name, desc).allow_values(["-"])
    }
}

impl Opt<bool> {
    pub fn boolean(name: &str, desc: &str) -> Self {
        Opt::parsed(name, desc)
    }

    /// A presence-only switch that flips its current value.
    pub fn toggle(name: &str, desc: &str) -> Self {
        Opt::boolean(name, desc).takes_nothing(|it: &bool| !*it)
    }
}

impl<T: Clone + Default + 'static> Opt<T> {
    /// An option with a custom parser.
    pub fn with_parser(
        name: &str,
        desc: &str,
        parse: impl Fn(&str) -> Result<T, ValueError> + 'static,
    ) -> Self {
        let state = State {
            name: name.to_string(),
            desc: desc.to_string(),
            parse: Rc::new(parse),
            validate: None,
            takes: Takes::Value,
            dash: Dash::default(),
            see: Vec::new(),
            default: None,
            value: None,
            set: false,
        };
        Opt { cell: Rc::new(OptCell { state: RefCell::new(state) }) }
    }

    pub fn string_like(name: &str, desc: &str) -> Self
    where
        T: From<String>,
    {
        Opt::with_parser(name, desc, |s| Ok(T::from(s.to_string())))
    }

    /// Any `FromStr` type, reporting the parse error's message.
    pub fn parsed(name: &str, desc: &str) -> Self
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Opt::with_parser(name, desc, parse_from_str::<T>)
    }

    /// A signed integer. Negative numbers are accepted positionally.
    pub fn int(name: &str, desc: &str) -> Self
    where
        T: FromStr<Err = ParseIntError>,
    {
        Opt::parsed(name, desc).allow_dash_prefix("-")
    }

    pub fn uint(name: &str, desc: &str) -> Self
    where
        T: FromStr<Err = ParseIntError>,
    {
        Opt::parsed(name, desc)
    }

    /// A float. Negative numbers are accepted positionally.
    pub fn float(name: &str, desc: &str) -> Self
    where
        T: FromStr<Err = ParseFloatError>,
    {
        Opt::parsed(name, desc).allow_dash_prefix("-")
    }

    /// An option whose value must be one of the given names.
    pub fn one_name_of(name: &str, desc: &str, names: Vec<NamedValue<T>>) -> Self {
        Opt::with_parser(name, desc, move |s| {
            match names.iter().find(|it| it.name == s) {
                Some(it) => Ok(it.value.clone()),
                None => Err(ValueError::NotOneOf {
                    value: s.to_string(),
                    names: names.iter().map(|it| it.name.clone()).collect(),
                }),
            }
        })
    }

    /// A presence-only option adding `by` per occurrence.
    pub fn add(by: T, name: &str, desc: &str) -> Self
    where
        T: FromStr + Add<Output = T>,
        T::Err: fmt::Display,
    {
        Opt::parsed(name, desc).takes_nothing(move |it: &T| it.clone() + by.clone())
    }

    fn takes_nothing(self, f: impl Fn(&T) -> T + 'static) -> Self {
        self.cell.state.borrow_mut().takes = Takes::Nothing(Rc::new(f));
        self
    }

    /// Runs `check` on every parsed value before it is stored.
    pub fn validate(self, check: impl Fn(&T) -> Result<(), String> + 'static) -> Self {
        let check: ValidateFn<T> = Rc::new(move |it| check(it).map_err(ValueError::Rejected));
        self.cell.state.borrow_mut().validate = Some(check);
        self
    }

    /// Lets dash-prefixed tokens whose leading dashes are a prefix of
    /// `prefix` through as positional values.
    pub fn allow_dash_prefix(self, prefix: &str) -> Self {
        self.cell.state.borrow_mut().dash.set_prefix(prefix);
        self
    }

    /// Lets these exact dash-prefixed tokens through as positional values.
    pub fn allow_values<const N: usize>(self, values: [&str; N]) -> Self {
        self.cell.state.borrow_mut().dash.add_values(&values);
        self
    }

    /// Value reported while the option is unset.
    pub fn with_default(self, value: T) -> Self {
        self.cell.state.borrow_mut().default = Some(value);
        self
    }

    pub fn see_also(self, command: &str) -> Self {
        self.cell.add_see_also(command);
        self
    }

    /// The explicit value, else the default, else `T::default()`.
    pub fn value(&self) -> T {
        OptCell::current(&self.cell.state.borrow()).unwrap_or_default()
    }

    /// Whether a token was consumed for this option.
    pub fn is_set(&self) -> bool {
        self.cell.is_set()
    }

    /// Binds as `--<name>`.
    pub fn flag(&self) -> Flag {
        let name = self.cell.name();
        Flag::new(self.cell.clone()).long(&name)
    }

    /// Binds as `-<short>` only.
    pub fn short_flag(&self, short: char) -> Flag {
        Flag::new(self.cell.clone()).short(short)
    }

    /// Binds as a single positional shown as `<name>`.
    pub fn pos(&self, name: &str) -> Arg {
        Arg::one(self.cell.clone(), name)
    }

    /// Adapts the value to a one-element `Vec` for handlers taking many.
    pub fn slice(&self) -> Singleton<Self> {
        Singleton::new(self.clone())
    }

    /// The type-erased cell, for [`crate::Command::details_for`].
    pub fn bindable(&self) -> Rc<dyn Bindable> {
        self.cell.clone()
    }
}

impl<T: Clone + Default + 'static> Param<T> for Opt<T> {
    fn value(&self) -> T {
        Opt::value(self)
    }
}

impl<T: Clone + 'static> OptCell<T> {
    fn current(state: &State<T>) -> Option<T> {
        if state.set {
            state.value.clone()
        } else {
            state.default.clone().or_else(|| state.value.clone())
        }
    }

    fn checked(state: &State<T>, value: T) -> Result<T, ValueError> {
        if let Some(validate) = &state.validate {
            validate(&value)?;
        }
        Ok(value)
    }
}

impl<T: Clone + Default + 'static> Bindable for OptCell<T> {
    fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    fn description(&self) -> String {
        self.state.borrow().desc.clone()
    }

    fn see_also(&self) -> Vec<String> {
        self.state.borrow().see.clone()
    }

    fn add_see_also(&self, command: &str) {
        self.state.borrow_mut().see.push(command.to_string());
    }

    fn parse_default(&self, value: &str) -> Result<(), ValueError> {
        let mut state = self.state.borrow_mut();
        let parsed = (state.parse)(value)?;
        let parsed = Self::checked(&state, parsed)?;
        state.value = Some(parsed);
        Ok(())
    }

    fn dash(&self) -> Dash {
        self.state.borrow().dash.clone()
    }

    fn is_set(&self) -> bool {
        self.state.borrow().set
    }

    fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.value = None;
        state.set = false;
    }
}

impl<T: Clone + Default + 'static> ParsesArg for OptCell<T> {
    fn parse_arg(&self, src: &mut dyn FlagArgSource) -> Result<(), ValueError> {
        let mut state = self.state.borrow_mut();
        let parsed = match state.takes.clone() {
            Takes::Nothing(next) => {
                let current = Self::current(&state).unwrap_or_default();
                Self::checked(&state, next(&current))?
            }
            Takes::Value => {
                let token = src.peek().ok_or(ValueError::Missing)?;
                let parsed = (state.parse)(token)?;
                let parsed = Self::checked(&state, parsed)?;
                src.next();
                parsed
            }
        };
        state.value = Some(parsed);
        state.set = true;
        Ok(())
    }
}

/// A name accepted by an enumerated option and the value it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedValue<T> {
    pub name: String,
    pub desc: String,
    pub value: T,
}

impl<T> NamedValue<T> {
    pub fn new(name: &str, value: T) -> Self {
        NamedValue { name: name.to_string(), desc: String::new(), value }
    }

    pub fn described(mut self, desc: &str) -> Self {
        self.desc = desc.to_string();
        self
    }
}

pub(crate) fn parse_from_str<T>(s: &str) -> Result<T, ValueError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    s.parse::<T>().map_err(|err| ValueError::Invalid {
        value: s.to_string(),
        ty: short_type_name::<T>(),
        reason: err.to_string(),
    })
}

fn short_type_name<T>() -> &'static str {
    let name = type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}
