use std::{cell::RefCell, fmt, num::ParseIntError, path::PathBuf, rc::Rc, str::FromStr};

use crate::{
    flag::{Arg, Flag},
    handler::Param,
    opt::{parse_from_str, Bindable, Dash, ParseFn, ParsesArg, ParsesMany},
    source::{ArgSource, FlagArgSource},
    ValueError,
};

struct State<T> {
    name: String,
    desc: String,
    parse: ParseFn<T>,
    dash: Dash,
    see: Vec<String>,
    default: Option<Vec<T>>,
    values: Vec<T>,
    set: bool,
}

pub(crate) struct ManyCell<T> {
    state: RefCell<State<T>>,
}

/// A variadic option: a run of positionals, or a flag that may repeat.
pub struct Many<T> {
    cell: Rc<ManyCell<T>>,
}

impl<T> Clone for Many<T> {
    fn clone(&self) -> Self {
        Many { cell: Rc::clone(&self.cell) }
    }
}

impl<T: fmt::Debug> fmt::Debug for Many<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.cell.state.borrow();
        f.debug_struct("Many")
            .field("name", &state.name)
            .field("values", &state.values)
            .field("set", &state.set)
            .finish()
    }
}

impl Many<String> {
    pub fn strings(name: &str, desc: &str) -> Self {
        Many::with_parser(name, desc, |s| Ok(s.to_string()))
    }
}

impl Many<PathBuf> {
    /// Paths, where `-` (stdin) is also accepted.
    pub fn files(name: &str, desc: &str) -> Self {
        Many::with_parser(name, desc, |s| Ok(PathBuf::from(s))).allow_values(["-"])
    }
}

impl<T: Clone + 'static> Many<T> {
    pub fn with_parser(
        name: &str,
        desc: &str,
        parse: impl Fn(&str) -> Result<T, ValueError> + 'static,
    ) -> Self {
        let state = State {
            name: name.to_string(),
            desc: desc.to_string(),
            parse: Rc::new(parse),
            dash: Dash::default(),
            see: Vec::new(),
            default: None,
            values: Vec::new(),
            set: false,
        };
        Many { cell: Rc::new(ManyCell { state: RefCell::new(state) }) }
    }

    pub fn parsed(name: &str, desc: &str) -> Self
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Many::with_parser(name, desc, parse_from_str::<T>)
    }

    /// Signed integers; negative numbers are accepted.
    pub fn ints(name: &str, desc: &str) -> Self
    where
        T: FromStr<Err = ParseIntError>,
    {
        Many::parsed(name, desc).allow_dash_prefix("-")
    }

    pub fn allow_dash_prefix(self, prefix: &str) -> Self {
        self.cell.state.borrow_mut().dash.set_prefix(prefix);
        self
    }

    pub fn allow_values<const N: usize>(self, values: [&str; N]) -> Self {
        self.cell.state.borrow_mut().dash.add_values(&values);
        self
    }

    pub fn with_default(self, values: Vec<T>) -> Self {
        self.cell.state.borrow_mut().default = Some(values);
        self
    }

    pub fn see_also(self, command: &str) -> Self {
        self.cell.add_see_also(command);
        self
    }

    /// The collected values, else the default, else empty.
    pub fn value(&self) -> Vec<T> {
        let state = self.cell.state.borrow();
        match &state.default {
            Some(default) if !state.set => default.clone(),
            _ => state.values.clone(),
        }
    }

    pub fn is_set(&self) -> bool {
        self.cell.is_set()
    }

    /// Binds as a repeatable `--<name>`, one value per occurrence.
    pub fn flag(&self) -> Flag {
        let name = self.cell.name();
        Flag::new(self.cell.clone()).long(&name)
    }

    pub fn short_flag(&self, short: char) -> Flag {
        Flag::new(self.cell.clone()).short(short)
    }

    /// Binds as the trailing `<name> ...` positional.
    pub fn rest(&self, name: &str) -> Arg {
        Arg::many(self.cell.clone(), name)
    }

    /// The type-erased cell, for [`crate::Command::details_for`].
    pub fn bindable(&self) -> Rc<dyn Bindable> {
        self.cell.clone()
    }
}

impl<T: Clone + 'static> Param<Vec<T>> for Many<T> {
    fn value(&self) -> Vec<T> {
        Many::value(self)
    }
}

impl<T: Clone + 'static> Bindable for ManyCell<T> {
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
        state.values.push(parsed);
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
        state.values.clear();
        state.set = false;
    }
}

impl<T: Clone + 'static> ParsesArg for ManyCell<T> {
    fn parse_arg(&self, src: &mut dyn FlagArgSource) -> Result<(), ValueError> {
        let mut state = self.state.borrow_mut();
        let token = src.peek().ok_or(ValueError::Missing)?;
        let parsed = (state.parse)(token)?;
        src.next();
        state.values.push(parsed);
        state.set = true;
        Ok(())
    }
}

impl<T: Clone + 'static> ParsesMany for ManyCell<T> {
    fn parse_many(&self, src: &mut dyn ArgSource) -> Result<(), ValueError> {
        // The source may consult this cell's dash predicate, so no borrow is
        // held while it is read.
        let parse = Rc::clone(&self.state.borrow().parse);
        let mut parsed = Vec::new();
        while let Some(token) = src.peek_many() {
            parsed.push(parse(token)?);
            src.next();
        }
        if parsed.is_empty() {
            return Err(ValueError::Missing);
        }
        let mut state = self.state.borrow_mut();
        state.values.extend(parsed);
        state.set = true;
        Ok(())
    }
}
