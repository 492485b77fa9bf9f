use std::{
    env, fmt,
    io::{self, Read, Write},
};

type LookupFn = Box<dyn Fn(&str) -> Option<String>>;

/// Everything a command touches outside its options: argv, stdio and
/// environment variables.
///
/// [`Environ::default`] reads them from the process; the `with_*` builders
/// replace any of them, which is how tests drive an application.
pub struct Environ {
    args: Vec<String>,
    stdin: Box<dyn Read>,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
    lookup: LookupFn,
}

impl Default for Environ {
    fn default() -> Self {
        Environ {
            args: env::args_os().map(|it| it.to_string_lossy().into_owned()).collect(),
            stdin: Box::new(io::stdin()),
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
            lookup: Box::new(|key| env::var(key).ok()),
        }
    }
}

impl Environ {
    /// `args[0]` is the program name.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stdin(mut self, stdin: impl Read + 'static) -> Self {
        self.stdin = Box::new(stdin);
        self
    }

    pub fn with_stdout(mut self, stdout: impl Write + 'static) -> Self {
        self.stdout = Box::new(stdout);
        self
    }

    pub fn with_stderr(mut self, stderr: impl Write + 'static) -> Self {
        self.stderr = Box::new(stderr);
        self
    }

    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn stdin(&mut self) -> &mut dyn Read {
        &mut *self.stdin
    }

    pub fn stdout(&mut self) -> &mut dyn Write {
        &mut *self.stdout
    }

    pub fn stderr(&mut self) -> &mut dyn Write {
        &mut *self.stderr
    }

    /// The variable's value, or an empty string when unset.
    pub fn getenv(&self, key: &str) -> String {
        self.lookup_env(key).unwrap_or_default()
    }

    pub fn lookup_env(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }
}

impl fmt::Debug for Environ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environ").field("args", &self.args).finish_non_exhaustive()
    }
}
