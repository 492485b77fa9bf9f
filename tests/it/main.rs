mod commands;
mod help;

use std::{cell::RefCell, fmt, io, rc::Rc};

use cmdtree::{Application, Context, Environ};
use expect_test::Expect;

fn argv(args: &str) -> Vec<String> {
    let args = args.split_ascii_whitespace();
    std::iter::once("prog").chain(args).map(String::from).collect()
}

/// Resets `app`, parses `args` and snapshots either the resolved state or
/// the error message.
fn check<S, F>(app: &Application, state: F, args: &str, expect: Expect)
where
    F: FnOnce(&cmdtree::Resolved<'_>) -> S,
    S: fmt::Debug,
{
    app.reset();
    match app.parse(&argv(args)) {
        Ok(resolved) => expect.assert_debug_eq(&state(&resolved)),
        Err(err) => expect.assert_eq(&err.to_string()),
    }
}

/// Runs `args` through [`Application::main_env`]; returns what was written to
/// stdout, followed by the reported error, if any.
fn run(app: &Application, args: &str) -> String {
    app.reset();
    let stdout = Buffer::default();
    let mut env = Environ::default().with_args(argv(args)).with_stdout(stdout.clone());
    if let Err(err) = app.main_env(&Context::new(), &mut env) {
        app.ferror(&mut stdout.clone(), &err);
    }
    stdout.contents()
}

#[derive(Clone, Default)]
struct Buffer(Rc<RefCell<Vec<u8>>>);

impl Buffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
