use std::io::Write;

use anyhow::Context as _;
use cmdtree::{
    exit_code, handler0, handler2, handler3, Application, Command, Context, Environ, ExitError,
    Hardcoded, Opt,
};
use expect_test::expect;
use tokio_util::sync::CancellationToken;

use crate::{argv, check, run, Buffer};

fn say(cmd: &mut Command, text: &'static str) {
    cmd.runs(move |_, env| {
        writeln!(env.stdout(), "{text}")?;
        Ok(())
    })
    .unwrap();
}

#[test]
fn dispatch_to_handlers() {
    let mut app = Application::new("runtest", "testing commands");
    let mut foo = Command::new("foo", "does foo");
    say(&mut foo, "running foo");
    let mut bar = Command::new("bar", "does bar");
    say(&mut bar, "running bar");
    app.commands([foo, bar]).unwrap();

    expect![[r#"
        runtest: error: expected <command>
    "#]]
    .assert_eq(&run(&app, ""));
    expect![[r#"
        running foo
    "#]]
    .assert_eq(&run(&app, "foo"));
    expect![[r#"
        running bar
    "#]]
    .assert_eq(&run(&app, "bar"));
}

struct Nested {
    app: Application,
    a: Opt<String>,
    b: Opt<String>,
    c: Opt<String>,
    d: Opt<String>,
    shadow: Opt<String>,
}

fn nested() -> Nested {
    let a = Opt::string("a", "");
    let b = Opt::string("b", "");
    let c = Opt::string("c", "");
    let d = Opt::string("d", "");
    let shadow = Opt::string("shadow", "");

    let mut sub = Command::new("sub", "innermost");
    sub.flags([c.flag(), d.flag(), shadow.flag().long("b")]).unwrap();
    let mut cmd = Command::new("cmd", "middle");
    cmd.flags([b.flag()]).unwrap();
    cmd.commands([sub]).unwrap();

    let mut app = Application::new("prog", "root");
    app.flags([a.flag().default("A")]).unwrap();
    app.commands([cmd]).unwrap();
    Nested { app, a, b, c, d, shadow }
}

#[test]
fn nested_flags_resolve_through_ancestors() {
    let it = nested();
    let state = |resolved: &cmdtree::Resolved<'_>| {
        (resolved.name(), it.a.value(), it.b.value(), it.c.value(), it.d.value())
    };

    check(&it.app, state, "cmd --b B sub --c C --d D", expect![[r#"
        (
            "prog.cmd.sub",
            "A",
            "B",
            "C",
            "D",
        )
    "#]]);
    check(&it.app, state, "--a x cmd sub --a y", expect![[r#"
        (
            "prog.cmd.sub",
            "y",
            "",
            "",
            "",
        )
    "#]]);
    check(&it.app, state, "cmd", expect![[r#"
        (
            "prog.cmd",
            "A",
            "",
            "",
            "",
        )
    "#]]);
}

#[test]
fn innermost_flag_wins() {
    let it = nested();
    check(&it.app, |_| (it.b.value(), it.shadow.value()), "cmd sub --b inner", expect![[r#"
        (
            "",
            "inner",
        )
    "#]]);
    check(&it.app, |_| (it.b.value(), it.shadow.value()), "cmd --b outer sub", expect![[r#"
        (
            "outer",
            "",
        )
    "#]]);
}

#[test]
fn errors_name_the_command() {
    let it = nested();
    check(&it.app, |_| (), "cmd sub --zzz", expect![[r#"cmd.sub: unexpected flag: --zzz"#]]);
    check(&it.app, |_| (), "cmd nope", expect![[r#"cmd: unexpected argument: "nope""#]]);
    check(&it.app, |_| (), "cmd sub --c", expect![[r#"cmd.sub: --c: no argument provided"#]]);
    check(&it.app, |_| (), "nope", expect![[r#"unexpected argument: "nope""#]]);
    check(&it.app, |_| (), "sub", expect![[r#"unexpected argument: "sub""#]]);
}

#[test]
fn flags_do_not_leak_into_parents() {
    let it = nested();
    check(&it.app, |_| (), "--b B cmd", expect![[r#"unexpected flag: --b"#]]);
}

#[test]
fn positionals_come_before_subcommands() {
    let what = Opt::string("what", "");
    let mut take = Command::new("take", "");
    take.args([what.pos("what")]).unwrap();
    take.commands([Command::new("sub", "")]).unwrap();
    let mut app = Application::new("prog", "");
    app.commands([take]).unwrap();

    let state = |resolved: &cmdtree::Resolved<'_>| (resolved.name(), what.value());
    check(&app, state, "take sub", expect![[r#"
        (
            "prog.take",
            "sub",
        )
    "#]]);
    check(&app, state, "take x sub", expect![[r#"
        (
            "prog.take.sub",
            "x",
        )
    "#]]);
}

#[test]
fn suppressed_help() {
    let mut quiet = Command::new("quiet", "");
    quiet.suppress_help();
    let mut cmd = Command::new("cmd", "");
    cmd.commands([quiet]).unwrap();
    let mut app = Application::new("prog", "");
    app.commands([cmd]).unwrap();

    check(&app, |it| it.name(), "cmd -h quiet", expect![[r#"cmd.quiet: help requested"#]]);
    check(&app, |it| it.name(), "cmd quiet -h", expect![[r#"cmd.quiet: unexpected flag: -h"#]]);
    check(&app, |it| (it.name(), it.is_help()), "cmd -h", expect![[r#"
        (
            "prog.cmd",
            true,
        )
    "#]]);
}

#[test]
fn typed_handlers() {
    let name = Opt::string("name", "");
    let loud = Opt::toggle("loud", "");
    let mut greet = Command::new("greet", "");
    greet.flags([loud.flag()]).unwrap();
    greet.args([name.pos("name")]).unwrap();
    greet
        .runs(handler3(
            |_, env: &mut Environ, name: String, loud: bool, punct: String| {
                let greeting = format!("hello {name}{punct}");
                let greeting = if loud { greeting.to_uppercase() } else { greeting };
                writeln!(env.stdout(), "{greeting}")?;
                Ok(())
            },
            name.clone(),
            loud.clone(),
            Hardcoded("!".to_string()),
        ))
        .unwrap();

    let names = Opt::string("names", "");
    let mut each = Command::new("each", "");
    each.args([names.pos("name")]).unwrap();
    each.runs(handler2(
        |_, env: &mut Environ, names: Vec<String>, ok: bool| {
            for name in names {
                writeln!(env.stdout(), "- {name} {ok}")?;
            }
            Ok(())
        },
        names.slice(),
        Hardcoded(true),
    ))
    .unwrap();

    let mut nothing = Command::new("nothing", "");
    nothing.runs(handler0(|_, _| Ok(()))).unwrap();

    let mut app = Application::new("prog", "");
    app.commands([greet, each, nothing]).unwrap();

    expect![[r#"
        hello world!
    "#]]
    .assert_eq(&run(&app, "greet world"));
    expect![[r#"
        HELLO WORLD!
    "#]]
    .assert_eq(&run(&app, "greet --loud world"));
    expect![[r#"
        - one true
    "#]]
    .assert_eq(&run(&app, "each one"));
    expect![""].assert_eq(&run(&app, "nothing"));
}

#[test]
fn exit_codes() {
    let mut app = Application::new("prog", "");
    let mut fail = Command::new("fail", "");
    fail.runs(|_, _| Err(ExitError::new(3, "three")).context("failing")).unwrap();
    let mut plain = Command::new("plain", "");
    plain.runs(|_, _| anyhow::bail!("plain failure")).unwrap();
    app.commands([fail, plain]).unwrap();

    let mut env = Environ::default().with_args(argv("fail"));
    let err = app.main_env(&Context::new(), &mut env).unwrap_err();
    assert_eq!(exit_code(&err), 3);
    let mut out = Buffer::default();
    app.ferror(&mut out, &err);
    expect![[r#"
        prog: error: failing: three
    "#]]
    .assert_eq(&out.contents());

    let mut env = Environ::default().with_args(argv("plain"));
    let err = app.main_env(&Context::new(), &mut env).unwrap_err();
    assert_eq!(exit_code(&err), 1);

    let mut env = Environ::default().with_args(argv("--nope"));
    let err = app.main_env(&Context::new(), &mut env).unwrap_err();
    assert_eq!(exit_code(&err), 1);
    assert!(err.downcast_ref::<cmdtree::ParseError>().is_some());
}

#[test]
fn missing_program_name() {
    let app = Application::new("prog", "");
    let err = app.parse::<&str>(&[]).unwrap_err();
    assert_eq!(err.to_string(), "program name: missing");
}

#[test]
fn handlers_see_the_environ_and_context() {
    let mut app = Application::new("prog", "");
    app.runs(|ctx, env| {
        let home = env.getenv("HOME");
        let missing = env.lookup_env("MISSING");
        writeln!(env.stdout(), "{home} {missing:?} {}", ctx.is_cancelled())?;
        Ok(())
    })
    .unwrap();

    let stdout = Buffer::default();
    let mut env = Environ::default()
        .with_args(argv(""))
        .with_stdout(stdout.clone())
        .with_env(|key| (key == "HOME").then(|| "/home/me".to_string()));

    let ctx = Context::new();
    let child = ctx.child();
    ctx.cancel();
    app.main_env(&child, &mut env).unwrap();
    expect![[r#"
        /home/me None true
    "#]]
    .assert_eq(&stdout.contents());
}

#[test]
fn context_shares_the_callers_token() {
    let token = CancellationToken::new();
    let ctx = Context::with_token(token.clone());
    let child = ctx.child();
    assert!(!ctx.token().is_cancelled());

    token.cancel();
    assert!(ctx.is_cancelled());
    assert!(ctx.token().is_cancelled());
    assert!(child.is_cancelled());

    let ctx = Context::new();
    let child = ctx.child();
    child.cancel();
    assert!(!ctx.is_cancelled());
}

#[test]
fn configuration_errors() {
    let mut app = Application::new("prog", "");
    app.commands([]).unwrap();
    let err = app.commands([Command::new("late", "")]).unwrap_err();
    assert_eq!(err.to_string(), "prog commands: already set");
}
