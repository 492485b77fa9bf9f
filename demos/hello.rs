use std::io::Write;

use cmdtree::{handler2, Application, Context, Environ, Opt};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("CMDTREE_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let mut app = Application::new("hello", "Greets someone.");
    let name = Opt::string("name", "Who to greet.");
    let times = Opt::<u32>::uint("times", "How many times.").validate(|&n| {
        if n == 0 {
            return Err("must be positive".to_string());
        }
        Ok(())
    });
    app.flags([times.flag().short('n').hint("N").default("1")]).unwrap();
    app.args([name.pos("name")]).unwrap();
    app.runs(handler2(
        |_, env: &mut Environ, name: String, times: u32| {
            for _ in 0..times {
                writeln!(env.stdout(), "hello, {name}")?;
            }
            Ok(())
        },
        name,
        times,
    ))
    .unwrap();

    std::process::exit(app.main(&Context::new()))
}
