use std::{
    fs,
    io::{BufRead, BufReader, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use cmdtree::{handler2, Application, Command, Context, Environ, Many, Opt};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("CMDTREE_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let mut app = Application::new("cat", "Concatenates files.");
    app.allow_group_short_flags(true);

    let number = Opt::toggle("number", "Number output lines.");
    let files = Many::files("files", "Files to read, `-` for stdin.");
    let mut print = Command::new("print", "Print the files.");
    print.flags([number.flag().short('n')]).unwrap();
    print.args([files.rest("files")]).unwrap();
    print.runs(handler2(run_print, files.clone(), number)).unwrap();

    let mut count = Command::new("count", "Count lines in the files.");
    count.args([files.rest("files")]).unwrap();
    count
        .runs(move |ctx, env| {
            let mut total = 0;
            for path in files.value() {
                if ctx.is_cancelled() {
                    break;
                }
                total += read(env, &path)?.lines().count();
            }
            writeln!(env.stdout(), "{total}")?;
            Ok(())
        })
        .unwrap();

    app.commands([print, count]).unwrap();
    std::process::exit(app.main(&Context::new()))
}

fn run_print(
    ctx: &Context,
    env: &mut Environ,
    files: Vec<PathBuf>,
    number: bool,
) -> anyhow::Result<()> {
    let mut line_no = 0;
    for path in files {
        let text = read(env, &path)?;
        for line in BufReader::new(text.as_bytes()).lines() {
            if ctx.is_cancelled() {
                return Ok(());
            }
            let line = line?;
            line_no += 1;
            if number {
                writeln!(env.stdout(), "{line_no:6}\t{line}")?;
            } else {
                writeln!(env.stdout(), "{line}")?;
            }
        }
    }
    Ok(())
}

fn read(env: &mut Environ, path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        env.stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
