
use std::time::Instant;

use xshell::{cmd, Shell};

fn main() -> xshell::Result<()> {
    let sh = Shell::new()?;

    cmd!(sh, "rustup toolchain install stable --no-self-update").run()?;
    let _e = sh.push_env("RUSTUP_TOOLCHAIN", "stable");
    cmd!(sh, "rustc --version").run()?;

    build(&sh)?;
    test(&sh)?;
    publish(&sh)?;
    Ok(())
}

fn build(sh: &Shell) -> xshell::Result<()> {
    let _s = section("BUILD");
    cmd!(sh, "cargo test --workspace --no-run").run()?;
    cmd!(sh, "cargo build --examples").run()
}

fn test(sh: &Shell) -> xshell::Result<()> {
    let _s = section("TEST");
    cmd!(sh, "cargo test --workspace -- --nocapture").run()
}

/// Tags and publishes `cmdtree` from master when its version has no tag yet.
fn publish(sh: &Shell) -> xshell::Result<()> {
    let _s = section("PUBLISH");

    let pkgid = cmd!(sh, "cargo pkgid -p cmdtree").read()?;
    let version = version_of(&pkgid);
    let tag = format!("v{version}");

    let current_branch = cmd!(sh, "git branch --show-current").read()?;
    let tag_exists =
        cmd!(sh, "git tag --list").read()?.split_ascii_whitespace().any(|it| it == tag);
    if current_branch != "master" || tag_exists {
        eprintln!("not publishing {tag} from {current_branch}");
        return Ok(());
    }

    cmd!(sh, "git tag {tag}").run()?;
    cmd!(sh, "cargo publish -p cmdtree").run()?;
    cmd!(sh, "git push --tags").run()
}

/// `path+file:///w#cmdtree@0.1.0` and `file:///w/cmdtree#0.1.0` both give
/// `0.1.0`.
fn version_of(pkgid: &str) -> &str {
    pkgid.trim().rsplit(['#', '@']).next().unwrap_or_default()
}

fn section(name: &'static str) -> impl Drop {
    println!("::group::{name}");
    let start = Instant::now();
    defer(move || {
        let elapsed = start.elapsed();
        eprintln!("{name}: {elapsed:.2?}");
        println!("::endgroup::");
    })
}

fn defer<F: FnOnce()>(f: F) -> impl Drop {
    struct D<F: FnOnce()>(Option<F>);
    impl<F: FnOnce()> Drop for D<F> {
        fn drop(&mut self) {
            if let Some(f) = self.0.take() {
                f()
            }
        }
    }
    D(Some(f))
}

#[test]
fn pkgid_versions() {
    assert_eq!(version_of("path+file:///w#cmdtree@0.1.0\n"), "0.1.0");
    assert_eq!(version_of("file:///w/cmdtree#0.1.0"), "0.1.0");
}
