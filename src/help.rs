//! Usage text for a command.
//!
//! Rendering only reads command metadata; it never touches option values.

use std::{fmt::Write as _, io};

use crate::{command::Command, CommandPath, Resolved};

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

const DETAIL_WIDTH: usize = 80;
const CODE_PREFIX: &str = "    ";

/// Writes the usage of the command `resolved` ended at.
pub fn write_usage(w: &mut dyn io::Write, resolved: &Resolved<'_>) -> io::Result<()> {
    w.write_all(render(&resolved.path()).as_bytes())
}

/// Usage of the command `path` names below `root`, if it exists.
pub fn usage_for(root: &Command, path: &CommandPath) -> Option<String> {
    let mut cmds = vec![root];
    for name in path.names() {
        let parent = cmds[cmds.len() - 1];
        cmds.push(parent.lookup_cmd(name)?);
    }
    Some(render(&cmds))
}

/// `path` runs from the root to the command being described.
pub(crate) fn render(path: &[&Command]) -> String {
    let mut buf = String::new();
    let Some((&cmd, parents)) = path.split_last() else { return buf };
    let is_root = parents.is_empty();
    let program = path[0].name.as_str();
    let below_root = path[1..].iter().map(|it| it.name.as_str()).collect::<Vec<_>>();

    let mut usage = vec!["Usage:", program];
    usage.extend(&below_root);
    if !cmd.cmds.is_empty() {
        usage.push("<command>");
    }
    if !cmd.flags.is_empty() || (is_root && !cmd.cmds.is_empty()) {
        usage.push("[flags]");
    }
    let args = cmd.args.iter().map(|it| it.describe()).collect::<Vec<_>>();
    usage.extend(args.iter().map(String::as_str));
    w!(buf, "{}\n", usage.join(" "));

    if !cmd.desc.is_empty() {
        w!(buf, "\n{}\n", cmd.desc);
    }
    if !cmd.detail.is_empty() {
        buf.push('\n');
        reflow(&mut buf, &cmd.detail);
    }

    if !cmd.args.is_empty() {
        let mut table = Table::new("Arguments:");
        for arg in &cmd.args {
            table.add(arg.describe(), arg.description());
        }
        table.write(&mut buf);
    }

    if !cmd.flags.is_empty() || !cmd.no_help {
        let help_row = !cmd.no_help;
        let any_both = cmd.flags.iter().any(|it| it.short.is_some() && it.long.is_some());
        let mut table = Table::new("Flags:");
        table.max = 22;
        if help_row {
            table.add("-h, --help".to_string(), "Show context-sensitive help.".to_string());
        }
        for flag in &cmd.flags {
            let mut name = flag.names();
            if (any_both || help_row) && flag.short.is_none() {
                name.insert_str(0, "    ");
            }
            if let Some(default) = &flag.default {
                w!(name, "={}", default.shown);
            } else if let Some(hint) = &flag.hint {
                w!(name, "={hint}");
            }
            table.add(name, flag.option.description());
            for see in flag.option.see_also() {
                table.add(String::new(), format!("(See {program} {see} --help)"));
            }
        }
        table.write(&mut buf);
    }

    if !cmd.cmds.is_empty() {
        let mut table = Table::new("Commands:");
        for child in &cmd.cmds {
            table.add(child.name.clone(), child.desc.clone());
        }
        table.write(&mut buf);

        let mut run = vec![program];
        run.extend(&below_root);
        w!(buf, "\nRun \"{} <command> --help\" for more information on a command.\n", run.join(" "));
    }

    buf
}

/// Fills paragraphs to [`DETAIL_WIDTH`]; indented lines are code and are
/// kept as they are, shifted to [`CODE_PREFIX`].
fn reflow(buf: &mut String, text: &str) {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut code = false;
    let mut prev_blank = true;
    for line in text.lines() {
        if line.trim().is_empty() {
            prev_blank = true;
            continue;
        }
        let is_code = line.starts_with(char::is_whitespace);
        if prev_blank || is_code != code {
            blocks.push(Vec::new());
            code = is_code;
        }
        prev_blank = false;
        if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }

    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        if block.first().is_some_and(|it| it.starts_with(char::is_whitespace)) {
            let indent = block.iter().map(|it| ascii_indent(it)).min().unwrap_or(0);
            for line in block {
                w!(buf, "{CODE_PREFIX}{}\n", line[indent..].trim_end());
            }
        } else {
            fill(buf, block.iter().flat_map(|it| it.split_whitespace()));
        }
    }
}

/// Leading spaces and tabs, in bytes; always a char boundary.
fn ascii_indent(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn fill<'a>(buf: &mut String, words: impl Iterator<Item = &'a str>) {
    let mut width = 0;
    for word in words {
        let len = word.chars().count();
        if width > 0 && width + 1 + len > DETAIL_WIDTH {
            buf.push('\n');
            width = 0;
        }
        if width > 0 {
            buf.push(' ');
            width += 1;
        }
        buf.push_str(word);
        width += len;
    }
    buf.push('\n');
}

struct Table {
    name: &'static str,
    rows: Vec<(String, String)>,
    min: usize,
    max: usize,
    pad: usize,
}

impl Table {
    fn new(name: &'static str) -> Table {
        Table { name, rows: Vec::new(), min: 6, max: 12, pad: 3 }
    }

    fn add(&mut self, name: String, desc: String) {
        self.rows.push((name, desc));
    }

    fn write(&self, buf: &mut String) {
        let longest = self
            .rows
            .iter()
            .map(|(name, _)| name.chars().count())
            .fold(self.min, usize::max)
            .min(self.max);
        let width = longest + self.pad;

        w!(buf, "\n{}\n", self.name);
        for (name, desc) in &self.rows {
            let line = if name.chars().count() > longest {
                format!("  {name}\n  {:width$} {desc}", "")
            } else {
                format!("  {name:width$} {desc}")
            };
            for line in line.lines() {
                w!(buf, "{}\n", line.trim_end());
            }
        }
    }
}
