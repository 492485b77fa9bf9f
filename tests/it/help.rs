use cmdtree::{Application, Command, Many, NamedValue, Opt};
use expect_test::expect;

use crate::run;

fn parquet() -> Application {
    let mut app = Application::new("pq", "Inspect and reshape parquet files.");

    let rows = Opt::<u64>::uint("rows", "Limit the number of rows.");
    let format = Opt::one_name_of(
        "format",
        "Output format.",
        vec![NamedValue::new("csv", 0), NamedValue::new("json", 1)],
    );
    let filter = Opt::string("filter", "Keep rows matching an expression.");
    let file = Opt::file("file", "Parquet file to read.");
    let mut cat = Command::new("cat", "Print rows.");
    cat.flags([
        rows.flag().short('n').hint("N"),
        format.flag().default("csv"),
        filter.flag().short('f'),
    ])
    .unwrap();
    cat.args([file.pos("file")]).unwrap();
    cat.runs(|_, _| Ok(())).unwrap();

    let files = Many::files("files", "Parquet files.");
    let mut schema = Command::new("schema", "Print the schema of each file.");
    schema.args([files.rest("files")]).unwrap();
    schema.runs(|_, _| Ok(())).unwrap();

    let mut filters = Command::new("filters", "How filter expressions work.");
    filters
        .details_for(
            "A filter is a boolean expression over column names, literals and the usual \
             comparison operators. Rows for which the expression is false are dropped.\n\
             \n\
             \x20 pq cat -f 'age > 30' people.parquet\n",
            [filter.bindable()],
        )
        .unwrap();
    filters.runs(|_, _| Ok(())).unwrap();
    let mut help = Command::new("help", "Topics.");
    help.commands([filters]).unwrap();

    app.commands([cat, schema, help]).unwrap();
    app
}

#[test]
fn root_help() {
    let app = parquet();
    expect![[r#"
        Usage: pq <command> [flags]

        Inspect and reshape parquet files.

        Flags:
          -h, --help    Show context-sensitive help.

        Commands:
          cat       Print rows.
          schema    Print the schema of each file.
          help      Topics.

        Run "pq <command> --help" for more information on a command.
    "#]]
    .assert_eq(&run(&app, "--help"));
}

#[test]
fn command_help() {
    let app = parquet();
    let want = expect![[r#"
        Usage: pq cat [flags] <file>

        Print rows.

        Arguments:
          <file>    Parquet file to read.

        Flags:
          -h, --help          Show context-sensitive help.
          -n, --rows=N        Limit the number of rows.
              --format=csv    Output format.
          -f, --filter        Keep rows matching an expression.
                              (See pq filters --help)
    "#]];
    want.assert_eq(&run(&app, "cat -h"));
    want.assert_eq(&run(&app, "cat --rows 3 --help"));
}

#[test]
fn nested_help_with_details() {
    let app = parquet();
    expect![[r#"
        Usage: pq help filters

        How filter expressions work.

        A filter is a boolean expression over column names, literals and the usual
        comparison operators. Rows for which the expression is false are dropped.

            pq cat -f 'age > 30' people.parquet

        Flags:
          -h, --help    Show context-sensitive help.
    "#]]
    .assert_eq(&run(&app, "help filters --help"));

    expect![[r#"
        Usage: pq help <command>

        Topics.

        Flags:
          -h, --help    Show context-sensitive help.

        Commands:
          filters    How filter expressions work.

        Run "pq help <command> --help" for more information on a command.
    "#]]
    .assert_eq(&run(&app, "help -h"));
}

#[test]
fn usage_accompanies_argument_errors() {
    let app = parquet();
    expect![[r#"
        Usage: pq schema <files> ...

        Print the schema of each file.

        Arguments:
          <files> ...    Parquet files.

        Flags:
          -h, --help    Show context-sensitive help.
        pq: error: schema: expected "<files> ...""#]]
    .assert_eq(run(&app, "schema").trim_end());

    expect![[r#"
        Usage: pq cat [flags] <file>

        Print rows.

        Arguments:
          <file>    Parquet file to read.

        Flags:
          -h, --help          Show context-sensitive help.
          -n, --rows=N        Limit the number of rows.
              --format=csv    Output format.
          -f, --filter        Keep rows matching an expression.
                              (See pq filters --help)
        pq: error: cat: unexpected argument: "b.parquet""#]]
    .assert_eq(run(&app, "cat a.parquet b.parquet").trim_end());
}

#[test]
fn other_errors_print_no_usage() {
    let app = parquet();
    expect![[r#"
        pq: error: cat: unexpected flag: --rowz
    "#]]
    .assert_eq(&run(&app, "cat --rowz 3 a.parquet"));
    expect![[r#"
        pq: error: cat: --format: "xml" not one of "csv", "json"
    "#]]
    .assert_eq(&run(&app, "cat --format xml a.parquet"));
    expect![[r#"
        pq: error: help: expected <command>
    "#]]
    .assert_eq(&run(&app, "help"));
}
