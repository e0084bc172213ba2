mod report;

use clap::Parser;
use doty_diag::Diagnostic;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "doty", about = "Check a doty hardware description file")]
struct Cli {
    /// Path to the .doty source file
    input: PathBuf,

    /// Dump lexed tokens and exit
    #[arg(long, group = "dump")]
    dump_tokens: bool,

    /// Dump parsed syntax and exit
    #[arg(long, group = "dump")]
    dump_ast: bool,

    /// Dump syntax with resolved names and exit
    #[arg(long, group = "dump")]
    dump_resolved: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn read_file(file: &Path) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let diag = Diagnostic::error(format!("unable to open file: {}: {}", file.display(), e));
            eprintln!("{}", diag);
            std::process::exit(1);
        }
    }
}

/// Run the pipeline up to the stage selected by the dump flags.
fn run(cli: &Cli, source: &str) -> Result<(), Diagnostic> {
    if cli.dump_tokens {
        let tokens = doty_lexer::lex(source).map_err(report::lex_error)?;
        for (token, span) in &tokens {
            println!("- {}: `{}`", token.kind_name(), span.slice(source));
        }
        return Ok(());
    }

    let ast = doty_parser::parse(source).map_err(report::parse_error)?;
    debug!(items = ast.items.len(), nodes = ast.nodes.len(), "parsed");
    if cli.dump_ast {
        println!("{}", doty_ast::dump(&ast, None));
        return Ok(());
    }

    let bindings = doty_names::resolve(&ast).map_err(report::resolve_error)?;
    debug!(bindings = bindings.len(), "names resolved");
    if cli.dump_resolved {
        println!("{}", doty_ast::dump(&ast, Some(&bindings)));
        return Ok(());
    }

    let result = doty_typeck::check(&ast, &bindings).map_err(report::type_error)?;
    for module in &result.modules {
        println!("{}", module);
    }
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let source = read_file(&cli.input);
    if let Err(diag) = run(&cli, &source) {
        let path = cli.input.display().to_string();
        eprintln!("{}", doty_diag::render(&path, &source, &diag));
        std::process::exit(1);
    }
}
