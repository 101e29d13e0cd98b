use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use symtex::{Execution, Notice, ResourceLimits, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "symtex")]
#[command(about = "Symbolic mathematics over displayed-math markup.")]
#[command(
    long_about = "Symtex parses LaTeX-style formulas into a term graph, normalizes them with a rewriting calculator, and answers logical queries with a resolution engine.\nThe CLI evaluates expressions from arguments, script files or an interactive prompt."
)]
#[command(version)]
struct Cli {
    /// Print each execution as one JSON object instead of markup lines
    #[arg(long, global = true)]
    json: bool,
    /// Cap on resolution search steps per query
    #[arg(long, global = true)]
    search_steps: Option<usize>,
    /// Cap on normalization passes per expression
    #[arg(long, global = true)]
    rewrite_passes: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate expressions given on the command line, in order
    ///
    /// Rule declarations and control commands carry over between
    /// expressions, so a single invocation can declare rules and then
    /// query them.
    Eval {
        /// Expressions in displayed-math markup
        #[arg(value_name = "EXPR", required = true)]
        exprs: Vec<String>,
    },
    /// Evaluate a script file, one expression per line
    ///
    /// Blank lines and lines starting with '%' are skipped.
    Run {
        /// Path to the script file
        file: PathBuf,
    },
    /// Read expressions interactively from standard input
    Repl,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    let mut limits = ResourceLimits::default();
    if let Some(steps) = cli.search_steps {
        limits.max_search_steps = steps;
    }
    if let Some(passes) = cli.rewrite_passes {
        limits.max_rewrite_passes = passes;
    }
    tracing::debug!(?limits, "starting session");
    let mut session = Session::new(limits)?;
    match cli.command {
        Commands::Eval { exprs } => {
            for expr in &exprs {
                let exec = session.exec(expr)?;
                print_execution(&exec, cli.json)?;
            }
        }
        Commands::Run { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            for line in text.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('%') {
                    continue;
                }
                let exec = session
                    .exec(line)
                    .with_context(|| format!("evaluating '{line}'"))?;
                print_execution(&exec, cli.json)?;
            }
        }
        Commands::Repl => repl(&mut session, cli.json)?,
    }
    Ok(())
}

fn repl(session: &mut Session, json: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    if !json {
        println!("symtex {} (type 'quit' to leave)", env!("CARGO_PKG_VERSION"));
    }
    loop {
        if !json {
            write!(stdout, "symtex> ")?;
            stdout.flush()?;
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            return Ok(());
        }
        match session.exec(line) {
            Ok(exec) => print_execution(&exec, json)?,
            Err(e) => eprintln!("error: {e}"),
        }
    }
}

fn print_execution(exec: &Execution, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(exec)?);
        return Ok(());
    }
    for notice in &exec.notices {
        match notice {
            Notice::Formula(s) | Notice::Info(s) => println!("  {s}"),
            Notice::Bindings(rows) => {
                for (name, value) in rows {
                    println!("  {name} = {value}");
                }
            }
            Notice::Trace { pass, formula } => println!("  [{pass}] {formula}"),
        }
    }
    if let Some(r) = &exec.rendered {
        println!("[{}] {}", exec.index, r);
    }
    Ok(())
}
