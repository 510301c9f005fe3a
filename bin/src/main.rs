use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
};

use clap::Parser;
use itertools::Itertools;

/// Scans and parses lox expressions, printing the syntax tree.
#[derive(clap::Parser)]
struct Args {
    /// Source file. Reads one expression per line from stdin when omitted.
    file: Option<PathBuf>,

    /// Print the scanned tokens instead of the syntax tree.
    #[arg(long)]
    tokens: bool,
}

fn run_file(path: PathBuf, args: &Args) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)?;
    run(&source, args, &mut stdout())
}

fn run_prompt(args: &Args) -> anyhow::Result<()> {
    loop {
        print!("> ");
        stdout().flush()?;
        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            return Ok(());
        }
        if let Err(e) = run_line(&line, args, &mut stdout()) {
            eprintln!("{e}");
        }
    }
}

/// Runs one prompt line. The line ending is not part of the expression.
fn run_line(line: &str, args: &Args, out: &mut impl Write) -> anyhow::Result<()> {
    run(line.trim_end_matches(['\r', '\n']), args, out)
}

fn run(source: &str, args: &Args, out: &mut impl Write) -> anyhow::Result<()> {
    if args.tokens {
        let scan = scanner::scan(source);
        writeln!(out, "{}", scan.tokens.iter().map(|t| format!("{:>4} {t}", t.line.0)).join("\n"))?;
        return Ok(scan.into_result().map(|_| ())?);
    }

    let expr = parser::parse_source(source)?;
    writeln!(out, "{expr}")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match &args.file {
        Some(file) => run_file(file.clone(), &args),
        None => run_prompt(&args),
    }
}
