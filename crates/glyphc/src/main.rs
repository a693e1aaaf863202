use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

/// glyphc — compiler for a small expression-oriented language.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Compile and interpret `path`, printing the result to stdout.
    Run { path: PathBuf },
    /// Compile `path` to x86 assembly and, unless `--no-link`, assemble it.
    Build {
        path: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_link: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Mode::Run { path } => run(&path),
        Mode::Build { path, output, no_link } => build(&path, output, no_link),
    }
}

fn read_source(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn report_errors(path: &PathBuf, errors: &[glyphc::diagnostics::CompileError]) -> Result<()> {
    for err in errors {
        eprintln!("{}: {err}", path.display());
    }
    bail!("{} error(s) in {}", errors.len(), path.display())
}

fn run(path: &PathBuf) -> Result<()> {
    let source = read_source(path)?;
    info!(path = %path.display(), "compiling for interpretation");
    let mut compilation = glyphc::compile_core(&source);
    if !compilation.errors.is_empty() {
        return report_errors(path, &compilation.errors);
    }
    debug!(blocks = compilation.program.block_ids().count(), "running interpreter");
    let result = glyphc::interp::run(&mut compilation.program, compilation.entry);
    println!("{result}");
    Ok(())
}

fn build(path: &PathBuf, output: Option<PathBuf>, no_link: bool) -> Result<()> {
    let source = read_source(path)?;
    info!(path = %path.display(), "compiling for emission");
    let compilation = glyphc::compile(&source);
    if !compilation.errors.is_empty() {
        return report_errors(path, &compilation.errors);
    }

    let asm_path = path.with_extension("s");
    let asm = glyphc::emit::emit(&compilation.program, compilation.entry);
    std::fs::write(&asm_path, &asm).with_context(|| format!("failed to write {}", asm_path.display()))?;
    info!(path = %asm_path.display(), "wrote assembly");

    if no_link {
        return Ok(());
    }

    let output_path = output.unwrap_or_else(|| path.with_extension(""));
    debug!(cc = "gcc", "linking");
    let status = Command::new("gcc")
        .args(["-nostdlib", asm_path.to_str().expect("utf-8 path")])
        .arg("-o")
        .arg(&output_path)
        .status()
        .context("failed to spawn gcc")?;
    if !status.success() {
        bail!("gcc exited with {status}");
    }
    info!(path = %output_path.display(), "wrote executable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_subcommand_parses_path() {
        let cli = Cli::parse_from(["glyphc", "run", "program.gly"]);
        assert!(matches!(cli.command, Mode::Run { path } if path == PathBuf::from("program.gly")));
    }

    #[test]
    fn build_subcommand_defaults_no_link_false() {
        let cli = Cli::parse_from(["glyphc", "build", "program.gly"]);
        let Mode::Build { no_link, output, .. } = cli.command else { panic!("expected build") };
        assert!(!no_link);
        assert!(output.is_none());
    }
}
