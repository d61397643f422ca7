//! Command-line front end for amble_syntax.
//!
//! `amble_syntax check data/` parses every `.amble` file below `data/` and prints
//! diagnostics; `dump` and `tokens` show the typed AST or token stream of one file.

use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use amble_syntax::{
    ParseOptions,
    config::DEFAULT_CONFIG_FILE,
    lexer::tokenize,
    parse_source_with,
    report::{render_error, render_lint},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Parse and check Amble world sources.")]
struct Cli {
    /// Parse options file (TOML). Defaults to ./amble_syntax.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse files or directories of .amble sources and report problems.
    Check {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
        /// Exit non-zero on warnings as well as errors.
        #[arg(long)]
        deny_warnings: bool,
    },
    /// Print the typed AST of one file.
    Dump {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Print the significant tokens of one file, one per line.
    Tokens { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Ron,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let options = match &cli.config {
        Some(path) => ParseOptions::load(path)?,
        None => ParseOptions::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    debug!("parse options: {options:?}");

    match cli.command {
        Commands::Check { paths, deny_warnings } => {
            let (errors, warnings) = run_check(&paths, &options)?;
            if errors > 0 || (deny_warnings && warnings > 0) {
                process::exit(1);
            }
        },
        Commands::Dump { file, format } => run_dump(&file, format, &options)?,
        Commands::Tokens { file } => run_tokens(&file)?,
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Expand directories into the `.amble` files beneath them, sorted for stable output.
fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry.with_context(|| format!("walking {}", path.display()))?;
                if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "amble") {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    Ok(files)
}

fn run_check(paths: &[PathBuf], options: &ParseOptions) -> Result<(usize, usize)> {
    let files = collect_sources(paths)?;
    let (mut errors, mut warnings) = (0, 0);
    for file in &files {
        let src = read_source(file)?;
        let name = file.display().to_string();
        let outcome = parse_source_with(&src, options);
        for err in &outcome.errors {
            eprintln!("{}", render_error(&name, &src, err));
        }
        for lint in &outcome.warnings {
            eprintln!("{}", render_lint(&name, &src, lint));
        }
        errors += outcome.errors.len();
        warnings += outcome.warnings.len();
        if let Some(parsed) = &outcome.file {
            debug!("{name}: {} definitions", parsed.definitions.len());
        }
    }
    info!("checked {} file(s): {errors} error(s), {warnings} warning(s)", files.len());
    println!("{} file(s) checked: {errors} error(s), {warnings} warning(s)", files.len());
    Ok((errors, warnings))
}

fn run_dump(path: &Path, format: Format, options: &ParseOptions) -> Result<()> {
    let src = read_source(path)?;
    let name = path.display().to_string();
    let outcome = parse_source_with(&src, options);
    for err in &outcome.errors {
        eprintln!("{}", render_error(&name, &src, err));
    }
    let Some(file) = outcome.file else {
        process::exit(1);
    };
    let text = match format {
        Format::Json => serde_json::to_string_pretty(&file).context("serializing AST to JSON")?,
        Format::Ron => {
            ron::ser::to_string_pretty(&file, ron::ser::PrettyConfig::default()).context("serializing AST to RON")?
        },
    };
    println!("{text}");
    if !outcome.errors.is_empty() {
        process::exit(1);
    }
    Ok(())
}

fn run_tokens(path: &Path) -> Result<()> {
    let src = read_source(path)?;
    match tokenize(&src) {
        Ok(tokens) => {
            for token in tokens.iter().filter(|t| !t.is_trivia()) {
                println!("{:>4}:{:<3} {token}", token.span.line, token.span.column);
            }
            Ok(())
        },
        Err(err) => {
            eprintln!("{}", render_error(&path.display().to_string(), &src, &err.into()));
            process::exit(1);
        },
    }
}
