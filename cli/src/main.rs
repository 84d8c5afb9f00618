use std::path::{Path, PathBuf};

use argspec_core::{CommandSpec, ParserConfig};
use argspec_loader::{CommandDecl, SpecLibrary, load_command};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status for a token stream the declared command rejects.
const PARSE_ERROR_EXIT: i32 = 2;

/// Log filter selected by `parse --trace`.
const TRACE_FILTER: &str = "argspec_core=debug,argspec_loader=debug,argspec=debug";

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argspec")]
#[command(about = "Parse command lines against declared option and positional specs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse tokens against a declaration and print the bound values.
    Parse(ParseArgs),
    /// Print the fully resolved specs of a declaration.
    Resolve(ResolveArgs),
    /// Validate declaration files or directories of declarations.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Declaration file (.json, .yaml or .yml).
    #[arg(long)]
    spec: PathBuf,
    /// Collect unknown options and surplus positionals instead of failing.
    #[arg(long)]
    allow_unmatched: bool,
    /// Log each parsing decision to stderr.
    #[arg(long)]
    trace: bool,
    /// Output format.
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
    /// Tokens to parse, given after `--`.
    #[arg(last = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Declaration file (.json, .yaml or .yml).
    #[arg(long)]
    spec: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Declaration files and/or directories containing declarations.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

/// A failed run: message for stderr plus exit status.
#[derive(Debug)]
struct Failure {
    code: i32,
    message: String,
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self { code: 1, message }
    }
}

#[derive(Serialize)]
struct ParseReport<'a> {
    command: &'a str,
    #[serde(flatten)]
    result: &'a argspec_core::ParseResult,
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(&cli.command, Command::Parse(args) if args.trace);
    init_tracing(trace);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Resolve(args) => run_resolve(args).map_err(Failure::from),
        Command::Check(args) => run_check(args).map_err(Failure::from),
    };

    if let Err(failure) = result {
        eprintln!("error: {}", failure.message);
        std::process::exit(failure.code);
    }
}

fn init_tracing(trace: bool) {
    let filter = if trace {
        EnvFilter::new(TRACE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_parse(args: ParseArgs) -> Result<(), Failure> {
    let decl = load_decl(&args.spec)?;
    let mut spec = build_spec(&decl)?;

    let config = ParserConfig {
        unmatched_allowed: decl.parser.unmatched_allowed || args.allow_unmatched,
        trace: decl.parser.trace || args.trace,
        ..decl.parser
    };
    debug!(command = spec.name(), tokens = args.tokens.len(), "Parsing tokens");

    let result = argspec_core::Parser::new(config)
        .parse(&mut spec, &args.tokens)
        .map_err(|err| Failure {
            code: PARSE_ERROR_EXIT,
            message: err.to_string(),
        })?;

    let report = ParseReport {
        command: spec.name(),
        result: &result,
    };
    println!("{}", render(&report, args.format)?);
    Ok(())
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let decl = load_decl(&args.spec)?;
    let spec = build_spec(&decl)?;
    println!("{}", render(&spec, args.format)?);
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let mut specs: Vec<CommandSpec> = Vec::new();

    for input in &args.inputs {
        if input.is_dir() {
            let library = SpecLibrary::from_dir(input)
                .map_err(|err| format!("Failed to load '{}': {err}", input.display()))?;
            let mut names: Vec<&str> = library.commands().collect();
            names.sort_unstable();
            for name in names {
                specs.push(library.build(name).map_err(|err| err.to_string())?);
            }
        } else {
            let decl = load_decl(input)?;
            specs.push(build_spec(&decl)?);
        }
    }

    let options: usize = specs.iter().map(|spec| spec.options().count()).sum();
    let positionals: usize = specs.iter().map(|spec| spec.positionals().count()).sum();
    println!(
        "Checked {} declaration(s): {options} option(s), {positionals} positional(s).",
        specs.len()
    );
    Ok(())
}

fn load_decl(path: &Path) -> Result<CommandDecl, String> {
    load_command(path).map_err(|err| format!("Failed to load '{}': {err}", path.display()))
}

fn build_spec(decl: &CommandDecl) -> Result<CommandSpec, String> {
    decl.to_command_spec().map_err(|err| err.to_string())
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| format!("Failed to serialize output: {err}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|err| format!("Failed to serialize output: {err}"))
        }
    }
}
