//! `kstory-export` CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kstory_export::{
    Encoding, ExportError, ExportFormat, ExportOptions, default_output_path, export_file,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Export story scripts to JSON or MessagePack.
#[derive(Parser, Debug)]
#[command(name = "kstory-export", author, version, about)]
struct Cli {
    /// Story script to export
    input: PathBuf,

    /// Output file (defaults to the input with a .json or .msgpack extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep source positions on every node and issue
    #[arg(short, long)]
    full: bool,

    /// Indent JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Write MessagePack instead of JSON
    #[arg(long)]
    msgpack: bool,

    /// Fail if the story has any error-level issue
    #[arg(long)]
    strict: bool,

    /// Run the validator and include its issues
    #[arg(long)]
    validate: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<&Cli> for ExportOptions {
    fn from(cli: &Cli) -> Self {
        let format = if cli.full {
            ExportFormat::Full
        } else {
            ExportFormat::Simple
        };
        let encoding = if cli.msgpack {
            Encoding::MessagePack
        } else {
            Encoding::Json
        };
        Self::new()
            .with_format(format)
            .with_encoding(encoding)
            .with_pretty(cli.pretty)
            .with_strict(cli.strict)
            .with_validation(cli.validate)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), ExportError> {
    let options = ExportOptions::from(cli);
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, options.encoding));

    let summary = export_file(&cli.input, &output, &options)?;
    if summary.errors > 0 || summary.warnings > 0 {
        eprintln!(
            "\x1b[33m{} error(s), {} warning(s)\x1b[0m",
            summary.errors, summary.warnings
        );
    }
    println!(
        "Exported {} section(s) to {} ({} bytes)",
        summary.sections,
        output.display(),
        summary.bytes
    );
    Ok(())
}
