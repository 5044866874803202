mod io;
mod parser;
mod state;
mod types;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Convert the GODEBUG=gctrace=1 output of a Go program, read from stdin, into a CSV table.
///
/// Example: GODEBUG=gctrace=1 ./server 2>&1 >/dev/null | gctrace_csv --csv gc.csv
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// CSV output file, or "-" for stdout
    #[arg(long, value_name = "PATH", default_value = "data.csv")]
    csv: PathBuf,

    /// Log every row written
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors (skipped lines are not reported)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(&cli) {
        // Not routed through tracing: the filter may be set to drop it
        eprintln!("{}", exit_message(&err));
        std::process::exit(1);
    }
}

fn exit_message(err: &state::ProcessError) -> String {
    format!("Error: {}", err)
}

/// Logs go to stderr so that stdout can carry the CSV. `RUST_LOG` overrides the flags.
fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), state::ProcessError> {
    let parser = parser::GcTraceParser::new()?;
    let lines = io::LineSource::new(std::io::stdin().lock());

    if cli.csv.as_os_str() == "-" {
        state::run(lines, &parser, io::CsvSink::new(std::io::stdout()))?;
    } else {
        tracing::info!(path = %cli.csv.display(), "writing gc traces");
        state::run(lines, &parser, io::CsvSink::create(&cli.csv)?)?;
    }

    Ok(())
}
