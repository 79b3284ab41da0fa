use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use xfn_core::{CompositeResponse, Outcome};
use xfn_function::CompositionFunction;
use xfn_function::config::loader::load_config;

/// Render the desired state for one composite request.
///
/// Exit codes: 0 on success, 1 when the response carries a fatal
/// condition, 2 when input, output or configuration cannot be handled.
#[derive(Parser)]
#[command(name = "xfn-render")]
#[command(about = "Run the composition function over a request read from a file or stdin")]
#[command(version)]
struct Cli {
    /// Request JSON file (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write the response here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (defaults to xfn.toml when present)
    #[arg(short, long, env = "XFN_CONFIG")]
    config: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn main() -> ExitCode {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    xfn_function::init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Fatal) => ExitCode::from(1),
        Err(err) => {
            eprintln!("xfn-render: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<Outcome> {
    let cfg = load_config(cli.config.as_deref()).context("loading configuration")?;
    xfn_function::apply_logging_level(&cfg.logging.level);

    let function = CompositionFunction::from_config(&cfg).context("building rule set")?;
    tracing::debug!(rules = ?function.rules().names(), "Composition function ready");

    let raw = read_input(cli.input.as_deref())?;
    let response = function.run_json(&raw);
    write_output(&response, cli.output.as_deref(), cli.compact)?;

    Ok(response.outcome())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading request from {}", path.display())),
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("reading request from stdin")?;
            Ok(raw)
        }
    }
}

fn write_output(
    response: &CompositeResponse,
    path: Option<&Path>,
    compact: bool,
) -> anyhow::Result<()> {
    let mut rendered = if compact {
        serde_json::to_string(response)?
    } else {
        serde_json::to_string_pretty(response)?
    };
    rendered.push('\n');

    match path {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing response to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
