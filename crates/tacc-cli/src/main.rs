use std::{fs, path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser as ClapParser;
use tacc::{Platform, compile_source};

/// Compiles a small dynamically-typed scripting language down to 32-bit
/// x86 AT&T-syntax assembly text.
#[derive(Debug, clap::Parser)]
#[command(name = "tacc", version, about)]
struct Cli {
    /// Source file to compile.
    input: PathBuf,

    /// Target platform; governs symbol prefixing and stack alignment.
    #[arg(long, default_value_t = Platform::Linux)]
    target: Platform,

    /// Enable verbose pipeline logging.
    #[arg(long)]
    debug: bool,

    /// Print wall-clock time spent in the pipeline to stderr.
    #[arg(long)]
    bench: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
            .init();
    }

    let source = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let asm = match compile_source(&source, cli.target, cli.debug) {
        Ok(asm) => asm,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if cli.bench {
        eprintln!("compiled in {:?}", start.elapsed());
    }

    let output_path = cli.input.with_extension("s");
    if let Err(err) = fs::write(&output_path, asm) {
        eprintln!("error: could not write {}: {err}", output_path.display());
        return ExitCode::FAILURE;
    }

    eprintln!("wrote {}", output_path.display());
    ExitCode::SUCCESS
}
