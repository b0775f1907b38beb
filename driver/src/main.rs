use clap::Parser; // clap crate for CLI argument parsing
use std::fs;
use std::io::Write;
use std::process::ExitCode;

use ir::Module;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the textual IR input file
    input_path: String,

    /// Comma-separated pass pipeline to run over every function
    #[arg(short, long, default_value = "multiplication-shifts")]
    passes: String,

    /// Write the resulting module here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Parse and verify the input, then exit without running passes
    #[arg(long)]
    verify_only: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let source = fs::read_to_string(&args.input_path)
        .map_err(|e| format!("cannot read '{}': {e}", args.input_path))?;
    let mut module = reader::parse_module(&source)?;

    if args.verify_only {
        return Ok(());
    }

    let mut pipeline = optimizer::parse_pipeline(&args.passes)?;
    let mut diag = std::io::stderr().lock();
    pipeline.run_on_module(&mut module, &mut diag);
    // pass output lands before the module text when both go to a terminal
    diag.flush().map_err(|e| format!("cannot flush diagnostics: {e}"))?;

    emit(&module, args.output.as_deref())
}

/// Print the rewritten module to stdout, or write it to the requested path.
fn emit(module: &Module, output: Option<&str>) -> Result<(), String> {
    let text = module.to_string();
    match output {
        Some(path) => {
            fs::write(path, &text).map_err(|e| format!("cannot write '{}': {e}", path))
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}
