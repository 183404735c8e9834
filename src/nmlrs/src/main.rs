// nmlrs/src/main.rs

use anyhow::Result;
use clap::Parser;
use nmlrs::cli::{run, OutputFormat, Request};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nmlrs")]
#[command(about = "Read, convert and patch Fortran namelist files", long_about = None)]
#[command(version)]
struct Cli {
    /// Input namelist file
    input: PathBuf,

    /// Output file (defaults to stdout)
    output: Option<PathBuf>,

    /// Group the --set assignments belong to (defaults to the first group)
    #[arg(short, long, value_name = "GROUP")]
    group: Option<String>,

    /// Assignment to apply, e.g. `-s steps=100` or `-s "x(2)=1.5"`
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Output format (defaults to the output file extension)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Re-serialize the whole file instead of patching values in place
    #[arg(long)]
    no_patch: bool,
}

fn entrypoint() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let request = Request {
        input: cli.input,
        output: cli.output,
        group: cli.group,
        assignments: cli.set,
        format: cli.format,
        no_patch: cli.no_patch,
    };
    run(&request)
}

fn main() -> ExitCode {
    match entrypoint() {
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}
