use std::env;
use std::process::ExitCode;

use clap::Parser;
use phototidy::cli::{Cli, run_cli};
use phototidy::logging::init_logger;
use phototidy::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let base_path = match env::current_dir() {
        Ok(path) => path,
        Err(e) => {
            OutputFormatter::error(&format!("Cannot determine working directory: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let result = cli
        .run_options()
        .and_then(|options| run_cli(cli.organize_command(), &base_path, &options));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
