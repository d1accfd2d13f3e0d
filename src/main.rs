use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use rustdoc_js::cli::{Cli, run_cli};
use rustdoc_js::telemetry;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if let Err(error) = telemetry::initialise() {
        eprintln!("warning: {error}");
    }

    let json = cli.json;
    let config = cli.into_config();
    match run_cli(&config, json) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) if json => {
            let serialized = serde_json::to_string_pretty(&error.to_error_response())
                .unwrap_or_else(|_| {
                    "{\"error\":{\"type\":\"serialization_error\",\"message\":\"Failed to serialize error response\"}}"
                        .to_string()
                });
            println!("{serialized}");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("{:?}", miette::Report::new(error));
            ExitCode::FAILURE
        }
    }
}
