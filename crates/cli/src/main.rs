use std::process;

use clap::Parser;
use tapcheck_cli::{run, App, CheckArgs, Command};
use tapcheck_core::Report;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    let code = match &app.command {
        Command::Check(args) => check(args),
        Command::Schema => schema(),
    };
    process::exit(code);
}

fn schema() -> i32 {
    let schema = schemars::schema_for!(Report);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            eprintln!("Failed to serialize schema: {e}");
            1
        }
    }
}

/// Exit status 1 if any file could not be checked, otherwise 2 if any
/// history was rejected, otherwise 0.
fn check(args: &CheckArgs) -> i32 {
    let files = match run::collect_files(&args.paths) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Failed to read input directory: {e}");
            return 1;
        }
    };
    if files.is_empty() {
        eprintln!("No history files found");
        return 1;
    }

    let mut any_error = false;
    let mut any_rejected = false;
    for outcome in run::check_files(&files, args) {
        let file = outcome.file.display().to_string();
        match outcome.result {
            Ok(report) => {
                any_rejected |= !report.is_accepted();
                if args.json {
                    let result = serde_json::json!({
                        "file": file,
                        "verdict": report.verdict(),
                        "report": report,
                    });
                    println!("{result}");
                } else {
                    println!("{file}: {}", report.verdict());
                    if !report.is_accepted() {
                        let taps: Vec<String> = report.taps.iter().map(ToString::to_string).collect();
                        println!("  [{}]", taps.join(", "));
                    }
                    if args.count_steps {
                        println!("  traversal steps: {}", report.traversal_steps);
                    }
                }
            }
            Err(message) => {
                any_error = true;
                if args.json {
                    let result = serde_json::json!({
                        "file": file,
                        "error": message,
                    });
                    println!("{result}");
                } else {
                    eprintln!("{file}: {message}");
                }
            }
        }
    }

    if any_error {
        1
    } else if any_rejected {
        2
    } else {
        0
    }
}
