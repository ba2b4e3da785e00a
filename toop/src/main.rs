//! toop main entry point
//!
//! Parses the command line, runs the requested TOC command and exits with
//! 0 on success, 1 if the command failed and 2 on usage errors.

use std::env;
use std::process;
use log::{error, info};
use toop_cli::{parse_args, run, CliError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code());
        }
    };

    info!("toop starting: {:?}", args.command);
    if let Err(e) = run(&args) {
        report(&e);
        process::exit(e.exit_code());
    }
}

fn report(e: &CliError) {
    match e {
        CliError::Usage(msg) => eprintln!("{}", msg),
        CliError::Toop(e) => error!("{}", e),
    }
}
