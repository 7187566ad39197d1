use std::process::ExitCode;

use clap::Parser;
use cyclecloud_bootstrap_lib::bootstrap::{run_app, Cli};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(2));
        }
    };
    run_app(cli)
}
