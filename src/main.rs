#![deny(clippy::pedantic)]
#![cfg_attr(not(test), deny(warnings))]

#[macro_use]
mod macros;

mod app;
mod cli;
mod environment;
mod error;
mod grammar;
mod paths;
mod pipeline;
mod submodule;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    app::set_global_verbosity(cli.verbose.log_level_filter());

    match cli.exec() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            critical!("{error:#}");
            ExitCode::from(u8::try_from(error::exit_code(&error)).unwrap_or(1))
        }
    }
}
