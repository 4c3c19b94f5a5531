mod cli;
mod config;
mod disp_cmd;
mod fft_cmd;
mod ingest_cmd;
mod logging;
mod ls_cmd;
mod mode_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Ingest(args) => ingest_cmd::run(args),
        Command::Ls(args) => ls_cmd::run(args),
        Command::Disp(args) => disp_cmd::run(args),
        Command::Fft(args) => fft_cmd::run(args),
        Command::Mode(args) => mode_cmd::run(args),
    }
}
