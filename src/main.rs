use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use bsc_clkdiv::{logging, Args};

fn try_main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level())?;

    let stdout = io::stdout();
    bsc_clkdiv::run(&args, &mut stdout.lock())
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
