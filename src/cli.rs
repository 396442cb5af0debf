//! Command line front end
//!
//! With no frequency (or more than one) the current divider is reported. With
//! exactly one frequency a new divider is computed and written.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::bsc;
use crate::mem::{self, DivRegister, RegisterWindow, DEV_MEM};

/// Read or set the BSC1 (I2C) clock divider on BCM2835 boards.
///
/// Bypasses the 10 kHz floor enforced by the I2C driver; the hardware goes
/// down to 3815 Hz.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Memory device exposing the physical address space
    #[arg(long = "mem", value_name = "PATH", default_value = DEV_MEM)]
    pub mem: PathBuf,

    /// Print the divider for FREQUENCY without mapping or writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Requested SCL frequency in Hz; the current frequency is shown unless exactly one is given
    #[arg(value_name = "FREQUENCY", allow_hyphen_values = true)]
    pub frequency: Vec<String>,
}

/// What a command line asks for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    /// Show the current divider and frequency.
    Report,
    /// Program the divider for a frequency in Hz.
    Set(u64),
}

impl Args {
    pub fn action(&self) -> Action {
        match self.frequency.as_slice() {
            [f] => Action::Set(bsc::parse_frequency_lenient(f)),
            _ => Action::Report,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Warn,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }

    pub fn mem_config(&self) -> mem::Config {
        mem::Config {
            device: self.mem.clone(),
            ..Default::default()
        }
    }
}

/// Print the raw divider register and the SCL frequency it produces.
pub fn report<R: DivRegister + ?Sized>(regs: &R, out: &mut dyn Write) -> Result<()> {
    let div = regs.read_div();
    let freq = bsc::frequency_from_divider(div);
    if div & bsc::DIV_MAX == 0 {
        info!("DIV is zero, hardware divides by {}", bsc::DIV_ZERO_AS);
    }
    writeln!(out, "DIV: {:08x} ({} Hz)", div, freq.0)?;
    Ok(())
}

/// Validate `requested`, write the new divider and print it.
pub fn set_frequency<R: DivRegister + ?Sized>(
    regs: &mut R,
    requested: u64,
    out: &mut dyn Write,
) -> Result<()> {
    let div = bsc::divider_for(requested)?;
    // Program the register even if stdout is gone.
    regs.write_div(div);
    info!("DIV set to {:#x} for {} Hz", div, requested);
    writeln!(out, "f: {}  DIV: {:08x}", requested, div)?;
    Ok(())
}

/// Run one invocation against the device named in `args`.
pub fn run(args: &Args, out: &mut dyn Write) -> Result<()> {
    let action = args.action();
    debug!("{:?}", action);

    // Reject bad requests before touching the device.
    match action {
        Action::Set(requested) => {
            let div = bsc::divider_for(requested)?;
            if args.dry_run {
                writeln!(out, "f: {}  DIV: {:08x}", requested, div)?;
                return Ok(());
            }
        }
        Action::Report if args.dry_run => bail!("--dry-run needs exactly one FREQUENCY"),
        Action::Report => {}
    }

    let mut window = RegisterWindow::map(&args.mem_config())?;

    let result = match action {
        Action::Report => report(&window, out),
        Action::Set(requested) => set_frequency(&mut window, requested, out),
    };

    if let Err(e) = window.unmap().context("munmap") {
        error!("{:#}", e);
    }

    result
}
