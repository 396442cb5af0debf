#![doc = include_str!("../README.md")]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bsc;
pub mod cli;
pub mod logging;
pub mod mem;
pub mod time;

pub use cli::{run, Action, Args};
pub use mem::{Config, DivRegister, RegisterWindow};
pub use time::Hertz;
