#![macro_use]
#![allow(unused)]

// Thin wrappers over the `log` macros so call sites stay short.

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        ::log::trace!($s $(, $x)*)
    };
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        ::log::debug!($s $(, $x)*)
    };
}

macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {
        ::log::info!($s $(, $x)*)
    };
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        ::log::warn!($s $(, $x)*)
    };
}

macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {
        ::log::error!($s $(, $x)*)
    };
}
