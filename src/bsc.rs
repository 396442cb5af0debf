//! Broadcom Serial Controller (BSC) clock divider
//!
//! SCL frequency is `CORE_CLK / DIV`. The DIV register is 32 bits wide but only
//! the low 16 bits are used, and a value of 0 is read by the hardware as 32768.

use core::fmt;

use crate::time::{mhz, Hertz};

/// Core clock feeding the BSC divider.
pub const CORE_CLK: Hertz = mhz(250);

/// Size of one BSC register block.
pub const BSC_SIZE: usize = 0x20;
/// Physical base address of BSC1.
pub const BSC1_BASE: u64 = 0x2080_4000;
/// Offset of the clock divider register within the block.
pub const BSC_DIV_OFFSET: usize = 0x14;

/// Largest divider the CDIV field can hold.
pub const DIV_MAX: u32 = 0xFFFF;
/// Divider the hardware uses when the CDIV field reads back as zero.
pub const DIV_ZERO_AS: u32 = 0x8000;

/// Highest SCL frequency (divider of 1).
pub const FREQ_MAX: Hertz = Hertz(CORE_CLK.0);
/// Lowest SCL frequency whose divider still fits in 16 bits.
pub const FREQ_MIN: Hertz = Hertz(CORE_CLK.0 / DIV_MAX + 1);

/// BSC divider error
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// Requested frequency cannot be produced by a 16-bit divider.
    FrequencyOutOfRange { requested: u64, min: Hertz, max: Hertz },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FrequencyOutOfRange { min, max, .. } => {
                write!(f, "Frequency must be in the range {} to {}", min.0, max.0)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Inclusive range of achievable SCL frequencies.
pub const fn frequency_range() -> (Hertz, Hertz) {
    (FREQ_MIN, FREQ_MAX)
}

/// Divider the hardware actually applies for a raw DIV register value.
pub fn effective_divider(raw: u32) -> u32 {
    match raw & DIV_MAX {
        0 => DIV_ZERO_AS,
        div => div,
    }
}

/// SCL frequency produced by a raw DIV register value.
pub fn frequency_from_divider(raw: u32) -> Hertz {
    CORE_CLK / effective_divider(raw)
}

/// Divider for the requested frequency, truncating toward zero.
///
/// The resulting SCL frequency is at or just above `requested`, and the next
/// larger divider would fall below it.
pub fn divider_for(requested: u64) -> Result<u32, Error> {
    if requested < FREQ_MIN.0 as u64 || requested > FREQ_MAX.0 as u64 {
        return Err(Error::FrequencyOutOfRange {
            requested,
            min: FREQ_MIN,
            max: FREQ_MAX,
        });
    }

    let div = CORE_CLK.0 / requested as u32;
    debug_assert!((1..=DIV_MAX).contains(&div));
    Ok(div)
}

/// Parse a frequency argument the way `atoi` does.
///
/// Leading whitespace and one sign are accepted, then digits are consumed up to
/// the first non-digit. Input without a leading number yields 0. Negative values
/// and values too large for `u64` saturate.
pub fn parse_frequency_lenient(arg: &str) -> u64 {
    let s = arg.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: u64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add((b - b'0') as u64);
    }

    if negative && value != 0 {
        // never in range
        u64::MAX
    } else {
        value
    }
}
