//! Time units

use core::ops::Div;

/// Hertz
#[derive(PartialEq, PartialOrd, Ord, Clone, Copy, Eq, Debug, Hash)]
pub struct Hertz(pub u32);

impl Hertz {
    /// Create a `Hertz` from the given megahertz.
    pub const fn mhz(megahertz: u32) -> Self {
        Self(megahertz * 1_000_000)
    }
}

/// This is a convenience shortcut for [`Hertz::mhz`]
pub const fn mhz(megahertz: u32) -> Hertz {
    Hertz::mhz(megahertz)
}

impl Div<u32> for Hertz {
    type Output = Hertz;
    fn div(self, rhs: u32) -> Self::Output {
        Hertz(self.0 / rhs)
    }
}
