//! Baud-rate divisor computation
//!
//! The WK2132 clocks each UART from `crystal / 16`, divided by
//! `BAUD + 1 + PRES / 10`:
//!
//! - `BAUD` is the 16-bit integer part minus one, split over BRH:BRL
//! - `PRES` is one decimal digit of fractional part, written to BRD
//!
//! The divisor is therefore handled in tenths. It is rounded to the
//! nearest representable value and rejected when the resulting rate is
//! more than [`MAX_ERROR_PERMILLE`] away from the request.

use crate::config::DEFAULT_CRYSTAL;

/// Largest accepted deviation between requested and achieved rate (‰)
///
/// 2 % keeps the receiver's sampling point inside the bit for a 10-bit
/// frame on both ends of the link.
pub const MAX_ERROR_PERMILLE: u32 = 20;

/// Smallest divisor, in tenths (BAUD = 0, PRES = 0)
const MIN_TENTHS: u64 = 10;

/// Largest divisor, in tenths (BAUD = 0xFFFF, PRES = 9)
const MAX_TENTHS: u64 = (0xFFFF + 1) * 10 + 9;

/// Reason a rate cannot be programmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DivisorError {
    /// Baud rate or crystal frequency is zero
    Zero,
    /// Rate too high for the crystal (divisor below 1)
    TooFast,
    /// Rate too low for the crystal (divisor above the 16-bit range)
    TooSlow,
    /// Nearest divisor misses the rate by more than the tolerance
    OutOfTolerance {
        /// Achievable rate closest to the request
        nearest: u32,
    },
}

/// Baud-rate divisor for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudDivisor {
    /// Divisor in tenths (`(BAUD + 1) * 10 + PRES`)
    tenths: u32,
}

impl BaudDivisor {
    /// Compute the divisor for `baud_rate` from a `crystal` in Hz
    pub fn compute(crystal: u32, baud_rate: u32) -> Result<Self, DivisorError> {
        if crystal == 0 || baud_rate == 0 {
            return Err(DivisorError::Zero);
        }

        let clock = 10 * crystal as u64;
        let per_unit = 16 * baud_rate as u64;
        // round(clock / per_unit)
        let tenths = (clock + per_unit / 2) / per_unit;

        if tenths < MIN_TENTHS {
            return Err(DivisorError::TooFast);
        }
        if tenths > MAX_TENTHS {
            return Err(DivisorError::TooSlow);
        }

        let divisor = Self {
            tenths: tenths as u32,
        };

        // |clock - per_unit * tenths| / (per_unit * tenths) <= MAX_ERROR_PERMILLE / 1000
        let achieved = per_unit * tenths;
        if clock.abs_diff(achieved) * 1000 > MAX_ERROR_PERMILLE as u64 * achieved {
            return Err(DivisorError::OutOfTolerance {
                nearest: divisor.effective_rate(crystal),
            });
        }

        Ok(divisor)
    }

    /// Divisor in tenths
    pub fn tenths(&self) -> u32 {
        self.tenths
    }

    /// BRH register value
    pub fn brh(&self) -> u8 {
        (self.integer_register() >> 8) as u8
    }

    /// BRL register value
    pub fn brl(&self) -> u8 {
        self.integer_register() as u8
    }

    /// BRD register value
    pub fn brd(&self) -> u8 {
        (self.tenths % 10) as u8
    }

    /// Register values in write order: BRH, BRL, BRD
    pub fn registers(&self) -> [u8; 3] {
        [self.brh(), self.brl(), self.brd()]
    }

    /// Rate actually produced by this divisor, rounded to the nearest bps
    pub fn effective_rate(&self, crystal: u32) -> u32 {
        let clock = 10 * crystal as u64;
        let per_unit = 16 * self.tenths as u64;
        ((clock + per_unit / 2) / per_unit) as u32
    }

    /// Deviation from `baud_rate` in per-mille, rounded up
    pub fn error_permille(&self, crystal: u32, baud_rate: u32) -> u32 {
        let clock = 10 * crystal as u64;
        let achieved = 16 * baud_rate as u64 * self.tenths as u64;
        let diff = clock.abs_diff(achieved) * 1000;
        diff.div_ceil(achieved) as u32
    }

    fn integer_register(&self) -> u16 {
        (self.tenths / 10 - 1) as u16
    }
}

/// Highest rate reachable with the default crystal
pub const DEFAULT_MAX_BAUD: u32 = DEFAULT_CRYSTAL / 16;
