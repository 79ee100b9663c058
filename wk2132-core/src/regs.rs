//! WK2132 register map
//!
//! The WK2132 does not fold the channel number into the register address
//! the way most multi-channel I2C UARTs do. Instead the *bus address*
//! changes with the channel and with the kind of access:
//!
//! ```text
//! +----+----+----+----+----+----+----+----+
//! |  0 | A1 | A0 |  1 |  0 | C1 | C0 |  F |
//! +----+----+----+----+----+----+----+----+
//! ```
//!
//! - `A1 A0`: strap pins, part of the base address
//! - `C1 C0`: channel number (only 0 and 1 exist on the WK2132)
//! - `F`: 0 for register access, 1 for direct FIFO access
//!
//! With a base address of 0x10, channel 0 registers live at 0x10, channel 0
//! FIFO at 0x11, channel 1 registers at 0x12 and channel 1 FIFO at 0x13.
//! Global registers are reached through the channel 0 register address.
//!
//! Channel registers 0x04-0x08 are banked: the SPAGE register of the
//! channel selects page 0 (line control, FIFO status) or page 1 (baud rate
//! and FIFO trigger levels).

/// Default base address (A1 = A0 = 0)
pub const DEFAULT_ADDRESS: u8 = 0x10;

/// Bits of the bus address reserved for channel and FIFO selection
pub const ADDRESS_SELECT_MASK: u8 = 0x07;

/// Hardware FIFO depth, per channel and per direction
pub const FIFO_SIZE: usize = 256;

/// Number of UART channels on the chip
pub const CHANNEL_COUNT: usize = 2;

/// Data bits per frame (fixed by the hardware)
pub const DATA_BITS: u8 = 8;

/// Compute the bus address for an access
///
/// # Arguments
/// * `base` - base address as set by the A1/A0 straps
/// * `channel` - UART channel (0 or 1)
/// * `fifo` - `true` for direct FIFO access, `false` for register access
pub const fn i2c_address(base: u8, channel: u8, fifo: bool) -> u8 {
    base | (channel << 1) | fifo as u8
}

/// Global registers (any page, reached at the channel 0 address)
pub mod global {
    /// Global control: UART clock enables
    pub const GENA: u8 = 0x00;
    /// Global reset: UART soft resets and sleep status
    pub const GRST: u8 = 0x01;
    /// Global master channel control (SPI mode only)
    pub const GMUT: u8 = 0x02;
    /// Page select for the channel-banked registers
    pub const SPAGE: u8 = 0x03;
    /// Global interrupt enable
    pub const GIR: u8 = 0x10;
    /// Global interrupt flags
    pub const GIFR: u8 = 0x11;

    /// GENA: enable channel 2 clock
    pub const GENA_C2EN: u8 = 1 << 1;
    /// GENA: enable channel 1 clock
    pub const GENA_C1EN: u8 = 1 << 0;

    /// GRST: channel 2 soft reset
    pub const GRST_C2RST: u8 = 1 << 1;
    /// GRST: channel 1 soft reset
    pub const GRST_C1RST: u8 = 1 << 0;
}

/// Channel registers, page 0
pub mod page0 {
    /// Serial control: TX/RX enables
    pub const SCR: u8 = 0x04;
    /// Line configuration: stop bits, parity, IrDA, break
    pub const LCR: u8 = 0x05;
    /// FIFO control: enables, resets and trigger levels
    pub const FCR: u8 = 0x06;
    /// Serial interrupt enable
    pub const SIER: u8 = 0x07;
    /// Serial interrupt flags
    pub const SIFR: u8 = 0x08;
    /// Transmit FIFO byte count (0 when empty *or* full)
    pub const TFCNT: u8 = 0x09;
    /// Receive FIFO byte count (0 when empty *or* full)
    pub const RFCNT: u8 = 0x0A;
    /// FIFO status
    pub const FSR: u8 = 0x0B;
    /// Line status
    pub const LSR: u8 = 0x0C;
    /// FIFO data (register access path, unreliable on real parts)
    pub const FDAT: u8 = 0x0D;

    /// SCR: transmitter enable
    pub const SCR_TXEN: u8 = 1 << 1;
    /// SCR: receiver enable
    pub const SCR_RXEN: u8 = 1 << 0;

    /// LCR: send break
    pub const LCR_BREAK: u8 = 1 << 5;
    /// LCR: IrDA mode
    pub const LCR_IREN: u8 = 1 << 4;
    /// LCR: parity enable
    pub const LCR_PAEN: u8 = 1 << 3;
    /// LCR: parity forced to 0
    pub const LCR_PAR_0: u8 = 0 << 1;
    /// LCR: odd parity
    pub const LCR_PAR_ODD: u8 = 1 << 1;
    /// LCR: even parity
    pub const LCR_PAR_EVEN: u8 = 2 << 1;
    /// LCR: parity forced to 1
    pub const LCR_PAR_1: u8 = 3 << 1;
    /// LCR: two stop bits
    pub const LCR_STPL: u8 = 1 << 0;
    /// LCR bits owned by the line parameters (stop bits and parity)
    pub const LCR_FORMAT_MASK: u8 = 0x0F;

    /// FCR: transmit FIFO enable
    pub const FCR_TFEN: u8 = 1 << 3;
    /// FCR: receive FIFO enable
    pub const FCR_RFEN: u8 = 1 << 2;
    /// FCR: transmit FIFO reset
    pub const FCR_TFRST: u8 = 1 << 1;
    /// FCR: receive FIFO reset
    pub const FCR_RFRST: u8 = 1 << 0;

    /// FSR: receive FIFO overflow
    pub const FSR_RFOE: u8 = 1 << 7;
    /// FSR: receive line break
    pub const FSR_RFBI: u8 = 1 << 6;
    /// FSR: receive framing error
    pub const FSR_RFFE: u8 = 1 << 5;
    /// FSR: receive parity error
    pub const FSR_RFPE: u8 = 1 << 4;
    /// FSR: receive FIFO holds data
    pub const FSR_RDAT: u8 = 1 << 3;
    /// FSR: transmit FIFO holds data
    pub const FSR_TDAT: u8 = 1 << 2;
    /// FSR: transmit FIFO full
    pub const FSR_TFULL: u8 = 1 << 1;
    /// FSR: transmitter busy
    pub const FSR_TBUSY: u8 = 1 << 0;
}

/// Channel registers, page 1
pub mod page1 {
    /// Baud divisor, high byte of the integer part
    pub const BRH: u8 = 0x04;
    /// Baud divisor, low byte of the integer part
    pub const BRL: u8 = 0x05;
    /// Baud divisor, decimal digit of the fractional part
    pub const BRD: u8 = 0x06;
    /// Receive FIFO interrupt trigger level
    pub const RFTL: u8 = 0x07;
    /// Transmit FIFO interrupt trigger level
    pub const TFTL: u8 = 0x08;
}

/// Register page selected through SPAGE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    /// Line control and FIFO status registers
    #[default]
    Zero,
    /// Baud rate and trigger level registers
    One,
}

impl Page {
    /// Value written to SPAGE to select this page
    pub const fn value(self) -> u8 {
        match self {
            Page::Zero => 0,
            Page::One => 1,
        }
    }
}

/// Human readable register name, for log messages
pub fn register_name(reg: u8, page: Page) -> &'static str {
    const PAGE0: [&str; 14] = [
        "GENA", "GRST", "GMUT", "SPAGE", "SCR", "LCR", "FCR", "SIER", "SIFR", "TFCNT", "RFCNT",
        "FSR", "LSR", "FDAT",
    ];
    const PAGE1: [&str; 9] = [
        "GENA", "GRST", "GMUT", "SPAGE", "BRH", "BRL", "BRD", "RFTL", "TFTL",
    ];

    let names: &[&str] = match page {
        Page::Zero => &PAGE0,
        Page::One => &PAGE1,
    };
    match reg {
        global::GIR => "GIR",
        global::GIFR => "GIFR",
        r => names.get(r as usize).copied().unwrap_or("?"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i2c_address_layout() {
        assert_eq!(i2c_address(0x10, 0, false), 0x10);
        assert_eq!(i2c_address(0x10, 0, true), 0x11);
        assert_eq!(i2c_address(0x10, 1, false), 0x12);
        assert_eq!(i2c_address(0x10, 1, true), 0x13);
        // A1/A0 straps high
        assert_eq!(i2c_address(0x70, 1, true), 0x73);
    }

    #[test]
    fn test_channel_bits() {
        assert_eq!(global::GENA_C1EN | global::GENA_C2EN, 0x03);
        assert_eq!(global::GRST_C1RST | global::GRST_C2RST, 0x03);
    }

    #[test]
    fn test_fcr_reset_and_enable_all() {
        let fcr = page0::FCR_TFEN | page0::FCR_RFEN | page0::FCR_TFRST | page0::FCR_RFRST;
        assert_eq!(fcr, 0x0F);
    }

    #[test]
    fn test_register_names_follow_page() {
        assert_eq!(register_name(0x05, Page::Zero), "LCR");
        assert_eq!(register_name(0x05, Page::One), "BRL");
        assert_eq!(register_name(0x0B, Page::Zero), "FSR");
        assert_eq!(register_name(0x0B, Page::One), "?");
        assert_eq!(register_name(0x11, Page::Zero), "GIFR");
    }
}
