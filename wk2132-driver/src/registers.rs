//! Register access layer
//!
//! Owns the bus and turns register and FIFO accesses into I2C transactions
//! at the right address. It also remembers which register page each
//! channel has selected so SPAGE is only written when the page changes.

use wk2132_core::regs::{self, global, Page, CHANNEL_COUNT};
use wk2132_hal::I2cBus;

/// Which register space an access targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scope {
    /// Chip-wide registers (GENA, GRST, GMUT, GIR, GIFR)
    Global,
    /// Registers of one UART channel
    Channel(u8),
}

impl Scope {
    fn channel(self) -> u8 {
        match self {
            Scope::Global => 0,
            Scope::Channel(index) => index,
        }
    }
}

/// Bus owner and register page tracker
pub struct Registers<B> {
    bus: B,
    base: u8,
    /// Selected page per channel, `None` when unknown
    pages: [Option<Page>; CHANNEL_COUNT],
}

impl<B: I2cBus> Registers<B> {
    /// Create the register layer for a chip at `base`
    pub fn new(bus: B, base: u8) -> Self {
        Self {
            bus,
            base,
            pages: [None; CHANNEL_COUNT],
        }
    }

    /// Base I2C address
    pub fn base(&self) -> u8 {
        self.base
    }

    /// Shared access to the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Exclusive access to the bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }

    /// Page last selected for a channel, if known
    pub fn page(&self, channel: u8) -> Option<Page> {
        self.pages.get(channel as usize).copied().flatten()
    }

    /// Forget the selected pages (after a chip reset or a failed write)
    pub fn reset_pages(&mut self, page: Option<Page>) {
        self.pages = [page; CHANNEL_COUNT];
    }

    /// Read one register
    pub fn read(&mut self, scope: Scope, reg: u8) -> Result<u8, B::Error> {
        let address = regs::i2c_address(self.base, scope.channel(), false);
        let mut value = [0u8; 1];
        self.bus.write_read(address, &[reg], &mut value)?;
        trace!(
            "rd {} ch{} = {}",
            regs::register_name(reg, self.current_page(scope)),
            scope.channel(),
            value[0]
        );
        Ok(value[0])
    }

    /// Write one register
    pub fn write(&mut self, scope: Scope, reg: u8, value: u8) -> Result<(), B::Error> {
        let address = regs::i2c_address(self.base, scope.channel(), false);
        self.bus.write(address, &[reg, value])?;
        trace!(
            "wr {} ch{} = {}",
            regs::register_name(reg, self.current_page(scope)),
            scope.channel(),
            value
        );
        Ok(())
    }

    /// Read, change and write back one register
    pub fn modify<F>(&mut self, scope: Scope, reg: u8, f: F) -> Result<u8, B::Error>
    where
        F: FnOnce(u8) -> u8,
    {
        let value = f(self.read(scope, reg)?);
        self.write(scope, reg, value)?;
        Ok(value)
    }

    /// Select a register page for a channel, skipping the write when it is
    /// already selected
    pub fn select_page(&mut self, channel: u8, page: Page) -> Result<(), B::Error> {
        if self.page(channel) == Some(page) {
            return Ok(());
        }

        // Mark unknown until the write is acknowledged
        if let Some(slot) = self.pages.get_mut(channel as usize) {
            *slot = None;
        }
        self.write(Scope::Channel(channel), global::SPAGE, page.value())?;
        if let Some(slot) = self.pages.get_mut(channel as usize) {
            *slot = Some(page);
        }
        Ok(())
    }

    /// Push bytes into a channel's transmit FIFO in one transaction
    pub fn write_fifo(&mut self, channel: u8, data: &[u8]) -> Result<(), B::Error> {
        let address = regs::i2c_address(self.base, channel, true);
        self.bus.write(address, data)
    }

    /// Pull bytes out of a channel's receive FIFO in one transaction
    pub fn read_fifo(&mut self, channel: u8, buf: &mut [u8]) -> Result<(), B::Error> {
        let address = regs::i2c_address(self.base, channel, true);
        self.bus.read(address, buf)
    }

    fn current_page(&self, scope: Scope) -> Page {
        match scope {
            Scope::Global => Page::Zero,
            Scope::Channel(index) => self.page(index).unwrap_or_default(),
        }
    }
}
