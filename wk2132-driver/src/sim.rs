//! Register-level WK2132 simulator
//!
//! Implements [`I2cBus`] the way the chip answers on the wire: address
//! decoding, paged registers, 256-byte FIFOs with 8-bit counters that wrap
//! to zero when full, and FCR resets. Every transaction is logged so tests
//! can assert on the exact bus traffic. Faults can be injected per
//! transaction, per channel or for FIFO reads only.

use std::collections::VecDeque;
use std::vec::Vec;

use wk2132_core::regs::{global, page0, page1, ADDRESS_SELECT_MASK, CHANNEL_COUNT, FIFO_SIZE};
use wk2132_hal::{BusError, I2cBus};

/// One logged bus transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Plain write (register write or FIFO burst)
    Write { address: u8, data: Vec<u8> },
    /// Plain read (FIFO burst)
    Read { address: u8, len: usize },
    /// Register read: register byte then repeated-start read
    WriteRead { address: u8, reg: u8, len: usize },
}

#[derive(Default)]
struct SimChannel {
    spage: u8,
    page0: [u8; 16],
    page1: [u8; 16],
    tx: VecDeque<u8>,
    rx: VecDeque<u8>,
    loopback: bool,
    rx_overflow: bool,
}

impl SimChannel {
    fn fsr(&self) -> u8 {
        let mut fsr = 0;
        if self.rx_overflow {
            fsr |= page0::FSR_RFOE;
        }
        if !self.rx.is_empty() {
            fsr |= page0::FSR_RDAT;
        }
        if !self.tx.is_empty() {
            fsr |= page0::FSR_TDAT | page0::FSR_TBUSY;
        }
        if self.tx.len() >= FIFO_SIZE {
            fsr |= page0::FSR_TFULL;
        }
        fsr
    }

    fn push_tx(&mut self, byte: u8) {
        if self.loopback {
            self.push_rx(byte);
        } else if self.tx.len() < FIFO_SIZE {
            self.tx.push_back(byte);
        }
    }

    fn push_rx(&mut self, byte: u8) -> bool {
        if self.rx.len() < FIFO_SIZE {
            self.rx.push_back(byte);
            true
        } else {
            self.rx_overflow = true;
            false
        }
    }

    fn reset(&mut self) {
        let loopback = self.loopback;
        *self = SimChannel {
            loopback,
            ..Default::default()
        };
    }
}

/// Simulated WK2132
pub struct Wk2132Sim {
    base: u8,
    globals: [u8; 0x12],
    channels: [SimChannel; CHANNEL_COUNT],
    log: Vec<Op>,
    offline: bool,
    fail_fifo_reads: bool,
    failing_channel: Option<u8>,
    fail_in: Option<usize>,
}

impl Default for Wk2132Sim {
    fn default() -> Self {
        Self::new()
    }
}

impl Wk2132Sim {
    /// Chip at the default base address 0x10
    pub fn new() -> Self {
        Self::with_base(0x10)
    }

    /// Chip at another base address
    pub fn with_base(base: u8) -> Self {
        Self {
            base,
            globals: [0; 0x12],
            channels: Default::default(),
            log: Vec::new(),
            offline: false,
            fail_fifo_reads: false,
            failing_channel: None,
            fail_in: None,
        }
    }

    /// NACK every transaction
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// NACK reads of the receive FIFO
    pub fn set_fail_fifo_reads(&mut self, fail: bool) {
        self.fail_fifo_reads = fail;
    }

    /// NACK every transaction addressed to one channel
    pub fn set_failing_channel(&mut self, channel: Option<u8>) {
        self.failing_channel = channel;
    }

    /// NACK the transaction `n` transactions from now (0 = the next one)
    pub fn fail_transaction_in(&mut self, n: usize) {
        self.fail_in = Some(n);
    }

    /// Wire TX of a channel to its own RX
    pub fn set_loopback(&mut self, channel: u8, loopback: bool) {
        self.channels[channel as usize].loopback = loopback;
    }

    /// Bytes arriving on a channel's RX line; returns how many fit
    pub fn inject_rx(&mut self, channel: u8, data: &[u8]) -> usize {
        let ch = &mut self.channels[channel as usize];
        data.iter().take_while(|&&b| ch.push_rx(b)).count()
    }

    /// Put the transmitter to work: drain what it holds onto the wire
    pub fn take_tx(&mut self, channel: u8) -> Vec<u8> {
        self.channels[channel as usize].tx.drain(..).collect()
    }

    /// Pre-fill a channel's transmit FIFO with `count` bytes
    pub fn fill_tx(&mut self, channel: u8, count: usize) {
        let ch = &mut self.channels[channel as usize];
        for _ in 0..count {
            ch.push_tx(0xEE);
        }
    }

    /// Bytes waiting in a channel's transmit FIFO
    pub fn tx_level(&self, channel: u8) -> usize {
        self.channels[channel as usize].tx.len()
    }

    /// Bytes waiting in a channel's receive FIFO
    pub fn rx_level(&self, channel: u8) -> usize {
        self.channels[channel as usize].rx.len()
    }

    /// Register value as seen by the chip, without logging
    pub fn register(&self, channel: u8, page: u8, reg: u8) -> u8 {
        let ch = &self.channels[channel as usize];
        match (page, reg) {
            (_, global::SPAGE) => ch.spage,
            (_, r) if r < 4 || r >= 0x10 => self.globals.get(r as usize).copied().unwrap_or(0),
            (1, r) => ch.page1[r as usize],
            (_, r) => ch.page0[r as usize],
        }
    }

    /// Transactions so far
    pub fn log(&self) -> &[Op] {
        &self.log
    }

    /// Forget logged transactions
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Payloads of every plain write to `address`
    pub fn writes_to(&self, address: u8) -> Vec<Vec<u8>> {
        self.log
            .iter()
            .filter_map(|op| match op {
                Op::Write { address: a, data } if *a == address => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Register writes to a channel, as `(register, value)` pairs
    pub fn register_writes(&self, channel: u8) -> Vec<(u8, u8)> {
        let address = self.base | (channel << 1);
        self.writes_to(address)
            .into_iter()
            .filter(|data| data.len() >= 2)
            .map(|data| (data[0], data[1]))
            .collect()
    }

    /// Decode an address into (channel, fifo)
    fn decode(&mut self, address: u8) -> Result<(usize, bool), BusError> {
        if self.offline || address & !ADDRESS_SELECT_MASK != self.base {
            return Err(BusError::Nack);
        }
        let channel = ((address >> 1) & 0x03) as usize;
        if channel >= CHANNEL_COUNT || self.failing_channel == Some(channel as u8) {
            return Err(BusError::Nack);
        }
        if let Some(n) = self.fail_in {
            if n == 0 {
                self.fail_in = None;
                return Err(BusError::Nack);
            }
            self.fail_in = Some(n - 1);
        }
        Ok((channel, address & 1 != 0))
    }

    fn write_register(&mut self, channel: usize, reg: u8, value: u8) {
        match reg {
            global::GRST => {
                // soft reset bits self-clear
                for (index, ch) in self.channels.iter_mut().enumerate() {
                    if value & (1 << index) != 0 {
                        ch.reset();
                    }
                }
            }
            global::SPAGE => self.channels[channel].spage = value & 0x01,
            r if r < 4 || r >= 0x10 => {
                if let Some(slot) = self.globals.get_mut(r as usize) {
                    *slot = value;
                }
            }
            r if self.channels[channel].spage == 1 && r <= page1::TFTL => {
                self.channels[channel].page1[r as usize] = value;
            }
            page0::FCR => {
                let ch = &mut self.channels[channel];
                if value & page0::FCR_TFRST != 0 {
                    ch.tx.clear();
                }
                if value & page0::FCR_RFRST != 0 {
                    ch.rx.clear();
                    ch.rx_overflow = false;
                }
                ch.page0[reg as usize] = value & !(page0::FCR_TFRST | page0::FCR_RFRST);
            }
            page0::TFCNT | page0::RFCNT | page0::FSR | page0::LSR => {}
            page0::FDAT => self.channels[channel].push_tx(value),
            r => {
                if let Some(slot) = self.channels[channel].page0.get_mut(r as usize) {
                    *slot = value;
                }
            }
        }
    }

    fn read_register(&mut self, channel: usize, reg: u8) -> u8 {
        let ch = &mut self.channels[channel];
        match reg {
            global::SPAGE => ch.spage,
            r if r < 4 || r >= 0x10 => self.globals.get(r as usize).copied().unwrap_or(0),
            r if ch.spage == 1 && r <= page1::TFTL => ch.page1[r as usize],
            page0::TFCNT => ch.tx.len() as u8,
            page0::RFCNT => ch.rx.len() as u8,
            page0::FSR => {
                let fsr = ch.fsr();
                ch.rx_overflow = false;
                fsr
            }
            page0::FDAT => ch.rx.pop_front().unwrap_or(0),
            r => ch.page0.get(r as usize).copied().unwrap_or(0),
        }
    }
}

impl I2cBus for Wk2132Sim {
    type Error = BusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.log.push(Op::Write {
            address,
            data: data.to_vec(),
        });
        let (channel, fifo) = self.decode(address)?;

        if fifo {
            for &byte in data {
                self.channels[channel].push_tx(byte);
            }
        } else if let [reg, values @ ..] = data {
            for (offset, &value) in values.iter().enumerate() {
                self.write_register(channel, reg + offset as u8, value);
            }
        }
        Ok(())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.log.push(Op::Read {
            address,
            len: buf.len(),
        });
        let (channel, fifo) = self.decode(address)?;
        if !fifo {
            // register reads need a register byte first
            return Err(BusError::Other);
        }
        if self.fail_fifo_reads {
            return Err(BusError::Nack);
        }

        let ch = &mut self.channels[channel];
        for slot in buf.iter_mut() {
            *slot = ch.rx.pop_front().unwrap_or(0);
        }
        Ok(())
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), BusError> {
        let reg = write_data.first().copied().unwrap_or(0);
        self.log.push(Op::WriteRead {
            address,
            reg,
            len: read_buf.len(),
        });
        let (channel, fifo) = self.decode(address)?;
        if fifo {
            return Err(BusError::Other);
        }

        for (offset, slot) in read_buf.iter_mut().enumerate() {
            *slot = self.read_register(channel, reg + offset as u8);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_wrap_when_full() {
        let mut sim = Wk2132Sim::new();
        sim.fill_tx(0, FIFO_SIZE);

        let mut value = [0u8; 1];
        sim.write_read(0x10, &[page0::TFCNT], &mut value).unwrap();
        assert_eq!(value[0], 0);
        sim.write_read(0x10, &[page0::FSR], &mut value).unwrap();
        assert_ne!(value[0] & page0::FSR_TFULL, 0);
    }

    #[test]
    fn test_paged_registers() {
        let mut sim = Wk2132Sim::new();
        sim.write(0x12, &[global::SPAGE, 1]).unwrap();
        sim.write(0x12, &[page1::BRL, 0x5F]).unwrap();
        sim.write(0x12, &[global::SPAGE, 0]).unwrap();
        sim.write(0x12, &[page0::LCR, 0x01]).unwrap();

        assert_eq!(sim.register(1, 1, page1::BRL), 0x5F);
        assert_eq!(sim.register(1, 0, page0::LCR), 0x01);
    }

    #[test]
    fn test_unknown_address_nacks() {
        let mut sim = Wk2132Sim::new();
        assert_eq!(sim.write(0x20, &[0, 0]), Err(BusError::Nack));
        // channel 2 does not exist on this part
        assert_eq!(sim.write(0x14, &[0, 0]), Err(BusError::Nack));
    }

    #[test]
    fn test_loopback_and_fcr_reset() {
        let mut sim = Wk2132Sim::new();
        sim.set_loopback(0, true);
        sim.write(0x11, b"abc").unwrap();
        assert_eq!(sim.rx_level(0), 3);

        sim.write(0x10, &[page0::FCR, 0x0F]).unwrap();
        assert_eq!(sim.rx_level(0), 0);
        assert_eq!(sim.register(0, 0, page0::FCR), 0x0C);
    }

    #[test]
    fn test_one_shot_fault() {
        let mut sim = Wk2132Sim::new();
        sim.fail_transaction_in(1);
        assert!(sim.write(0x10, &[0, 0]).is_ok());
        assert!(sim.write(0x10, &[0, 0]).is_err());
        assert!(sim.write(0x10, &[0, 0]).is_ok());
    }
}
