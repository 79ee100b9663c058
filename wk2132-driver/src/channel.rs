//! One UART channel of the bridge
//!
//! A channel owns its line parameters and two software buffers. It never
//! holds the bus: every operation that talks to the chip borrows the
//! bridge's [`Registers`] for the duration of the call.
//!
//! # Service step
//!
//! Each cycle moves bytes in both directions, transmit first:
//!
//! 1. Read TFCNT. Zero means empty *or* full, so FSR.TFULL decides. Write
//!    as many pending bytes as the FIFO has room for, in bursts of at most
//!    `max_transfer` bytes. Bytes leave the transmit buffer only once their
//!    burst was acknowledged.
//! 2. Read RFCNT (FSR.RDAT disambiguates zero) and burst-read that many
//!    bytes into the receive buffer. When the buffer is full the oldest
//!    unread bytes are dropped.

use heapless::String;
use wk2132_core::baud::BaudDivisor;
use wk2132_core::buffer::{ByteRing, CHANNEL_BUFFER_SIZE};
use wk2132_core::config::{ChannelConfig, ConfigError, MAX_NAME_LEN};
use wk2132_core::regs::{page0, page1, Page, DATA_BITS, FIFO_SIZE};
use wk2132_core::state::{ChannelEvent, ChannelState};
use wk2132_hal::{I2cBus, Parity, StopBits};

use crate::error::Error;
use crate::registers::{Registers, Scope};

/// Running totals for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStats {
    /// Bytes written to the transmit FIFO
    pub bytes_sent: u32,
    /// Bytes read from the receive FIFO
    pub bytes_received: u32,
    /// Received bytes dropped because the application did not keep up
    pub rx_evicted: u32,
    /// Bytes refused by `write` because the transmit buffer was full
    pub tx_rejected: u32,
    /// Failed bus transactions during service
    pub bus_errors: u32,
}

/// What one service step did for a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelReport {
    /// Bytes moved into the transmit FIFO
    pub sent: usize,
    /// Bytes moved out of the receive FIFO
    pub received: usize,
    /// Received bytes dropped from the receive buffer
    pub evicted: usize,
    /// Failed bus transactions
    pub errors: u8,
}

/// LCR format bits for the given stop bits and parity
pub fn line_format(stop_bits: StopBits, parity: Parity) -> u8 {
    let stop = match stop_bits {
        StopBits::One => 0,
        StopBits::Two => page0::LCR_STPL,
    };
    let parity = match parity {
        Parity::None => 0,
        Parity::Odd => page0::LCR_PAEN | page0::LCR_PAR_ODD,
        Parity::Even => page0::LCR_PAEN | page0::LCR_PAR_EVEN,
    };
    stop | parity
}

/// A UART channel of the bridge
pub struct BridgeChannel {
    index: u8,
    name: String<MAX_NAME_LEN>,
    baud_rate: u32,
    stop_bits: StopBits,
    parity: Parity,
    state: ChannelState,
    tx: ByteRing<CHANNEL_BUFFER_SIZE>,
    rx: ByteRing<CHANNEL_BUFFER_SIZE>,
    stats: ChannelStats,
}

impl BridgeChannel {
    /// Create a channel from its configuration
    pub fn new(config: &ChannelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let stop_bits = config
            .stop_bits()
            .ok_or(ConfigError::InvalidStopBits(config.stop_bits))?;

        Ok(Self {
            index: config.channel,
            name: config.name.clone(),
            baud_rate: config.baud_rate,
            stop_bits,
            parity: config.parity,
            state: ChannelState::Uninitialized,
            tx: ByteRing::new(),
            rx: ByteRing::new(),
            stats: ChannelStats::default(),
        })
    }

    /// Channel number on the chip
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Channel name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured baud rate
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Configured stop bits
    pub fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }

    /// Configured parity
    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// Data bits per frame (fixed at 8 on this chip)
    pub fn data_bits(&self) -> u8 {
        DATA_BITS
    }

    /// Hardware RTS/CTS flow control support
    ///
    /// The WK2132 has no modem control lines.
    pub fn hardware_flow_control(&self) -> bool {
        false
    }

    /// Lifecycle state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Running totals
    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    /// Program the line parameters into the chip
    ///
    /// Both software buffers are discarded, as are the chip FIFOs.
    pub fn configure<B: I2cBus>(
        &mut self,
        regs: &mut Registers<B>,
        crystal: u32,
        baud_rate: u32,
        stop_bits: StopBits,
        parity: Parity,
    ) -> Result<(), Error<B::Error>> {
        let divisor = BaudDivisor::compute(crystal, baud_rate).map_err(|_| {
            warn!("ch{}: {} bps not reachable", self.index, baud_rate);
            Error::UnsupportedBaudRate { baud_rate }
        })?;

        let scope = Scope::Channel(self.index);
        regs.select_page(self.index, Page::Zero).map_err(Error::Bus)?;
        regs.write(scope, page0::SCR, page0::SCR_RXEN | page0::SCR_TXEN)
            .map_err(Error::Bus)?;
        regs.write(
            scope,
            page0::FCR,
            page0::FCR_TFEN | page0::FCR_RFEN | page0::FCR_TFRST | page0::FCR_RFRST,
        )
        .map_err(Error::Bus)?;
        let format = line_format(stop_bits, parity);
        regs.modify(scope, page0::LCR, |lcr| {
            (lcr & !page0::LCR_FORMAT_MASK) | format
        })
        .map_err(Error::Bus)?;
        self.write_divisor(regs, &divisor).map_err(Error::Bus)?;

        self.baud_rate = baud_rate;
        self.stop_bits = stop_bits;
        self.parity = parity;
        self.tx.clear();
        self.rx.clear();
        self.state = self.state.transition(ChannelEvent::Configured);

        debug!(
            "ch{}: {} bps, divisor {}/10, lcr {}",
            self.index,
            baud_rate,
            divisor.tenths(),
            format
        );
        Ok(())
    }

    /// Program the configured line parameters
    pub fn apply<B: I2cBus>(
        &mut self,
        regs: &mut Registers<B>,
        crystal: u32,
    ) -> Result<(), Error<B::Error>> {
        self.configure(regs, crystal, self.baud_rate, self.stop_bits, self.parity)
    }

    fn write_divisor<B: I2cBus>(
        &self,
        regs: &mut Registers<B>,
        divisor: &BaudDivisor,
    ) -> Result<(), B::Error> {
        let scope = Scope::Channel(self.index);
        regs.select_page(self.index, Page::One)?;
        let written = regs
            .write(scope, page1::BRH, divisor.brh())
            .and_then(|_| regs.write(scope, page1::BRL, divisor.brl()))
            .and_then(|_| regs.write(scope, page1::BRD, divisor.brd()));
        // Always head back to page 0, even after a failed write
        let restored = regs.select_page(self.index, Page::Zero);
        written.and(restored)
    }

    /// Queue bytes for transmission
    ///
    /// Never blocks. Returns the number of bytes accepted; the rest did not
    /// fit in the transmit buffer and is left to the caller.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let accepted = self.tx.push_bounded(data);
        let rejected = data.len() - accepted;
        if rejected > 0 {
            self.stats.tx_rejected = self.stats.tx_rejected.wrapping_add(rejected as u32);
            trace!("ch{}: tx buffer full, {} bytes refused", self.index, rejected);
        }
        accepted
    }

    /// Take received bytes, oldest first
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        self.rx.pop_into(buf)
    }

    /// Received bytes waiting to be read
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Next received byte, without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek()
    }

    /// Bytes still waiting to be written to the chip
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    /// Free space in the transmit buffer
    pub fn tx_free(&self) -> usize {
        self.tx.free()
    }

    /// Drop everything waiting in the receive buffer
    pub fn clear_rx(&mut self) {
        self.rx.clear();
    }

    /// Bytes currently held by the chip's transmit FIFO
    pub fn tx_fifo_level<B: I2cBus>(&self, regs: &mut Registers<B>) -> Result<usize, B::Error> {
        let scope = Scope::Channel(self.index);
        let count = regs.read(scope, page0::TFCNT)?;
        if count != 0 {
            return Ok(count as usize);
        }
        let fsr = regs.read(scope, page0::FSR)?;
        Ok(if fsr & page0::FSR_TFULL != 0 {
            FIFO_SIZE
        } else {
            0
        })
    }

    /// Bytes currently held by the chip's receive FIFO
    pub fn rx_fifo_level<B: I2cBus>(&self, regs: &mut Registers<B>) -> Result<usize, B::Error> {
        let scope = Scope::Channel(self.index);
        let count = regs.read(scope, page0::RFCNT)?;
        if count != 0 {
            return Ok(count as usize);
        }
        let fsr = regs.read(scope, page0::FSR)?;
        if fsr & (page0::FSR_RFOE | page0::FSR_RFPE | page0::FSR_RFFE) != 0 {
            warn!("ch{}: receive error, fsr {}", self.index, fsr);
        }
        Ok(if fsr & page0::FSR_RDAT != 0 {
            FIFO_SIZE
        } else {
            0
        })
    }

    /// Move pending bytes into the transmit FIFO
    ///
    /// Returns the number of bytes written. On error, bytes from earlier
    /// bursts of this call stay written and the rest stay queued.
    pub fn transmit<B: I2cBus>(
        &mut self,
        regs: &mut Registers<B>,
        max_transfer: usize,
    ) -> Result<usize, B::Error> {
        if self.tx.is_empty() {
            return Ok(0);
        }

        let max_transfer = max_transfer.clamp(1, FIFO_SIZE);
        let mut room = FIFO_SIZE - self.tx_fifo_level(regs)?;
        let mut chunk = [0u8; FIFO_SIZE];
        let mut sent = 0;

        while room > 0 && !self.tx.is_empty() {
            let len = self.tx.copy_front(&mut chunk[..room.min(max_transfer)]);
            regs.write_fifo(self.index, &chunk[..len])?;
            self.tx.discard(len);
            self.stats.bytes_sent = self.stats.bytes_sent.wrapping_add(len as u32);
            room -= len;
            sent += len;
        }

        if sent > 0 {
            trace!("ch{}: {} bytes to fifo, {} pending", self.index, sent, self.tx.len());
        }
        Ok(sent)
    }

    /// Move received bytes out of the receive FIFO
    ///
    /// Returns `(received, evicted)`. On error, bytes from earlier bursts
    /// of this call are already in the receive buffer.
    pub fn receive<B: I2cBus>(
        &mut self,
        regs: &mut Registers<B>,
        max_transfer: usize,
    ) -> Result<(usize, usize), B::Error> {
        let max_transfer = max_transfer.clamp(1, FIFO_SIZE);
        let mut remaining = self.rx_fifo_level(regs)?;
        let mut chunk = [0u8; FIFO_SIZE];
        let mut received = 0;
        let mut evicted = 0;

        while remaining > 0 {
            let len = remaining.min(max_transfer);
            if let Err(err) = regs.read_fifo(self.index, &mut chunk[..len]) {
                self.log_evicted(evicted);
                return Err(err);
            }
            let dropped = self.rx.push_evicting(&chunk[..len]);
            self.stats.bytes_received = self.stats.bytes_received.wrapping_add(len as u32);
            self.stats.rx_evicted = self.stats.rx_evicted.wrapping_add(dropped as u32);
            evicted += dropped;
            remaining -= len;
            received += len;
        }

        self.log_evicted(evicted);
        Ok((received, evicted))
    }

    fn log_evicted(&self, evicted: usize) {
        if evicted > 0 {
            warn!("ch{}: rx buffer overflow, {} bytes dropped", self.index, evicted);
        }
    }

    /// Push pending bytes to the chip now instead of waiting for the next
    /// service cycle
    ///
    /// Whatever does not fit in the transmit FIFO stays queued.
    pub fn flush<B: I2cBus>(
        &mut self,
        regs: &mut Registers<B>,
        max_transfer: usize,
    ) -> Result<usize, B::Error> {
        let result = regs
            .select_page(self.index, Page::Zero)
            .and_then(|_| self.transmit(regs, max_transfer));
        if result.is_err() {
            self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
            warn!("ch{}: flush failed", self.index);
        }
        result
    }

    /// Run one service step
    ///
    /// Bus errors are logged and counted, never returned; the failed
    /// direction is retried on the next cycle. The report counts every
    /// burst that completed, including those before a failed one.
    pub fn service<B: I2cBus>(
        &mut self,
        regs: &mut Registers<B>,
        max_transfer: usize,
    ) -> ChannelReport {
        let mut report = ChannelReport::default();
        if !self.state.is_serviced() {
            return report;
        }

        if regs.select_page(self.index, Page::Zero).is_err() {
            self.bus_error(&mut report, "page select");
            return report;
        }

        let before = self.stats;
        if self.transmit(regs, max_transfer).is_err() {
            self.bus_error(&mut report, "transmit");
        }
        if self.receive(regs, max_transfer).is_err() {
            self.bus_error(&mut report, "receive");
        }

        // Stats advance per completed burst, so partial transfers count
        report.sent = self.stats.bytes_sent.wrapping_sub(before.bytes_sent) as usize;
        report.received = self.stats.bytes_received.wrapping_sub(before.bytes_received) as usize;
        report.evicted = self.stats.rx_evicted.wrapping_sub(before.rx_evicted) as usize;

        self.state = self.state.transition(ChannelEvent::Serviced);
        report
    }

    fn bus_error(&mut self, report: &mut ChannelReport, step: &str) {
        self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
        report.errors = report.errors.saturating_add(1);
        warn!("ch{}: {} failed", self.index, step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Op, Wk2132Sim};
    use wk2132_core::regs::global;

    const CRYSTAL: u32 = 14_745_600;

    fn setup(baud: u32) -> (BridgeChannel, Registers<Wk2132Sim>) {
        let mut regs = Registers::new(Wk2132Sim::new(), 0x10);
        regs.reset_pages(Some(Page::Zero));
        let mut channel = BridgeChannel::new(&ChannelConfig::new(0, baud)).unwrap();
        channel.apply(&mut regs, CRYSTAL).unwrap();
        regs.bus_mut().clear_log();
        (channel, regs)
    }

    #[test]
    fn test_line_format() {
        assert_eq!(line_format(StopBits::One, Parity::None), 0x00);
        assert_eq!(line_format(StopBits::Two, Parity::None), 0x01);
        assert_eq!(line_format(StopBits::One, Parity::Odd), 0x0A);
        assert_eq!(line_format(StopBits::Two, Parity::Even), 0x0D);
    }

    #[test]
    fn test_configure_sequence() {
        let mut regs = Registers::new(Wk2132Sim::new(), 0x10);
        regs.reset_pages(Some(Page::Zero));
        let mut channel = BridgeChannel::new(&ChannelConfig::new(1, 9600)).unwrap();
        channel.apply(&mut regs, CRYSTAL).unwrap();

        let writes = regs.bus().register_writes(1);
        assert_eq!(
            writes,
            vec![
                (page0::SCR, 0x03),
                (page0::FCR, 0x0F),
                (page0::LCR, 0x00),
                (global::SPAGE, 1),
                (page1::BRH, 0),
                (page1::BRL, 95),
                (page1::BRD, 0),
                (global::SPAGE, 0),
            ]
        );
        assert_eq!(regs.page(1), Some(Page::Zero));
        assert_eq!(channel.state(), ChannelState::Configured);
    }

    #[test]
    fn test_lcr_upper_bits_preserved() {
        let mut sim = Wk2132Sim::new();
        sim.write(0x10, &[page0::LCR, 0xB0]).unwrap();
        let mut regs = Registers::new(sim, 0x10);
        regs.reset_pages(Some(Page::Zero));

        let mut channel = BridgeChannel::new(&ChannelConfig::new(0, 9600)).unwrap();
        channel
            .configure(&mut regs, CRYSTAL, 9600, StopBits::Two, Parity::Even)
            .unwrap();
        assert_eq!(regs.bus().register(0, 0, page0::LCR), 0xBD);
    }

    #[test]
    fn test_unsupported_baud_touches_nothing() {
        let (mut channel, mut regs) = setup(9600);
        let result = channel.configure(&mut regs, CRYSTAL, 500_000, StopBits::One, Parity::None);
        assert_eq!(result, Err(Error::UnsupportedBaudRate { baud_rate: 500_000 }));
        assert!(regs.bus().log().is_empty());
        assert_eq!(channel.baud_rate(), 9600);
    }

    #[test]
    fn test_failed_divisor_write_returns_to_page_zero() {
        let (mut channel, mut regs) = setup(9600);
        // SCR, FCR, LCR read, LCR write, SPAGE=1, then BRH fails
        regs.bus_mut().fail_transaction_in(5);
        let result = channel.configure(&mut regs, CRYSTAL, 19_200, StopBits::One, Parity::None);
        assert!(matches!(result, Err(Error::Bus(_))));
        assert_eq!(regs.page(0), Some(Page::Zero));
        assert_eq!(regs.bus().register(0, 0, global::SPAGE), 0);
    }

    #[test]
    fn test_transmit_single_burst_into_free_slots() {
        let (mut channel, mut regs) = setup(115_200);
        regs.bus_mut().fill_tx(0, 251);
        regs.bus_mut().clear_log();

        assert_eq!(channel.write(b"hello"), 5);
        let report = channel.service(&mut regs, 128);
        assert_eq!(report.sent, 5);
        assert_eq!(channel.pending(), 0);
        assert_eq!(regs.bus().writes_to(0x11), vec![b"hello".to_vec()]);
    }

    #[test]
    fn test_transmit_respects_fifo_room() {
        let (mut channel, mut regs) = setup(115_200);
        regs.bus_mut().fill_tx(0, 253);

        channel.write(b"abcdef");
        assert_eq!(channel.transmit(&mut regs, 128).unwrap(), 3);
        assert_eq!(channel.pending(), 3);
        assert_eq!(regs.bus().tx_level(0), 256);
    }

    #[test]
    fn test_full_tx_fifo_detected_from_status() {
        let (mut channel, mut regs) = setup(115_200);
        regs.bus_mut().fill_tx(0, FIFO_SIZE);
        regs.bus_mut().clear_log();

        channel.write(b"x");
        assert_eq!(channel.transmit(&mut regs, 128).unwrap(), 0);
        assert_eq!(channel.pending(), 1);
        // TFCNT wrapped to 0, FSR consulted, nothing written to the FIFO
        assert!(regs.bus().writes_to(0x11).is_empty());
        assert!(regs
            .bus()
            .log()
            .iter()
            .any(|op| matches!(op, Op::WriteRead { reg, .. } if *reg == page0::FSR)));
    }

    #[test]
    fn test_full_rx_fifo_detected_from_status() {
        let (mut channel, mut regs) = setup(115_200);
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(regs.bus_mut().inject_rx(0, &data), FIFO_SIZE);

        let (received, evicted) = channel.receive(&mut regs, 128).unwrap();
        assert_eq!(received, FIFO_SIZE);
        assert_eq!(evicted, 0);
        assert_eq!(channel.available(), FIFO_SIZE);

        // two bursts of max_transfer
        let reads = regs
            .bus()
            .log()
            .iter()
            .filter(|op| matches!(op, Op::Read { address: 0x11, len: 128 }))
            .count();
        assert_eq!(reads, 2);
    }

    #[test]
    fn test_transmit_bursts_limited_by_max_transfer() {
        let (mut channel, mut regs) = setup(115_200);
        let data = [0x55u8; 200];
        channel.write(&data);

        assert_eq!(channel.transmit(&mut regs, 64).unwrap(), 200);
        let bursts: Vec<usize> = regs.bus().writes_to(0x11).iter().map(|b| b.len()).collect();
        assert_eq!(bursts, vec![64, 64, 64, 8]);
    }

    #[test]
    fn test_failed_burst_keeps_bytes_queued() {
        let (mut channel, mut regs) = setup(115_200);
        channel.write(b"abc");
        // TFCNT and FSR reads succeed, the FIFO write fails
        regs.bus_mut().fail_transaction_in(2);
        assert!(channel.transmit(&mut regs, 128).is_err());
        assert_eq!(channel.pending(), 3);

        assert_eq!(channel.transmit(&mut regs, 128).unwrap(), 3);
        assert_eq!(regs.bus_mut().take_tx(0), b"abc".to_vec());
    }

    #[test]
    fn test_report_counts_bursts_before_failed_write() {
        let (mut channel, mut regs) = setup(115_200);
        channel.write(&[0x42u8; 200]);
        // TFCNT, FSR, first burst, then the second burst fails
        regs.bus_mut().fail_transaction_in(3);

        let report = channel.service(&mut regs, 64);
        assert_eq!(report.errors, 1);
        assert_eq!(report.sent, 64);
        assert_eq!(channel.stats().bytes_sent, 64);
        assert_eq!(channel.pending(), 136);
        assert_eq!(regs.bus().tx_level(0), 64);
    }

    #[test]
    fn test_report_counts_bursts_before_failed_read() {
        let (mut channel, mut regs) = setup(115_200);
        regs.bus_mut().inject_rx(0, &[0x24u8; 200]);
        // RFCNT, first burst, then the second burst fails
        regs.bus_mut().fail_transaction_in(2);

        let report = channel.service(&mut regs, 64);
        assert_eq!(report.errors, 1);
        assert_eq!(report.received, 64);
        assert_eq!(channel.available(), 64);

        // the rest is still in the chip
        let report = channel.service(&mut regs, 64);
        assert_eq!(report.received, 136);
        assert_eq!(channel.available(), 200);
    }

    #[test]
    fn test_receive_overflow_evicts_oldest() {
        let (mut channel, mut regs) = setup(115_200);
        let first: Vec<u8> = (0..200u8).collect();
        regs.bus_mut().inject_rx(0, &first);
        channel.receive(&mut regs, 128).unwrap();

        let second: Vec<u8> = (200..=255u8).chain(0..100u8).collect();
        regs.bus_mut().inject_rx(0, &second);
        let (received, evicted) = channel.receive(&mut regs, 128).unwrap();
        assert_eq!(received, 156);
        assert_eq!(evicted, 100);
        assert_eq!(channel.stats().rx_evicted, 100);

        // oldest surviving byte is the 101st received
        assert_eq!(channel.peek(), Some(100));
        assert_eq!(channel.available(), CHANNEL_BUFFER_SIZE);
    }

    #[test]
    fn test_write_rejects_excess_consistently() {
        let mut channel = BridgeChannel::new(&ChannelConfig::new(0, 9600)).unwrap();
        let block = [0xA5u8; 100];
        let mut total = 0;
        for _ in 0..4 {
            total += channel.write(&block);
        }
        assert_eq!(total, CHANNEL_BUFFER_SIZE);
        assert_eq!(channel.pending(), CHANNEL_BUFFER_SIZE);
        assert_eq!(channel.stats().tx_rejected, 400 - CHANNEL_BUFFER_SIZE as u32);
        assert_eq!(channel.write(&block), 0);
    }

    #[test]
    fn test_receive_nack_keeps_available() {
        let (mut channel, mut regs) = setup(115_200);
        regs.bus_mut().inject_rx(0, b"abc");
        channel.service(&mut regs, 128);
        assert_eq!(channel.available(), 3);

        regs.bus_mut().inject_rx(0, b"def");
        regs.bus_mut().set_fail_fifo_reads(true);
        let report = channel.service(&mut regs, 128);
        assert_eq!(report.errors, 1);
        assert_eq!(channel.available(), 3);
        assert_eq!(channel.stats().bus_errors, 1);

        // bytes are still in the chip and arrive on the next good cycle
        regs.bus_mut().set_fail_fifo_reads(false);
        channel.service(&mut regs, 128);
        let mut buf = [0u8; 8];
        assert_eq!(channel.read(&mut buf), 6);
        assert_eq!(&buf[..6], b"abcdef");
    }

    #[test]
    fn test_uninitialized_channel_is_skipped() {
        let mut regs = Registers::new(Wk2132Sim::new(), 0x10);
        let mut channel = BridgeChannel::new(&ChannelConfig::new(0, 9600)).unwrap();
        assert_eq!(channel.service(&mut regs, 128), ChannelReport::default());
        assert!(regs.bus().log().is_empty());
    }

    #[test]
    fn test_reconfigure_discards_buffers() {
        let (mut channel, mut regs) = setup(9600);
        regs.bus_mut().inject_rx(0, b"old");
        channel.service(&mut regs, 128);
        assert_eq!(channel.state(), ChannelState::Active);
        channel.write(b"stale");

        channel
            .configure(&mut regs, CRYSTAL, 19_200, StopBits::One, Parity::None)
            .unwrap();
        assert_eq!(channel.state(), ChannelState::Configured);
        assert_eq!(channel.available(), 0);
        assert_eq!(channel.pending(), 0);
        assert_eq!(channel.baud_rate(), 19_200);
    }

    #[test]
    fn test_capabilities() {
        let channel = BridgeChannel::new(&ChannelConfig::new(1, 9600)).unwrap();
        assert!(!channel.hardware_flow_control());
        assert_eq!(channel.data_bits(), 8);
        assert_eq!(channel.index(), 1);
    }
}
