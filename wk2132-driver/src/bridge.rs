//! Bridge component
//!
//! The bridge owns the bus, the chip-wide registers and a fixed two-slot
//! channel table indexed by channel number. Every transaction for either
//! channel goes through it, and `&mut self` on every bus operation keeps
//! transactions from interleaving.
//!
//! # Lifecycle
//!
//! ```text
//! new / from_config -> add_channel* -> initialize -> configure_channel*
//!                                          |
//!                                          +-> service (periodically)
//! ```
//!
//! [`Bridge::setup`] runs `initialize` and configures every registered
//! channel with its configured line parameters.

use heapless::String;
use wk2132_core::config::{BridgeConfig, ChannelConfig, ConfigError, TestMode, MAX_NAME_LEN};
use wk2132_core::regs::{global, Page, CHANNEL_COUNT, FIFO_SIZE};
use wk2132_core::selftest::{LoopbackProbe, ProbeOutcome};
use wk2132_core::state::{BridgeEvent, BridgeState};
use wk2132_hal::{I2cBus, Parity, StopBits};

use crate::channel::{BridgeChannel, ChannelReport};
use crate::error::Error;
use crate::registers::{Registers, Scope};
use crate::uart::ChannelUart;

/// Summary of one service cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceReport {
    /// Cycle number, counting from 0
    pub cycle: u32,
    /// Per-channel results, indexed by channel number
    pub channels: [ChannelReport; CHANNEL_COUNT],
    /// Loopback rounds finished during this cycle
    pub selftest: [Option<ProbeOutcome>; CHANNEL_COUNT],
}

impl ServiceReport {
    /// Bytes written to the chip across all channels
    pub fn sent(&self) -> usize {
        self.channels.iter().map(|c| c.sent).sum()
    }

    /// Bytes read from the chip across all channels
    pub fn received(&self) -> usize {
        self.channels.iter().map(|c| c.received).sum()
    }

    /// Failed bus transactions across all channels
    pub fn errors(&self) -> u32 {
        self.channels.iter().map(|c| c.errors as u32).sum()
    }
}

/// WK2132 bridge component
pub struct Bridge<B> {
    name: String<MAX_NAME_LEN>,
    crystal: u32,
    test_mode: TestMode,
    max_transfer: usize,
    state: BridgeState,
    regs: Registers<B>,
    channels: [Option<BridgeChannel>; CHANNEL_COUNT],
    probes: [Option<LoopbackProbe>; CHANNEL_COUNT],
    cycles: u32,
}

impl<B: I2cBus> Bridge<B> {
    /// Create a bridge without channels
    ///
    /// Only the chip-level settings of `config` are used; its channel list
    /// is ignored (see [`Bridge::from_config`]).
    pub fn new(bus: B, config: &BridgeConfig) -> Result<Self, Error<B::Error>> {
        config.validate_settings()?;
        let test_mode = config
            .test_mode()
            .ok_or(ConfigError::InvalidTestMode(config.test_mode))?;

        Ok(Self {
            name: config.name.clone(),
            crystal: config.crystal,
            test_mode,
            max_transfer: config.max_transfer as usize,
            state: BridgeState::Created,
            regs: Registers::new(bus, config.address),
            channels: [None, None],
            probes: [None, None],
            cycles: 0,
        })
    }

    /// Create a bridge and register every configured channel
    pub fn from_config(bus: B, config: &BridgeConfig) -> Result<Self, Error<B::Error>> {
        config.validate()?;
        let mut bridge = Self::new(bus, config)?;
        for channel in &config.uart {
            bridge.add_channel(channel)?;
        }
        Ok(bridge)
    }

    /// Register a channel
    ///
    /// Only possible before [`Bridge::initialize`].
    pub fn add_channel(&mut self, config: &ChannelConfig) -> Result<(), Error<B::Error>> {
        if !self.state.accepts_channels() {
            return Err(Error::AlreadyInitialized);
        }

        let channel = BridgeChannel::new(config)?;
        let index = channel.index() as usize;
        let slot = self
            .channels
            .get_mut(index)
            .ok_or(ConfigError::InvalidChannel(config.channel))?;
        if slot.is_some() {
            return Err(ConfigError::DuplicateChannel(config.channel).into());
        }
        *slot = Some(channel);

        if self.test_mode == TestMode::Loopback {
            self.probes[index] = Some(LoopbackProbe::new(self.max_transfer as u16));
        }
        debug!("{}: channel {} registered", self.name.as_str(), index);
        Ok(())
    }

    /// Probe and reset the chip
    ///
    /// Reads GENA to check the chip answers, enables both UART clocks,
    /// soft-resets both channels and selects register page 0. Runs once;
    /// a failure leaves the bridge in [`BridgeState::Failed`].
    pub fn initialize(&mut self) -> Result<(), Error<B::Error>> {
        if self.state != BridgeState::Created {
            return Err(Error::AlreadyInitialized);
        }

        match self.reset_chip() {
            Ok(()) => {
                self.state = self.state.transition(BridgeEvent::InitSucceeded);
                info!(
                    "{}: WK2132 ready at {}, test mode {}",
                    self.name.as_str(),
                    self.regs.base(),
                    self.test_mode.value()
                );
                Ok(())
            }
            Err(err) => {
                self.state = self.state.transition(BridgeEvent::InitFailed);
                error!("{}: initialization failed", self.name.as_str());
                Err(err)
            }
        }
    }

    fn reset_chip(&mut self) -> Result<(), Error<B::Error>> {
        self.regs
            .read(Scope::Global, global::GENA)
            .map_err(|_| Error::DeviceNotFound)?;

        self.regs
            .write(Scope::Global, global::GENA, global::GENA_C1EN | global::GENA_C2EN)
            .map_err(Error::Bus)?;
        self.regs
            .write(Scope::Global, global::GRST, global::GRST_C1RST | global::GRST_C2RST)
            .map_err(Error::Bus)?;
        self.regs
            .write(Scope::Global, global::SPAGE, Page::Zero.value())
            .map_err(Error::Bus)?;

        // soft reset puts both channels back on page 0
        self.regs.reset_pages(Some(Page::Zero));
        Ok(())
    }

    /// Program every registered channel with its configured parameters
    pub fn initialize_channels(&mut self) -> Result<(), Error<B::Error>> {
        self.require_ready()?;
        for channel in self.channels.iter_mut().flatten() {
            channel.apply(&mut self.regs, self.crystal)?;
        }
        Ok(())
    }

    /// Program new line parameters into one channel
    pub fn configure_channel(
        &mut self,
        index: u8,
        baud_rate: u32,
        stop_bits: StopBits,
        parity: Parity,
    ) -> Result<(), Error<B::Error>> {
        self.require_ready()?;
        let channel = self
            .channels
            .get_mut(index as usize)
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownChannel(index))?;
        channel.configure(&mut self.regs, self.crystal, baud_rate, stop_bits, parity)
    }

    /// Initialize the chip and configure every channel
    pub fn setup(&mut self) -> Result<(), Error<B::Error>> {
        self.initialize()?;
        self.initialize_channels()?;
        self.log_config();
        Ok(())
    }

    /// Read a register
    pub fn read_register(&mut self, scope: Scope, reg: u8) -> Result<u8, Error<B::Error>> {
        check_scope(scope)?;
        self.regs.read(scope, reg).map_err(Error::Bus)
    }

    /// Write a register
    pub fn write_register(
        &mut self,
        scope: Scope,
        reg: u8,
        value: u8,
    ) -> Result<(), Error<B::Error>> {
        check_scope(scope)?;
        self.regs.write(scope, reg, value).map_err(Error::Bus)
    }

    /// Read, change and write back a register, returning the new value
    pub fn modify_register<F>(
        &mut self,
        scope: Scope,
        reg: u8,
        f: F,
    ) -> Result<u8, Error<B::Error>>
    where
        F: FnOnce(u8) -> u8,
    {
        check_scope(scope)?;
        self.regs.modify(scope, reg, f).map_err(Error::Bus)
    }

    /// Run one service cycle
    ///
    /// Channels are serviced in ascending order. Bus errors are logged and
    /// counted per channel; one failing channel does not keep the other
    /// from being serviced. Does nothing until the bridge is ready.
    pub fn service(&mut self) -> ServiceReport {
        let mut report = ServiceReport {
            cycle: self.cycles,
            ..Default::default()
        };
        if !self.state.is_ready() {
            return report;
        }
        self.cycles = self.cycles.wrapping_add(1);

        for (slot, channel) in self.channels.iter_mut().enumerate() {
            if let Some(channel) = channel {
                report.channels[slot] = channel.service(&mut self.regs, self.max_transfer);
            }
        }

        match self.test_mode {
            TestMode::Off => {}
            TestMode::Echo => self.echo(),
            TestMode::Loopback => self.loopback(&mut report),
        }

        if self.test_mode.is_active() && (report.sent() > 0 || report.received() > 0) {
            debug!(
                "cycle {}: {} bytes out, {} bytes in",
                report.cycle,
                report.sent(),
                report.received()
            );
        }
        report
    }

    /// Send every received byte back on the same channel
    fn echo(&mut self) {
        let mut buf = [0u8; FIFO_SIZE];
        for channel in self.channels.iter_mut().flatten() {
            if !channel.state().is_serviced() {
                continue;
            }
            let room = channel.tx_free().min(buf.len());
            let count = channel.read(&mut buf[..room]);
            if count > 0 {
                channel.write(&buf[..count]);
                trace!("ch{}: echo {} bytes", channel.index(), count);
            }
        }
    }

    /// Advance the loopback self-test of every channel
    fn loopback(&mut self, report: &mut ServiceReport) {
        let mut buf = [0u8; FIFO_SIZE];
        for (slot, (channel, probe)) in self
            .channels
            .iter_mut()
            .zip(self.probes.iter_mut())
            .enumerate()
        {
            let (Some(channel), Some(probe)) = (channel, probe) else {
                continue;
            };
            if !channel.state().is_serviced() {
                continue;
            }

            if probe.is_idle() {
                if channel.pending() == 0 {
                    channel.clear_rx();
                    let len = probe.fill(&mut buf);
                    channel.write(&buf[..len]);
                    probe.start();
                }
                continue;
            }

            let outcome = if channel.available() >= probe.pattern_len() {
                let len = channel.read(&mut buf[..probe.pattern_len()]);
                Some(probe.check(&buf[..len]))
            } else {
                let timed_out = probe.tick(channel.available());
                if timed_out.is_some() {
                    channel.clear_rx();
                }
                timed_out
            };

            if let Some(outcome) = outcome {
                if outcome.passed() {
                    info!("ch{}: loopback test passed", slot);
                } else {
                    warn!("ch{}: loopback test failed: {:?}", slot, outcome);
                }
                report.selftest[slot] = Some(outcome);
            }
        }
    }

    /// Log the bridge and channel configuration
    pub fn log_config(&self) {
        info!(
            "{}: WK2132 at {}, crystal {} Hz, test mode {}, max transfer {}",
            self.name.as_str(),
            self.regs.base(),
            self.crystal,
            self.test_mode.value(),
            self.max_transfer
        );
        for channel in self.channels.iter().flatten() {
            info!(
                "  ch{} {}: {} bps, {} data bits, {} stop bits, parity {}",
                channel.index(),
                channel.name(),
                channel.baud_rate(),
                channel.data_bits(),
                channel.stop_bits().count(),
                channel.parity().as_str()
            );
        }
    }

    /// UART handle for one channel
    pub fn channel(&mut self, index: u8) -> Result<ChannelUart<'_, B>, Error<B::Error>> {
        if self.channel_ref(index).is_none() {
            return Err(Error::UnknownChannel(index));
        }
        Ok(ChannelUart::new(self, index))
    }

    /// Move received bytes of channel `from` into the transmit buffer of
    /// channel `to`
    ///
    /// Takes only what the destination can queue; the rest stays readable
    /// on `from` for a later call. Returns the number of bytes moved.
    pub fn forward(&mut self, from: u8, to: u8) -> Result<usize, Error<B::Error>> {
        let mut buf = [0u8; FIFO_SIZE];
        let room = self.data_path(to)?.0.tx_free().min(buf.len());
        let (source, _, _) = self.data_path(from)?;
        let count = source.read(&mut buf[..room]);
        if count > 0 {
            let (destination, _, _) = self.data_path(to)?;
            destination.write(&buf[..count]);
            trace!("ch{} -> ch{}: {} bytes", from, to, count);
        }
        Ok(count)
    }

    /// Channel state and buffers, read-only
    pub fn channel_ref(&self, index: u8) -> Option<&BridgeChannel> {
        self.channels.get(index as usize).and_then(Option::as_ref)
    }

    /// Registered channel numbers, ascending
    pub fn channel_indices(&self) -> impl Iterator<Item = u8> + '_ {
        self.channels.iter().flatten().map(BridgeChannel::index)
    }

    /// Loopback probe of a channel (loopback test mode only)
    pub fn selftest(&self, index: u8) -> Option<&LoopbackProbe> {
        self.probes.get(index as usize).and_then(Option::as_ref)
    }

    /// Lifecycle state
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Bridge name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base I2C address
    pub fn address(&self) -> u8 {
        self.regs.base()
    }

    /// Crystal frequency in Hz
    pub fn crystal(&self) -> u32 {
        self.crystal
    }

    /// Diagnostic mode
    pub fn test_mode(&self) -> TestMode {
        self.test_mode
    }

    /// Largest single FIFO transfer in bytes
    pub fn max_transfer(&self) -> usize {
        self.max_transfer
    }

    /// Service cycles run so far
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Shared access to the bus
    pub fn bus(&self) -> &B {
        self.regs.bus()
    }

    /// Exclusive access to the bus
    pub fn bus_mut(&mut self) -> &mut B {
        self.regs.bus_mut()
    }

    /// Tear down the bridge and give the bus back
    pub fn release(self) -> B {
        self.regs.release()
    }

    /// Channel, register layer and transfer size for a data operation
    pub(crate) fn data_path(
        &mut self,
        index: u8,
    ) -> Result<(&mut BridgeChannel, &mut Registers<B>, usize), Error<B::Error>> {
        self.require_ready()?;
        let channel = self
            .channels
            .get_mut(index as usize)
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownChannel(index))?;
        if !channel.state().accepts_data() {
            return Err(Error::NotInitialized);
        }
        Ok((channel, &mut self.regs, self.max_transfer))
    }

    fn require_ready(&self) -> Result<(), Error<B::Error>> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }
}

fn check_scope<E>(scope: Scope) -> Result<(), Error<E>> {
    match scope {
        Scope::Channel(index) if index as usize >= CHANNEL_COUNT => {
            Err(Error::UnknownChannel(index))
        }
        _ => Ok(()),
    }
}
