//! Generic UART surface of a bridge channel

use wk2132_hal::{I2cBus, Parity, StopBits, UartRx, UartTx};

use crate::bridge::Bridge;
use crate::channel::BridgeChannel;
use crate::error::Error;

/// A channel borrowed from its bridge, usable as a plain UART
///
/// Reads and writes only touch the software buffers; bytes cross the bus
/// during [`Bridge::service`] or an explicit [`UartTx::flush`].
pub struct ChannelUart<'a, B> {
    bridge: &'a mut Bridge<B>,
    index: u8,
}

impl<'a, B: I2cBus> ChannelUart<'a, B> {
    pub(crate) fn new(bridge: &'a mut Bridge<B>, index: u8) -> Self {
        Self { bridge, index }
    }

    /// Channel number on the chip
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Bytes still waiting to be written to the chip
    pub fn pending(&self) -> usize {
        self.channel().map(BridgeChannel::pending).unwrap_or(0)
    }

    /// Change the line parameters
    pub fn configure(
        &mut self,
        baud_rate: u32,
        stop_bits: StopBits,
        parity: Parity,
    ) -> Result<(), Error<B::Error>> {
        self.bridge
            .configure_channel(self.index, baud_rate, stop_bits, parity)
    }

    fn channel(&self) -> Option<&BridgeChannel> {
        self.bridge.channel_ref(self.index)
    }
}

impl<B: I2cBus> UartTx for ChannelUart<'_, B> {
    type Error = Error<B::Error>;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        let (channel, _, _) = self.bridge.data_path(self.index)?;
        if data.is_empty() {
            return Ok(0);
        }
        match channel.write(data) {
            0 => Err(Error::BufferFull),
            accepted => Ok(accepted),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let (channel, regs, max_transfer) = self.bridge.data_path(self.index)?;
        channel.flush(regs, max_transfer).map_err(Error::Bus)?;
        Ok(())
    }
}

impl<B: I2cBus> UartRx for ChannelUart<'_, B> {
    type Error = Error<B::Error>;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let (channel, _, _) = self.bridge.data_path(self.index)?;
        Ok(channel.read(buf))
    }

    fn available(&self) -> usize {
        self.channel().map(BridgeChannel::available).unwrap_or(0)
    }

    fn peek(&self) -> Option<u8> {
        self.channel().and_then(BridgeChannel::peek)
    }
}
