//! Byte-serial link to the display controller.
//!
//! The S1D15G10 has no D/C pin. Every transfer is a 9-bit frame whose most
//! significant bit tells commands (0) from data (1), framed by chip-select.
//! [`Link`] implements [`WriteOnlyDataCommand`] on top of a 9-bit capable
//! [`SerialPort`], so the drawing code never sees the framing.

use display_interface::{DataFormat, DisplayError, WriteOnlyDataCommand};
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

use crate::config::LinkConfig;

/// Tag bit marking a frame as data rather than a command.
const DATA_TAG: u16 = 0x100;

/// Register level access to a synchronous serial controller.
///
/// This is the only thing a board has to provide to drive the display; the
/// status reads take `&mut self` since reading a hardware register may have
/// side effects.
pub trait SerialPort {
    /// Set the frame width and the clock prescale divisor and enable the port.
    fn configure(&mut self, frame_bits: u8, clock_prescale: u8);

    /// The transmit FIFO can take another frame.
    fn tx_not_full(&mut self) -> bool;

    /// A frame is still being shifted out or in.
    fn busy(&mut self) -> bool;

    /// Queue one frame for transmission.
    fn write_frame(&mut self, frame: u16);

    /// Pop one frame from the receive FIFO.
    fn read_frame(&mut self) -> u16;
}

/// The display link: a serial port plus the chip-select and reset lines.
///
/// There is no locking here. The link must only be driven from one
/// execution context.
pub struct Link<SP, CS, RST> {
    port: SP,
    cs: CS,
    rst: RST,
    config: LinkConfig,
}

impl<SP, CS, RST> Link<SP, CS, RST>
where
    SP: SerialPort,
    CS: OutputPin,
    RST: OutputPin,
{
    pub fn new(port: SP, cs: CS, rst: RST, config: LinkConfig) -> Self {
        Link {
            port,
            cs,
            rst,
            config,
        }
    }

    /// Configure the port, drain stale receive words and deselect the panel.
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.port
            .configure(self.config.frame_bits, self.config.clock_prescale);
        for _ in 0..self.config.drain_reads {
            let _ = self.port.read_frame();
        }
        self.cs.set_high().map_err(|_| DisplayError::CSError)
    }

    /// Pulse the controller's reset line with the panel selected.
    pub fn reset<D>(&mut self, delay: &mut D, settle_us: u32) -> Result<(), DisplayError>
    where
        D: DelayUs<u32>,
    {
        self.cs.set_low().map_err(|_| DisplayError::CSError)?;
        self.rst.set_low().map_err(|_| DisplayError::RSError)?;
        delay.delay_us(settle_us);
        self.rst.set_high().map_err(|_| DisplayError::RSError)?;
        delay.delay_us(settle_us);
        self.cs.set_high().map_err(|_| DisplayError::CSError)
    }

    pub fn send_command(&mut self, byte: u8) -> Result<(), DisplayError> {
        self.transfer(u16::from(byte))
    }

    pub fn send_datum(&mut self, byte: u8) -> Result<(), DisplayError> {
        self.transfer(DATA_TAG | u16::from(byte))
    }

    /// Give back the port and pins.
    pub fn release(self) -> (SP, CS, RST) {
        (self.port, self.cs, self.rst)
    }

    fn transfer(&mut self, frame: u16) -> Result<(), DisplayError> {
        self.cs.set_low().map_err(|_| DisplayError::CSError)?;
        let sent = self.clock_out(frame);
        // deselect even when the bus stalled
        self.cs.set_high().map_err(|_| DisplayError::CSError)?;
        sent
    }

    fn clock_out(&mut self, frame: u16) -> Result<(), DisplayError> {
        self.spin(|port| port.tx_not_full())?;
        self.port.write_frame(frame);
        self.spin(|port| !port.busy())?;
        // full duplex: the echo has to be drained
        let _ = self.port.read_frame();
        Ok(())
    }

    fn spin<F>(&mut self, mut ready: F) -> Result<(), DisplayError>
    where
        F: FnMut(&mut SP) -> bool,
    {
        match self.config.spin_limit {
            None => {
                while !ready(&mut self.port) {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            Some(limit) => {
                for _ in 0..limit {
                    if ready(&mut self.port) {
                        return Ok(());
                    }
                }
                #[cfg(feature = "defmt")]
                defmt::warn!("serial port still not ready after {=u32} polls", limit);
                Err(DisplayError::BusWriteError)
            }
        }
    }

    fn send_each(&mut self, format: DataFormat<'_>, tag: u16) -> Result<(), DisplayError> {
        match format {
            DataFormat::U8(bytes) => {
                for &b in bytes {
                    self.transfer(tag | u16::from(b))?;
                }
                Ok(())
            }
            DataFormat::U8Iter(iter) => {
                for b in iter {
                    self.transfer(tag | u16::from(b))?;
                }
                Ok(())
            }
            _ => Err(DisplayError::DataFormatNotImplemented),
        }
    }
}

impl<SP, CS, RST> WriteOnlyDataCommand for Link<SP, CS, RST>
where
    SP: SerialPort,
    CS: OutputPin,
    RST: OutputPin,
{
    fn send_commands(&mut self, cmds: DataFormat<'_>) -> Result<(), DisplayError> {
        self.send_each(cmds, 0)
    }

    fn send_data(&mut self, buf: DataFormat<'_>) -> Result<(), DisplayError> {
        self.send_each(buf, DATA_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{trace, NoDelay, Trace, TracedPin, TracedPort};
    use display_interface::DataFormat::{U16, U8};
    use std::vec;

    fn link(limit: Option<u32>) -> (Link<TracedPort, TracedPin, TracedPin>, crate::mock::TraceLog) {
        let log = trace();
        let mut config = LinkConfig::default();
        config.spin_limit = limit;
        let link = Link::new(
            TracedPort::new(&log),
            TracedPin::chip_select(&log),
            TracedPin::reset(&log),
            config,
        );
        (link, log)
    }

    #[test]
    fn command_is_framed_by_chip_select() {
        let (mut link, log) = link(None);
        link.send_command(0x75).unwrap();

        assert_eq!(
            log.take(),
            vec![Trace::Cs(false), Trace::Frame(0x075), Trace::Drain, Trace::Cs(true)]
        );
    }

    #[test]
    fn datum_carries_the_tag_bit() {
        let (mut link, log) = link(None);
        link.send_datum(0x83).unwrap();

        assert_eq!(
            log.take(),
            vec![Trace::Cs(false), Trace::Frame(0x183), Trace::Drain, Trace::Cs(true)]
        );
    }

    #[test]
    fn init_configures_and_drains() {
        let (mut link, log) = link(None);
        link.init().unwrap();

        let mut expected = vec![Trace::Configure { bits: 9, prescale: 8 }];
        expected.extend(core::iter::repeat(Trace::Drain).take(8));
        expected.push(Trace::Cs(true));
        assert_eq!(log.take(), expected);
    }

    #[test]
    fn reset_pulses_with_panel_selected() {
        let (mut link, log) = link(None);
        link.reset(&mut NoDelay, 10).unwrap();

        assert_eq!(
            log.take(),
            vec![Trace::Cs(false), Trace::Reset(false), Trace::Reset(true), Trace::Cs(true)]
        );
    }

    #[test]
    fn waits_for_the_bus_before_and_after_a_frame() {
        let (mut link, log) = link(Some(16));
        link.port.stall_tx(3);
        link.port.stall_busy(5);
        link.send_datum(0x00).unwrap();

        let frames: usize = log.take().iter().filter(|t| matches!(t, Trace::Frame(_))).count();
        assert_eq!(frames, 1);
        assert_eq!(link.port.polls(), (4, 6));
    }

    #[test]
    fn stuck_bus_times_out_and_deselects() {
        let (mut link, log) = link(Some(10));
        link.port.stall_busy(u32::MAX);

        let result = link.send_command(0xAF);
        assert!(matches!(result, Err(DisplayError::BusWriteError)));
        assert_eq!(log.take().last(), Some(&Trace::Cs(true)));
    }

    #[test]
    fn interface_streams_bytes_and_iterators() {
        let (mut link, log) = link(None);
        link.send_commands(U8(&[0x5C])).unwrap();
        link.send_data(DataFormat::U8Iter(&mut [1u8, 2].into_iter())).unwrap();

        let frames: std::vec::Vec<u16> = log
            .take()
            .into_iter()
            .filter_map(|t| match t {
                Trace::Frame(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(frames, vec![0x05C, 0x101, 0x102]);
    }

    #[test]
    fn wide_formats_are_refused() {
        let (mut link, _log) = link(None);
        let result = link.send_data(U16(&[0x1234]));
        assert!(matches!(result, Err(DisplayError::DataFormatNotImplemented)));
    }
}
