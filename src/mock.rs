//! Host-side stand-ins for the hardware seams, used by the unit tests.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;
use std::vec;
use std::vec::Vec;

use display_interface::{DataFormat, DisplayError, WriteOnlyDataCommand};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::OutputPin;

use crate::audio::{Dac, SampleTimer};
use crate::color::{unpack_pair, Rgb12};
use crate::command::opcode;
use crate::interface::SerialPort;

const SIDE: usize = 132;

/// One byte seen by the panel, tagged the way the link would tag it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    Command(u8),
    Data(u8),
}

/// A display controller model.
///
/// Records every transfer and interprets the address window commands and
/// memory writes well enough to tell which pixels ended up with which colour.
pub struct Panel {
    log: Vec<Transfer>,
    current: Option<u8>,
    params: Vec<u8>,
    pages: (u8, u8),
    columns: (u8, u8),
    cursor: (u8, u8),
    pending: Vec<u8>,
    memory: Vec<Option<Rgb12>>,
}

impl Panel {
    pub fn new() -> Self {
        Panel {
            log: Vec::new(),
            current: None,
            params: Vec::new(),
            pages: (0, SIDE as u8 - 1),
            columns: (0, SIDE as u8 - 1),
            cursor: (0, 0),
            pending: Vec::new(),
            memory: vec![None; SIDE * SIDE],
        }
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.log.clone()
    }

    /// Parameters of the first occurrence of `op`.
    pub fn data_after(&self, op: u8) -> Vec<u8> {
        self.data_runs_after(op).into_iter().next().unwrap_or_default()
    }

    /// Parameters of every occurrence of `op`, in order.
    pub fn data_runs_after(&self, op: u8) -> Vec<Vec<u8>> {
        self.log
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == Transfer::Command(op))
            .map(|(i, _)| {
                self.log[i + 1..]
                    .iter()
                    .map_while(|t| match t {
                        Transfer::Data(b) => Some(*b),
                        Transfer::Command(_) => None,
                    })
                    .collect()
            })
            .collect()
    }

    pub fn pixel(&self, x: u8, y: u8) -> Option<Rgb12> {
        self.memory
            .get(usize::from(x) * SIDE + usize::from(y))
            .copied()
            .flatten()
    }

    /// Number of distinct pixels written so far.
    pub fn painted(&self) -> usize {
        self.memory.iter().filter(|p| p.is_some()).count()
    }

    fn command(&mut self, op: u8) {
        self.log.push(Transfer::Command(op));
        self.current = Some(op);
        self.params.clear();
        self.pending.clear();
        if op == opcode::RAMWR {
            self.cursor = (self.pages.0, self.columns.0);
        }
    }

    fn data(&mut self, byte: u8) {
        self.log.push(Transfer::Data(byte));
        match self.current {
            Some(opcode::RAMWR) => {
                self.pending.push(byte);
                if let [a, b, c] = self.pending[..] {
                    let (first, second) = unpack_pair([a, b, c]);
                    self.pending.clear();
                    self.put(first);
                    self.put(second);
                }
            }
            Some(op) => {
                self.params.push(byte);
                if let [start, end] = self.params[..] {
                    match op {
                        opcode::PASET => self.pages = (start, end),
                        opcode::CASET => self.columns = (start, end),
                        _ => {}
                    }
                }
            }
            None => {}
        }
    }

    // column address runs fastest, the window wraps at its end
    fn put(&mut self, color: Rgb12) {
        let (x, y) = self.cursor;
        if let Some(cell) = self.memory.get_mut(usize::from(x) * SIDE + usize::from(y)) {
            *cell = Some(color);
        }

        let (mut x, mut y) = (x, y + 1);
        if y > self.columns.1 {
            y = self.columns.0;
            x += 1;
            if x > self.pages.1 {
                x = self.pages.0;
            }
        }
        self.cursor = (x, y);
    }
}

fn bytes(format: DataFormat<'_>) -> Result<Vec<u8>, DisplayError> {
    match format {
        DataFormat::U8(b) => Ok(b.to_vec()),
        DataFormat::U8Iter(iter) => Ok(iter.collect()),
        _ => Err(DisplayError::DataFormatNotImplemented),
    }
}

impl WriteOnlyDataCommand for Panel {
    fn send_commands(&mut self, cmds: DataFormat<'_>) -> Result<(), DisplayError> {
        for op in bytes(cmds)? {
            self.command(op);
        }
        Ok(())
    }

    fn send_data(&mut self, buf: DataFormat<'_>) -> Result<(), DisplayError> {
        for b in bytes(buf)? {
            self.data(b);
        }
        Ok(())
    }
}

/// Bus events in the order the link produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trace {
    Cs(bool),
    Reset(bool),
    Frame(u16),
    Drain,
    Configure { bits: u8, prescale: u8 },
}

/// Event log shared between a port and its pins.
#[derive(Clone, Default)]
pub struct TraceLog(Rc<RefCell<Vec<Trace>>>);

impl TraceLog {
    pub fn push(&self, event: Trace) {
        self.0.borrow_mut().push(event);
    }

    /// Return and forget everything logged so far.
    pub fn take(&self) -> Vec<Trace> {
        core::mem::take(&mut *self.0.borrow_mut())
    }
}

pub fn trace() -> TraceLog {
    TraceLog::default()
}

/// A serial port that always succeeds after an optional number of stalled polls.
pub struct TracedPort {
    log: TraceLog,
    tx_stalls: u32,
    busy_stalls: u32,
    tx_polls: u32,
    busy_polls: u32,
}

impl TracedPort {
    pub fn new(log: &TraceLog) -> Self {
        TracedPort {
            log: log.clone(),
            tx_stalls: 0,
            busy_stalls: 0,
            tx_polls: 0,
            busy_polls: 0,
        }
    }

    /// Report a full transmit FIFO for the next `n` polls.
    pub fn stall_tx(&mut self, n: u32) {
        self.tx_stalls = n;
    }

    /// Report busy for the next `n` polls.
    pub fn stall_busy(&mut self, n: u32) {
        self.busy_stalls = n;
    }

    /// Status polls seen as (transmit FIFO, busy).
    pub fn polls(&self) -> (u32, u32) {
        (self.tx_polls, self.busy_polls)
    }
}

impl SerialPort for TracedPort {
    fn configure(&mut self, frame_bits: u8, clock_prescale: u8) {
        self.log.push(Trace::Configure {
            bits: frame_bits,
            prescale: clock_prescale,
        });
    }

    fn tx_not_full(&mut self) -> bool {
        self.tx_polls += 1;
        if self.tx_stalls > 0 {
            self.tx_stalls -= 1;
            return false;
        }
        true
    }

    fn busy(&mut self) -> bool {
        self.busy_polls += 1;
        if self.busy_stalls > 0 {
            self.busy_stalls -= 1;
            return true;
        }
        false
    }

    fn write_frame(&mut self, frame: u16) {
        self.log.push(Trace::Frame(frame));
    }

    fn read_frame(&mut self) -> u16 {
        self.log.push(Trace::Drain);
        0
    }
}

/// An output pin that logs its level changes.
pub struct TracedPin {
    log: TraceLog,
    event: fn(bool) -> Trace,
}

impl TracedPin {
    pub fn chip_select(log: &TraceLog) -> Self {
        TracedPin {
            log: log.clone(),
            event: Trace::Cs,
        }
    }

    pub fn reset(log: &TraceLog) -> Self {
        TracedPin {
            log: log.clone(),
            event: Trace::Reset,
        }
    }
}

impl OutputPin for TracedPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push((self.event)(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push((self.event)(true));
        Ok(())
    }
}

pub struct NoDelay;

impl DelayUs<u32> for NoDelay {
    fn delay_us(&mut self, _us: u32) {}
}

impl DelayMs<u32> for NoDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

std::thread_local! {
    static CORE_UNMASKS: Cell<u32> = Cell::new(0);
}

#[derive(Debug, Default)]
pub struct FakeTimer {
    pub divisors: Option<(u32, u32)>,
    pub listening: bool,
    pub running: bool,
    pub starts: u32,
    pub acks: u32,
    pub end_of_interrupts: u32,
}

impl SampleTimer for FakeTimer {
    fn configure(&mut self, prescale: u32, match_value: u32) {
        self.divisors = Some((prescale, match_value));
    }

    fn listen(&mut self) {
        self.listening = true;
    }

    fn start(&mut self) {
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn clear_match(&mut self) {
        self.acks += 1;
    }

    fn end_of_interrupt(&mut self) {
        self.end_of_interrupts += 1;
    }

    fn unmask_core_interrupts() {
        CORE_UNMASKS.with(|n| n.set(n.get() + 1));
    }
}

impl FakeTimer {
    /// Core unmask requests made on this thread.
    pub fn core_unmasks() -> u32 {
        CORE_UNMASKS.with(Cell::get)
    }
}

#[derive(Debug, Default)]
pub struct FakeDac {
    pub enabled: bool,
    pub writes: Vec<u32>,
}

impl Dac for FakeDac {
    fn enable(&mut self) {
        self.enabled = true;
    }

    fn write(&mut self, value: u32) {
        self.writes.push(value);
    }
}
