//! Busy-wait delays for boards without a spare timer.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

/// Calibrated spin loop.
///
/// `loops_per_us` has to be measured for the core clock and memory the code
/// runs from; the delay is only as accurate as that figure. Waits are never
/// shorter than one loop iteration per microsecond requested.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpinDelay {
    loops_per_us: u32,
}

impl SpinDelay {
    pub const fn new(loops_per_us: u32) -> Self {
        SpinDelay { loops_per_us }
    }

    /// Roughly calibrated for a 72 MHz ARM7TDMI-S running from flash.
    pub const fn lpc2378() -> Self {
        SpinDelay::new(12)
    }

    fn spin(&self, loops: u64) {
        let mut n = 0u64;
        while core::hint::black_box(n) < loops {
            n += 1;
        }
    }

    fn loops(&self, us: u32) -> u64 {
        u64::from(us) * u64::from(self.loops_per_us.max(1))
    }
}

impl DelayUs<u32> for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        self.spin(self.loops(us));
    }
}

impl DelayUs<u16> for SpinDelay {
    fn delay_us(&mut self, us: u16) {
        self.spin(self.loops(u32::from(us)));
    }
}

impl DelayMs<u32> for SpinDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.spin(self.loops(ms) * 1000);
    }
}

impl DelayMs<u16> for SpinDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.spin(self.loops(u32::from(ms)) * 1000);
    }
}
