//! Register level adapter for the Olimex LPC2378-STK.
//!
//! Implements the driver seams on the board's peripherals:
//!
//! | seam | peripheral |
//! |------|------------|
//! | [`SerialPort`] | SSP0, 9-bit frames (SCK0 P1.20, MISO0 P1.23, MOSI0 P1.24) |
//! | `OutputPin` | fast GPIO: LCD chip select P1.21, LCD reset P3.25 |
//! | `PwmPin` | PWM1 channel 6 on P1.26, LCD backlight |
//! | [`SampleTimer`] | TIMER0 match 0, VIC vector slot 4 |
//! | [`Dac`] | DACR, AOUT on P0.26 |
//!
//! It also provides the `critical-section` implementation for the core,
//! which masks IRQs through the CPSR I bit. Code must run in ARM state.

use core::cell::Cell;
use core::convert::Infallible;
use core::ptr::{read_volatile, write_volatile};

use critical_section::Mutex;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;

use crate::audio::{Dac, SampleTimer};
use crate::interface::SerialPort;

mod reg {
    pub const SCS: usize = 0xE01F_C1A0;
    pub const SCS_GPIOM: u32 = 1 << 0;
    pub const PCONP: usize = 0xE01F_C0C4;
    pub const PCONP_PWM1: u32 = 1 << 6;
    pub const PCONP_SSP0: u32 = 1 << 21;

    pub const PINSEL1: usize = 0xE002_C004;
    pub const PINSEL3: usize = 0xE002_C00C;
    pub const PINMODE1: usize = 0xE002_C044;

    pub const FIO_BASE: usize = 0x3FFF_C000;
    pub const FIO_DIR: usize = 0x00;
    pub const FIO_SET: usize = 0x18;
    pub const FIO_CLR: usize = 0x1C;

    pub const SSP0_BASE: usize = 0xE006_8000;
    pub const SSP_CR0: usize = SSP0_BASE;
    pub const SSP_CR1: usize = SSP0_BASE + 0x04;
    pub const SSP_DR: usize = SSP0_BASE + 0x08;
    pub const SSP_SR: usize = SSP0_BASE + 0x0C;
    pub const SSP_CPSR: usize = SSP0_BASE + 0x10;
    pub const SSP_IMSC: usize = SSP0_BASE + 0x14;
    pub const SSP_DMACR: usize = SSP0_BASE + 0x24;
    pub const SSP_CR1_SSE: u32 = 1 << 1;
    pub const SSP_SR_TNF: u32 = 1 << 1;
    pub const SSP_SR_BSY: u32 = 1 << 4;

    pub const PWM1_BASE: usize = 0xE001_8000;
    pub const PWM_TCR: usize = PWM1_BASE + 0x04;
    pub const PWM_PR: usize = PWM1_BASE + 0x0C;
    pub const PWM_MCR: usize = PWM1_BASE + 0x14;
    pub const PWM_MR0: usize = PWM1_BASE + 0x18;
    pub const PWM_MR6: usize = PWM1_BASE + 0x48;
    pub const PWM_PCR: usize = PWM1_BASE + 0x4C;
    pub const PWM_LER: usize = PWM1_BASE + 0x50;
    pub const PWM_TCR_COUNTER_ENABLE: u32 = 1 << 0;
    pub const PWM_TCR_COUNTER_RESET: u32 = 1 << 1;
    pub const PWM_TCR_PWM_ENABLE: u32 = 1 << 3;
    pub const PWM_MCR_MR0R: u32 = 1 << 1;
    pub const PWM_PCR_ENA6: u32 = 1 << 14;
    pub const PWM_LER_MR0: u32 = 1 << 0;
    pub const PWM_LER_MR6: u32 = 1 << 6;

    pub const T0_BASE: usize = 0xE000_4000;
    pub const T0_IR: usize = T0_BASE;
    pub const T0_TCR: usize = T0_BASE + 0x04;
    pub const T0_PR: usize = T0_BASE + 0x0C;
    pub const T0_MCR: usize = T0_BASE + 0x14;
    pub const T0_MR0: usize = T0_BASE + 0x18;
    pub const T_IR_MR0: u32 = 1 << 0;
    pub const T_TCR_ENABLE: u32 = 1 << 0;
    pub const T_TCR_RESET: u32 = 1 << 1;
    pub const T_MCR_MR0I: u32 = 1 << 0;
    pub const T_MCR_MR0R: u32 = 1 << 1;

    pub const VIC_BASE: usize = 0xFFFF_F000;
    pub const VIC_INT_ENABLE: usize = VIC_BASE + 0x010;
    pub const VIC_INT_EN_CLR: usize = VIC_BASE + 0x014;
    pub const VIC_VECT_ADDR0: usize = VIC_BASE + 0x100;
    pub const VIC_VECT_PRIORITY0: usize = VIC_BASE + 0x200;
    pub const VIC_ADDRESS: usize = VIC_BASE + 0xF00;
    pub const VIC_TIMER0: usize = 4;
    pub const VIC_LOWEST_PRIORITY: u32 = 15;

    pub const DACR: usize = 0xE006_C000;
    pub const DACR_VALUE: u32 = 0xFFC0;
}

#[inline(always)]
fn read(addr: usize) -> u32 {
    unsafe { read_volatile(addr as *const u32) }
}

#[inline(always)]
fn write(addr: usize, val: u32) {
    unsafe { write_volatile(addr as *mut u32, val) }
}

#[inline(always)]
fn modify<F>(addr: usize, f: F)
where
    F: FnOnce(u32) -> u32,
{
    critical_section::with(|_| write(addr, f(read(addr))));
}

/// Put `func` on the two-bit pin function field starting at `shift`.
fn select(addr: usize, shift: u32, func: u32) {
    modify(addr, |v| (v & !(3 << shift)) | (func << shift));
}

/// SSP0 wired to the LCD.
pub struct Ssp0 {
    _private: (),
}

impl SerialPort for Ssp0 {
    fn configure(&mut self, frame_bits: u8, clock_prescale: u8) {
        // SCK0, MISO0, MOSI0
        modify(reg::PINSEL3, |v| v | (3 << 8) | (3 << 14) | (3 << 16));
        modify(reg::PCONP, |v| v | reg::PCONP_SSP0);

        write(reg::SSP_CR1, 0);
        write(reg::SSP_IMSC, 0);
        write(reg::SSP_DMACR, 0);
        write(reg::SSP_CPSR, u32::from(clock_prescale));
        // SPI frame format, CPOL = CPHA = 0, SCR = 0
        write(reg::SSP_CR0, u32::from(frame_bits.saturating_sub(1)) & 0xF);
        modify(reg::SSP_CR1, |v| v | reg::SSP_CR1_SSE);
    }

    fn tx_not_full(&mut self) -> bool {
        read(reg::SSP_SR) & reg::SSP_SR_TNF != 0
    }

    fn busy(&mut self) -> bool {
        read(reg::SSP_SR) & reg::SSP_SR_BSY != 0
    }

    fn write_frame(&mut self, frame: u16) {
        write(reg::SSP_DR, u32::from(frame));
    }

    fn read_frame(&mut self) -> u16 {
        read(reg::SSP_DR) as u16
    }
}

/// A fast GPIO line configured as an output.
pub struct FioPin<const PORT: usize, const PIN: u32> {
    _private: (),
}

pub type LcdChipSelect = FioPin<1, 21>;
pub type LcdReset = FioPin<3, 25>;

impl<const PORT: usize, const PIN: u32> FioPin<PORT, PIN> {
    const BASE: usize = reg::FIO_BASE + PORT * 0x20;

    fn into_output() -> Self {
        modify(Self::BASE + reg::FIO_DIR, |v| v | (1 << PIN));
        FioPin { _private: () }
    }
}

impl<const PORT: usize, const PIN: u32> OutputPin for FioPin<PORT, PIN> {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        write(Self::BASE + reg::FIO_CLR, 1 << PIN);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        write(Self::BASE + reg::FIO_SET, 1 << PIN);
        Ok(())
    }
}

/// PWM1 channel 6 with an 8-bit period, driving the backlight.
pub struct Pwm1Ch6 {
    _private: (),
}

impl Pwm1Ch6 {
    fn setup() -> Self {
        // P1.26 as PWM1.6
        select(reg::PINSEL3, 20, 2);
        modify(reg::PCONP, |v| v | reg::PCONP_PWM1);

        write(reg::PWM_TCR, reg::PWM_TCR_COUNTER_RESET);
        write(reg::PWM_MCR, reg::PWM_MCR_MR0R);
        write(reg::PWM_PR, 0);
        write(reg::PWM_MR0, 0xFF);
        write(reg::PWM_MR6, 0);
        write(reg::PWM_LER, reg::PWM_LER_MR0 | reg::PWM_LER_MR6);
        write(
            reg::PWM_TCR,
            reg::PWM_TCR_COUNTER_ENABLE | reg::PWM_TCR_PWM_ENABLE,
        );
        Pwm1Ch6 { _private: () }
    }
}

impl PwmPin for Pwm1Ch6 {
    type Duty = u8;

    fn disable(&mut self) {
        modify(reg::PWM_PCR, |v| v & !reg::PWM_PCR_ENA6);
    }

    fn enable(&mut self) {
        modify(reg::PWM_PCR, |v| v | reg::PWM_PCR_ENA6);
    }

    fn get_duty(&self) -> u8 {
        read(reg::PWM_MR6) as u8
    }

    fn get_max_duty(&self) -> u8 {
        0xFF
    }

    fn set_duty(&mut self, duty: u8) {
        write(reg::PWM_MR6, u32::from(duty));
        // takes effect at the start of the next period
        write(reg::PWM_LER, reg::PWM_LER_MR6);
    }
}

/// TIMER0 match 0 as the audio sample clock.
///
/// `handler` is installed in VIC slot 4. The runtime's IRQ dispatcher is
/// expected to save context and call it as a plain function; it should do
/// nothing but forward to [`Player::on_interrupt`](crate::audio::Player::on_interrupt).
pub struct Timer0 {
    handler: extern "C" fn(),
}

impl Timer0 {
    /// # Safety
    ///
    /// There must be only one `Timer0` handle in use.
    pub const unsafe fn steal(handler: extern "C" fn()) -> Self {
        Timer0 { handler }
    }
}

impl SampleTimer for Timer0 {
    fn configure(&mut self, prescale: u32, match_value: u32) {
        write(reg::T0_TCR, reg::T_TCR_RESET);
        write(reg::T0_TCR, 0);
        write(reg::T0_PR, prescale.saturating_sub(1));
        write(reg::T0_MR0, match_value.saturating_sub(1));
        write(reg::T0_MCR, reg::T_MCR_MR0I | reg::T_MCR_MR0R);
    }

    fn listen(&mut self) {
        let slot = reg::VIC_TIMER0;
        write(reg::VIC_INT_EN_CLR, 1 << slot);
        write(reg::VIC_VECT_ADDR0 + 4 * slot, self.handler as usize as u32);
        write(reg::VIC_VECT_PRIORITY0 + 4 * slot, reg::VIC_LOWEST_PRIORITY);
        write(reg::VIC_INT_ENABLE, 1 << slot);
    }

    fn start(&mut self) {
        write(reg::T0_TCR, reg::T_TCR_ENABLE);
    }

    fn stop(&mut self) {
        write(reg::T0_TCR, 0);
    }

    fn clear_match(&mut self) {
        write(reg::T0_IR, reg::T_IR_MR0);
    }

    fn end_of_interrupt(&mut self) {
        write(reg::VIC_ADDRESS, 0);
    }

    fn unmask_core_interrupts() {
        // the ARM7 leaves reset with the I bit set; VIC slot 4 has its
        // handler installed by `listen` before this runs
        unsafe { enable_irq() }
    }
}

/// The on-chip 10-bit DAC.
pub struct Dac0 {
    _private: (),
}

impl Dac0 {
    /// # Safety
    ///
    /// There must be only one `Dac0` handle in use.
    pub const unsafe fn steal() -> Self {
        Dac0 { _private: () }
    }
}

impl Dac for Dac0 {
    fn enable(&mut self) {
        // P0.26 as AOUT, neither pull-up nor pull-down
        select(reg::PINSEL1, 20, 2);
        select(reg::PINMODE1, 20, 2);
    }

    fn write(&mut self, value: u32) {
        // VALUE is bits 15:6; BIAS and the reserved bits stay clear
        write(reg::DACR, value & reg::DACR_VALUE);
    }
}

/// Unmask IRQs at the core.
///
/// # Safety
///
/// Every interrupt source unmasked at the VIC must have a handler installed.
pub unsafe fn enable_irq() {
    #[cfg(target_arch = "arm")]
    core::arch::asm!(
        "mrs {0}, cpsr",
        "bic {0}, {0}, #0x80",
        "msr cpsr_c, {0}",
        out(reg) _,
        options(nostack),
    );
}

#[cfg(target_arch = "arm")]
mod cs {
    use critical_section::RawRestoreState;

    const CPSR_I: u32 = 0x80;

    struct CpsrCriticalSection;
    critical_section::set_impl!(CpsrCriticalSection);

    unsafe impl critical_section::Impl for CpsrCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let cpsr: u32;
            core::arch::asm!(
                "mrs {0}, cpsr",
                "orr {1}, {0}, #0x80",
                "msr cpsr_c, {1}",
                out(reg) cpsr,
                out(reg) _,
                options(nostack),
            );
            cpsr
        }

        unsafe fn release(cpsr: RawRestoreState) {
            if cpsr & CPSR_I == 0 {
                super::enable_irq();
            }
        }
    }
}

static TAKEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// The peripherals used by the display and audio drivers.
pub struct Board {
    pub ssp: Ssp0,
    pub lcd_cs: LcdChipSelect,
    pub lcd_reset: LcdReset,
    pub backlight: Pwm1Ch6,
    pub timer: Timer0,
    pub dac: Dac0,
}

impl Board {
    /// Hand out the peripherals, once.
    ///
    /// Switches P0/P1 to fast GPIO, makes the LCD control lines outputs and
    /// starts the backlight PWM with the light off. IRQs stay masked at the
    /// core until [`Player::initialize`](crate::audio::Player::initialize)
    /// runs on `timer`, or until [`enable_irq`] is called.
    pub fn take(timer_handler: extern "C" fn()) -> Option<Board> {
        let first = critical_section::with(|cs| !TAKEN.borrow(cs).replace(true));
        if !first {
            return None;
        }

        modify(reg::SCS, |v| v | reg::SCS_GPIOM);

        let board = Board {
            ssp: Ssp0 { _private: () },
            lcd_cs: LcdChipSelect::into_output(),
            lcd_reset: LcdReset::into_output(),
            backlight: Pwm1Ch6::setup(),
            timer: Timer0 {
                handler: timer_handler,
            },
            dac: Dac0 { _private: () },
        };

        #[cfg(feature = "defmt")]
        defmt::debug!("board peripherals taken");

        Some(board)
    }
}
