use embedded_hal::PwmPin;

/// LCD backlight on a PWM channel with an 8-bit period.
///
/// The level is the duty cycle: 0 is off, 255 is full brightness.
pub struct Backlight<P> {
    pwm: P,
}

impl<P> Backlight<P>
where
    P: PwmPin<Duty = u8>,
{
    /// Take over the channel, enable it and start with the light off.
    pub fn new(mut pwm: P) -> Self {
        pwm.set_duty(0);
        pwm.enable();
        Backlight { pwm }
    }

    pub fn adjust(&mut self, level: u8) {
        self.pwm.set_duty(level.min(self.pwm.get_max_duty()));
    }

    pub fn maximum(&mut self) {
        self.adjust(u8::MAX);
    }

    pub fn off(&mut self) {
        self.adjust(0);
    }

    pub fn level(&self) -> u8 {
        self.pwm.get_duty()
    }

    pub fn release(mut self) -> P {
        self.pwm.disable();
        self.pwm
    }
}
