//! CADC I/O bridge.
//!
//! Decodes the 4-bit I/O control field each tick:
//!
//! | Code | Action                          |
//! |------|---------------------------------|
//! | 0    | no operation                    |
//! | 1-5  | latch sensor Ps/Qc/TAT/AN/DIG   |
//! | 6-12 | write output channel            |
//! | 13   | write BIT status (data bit 0)   |
//! | 14-15| no operation                    |
//!
//! Every read or write pulses `ready` for one tick. Output registers are
//! presented externally only while the channel is active; an inactive
//! channel reads as zero but keeps its register contents.

use cadc_core::{Observable, Synchronous, Value, Word};

/// The five sensor inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChannel {
    /// Static pressure.
    Ps,
    /// Impact pressure.
    Qc,
    /// Total air temperature.
    Tat,
    Analog,
    Digital,
}

/// The seven output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    Mach,
    Altitude,
    Airspeed,
    VerticalSpeed,
    WingSweep,
    Flap,
    GloveVane,
}

impl OutputChannel {
    pub const ALL: [Self; 7] = [
        Self::Mach,
        Self::Altitude,
        Self::Airspeed,
        Self::VerticalSpeed,
        Self::WingSweep,
        Self::Flap,
        Self::GloveVane,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mach => "mach",
            Self::Altitude => "altitude",
            Self::Airspeed => "airspeed",
            Self::VerticalSpeed => "vertical_speed",
            Self::WingSweep => "wing_sweep",
            Self::Flap => "flap",
            Self::GloveVane => "glove_vane",
        }
    }
}

/// Decoded I/O control field (microword bits 3..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoControl {
    #[default]
    Nop,
    Read(SensorChannel),
    Write(OutputChannel),
    WriteBit,
    /// Codes 14 and 15.
    Reserved(u8),
}

impl IoControl {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x0F {
            0 => Self::Nop,
            1 => Self::Read(SensorChannel::Ps),
            2 => Self::Read(SensorChannel::Qc),
            3 => Self::Read(SensorChannel::Tat),
            4 => Self::Read(SensorChannel::Analog),
            5 => Self::Read(SensorChannel::Digital),
            6 => Self::Write(OutputChannel::Mach),
            7 => Self::Write(OutputChannel::Altitude),
            8 => Self::Write(OutputChannel::Airspeed),
            9 => Self::Write(OutputChannel::VerticalSpeed),
            10 => Self::Write(OutputChannel::WingSweep),
            11 => Self::Write(OutputChannel::Flap),
            12 => Self::Write(OutputChannel::GloveVane),
            13 => Self::WriteBit,
            other => Self::Reserved(other),
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Nop => 0,
            Self::Read(ch) => 1 + ch as u8,
            Self::Write(ch) => 6 + ch as u8,
            Self::WriteBit => 13,
            Self::Reserved(bits) => bits & 0x0F,
        }
    }
}

/// Sensor values presented to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sensors {
    pub ps: Word,
    pub qc: Word,
    pub tat: Word,
    pub analog: Word,
    pub digital: Word,
}

impl Sensors {
    #[must_use]
    pub fn get(&self, channel: SensorChannel) -> Word {
        match channel {
            SensorChannel::Ps => self.ps,
            SensorChannel::Qc => self.qc,
            SensorChannel::Tat => self.tat,
            SensorChannel::Analog => self.analog,
            SensorChannel::Digital => self.digital,
        }
    }
}

/// Externally visible outputs after the channel-active gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outputs {
    pub mach: Word,
    pub altitude: Word,
    pub airspeed: Word,
    pub vertical_speed: Word,
    pub wing_sweep: Word,
    pub flap: Word,
    pub glove_vane: Word,
    pub bit_status: bool,
}

impl Outputs {
    #[must_use]
    pub fn get(&self, channel: OutputChannel) -> Word {
        match channel {
            OutputChannel::Mach => self.mach,
            OutputChannel::Altitude => self.altitude,
            OutputChannel::Airspeed => self.airspeed,
            OutputChannel::VerticalSpeed => self.vertical_speed,
            OutputChannel::WingSweep => self.wing_sweep,
            OutputChannel::Flap => self.flap,
            OutputChannel::GloveVane => self.glove_vane,
        }
    }
}

/// Signals presented to the bridge on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoInputs {
    pub control: IoControl,
    /// Write data from the steering network.
    pub write_data: Word,
    pub sensors: Sensors,
}

/// The I/O bridge registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoBridge {
    outputs: [Word; 7],
    bit_status: bool,
    latched: Word,
    ready: bool,
}

impl IoBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last sensor value read.
    #[must_use]
    pub fn latched(&self) -> Word {
        self.latched
    }

    #[must_use]
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Reserved; always false.
    #[must_use]
    pub fn fail_detect(&self) -> bool {
        false
    }

    /// Raw output register, ignoring the channel-active gate.
    #[must_use]
    pub fn register(&self, channel: OutputChannel) -> Word {
        self.outputs[channel as usize]
    }

    #[must_use]
    pub fn bit_register(&self) -> bool {
        self.bit_status
    }

    /// Outputs as seen outside the bridge.
    #[must_use]
    pub fn outputs(&self, channel_active: bool) -> Outputs {
        if !channel_active {
            return Outputs::default();
        }
        let reg = |ch: OutputChannel| self.register(ch);
        Outputs {
            mach: reg(OutputChannel::Mach),
            altitude: reg(OutputChannel::Altitude),
            airspeed: reg(OutputChannel::Airspeed),
            vertical_speed: reg(OutputChannel::VerticalSpeed),
            wing_sweep: reg(OutputChannel::WingSweep),
            flap: reg(OutputChannel::Flap),
            glove_vane: reg(OutputChannel::GloveVane),
            bit_status: self.bit_status,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Synchronous for IoBridge {
    type Inputs = IoInputs;

    fn step(&self, inputs: &IoInputs) -> Self {
        let mut next = *self;
        next.ready = false;

        match inputs.control {
            IoControl::Nop | IoControl::Reserved(_) => {}
            IoControl::Read(channel) => {
                next.latched = inputs.sensors.get(channel);
                next.ready = true;
            }
            IoControl::Write(channel) => {
                next.outputs[channel as usize] = inputs.write_data;
                next.ready = true;
            }
            IoControl::WriteBit => {
                next.bit_status = inputs.write_data.bit(0);
                next.ready = true;
            }
        }

        next
    }
}

impl Observable for IoBridge {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "latched" => Some(self.latched.into()),
            "ready" => Some(self.ready.into()),
            "bit" => Some(self.bit_status.into()),
            "fail_detect" => Some(self.fail_detect().into()),
            _ => {
                let name = path.strip_prefix("reg.")?;
                OutputChannel::ALL
                    .into_iter()
                    .find(|ch| ch.name() == name)
                    .map(|ch| self.register(ch).into())
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "latched",
            "ready",
            "bit",
            "fail_detect",
            "reg.mach",
            "reg.altitude",
            "reg.airspeed",
            "reg.vertical_speed",
            "reg.wing_sweep",
            "reg.flap",
            "reg.glove_vane",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensors() -> Sensors {
        Sensors {
            ps: Word::new(0x1_0001),
            qc: Word::new(0x2_0002),
            tat: Word::new(0x3_0003),
            analog: Word::new(0x4_0004),
            digital: Word::new(0x5_0005),
        }
    }

    fn apply(io: &mut IoBridge, code: u8, write_data: u32) {
        io.commit(&IoInputs {
            control: IoControl::from_bits(code),
            write_data: Word::new(write_data),
            sensors: sensors(),
        });
    }

    #[test]
    fn control_codes_round_trip() {
        for bits in 0..16u8 {
            assert_eq!(IoControl::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn sensor_reads_latch_and_pulse_ready() {
        let mut io = IoBridge::new();
        let want = [0x1_0001, 0x2_0002, 0x3_0003, 0x4_0004, 0x5_0005];
        for (code, want) in (1u8..=5).zip(want) {
            apply(&mut io, code, 0);
            assert_eq!(io.latched(), Word::new(want));
            assert!(io.ready());
        }
        apply(&mut io, 0, 0);
        assert!(!io.ready());
        assert_eq!(io.latched(), Word::new(0x5_0005));
    }

    #[test]
    fn writes_land_in_their_channel() {
        let mut io = IoBridge::new();
        for (code, ch) in (6u8..=12).zip(OutputChannel::ALL) {
            apply(&mut io, code, 0x0_1000 + u32::from(code));
            assert!(io.ready());
            assert_eq!(io.register(ch), Word::new(0x0_1000 + u32::from(code)));
        }
        let out = io.outputs(true);
        assert_eq!(out.mach, Word::new(0x0_1006));
        assert_eq!(out.glove_vane, Word::new(0x0_100C));
        for ch in OutputChannel::ALL {
            assert_eq!(out.get(ch), io.register(ch));
        }
    }

    #[test]
    fn bit_status_takes_data_bit_zero() {
        let mut io = IoBridge::new();
        apply(&mut io, 13, 0xF_FFFE);
        assert!(!io.outputs(true).bit_status);
        apply(&mut io, 13, 0x0_0001);
        assert!(io.outputs(true).bit_status);
        assert!(io.ready());
    }

    #[test]
    fn inactive_channel_gates_without_clearing() {
        let mut io = IoBridge::new();
        apply(&mut io, 6, 0x4_0000);
        apply(&mut io, 13, 1);
        assert_eq!(io.outputs(false), Outputs::default());
        assert_eq!(io.register(OutputChannel::Mach), Word::new(0x4_0000));
        assert_eq!(io.outputs(true).mach, Word::new(0x4_0000));
        assert!(io.outputs(true).bit_status);
    }

    #[test]
    fn reserved_codes_do_nothing() {
        let mut io = IoBridge::new();
        apply(&mut io, 1, 0);
        let before = io;
        for code in [14, 15] {
            apply(&mut io, code, 0x7_FFFF);
            assert!(!io.ready());
            assert_eq!(io.latched(), before.latched());
            assert_eq!(io.outputs(true), before.outputs(true));
        }
        assert!(!io.fail_detect());
    }

    #[test]
    fn reset_clears_registers() {
        let mut io = IoBridge::new();
        apply(&mut io, 7, 0x1_2345);
        io.reset();
        assert_eq!(io, IoBridge::new());
    }
}
