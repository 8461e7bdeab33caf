//! Top-level CADC system.
//!
//! Every block advances on the same master tick. A tick is evaluated in two
//! phases: first every block's inputs are derived from the registers as
//! they stand at the start of the tick (microword fetch, steering, ALU,
//! next-address logic), then all blocks commit together. No block sees
//! another block's update until the following tick.
//!
//! The timing generator is the only block behind the pre-divider. Everything
//! else runs at the master rate.
//!
//! # Frame loop
//!
//! `run_frame()` ticks until the timing generator's frame mark has been
//! sampled. That tick also forces the micro program counter back to 0.
//! One frame is 20,480 master ticks with the divider at 1.

use cadc_core::{MasterClock, Observable, Synchronous, Tickable, Ticks, Value, Word};
use cadc_io::{IoBridge, IoInputs, OutputChannel, Outputs, Sensors};
use cadc_pdu::{Pdu, PduInputs};
use cadc_pmu::{Pmu, PmuInputs};
use cadc_ras::{RasInputs, RegisterFile, SteeringOutputs, SteeringSelect, SteeringSources, steer};
use cadc_sequencer::{ConstantTable, ControlSequencer, ControlStore, MicroWord, SequencerInputs};
use cadc_slf::{AluOutput, Slf, SlfControl, SlfInputs};
use cadc_timing::TimingGenerator;

use crate::config::CadcConfig;

/// Every signal sampled on one tick, derived from registers alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSignals {
    /// Raw microword at the current address.
    pub raw: u64,
    pub word: MicroWord,
    pub sources: SteeringSources,
    pub steering: SteeringOutputs,
    pub alu: AluOutput,
    pub slf: SlfInputs,
    pub pmu: PmuInputs,
    pub pdu: PduInputs,
    pub ras: RasInputs,
    pub io: IoInputs,
    pub seq: SequencerInputs,
}

/// The CADC core.
pub struct Cadc {
    timing: TimingGenerator,
    seq: ControlSequencer,
    slf: Slf,
    pmu: Pmu,
    pdu: Pdu,
    ras: RegisterFile,
    io: IoBridge,
    control_store: ControlStore,
    constants: ConstantTable,
    sensors: Sensors,
    channel_active: bool,
    /// Master ticks since construction, reset ticks included.
    master_clock: u64,
    /// Completed `run_frame` calls.
    frame_count: u64,
}

impl Cadc {
    /// Create a CADC in its reset state from the given configuration.
    #[must_use]
    pub fn new(config: &CadcConfig) -> Self {
        Self {
            timing: TimingGenerator::new(config.clk_div),
            seq: ControlSequencer::new(),
            slf: Slf::new(),
            pmu: Pmu::new(),
            pdu: Pdu::new(),
            ras: RegisterFile::new(config.ras_depth),
            io: IoBridge::new(),
            control_store: config.control_store.clone(),
            constants: config.constants.clone(),
            sensors: Sensors::default(),
            channel_active: false,
            master_clock: 0,
            frame_count: 0,
        }
    }

    /// Evaluate the combinational logic for the coming tick.
    #[must_use]
    pub fn signals(&self) -> TickSignals {
        let raw = self.control_store.raw(self.seq.pc());
        let word = MicroWord::decode(raw);

        let sources = SteeringSources {
            acc: self.slf.acc(),
            tmp: self.slf.tmp(),
            ras: self.ras.read(word.ras_address),
            pmu: self.pmu.result(),
            pdu_quotient: self.pdu.quotient(),
            pdu_remainder: self.pdu.remainder(),
            io: self.io.latched(),
            constant: self.constants.read(word.constant_address()),
        };
        let select = SteeringSelect {
            alu: word.alu_source,
            ras: word.ras_source,
            io: word.io_source,
        };
        let steering = steer(select, &sources);

        let slf = SlfInputs {
            control: SlfControl {
                op: word.alu_op,
                acc_we: word.acc_we,
                tmp_we: word.tmp_we,
                flags_we: word.flags_we,
            },
            operand: steering.alu_operand,
        };

        TickSignals {
            raw,
            word,
            sources,
            steering,
            alu: self.slf.output(&slf),
            slf,
            pmu: PmuInputs {
                start: word.pmu_start,
                operand_a: sources.acc,
                operand_b: sources.tmp,
            },
            pdu: PduInputs {
                start: word.pdu_start,
                dividend: sources.acc,
                divisor: sources.tmp,
            },
            ras: RasInputs {
                write_enable: word.ras_we,
                address: word.ras_address,
                write_data: steering.ras_write,
            },
            io: IoInputs {
                control: word.io_control,
                write_data: steering.io_write,
                sensors: self.sensors,
            },
            seq: SequencerInputs {
                word,
                flags: self.slf.flags(),
                pmu_busy: self.pmu.busy(),
                pdu_busy: self.pdu.busy(),
                frame_mark: self.timing.frame_mark(),
            },
        }
    }

    fn reset(&mut self) {
        self.timing.reset();
        self.seq.reset();
        self.slf.reset();
        self.pmu.reset();
        self.pdu.reset();
        self.ras.reset();
        self.io.reset();
    }

    /// Run one complete frame.
    ///
    /// Returns the number of master ticks executed.
    pub fn run_frame(&mut self) -> u64 {
        let mut ticks = 0;
        loop {
            let frame_mark = self.timing.frame_mark();
            self.tick(false);
            ticks += 1;
            if frame_mark {
                break;
            }
        }
        self.frame_count += 1;
        ticks
    }

    /// Present new sensor values. They are sampled on any tick with a read code.
    pub fn set_sensors(&mut self, sensors: Sensors) {
        self.sensors = sensors;
    }

    #[must_use]
    pub fn sensors(&self) -> &Sensors {
        &self.sensors
    }

    pub fn set_channel_active(&mut self, active: bool) {
        self.channel_active = active;
    }

    #[must_use]
    pub fn channel_active(&self) -> bool {
        self.channel_active
    }

    /// Output channels behind the channel-active gate.
    #[must_use]
    pub fn outputs(&self) -> Outputs {
        self.io.outputs(self.channel_active)
    }

    /// Reserved; always false.
    #[must_use]
    pub fn fail_detect(&self) -> bool {
        self.io.fail_detect()
    }

    #[must_use]
    pub fn timing(&self) -> &TimingGenerator {
        &self.timing
    }

    #[must_use]
    pub fn sequencer(&self) -> &ControlSequencer {
        &self.seq
    }

    #[must_use]
    pub fn slf(&self) -> &Slf {
        &self.slf
    }

    #[must_use]
    pub fn pmu(&self) -> &Pmu {
        &self.pmu
    }

    #[must_use]
    pub fn pdu(&self) -> &Pdu {
        &self.pdu
    }

    #[must_use]
    pub fn ras(&self) -> &RegisterFile {
        &self.ras
    }

    #[must_use]
    pub fn io(&self) -> &IoBridge {
        &self.io
    }

    #[must_use]
    pub fn control_store(&self) -> &ControlStore {
        &self.control_store
    }

    #[must_use]
    pub fn constants(&self) -> &ConstantTable {
        &self.constants
    }

    #[must_use]
    pub fn acc(&self) -> Word {
        self.slf.acc()
    }

    #[must_use]
    pub fn pc(&self) -> u16 {
        self.seq.pc()
    }

    #[must_use]
    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Emulated time since power-on at the 5 MHz master clock.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        MasterClock::CADC.seconds(Ticks::new(self.master_clock))
    }
}

impl Tickable for Cadc {
    fn tick(&mut self, reset: bool) {
        self.master_clock += 1;

        if reset {
            self.reset();
            return;
        }

        let s = self.signals();

        self.slf.commit(&s.slf);
        self.pmu.commit(&s.pmu);
        self.pdu.commit(&s.pdu);
        self.ras.commit(&s.ras);
        self.io.commit(&s.io);
        self.seq.commit(&s.seq);
        self.timing.tick(false);
    }
}

fn sensor(sensors: &Sensors, name: &str) -> Option<Word> {
    Some(match name {
        "ps" => sensors.ps,
        "qc" => sensors.qc,
        "tat" => sensors.tat,
        "analog" => sensors.analog,
        "digital" => sensors.digital,
        _ => return None,
    })
}

impl Observable for Cadc {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("timing.") {
            self.timing.query(rest)
        } else if let Some(rest) = path.strip_prefix("seq.") {
            self.seq.query(rest)
        } else if let Some(rest) = path.strip_prefix("alu.") {
            match rest {
                "result" => Some(self.signals().alu.result.into()),
                "carry" => Some(self.signals().alu.carry.into()),
                "op" => Some(self.signals().word.alu_op.mnemonic().into()),
                "operand" => Some(self.signals().steering.alu_operand.into()),
                _ => self.slf.query(rest),
            }
        } else if let Some(rest) = path.strip_prefix("pmu.") {
            self.pmu.query(rest)
        } else if let Some(rest) = path.strip_prefix("pdu.") {
            self.pdu.query(rest)
        } else if let Some(rest) = path.strip_prefix("ras.") {
            self.ras.query(rest)
        } else if let Some(rest) = path.strip_prefix("io.") {
            self.io.query(rest)
        } else if let Some(rest) = path.strip_prefix("out.") {
            let outputs = self.outputs();
            if rest == "bit" {
                return Some(outputs.bit_status.into());
            }
            OutputChannel::ALL
                .into_iter()
                .find(|ch| ch.name() == rest)
                .map(|ch| outputs.get(ch).into())
        } else if let Some(rest) = path.strip_prefix("sensor.") {
            sensor(&self.sensors, rest).map(Value::from)
        } else {
            match path {
                "pc" | "uaddr" => Some(self.seq.pc().into()),
                "uword" => Some(self.signals().raw.into()),
                "disasm" => Some(self.signals().word.to_string().as_str().into()),
                "depth" => Some(self.seq.depth().into()),
                "master_clock" => Some(self.master_clock.into()),
                "frame_count" => Some(self.frame_count.into()),
                "channel_active" => Some(self.channel_active.into()),
                "fail_detect" => Some(self.fail_detect().into()),
                "word_mark" => Some(self.timing.word_mark().into()),
                "frame_mark" => Some(self.timing.frame_mark().into()),
                _ => self.slf.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "acc",
            "tmp",
            "flags.z",
            "flags.n",
            "flags.c",
            "pc",
            "uaddr",
            "uword",
            "disasm",
            "depth",
            "master_clock",
            "frame_count",
            "channel_active",
            "fail_detect",
            "word_mark",
            "frame_mark",
            "timing.<timing_paths>",
            "seq.<sequencer_paths>",
            "alu.result",
            "alu.carry",
            "alu.op",
            "alu.operand",
            "pmu.<pmu_paths>",
            "pdu.<pdu_paths>",
            "ras.r<n>",
            "io.<io_paths>",
            "out.<channel>",
            "out.bit",
            "sensor.<channel>",
        ]
    }
}
