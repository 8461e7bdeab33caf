//! 48-bit microword layout.
//!
//! | Bits   | Field                 |
//! |--------|-----------------------|
//! | 47..40 | next control          |
//! | 39..32 | next address / target |
//! | 31..28 | ALU opcode            |
//! | 27     | accumulator write     |
//! | 26     | temp write            |
//! | 25     | flags write           |
//! | 23     | RAS write             |
//! | 22..20 | RAS address           |
//! | 18..16 | ALU source select     |
//! | 15..14 | RAS source select     |
//! | 13..12 | I/O source select     |
//! | 11     | PMU start             |
//! | 7      | PDU start             |
//! | 3..0   | I/O control           |
//!
//! Bits 24, 19, 10..8 and 6..4 are unused. The constant table is addressed
//! by the next-address field.

use std::fmt;

use cadc_io::IoControl;
use cadc_ras::{AluSource, IoSource, RasSource};
use cadc_slf::AluOp;

/// Mask of a microword.
pub const MICROWORD_MASK: u64 = (1 << 48) - 1;

/// Next-address control action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextControl {
    #[default]
    Seq,
    Jump,
    BranchZero,
    BranchNegative,
    BranchCarry,
    BranchPmuBusy,
    BranchPduBusy,
    WaitPmu,
    WaitPdu,
    Call,
    Return,
    /// Unassigned code; behaves as `Seq`.
    Other(u8),
}

impl NextControl {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits {
            0x00 => Self::Seq,
            0x01 => Self::Jump,
            0x02 => Self::BranchZero,
            0x03 => Self::BranchNegative,
            0x04 => Self::BranchCarry,
            0x05 => Self::BranchPmuBusy,
            0x06 => Self::BranchPduBusy,
            0x07 => Self::WaitPmu,
            0x08 => Self::WaitPdu,
            0x09 => Self::Call,
            0x0A => Self::Return,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Seq => 0x00,
            Self::Jump => 0x01,
            Self::BranchZero => 0x02,
            Self::BranchNegative => 0x03,
            Self::BranchCarry => 0x04,
            Self::BranchPmuBusy => 0x05,
            Self::BranchPduBusy => 0x06,
            Self::WaitPmu => 0x07,
            Self::WaitPdu => 0x08,
            Self::Call => 0x09,
            Self::Return => 0x0A,
            Self::Other(bits) => bits,
        }
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Seq | Self::Other(_) => "SEQ",
            Self::Jump => "JMP",
            Self::BranchZero => "BRZ",
            Self::BranchNegative => "BRN",
            Self::BranchCarry => "BRC",
            Self::BranchPmuBusy => "BRPMU",
            Self::BranchPduBusy => "BRPDU",
            Self::WaitPmu => "WPMU",
            Self::WaitPdu => "WPDU",
            Self::Call => "CALL",
            Self::Return => "RET",
        }
    }
}

/// A decoded microword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MicroWord {
    pub next_control: NextControl,
    pub next_address: u8,
    pub alu_op: AluOp,
    pub acc_we: bool,
    pub tmp_we: bool,
    pub flags_we: bool,
    pub ras_we: bool,
    /// Shared register file read/write address (3 bits).
    pub ras_address: u8,
    pub alu_source: AluSource,
    pub ras_source: RasSource,
    pub io_source: IoSource,
    pub pmu_start: bool,
    pub pdu_start: bool,
    pub io_control: IoControl,
}

fn field(raw: u64, shift: u32, width: u32) -> u8 {
    ((raw >> shift) & ((1 << width) - 1)) as u8
}

fn flag(raw: u64, bit: u32) -> bool {
    (raw >> bit) & 1 != 0
}

impl MicroWord {
    /// Decode a raw microword. Bits above 47 are ignored.
    #[must_use]
    pub fn decode(raw: u64) -> Self {
        Self {
            next_control: NextControl::from_bits(field(raw, 40, 8)),
            next_address: field(raw, 32, 8),
            alu_op: AluOp::from_bits(field(raw, 28, 4)),
            acc_we: flag(raw, 27),
            tmp_we: flag(raw, 26),
            flags_we: flag(raw, 25),
            ras_we: flag(raw, 23),
            ras_address: field(raw, 20, 3),
            alu_source: AluSource::from_bits(field(raw, 16, 3)),
            ras_source: RasSource::from_bits(field(raw, 14, 2)),
            io_source: IoSource::from_bits(field(raw, 12, 2)),
            pmu_start: flag(raw, 11),
            pdu_start: flag(raw, 7),
            io_control: IoControl::from_bits(field(raw, 0, 4)),
        }
    }

    /// Encode to the raw 48-bit form, with unused bits zero.
    #[must_use]
    pub fn encode(&self) -> u64 {
        let bit = |set: bool, n: u32| u64::from(set) << n;
        (u64::from(self.next_control.bits()) << 40)
            | (u64::from(self.next_address) << 32)
            | (u64::from(self.alu_op.bits()) << 28)
            | bit(self.acc_we, 27)
            | bit(self.tmp_we, 26)
            | bit(self.flags_we, 25)
            | bit(self.ras_we, 23)
            | (u64::from(self.ras_address & 0b111) << 20)
            | (u64::from(self.alu_source.bits()) << 16)
            | (u64::from(self.ras_source.bits()) << 14)
            | (u64::from(self.io_source.bits()) << 12)
            | bit(self.pmu_start, 11)
            | bit(self.pdu_start, 7)
            | u64::from(self.io_control.bits())
    }

    /// Jump, branch and call target.
    #[must_use]
    pub fn target(&self) -> u16 {
        u16::from(self.next_address)
    }

    /// Constant table address: the next-address field, zero-extended.
    #[must_use]
    pub fn constant_address(&self) -> u16 {
        u16::from(self.next_address)
    }
}

impl fmt::Display for MicroWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:#04X} {}",
            self.next_control.mnemonic(),
            self.next_address,
            self.alu_op.mnemonic()
        )?;
        for (set, name) in [
            (self.acc_we, "ACC"),
            (self.tmp_we, "TMP"),
            (self.flags_we, "FLG"),
            (self.pmu_start, "PMU"),
            (self.pdu_start, "PDU"),
        ] {
            if set {
                write!(f, " {name}")?;
            }
        }
        if self.ras_we {
            write!(f, " RAS[{}]", self.ras_address)?;
        }
        write!(f, " src={:?}", self.alu_source)?;
        if self.io_control != IoControl::Nop {
            write!(f, " io={:?}", self.io_control)?;
        }
        Ok(())
    }
}
