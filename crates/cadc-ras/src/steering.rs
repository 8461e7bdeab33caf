//! Steering logic crossbar.

use cadc_core::Word;

/// ALU operand select (microword bits 18..16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AluSource {
    #[default]
    Ras,
    Pmu,
    PduQuotient,
    PduRemainder,
    Io,
    Constant,
    Tmp,
    /// Reserved select; drives zero.
    Zero,
}

impl AluSource {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Self::Ras,
            1 => Self::Pmu,
            2 => Self::PduQuotient,
            3 => Self::PduRemainder,
            4 => Self::Io,
            5 => Self::Constant,
            6 => Self::Tmp,
            _ => Self::Zero,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Register file write data select (microword bits 15..14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasSource {
    #[default]
    Acc,
    Pmu,
    PduQuotient,
    Io,
}

impl RasSource {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Acc,
            1 => Self::Pmu,
            2 => Self::PduQuotient,
            _ => Self::Io,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// I/O bridge write data select (microword bits 13..12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoSource {
    #[default]
    Acc,
    Ras,
    Pmu,
    PduQuotient,
}

impl IoSource {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Acc,
            1 => Self::Ras,
            2 => Self::Pmu,
            _ => Self::PduQuotient,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Every data source the crossbar can route, as seen at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SteeringSources {
    pub acc: Word,
    pub tmp: Word,
    pub ras: Word,
    pub pmu: Word,
    pub pdu_quotient: Word,
    pub pdu_remainder: Word,
    pub io: Word,
    pub constant: Word,
}

/// The three independent selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SteeringSelect {
    pub alu: AluSource,
    pub ras: RasSource,
    pub io: IoSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SteeringOutputs {
    /// External operand for the ALU.
    pub alu_operand: Word,
    /// Register file write data.
    pub ras_write: Word,
    /// I/O bridge write data.
    pub io_write: Word,
}

/// Route the sources through the crossbar.
#[must_use]
pub fn steer(select: SteeringSelect, src: &SteeringSources) -> SteeringOutputs {
    let alu_operand = match select.alu {
        AluSource::Ras => src.ras,
        AluSource::Pmu => src.pmu,
        AluSource::PduQuotient => src.pdu_quotient,
        AluSource::PduRemainder => src.pdu_remainder,
        AluSource::Io => src.io,
        AluSource::Constant => src.constant,
        AluSource::Tmp => src.tmp,
        AluSource::Zero => Word::ZERO,
    };
    let ras_write = match select.ras {
        RasSource::Acc => src.acc,
        RasSource::Pmu => src.pmu,
        RasSource::PduQuotient => src.pdu_quotient,
        RasSource::Io => src.io,
    };
    let io_write = match select.io {
        IoSource::Acc => src.acc,
        IoSource::Ras => src.ras,
        IoSource::Pmu => src.pmu,
        IoSource::PduQuotient => src.pdu_quotient,
    };

    SteeringOutputs {
        alu_operand,
        ras_write,
        io_write,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> SteeringSources {
        SteeringSources {
            acc: Word::new(0x1_1111),
            tmp: Word::new(0x2_2222),
            ras: Word::new(0x3_3333),
            pmu: Word::new(0x4_4444),
            pdu_quotient: Word::new(0x5_5555),
            pdu_remainder: Word::new(0x6_6666),
            io: Word::new(0x7_7777),
            constant: Word::new(0x8_8888),
        }
    }

    fn alu(select: u8) -> Word {
        let select = SteeringSelect {
            alu: AluSource::from_bits(select),
            ..SteeringSelect::default()
        };
        steer(select, &sources()).alu_operand
    }

    #[test]
    fn alu_operand_select() {
        let expected = [
            0x3_3333, 0x4_4444, 0x5_5555, 0x6_6666, 0x7_7777, 0x8_8888, 0x2_2222, 0x0_0000,
        ];
        for (bits, want) in expected.into_iter().enumerate() {
            assert_eq!(alu(bits as u8), Word::new(want), "select {bits}");
        }
    }

    #[test]
    fn ras_write_select() {
        let want = [0x1_1111, 0x4_4444, 0x5_5555, 0x7_7777];
        for (bits, want) in want.into_iter().enumerate() {
            let select = SteeringSelect {
                ras: RasSource::from_bits(bits as u8),
                ..SteeringSelect::default()
            };
            assert_eq!(steer(select, &sources()).ras_write, Word::new(want));
        }
    }

    #[test]
    fn io_write_select() {
        let want = [0x1_1111, 0x3_3333, 0x4_4444, 0x5_5555];
        for (bits, want) in want.into_iter().enumerate() {
            let select = SteeringSelect {
                io: IoSource::from_bits(bits as u8),
                ..SteeringSelect::default()
            };
            assert_eq!(steer(select, &sources()).io_write, Word::new(want));
        }
    }

    #[test]
    fn selects_are_independent() {
        let select = SteeringSelect {
            alu: AluSource::Constant,
            ras: RasSource::Pmu,
            io: IoSource::PduQuotient,
        };
        let out = steer(select, &sources());
        assert_eq!(out.alu_operand, Word::new(0x8_8888));
        assert_eq!(out.ras_write, Word::new(0x4_4444));
        assert_eq!(out.io_write, Word::new(0x5_5555));
    }

    #[test]
    fn select_decode_round_trips() {
        for bits in 0..8u8 {
            assert_eq!(AluSource::from_bits(bits).bits(), bits);
        }
        for bits in 0..4u8 {
            assert_eq!(RasSource::from_bits(bits).bits(), bits);
            assert_eq!(IoSource::from_bits(bits).bits(), bits);
        }
    }
}
