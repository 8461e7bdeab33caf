//! CADC special logic function unit (SLF).
//!
//! A 16-operation combinational ALU in front of three registers: the
//! accumulator, the temp register and the Z/N/C flag register. Each register
//! has its own write enable and only changes on a tick where that enable is
//! asserted. STORE_TMP is the one exception: it copies the accumulator into
//! temp without temp's enable.
//!
//! | Op | Name      | Result                                  |
//! |----|-----------|-----------------------------------------|
//! | 0  | NOP       | acc                                     |
//! | 1  | ADD       | acc + operand (carry = bit 20)          |
//! | 2  | SUB       | acc - operand (carry = bit 20)          |
//! | 3  | AND       | acc & operand                           |
//! | 4  | OR        | acc \| operand                          |
//! | 5  | XOR       | acc ^ operand                           |
//! | 6  | NOT       | !acc                                    |
//! | 7  | SHL       | sign kept, bit 18 dropped, 0 shifted in |
//! | 8  | SHR       | arithmetic shift right                  |
//! | 9  | NEG       | -acc                                    |
//! | 10 | ABS       | \|acc\|, -1 saturates to MAX            |
//! | 11 | GRAY2BIN  | Gray decode of operand                  |
//! | 12 | BIN2GRAY  | Gray encode of acc                      |
//! | 13 | LOAD      | operand                                 |
//! | 14 | STORE_TMP | acc, also copies acc into temp          |
//! | 15 | PASS      | operand, accumulator never written      |

mod gray;

pub use gray::{binary_to_gray, gray_to_binary};

use cadc_core::{Observable, Synchronous, Value, Word};

/// Mask of the 21-bit add/subtract intermediate.
const SUM_MASK: u32 = 0x1F_FFFF;

/// ALU opcode (microword bits 31..28).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AluOp {
    #[default]
    Nop,
    Add,
    Sub,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Neg,
    Abs,
    GrayToBin,
    BinToGray,
    Load,
    StoreTmp,
    Pass,
}

impl AluOp {
    const ALL: [Self; 16] = [
        Self::Nop,
        Self::Add,
        Self::Sub,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Not,
        Self::Shl,
        Self::Shr,
        Self::Neg,
        Self::Abs,
        Self::GrayToBin,
        Self::BinToGray,
        Self::Load,
        Self::StoreTmp,
        Self::Pass,
    ];

    /// Decode the low four bits of `bits`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0x0F) as usize]
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::Shl => "SHL",
            Self::Shr => "SHR",
            Self::Neg => "NEG",
            Self::Abs => "ABS",
            Self::GrayToBin => "GRAY2BIN",
            Self::BinToGray => "BIN2GRAY",
            Self::Load => "LOAD",
            Self::StoreTmp => "STORE_TMP",
            Self::Pass => "PASS",
        }
    }

    /// True for the two opcodes that produce a meaningful carry.
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub)
    }
}

/// The flag register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub z: bool,
    pub n: bool,
    pub c: bool,
}

/// Combinational ALU output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    pub result: Word,
    pub carry: bool,
}

/// The combinational ALU.
#[must_use]
pub fn evaluate(op: AluOp, acc: Word, operand: Word) -> AluOutput {
    let a = acc.bits();
    let b = operand.bits();

    let (result, carry) = match op {
        AluOp::Add => {
            let sum = (a + b) & SUM_MASK;
            (sum, sum & 0x10_0000 != 0)
        }
        AluOp::Sub => {
            let diff = a.wrapping_sub(b) & SUM_MASK;
            (diff, diff & 0x10_0000 != 0)
        }
        AluOp::And => (a & b, false),
        AluOp::Or => (a | b, false),
        AluOp::Xor => (a ^ b, false),
        AluOp::Not => (!a, false),
        AluOp::Shl => ((a & Word::SIGN) | ((a & 0x3_FFFF) << 1), false),
        AluOp::Shr => ((acc.to_i32() >> 1) as u32, false),
        AluOp::Neg => (acc.wrapping_neg().bits(), false),
        AluOp::Abs => {
            let abs = if acc == Word::MIN {
                Word::MAX
            } else if acc.is_negative() {
                acc.wrapping_neg()
            } else {
                acc
            };
            (abs.bits(), false)
        }
        AluOp::GrayToBin => (gray_to_binary(operand).bits(), false),
        AluOp::BinToGray => (binary_to_gray(acc).bits(), false),
        AluOp::Load | AluOp::Pass => (b, false),
        AluOp::Nop | AluOp::StoreTmp => (a, false),
    };

    AluOutput {
        result: Word::new(result),
        carry,
    }
}

/// Per-tick control fields driven by the microword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlfControl {
    pub op: AluOp,
    pub acc_we: bool,
    pub tmp_we: bool,
    pub flags_we: bool,
}

/// Everything the SLF samples on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlfInputs {
    pub control: SlfControl,
    /// External operand from the steering network.
    pub operand: Word,
}

/// The SLF register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slf {
    acc: Word,
    tmp: Word,
    flags: Flags,
}

impl Slf {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn acc(&self) -> Word {
        self.acc
    }

    #[must_use]
    pub fn tmp(&self) -> Word {
        self.tmp
    }

    #[must_use]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Combinational output for the given inputs against the current
    /// accumulator.
    #[must_use]
    pub fn output(&self, inputs: &SlfInputs) -> AluOutput {
        evaluate(inputs.control.op, self.acc, inputs.operand)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Preload the registers. Intended for test setup.
    pub fn set_registers(&mut self, acc: Word, tmp: Word) {
        self.acc = acc;
        self.tmp = tmp;
    }
}

impl Synchronous for Slf {
    type Inputs = SlfInputs;

    fn step(&self, inputs: &SlfInputs) -> Self {
        let control = inputs.control;
        let out = self.output(inputs);
        let mut next = *self;

        if control.acc_we && control.op != AluOp::Pass {
            next.acc = out.result;
        }
        if control.tmp_we || control.op == AluOp::StoreTmp {
            next.tmp = self.acc;
        }
        if control.flags_we {
            next.flags.z = out.result.is_zero();
            next.flags.n = out.result.is_negative();
            if control.op.is_arithmetic() {
                next.flags.c = out.carry;
            }
        }

        next
    }
}

impl Observable for Slf {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "acc" => Some(self.acc.into()),
            "tmp" => Some(self.tmp.into()),
            "flags.z" | "z" => Some(self.flags.z.into()),
            "flags.n" | "n" => Some(self.flags.n.into()),
            "flags.c" | "c" => Some(self.flags.c.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["acc", "tmp", "flags.z", "flags.n", "flags.c"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(bits: u32) -> Word {
        Word::new(bits)
    }

    fn run(op: AluOp, acc: u32, operand: u32) -> AluOutput {
        evaluate(op, w(acc), w(operand))
    }

    fn control(op: AluOp) -> SlfControl {
        SlfControl {
            op,
            acc_we: true,
            tmp_we: false,
            flags_we: true,
        }
    }

    #[test]
    fn opcode_decode_round_trips() {
        for bits in 0..16u8 {
            assert_eq!(AluOp::from_bits(bits).bits(), bits);
        }
        assert_eq!(AluOp::from_bits(0x1D), AluOp::Load);
    }

    #[test]
    fn add_and_sub_carry() {
        assert_eq!(run(AluOp::Add, 0x2_0000, 0x1_0000).result, w(0x3_0000));
        assert!(!run(AluOp::Add, 0x2_0000, 0x1_0000).carry);

        let wrap = run(AluOp::Add, 0xF_FFFF, 0x0_0001);
        assert_eq!(wrap.result, Word::ZERO);
        assert!(wrap.carry);

        // Positive overflow wraps silently into the sign bit.
        let over = run(AluOp::Add, 0x7_FFFF, 0x0_0001);
        assert_eq!(over.result, Word::MIN);
        assert!(!over.carry);

        let borrow = run(AluOp::Sub, 0x0_0001, 0x0_0002);
        assert_eq!(borrow.result, Word::ONES);
        assert!(borrow.carry);
        assert!(!run(AluOp::Sub, 0x0_0003, 0x0_0002).carry);
    }

    #[test]
    fn logic_ops() {
        assert_eq!(run(AluOp::And, 0xF0F0F, 0x0FFF0).result, w(0x00F00));
        assert_eq!(run(AluOp::Or, 0xF0000, 0x0000F).result, w(0xF000F));
        assert_eq!(run(AluOp::Xor, 0xFFFFF, 0x0F0F0).result, w(0xF0F0F));
        assert_eq!(run(AluOp::Not, 0x0F0F0, 0x12345).result, w(0xF0F0F));
    }

    #[test]
    fn shifts() {
        assert_eq!(run(AluOp::Shl, 0x2_0000, 0).result, w(0x4_0000));
        // Bit 18 is lost, the sign survives.
        assert_eq!(run(AluOp::Shl, 0x4_0001, 0).result, w(0x0_0002));
        assert_eq!(run(AluOp::Shl, 0xC_0000, 0).result, w(0x8_0000));
        assert_eq!(run(AluOp::Shr, 0x8_0000, 0).result, w(0xC_0000));
        assert_eq!(run(AluOp::Shr, 0x4_0001, 0).result, w(0x2_0000));
        assert_eq!(run(AluOp::Shr, 0xF_FFFF, 0).result, w(0xF_FFFF));
    }

    #[test]
    fn negate_and_absolute() {
        assert_eq!(run(AluOp::Neg, 0x4_0000, 0).result, w(0xC_0000));
        assert_eq!(run(AluOp::Neg, 0x8_0000, 0).result, w(0x8_0000));
        assert_eq!(run(AluOp::Abs, 0xC_0000, 0).result, w(0x4_0000));
        assert_eq!(run(AluOp::Abs, 0x3_0000, 0).result, w(0x3_0000));
        assert_eq!(run(AluOp::Abs, 0x8_0000, 0).result, Word::MAX);
    }

    #[test]
    fn gray_ops_take_their_own_source() {
        assert_eq!(run(AluOp::GrayToBin, 0xFFFFF, 0x0_0003).result, w(0x0_0002));
        assert_eq!(run(AluOp::BinToGray, 0x0_0002, 0xFFFFF).result, w(0x0_0003));
    }

    #[test]
    fn pass_through_ops() {
        assert_eq!(run(AluOp::Load, 0x11111, 0x22222).result, w(0x22222));
        assert_eq!(run(AluOp::Pass, 0x11111, 0x22222).result, w(0x22222));
        assert_eq!(run(AluOp::Nop, 0x11111, 0x22222).result, w(0x11111));
        assert_eq!(run(AluOp::StoreTmp, 0x11111, 0x22222).result, w(0x11111));
    }

    #[test]
    fn load_writes_accumulator_and_flags() {
        let slf = Slf::new().step(&SlfInputs {
            control: control(AluOp::Load),
            operand: w(0x8_1234),
        });
        assert_eq!(slf.acc(), w(0x8_1234));
        assert!(slf.flags().n);
        assert!(!slf.flags().z);
    }

    #[test]
    fn pass_never_writes_accumulator() {
        let mut slf = Slf::new();
        slf.set_registers(w(0x1_2345), Word::ZERO);
        let next = slf.step(&SlfInputs {
            control: control(AluOp::Pass),
            operand: Word::ZERO,
        });
        assert_eq!(next.acc(), w(0x1_2345));
        // Flags still follow the passed value.
        assert!(next.flags().z);
    }

    #[test]
    fn disabled_writes_hold_every_register() {
        let mut slf = Slf::new();
        slf.set_registers(w(0x5_5555), w(0x2_2222));
        for bits in 0..16u8 {
            let next = slf.step(&SlfInputs {
                control: SlfControl {
                    op: AluOp::from_bits(bits),
                    ..SlfControl::default()
                },
                operand: w(0xA_AAAA),
            });
            assert_eq!(next.acc(), slf.acc(), "op {bits}");
            assert_eq!(next.flags(), slf.flags(), "op {bits}");
            if AluOp::from_bits(bits) != AluOp::StoreTmp {
                assert_eq!(next.tmp(), slf.tmp(), "op {bits}");
            }
        }
    }

    #[test]
    fn store_tmp_copies_accumulator() {
        let mut slf = Slf::new();
        slf.set_registers(w(0x3_3333), w(0x1_1111));
        slf.commit(&SlfInputs {
            control: SlfControl {
                op: AluOp::StoreTmp,
                ..SlfControl::default()
            },
            operand: w(0xA_AAAA),
        });
        assert_eq!(slf.tmp(), w(0x3_3333));
        assert_eq!(slf.acc(), w(0x3_3333));
    }

    #[test]
    fn temp_takes_old_accumulator() {
        let mut slf = Slf::new();
        slf.set_registers(w(0x0_1000), Word::ZERO);
        slf.commit(&SlfInputs {
            control: SlfControl {
                op: AluOp::Load,
                acc_we: true,
                tmp_we: true,
                flags_we: false,
            },
            operand: w(0x0_2000),
        });
        assert_eq!(slf.acc(), w(0x0_2000));
        assert_eq!(slf.tmp(), w(0x0_1000));
    }

    #[test]
    fn carry_holds_outside_add_and_sub() {
        let mut slf = Slf::new();
        slf.set_registers(w(0xF_FFFF), Word::ZERO);
        slf.commit(&SlfInputs {
            control: control(AluOp::Add),
            operand: w(0x0_0001),
        });
        assert!(slf.flags().c);
        assert!(slf.flags().z);

        slf.commit(&SlfInputs {
            control: control(AluOp::Load),
            operand: w(0x0_0005),
        });
        assert!(slf.flags().c);
        assert!(!slf.flags().z);

        slf.commit(&SlfInputs {
            control: control(AluOp::Sub),
            operand: w(0x0_0001),
        });
        assert!(!slf.flags().c);
        assert_eq!(slf.acc(), w(0x0_0004));
    }

    #[test]
    fn flags_use_this_ticks_result() {
        let mut slf = Slf::new();
        slf.set_registers(w(0x0_0001), Word::ZERO);
        slf.commit(&SlfInputs {
            control: SlfControl {
                op: AluOp::Sub,
                acc_we: false,
                tmp_we: false,
                flags_we: true,
            },
            operand: w(0x0_0001),
        });
        assert!(slf.flags().z);
        assert_eq!(slf.acc(), w(0x0_0001));
    }
}
