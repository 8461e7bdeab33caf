//! End-to-end microprograms run through the composed machine.

use cadc_io::IoControl;
use cadc_ras::{AluSource, IoSource, RasSource};
use cadc_slf::AluOp;
use cadc_timing::TICKS_PER_FRAME;
use emu_cadc::{
    Cadc, CadcConfig, ConstantTable, ControlStore, Image, MicroWord, NextControl, Observable,
    OutputChannel, Sensors, Tickable, Value, Word,
};

fn build(program: &[MicroWord], constants: &[u32]) -> Cadc {
    let words: Vec<u64> = program.iter().map(MicroWord::encode).collect();
    Cadc::new(&CadcConfig {
        control_store: ControlStore::from_words(&words).unwrap(),
        constants: ConstantTable::from_words(constants).unwrap(),
        ..CadcConfig::default()
    })
}

fn run(cadc: &mut Cadc, ticks: u32) {
    for _ in 0..ticks {
        cadc.tick(false);
    }
}

fn load_constant(address: u8) -> MicroWord {
    MicroWord {
        next_address: address,
        alu_op: AluOp::Load,
        acc_we: true,
        alu_source: AluSource::Constant,
        ..MicroWord::default()
    }
}

fn load_from(source: AluSource) -> MicroWord {
    MicroWord {
        alu_op: AluOp::Load,
        acc_we: true,
        alu_source: source,
        ..MicroWord::default()
    }
}

fn write_output(channel: OutputChannel) -> MicroWord {
    MicroWord {
        io_control: IoControl::Write(channel),
        io_source: IoSource::Acc,
        ..MicroWord::default()
    }
}

fn halt(at: u8) -> MicroWord {
    MicroWord {
        next_control: NextControl::Jump,
        next_address: at,
        ..MicroWord::default()
    }
}

/// Leaves constants[a] in tmp and constants[b] in acc.
fn operands(a: u8, b: u8) -> [MicroWord; 2] {
    [
        load_constant(a),
        MicroWord {
            tmp_we: true,
            ..load_constant(b)
        },
    ]
}

fn multiply_program() -> Vec<MicroWord> {
    let [first, second] = operands(0, 1);
    vec![
        first,
        second,
        MicroWord {
            pmu_start: true,
            ..MicroWord::default()
        },
        MicroWord {
            next_control: NextControl::WaitPmu,
            ..MicroWord::default()
        },
        load_from(AluSource::Pmu),
        write_output(OutputChannel::Mach),
        halt(6),
    ]
}

fn divide_program() -> Vec<MicroWord> {
    // Divisor constants[0] in tmp, dividend constants[1] in acc.
    let [first, second] = operands(0, 1);
    vec![
        first,
        second,
        MicroWord {
            pdu_start: true,
            ..MicroWord::default()
        },
        MicroWord {
            next_control: NextControl::WaitPdu,
            ..MicroWord::default()
        },
        load_from(AluSource::PduQuotient),
        write_output(OutputChannel::Airspeed),
        load_from(AluSource::PduRemainder),
        write_output(OutputChannel::Flap),
        halt(8),
    ]
}

#[test]
fn multiply_half_by_half() {
    let mut cadc = build(&multiply_program(), &[0x4_0000, 0x4_0000]);
    cadc.set_channel_active(true);
    run(&mut cadc, 60);

    assert_eq!(cadc.pc(), 6);
    assert_eq!(cadc.acc(), Word::new(0x2_0000));
    assert_eq!(cadc.outputs().mach, Word::new(0x2_0000));
    assert!(!cadc.pmu().busy());
}

#[test]
fn multiply_waits_while_busy() {
    let mut cadc = build(&multiply_program(), &[0x4_0000, 0x4_0000]);
    run(&mut cadc, 3);
    assert!(cadc.pmu().busy());
    assert_eq!(cadc.pc(), 3);

    run(&mut cadc, 10);
    assert_eq!(cadc.pc(), 3);
    assert_eq!(cadc.query("pmu.busy"), Some(Value::Bool(true)));
}

#[test]
fn multiply_negative_operand() {
    // -0.5 * 0.5 = -0.25
    let mut cadc = build(&multiply_program(), &[0xC_0000, 0x4_0000]);
    run(&mut cadc, 60);
    assert_eq!(cadc.acc(), Word::new(0xE_0000));
    assert_eq!(cadc.io().register(OutputChannel::Mach), Word::new(0xE_0000));
}

#[test]
fn divide_quarter_by_half() {
    let mut cadc = build(&divide_program(), &[0x4_0000, 0x2_0000]);
    cadc.set_channel_active(true);
    run(&mut cadc, 60);

    assert_eq!(cadc.pc(), 8);
    let outputs = cadc.outputs();
    assert_eq!(outputs.airspeed, Word::new(0x4_0000));
    assert_eq!(outputs.flap, Word::ZERO);
    assert!(!cadc.pdu().div_by_zero());
}

#[test]
fn divide_signs_follow_operands() {
    // -0.25 / 0.5 = -0.5
    let mut cadc = build(&divide_program(), &[0x4_0000, 0xE_0000]);
    run(&mut cadc, 60);
    assert_eq!(cadc.io().register(OutputChannel::Airspeed), Word::new(0xC_0000));
    assert_eq!(cadc.io().register(OutputChannel::Flap), Word::ZERO);
}

#[test]
fn divide_by_zero_falls_through_wait() {
    let mut cadc = build(&divide_program(), &[0, 0x2_0000]);
    run(&mut cadc, 3);
    assert!(cadc.pdu().div_by_zero());
    assert!(cadc.pdu().done());
    assert!(!cadc.pdu().busy());

    // The wait does not stall.
    run(&mut cadc, 1);
    assert_eq!(cadc.pc(), 4);

    run(&mut cadc, 10);
    assert_eq!(cadc.pc(), 8);
    assert_eq!(cadc.io().register(OutputChannel::Airspeed), Word::ZERO);
    assert_eq!(cadc.query("pdu.dbz"), Some(Value::Bool(true)));
}

fn sensor_program() -> Vec<MicroWord> {
    vec![
        MicroWord {
            io_control: IoControl::Read(cadc_io::SensorChannel::Ps),
            ..MicroWord::default()
        },
        load_from(AluSource::Io),
        MicroWord {
            alu_op: AluOp::Neg,
            acc_we: true,
            flags_we: true,
            ..MicroWord::default()
        },
        write_output(OutputChannel::Altitude),
        load_constant(0),
        MicroWord {
            io_control: IoControl::WriteBit,
            ..MicroWord::default()
        },
        halt(6),
    ]
}

#[test]
fn sensor_read_negate_write() {
    let mut cadc = build(&sensor_program(), &[0x0_0001]);
    cadc.set_sensors(Sensors {
        ps: Word::new(0x1_0000),
        ..Sensors::default()
    });
    run(&mut cadc, 20);

    assert_eq!(cadc.io().latched(), Word::new(0x1_0000));
    assert_eq!(cadc.io().register(OutputChannel::Altitude), Word::new(0xF_0000));
    assert!(cadc.io().bit_register());
    assert!(cadc.slf().flags().n);

    // Gate low: every output reads zero.
    let outputs = cadc.outputs();
    assert_eq!(outputs.altitude, Word::ZERO);
    assert!(!outputs.bit_status);
    assert_eq!(cadc.query("out.altitude"), Some(Value::Word(Word::ZERO)));

    cadc.set_channel_active(true);
    let outputs = cadc.outputs();
    assert_eq!(outputs.altitude, Word::new(0xF_0000));
    assert!(outputs.bit_status);
    assert!(!cadc.fail_detect());
}

#[test]
fn register_file_holds_across_frames() {
    let program = [
        load_constant(0),
        MicroWord {
            ras_we: true,
            ras_address: 5,
            ras_source: RasSource::Acc,
            ..MicroWord::default()
        },
        halt(2),
    ];
    let mut cadc = build(&program, &[0x3_1415]);
    cadc.run_frame();
    cadc.run_frame();
    assert_eq!(cadc.ras().read(5), Word::new(0x3_1415));
    assert_eq!(cadc.query("ras.r5"), Some(Value::Word(Word::new(0x3_1415))));
}

#[test]
fn frame_mark_restarts_program_and_keeps_stack() {
    let mut program = vec![MicroWord::default(); 0x11];
    program[0] = MicroWord {
        next_control: NextControl::Call,
        next_address: 0x10,
        ..MicroWord::default()
    };
    program[0x10] = halt(0x10);
    let mut cadc = build(&program, &[]);

    assert_eq!(cadc.run_frame(), TICKS_PER_FRAME);
    assert_eq!(cadc.pc(), 0);
    assert_eq!(cadc.sequencer().depth(), 1);
    assert_eq!(cadc.sequencer().stack()[0], 1);

    run(&mut cadc, 1);
    assert_eq!(cadc.pc(), 0x10);
    assert_eq!(cadc.sequencer().depth(), 2);
    assert_eq!(cadc.frame_count(), 1);
}

#[test]
fn subroutine_returns_past_call() {
    let program = [
        MicroWord {
            next_control: NextControl::Call,
            next_address: 4,
            ..MicroWord::default()
        },
        load_constant(1),
        halt(2),
        MicroWord::default(),
        MicroWord {
            next_control: NextControl::Return,
            ..load_constant(0)
        },
    ];
    let mut cadc = build(&program, &[0x0_0007, 0x0_0009]);
    run(&mut cadc, 2);
    assert_eq!(cadc.pc(), 1);
    assert_eq!(cadc.acc(), Word::new(0x0_0007));
    run(&mut cadc, 1);
    assert_eq!(cadc.acc(), Word::new(0x0_0009));
    assert_eq!(cadc.sequencer().depth(), 0);
}

#[test]
fn hex_image_drives_the_machine() {
    let program = multiply_program();
    let mut text = String::from("// multiply\n@0\n");
    for word in &program {
        text.push_str(&format!("{:012X}\n", word.encode()));
    }
    let image = Image::from_hex(&text, Some("4_0000 # half\n6_0000\n")).unwrap();

    let mut cadc = Cadc::new(&CadcConfig {
        control_store: image.control_store,
        constants: image.constants,
        ..CadcConfig::default()
    });
    run(&mut cadc, 60);
    // 0.5 * 0.75 = 0.375
    assert_eq!(cadc.acc(), Word::new(0x3_0000));
}

#[test]
fn json_image_drives_the_machine() {
    let program = divide_program();
    let microcode: Vec<String> = program
        .iter()
        .map(|w| format!("0x{:012X}", w.encode()))
        .collect();
    let json = serde_json::json!({
        "microcode": microcode,
        "constants": [0x4_0000, "0x20000"],
    });
    let image = Image::from_json(&json.to_string()).unwrap();

    let mut cadc = Cadc::new(&CadcConfig {
        control_store: image.control_store,
        constants: image.constants,
        ..CadcConfig::default()
    });
    run(&mut cadc, 60);
    assert_eq!(cadc.io().register(OutputChannel::Airspeed), Word::new(0x4_0000));
}

#[test]
fn divider_slows_frames_not_instructions() {
    let mut cadc = Cadc::new(&CadcConfig {
        clk_div: 4,
        ..CadcConfig::default()
    });
    run(&mut cadc, 8);
    assert_eq!(cadc.pc(), 8);
    assert_eq!(cadc.timing().bit_count(), 2);
}
