//! CADC emulator binary.
//!
//! Runs a microprogram headless for a number of frames or ticks and prints
//! the register and output surface as JSON, or serves the model over
//! JSON-RPC for an external test bench.

use std::path::PathBuf;
use std::process;

use emu_cadc::image::parse_constants_hex;
use emu_cadc::mcp::{McpServer, outputs_json, registers_json};
use emu_cadc::{Cadc, CadcConfig, Image, Observable, Sensors, Tickable, Ticks, Word};

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    image_path: Option<PathBuf>,
    microcode_path: Option<PathBuf>,
    constants_path: Option<PathBuf>,
    clk_div: u32,
    ras_depth: usize,
    ticks: Option<u64>,
    frames: u64,
    sensors: Sensors,
    channel_active: bool,
    mcp: bool,
    trace: bool,
}

/// Parse a sensor value: `0x`-prefixed hex bits or a fraction in [-1, 1).
fn parse_sensor_value(text: &str) -> Option<Word> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16)
            .ok()
            .filter(|&bits| bits <= Word::MASK)
            .map(Word::new);
    }
    let fraction: f64 = text.parse().ok()?;
    (-1.0..1.0).contains(&fraction).then(|| Word::from_f64(fraction))
}

fn apply_sensor(sensors: &mut Sensors, spec: &str) -> Result<(), String> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| format!("Expected name=value, got '{spec}'"))?;
    let word = parse_sensor_value(value).ok_or_else(|| format!("Invalid sensor value '{value}'"))?;
    let slot = match name {
        "ps" => &mut sensors.ps,
        "qc" => &mut sensors.qc,
        "tat" => &mut sensors.tat,
        "analog" => &mut sensors.analog,
        "digital" => &mut sensors.digital,
        other => return Err(format!("Unknown sensor '{other}'")),
    };
    *slot = word;
    Ok(())
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let defaults = CadcConfig::default();
    let mut cli = CliArgs {
        image_path: None,
        microcode_path: None,
        constants_path: None,
        clk_div: defaults.clk_div,
        ras_depth: defaults.ras_depth,
        ticks: None,
        frames: 1,
        sensors: Sensors::default(),
        channel_active: false,
        mcp: false,
        trace: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--image" => {
                i += 1;
                cli.image_path = args.get(i).map(PathBuf::from);
            }
            "--microcode" => {
                i += 1;
                cli.microcode_path = args.get(i).map(PathBuf::from);
            }
            "--constants" => {
                i += 1;
                cli.constants_path = args.get(i).map(PathBuf::from);
            }
            "--clk-div" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.clk_div = s.parse().unwrap_or(0);
                }
            }
            "--ras-depth" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.ras_depth = s.parse().unwrap_or(0);
                }
            }
            "--ticks" => {
                i += 1;
                cli.ticks = args.get(i).and_then(|s| s.parse().ok());
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(1);
                }
            }
            "--sensor" => {
                i += 1;
                let spec = args.get(i).map_or("", String::as_str);
                if let Err(e) = apply_sensor(&mut cli.sensors, spec) {
                    eprintln!("{e}");
                    process::exit(1);
                }
            }
            "--channel-active" => {
                cli.channel_active = true;
            }
            "--mcp" => {
                cli.mcp = true;
            }
            "--trace" => {
                cli.trace = true;
            }
            "--help" | "-h" => {
                eprintln!("Usage: emu-cadc [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --image <file>         Load a JSON image, or hex microcode");
                eprintln!("  --microcode <file>     Load hex microcode");
                eprintln!("  --constants <file>     Load a hex constant table");
                eprintln!("  --clk-div <n>          Master clock divider [default: 1]");
                eprintln!("  --ras-depth <n>        Register file depth [default: 64]");
                eprintln!("  --frames <n>           Frames to run [default: 1]");
                eprintln!("  --ticks <n>            Run exactly n master ticks instead of frames");
                eprintln!("  --sensor <name=value>  Set ps, qc, tat, analog or digital (hex or fraction)");
                eprintln!("  --channel-active       Drive the output channel gate high");
                eprintln!("  --trace                Print one line per executed microinstruction");
                eprintln!("  --mcp                  Run as MCP server (JSON-RPC over stdio)");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn load_image(cli: &CliArgs) -> Image {
    let result = if let Some(ref path) = cli.image_path {
        Image::load(path)
    } else if let Some(ref path) = cli.microcode_path {
        Image::load(path)
    } else {
        Ok(Image::default())
    };
    let mut image = match result {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Image error: {e}");
            process::exit(1);
        }
    };

    if let Some(ref path) = cli.constants_path {
        let constants = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_constants_hex(&text).map_err(|e| e.to_string()));
        match constants {
            Ok(table) => image.constants = table,
            Err(e) => {
                eprintln!("Constants error: {e}");
                process::exit(1);
            }
        }
    }

    image
}

fn make_cadc(cli: &CliArgs) -> Cadc {
    let image = load_image(cli);
    let config = CadcConfig {
        clk_div: cli.clk_div,
        ras_depth: cli.ras_depth,
        control_store: image.control_store,
        constants: image.constants,
    };
    if let Err(e) = config.validate() {
        eprintln!("Config error: {e}");
        process::exit(1);
    }

    let mut cadc = Cadc::new(&config);
    cadc.set_sensors(cli.sensors);
    cadc.set_channel_active(cli.channel_active);
    cadc
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

fn trace_line(cadc: &Cadc) {
    let field = |path: &str| cadc.query(path).map(|v| v.to_string()).unwrap_or_default();
    eprintln!(
        "{:>10} pc={:03X} acc={} {}",
        cadc.master_clock(),
        cadc.pc(),
        field("acc"),
        field("disasm"),
    );
}

fn run_headless(cli: &CliArgs) {
    let mut cadc = make_cadc(cli);

    if let Some(ticks) = cli.ticks {
        if cli.trace {
            for _ in 0..ticks {
                trace_line(&cadc);
                cadc.tick(false);
            }
        } else {
            cadc.tick_n(Ticks::new(ticks));
        }
    } else if cli.trace {
        for _ in 0..cli.frames {
            loop {
                let frame_mark = cadc.timing().frame_mark();
                trace_line(&cadc);
                cadc.tick(false);
                if frame_mark {
                    break;
                }
            }
        }
    } else {
        for _ in 0..cli.frames {
            cadc.run_frame();
        }
    }

    let report = serde_json::json!({
        "registers": registers_json(&cadc),
        "outputs": outputs_json(&cadc),
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Report error: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    let cli = parse_args();

    if cli.mcp {
        let mut server = if cli.image_path.is_some() || cli.microcode_path.is_some() {
            McpServer::with_cadc(make_cadc(&cli))
        } else {
            McpServer::new()
        };
        server.run();
        return;
    }

    run_headless(&cli);
}
