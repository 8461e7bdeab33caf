//! JSON-RPC driver for the CADC core.
//!
//! Exposes the model as a JSON-RPC 2.0 server over stdin/stdout so that an
//! external stimulus/verification harness can load images, drive ticks,
//! present sensor values and observe every register.
//!
//! # Protocol
//!
//! Reads newline-delimited JSON-RPC 2.0 requests from stdin, writes
//! responses to stdout. Words are reported as `"0xNNNNN"` strings.
//! Word-valued parameters accept a non-negative integer (raw bits), a
//! negative integer (signed count of LSBs, down to -524288), a hex string,
//! or a fractional number in [-1, 1).
//!
//! `tick` runs at most 100,000,000 master ticks per request; `run_frame` is
//! capped to as many whole frames as fit in the same budget at the current
//! clock divider.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use cadc_core::{Observable, Tickable, Value, Word};
use cadc_io::{OutputChannel, Sensors};
use cadc_timing::TICKS_PER_FRAME;

use crate::Cadc;
use crate::config::CadcConfig;
use crate::image::Image;

/// Upper bound on master ticks per request.
const MAX_STEPS: u64 = 100_000_000;

/// Frames allowed per request at `clk_div`; never less than one.
fn frame_cap(clk_div: u32) -> u64 {
    let ticks_per_frame = TICKS_PER_FRAME * u64::from(clk_div.max(1));
    (MAX_STEPS / ticks_per_frame).max(1)
}

#[derive(Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: JsonValue,
    id: JsonValue,
}

#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: JsonValue,
}

#[derive(Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl RpcResponse {
    fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: JsonValue, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError { code, message }),
            id,
        }
    }
}

/// Render an observed value as JSON.
fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Bool(v) => json!(v),
        Value::U8(v) => json!(v),
        Value::U16(v) => json!(v),
        Value::U32(v) => json!(v),
        Value::U64(v) => json!(v),
        Value::Word(w) => json!(w.to_string()),
        Value::String(s) => json!(s),
        Value::Array(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
    }
}

fn word_json(word: Word) -> JsonValue {
    json!(word.to_string())
}

/// Parse a word parameter: raw bits, signed LSB count, hex string, or fraction.
fn parse_word(value: &JsonValue) -> Option<Word> {
    if let Some(bits) = value.as_u64() {
        return (bits <= u64::from(Word::MASK)).then(|| Word::new(bits as u32));
    }
    if let Some(lsbs) = value.as_i64() {
        let min = i64::from(Word::MIN.to_i32());
        return (min..0).contains(&lsbs).then(|| Word::from_i32(lsbs as i32));
    }
    if let Some(text) = value.as_str() {
        let hex = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        return u32::from_str_radix(hex, 16)
            .ok()
            .filter(|&bits| bits <= Word::MASK)
            .map(Word::new);
    }
    let fraction = value.as_f64()?;
    (-1.0..1.0).contains(&fraction).then(|| Word::from_f64(fraction))
}

/// Server wrapping a CADC instance.
pub struct McpServer {
    cadc: Option<Cadc>,
}

impl McpServer {
    #[must_use]
    pub fn new() -> Self {
        Self { cadc: None }
    }

    /// Start with an already-built machine.
    #[must_use]
    pub fn with_cadc(cadc: Cadc) -> Self {
        Self { cadc: Some(cadc) }
    }

    /// Run the server loop: read JSON-RPC from stdin, write responses to stdout.
    pub fn run(&mut self) {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = self.handle_line(line);
            let _ = writeln!(
                stdout,
                "{}",
                serde_json::to_string(&response).unwrap_or_default()
            );
            let _ = stdout.flush();
        }
    }

    fn handle_line(&mut self, line: &str) -> RpcResponse {
        let request: RpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return RpcResponse::error(JsonValue::Null, -32700, format!("Parse error: {e}"));
            }
        };

        if request.jsonrpc != "2.0" {
            return RpcResponse::error(request.id, -32600, "Invalid JSON-RPC version".to_string());
        }

        self.dispatch(&request.method, &request.params, request.id)
    }

    /// Dispatch a method call to the appropriate handler.
    fn dispatch(&mut self, method: &str, params: &JsonValue, id: JsonValue) -> RpcResponse {
        match method {
            "boot" => self.handle_boot(params, id),
            "reset" => self.handle_reset(id),
            "tick" => self.handle_tick(params, id),
            "run_frame" => self.handle_run_frame(params, id),
            "set_sensors" => self.handle_set_sensors(params, id),
            "set_channel_active" => self.handle_set_channel_active(params, id),
            "query" => self.handle_query(params, id),
            "outputs" => self.handle_outputs(id),
            "registers" => self.handle_registers(id),
            _ => RpcResponse::error(id, -32601, format!("Unknown method: {method}")),
        }
    }

    /// The booted machine, or the error to send back.
    fn require_cadc(&mut self, id: &JsonValue) -> Result<&mut Cadc, RpcResponse> {
        self.cadc.as_mut().ok_or_else(|| {
            RpcResponse::error(
                id.clone(),
                -32000,
                "No CADC instance. Call 'boot' first.".to_string(),
            )
        })
    }

    fn handle_boot(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let image = if let Some(image) = params.get("image") {
            Image::from_json_value(image.clone())
        } else if let Some(path) = params.get("path").and_then(JsonValue::as_str) {
            Image::load(Path::new(path))
        } else {
            Ok(Image::default())
        };
        let image = match image {
            Ok(i) => i,
            Err(e) => return RpcResponse::error(id, -32602, format!("Image load failed: {e}")),
        };

        let defaults = CadcConfig::default();
        let config = CadcConfig {
            clk_div: params
                .get("clk_div")
                .and_then(JsonValue::as_u64)
                .map_or(defaults.clk_div, |v| u32::try_from(v).unwrap_or(u32::MAX)),
            ras_depth: params
                .get("ras_depth")
                .and_then(JsonValue::as_u64)
                .map_or(defaults.ras_depth, |v| usize::try_from(v).unwrap_or(usize::MAX)),
            control_store: image.control_store,
            constants: image.constants,
        };
        if let Err(e) = config.validate() {
            return RpcResponse::error(id, -32602, e.to_string());
        }

        self.cadc = Some(Cadc::new(&config));
        RpcResponse::success(id, json!({"status": "ok"}))
    }

    fn handle_reset(&mut self, id: JsonValue) -> RpcResponse {
        match self.require_cadc(&id) {
            Ok(cadc) => {
                cadc.tick(true);
                RpcResponse::success(id, json!({"status": "ok", "pc": cadc.pc()}))
            }
            Err(e) => e,
        }
    }

    fn handle_tick(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let cadc = match self.require_cadc(&id) {
            Ok(c) => c,
            Err(e) => return e,
        };

        let count = params
            .get("count")
            .and_then(JsonValue::as_u64)
            .unwrap_or(1)
            .min(MAX_STEPS);
        let reset = params
            .get("reset")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);

        for _ in 0..count {
            cadc.tick(reset);
        }

        RpcResponse::success(
            id,
            json!({
                "ticks": count,
                "master_clock": cadc.master_clock(),
                "pc": cadc.pc(),
            }),
        )
    }

    fn handle_run_frame(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let cadc = match self.require_cadc(&id) {
            Ok(c) => c,
            Err(e) => return e,
        };

        let count = params
            .get("count")
            .and_then(JsonValue::as_u64)
            .unwrap_or(1)
            .min(frame_cap(cadc.timing().clk_div()));

        let mut ticks = 0u64;
        for _ in 0..count {
            ticks += cadc.run_frame();
        }

        RpcResponse::success(
            id,
            json!({
                "frames": count,
                "ticks": ticks,
                "frame_count": cadc.frame_count(),
            }),
        )
    }

    fn handle_set_sensors(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let cadc = match self.require_cadc(&id) {
            Ok(c) => c,
            Err(e) => return e,
        };

        let mut sensors = *cadc.sensors();
        let slots: [(&str, &mut Word); 5] = [
            ("ps", &mut sensors.ps),
            ("qc", &mut sensors.qc),
            ("tat", &mut sensors.tat),
            ("analog", &mut sensors.analog),
            ("digital", &mut sensors.digital),
        ];
        for (name, slot) in slots {
            if let Some(raw) = params.get(name) {
                match parse_word(raw) {
                    Some(word) => *slot = word,
                    None => {
                        return RpcResponse::error(
                            id,
                            -32602,
                            format!("Invalid value for sensor '{name}': {raw}"),
                        );
                    }
                }
            }
        }
        cadc.set_sensors(sensors);

        RpcResponse::success(id, sensors_json(&sensors))
    }

    fn handle_set_channel_active(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let cadc = match self.require_cadc(&id) {
            Ok(c) => c,
            Err(e) => return e,
        };

        let Some(active) = params.get("active").and_then(JsonValue::as_bool) else {
            return RpcResponse::error(id, -32602, "Missing 'active' parameter".to_string());
        };
        cadc.set_channel_active(active);
        RpcResponse::success(id, json!({"channel_active": active}))
    }

    fn handle_query(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let cadc = match self.require_cadc(&id) {
            Ok(c) => c,
            Err(e) => return e,
        };

        let Some(path) = params.get("path").and_then(JsonValue::as_str) else {
            return RpcResponse::error(id, -32602, "Missing 'path' parameter".to_string());
        };

        match cadc.query(path) {
            Some(value) => {
                RpcResponse::success(id, json!({"path": path, "value": value_to_json(&value)}))
            }
            None => RpcResponse::error(id, -32000, format!("Unknown query path: {path}")),
        }
    }

    fn handle_outputs(&mut self, id: JsonValue) -> RpcResponse {
        match self.require_cadc(&id) {
            Ok(cadc) => RpcResponse::success(id, outputs_json(cadc)),
            Err(e) => e,
        }
    }

    fn handle_registers(&mut self, id: JsonValue) -> RpcResponse {
        match self.require_cadc(&id) {
            Ok(cadc) => RpcResponse::success(id, registers_json(cadc)),
            Err(e) => e,
        }
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

fn sensors_json(sensors: &Sensors) -> JsonValue {
    json!({
        "ps": word_json(sensors.ps),
        "qc": word_json(sensors.qc),
        "tat": word_json(sensors.tat),
        "analog": word_json(sensors.analog),
        "digital": word_json(sensors.digital),
    })
}

/// Gated output channels plus the BIT and fail-detect lines.
#[must_use]
pub fn outputs_json(cadc: &Cadc) -> JsonValue {
    let outputs = cadc.outputs();
    let mut map = serde_json::Map::new();
    for ch in OutputChannel::ALL {
        map.insert(ch.name().to_string(), word_json(outputs.get(ch)));
    }
    map.insert("bit_status".to_string(), json!(outputs.bit_status));
    map.insert("fail_detect".to_string(), json!(cadc.fail_detect()));
    map.insert("channel_active".to_string(), json!(cadc.channel_active()));
    JsonValue::Object(map)
}

/// The observable register surface.
#[must_use]
pub fn registers_json(cadc: &Cadc) -> JsonValue {
    let slf = cadc.slf();
    let flags = slf.flags();
    let seq = cadc.sequencer();
    let pmu = cadc.pmu();
    let pdu = cadc.pdu();
    let timing = cadc.timing();
    let io = cadc.io();

    json!({
        "acc": word_json(slf.acc()),
        "tmp": word_json(slf.tmp()),
        "flags": {"z": flags.z, "n": flags.n, "c": flags.c},
        "pc": seq.pc(),
        "depth": seq.depth(),
        "stack": seq.stack(),
        "pmu": {
            "busy": pmu.busy(),
            "done": pmu.done(),
            "result": word_json(pmu.result()),
        },
        "pdu": {
            "busy": pdu.busy(),
            "done": pdu.done(),
            "div_by_zero": pdu.div_by_zero(),
            "quotient": word_json(pdu.quotient()),
            "remainder": word_json(pdu.remainder()),
        },
        "io": {
            "latched": word_json(io.latched()),
            "ready": io.ready(),
        },
        "timing": {
            "bit": timing.bit_count(),
            "word_type": if timing.word_type().is_wo() { "WO" } else { "WA" },
            "op": timing.op_count(),
        },
        "ras": cadc.ras().words().iter().map(|&w| word_json(w)).collect::<Vec<_>>(),
        "master_clock": cadc.master_clock(),
        "elapsed_s": cadc.elapsed_seconds(),
    })
}
