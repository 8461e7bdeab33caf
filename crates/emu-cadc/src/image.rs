//! Control store and constant table images.
//!
//! Two formats are accepted:
//!
//! - `$readmemh`-style hex text: one hex word per whitespace-separated
//!   token, `@addr` to move the load address, `//` and `#` comments, `_`
//!   digit separators.
//! - JSON: `{ "microcode": [...], "constants": [...] }` where each entry
//!   is a number or a hex string (`"0x0100000000AB"`). Either key may be
//!   omitted.
//!
//! Anything not covered by an image is zero.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use cadc_core::Word;
use cadc_sequencer::{
    CONSTANT_TABLE_DEPTH, CONTROL_STORE_DEPTH, ConstantTable, ControlStore, StoreError,
};

/// Which table an image targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Microcode,
    Constants,
}

impl Table {
    #[must_use]
    pub const fn depth(self) -> usize {
        match self {
            Self::Microcode => CONTROL_STORE_DEPTH,
            Self::Constants => CONSTANT_TABLE_DEPTH,
        }
    }

    /// Word width in bits.
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            Self::Microcode => 48,
            Self::Constants => Word::BITS,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Microcode => write!(f, "microcode"),
            Self::Constants => write!(f, "constant table"),
        }
    }
}

#[derive(Debug)]
pub enum ImageError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A hex-text token that is neither a word nor an `@` directive.
    Syntax { table: Table, line: usize, token: String },
    /// A JSON string entry that is not a hex number.
    BadWord { table: Table, index: usize, text: String },
    AddressOutOfRange { table: Table, line: usize, address: usize },
    ValueTooWide { table: Table, address: usize, value: u64 },
    TooLarge { table: Table, len: usize },
    /// The table itself refused the words.
    Store(StoreError),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read image: {e}"),
            Self::Json(e) => write!(f, "invalid JSON image: {e}"),
            Self::Syntax { table, line, token } => {
                write!(f, "{table} line {line}: unexpected token '{token}'")
            }
            Self::BadWord { table, index, text } => {
                write!(f, "{table} entry {index}: '{text}' is not a hex word")
            }
            Self::AddressOutOfRange {
                table,
                line,
                address,
            } => write!(
                f,
                "{table} line {line}: address {address:#05X} is beyond depth {}",
                table.depth()
            ),
            Self::ValueTooWide {
                table,
                address,
                value,
            } => write!(
                f,
                "{table} address {address:#05X}: {value:#X} is wider than {} bits",
                table.width()
            ),
            Self::TooLarge { table, len } => write!(
                f,
                "{table} image has {len} words, maximum is {}",
                table.depth()
            ),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<StoreError> for ImageError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<serde_json::Error> for ImageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// A loaded control store and constant table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    pub control_store: ControlStore,
    pub constants: ConstantTable,
}

fn check_width(table: Table, address: usize, value: u64) -> Result<u64, ImageError> {
    if value >> table.width() != 0 {
        return Err(ImageError::ValueTooWide {
            table,
            address,
            value,
        });
    }
    Ok(value)
}

fn parse_hex_digits(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
        .replace('_', "");
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(&digits, 16).ok()
}

/// Parse `$readmemh`-style text into a word list for `table`.
///
/// The result is as long as the highest address written plus one.
pub fn parse_hex(table: Table, text: &str) -> Result<Vec<u64>, ImageError> {
    let mut words = Vec::new();
    let mut address = 0usize;

    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw_line.split("//").next().unwrap_or_default();
        let content = content.split('#').next().unwrap_or_default();

        for token in content.split_whitespace() {
            if let Some(target) = token.strip_prefix('@') {
                address = parse_hex_digits(target).ok_or_else(|| ImageError::Syntax {
                    table,
                    line,
                    token: token.to_string(),
                })? as usize;
                continue;
            }

            let value = parse_hex_digits(token).ok_or_else(|| ImageError::Syntax {
                table,
                line,
                token: token.to_string(),
            })?;
            if address >= table.depth() {
                return Err(ImageError::AddressOutOfRange {
                    table,
                    line,
                    address,
                });
            }
            let value = check_width(table, address, value)?;
            if address >= words.len() {
                words.resize(address + 1, 0);
            }
            words[address] = value;
            address += 1;
        }
    }

    Ok(words)
}

/// Parse a hex control store image.
pub fn parse_microcode_hex(text: &str) -> Result<ControlStore, ImageError> {
    let words = parse_hex(Table::Microcode, text)?;
    build_store(&words)
}

/// Parse a hex constant table image.
pub fn parse_constants_hex(text: &str) -> Result<ConstantTable, ImageError> {
    let words = parse_hex(Table::Constants, text)?;
    build_constants(&words)
}

fn build_store(words: &[u64]) -> Result<ControlStore, ImageError> {
    ControlStore::from_words(words).map_err(ImageError::from)
}

fn build_constants(words: &[u64]) -> Result<ConstantTable, ImageError> {
    let narrowed: Vec<u32> = words.iter().map(|&w| w as u32).collect();
    ConstantTable::from_words(&narrowed).map_err(ImageError::from)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonWord {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonImage {
    #[serde(default)]
    microcode: Vec<JsonWord>,
    #[serde(default)]
    constants: Vec<JsonWord>,
}

fn json_words(table: Table, entries: &[JsonWord]) -> Result<Vec<u64>, ImageError> {
    if entries.len() > table.depth() {
        return Err(ImageError::TooLarge {
            table,
            len: entries.len(),
        });
    }
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let value = match entry {
                JsonWord::Number(n) => *n,
                JsonWord::Text(text) => {
                    parse_hex_digits(text.trim()).ok_or_else(|| ImageError::BadWord {
                        table,
                        index,
                        text: text.clone(),
                    })?
                }
            };
            check_width(table, index, value)
        })
        .collect()
}

impl Image {
    /// Build an image from hex text. A missing constant image leaves the
    /// table zeroed.
    pub fn from_hex(microcode: &str, constants: Option<&str>) -> Result<Self, ImageError> {
        Ok(Self {
            control_store: parse_microcode_hex(microcode)?,
            constants: match constants {
                Some(text) => parse_constants_hex(text)?,
                None => ConstantTable::new(),
            },
        })
    }

    /// Build an image from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ImageError> {
        let image: JsonImage = serde_json::from_str(text)?;
        Self::from_json_image(&image)
    }

    /// Build an image from an already-parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ImageError> {
        let image: JsonImage = serde_json::from_value(value)?;
        Self::from_json_image(&image)
    }

    fn from_json_image(image: &JsonImage) -> Result<Self, ImageError> {
        let microcode = json_words(Table::Microcode, &image.microcode)?;
        let constants = json_words(Table::Constants, &image.constants)?;
        Ok(Self {
            control_store: build_store(&microcode)?,
            constants: build_constants(&constants)?,
        })
    }

    /// Load an image file: `.json` as a JSON image, anything else as hex
    /// microcode with an all-zero constant table.
    pub fn load(path: &Path) -> Result<Self, ImageError> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_hex(&text, None)
        }
    }
}
