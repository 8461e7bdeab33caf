//! Control store and constant table.
//!
//! Both are loaded once before the machine runs and never change afterward.

use std::fmt;

use cadc_core::Word;

use crate::microword::{MICROWORD_MASK, MicroWord};

/// Number of microwords in the control store.
pub const CONTROL_STORE_DEPTH: usize = 1024;
/// Number of entries in the constant table.
pub const CONSTANT_TABLE_DEPTH: usize = 512;

/// Why an image was refused by a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// More microwords than the control store holds.
    ControlStoreTooLarge(usize),
    MicrowordTooWide { address: usize, raw: u64 },
    /// More constants than the table holds.
    ConstantTableTooLarge(usize),
    ConstantTooWide { address: usize, value: u32 },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ControlStoreTooLarge(len) => write!(
                f,
                "control store image has {len} words, maximum is {CONTROL_STORE_DEPTH}"
            ),
            Self::MicrowordTooWide { address, raw } => {
                write!(f, "microword {raw:#X} at {address:#05X} is wider than 48 bits")
            }
            Self::ConstantTableTooLarge(len) => write!(
                f,
                "constant table image has {len} words, maximum is {CONSTANT_TABLE_DEPTH}"
            ),
            Self::ConstantTooWide { address, value } => {
                write!(f, "constant {value:#X} at {address:#05X} is wider than 20 bits")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// The 1024 x 48-bit microprogram memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlStore {
    words: Box<[u64]>,
}

impl ControlStore {
    /// An all-zero store: every address executes a sequential no-op.
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: vec![0; CONTROL_STORE_DEPTH].into_boxed_slice(),
        }
    }

    /// Build a store from the leading microwords; the rest are zero.
    pub fn from_words(words: &[u64]) -> Result<Self, StoreError> {
        if words.len() > CONTROL_STORE_DEPTH {
            return Err(StoreError::ControlStoreTooLarge(words.len()));
        }
        if let Some((address, &raw)) = words
            .iter()
            .enumerate()
            .find(|&(_, &raw)| raw & !MICROWORD_MASK != 0)
        {
            return Err(StoreError::MicrowordTooWide { address, raw });
        }
        let mut store = Self::new();
        store.words[..words.len()].copy_from_slice(words);
        Ok(store)
    }

    /// Raw microword at `address` (wrapped to the store depth).
    #[must_use]
    pub fn raw(&self, address: u16) -> u64 {
        self.words[usize::from(address) % CONTROL_STORE_DEPTH]
    }

    #[must_use]
    pub fn fetch(&self, address: u16) -> MicroWord {
        MicroWord::decode(self.raw(address))
    }

    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

impl Default for ControlStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The 512-entry constant ROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantTable {
    words: Box<[Word]>,
}

impl ConstantTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: vec![Word::ZERO; CONSTANT_TABLE_DEPTH].into_boxed_slice(),
        }
    }

    /// Build a table from the leading constants; the rest are zero.
    pub fn from_words(words: &[u32]) -> Result<Self, StoreError> {
        if words.len() > CONSTANT_TABLE_DEPTH {
            return Err(StoreError::ConstantTableTooLarge(words.len()));
        }
        let mut table = Self::new();
        for (address, &value) in words.iter().enumerate() {
            if value & !Word::MASK != 0 {
                return Err(StoreError::ConstantTooWide { address, value });
            }
            table.words[address] = Word::new(value);
        }
        Ok(table)
    }

    /// Constant at `address`. Only the low 9 bits select an entry.
    #[must_use]
    pub fn read(&self, address: u16) -> Word {
        self.words[usize::from(address) % CONSTANT_TABLE_DEPTH]
    }

    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

impl Default for ConstantTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_images_are_zero_filled() {
        let store = ControlStore::from_words(&[0x01_05_0000_0000, 0x0A_00_0000_0000]).unwrap();
        assert_eq!(store.raw(0), 0x01_05_0000_0000);
        assert_eq!(store.raw(1), 0x0A_00_0000_0000);
        assert_eq!(store.raw(2), 0);
        assert_eq!(store.words().len(), CONTROL_STORE_DEPTH);
    }

    #[test]
    fn oversize_images_are_rejected() {
        assert_eq!(
            ControlStore::from_words(&vec![0; CONTROL_STORE_DEPTH + 1]),
            Err(StoreError::ControlStoreTooLarge(CONTROL_STORE_DEPTH + 1))
        );
        assert_eq!(
            ConstantTable::from_words(&vec![0; CONSTANT_TABLE_DEPTH + 1]),
            Err(StoreError::ConstantTableTooLarge(CONSTANT_TABLE_DEPTH + 1))
        );
        assert!(ControlStore::from_words(&vec![0; CONTROL_STORE_DEPTH]).is_ok());
    }

    #[test]
    fn over_wide_values_are_rejected() {
        let err = ControlStore::from_words(&[0, 1 << 48]).unwrap_err();
        assert_eq!(
            err,
            StoreError::MicrowordTooWide {
                address: 1,
                raw: 1 << 48
            }
        );
        assert!(err.to_string().contains("48 bits"), "{err}");
        let err = ConstantTable::from_words(&[0x10_0000]).unwrap_err();
        assert_eq!(
            err,
            StoreError::ConstantTooWide {
                address: 0,
                value: 0x10_0000
            }
        );
        assert!(err.to_string().contains("20 bits"), "{err}");
    }

    #[test]
    fn constant_address_uses_low_nine_bits() {
        let mut image = vec![0; CONSTANT_TABLE_DEPTH];
        image[0x1FF] = 0x7_FFFF;
        image[3] = 0x0_0003;
        let table = ConstantTable::from_words(&image).unwrap();
        assert_eq!(table.read(0x1FF), Word::MAX);
        assert_eq!(table.read(0x203), Word::new(3));
    }
}
