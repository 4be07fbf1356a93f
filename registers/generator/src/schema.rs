/*++
Licensed under the Apache-2.0 license.
--*/

use crate::error::{CsrError, CsrResult};
use serde::{Deserialize, Serialize};

/// Widest register the generated naming scheme (and its `uint64_t` accessors) can carry.
pub const MAX_CSR_WIDTH: u32 = 64;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsrAccess {
    /// Read-only from software, driven by hardware.
    Status,
    /// Written by software, read by hardware.
    Storage,
}

impl CsrAccess {
    pub fn can_read(&self) -> bool {
        true
    }

    pub fn can_write(&self) -> bool {
        matches!(self, CsrAccess::Storage)
    }

    /// Access tag used by the csv/json exports.
    pub fn short_name(&self) -> &'static str {
        match self {
            CsrAccess::Status => "ro",
            CsrAccess::Storage => "rw",
        }
    }
}

/// A named bit range inside a register.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CsrField {
    pub name: String,
    pub offset: u32,
    pub width: u32,
    #[serde(default)]
    pub description: Option<String>,
}

impl CsrField {
    pub fn new(name: impl Into<String>, offset: u32, width: u32) -> Self {
        Self {
            name: name.into(),
            offset,
            width,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.width)
    }
}

/// A single control/status register.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Csr {
    pub name: String,
    pub width: u32,
    pub access: CsrAccess,
    #[serde(default)]
    pub fields: Vec<CsrField>,
    #[serde(default)]
    pub reset: u64,
    #[serde(default)]
    pub description: Option<String>,
}

impl Csr {
    pub fn new(name: impl Into<String>, width: u32, access: CsrAccess) -> Self {
        Self {
            name: name.into(),
            width,
            access,
            fields: vec![],
            reset: 0,
            description: None,
        }
    }

    pub fn status(name: impl Into<String>, width: u32) -> Self {
        Self::new(name, width, CsrAccess::Status)
    }

    pub fn storage(name: impl Into<String>, width: u32) -> Self {
        Self::new(name, width, CsrAccess::Storage)
    }

    pub fn with_reset(mut self, reset: u64) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_field(mut self, field: CsrField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mask covering every bit of the register.
    pub fn mask(&self) -> u64 {
        low_mask(self.width)
    }

    pub(crate) fn validate(&self, bank: &str) -> CsrResult<()> {
        validate_name(&self.name)?;
        if self.width == 0 {
            return Err(CsrError::ZeroWidth {
                bank: bank.into(),
                register: self.name.clone(),
            });
        }
        if self.width > MAX_CSR_WIDTH {
            return Err(CsrError::WidthOverflow {
                bank: bank.into(),
                register: self.name.clone(),
                width: self.width,
                max: MAX_CSR_WIDTH,
            });
        }
        if self.reset & !self.mask() != 0 {
            return Err(CsrError::ResetOverflow {
                bank: bank.into(),
                register: self.name.clone(),
                reset: self.reset,
                width: self.width,
            });
        }
        self.validate_fields(bank)
    }

    fn validate_fields(&self, bank: &str) -> CsrResult<()> {
        let qualified = format!("{bank}.{}", self.name);
        let mut fields: Vec<&CsrField> = self.fields.iter().collect();
        for (i, field) in fields.iter().enumerate() {
            validate_name(&field.name)?;
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CsrError::DuplicateField {
                    register: qualified,
                    field: field.name.clone(),
                });
            }
            if field.width == 0 || field.end() > u64::from(self.width) {
                return Err(CsrError::FieldOutOfRange {
                    register: qualified,
                    field: field.name.clone(),
                    offset: field.offset,
                    width: field.width,
                    register_width: self.width,
                });
            }
        }
        fields.sort_by_key(|f| f.offset);
        for pair in fields.windows(2) {
            if pair[0].end() > u64::from(pair[1].offset) {
                return Err(CsrError::FieldOverlap {
                    register: qualified,
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A named group of registers sharing one contiguous address range.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CsrBank {
    pub name: String,
    pub csrs: Vec<Csr>,
}

impl CsrBank {
    pub fn new(name: impl Into<String>, csrs: Vec<Csr>) -> Self {
        Self {
            name: name.into(),
            csrs,
        }
    }

    pub fn csr(&self, name: &str) -> Option<&Csr> {
        self.csrs.iter().find(|c| c.name == name)
    }
}

/// How bank sizes are rounded when banks are packed into the CSR region.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "size", rename_all = "lowercase")]
pub enum Alignment {
    /// Round each bank up to the bus slot size.
    Slot,
    /// Round each bank up to a multiple of the given number of bytes.
    Boundary(u64),
    /// Every bank occupies exactly one page of the given number of bytes.
    Paged(u64),
}

/// Which part of a multi-word register the lowest-addressed word carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordOrder {
    MsbFirst,
    LsbFirst,
}

/// Geometry of the CSR bus the banks are decoded on.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrBusConfig {
    /// Data bits carried by one bus word.
    pub data_width: u32,
    /// Address stride, in bytes, between two consecutive bus words.
    pub slot_size: u64,
    /// Absolute address of the CSR region.
    pub base: u64,
    pub alignment: Alignment,
    pub word_order: WordOrder,
}

impl Default for CsrBusConfig {
    fn default() -> Self {
        Self {
            data_width: 32,
            slot_size: 4,
            base: 0,
            alignment: Alignment::Slot,
            word_order: WordOrder::MsbFirst,
        }
    }
}

impl CsrBusConfig {
    pub fn validate(&self) -> CsrResult<()> {
        if !matches!(self.data_width, 8 | 16 | 32 | 64) {
            return Err(CsrError::InvalidBusConfig(format!(
                "data width {} is not one of 8, 16, 32, 64",
                self.data_width
            )));
        }
        if !self.slot_size.is_power_of_two() || self.slot_size * 8 < u64::from(self.data_width) {
            return Err(CsrError::InvalidBusConfig(format!(
                "slot size {} must be a power of two holding {} data bits",
                self.slot_size, self.data_width
            )));
        }
        if self.base % self.slot_size != 0 {
            return Err(CsrError::InvalidBusConfig(format!(
                "base {:#x} is not aligned to the slot size",
                self.base
            )));
        }
        match self.alignment {
            Alignment::Slot => {}
            Alignment::Boundary(n) | Alignment::Paged(n) => {
                if !n.is_power_of_two() || n < self.slot_size {
                    return Err(CsrError::InvalidBusConfig(format!(
                        "alignment {n:#x} must be a power of two and at least one slot"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of bus words needed to carry a register of `width` bits.
    pub fn words_for(&self, width: u32) -> u32 {
        width.div_ceil(self.data_width)
    }

    /// Bytes of address space a register of `width` bits occupies.
    pub fn bytes_for(&self, width: u32) -> u64 {
        u64::from(self.words_for(width)) * self.slot_size
    }

    /// Rounding unit for bank sizes.
    pub fn alignment_bytes(&self) -> u64 {
        match self.alignment {
            Alignment::Slot => self.slot_size,
            Alignment::Boundary(n) | Alignment::Paged(n) => n,
        }
    }
}

/// The part of a register carried by one bus word.
///
/// Recombining every slice with `(word & mask) << shift` yields the register value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct WordSlice {
    pub address: u64,
    pub shift: u32,
    pub bits: u32,
}

impl WordSlice {
    pub fn mask(&self) -> u64 {
        low_mask(self.bits)
    }
}

/// Split a register of `width` bits starting at `address` into bus words.
pub fn word_slices(width: u32, address: u64, bus: &CsrBusConfig) -> Vec<WordSlice> {
    let nwords = bus.words_for(width);
    (0..nwords)
        .map(|i| {
            let lane = match bus.word_order {
                WordOrder::MsbFirst => nwords - 1 - i,
                WordOrder::LsbFirst => i,
            };
            let shift = lane * bus.data_width;
            WordSlice {
                address: address + u64::from(i) * bus.slot_size,
                shift,
                bits: u32::min(bus.data_width, width - shift),
            }
        })
        .collect()
}

/// Split `value` into the words written to each slice.
pub fn scatter(slices: &[WordSlice], value: u64) -> Vec<u64> {
    slices
        .iter()
        .map(|s| (value >> s.shift) & s.mask())
        .collect()
}

/// Recombine the words read from each slice.
pub fn gather(slices: &[WordSlice], words: &[u64]) -> u64 {
    slices
        .iter()
        .zip(words)
        .fold(0, |acc, (s, w)| acc | ((w & s.mask()) << s.shift))
}

pub(crate) fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Cached,
    Io,
}

/// A bus-mapped memory window outside of the CSR region.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub name: String,
    pub origin: u64,
    pub size: u64,
    pub kind: RegionKind,
}

impl MemoryRegion {
    pub fn new(name: impl Into<String>, origin: u64, size: u64, kind: RegionKind) -> Self {
        Self {
            name: name.into(),
            origin,
            size,
            kind,
        }
    }

    /// One past the last address, saturating at the top of the address space.
    pub fn end(&self) -> u64 {
        self.origin.saturating_add(self.size)
    }

    pub fn overlaps(&self, origin: u64, size: u64) -> bool {
        self.origin < origin.saturating_add(size) && origin < self.end()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Int(u64),
    Str(String),
    #[default]
    Flag,
}

/// A value passed through to firmware as-is.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    #[serde(default)]
    pub value: ConstantValue,
}

/// Bank, register, field and region names: lowercase identifiers.
pub(crate) fn validate_name(name: &str) -> CsrResult<()> {
    let ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CsrError::InvalidName(name.into()))
    }
}

/// Constant names are emitted verbatim as preprocessor symbols.
pub(crate) fn validate_constant_name(name: &str) -> CsrResult<()> {
    let ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CsrError::InvalidName(name.into()))
    }
}
