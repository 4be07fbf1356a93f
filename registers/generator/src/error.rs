// Licensed under the Apache-2.0 license

use thiserror::Error;

/// Configuration errors raised while declaring, allocating or emitting a CSR map.
///
/// All of these describe a static mistake in the SoC description; none of them
/// are transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsrError {
    #[error("invalid name {0:?}: must be a non-empty identifier of [a-z0-9_]")]
    InvalidName(String),
    #[error("bank {0:?} is already registered")]
    DuplicateBank(String),
    #[error("bank {0:?} has no registers")]
    EmptyBank(String),
    #[error("bank {bank:?} declares register {register:?} more than once")]
    DuplicateRegister { bank: String, register: String },
    #[error("register {bank}.{register} has zero width")]
    ZeroWidth { bank: String, register: String },
    #[error("register {bank}.{register} is {width} bits wide; at most {max} bits are supported")]
    WidthOverflow {
        bank: String,
        register: String,
        width: u32,
        max: u32,
    },
    #[error("field {register}.{field} (offset {offset}, width {width}) does not fit in {register_width} bits")]
    FieldOutOfRange {
        register: String,
        field: String,
        offset: u32,
        width: u32,
        register_width: u32,
    },
    #[error("fields {register}.{first} and {register}.{second} overlap")]
    FieldOverlap {
        register: String,
        first: String,
        second: String,
    },
    #[error("register {register:?} declares field {field:?} more than once")]
    DuplicateField { register: String, field: String },
    #[error("reset value {reset:#x} of {bank}.{register} does not fit in {width} bits")]
    ResetOverflow {
        bank: String,
        register: String,
        reset: u64,
        width: u32,
    },
    #[error("unsupported CSR bus configuration: {0}")]
    InvalidBusConfig(String),
    #[error("bank {bank:?} needs {size:#x} bytes but a page is only {page:#x} bytes")]
    PageOverflow { bank: String, size: u64, page: u64 },
    #[error("address space overflow while placing bank {0:?}")]
    AddressOverflow(String),
    #[error("interrupt source {0:?} is already registered")]
    DuplicateInterrupt(String),
    #[error("cannot register interrupt {name:?}: the interrupt vector only has {max} bits")]
    InterruptVectorFull { name: String, max: u32 },
    #[error("interrupt map is not dense: {0}")]
    InterruptMapNotDense(String),
    #[error("memory region {0:?} is already registered")]
    DuplicateRegion(String),
    #[error("memory region {0:?} has zero size")]
    EmptyRegion(String),
    #[error("memory region {first:?} overlaps {second:?}")]
    RegionOverlap { first: String, second: String },
    #[error("constant {0:?} is already defined")]
    DuplicateConstant(String),
    #[error("{first} and {second} both emit the symbol {symbol}")]
    SymbolCollision {
        first: String,
        second: String,
        symbol: String,
    },
    #[error("unknown bank {0:?}")]
    UnknownBank(String),
    #[error("bank {bank:?} has no register {register:?}")]
    UnknownRegister { bank: String, register: String },
    #[error("register {bank}.{register} is not a status register")]
    NotStatus { bank: String, register: String },
    #[error("failed to parse SoC description: {0}")]
    Description(String),
    #[error("failed to serialize CSR map: {0}")]
    Export(String),
}

pub type CsrResult<T> = Result<T, CsrError>;
