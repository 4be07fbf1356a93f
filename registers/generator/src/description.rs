// Licensed under the Apache-2.0 license.

//! SoC descriptions loaded from hjson instead of built in code.
//!
//! A description goes through [`CsrRegistry`] exactly like peripherals
//! registered from Rust, so it gets the same validation.

use crate::error::{CsrError, CsrResult};
use crate::registry::CsrRegistry;
use crate::schema::{
    Alignment, Constant, Csr, CsrBusConfig, MemoryRegion, RegionKind, WordOrder,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Integer that may also be written as a `0x` string, since hjson has no hex literals.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum HexU64 {
    Int(u64),
    Text(String),
}

impl HexU64 {
    pub fn value(&self) -> CsrResult<u64> {
        match self {
            HexU64::Int(v) => Ok(*v),
            HexU64::Text(s) => {
                let s = s.trim().replace('_', "");
                let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => s.parse(),
                };
                parsed.map_err(|_| CsrError::Description(format!("{s:?} is not a number")))
            }
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BusDescription {
    pub data_width: Option<u32>,
    pub slot_size: Option<u64>,
    pub base: Option<HexU64>,
    pub alignment: Option<Alignment>,
    pub word_order: Option<WordOrder>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BankDescription {
    pub name: String,
    pub csrs: Vec<Csr>,
    /// Shorthand for an interrupt named after the bank.
    #[serde(default)]
    pub interrupt: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InterruptDescription {
    pub name: String,
    /// Defaults to `name`.
    pub peripheral: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegionDescription {
    pub name: String,
    pub origin: HexU64,
    pub size: HexU64,
    pub kind: RegionKind,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SocDescription {
    #[serde(default)]
    pub bus: BusDescription,
    pub banks: Vec<BankDescription>,
    #[serde(default)]
    pub interrupts: Vec<InterruptDescription>,
    #[serde(default)]
    pub memory_regions: Vec<RegionDescription>,
    #[serde(default)]
    pub constants: Vec<Constant>,
}

/// Deserialize hjson text into `T`.
///
/// serde-hjson cannot drive enum deserialization from quoted strings, so the
/// text is read into a generic value first and typed through serde_json.
pub fn parse_hjson_str<T: DeserializeOwned>(hjson_str: &str) -> CsrResult<T> {
    let value: serde_hjson::Value =
        serde_hjson::from_str(hjson_str).map_err(|e| CsrError::Description(e.to_string()))?;
    let value = serde_json::to_value(&value).map_err(|e| CsrError::Description(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| CsrError::Description(e.to_string()))
}

pub fn parse_description_hjson_str(hjson_str: &str) -> CsrResult<SocDescription> {
    parse_hjson_str(hjson_str)
}

impl SocDescription {
    /// Bus geometry from the description, falling back to `defaults` for
    /// anything it leaves out.
    pub fn bus_config(&self, defaults: &CsrBusConfig) -> CsrResult<CsrBusConfig> {
        let bus = &self.bus;
        let config = CsrBusConfig {
            data_width: bus.data_width.unwrap_or(defaults.data_width),
            slot_size: bus.slot_size.unwrap_or(defaults.slot_size),
            base: match &bus.base {
                Some(base) => base.value()?,
                None => defaults.base,
            },
            alignment: bus.alignment.unwrap_or(defaults.alignment),
            word_order: bus.word_order.unwrap_or(defaults.word_order),
        };
        config.validate()?;
        Ok(config)
    }

    /// Register everything in declaration order: banks (and their shorthand
    /// interrupts) first, then explicit interrupts, regions and constants.
    pub fn into_registry(self) -> CsrResult<CsrRegistry> {
        let mut registry = CsrRegistry::new();
        for bank in self.banks {
            let name = bank.name.clone();
            registry.add_bank(bank.name, bank.csrs)?;
            if bank.interrupt {
                registry.add_interrupt(&name, &name)?;
            }
        }
        for irq in self.interrupts {
            let peripheral = irq.peripheral.as_deref().unwrap_or(&irq.name);
            if registry.bank_by_name(peripheral).is_none() {
                return Err(CsrError::UnknownBank(peripheral.into()));
            }
            registry.add_interrupt(&irq.name, peripheral)?;
        }
        for region in self.memory_regions {
            registry.add_memory_region(MemoryRegion::new(
                region.name,
                region.origin.value()?,
                region.size.value()?,
                region.kind,
            ))?;
        }
        for constant in self.constants {
            registry.add_constant(constant.name, constant.value)?;
        }
        Ok(registry)
    }
}
