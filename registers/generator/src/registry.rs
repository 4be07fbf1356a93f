// Licensed under the Apache-2.0 license

use crate::allocator::{allocate, AddressMap, BankLayout, CsrLayout};
use crate::codegen::header_symbols;
use crate::error::{CsrError, CsrResult};
use crate::irq::InterruptMap;
use crate::schema::{
    validate_constant_name, validate_name, Constant, ConstantValue, Csr, CsrBank, CsrBusConfig,
    MemoryRegion,
};
use std::collections::{HashMap, HashSet};

/// Index of a bank inside the registry it was registered with.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BankId(usize);

impl BankId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Collects everything peripherals declare while the SoC is being put together.
///
/// Peripheral constructors take the registry by `&mut`; nothing is global.
/// Declarations are validated as they arrive, so a mistake is reported
/// against the call that made it.
#[derive(Clone, Debug, Default)]
pub struct CsrRegistry {
    banks: Vec<CsrBank>,
    interrupts: InterruptMap,
    memory_regions: Vec<MemoryRegion>,
    constants: Vec<Constant>,
}

impl CsrRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bank(&mut self, name: impl Into<String>, csrs: Vec<Csr>) -> CsrResult<BankId> {
        let name = name.into();
        validate_name(&name)?;
        if self.banks.iter().any(|b| b.name == name) {
            return Err(CsrError::DuplicateBank(name));
        }
        if csrs.is_empty() {
            return Err(CsrError::EmptyBank(name));
        }
        let mut seen = HashSet::new();
        for csr in csrs.iter() {
            csr.validate(&name)?;
            if !seen.insert(csr.name.as_str()) {
                return Err(CsrError::DuplicateRegister {
                    bank: name.clone(),
                    register: csr.name.clone(),
                });
            }
        }
        self.banks.push(CsrBank { name, csrs });
        Ok(BankId(self.banks.len() - 1))
    }

    /// Attach an interrupt source; returns its bit in the pending vector.
    pub fn add_interrupt(&mut self, name: &str, peripheral: &str) -> CsrResult<u32> {
        self.interrupts.assign(name, peripheral)
    }

    pub fn add_memory_region(&mut self, region: MemoryRegion) -> CsrResult<()> {
        validate_name(&region.name)?;
        if region.size == 0 {
            return Err(CsrError::EmptyRegion(region.name));
        }
        for other in self.memory_regions.iter() {
            if other.name == region.name {
                return Err(CsrError::DuplicateRegion(region.name));
            }
            if other.overlaps(region.origin, region.size) {
                return Err(CsrError::RegionOverlap {
                    first: other.name.clone(),
                    second: region.name,
                });
            }
        }
        self.memory_regions.push(region);
        Ok(())
    }

    pub fn add_constant(&mut self, name: impl Into<String>, value: ConstantValue) -> CsrResult<()> {
        let name = name.into();
        validate_constant_name(&name)?;
        if self.constants.iter().any(|c| c.name == name) {
            return Err(CsrError::DuplicateConstant(name));
        }
        self.constants.push(Constant { name, value });
        Ok(())
    }

    pub fn bank(&self, id: BankId) -> &CsrBank {
        &self.banks[id.0]
    }

    pub fn bank_by_name(&self, name: &str) -> Option<(BankId, &CsrBank)> {
        self.banks
            .iter()
            .enumerate()
            .find(|(_, b)| b.name == name)
            .map(|(i, b)| (BankId(i), b))
    }

    pub fn banks(&self) -> &[CsrBank] {
        &self.banks
    }

    pub fn interrupts(&self) -> &InterruptMap {
        &self.interrupts
    }

    /// Allocate addresses and freeze the description.
    pub fn finalize(self, bus: &CsrBusConfig) -> CsrResult<FinalizedSoc> {
        let address_map = allocate(&self.banks, bus)?;
        self.interrupts.verify_dense()?;

        if address_map.size() > 0 {
            for region in self.memory_regions.iter() {
                if region.overlaps(address_map.base(), address_map.size()) {
                    return Err(CsrError::RegionOverlap {
                        first: region.name.clone(),
                        second: "csr".into(),
                    });
                }
            }
        }
        for source in self.interrupts.sources() {
            if !self.banks.iter().any(|b| b.name == source.peripheral) {
                log::warn!(
                    "interrupt {} belongs to {}, which has no CSR bank",
                    source.name,
                    source.peripheral
                );
            }
        }

        let soc = FinalizedSoc {
            bus: bus.clone(),
            banks: self.banks,
            address_map,
            interrupts: self.interrupts,
            memory_regions: self.memory_regions,
            constants: self.constants,
        };
        soc.check_symbols()?;
        log::info!(
            "CSR map: {} banks, {:#x} bytes at {:#x}, {} interrupts",
            soc.banks.len(),
            soc.address_map.size(),
            soc.address_map.base(),
            soc.interrupts.len()
        );
        Ok(soc)
    }
}

/// The frozen SoC description every emitter reads from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FinalizedSoc {
    bus: CsrBusConfig,
    banks: Vec<CsrBank>,
    address_map: AddressMap,
    interrupts: InterruptMap,
    memory_regions: Vec<MemoryRegion>,
    constants: Vec<Constant>,
}

impl FinalizedSoc {
    pub fn bus(&self) -> &CsrBusConfig {
        &self.bus
    }

    pub fn banks(&self) -> &[CsrBank] {
        &self.banks
    }

    pub fn address_map(&self) -> &AddressMap {
        &self.address_map
    }

    pub fn interrupts(&self) -> &InterruptMap {
        &self.interrupts
    }

    pub fn memory_regions(&self) -> &[MemoryRegion] {
        &self.memory_regions
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Names are flattened into C identifiers, so distinct declarations can
    /// land on the same symbol (`a` + `b_c` against `a_b` + `c`, or a bank
    /// called `slot` against `CSR_SLOT_SIZE`).
    fn check_symbols(&self) -> CsrResult<()> {
        let mut seen: HashMap<String, String> = HashMap::new();
        for (owner, symbol) in header_symbols(self) {
            if let Some(first) = seen.get(&symbol) {
                return Err(CsrError::SymbolCollision {
                    first: first.clone(),
                    second: owner,
                    symbol,
                });
            }
            seen.insert(symbol, owner);
        }
        Ok(())
    }

    /// Declarations paired with their placement, in registration order.
    pub fn bank_layouts(&self) -> impl Iterator<Item = (&CsrBank, &BankLayout)> {
        self.banks.iter().zip(self.address_map.banks())
    }

    pub fn csr(&self, bank: &str, csr: &str) -> Option<(&Csr, &CsrLayout)> {
        let (decl, layout) = self.bank_layouts().find(|(b, _)| b.name == bank)?;
        let idx = decl.csrs.iter().position(|c| c.name == csr)?;
        Some((&decl.csrs[idx], &layout.csrs[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CsrField, RegionKind};

    #[test]
    fn test_registration_errors() {
        let mut registry = CsrRegistry::new();
        let leds = registry
            .add_bank("leds", vec![Csr::storage("out", 4)])
            .unwrap();
        assert_eq!(leds.index(), 0);
        assert_eq!(
            registry.add_bank("leds", vec![Csr::storage("out", 4)]),
            Err(CsrError::DuplicateBank("leds".into()))
        );
        assert_eq!(
            registry.add_bank("empty", vec![]),
            Err(CsrError::EmptyBank("empty".into()))
        );
        assert_eq!(
            registry.add_bank(
                "timer",
                vec![Csr::storage("load", 32), Csr::storage("load", 32)]
            ),
            Err(CsrError::DuplicateRegister {
                bank: "timer".into(),
                register: "load".into()
            })
        );
        assert!(matches!(
            registry.add_bank("wide", vec![Csr::status("value", 96)]),
            Err(CsrError::WidthOverflow { width: 96, .. })
        ));
        assert_eq!(
            registry.add_bank("Leds", vec![Csr::storage("out", 4)]),
            Err(CsrError::InvalidName("Leds".into()))
        );
        // failed registrations leave nothing behind
        assert_eq!(registry.banks().len(), 1);
    }

    #[test]
    fn test_memory_regions() {
        let mut registry = CsrRegistry::new();
        registry
            .add_memory_region(MemoryRegion::new("rom", 0, 0x8000, RegionKind::Cached))
            .unwrap();
        assert_eq!(
            registry.add_memory_region(MemoryRegion::new(
                "sram",
                0x4000,
                0x8000,
                RegionKind::Cached
            )),
            Err(CsrError::RegionOverlap {
                first: "rom".into(),
                second: "sram".into()
            })
        );
        assert_eq!(
            registry.add_memory_region(MemoryRegion::new("rom", 0x10000, 4, RegionKind::Io)),
            Err(CsrError::DuplicateRegion("rom".into()))
        );
        assert_eq!(
            registry.add_memory_region(MemoryRegion::new("zero", 0x10000, 0, RegionKind::Io)),
            Err(CsrError::EmptyRegion("zero".into()))
        );
    }

    #[test]
    fn test_csr_region_overlaps_memory() {
        let mut registry = CsrRegistry::new();
        registry
            .add_bank("leds", vec![Csr::storage("out", 4)])
            .unwrap();
        registry
            .add_memory_region(MemoryRegion::new("io", 0x1000, 0x1000, RegionKind::Io))
            .unwrap();
        let bus = CsrBusConfig {
            base: 0x1800,
            ..Default::default()
        };
        assert_eq!(
            registry.finalize(&bus),
            Err(CsrError::RegionOverlap {
                first: "io".into(),
                second: "csr".into()
            })
        );
    }

    #[test]
    fn test_constants() {
        let mut registry = CsrRegistry::new();
        registry
            .add_constant("CONFIG_CLOCK_FREQUENCY", ConstantValue::Int(100_000_000))
            .unwrap();
        assert_eq!(
            registry.add_constant("CONFIG_CLOCK_FREQUENCY", ConstantValue::Flag),
            Err(CsrError::DuplicateConstant("CONFIG_CLOCK_FREQUENCY".into()))
        );
        assert_eq!(
            registry.add_constant("lower", ConstantValue::Flag),
            Err(CsrError::InvalidName("lower".into()))
        );
    }

    #[test]
    fn test_symbol_collision() {
        let mut registry = CsrRegistry::new();
        registry
            .add_bank("a", vec![Csr::storage("b_c", 1)])
            .unwrap();
        registry
            .add_bank("a_b", vec![Csr::storage("c", 1)])
            .unwrap();
        assert_eq!(
            registry.finalize(&CsrBusConfig::default()),
            Err(CsrError::SymbolCollision {
                first: "a.b_c".into(),
                second: "a_b.c".into(),
                symbol: "CSR_A_B_C_ADDR".into()
            })
        );
    }

    #[test]
    fn test_field_symbol_collision() {
        let mut registry = CsrRegistry::new();
        registry
            .add_bank(
                "a",
                vec![
                    Csr::storage("x", 8).with_field(CsrField::new("y", 0, 1)),
                    Csr::storage("x_y", 8),
                ],
            )
            .unwrap();
        assert_eq!(
            registry.finalize(&CsrBusConfig::default()),
            Err(CsrError::SymbolCollision {
                first: "a.x.y".into(),
                second: "a.x_y".into(),
                symbol: "CSR_A_X_Y_SIZE".into()
            })
        );
    }

    #[test]
    fn test_word_symbol_collision() {
        let mut registry = CsrRegistry::new();
        registry
            .add_bank("a", vec![Csr::storage("x", 32), Csr::storage("x_w0", 8)])
            .unwrap();
        let bus = CsrBusConfig {
            data_width: 8,
            ..Default::default()
        };
        assert_eq!(
            registry.clone().finalize(&bus),
            Err(CsrError::SymbolCollision {
                first: "a.x".into(),
                second: "a.x_w0".into(),
                symbol: "CSR_A_X_W0_ADDR".into()
            })
        );
        // single-word registers emit no W<i> defines
        assert!(registry.finalize(&CsrBusConfig::default()).is_ok());
    }

    #[test]
    fn test_bank_symbol_collides_with_bus_define() {
        let mut registry = CsrRegistry::new();
        registry
            .add_bank("slot", vec![Csr::storage("out", 4)])
            .unwrap();
        assert_eq!(
            registry.finalize(&CsrBusConfig::default()),
            Err(CsrError::SymbolCollision {
                first: "csr bus".into(),
                second: "slot".into(),
                symbol: "CSR_SLOT_SIZE".into()
            })
        );
    }

    #[test]
    fn test_constant_collides_with_region() {
        let mut registry = CsrRegistry::new();
        registry
            .add_memory_region(MemoryRegion::new("rom", 0, 0x8000, RegionKind::Cached))
            .unwrap();
        registry
            .add_constant("ROM_SIZE", ConstantValue::Int(0x8000))
            .unwrap();
        assert_eq!(
            registry.finalize(&CsrBusConfig::default()),
            Err(CsrError::SymbolCollision {
                first: "memory region rom".into(),
                second: "constant ROM_SIZE".into(),
                symbol: "ROM_SIZE".into()
            })
        );
    }

    #[test]
    fn test_finalize() {
        let mut registry = CsrRegistry::new();
        registry
            .add_bank("leds", vec![Csr::storage("out", 4)])
            .unwrap();
        registry
            .add_bank(
                "timer",
                vec![Csr::storage("load", 32), Csr::status("value", 32)],
            )
            .unwrap();
        assert_eq!(registry.add_interrupt("timer", "timer"), Ok(0));
        let soc = registry.finalize(&CsrBusConfig::default()).unwrap();
        let (decl, layout) = soc.csr("timer", "value").unwrap();
        assert_eq!(decl.width, 32);
        assert_eq!(layout.address, 0x8);
        assert!(soc.csr("timer", "missing").is_none());
        assert_eq!(soc.bank_layouts().count(), 2);
        assert_eq!(soc.interrupts().bit_of("timer"), Some(0));
    }
}
