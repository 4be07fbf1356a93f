// Licensed under the Apache-2.0 license

use crate::error::{CsrError, CsrResult};
use crate::schema::{self, Alignment, CsrAccess, CsrBank, CsrBusConfig, WordSlice};
use std::collections::HashSet;

/// Placement of one register inside the CSR region.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CsrLayout {
    pub name: String,
    pub access: CsrAccess,
    pub width: u32,
    /// Absolute address of the first (lowest-addressed) bus word.
    pub address: u64,
    pub words: Vec<WordSlice>,
}

impl CsrLayout {
    /// Number of bus words the register occupies.
    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn is_multi_word(&self) -> bool {
        self.words.len() > 1
    }

    pub fn scatter(&self, value: u64) -> Vec<u64> {
        schema::scatter(&self.words, value)
    }

    pub fn gather(&self, words: &[u64]) -> u64 {
        schema::gather(&self.words, words)
    }
}

/// Placement of one bank inside the CSR region.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BankLayout {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub csrs: Vec<CsrLayout>,
}

impl BankLayout {
    pub fn end(&self) -> u64 {
        self.base + self.size
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }

    pub fn csr(&self, name: &str) -> Option<&CsrLayout> {
        self.csrs.iter().find(|c| c.name == name)
    }
}

/// Finalized bank placement. Banks are stored in registration order, which is
/// also ascending address order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AddressMap {
    base: u64,
    size: u64,
    banks: Vec<BankLayout>,
}

impl AddressMap {
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Total bytes used by all banks.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn banks(&self) -> &[BankLayout] {
        &self.banks
    }

    pub fn bank(&self, name: &str) -> Option<&BankLayout> {
        self.banks.iter().find(|b| b.name == name)
    }

    pub fn base_of(&self, name: &str) -> Option<u64> {
        self.bank(name).map(|b| b.base)
    }

    /// Bank whose address range contains `addr`.
    pub fn bank_at(&self, addr: u64) -> Option<&BankLayout> {
        self.bank_index_at(addr).map(|i| &self.banks[i])
    }

    pub(crate) fn bank_index_at(&self, addr: u64) -> Option<usize> {
        let idx = self.banks.partition_point(|b| b.base <= addr);
        idx.checked_sub(1).filter(|i| self.banks[*i].contains(addr))
    }
}

/// Assign every bank a base address in registration order.
///
/// Each register takes `ceil(width / data_width)` slots; a bank's size is the
/// sum over its registers, rounded up to the alignment boundary (or exactly
/// one page under [`Alignment::Paged`]).
pub fn allocate(banks: &[CsrBank], bus: &CsrBusConfig) -> CsrResult<AddressMap> {
    bus.validate()?;

    let mut seen = HashSet::new();
    let mut layouts = Vec::with_capacity(banks.len());
    let mut cursor: u64 = 0;
    for bank in banks {
        if !seen.insert(bank.name.as_str()) {
            return Err(CsrError::DuplicateBank(bank.name.clone()));
        }
        if bank.csrs.is_empty() {
            return Err(CsrError::EmptyBank(bank.name.clone()));
        }
        schema::validate_name(&bank.name)?;
        let mut names = HashSet::new();
        for csr in bank.csrs.iter() {
            csr.validate(&bank.name)?;
            if !names.insert(csr.name.as_str()) {
                return Err(CsrError::DuplicateRegister {
                    bank: bank.name.clone(),
                    register: csr.name.clone(),
                });
            }
        }
        let overflow = || CsrError::AddressOverflow(bank.name.clone());

        let base = bus.base.checked_add(cursor).ok_or_else(overflow)?;
        let mut offset = 0u64;
        let mut csrs = Vec::with_capacity(bank.csrs.len());
        for csr in bank.csrs.iter() {
            let address = base.checked_add(offset).ok_or_else(overflow)?;
            csrs.push(CsrLayout {
                name: csr.name.clone(),
                access: csr.access,
                width: csr.width,
                address,
                words: schema::word_slices(csr.width, address, bus),
            });
            offset += bus.bytes_for(csr.width);
        }

        let size = match bus.alignment {
            Alignment::Paged(page) => {
                if offset > page {
                    return Err(CsrError::PageOverflow {
                        bank: bank.name.clone(),
                        size: offset,
                        page,
                    });
                }
                page
            }
            Alignment::Slot | Alignment::Boundary(_) => {
                offset.next_multiple_of(bus.alignment_bytes())
            }
        };
        log::debug!(
            "bank {} at {:#x} size {:#x} ({} registers)",
            bank.name,
            base,
            size,
            csrs.len()
        );
        if base.checked_add(size).is_none() {
            return Err(overflow());
        }
        cursor += size;
        layouts.push(BankLayout {
            name: bank.name.clone(),
            base,
            size,
            csrs,
        });
    }

    Ok(AddressMap {
        base: bus.base,
        size: cursor,
        banks: layouts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Csr, WordOrder};

    fn example_banks() -> Vec<CsrBank> {
        vec![
            CsrBank::new("leds", vec![Csr::storage("out", 4)]),
            CsrBank::new(
                "timer",
                vec![
                    Csr::storage("load", 32),
                    Csr::storage("reload", 32),
                    Csr::status("value", 32),
                ],
            ),
        ]
    }

    fn assert_disjoint(map: &AddressMap) {
        for (i, a) in map.banks().iter().enumerate() {
            assert_eq!(a.size % 4, 0);
            for b in map.banks()[i + 1..].iter() {
                assert!(a.end() <= b.base || b.end() <= a.base, "{a:?} {b:?}");
            }
        }
    }

    #[test]
    fn test_two_bank_example() {
        let map = allocate(&example_banks(), &CsrBusConfig::default()).unwrap();
        let leds = map.bank("leds").unwrap();
        assert_eq!((leds.base, leds.size), (0x0, 4));
        let timer = map.bank("timer").unwrap();
        assert_eq!((timer.base, timer.size), (0x4, 12));
        assert_eq!(timer.csr("reload").unwrap().address, 0x8);
        assert_eq!(timer.csr("value").unwrap().address, 0xc);
        assert_eq!(map.size(), 16);
        assert_disjoint(&map);
    }

    #[test]
    fn test_empty_bank_rejected() {
        let banks = vec![
            CsrBank::new("leds", vec![Csr::storage("out", 4)]),
            CsrBank::new("nothing", vec![]),
        ];
        assert_eq!(
            allocate(&banks, &CsrBusConfig::default()),
            Err(CsrError::EmptyBank("nothing".into()))
        );
    }

    #[test]
    fn test_duplicate_bank_rejected() {
        let banks = vec![
            CsrBank::new("leds", vec![Csr::storage("out", 4)]),
            CsrBank::new("leds", vec![Csr::storage("out", 4)]),
        ];
        assert_eq!(
            allocate(&banks, &CsrBusConfig::default()),
            Err(CsrError::DuplicateBank("leds".into()))
        );
    }

    #[test]
    fn test_register_widths_checked() {
        let banks = vec![
            CsrBank::new("a", vec![Csr::storage("zero", 0)]),
            CsrBank::new("b", vec![Csr::storage("out", 4)]),
        ];
        assert_eq!(
            allocate(&banks, &CsrBusConfig::default()),
            Err(CsrError::ZeroWidth {
                bank: "a".into(),
                register: "zero".into()
            })
        );

        let banks = vec![CsrBank::new("wide", vec![Csr::status("value", 96)])];
        assert!(matches!(
            allocate(&banks, &CsrBusConfig::default()),
            Err(CsrError::WidthOverflow { width: 96, .. })
        ));
    }

    #[test]
    fn test_duplicate_register_rejected() {
        let banks = vec![CsrBank::new(
            "timer",
            vec![Csr::storage("load", 32), Csr::status("load", 32)],
        )];
        assert_eq!(
            allocate(&banks, &CsrBusConfig::default()),
            Err(CsrError::DuplicateRegister {
                bank: "timer".into(),
                register: "load".into()
            })
        );
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let bus = CsrBusConfig {
            data_width: 8,
            ..Default::default()
        };
        let first = allocate(&example_banks(), &bus).unwrap();
        let second = allocate(&example_banks(), &bus).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_narrow_bus_multi_word() {
        let bus = CsrBusConfig {
            data_width: 8,
            base: 0xe000_0000,
            ..Default::default()
        };
        let map = allocate(&example_banks(), &bus).unwrap();
        let timer = map.bank("timer").unwrap();
        // leds: 1 slot; each 32-bit timer register: 4 slots
        assert_eq!(timer.base, 0xe000_0004);
        assert_eq!(timer.size, 48);
        let reload = timer.csr("reload").unwrap();
        assert_eq!(reload.address, 0xe000_0014);
        assert_eq!(reload.size(), 4);
        assert_eq!(reload.words[0].shift, 24);
        assert_eq!(reload.words[3].address, 0xe000_0020);
        assert_eq!(reload.words[3].shift, 0);
        assert_disjoint(&map);
    }

    #[test]
    fn test_boundary_alignment() {
        let bus = CsrBusConfig {
            alignment: Alignment::Boundary(0x10),
            ..Default::default()
        };
        let map = allocate(&example_banks(), &bus).unwrap();
        assert_eq!(map.bank("leds").unwrap().size, 0x10);
        assert_eq!(map.base_of("timer"), Some(0x10));
        assert_eq!(map.bank("timer").unwrap().size, 0x10);
    }

    #[test]
    fn test_paged_alignment() {
        let bus = CsrBusConfig {
            data_width: 8,
            base: 0xe000_0000,
            alignment: Alignment::Paged(0x800),
            word_order: WordOrder::MsbFirst,
            ..Default::default()
        };
        let map = allocate(&example_banks(), &bus).unwrap();
        assert_eq!(map.base_of("leds"), Some(0xe000_0000));
        assert_eq!(map.base_of("timer"), Some(0xe000_0800));
        assert_eq!(map.size(), 0x1000);

        let tight = CsrBusConfig {
            alignment: Alignment::Paged(8),
            ..Default::default()
        };
        assert_eq!(
            allocate(&example_banks(), &tight),
            Err(CsrError::PageOverflow {
                bank: "timer".into(),
                size: 12,
                page: 8
            })
        );
    }

    #[test]
    fn test_bank_at() {
        let map = allocate(&example_banks(), &CsrBusConfig::default()).unwrap();
        assert_eq!(map.bank_at(0x0).unwrap().name, "leds");
        assert_eq!(map.bank_at(0x4).unwrap().name, "timer");
        assert_eq!(map.bank_at(0xf).unwrap().name, "timer");
        assert!(map.bank_at(0x10).is_none());
    }

    #[test]
    fn test_many_banks_disjoint() {
        let banks: Vec<CsrBank> = (0..40)
            .map(|i| {
                let csrs = (0..(i % 5 + 1))
                    .map(|j| Csr::status(format!("r{j}"), (i * 7 + j * 13) % 64 + 1))
                    .collect();
                CsrBank::new(format!("bank{i}"), csrs)
            })
            .collect();
        for data_width in [8, 16, 32, 64] {
            let bus = CsrBusConfig {
                data_width,
                slot_size: 8,
                ..Default::default()
            };
            assert_disjoint(&allocate(&banks, &bus).unwrap());
        }
    }
}
