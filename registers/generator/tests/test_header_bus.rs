// Licensed under the Apache-2.0 license

use csr_generator::{
    generate_csr_header, Alignment, Csr, CsrBankArray, CsrBus, CsrBusConfig, CsrRegistry,
    FinalizedSoc, HeaderOptions, WordOrder,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::collections::HashMap;

fn parse_u64(s: &str) -> u64 {
    let s = s.trim_end_matches("ULL").trim_end_matches('L');
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).unwrap(),
        None => s.parse().unwrap(),
    }
}

/// `#define NAME VALUE` lines with a numeric value.
fn defines(header: &str) -> HashMap<String, u64> {
    header
        .lines()
        .filter_map(|line| line.strip_prefix("#define "))
        .filter_map(|rest| rest.split_once(' '))
        .filter(|(_, value)| value.starts_with(|c: char| c.is_ascii_digit()))
        .map(|(name, value)| (name.to_string(), parse_u64(value)))
        .collect()
}

fn build(bus: &CsrBusConfig) -> FinalizedSoc {
    let mut registry = CsrRegistry::new();
    registry
        .add_bank(
            "ctrl",
            vec![
                Csr::storage("reset", 1),
                Csr::storage("scratch", 32).with_reset(0x1234_5678),
                Csr::status("bus_errors", 32),
            ],
        )
        .unwrap();
    registry
        .add_bank(
            "timer0",
            vec![
                Csr::storage("load", 32),
                Csr::storage("reload", 32),
                Csr::storage("en", 1),
                Csr::status("value", 32),
            ],
        )
        .unwrap();
    registry
        .add_bank(
            "wide",
            vec![Csr::storage("odd", 20), Csr::storage("cycles", 64)],
        )
        .unwrap();
    registry.finalize(bus).unwrap()
}

/// Write every storage register through the header's addresses and shifts,
/// then check the decode model latched the intended value.
#[test]
fn test_header_addresses_match_decode() {
    let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();

    for word_order in [WordOrder::MsbFirst, WordOrder::LsbFirst] {
        for data_width in [8, 16, 32, 64] {
            let bus = CsrBusConfig {
                data_width,
                slot_size: 8,
                base: 0xe000_0000,
                alignment: Alignment::Boundary(0x100),
                word_order,
            };
            let soc = build(&bus);
            let header = generate_csr_header(&soc, &HeaderOptions::default()).unwrap();
            let defs = defines(&header);
            let mut array = CsrBankArray::new(&soc);

            for (bank, _) in soc.bank_layouts() {
                for csr in bank.csrs.iter().filter(|c| c.access.can_write()) {
                    let prefix = format!("CSR_{}_{}", bank.name, csr.name).to_uppercase();
                    let value = 0xa5c3_0f96_e187_d24b & csr.mask();
                    let words = defs[&format!("{prefix}_SIZE")];
                    if words == 1 {
                        array.write(defs[&format!("{prefix}_ADDR")], value).unwrap();
                    } else {
                        for i in 0..words {
                            let addr = defs[&format!("{prefix}_W{i}_ADDR")];
                            let shift = defs[&format!("{prefix}_W{i}_SHIFT")];
                            let mask = defs[&format!("{prefix}_W{i}_MASK")];
                            array.write(addr, (value >> shift) & mask).unwrap();
                        }
                    }
                    assert_eq!(
                        array.value(&bank.name, &csr.name),
                        Some(value),
                        "{prefix} data_width {data_width} {word_order:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_bank_defines_match_map() {
    let bus = CsrBusConfig {
        data_width: 8,
        base: 0xe000_0000,
        alignment: Alignment::Paged(0x800),
        ..Default::default()
    };
    let soc = build(&bus);
    let defs = defines(&generate_csr_header(&soc, &HeaderOptions::default()).unwrap());
    assert_eq!(defs["CSR_BASE"], 0xe000_0000);
    assert_eq!(defs["CSR_DATA_WIDTH"], 8);
    for bank in soc.address_map().banks() {
        let prefix = format!("CSR_{}", bank.name.to_uppercase());
        assert_eq!(defs[&format!("{prefix}_BASE")], bank.base);
        assert_eq!(defs[&format!("{prefix}_SIZE")], 0x800);
    }
    assert_eq!(defs["CSR_TIMER0_BASE"], 0xe000_0800);
    assert_eq!(defs["CSR_WIDE_CYCLES_SIZE"], 8);
}
