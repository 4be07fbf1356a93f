// Licensed under the Apache-2.0 license

//! Machine-readable dumps of a finalized CSR map for host-side tooling.

use crate::error::{CsrError, CsrResult};
use crate::registry::FinalizedSoc;
use crate::schema::{ConstantValue, CsrBusConfig, RegionKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Serialize)]
struct RegisterEntry {
    addr: u64,
    size: usize,
    width: u32,
    #[serde(rename = "type")]
    access: &'static str,
}

#[derive(Serialize)]
struct MemoryEntry {
    base: u64,
    size: u64,
    #[serde(rename = "type")]
    kind: RegionKind,
}

#[derive(Serialize)]
struct CsrJson<'a> {
    bus: &'a CsrBusConfig,
    csr_bases: BTreeMap<&'a str, u64>,
    csr_registers: BTreeMap<String, RegisterEntry>,
    interrupts: BTreeMap<&'a str, u32>,
    memories: BTreeMap<&'a str, MemoryEntry>,
    constants: BTreeMap<&'a str, &'a ConstantValue>,
}

/// `csr.json`: every map keyed by name, so the output is stable across runs.
pub fn generate_csr_json(soc: &FinalizedSoc) -> CsrResult<String> {
    let mut doc = CsrJson {
        bus: soc.bus(),
        csr_bases: BTreeMap::new(),
        csr_registers: BTreeMap::new(),
        interrupts: BTreeMap::new(),
        memories: BTreeMap::new(),
        constants: BTreeMap::new(),
    };
    for (bank, layout) in soc.bank_layouts() {
        doc.csr_bases.insert(&bank.name, layout.base);
        for csr in layout.csrs.iter() {
            doc.csr_registers.insert(
                format!("{}_{}", bank.name, csr.name),
                RegisterEntry {
                    addr: csr.address,
                    size: csr.size(),
                    width: csr.width,
                    access: csr.access.short_name(),
                },
            );
        }
    }
    for source in soc.interrupts().sources() {
        doc.interrupts.insert(&source.name, source.bit);
    }
    for region in soc.memory_regions() {
        doc.memories.insert(
            &region.name,
            MemoryEntry {
                base: region.origin,
                size: region.size,
                kind: region.kind,
            },
        );
    }
    for constant in soc.constants() {
        doc.constants.insert(&constant.name, &constant.value);
    }
    let mut out =
        serde_json::to_string_pretty(&doc).map_err(|e| CsrError::Export(e.to_string()))?;
    out.push('\n');
    Ok(out)
}

/// `csr.csv`: one line per bank, register, constant and memory region, in
/// registration order.
pub fn generate_csr_csv(soc: &FinalizedSoc) -> String {
    let mut out = String::new();
    for (bank, layout) in soc.bank_layouts() {
        let _ = writeln!(out, "csr_base,{},0x{:08x},,", bank.name, layout.base);
    }
    for (bank, layout) in soc.bank_layouts() {
        for csr in layout.csrs.iter() {
            let _ = writeln!(
                out,
                "csr_register,{}_{},0x{:08x},{},{}",
                bank.name,
                csr.name,
                csr.address,
                csr.size(),
                csr.access.short_name()
            );
        }
    }
    for source in soc.interrupts().sources() {
        let _ = writeln!(out, "interrupt,{},{},,", source.name, source.bit);
    }
    for constant in soc.constants() {
        let value = match &constant.value {
            ConstantValue::Int(v) => v.to_string(),
            ConstantValue::Str(s) => s.clone(),
            ConstantValue::Flag => "None".into(),
        };
        let _ = writeln!(out, "constant,{},{},,", constant.name.to_lowercase(), value);
    }
    for region in soc.memory_regions() {
        let kind = match region.kind {
            RegionKind::Cached => "cached",
            RegionKind::Io => "io",
        };
        let _ = writeln!(
            out,
            "memory_region,{},0x{:08x},{},{}",
            region.name, region.origin, region.size, kind
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CsrRegistry;
    use crate::schema::{Csr, MemoryRegion};

    fn soc() -> FinalizedSoc {
        let mut registry = CsrRegistry::new();
        registry
            .add_bank("timer0", vec![Csr::storage("load", 32), Csr::status("value", 32)])
            .unwrap();
        registry
            .add_bank("leds", vec![Csr::storage("out", 4)])
            .unwrap();
        registry.add_interrupt("timer0", "timer0").unwrap();
        registry
            .add_memory_region(MemoryRegion::new("rom", 0, 0x8000, RegionKind::Cached))
            .unwrap();
        registry
            .add_constant("CONFIG_CLOCK_FREQUENCY", ConstantValue::Int(100_000_000))
            .unwrap();
        registry
            .add_constant("CONFIG_WITH_ETHERNET", ConstantValue::Flag)
            .unwrap();
        let bus = CsrBusConfig {
            base: 0xe000_0000,
            ..Default::default()
        };
        registry.finalize(&bus).unwrap()
    }

    #[test]
    fn test_json() {
        let json = generate_csr_json(&soc()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["csr_bases"]["timer0"], 0xe000_0000u64);
        assert_eq!(value["csr_bases"]["leds"], 0xe000_0008u64);
        assert_eq!(value["csr_registers"]["timer0_value"]["addr"], 0xe000_0004u64);
        assert_eq!(value["csr_registers"]["timer0_value"]["type"], "ro");
        assert_eq!(value["csr_registers"]["leds_out"]["type"], "rw");
        assert_eq!(value["interrupts"]["timer0"], 0);
        assert_eq!(value["memories"]["rom"]["type"], "cached");
        assert_eq!(value["constants"]["CONFIG_CLOCK_FREQUENCY"], 100_000_000);
        assert!(value["constants"]["CONFIG_WITH_ETHERNET"].is_null());
        assert_eq!(value["bus"]["data_width"], 32);
        assert_eq!(json, generate_csr_json(&soc()).unwrap());
    }

    #[test]
    fn test_csv() {
        let csv = generate_csr_csv(&soc());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "csr_base,timer0,0xe0000000,,",
                "csr_base,leds,0xe0000008,,",
                "csr_register,timer0_load,0xe0000000,1,rw",
                "csr_register,timer0_value,0xe0000004,1,ro",
                "csr_register,leds_out,0xe0000008,1,rw",
                "interrupt,timer0,0,,",
                "constant,config_clock_frequency,100000000,,",
                "constant,config_with_ethernet,None,,",
                "memory_region,rom,0x00000000,32768,cached",
            ]
        );
    }
}
