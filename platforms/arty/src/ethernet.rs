// Licensed under the Apache-2.0 license

use crate::events::EventManager;
use csr_generator::{
    BankId, ConstantValue, Csr, CsrField, CsrRegistry, CsrResult, MemoryRegion, RegionKind,
};

pub const ETHMAC_SLOT_SIZE: u64 = 2048;
pub const ETHMAC_RX_SLOTS: u64 = 2;
pub const ETHMAC_TX_SLOTS: u64 = 2;

/// MII PHY: clock reset and bit-banged MDIO.
#[derive(Clone, Copy, Debug)]
pub struct EthPhy {
    pub bank: BankId,
}

impl EthPhy {
    pub fn new(registry: &mut CsrRegistry) -> CsrResult<Self> {
        let bank = registry.add_bank(
            "ethphy",
            vec![
                Csr::storage("crg_reset", 1),
                Csr::storage("mdio_w", 3)
                    .with_field(CsrField::new("mdc", 0, 1))
                    .with_field(CsrField::new("oe", 1, 1))
                    .with_field(CsrField::new("w", 2, 1)),
                Csr::status("mdio_r", 1),
            ],
        )?;
        Ok(Self { bank })
    }
}

/// Wishbone MAC with its packet buffers mapped outside the CSR region.
#[derive(Clone, Copy, Debug)]
pub struct EthMac {
    pub bank: BankId,
    pub irq: u32,
}

impl EthMac {
    pub fn new(registry: &mut CsrRegistry, origin: u64) -> CsrResult<Self> {
        let slot_bits = u64::BITS - (ETHMAC_RX_SLOTS.max(ETHMAC_TX_SLOTS) - 1).leading_zeros();
        let length_bits = u64::BITS - ETHMAC_SLOT_SIZE.leading_zeros();
        let ev = EventManager::new(&["available"]);

        let mut csrs = vec![
            Csr::status("sram_writer_slot", slot_bits),
            Csr::status("sram_writer_length", 32),
            Csr::status("sram_writer_errors", 32),
        ];
        csrs.extend(ev.prefixed_csrs("sram_writer"));
        csrs.extend([
            Csr::storage("sram_reader_start", 1),
            Csr::status("sram_reader_ready", 1),
            Csr::status("sram_reader_level", 2),
            Csr::storage("sram_reader_slot", slot_bits),
            Csr::storage("sram_reader_length", length_bits),
        ]);
        csrs.extend(EventManager::new(&["done"]).prefixed_csrs("sram_reader"));
        csrs.extend([
            Csr::status("preamble_crc", 1),
            Csr::status("preamble_errors", 32),
            Csr::status("crc_errors", 32),
        ]);
        let bank = registry.add_bank("ethmac", csrs)?;
        let irq = registry.add_interrupt("ethmac", "ethmac")?;

        let buffers = (ETHMAC_RX_SLOTS + ETHMAC_TX_SLOTS) * ETHMAC_SLOT_SIZE;
        registry.add_memory_region(MemoryRegion::new("ethmac", origin, buffers, RegionKind::Io))?;
        registry.add_constant("ETHMAC_RX_SLOTS", ConstantValue::Int(ETHMAC_RX_SLOTS))?;
        registry.add_constant("ETHMAC_TX_SLOTS", ConstantValue::Int(ETHMAC_TX_SLOTS))?;
        registry.add_constant("ETHMAC_SLOT_SIZE", ConstantValue::Int(ETHMAC_SLOT_SIZE))?;
        Ok(Self { bank, irq })
    }
}
