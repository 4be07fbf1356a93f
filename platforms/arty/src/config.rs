// Licensed under the Apache-2.0 license

use csr_generator::{Alignment, CsrBusConfig, WordOrder};
use serde::Deserialize;

/// Fixed bus addresses of the Arty SoC.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArtyMemoryMap {
    pub rom_offset: u64,
    pub sram_offset: u64,
    pub main_ram_offset: u64,
    pub ethmac_offset: u64,
    pub i2s_rx_offset: u64,
    pub i2s_tx_offset: u64,
    pub csr_offset: u64,
}

pub const ARTY_MEMORY_MAP: ArtyMemoryMap = ArtyMemoryMap {
    rom_offset: 0x0000_0000,
    sram_offset: 0x1000_0000,
    main_ram_offset: 0x4000_0000,
    ethmac_offset: 0xb000_0000,
    i2s_rx_offset: 0xb100_0000,
    i2s_tx_offset: 0xb200_0000,
    csr_offset: 0xe000_0000,
};

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArtyConfig {
    pub sys_clk_freq: u64,
    pub with_ethernet: bool,
    /// Defaults to 32 KiB, or 64 KiB with Ethernet to fit the network boot code.
    pub integrated_rom_size: Option<u64>,
    pub integrated_sram_size: u64,
    /// Defaults to the capacity of the SDRAM module.
    pub main_ram_size: Option<u64>,
    pub csr_data_width: u32,
    pub csr_base: u64,
    pub csr_alignment: Alignment,
    pub cpu_type: String,
    pub cpu_reset_address: u64,
    /// Number of user LEDs wired to `port_led`.
    pub user_leds: u32,
}

impl Default for ArtyConfig {
    fn default() -> Self {
        Self {
            sys_clk_freq: 100_000_000,
            with_ethernet: false,
            integrated_rom_size: None,
            integrated_sram_size: 0x8000,
            main_ram_size: None,
            csr_data_width: 8,
            csr_base: ARTY_MEMORY_MAP.csr_offset,
            csr_alignment: Alignment::Paged(0x800),
            cpu_type: "vexriscv".into(),
            cpu_reset_address: ARTY_MEMORY_MAP.rom_offset,
            user_leds: 4,
        }
    }
}

impl ArtyConfig {
    pub fn rom_size(&self) -> u64 {
        self.integrated_rom_size
            .unwrap_or(if self.with_ethernet { 0x10000 } else { 0x8000 })
    }

    pub fn bus_config(&self) -> CsrBusConfig {
        CsrBusConfig {
            data_width: self.csr_data_width,
            slot_size: 4,
            base: self.csr_base,
            alignment: self.csr_alignment,
            word_order: WordOrder::MsbFirst,
        }
    }
}
