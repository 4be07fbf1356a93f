// Licensed under the Apache-2.0 license

use crate::config::{ArtyConfig, ARTY_MEMORY_MAP};
use crate::cores::{Ctrl, DdrPhy, SdramDfii, SdramGeometry, Timer, Uart};
use crate::ethernet::{EthMac, EthPhy};
use crate::gpio::GpioOut;
use crate::i2s::{I2sDirection, I2sSlave};
use csr_generator::{
    ConstantValue, CsrRegistry, CsrResult, FinalizedSoc, MemoryRegion, RegionKind,
};

/// Declare every Arty peripheral, in the order their banks are laid out.
pub fn register_arty_soc(config: &ArtyConfig) -> CsrResult<CsrRegistry> {
    let mut registry = CsrRegistry::new();
    let map = &ARTY_MEMORY_MAP;
    let geom = SdramGeometry::MT41K128M16;

    Ctrl::new(&mut registry)?;
    Uart::new(&mut registry, "uart")?;
    Timer::new(&mut registry, "timer0", 32)?;
    DdrPhy::new(&mut registry, geom.databits)?;
    SdramDfii::new(&mut registry, &geom)?;

    registry.add_memory_region(MemoryRegion::new(
        "rom",
        map.rom_offset,
        config.rom_size(),
        RegionKind::Cached,
    ))?;
    registry.add_memory_region(MemoryRegion::new(
        "sram",
        map.sram_offset,
        config.integrated_sram_size,
        RegionKind::Cached,
    ))?;
    registry.add_memory_region(MemoryRegion::new(
        "main_ram",
        map.main_ram_offset,
        config.main_ram_size.unwrap_or(geom.size()),
        RegionKind::Cached,
    ))?;

    if config.with_ethernet {
        EthPhy::new(&mut registry)?;
        EthMac::new(&mut registry, map.ethmac_offset)?;
        I2sSlave::new(&mut registry, "i2s_rx", I2sDirection::Rx, map.i2s_rx_offset)?;
        I2sSlave::new(&mut registry, "i2s_tx", I2sDirection::Tx, map.i2s_tx_offset)?;
        GpioOut::new(&mut registry, "port_led", config.user_leds)?;
    }

    registry.add_constant(
        "CONFIG_CLOCK_FREQUENCY",
        ConstantValue::Int(config.sys_clk_freq),
    )?;
    registry.add_constant(
        format!("CONFIG_CPU_TYPE_{}", config.cpu_type.to_uppercase()),
        ConstantValue::Flag,
    )?;
    registry.add_constant(
        "CONFIG_CPU_RESET_ADDR",
        ConstantValue::Int(config.cpu_reset_address),
    )?;
    registry.add_constant(
        "CONFIG_CSR_DATA_WIDTH",
        ConstantValue::Int(u64::from(config.csr_data_width)),
    )?;
    registry.add_constant("CONFIG_CSR_ALIGNMENT", ConstantValue::Int(32))?;
    if config.with_ethernet {
        registry.add_constant("CONFIG_WITH_ETHERNET", ConstantValue::Flag)?;
    }
    Ok(registry)
}

/// Register and finalize the Arty SoC described by `config`.
pub fn build_arty_soc(config: &ArtyConfig) -> CsrResult<FinalizedSoc> {
    log::debug!(
        "building arty soc (ethernet: {}, csr data width: {})",
        config.with_ethernet,
        config.csr_data_width
    );
    register_arty_soc(config)?.finalize(&config.bus_config())
}
