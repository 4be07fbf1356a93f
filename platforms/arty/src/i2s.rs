// Licensed under the Apache-2.0 license

use crate::events::EventManager;
use csr_generator::{BankId, Csr, CsrField, CsrRegistry, CsrResult, MemoryRegion, RegionKind};

/// Size of the sample FIFO window each I2S core maps on the main bus.
pub const I2S_FIFO_WINDOW: u64 = 0x40000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum I2sDirection {
    Rx,
    Tx,
}

impl I2sDirection {
    fn prefix(&self) -> &'static str {
        match self {
            I2sDirection::Rx => "rx",
            I2sDirection::Tx => "tx",
        }
    }
}

/// I2S slave with a memory-mapped FIFO and a ready/error interrupt.
#[derive(Clone, Copy, Debug)]
pub struct I2sSlave {
    pub bank: BankId,
    pub irq: u32,
    pub direction: I2sDirection,
}

impl I2sSlave {
    pub fn new(
        registry: &mut CsrRegistry,
        name: &str,
        direction: I2sDirection,
        origin: u64,
    ) -> CsrResult<Self> {
        let dir = direction.prefix();
        let mut csrs = EventManager::new(&["ready", "error"]).csrs();
        csrs.extend([
            Csr::storage(format!("{dir}_ctl"), 2)
                .with_field(CsrField::new("enable", 0, 1))
                .with_field(CsrField::new("reset", 1, 1)),
            Csr::status(format!("{dir}_stat"), 32)
                .with_field(CsrField::new("overflow", 0, 1))
                .with_field(CsrField::new("underflow", 1, 1))
                .with_field(CsrField::new("dataready", 2, 1))
                .with_field(CsrField::new("empty", 3, 1))
                .with_field(CsrField::new("wrcount", 4, 9))
                .with_field(CsrField::new("rdcount", 13, 9)),
            Csr::status(format!("{dir}_conf"), 32)
                .with_field(CsrField::new("format", 0, 2))
                .with_field(CsrField::new("sample_width", 2, 6))
                .with_field(CsrField::new("lrck_freq", 8, 24)),
        ]);
        let bank = registry.add_bank(name, csrs)?;
        let irq = registry.add_interrupt(name, name)?;
        registry.add_memory_region(MemoryRegion::new(
            name,
            origin,
            I2S_FIFO_WINDOW,
            RegionKind::Io,
        ))?;
        Ok(Self {
            bank,
            irq,
            direction,
        })
    }
}
