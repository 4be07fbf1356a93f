// Licensed under the Apache-2.0 license

//! SoC infrastructure cores every Arty build carries.

use crate::events::EventManager;
use csr_generator::{BankId, Csr, CsrField, CsrRegistry, CsrResult};

/// Value the scratch register holds out of reset; the BIOS checks it.
pub const SCRATCH_RESET: u64 = 0x1234_5678;

#[derive(Clone, Copy, Debug)]
pub struct Ctrl {
    pub bank: BankId,
}

impl Ctrl {
    pub fn new(registry: &mut CsrRegistry) -> CsrResult<Self> {
        let bank = registry.add_bank(
            "ctrl",
            vec![
                Csr::storage("reset", 1).with_description("write 1 for a soft reset"),
                Csr::storage("scratch", 32).with_reset(SCRATCH_RESET),
                Csr::status("bus_errors", 32),
            ],
        )?;
        Ok(Self { bank })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Uart {
    pub bank: BankId,
    pub irq: u32,
}

impl Uart {
    pub fn new(registry: &mut CsrRegistry, name: &str) -> CsrResult<Self> {
        let mut csrs = vec![
            Csr::storage("rxtx", 8),
            Csr::status("txfull", 1),
            Csr::status("rxempty", 1),
        ];
        csrs.extend(EventManager::new(&["tx", "rx"]).csrs());
        let bank = registry.add_bank(name, csrs)?;
        let irq = registry.add_interrupt(name, name)?;
        Ok(Self { bank, irq })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Timer {
    pub bank: BankId,
    pub irq: u32,
}

impl Timer {
    pub fn new(registry: &mut CsrRegistry, name: &str, width: u32) -> CsrResult<Self> {
        let mut csrs = vec![
            Csr::storage("load", width),
            Csr::storage("reload", width),
            Csr::storage("en", 1),
            Csr::storage("update_value", 1)
                .with_description("latch the counter into value"),
            Csr::status("value", width),
        ];
        csrs.extend(EventManager::new(&["zero"]).csrs());
        let bank = registry.add_bank(name, csrs)?;
        let irq = registry.add_interrupt(name, name)?;
        Ok(Self { bank, irq })
    }
}

/// DDR3 PHY read-leveling controls.
#[derive(Clone, Copy, Debug)]
pub struct DdrPhy {
    pub bank: BankId,
}

impl DdrPhy {
    pub fn new(registry: &mut CsrRegistry, databits: u32) -> CsrResult<Self> {
        let modules = databits / 8;
        let bank = registry.add_bank(
            "ddrphy",
            vec![
                Csr::storage("dly_sel", modules),
                Csr::storage("rdly_dq_rst", 1),
                Csr::storage("rdly_dq_inc", 1),
                Csr::storage("rdly_dq_bitslip_rst", 1),
                Csr::storage("rdly_dq_bitslip", 1),
            ],
        )?;
        Ok(Self { bank })
    }
}

/// SDRAM geometry the DFI injector is sized from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SdramGeometry {
    pub bankbits: u32,
    pub rowbits: u32,
    pub colbits: u32,
    pub databits: u32,
    pub nphases: u32,
}

impl SdramGeometry {
    /// MT41K128M16 behind a 1:4 A7 DDR PHY.
    pub const MT41K128M16: SdramGeometry = SdramGeometry {
        bankbits: 3,
        rowbits: 14,
        colbits: 10,
        databits: 16,
        nphases: 4,
    };

    /// Bytes addressable on the module.
    pub fn size(&self) -> u64 {
        (1u64 << (self.bankbits + self.rowbits + self.colbits)) * u64::from(self.databits / 8)
    }
}

/// DFI injector: lets software issue raw DRAM commands during init.
#[derive(Clone, Copy, Debug)]
pub struct SdramDfii {
    pub bank: BankId,
}

impl SdramDfii {
    pub fn new(registry: &mut CsrRegistry, geom: &SdramGeometry) -> CsrResult<Self> {
        let mut csrs = vec![Csr::storage("dfii_control", 4)
            .with_field(CsrField::new("sel", 0, 1))
            .with_field(CsrField::new("cke", 1, 1))
            .with_field(CsrField::new("odt", 2, 1))
            .with_field(CsrField::new("reset_n", 3, 1))];
        let phase_data = 2 * geom.databits;
        for phase in 0..geom.nphases {
            let pi = format!("dfii_pi{phase}");
            csrs.push(
                Csr::storage(format!("{pi}_command"), 6)
                    .with_field(CsrField::new("cs", 0, 1))
                    .with_field(CsrField::new("we", 1, 1))
                    .with_field(CsrField::new("cas", 2, 1))
                    .with_field(CsrField::new("ras", 3, 1))
                    .with_field(CsrField::new("wren", 4, 1))
                    .with_field(CsrField::new("rden", 5, 1)),
            );
            csrs.push(Csr::storage(format!("{pi}_command_issue"), 1));
            csrs.push(Csr::storage(format!("{pi}_address"), geom.rowbits));
            csrs.push(Csr::storage(format!("{pi}_baddress"), geom.bankbits));
            csrs.push(Csr::storage(format!("{pi}_wrdata"), phase_data));
            csrs.push(Csr::status(format!("{pi}_rddata"), phase_data));
        }
        let bank = registry.add_bank("sdram", csrs)?;
        Ok(Self { bank })
    }
}
