// Licensed under the Apache-2.0 license

use csr_generator::{BankId, Csr, CsrRegistry, CsrResult};

/// Input pins sampled into a status register.
#[derive(Clone, Copy, Debug)]
pub struct GpioIn {
    pub bank: BankId,
    pub width: u32,
}

impl GpioIn {
    pub fn new(registry: &mut CsrRegistry, name: &str, width: u32) -> CsrResult<Self> {
        let bank = registry.add_bank(name, vec![Csr::status("in", width)])?;
        Ok(Self { bank, width })
    }
}

/// Output pins driven from a storage register.
#[derive(Clone, Copy, Debug)]
pub struct GpioOut {
    pub bank: BankId,
    pub width: u32,
}

impl GpioOut {
    pub fn new(registry: &mut CsrRegistry, name: &str, width: u32) -> CsrResult<Self> {
        let bank = registry.add_bank(name, vec![Csr::storage("out", width)])?;
        Ok(Self { bank, width })
    }
}

/// An input port and an output port sharing one bank.
#[derive(Clone, Copy, Debug)]
pub struct GpioInOut {
    pub bank: BankId,
    pub in_width: u32,
    pub out_width: u32,
}

impl GpioInOut {
    pub fn new(
        registry: &mut CsrRegistry,
        name: &str,
        in_width: u32,
        out_width: u32,
    ) -> CsrResult<Self> {
        let bank = registry.add_bank(
            name,
            vec![Csr::status("in", in_width), Csr::storage("out", out_width)],
        )?;
        Ok(Self {
            bank,
            in_width,
            out_width,
        })
    }
}
