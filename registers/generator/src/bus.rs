/*++

Licensed under the Apache-2.0 license.

File Name:

    bus.rs

Abstract:

    Behavioral model of the decode logic generated for a CSR map.

--*/

use crate::allocator::AddressMap;
use crate::error::{CsrError, CsrResult};
use crate::registry::FinalizedSoc;
use crate::schema::{low_mask, CsrAccess, WordSlice};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BusError {
    /// Load address misaligned exception
    LoadAddrMisaligned,

    /// Load access fault exception
    LoadAccessFault,

    /// Store address misaligned exception
    StoreAddrMisaligned,

    /// Store access fault exception
    StoreAccessFault,
}

/// Word-granular access to a CSR region.
pub trait CsrBus {
    /// Read one bus word from `addr`.
    ///
    /// # Error
    ///
    /// * `BusError` - `LoadAccessFault` or `LoadAddrMisaligned`
    fn read(&mut self, addr: u64) -> Result<u64, BusError>;

    /// Write one bus word to `addr`.
    ///
    /// # Error
    ///
    /// * `BusError` - `StoreAccessFault` or `StoreAddrMisaligned`
    fn write(&mut self, addr: u64, val: u64) -> Result<(), BusError>;

    fn warm_reset(&mut self) {
        // By default, do nothing
    }
}

#[derive(Clone, Debug)]
struct RegisterState {
    name: String,
    access: CsrAccess,
    reset: u64,
    value: u64,
    words: Vec<WordSlice>,
}

/// Register storage behind every bank of a finalized SoC.
///
/// Storage registers hold what software last wrote (starting from their reset
/// value). Status registers only change through [`CsrBankArray::set_status`];
/// bus writes to them are dropped.
pub struct CsrBankArray {
    map: AddressMap,
    slot_size: u64,
    data_mask: u64,
    banks: Vec<Vec<RegisterState>>,
}

impl CsrBankArray {
    pub fn new(soc: &FinalizedSoc) -> Self {
        let banks = soc
            .bank_layouts()
            .map(|(bank, layout)| {
                bank.csrs
                    .iter()
                    .zip(layout.csrs.iter())
                    .map(|(csr, csr_layout)| RegisterState {
                        name: csr.name.clone(),
                        access: csr.access,
                        reset: csr.reset,
                        value: csr.reset,
                        words: csr_layout.words.clone(),
                    })
                    .collect()
            })
            .collect();
        Self {
            map: soc.address_map().clone(),
            slot_size: soc.bus().slot_size,
            data_mask: low_mask(soc.bus().data_width),
            banks,
        }
    }

    fn register_mut(&mut self, bank: &str, register: &str) -> CsrResult<&mut RegisterState> {
        let idx = self
            .map
            .banks()
            .iter()
            .position(|b| b.name == bank)
            .ok_or_else(|| CsrError::UnknownBank(bank.into()))?;
        self.banks[idx]
            .iter_mut()
            .find(|r| r.name == register)
            .ok_or_else(|| CsrError::UnknownRegister {
                bank: bank.into(),
                register: register.into(),
            })
    }

    /// Drive a status register from the hardware side.
    pub fn set_status(&mut self, bank: &str, register: &str, value: u64) -> CsrResult<()> {
        let reg = self.register_mut(bank, register)?;
        if reg.access != CsrAccess::Status {
            return Err(CsrError::NotStatus {
                bank: bank.into(),
                register: register.into(),
            });
        }
        reg.value = value & low_mask(reg.words.iter().map(|w| w.bits).sum());
        Ok(())
    }

    /// Current value of a register as seen by the hardware.
    pub fn value(&self, bank: &str, register: &str) -> Option<u64> {
        let idx = self.map.banks().iter().position(|b| b.name == bank)?;
        self.banks[idx]
            .iter()
            .find(|r| r.name == register)
            .map(|r| r.value)
    }

    /// Locate the register word decoded at `addr`.
    fn decode(&mut self, addr: u64) -> Option<(&mut RegisterState, WordSlice)> {
        let bank = self.map.bank_index_at(addr)?;
        self.banks[bank].iter_mut().find_map(|reg| {
            let slice = reg.words.iter().find(|w| w.address == addr).copied()?;
            Some((reg, slice))
        })
    }

    fn misaligned(&self, addr: u64) -> bool {
        addr.wrapping_sub(self.map.base()) % self.slot_size != 0
    }
}

impl CsrBus for CsrBankArray {
    fn read(&mut self, addr: u64) -> Result<u64, BusError> {
        if self.misaligned(addr) {
            return Err(BusError::LoadAddrMisaligned);
        }
        let (reg, slice) = self.decode(addr).ok_or(BusError::LoadAccessFault)?;
        Ok((reg.value >> slice.shift) & slice.mask())
    }

    fn write(&mut self, addr: u64, val: u64) -> Result<(), BusError> {
        if self.misaligned(addr) {
            return Err(BusError::StoreAddrMisaligned);
        }
        let data_mask = self.data_mask;
        let (reg, slice) = self.decode(addr).ok_or(BusError::StoreAccessFault)?;
        if !reg.access.can_write() {
            log::debug!("dropping write of {val:#x} to status register {}", reg.name);
            return Ok(());
        }
        let mask = slice.mask() << slice.shift;
        reg.value = (reg.value & !mask) | (((val & data_mask & slice.mask()) << slice.shift) & mask);
        Ok(())
    }

    fn warm_reset(&mut self) {
        for reg in self.banks.iter_mut().flatten() {
            if reg.access == CsrAccess::Storage {
                reg.value = reg.reset;
            }
        }
    }
}
