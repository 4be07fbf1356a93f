// Licensed under the Apache-2.0 license

use crate::error::{CsrError, CsrResult};
use crate::schema::validate_name;
use serde::Serialize;
use std::fmt::Write;

/// Width of the CPU interrupt-pending vector.
pub const MAX_INTERRUPTS: u32 = 32;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct InterruptSource {
    pub name: String,
    pub peripheral: String,
    pub bit: u32,
}

/// Interrupt bit assignment, in registration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InterruptMap {
    sources: Vec<InterruptSource>,
}

impl InterruptMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `name` the next free bit.
    pub(crate) fn assign(&mut self, name: &str, peripheral: &str) -> CsrResult<u32> {
        validate_name(name)?;
        validate_name(peripheral)?;
        if self.bit_of(name).is_some() {
            return Err(CsrError::DuplicateInterrupt(name.into()));
        }
        let bit = self.sources.len() as u32;
        if bit >= MAX_INTERRUPTS {
            return Err(CsrError::InterruptVectorFull {
                name: name.into(),
                max: MAX_INTERRUPTS,
            });
        }
        self.sources.push(InterruptSource {
            name: name.into(),
            peripheral: peripheral.into(),
            bit,
        });
        Ok(bit)
    }

    pub fn sources(&self) -> &[InterruptSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn bit_of(&self, name: &str) -> Option<u32> {
        self.sources.iter().find(|s| s.name == name).map(|s| s.bit)
    }

    /// Check that the assigned bits are exactly `0..len`.
    pub fn verify_dense(&self) -> CsrResult<()> {
        for (i, source) in self.sources.iter().enumerate() {
            if source.bit != i as u32 {
                return Err(CsrError::InterruptMapNotDense(format!(
                    "{} has bit {} but is source #{i}",
                    source.name, source.bit
                )));
            }
        }
        Ok(())
    }

    /// Sources whose bit is set in an interrupt-pending vector.
    pub fn pending(&self, vector: u64) -> impl Iterator<Item = &InterruptSource> + '_ {
        self.sources
            .iter()
            .filter(move |s| vector & (1u64 << s.bit) != 0)
    }
}

/// Emit one `<NAME>_INTERRUPT` define per source.
pub fn generate_interrupt_defines(map: &InterruptMap) -> CsrResult<String> {
    map.verify_dense()?;
    let mut out = String::new();
    if map.is_empty() {
        return Ok(out);
    }
    out += "\n/* interrupts */\n";
    for source in map.sources() {
        let _ = writeln!(
            out,
            "#define {}_INTERRUPT {}",
            source.name.to_uppercase(),
            source.bit
        );
    }
    Ok(out)
}
