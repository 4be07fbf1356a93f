// Licensed under the Apache-2.0 license

use csr_generator::{Csr, CsrField};

/// Interrupt status/pending/enable triple shared by every interrupt-capable core.
///
/// Bit `i` of each register belongs to `sources[i]`.
#[derive(Clone, Debug)]
pub struct EventManager {
    sources: Vec<&'static str>,
}

impl EventManager {
    pub fn new(sources: &[&'static str]) -> Self {
        Self {
            sources: sources.to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.sources.len() as u32
    }

    fn register(&self, name: &str, csr: Csr) -> Csr {
        self.sources
            .iter()
            .enumerate()
            .fold(csr, |csr, (i, source)| {
                csr.with_field(CsrField::new(*source, i as u32, 1))
            })
            .with_description(format!("event {name}"))
    }

    /// `ev_status`, `ev_pending`, `ev_enable`, in that order.
    pub fn csrs(&self) -> Vec<Csr> {
        let width = self.width();
        vec![
            self.register("status", Csr::status("ev_status", width)),
            // write one to clear
            self.register("pending", Csr::storage("ev_pending", width)),
            self.register("enable", Csr::storage("ev_enable", width)),
        ]
    }

    /// Same registers with a prefix, for cores that carry more than one manager.
    pub fn prefixed_csrs(&self, prefix: &str) -> Vec<Csr> {
        self.csrs()
            .into_iter()
            .map(|mut csr| {
                csr.name = format!("{prefix}_{}", csr.name);
                csr
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csr_generator::CsrAccess;

    #[test]
    fn test_event_registers() {
        let ev = EventManager::new(&["tx", "rx"]);
        let csrs = ev.csrs();
        assert_eq!(csrs.len(), 3);
        assert_eq!(csrs[0].name, "ev_status");
        assert_eq!(csrs[0].access, CsrAccess::Status);
        assert_eq!(csrs[1].access, CsrAccess::Storage);
        assert_eq!(csrs[2].width, 2);
        assert_eq!(csrs[2].fields[1].name, "rx");
        assert_eq!(csrs[2].fields[1].offset, 1);

        let prefixed = ev.prefixed_csrs("sram_writer");
        assert_eq!(prefixed[1].name, "sram_writer_ev_pending");
    }
}
