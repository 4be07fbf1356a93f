// Licensed under the Apache-2.0 license

//! CSR layout of the Digilent Arty A7 SoC: CPU infrastructure, DDR3, and the
//! optional Ethernet/I2S/LED build.

mod config;
pub mod cores;
pub mod ethernet;
mod events;
pub mod gpio;
pub mod i2s;
mod soc;

pub use config::*;
pub use events::EventManager;
pub use soc::*;
