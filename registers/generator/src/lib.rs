// Licensed under the Apache-2.0 license

mod allocator;
mod bus;
mod codegen;
mod description;
mod error;
mod export;
mod irq;
mod registry;
mod schema;

pub use allocator::*;
pub use bus::*;
pub use codegen::*;
pub use description::*;
pub use error::*;
pub use export::*;
pub use irq::*;
pub use registry::*;
pub use schema::*;
