//! A memtrack service: reports per-process dedicated video memory committed
//! on the GCNano GPU by parsing the kernel-exposed `vidmem` usage report.

#![warn(rust_2018_idioms)]
#[allow(unused_imports)]
#[cfg(feature = "log")]
#[macro_use]
extern crate log;

pub mod utils {
    pub mod error;
    pub mod logging;
}
pub mod collection;
pub mod options;
pub mod service;

pub use utils::error::Result;
