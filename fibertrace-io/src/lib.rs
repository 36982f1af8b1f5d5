//! fibertrace-io: Memory-mapped container I/O.
//!
//! Opens LIF containers via memmap2, exposes series enumeration and
//! per-plane decoding to `f32` intensity planes, and writes extracted
//! fiber records as CSV or JSON.
//!

mod error;
pub mod reader;
pub mod writer;

pub use error::{Error, Result};
pub use reader::{LifFileReader, MappedFileReader, SeriesReader};
pub use writer::FiberFileWriter;
