//! Definitions for Portable Executable (PE) COFF binaries (Windows binaries)

#![allow(non_camel_case_types)]
#![forbid(unsafe_code)]

mod dll_characteristics;
mod image;
mod machine;
mod reloc;
mod section;

pub use dll_characteristics::*;
pub use image::*;
pub use machine::*;
pub use reloc::*;
pub use section::*;
