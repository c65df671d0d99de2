//! Global Symbol Stream
//!
//! The Global Symbol Stream (GSS) contains the encoded symbol records for every global and
//! public symbol in the executable. It has no header; it is simply a packed sequence of
//! CodeView symbol records, exactly like a per-module symbol stream but without the leading
//! signature field.
//!
//! The GSS is not indexed by itself. The [`super::gsi::GlobalSymbolIndex`] and
//! [`super::psi::PublicSymbolIndex`] streams provide the name (and, for public symbols, address)
//! lookup tables that point into the GSS.

use crate::syms::{Parse, Pub, Sym, SymIter, SymKind};
use anyhow::bail;

/// Contains the raw contents of the Global Symbol Stream.
pub struct GlobalSymbolStream {
    /// The contents of the stream.
    pub stream_data: Vec<u8>,
}

impl GlobalSymbolStream {
    /// Wraps the contents of the Global Symbol Stream.
    pub fn new(stream_data: Vec<u8>) -> Self {
        Self { stream_data }
    }

    /// Constructs an empty instance of the GSS.
    pub fn empty() -> Self {
        Self { stream_data: vec![] }
    }

    /// Decodes the symbol record at a given byte offset.
    pub fn get_sym_at(&self, record_offset: u32) -> anyhow::Result<Sym<'_>> {
        let Some(record_bytes) = self.stream_data.get(record_offset as usize..) else {
            bail!("Invalid record offset into GSS: {record_offset}. Out of range for the GSS.");
        };

        let mut sym_iter = SymIter::new(record_bytes);
        let Some(sym) = sym_iter.next() else {
            bail!(
                "Invalid record offset into GSS: {record_offset}. \
                 Failed to decode symbol data at that offset."
            );
        };

        Ok(sym)
    }

    /// Decodes the `S_PUB32` symbol record at a given byte offset.
    pub fn get_pub32_at(&self, record_offset: u32) -> anyhow::Result<Pub<'_>> {
        let sym = self.get_sym_at(record_offset)?;
        if sym.kind != SymKind::S_PUB32 {
            bail!(
                "Invalid record offset into GSS: {record_offset}. \
                 Found a symbol with the wrong type. Expected S_PUB32, found {:?}",
                sym.kind
            );
        }

        let Ok(pub_sym) = Pub::parse(sym.data) else {
            bail!("Invalid record offset into GSS: {record_offset}. Failed to decode S_PUB32 record.");
        };

        Ok(pub_sym)
    }

    /// Iterates over every symbol record stored in the GSS, in stream order.
    pub fn iter_syms(&self) -> SymIter<'_> {
        SymIter::new(&self.stream_data)
    }
}
