//! A narrow stand-in for the `/names` stream's string-index type.
//!
//! Some type records (e.g. `LF_UDT_MOD_SRC_LINE`) carry a [`NameIndex`]: a byte offset into the
//! `/names` stream's string table. Resolving that offset to a string requires parsing the
//! `/names` stream itself, which is not part of this crate's scope (it is a source-file-name
//! interning side-table, not one of the typed overlays named by the core design). Callers that
//! need the string can locate the `/names` stream via [`crate::Pdb::named_stream`] and decode it
//! themselves; this crate only decodes the on-disk field far enough to expose the raw index.

use zerocopy::{Immutable, FromBytes, IntoBytes, KnownLayout, Unaligned, LE, U32};

/// A byte offset into the `/names` stream's string data, as stored in a type or symbol record.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Ord, PartialOrd)]
pub struct NameIndex(pub u32);

/// On-disk (little-endian) form of [`NameIndex`].
#[derive(Copy, Clone, Eq, PartialEq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned, Debug)]
#[repr(transparent)]
pub struct NameIndexLe(pub U32<LE>);

impl NameIndexLe {
    /// Converts to the in-memory representation.
    pub fn get(&self) -> NameIndex {
        NameIndex(self.0.get())
    }
}
