//! Symbol records shared between the Global Symbol Stream and the per-module symbol streams.
//!
//! The on-disk record schema (header layout, 4-byte alignment, per-kind payloads) lives in
//! [`ms_codeview::syms`]; this module re-exports that schema as `crate::syms` and adds the
//! bits that are specific to how `ms-pdb` walks and validates symbol streams.

pub mod check;

use crate::utils::iter::HasRestLen;

#[doc(inline)]
pub use ms_codeview::parser::{Parse, Parser, ParserError};
#[doc(inline)]
pub use ms_codeview::syms::*;

impl<'a> HasRestLen for SymIter<'a> {
    fn rest_len(&self) -> usize {
        self.rest().len()
    }
}

/// Extra predicates on [`SymKind`] that `ms-pdb` needs but that `ms_codeview::syms::SymKind`
/// cannot implement directly, since both the type and the trait would have to live in the
/// same crate to add an inherent `impl`.
pub trait SymKindExt {
    /// True if this `SymKind` starts a "block" (a nested symbol scope). All symbols that start
    /// a block begin with [`BlockHeader`].
    fn starts_block(self) -> bool;

    /// Indicates whether this `SymKind` ends a scope.
    ///
    /// There are no `SymKind` values that both start and end a scope. In all well-formed symbol
    /// streams, every symbol that starts a scope has a matching symbol that ends that scope.
    fn ends_scope(self) -> bool;

    /// Returns `true` if this symbol can be the _target_ of a "reference to symbol" in the
    /// Global Symbol Stream.
    fn is_refsym_target(self) -> bool;

    /// Returns `true` if this symbol can be the _source_ of a "reference to symbol" in the
    /// Global Symbol Stream.
    fn is_refsym_source(self) -> bool;
}

impl SymKindExt for SymKind {
    fn starts_block(self) -> bool {
        matches!(
            self,
            SymKind::S_GPROC32
                | SymKind::S_LPROC32
                | SymKind::S_BLOCK32
                | SymKind::S_THUNK32
                | SymKind::S_INLINESITE
                | SymKind::S_INLINESITE2
                | SymKind::S_GMANPROC
                | SymKind::S_LMANPROC
        )
    }

    fn ends_scope(self) -> bool {
        matches!(
            self,
            SymKind::S_END | SymKind::S_PROC_ID_END | SymKind::S_INLINESITE_END
        )
    }

    fn is_refsym_target(self) -> bool {
        matches!(
            self,
            SymKind::S_GPROC32
                | SymKind::S_LPROC32
                | SymKind::S_GMANPROC
                | SymKind::S_LMANPROC
                | SymKind::S_GDATA32
                | SymKind::S_LDATA32
                | SymKind::S_ANNOTATION
        )
    }

    fn is_refsym_source(self) -> bool {
        matches!(
            self,
            SymKind::S_LPROCREF
                | SymKind::S_PROCREF
                | SymKind::S_ANNOTATIONREF
                | SymKind::S_DATAREF
        )
    }
}

/// Identifies which kind of symbol stream is being walked, for diagnostics that need to report
/// an absolute byte offset.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SymbolStreamKind {
    /// A per-module symbol stream. Records are preceded by a 4-byte CodeView signature
    /// (see [`crate::modi`]), so record offsets are relative to stream offset 4.
    Module,
    /// The Global Symbol Stream. Records begin at stream offset 0; there is no header.
    Globals,
}

impl SymbolStreamKind {
    /// The byte offset, within the stream, of the first symbol record.
    pub fn stream_offset(self) -> usize {
        match self {
            SymbolStreamKind::Module => 4,
            SymbolStreamKind::Globals => 0,
        }
    }
}
