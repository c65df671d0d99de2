//! The MSF superblock: the fixed-layout header at offset 0 of every MSF file.

use crate::ErrorCode;
use static_assertions::const_assert_eq;
use std::mem::size_of;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, LE, U32};

/// The magic identifier that begins every "Big MSF" file. This is 30 bytes; the superblock pads
/// it to 32 bytes with two bytes that are conventionally zero.
pub const MAGIC: [u8; 30] = *b"Microsoft C/C++ MSF 7.00\r\n\x1a\x44\x53";

/// The fixed-layout header at file offset 0.
///
/// Following this header (not represented as a Rust field, since its length depends on
/// `directory_size` and `block_size`) is a trailing array of `u32` block indices: the blocks
/// that, concatenated, hold the array of block indices for the stream directory. This is the
/// "directory of the directory" — two levels of indirection above the directory's own bytes.
#[derive(Clone, Copy, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[repr(C)]
pub struct SuperBlock {
    /// Must equal [`MAGIC`], followed by two bytes of padding (not modeled as a separate field;
    /// `file_magic` is 32 bytes wide and includes them).
    pub file_magic: [u8; 32],

    /// The size of each block, in bytes. Always a power of two; typically 512, 1024, 2048, or
    /// 4096.
    pub block_size: U32<LE>,

    /// The block index of the active free block map. Must be 1 or 2.
    pub free_block_map_index: U32<LE>,

    /// The number of blocks in the entire MSF file.
    pub block_count: U32<LE>,

    /// The size of the stream directory, in bytes.
    pub directory_size: U32<LE>,

    /// Unused.
    pub unused: U32<LE>,
    // Followed by a trailing array of `u32` block indices (length
    // `ceil(ceil(directory_size / block_size) * 4 / block_size)`), not represented here.
}

const_assert_eq!(size_of::<SuperBlock>(), 52);

impl SuperBlock {
    /// Validates the fixed portion of the superblock: the magic and the free block map index.
    ///
    /// This is `RawFile::validate` restricted to the superblock itself; [`crate::RawFile::open`]
    /// calls this before reconstructing the stream directory.
    pub fn validate(&self) -> Result<(), ErrorCode> {
        if self.file_magic[..MAGIC.len()] != MAGIC {
            return Err(ErrorCode::InvalidSuperBlock);
        }

        match self.free_block_map_index.get() {
            1 | 2 => Ok(()),
            _ => Err(ErrorCode::InvalidFreeBlockMap),
        }
    }

    /// The block size, as a plain `u32`.
    pub fn block_size(&self) -> u32 {
        self.block_size.get()
    }

    /// `log2(block_size)`. Panics if `block_size` is not a power of two; callers should only
    /// call this after [`Self::validate`] and an explicit power-of-two check have succeeded.
    pub fn block_size_log2(&self) -> u32 {
        self.block_size().trailing_zeros()
    }
}
