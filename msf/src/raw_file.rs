//! Decodes the MSF superblock, reconstructs the stream directory, and manufactures
//! [`DirectStream`] / [`CoalescedStream`] views by stream index.

use crate::coalesced_stream::CoalescedStream;
use crate::direct_stream::DirectStream;
use crate::superblock::SuperBlock;
use crate::{div_round_up, ErrorCode};
use std::mem::size_of;
use tracing::{trace, trace_span};
use zerocopy::byteorder::{LE, U32};
use zerocopy::FromBytes;

/// The MSF container: a decoded superblock plus the reconstructed stream directory, together
/// with the byte region they were read from.
///
/// `RawFile` borrows `base` for its entire lifetime `'a`; it is the caller's responsibility (the
/// core consumes exactly one external capability: an immutable byte-addressable region) to keep
/// the backing region alive at least as long as any `RawFile`, `DirectStream`, or
/// `CoalescedStream` derived from it.
pub struct RawFile<'a> {
    base: &'a [u8],
    super_block: SuperBlock,
    /// The coalesced stream directory. Either a borrow into `base` (when the directory's own
    /// blocks are contiguous) or a private buffer copied out of scattered blocks.
    directory: CoalescedStream<'a>,
    /// The size, in bytes, of each stream, copied out of the directory for O(1) access.
    stream_sizes: Vec<u32>,
    /// For each stream, the byte offset (within `directory`) of the start of its block-index
    /// array, and the number of block indices. The pointers these ranges describe point *into
    /// the directory buffer this `RawFile` owns*, not into copies.
    stream_block_ranges: Vec<(u32, u32)>,
}

impl<'a> RawFile<'a> {
    /// Validates the fixed portion of the superblock: the magic value and the free block map
    /// index. Must be called (and must succeed) before [`Self::open`].
    pub fn validate(base: &[u8], length: usize) -> Result<(), ErrorCode> {
        let base = &base[..length.min(base.len())];
        let Some(sb) = SuperBlock::ref_from_prefix(base).ok().map(|(sb, _)| sb) else {
            return Err(ErrorCode::InvalidSuperBlock);
        };
        sb.validate()
    }

    /// Builds a `RawFile` by decoding the superblock and reconstructing the stream directory.
    ///
    /// This performs exactly two coalescing passes, per the core's design: first the
    /// indices-of-directory-blocks array (a flat array of block indices stored immediately
    /// following the superblock, per the MSF file format), then the directory itself (whose
    /// blocks may or may not be contiguous).
    pub fn open(base: &'a [u8], length: usize) -> Result<Self, ErrorCode> {
        let _span = trace_span!("RawFile::open").entered();

        let base = base.get(..length).ok_or(ErrorCode::InvalidSuperBlock)?;

        let Ok((super_block, _)) = SuperBlock::ref_from_prefix(base) else {
            return Err(ErrorCode::InvalidSuperBlock);
        };
        super_block.validate()?;
        let super_block = *super_block;

        let block_size = super_block.block_size();
        if !block_size.is_power_of_two() || block_size == 0 {
            return Err(ErrorCode::InvalidSuperBlock);
        }

        let directory_size = super_block.directory_size.get();
        let directory_block_count = div_round_up(directory_size, block_size);

        // Pass 1: the indices-of-directory-blocks array. Per the MSF file format, this is a flat
        // array of `u32` block indices stored as raw bytes immediately following the superblock
        // header -- it is not itself addressed through any further indirection.
        let header_len = size_of::<SuperBlock>();
        let map_len_bytes = directory_block_count as usize * size_of::<u32>();
        let Some(map_bytes) = base.get(header_len..header_len + map_len_bytes) else {
            return Err(ErrorCode::InvalidSuperBlock);
        };
        let Ok(directory_block_indices) = <[U32<LE>]>::ref_from_bytes(map_bytes) else {
            return Err(ErrorCode::InvalidSuperBlock);
        };

        trace!(
            directory_size,
            directory_block_count,
            block_size,
            "reconstructing stream directory"
        );

        // Pass 2: coalesce the directory itself, using the block indices found in pass 1. The
        // directory's blocks are frequently non-contiguous, even when most individual streams'
        // blocks are contiguous.
        let directory =
            CoalescedStream::from_region(base, directory_block_indices, block_size, directory_size);

        let (stream_sizes, stream_block_ranges) = read_directory_contents(&directory, block_size)?;

        Ok(Self {
            base,
            super_block,
            directory,
            stream_sizes,
            stream_block_ranges,
        })
    }

    /// The decoded superblock.
    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    /// The block size used by this MSF file.
    pub fn block_size(&self) -> u32 {
        self.super_block.block_size()
    }

    /// The number of streams in this file's directory.
    pub fn stream_count(&self) -> u32 {
        self.stream_sizes.len() as u32
    }

    /// The size, in bytes, of stream `index`. Returns `None` if `index` is out of range.
    pub fn stream_size(&self, index: u32) -> Option<u32> {
        self.stream_sizes.get(index as usize).copied()
    }

    /// Indicates whether stream `index` is present (in range). Does not distinguish a present,
    /// zero-length stream from an absent one; callers that need that distinction should compare
    /// against [`crate::NIL_STREAM_INDEX`] at the call site where the stream index was obtained
    /// (e.g. a `u16` field in a typed sub-stream header).
    pub fn has_stream(&self, index: u32) -> bool {
        (index as usize) < self.stream_sizes.len()
    }

    fn block_indices_for_stream(&self, index: u32) -> Option<&'a [U32<LE>]> {
        let &(offset, count) = self.stream_block_ranges.get(index as usize)?;
        let bytes = self
            .directory
            .bytes_at(offset)?
            .get(..count as usize * size_of::<u32>())?;
        <[U32<LE>]>::ref_from_bytes(bytes).ok()
    }

    /// Manufactures a [`DirectStream`] for stream `index`.
    ///
    /// An out-of-range `index` is a caller error: in debug builds this asserts; in release
    /// builds it returns an empty stream, matching the core's documented failure behavior for
    /// this operation.
    pub fn create_direct_stream(&self, index: u32) -> DirectStream<'a> {
        debug_assert!(self.has_stream(index), "stream index {index} out of range");
        let size = self.stream_size(index).unwrap_or(0);
        let indices = self.block_indices_for_stream(index).unwrap_or(&[]);
        DirectStream::new(self.base, indices, self.block_size(), size)
    }

    /// Manufactures a [`CoalescedStream`] for stream `index`.
    ///
    /// If `limited_size` is `Some(n)`, the resulting view is truncated to the first `n` bytes of
    /// the stream (used by module symbol streams, where only the leading symbol substream is of
    /// interest and the rest of the module stream -- lines, global refs -- need not be
    /// materialized).
    ///
    /// An out-of-range `index` behaves as documented for [`Self::create_direct_stream`].
    pub fn create_coalesced_stream(
        &self,
        index: u32,
        limited_size: Option<u32>,
    ) -> CoalescedStream<'a> {
        debug_assert!(self.has_stream(index), "stream index {index} out of range");
        let full_size = self.stream_size(index).unwrap_or(0);
        let size = limited_size.map_or(full_size, |n| n.min(full_size));
        let indices = self.block_indices_for_stream(index).unwrap_or(&[]);

        let block_size = self.block_size();
        let block_count = div_round_up(size, block_size) as usize;
        let truncated_indices = &indices[..block_count.min(indices.len())];
        CoalescedStream::from_region(self.base, truncated_indices, block_size, size)
    }
}

/// Parses the already-coalesced directory buffer: `streamCount`, the array of stream sizes, and
/// then, flattened in order, each stream's block indices.
fn read_directory_contents(
    directory: &CoalescedStream<'_>,
    block_size: u32,
) -> Result<(Vec<u32>, Vec<(u32, u32)>), ErrorCode> {
    let stream_count: U32<LE> = directory.data_at(0).copied().ok_or(ErrorCode::OutOfBounds)?;
    let stream_count = stream_count.get() as usize;

    let sizes_offset = size_of::<u32>() as u32;
    let sizes_bytes_len = stream_count * size_of::<u32>();
    let sizes_bytes = directory
        .bytes_at(sizes_offset)
        .and_then(|b| b.get(..sizes_bytes_len))
        .ok_or(ErrorCode::OutOfBounds)?;
    let sizes: &[U32<LE>] = <[U32<LE>]>::ref_from_bytes(sizes_bytes)
        .map_err(|_| ErrorCode::OutOfBounds)?;

    let mut stream_sizes = Vec::with_capacity(stream_count);
    let mut stream_block_ranges = Vec::with_capacity(stream_count);

    let mut cursor = sizes_offset + sizes_bytes_len as u32;
    for &size in sizes {
        let size = size.get();
        // A stream size of 0xffff_ffff marks a "nil" stream: present in the directory but with
        // no blocks allocated.
        let block_count = if size == 0xffff_ffff {
            0
        } else {
            div_round_up(size, block_size)
        };
        stream_sizes.push(size);
        stream_block_ranges.push((cursor, block_count));
        cursor += block_count * size_of::<u32>() as u32;
    }

    Ok((stream_sizes, stream_block_ranges))
}
