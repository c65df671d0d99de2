//! Random-access reads over a stream without materializing it.

use zerocopy::byteorder::{LE, U32};
use zerocopy::{FromZeros, IntoBytes};

/// A view over a single MSF stream that answers reads by translating logical stream offsets to
/// physical offsets within the backing byte region, one block at a time.
///
/// `DirectStream` owns no bytes of its own. It stores a borrowed slice of the backing region, a
/// borrowed slice of block indices (normally pointing into the stream directory buffer owned by
/// the [`crate::RawFile`] that created it), the block size, and the stream's size in bytes.
#[derive(Clone, Copy)]
pub struct DirectStream<'a> {
    base: &'a [u8],
    block_indices: &'a [U32<LE>],
    block_size: u32,
    block_size_log2: u32,
    size: u32,
}

impl<'a> DirectStream<'a> {
    /// Constructs a `DirectStream` from the backing region, a block-index array, a block size,
    /// and the stream's size in bytes.
    ///
    /// `block_size` must be a power of two; this is guaranteed by `RawFile`, which validates the
    /// superblock before ever constructing a `DirectStream`.
    pub(crate) fn new(
        base: &'a [u8],
        block_indices: &'a [U32<LE>],
        block_size: u32,
        size: u32,
    ) -> Self {
        debug_assert!(block_size.is_power_of_two());
        debug_assert_eq!(block_indices.len() as u64, crate::div_round_up(size, block_size) as u64);
        Self {
            base,
            block_indices,
            block_size,
            block_size_log2: block_size.trailing_zeros(),
            size,
        }
    }

    /// The size of this stream, in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The block size used by the containing MSF file.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// The block indices that make up this stream, in order.
    pub fn block_indices(&self) -> &'a [U32<LE>] {
        self.block_indices
    }

    /// The index, within [`Self::block_indices`], of the block that contains stream offset
    /// `offset`.
    pub fn block_indices_for_offset(&self, offset: u32) -> usize {
        (offset >> self.block_size_log2) as usize
    }

    /// The byte offset, within a block, that corresponds to stream offset `offset`.
    pub fn data_offset_for_offset(&self, offset: u32) -> u32 {
        offset & (self.block_size - 1)
    }

    /// Reads `dst.len()` bytes starting at stream offset `offset`.
    ///
    /// Precondition: `offset + dst.len() <= self.size()`. Returns `None` if this precondition is
    /// violated, or if a block index is corrupt (points past the end of the backing region).
    pub fn read_at(&self, dst: &mut [u8], offset: u32) -> Option<()> {
        let size = dst.len() as u32;
        if offset.checked_add(size)? > self.size {
            return None;
        }

        let mut block_index = self.block_indices_for_offset(offset);
        let mut offset_in_block = self.data_offset_for_offset(offset) as usize;
        let mut written = 0usize;

        while written < dst.len() {
            let phys_block = *self.block_indices.get(block_index)?;
            let phys_block = phys_block.get();
            let block_start = (phys_block as u64) << self.block_size_log2;
            let block_start = usize::try_from(block_start).ok()?;

            let avail_in_block = self.block_size as usize - offset_in_block;
            let remaining = dst.len() - written;
            let take = avail_in_block.min(remaining);

            let src = self
                .base
                .get(block_start + offset_in_block..block_start + offset_in_block + take)?;
            dst[written..written + take].copy_from_slice(src);

            written += take;
            block_index += 1;
            offset_in_block = 0;
        }

        Some(())
    }

    /// Borrows `len` bytes directly out of the backing region starting at physical byte offset
    /// `start`. Used by [`crate::CoalescedStream`]'s fast path once it has determined that a
    /// byte range is physically contiguous; not a general-purpose accessor.
    pub(crate) fn borrow_region(&self, start: usize, len: usize) -> Option<&'a [u8]> {
        self.base.get(start..start + len)
    }

    /// Reads a fixed-size, plain-old-data value at stream offset `offset`.
    ///
    /// Returns `None` if the read would exceed the stream's bounds.
    pub fn read<T>(&self, offset: u32) -> Option<T>
    where
        T: FromZeros + IntoBytes,
    {
        let mut value = T::new_zeroed();
        self.read_at(value.as_mut_bytes(), offset)?;
        Some(value)
    }
}
