//! Contiguous logical views of a stream (or a slice of one).

use crate::direct_stream::DirectStream;
use std::mem::size_of;
use zerocopy::byteorder::{LE, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// A contiguous logical view of an MSF stream (or a byte range within one).
///
/// When the stream's underlying blocks are physically contiguous in the backing region, this is
/// a zero-copy borrow: no allocation occurs. Otherwise, a private buffer is allocated once, at
/// construction time, and the stream's bytes are copied into it block by block. Either way, the
/// resulting view behaves identically to callers: `size()` and `data_at` do not need to know
/// which path was taken.
pub struct CoalescedStream<'a> {
    data: Data<'a>,
    size: u32,
}

enum Data<'a> {
    Borrowed(&'a [u8]),
    Owned(Vec<u8>),
}

impl<'a> CoalescedStream<'a> {
    /// Builds a coalesced view of an entire stream, given the backing region and the stream's
    /// block-index array.
    ///
    /// `block_indices` must have exactly `ceil(size / block_size)` entries, each less than the
    /// number of blocks in the backing region; `RawFile` is responsible for upholding this.
    pub(crate) fn from_region(
        base: &'a [u8],
        block_indices: &[U32<LE>],
        block_size: u32,
        size: u32,
    ) -> Self {
        let block_size_log2 = block_size.trailing_zeros();

        if is_contiguous(block_indices) {
            if let Some(first) = block_indices.first() {
                let start = (first.get() as u64) << block_size_log2;
                if let Ok(start) = usize::try_from(start) {
                    if let Some(slice) = base.get(start..start + size as usize) {
                        return Self {
                            data: Data::Borrowed(slice),
                            size,
                        };
                    }
                }
            } else {
                // Zero-length stream: no blocks at all, trivially "contiguous".
                return Self {
                    data: Data::Borrowed(&[]),
                    size: 0,
                };
            }
        }

        // Slow path: copy every block (the last one may be partial) into an owned buffer.
        let mut buf = vec![0u8; size as usize];
        let mut remaining = size as usize;
        let mut dst_offset = 0usize;
        for &block in block_indices {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(block_size as usize);
            let start = (block.get() as u64) << block_size_log2;
            if let Ok(start) = usize::try_from(start) {
                if let Some(src) = base.get(start..start + take) {
                    buf[dst_offset..dst_offset + take].copy_from_slice(src);
                }
            }
            dst_offset += take;
            remaining -= take;
        }

        Self {
            data: Data::Owned(buf),
            size,
        }
    }

    /// Builds a coalesced view of a byte range `[offset, offset + len)` within a
    /// [`DirectStream`].
    ///
    /// Contiguity is evaluated over the block indices that back that particular byte range; the
    /// slow path delegates each block's copy to [`DirectStream::read_at`].
    pub fn from_direct_stream(
        direct: &DirectStream<'a>,
        offset: u32,
        len: u32,
    ) -> Option<Self> {
        if len == 0 {
            return Some(Self {
                data: Data::Borrowed(&[]),
                size: 0,
            });
        }

        let block_size = direct.block_size();
        let block_size_log2 = block_size.trailing_zeros();
        let start_block = direct.block_indices_for_offset(offset);
        let last_block = direct.block_indices_for_offset(offset.checked_add(len - 1)?);
        let indices = direct
            .block_indices()
            .get(start_block..=last_block)?;

        if is_contiguous(indices) {
            let first = indices.first()?;
            let offset_in_block = direct.data_offset_for_offset(offset) as u64;
            let start = ((first.get() as u64) << block_size_log2) + offset_in_block;
            if let Ok(start) = usize::try_from(start) {
                // This reads through `DirectStream`'s backing region rather than calling
                // `read_at`, since we already know the exact contiguous byte range.
                return direct.borrow_region(start, len as usize).map(|slice| Self {
                    data: Data::Borrowed(slice),
                    size: len,
                });
            }
        }

        let mut buf = vec![0u8; len as usize];
        direct.read_at(&mut buf, offset)?;
        Some(Self {
            data: Data::Owned(buf),
            size: len,
        })
    }

    /// The size of this view, in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The bytes of this view, as a single contiguous slice.
    pub fn as_slice(&self) -> &[u8] {
        match &self.data {
            Data::Borrowed(s) => s,
            Data::Owned(v) => v.as_slice(),
        }
    }

    /// `true` if this view borrows directly from the backing region (the fast path was taken),
    /// `false` if it owns a private, heap-allocated copy (the slow path was taken).
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Data::Borrowed(_))
    }

    /// Whether a read of `size_of::<T>()` bytes at `offset` would stay within bounds.
    pub fn can_read(&self, offset: u32, size: usize) -> bool {
        (offset as u64) + (size as u64) <= self.size as u64
    }

    /// Returns a reference to a `T` read at byte `offset`, or `None` if
    /// `offset + size_of::<T>() > self.size()`.
    ///
    /// This is the safe equivalent of the C++ core's `dataAt<T>`: rather than reinterpreting
    /// arbitrary bytes, `T` must itself declare a checked, tightly-packed, little-endian layout
    /// (`FromBytes + Immutable + KnownLayout + Unaligned`), and the bounds check happens before
    /// any reference is constructed.
    pub fn data_at<T>(&self, offset: u32) -> Option<&T>
    where
        T: FromBytes + Immutable + KnownLayout + Unaligned,
    {
        if !self.can_read(offset, size_of::<T>()) {
            return None;
        }
        let bytes = self.as_slice().get(offset as usize..offset as usize + size_of::<T>())?;
        T::ref_from_bytes(bytes).ok()
    }

    /// Returns the sub-slice of bytes starting at `offset`, bounds-checked against this view's
    /// size. Used for variable-length reads (NUL-terminated strings, trailing record arrays).
    pub fn bytes_at(&self, offset: u32) -> Option<&[u8]> {
        self.as_slice().get(offset as usize..)
    }
}

impl<'a> AsRef<[u8]> for CoalescedStream<'a> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// `true` iff `indices[i + 1] == indices[i] + 1` for every `i`. An empty or single-element slice
/// is trivially contiguous.
fn is_contiguous(indices: &[U32<LE>]) -> bool {
    indices
        .windows(2)
        .all(|w| w[1].get() == w[0].get().wrapping_add(1))
}
