//! Image Section Stream
//!
//! The Image Section Stream is one of the streams named by the DBI Optional Debug Header
//! Substream (see [`crate::dbi::optional_dbg::OptionalDebugHeaderStream::section_header_data`]).
//! It holds a flat array of `IMAGE_SECTION_HEADER` records, copied verbatim from the linked PE
//! image's section table. Its only job is converting a `(one-based section index, offset within
//! that section)` pair -- the representation symbols and section contributions use throughout
//! the rest of the PDB -- into a Relative Virtual Address (RVA), i.e. an offset from the base of
//! the linked image.
//!
//! # References
//! * <https://llvm.org/docs/PDB/DbiStream.html#optional-debug-header-stream>
//! * <https://learn.microsoft.com/en-us/windows/win32/api/winnt/ns-winnt-image_section_header>

use ms_coff::IMAGE_SECTION_HEADER;
use std::mem::size_of;
use zerocopy::FromBytes;

/// Contains the decoded Image Section Stream: a flat array of `IMAGE_SECTION_HEADER` records,
/// one per section of the linked PE image, in section-index order.
pub struct ImageSectionStream {
    headers: Vec<IMAGE_SECTION_HEADER>,
}

impl ImageSectionStream {
    /// Constructs an empty Image Section Stream. Used when the DBI Optional Debug Header
    /// Substream does not name a section header stream (the sentinel `0xffff`), which is legal
    /// -- callers that rely on RVA conversion simply see every conversion return `0`.
    pub fn empty() -> Self {
        Self { headers: Vec::new() }
    }

    /// Parses the contents of the Image Section Stream.
    ///
    /// The stream is a bare array of `IMAGE_SECTION_HEADER` records with no header of its own.
    /// A trailing partial record (a byte count that is not an exact multiple of
    /// `size_of::<IMAGE_SECTION_HEADER>()`) is silently truncated away rather than rejected,
    /// matching the source's use of integer division to compute the header count.
    pub fn parse(stream_data: &[u8]) -> Self {
        let header_size = size_of::<IMAGE_SECTION_HEADER>();
        let count = stream_data.len() / header_size;
        let exact_bytes = &stream_data[..count * header_size];

        let headers = match <[IMAGE_SECTION_HEADER]>::ref_from_bytes(exact_bytes) {
            Ok(headers) => headers.to_vec(),
            Err(_) => Vec::new(),
        };

        Self { headers }
    }

    /// Returns a view of every section header in the stream, in section-index order (section
    /// index `i` is `self.sections()[i - 1]`, since section indexes are one-based).
    pub fn sections(&self) -> &[IMAGE_SECTION_HEADER] {
        &self.headers
    }

    /// The number of sections described by this stream.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// `true` if this stream describes no sections at all (including the empty/absent case).
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Converts a one-based section index and an offset within that section into an RVA
    /// (Relative Virtual Address).
    ///
    /// Returns `0` -- a sentinel meaning "no RVA" -- if `one_based_section_index` is `0`, or if
    /// it names a section beyond the end of this stream. The latter case is not necessarily an
    /// error: some compiler- or linker-generated symbols (e.g. Control Flow Guard symbols) are
    /// deliberately contained in a section that is neither part of the PDB nor the image, and
    /// callers are expected to treat a `0` result as "ignore this symbol" rather than a parse
    /// failure.
    pub fn convert_section_offset_to_rva(
        &self,
        one_based_section_index: u16,
        offset_in_section: u32,
    ) -> u32 {
        if one_based_section_index == 0 {
            return 0;
        }

        let Some(header) = self
            .headers
            .get(one_based_section_index as usize - 1)
        else {
            return 0;
        };

        header.virtual_address.wrapping_add(offset_in_section)
    }
}

impl<'a> crate::Pdb<'a> {
    /// Reads the Image Section Stream, using the stream index named by the DBI Optional Debug
    /// Header Substream. Returns an empty stream (every RVA conversion returns `0`) if that
    /// substream does not name a section header stream.
    pub fn image_section_stream(&self) -> anyhow::Result<ImageSectionStream> {
        let dbi_stream = self.read_dbi_stream()?;
        let optional_header = dbi_stream.optional_debug_header()?;
        let Some(stream_index) =
            optional_header.stream(crate::dbi::optional_dbg::OptionalDebugHeaderStream::section_header_data)
        else {
            return Ok(ImageSectionStream::empty());
        };

        if !self.raw().has_stream(stream_index) {
            return Ok(ImageSectionStream::empty());
        }

        let stream_data = self
            .raw()
            .create_coalesced_stream(stream_index, None);
        Ok(ImageSectionStream::parse(stream_data.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    fn header(virtual_address: u32) -> IMAGE_SECTION_HEADER {
        IMAGE_SECTION_HEADER {
            virtual_address,
            ..Default::default()
        }
    }

    #[test]
    fn empty_stream_converts_everything_to_zero() {
        let s = ImageSectionStream::empty();
        assert_eq!(s.convert_section_offset_to_rva(0, 0x1234), 0);
        assert_eq!(s.convert_section_offset_to_rva(1, 0x1234), 0);
    }

    #[test]
    fn zero_section_index_is_always_the_sentinel() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(header(0x1000).as_bytes());
        let s = ImageSectionStream::parse(&bytes);
        assert_eq!(s.convert_section_offset_to_rva(0, 0x10), 0);
    }

    #[test]
    fn section_index_past_the_end_is_the_sentinel() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(header(0x1000).as_bytes());
        let s = ImageSectionStream::parse(&bytes);
        assert_eq!(s.len(), 1);
        assert_eq!(s.convert_section_offset_to_rva(2, 0x10), 0);
    }

    #[test]
    fn converts_one_based_index_and_offset_to_rva() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(header(0x1000).as_bytes());
        bytes.extend_from_slice(header(0x2000).as_bytes());
        let s = ImageSectionStream::parse(&bytes);

        assert_eq!(s.convert_section_offset_to_rva(1, 0x10), 0x1010);
        assert_eq!(s.convert_section_offset_to_rva(2, 0x20), 0x2020);
    }

    #[test]
    fn rva_is_monotonic_in_offset_within_a_section() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(header(0x4000).as_bytes());
        let s = ImageSectionStream::parse(&bytes);

        let a = s.convert_section_offset_to_rva(1, 0x10);
        let b = s.convert_section_offset_to_rva(1, 0x20);
        assert!(a <= b);
    }

    #[test]
    fn trailing_partial_record_is_truncated_not_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(header(0x1000).as_bytes());
        bytes.push(0xcc); // one trailing byte: not a full header
        let s = ImageSectionStream::parse(&bytes);
        assert_eq!(s.len(), 1);
    }
}
