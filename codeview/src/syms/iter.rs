use super::*;
use crate::utils::iter::HasRestLen;
use std::mem::take;
use tracing::debug;

/// Parses [`Sym`] records from a symbol stream.
///
/// Records are 4-byte aligned: after yielding a record of on-disk `size` (which counts the
/// `kind` field but not the `size` field itself), the iterator advances past
/// `sizeof(size) + sizeof(kind) + (size - sizeof(kind))` bytes and then rounds that position
/// up to the next multiple of 4. This is the single most load-bearing invariant of the
/// module symbol stream: getting it wrong desyncs every subsequent record in the stream.
#[derive(Clone)]
pub struct SymIter<'a> {
    data: &'a [u8],
}

impl<'a> HasRestLen for SymIter<'a> {
    fn rest_len(&self) -> usize {
        self.data.len()
    }
}

/// Parses [`SymMut`] records from a symbol stream.
///
/// This iterator allows you to modify the payload of a symbol record but not to change its
/// length or its kind.
pub struct SymIterMut<'a> {
    data: &'a mut [u8],
}

impl<'a> SymIterMut<'a> {
    /// Parses the 4-byte CodeView signature that is at the start of a module symbol stream.
    pub fn get_signature(&mut self) -> Result<[u8; 4], ParserError> {
        let mut p = ParserMut::new(take(&mut self.data));
        let sig = p.copy()?;
        self.data = p.into_rest();
        Ok(sig)
    }
}

impl<'a> HasRestLen for SymIterMut<'a> {
    fn rest_len(&self) -> usize {
        self.data.len()
    }
}

/// Rounds `n` up to the next multiple of 4.
#[inline]
fn round_up_4(n: usize) -> usize {
    (n + 3) & !3
}

impl<'a> SymIter<'a> {
    /// Creates a new symbol iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Parses the 4-byte CodeView signature that is at the start of a module symbol stream.
    pub fn get_signature(&mut self) -> Result<[u8; 4], ParserError> {
        let mut p = Parser::new(self.data);
        let sig = p.copy()?;
        self.data = p.into_rest();
        Ok(sig)
    }

    /// The remaining unparsed bytes in the symbol stream.
    pub fn rest(&self) -> &'a [u8] {
        self.data
    }

    /// Parses a single record from `data`.
    pub fn one(data: &'a [u8]) -> Option<Sym<'a>> {
        Self::new(data).next()
    }
}

impl<'a> Iterator for SymIter<'a> {
    type Item = Sym<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let mut p = Parser::new(self.data);
        let record_len = p.u16().ok()?;
        if record_len < 2 {
            debug!(
                invalid_record_len = record_len,
                iterator_pos = self.data.len(),
                "symbol record has invalid len"
            );
            return None;
        }

        let kind = SymKind(p.u16().ok()?);
        let record_data = p.bytes(record_len as usize - 2).ok()?;

        // `record_len` counted `kind` but not itself, so the bytes taken from the front of
        // `self.data` for this record are `2 (size) + record_len`.
        let consumed = 2 + record_len as usize;
        let padded = round_up_4(consumed);
        let padding = padded - consumed;

        let mut rest = p.into_rest();
        if padding > 0 {
            let mut pad_parser = Parser::new(rest);
            rest = pad_parser.bytes(padding).ok()?;
        }
        self.data = rest;

        Some(Sym {
            kind,
            data: record_data,
        })
    }
}

#[test]
fn test_sym_iter_alignment() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        // record 0, total size = 8, no padding needed (already a multiple of 4)
        /* 0x0000 */ 6, 0,                              // size
        /* 0x0002 */ 0x4c, 0x11,                        // S_BUILDINFO
        /* 0x0004 */ 1, 2, 3, 4,                        // payload (ItemId)

        // record 1, total size = 11 before alignment, 12 after padding by 1 byte
        /* 0x0008 */ 9, 0,                              // size
        /* 0x000a */ 0x24, 0x11,                        // S_UNAMESPACE
        /* 0x000c */ b'b', b'o', b'o', b's', b't', 0,   // payload: "boost\0" (6 bytes)
        /* 0x0012 */ 0xcc,                              // 1 byte of alignment padding

        // record 2, total size = 12, already aligned
        /* 0x0013 */ 10, 0,                             // size
        /* 0x0015 */ 0x24, 0x11,                        // S_UNAMESPACE
        /* 0x0017 */ b'a', b'b', b'c', b'd',            // payload
        /* 0x001b */ b'e', b'f', b'g', 0,                // "abcdefg\0"

        /* 0x001f : end */
    ];

    let mut i = SymIter::new(data);

    let s0 = i.next().unwrap();
    assert_eq!(s0.kind, SymKind::S_BUILDINFO);

    let s1 = i.next().unwrap();
    assert_eq!(s1.kind, SymKind::S_UNAMESPACE);
    match s1.parse() {
        Ok(SymData::UsingNamespace(ns)) => assert_eq!(ns.namespace, "boost"),
        sd => panic!("wrong: {sd:?}"),
    }

    let s2 = i.next().unwrap();
    assert_eq!(s2.kind, SymKind::S_UNAMESPACE);
    match s2.parse() {
        Ok(SymData::UsingNamespace(ns)) => assert_eq!(ns.namespace, "abcdefg"),
        sd => panic!("wrong: {sd:?}"),
    }

    assert!(i.next().is_none());
}

#[test]
fn test_sym_iter_exact_4_byte_record() {
    // A record whose body is empty (size == sizeof(kind)) is legal: header only.
    #[rustfmt::skip]
    let data: &[u8] = &[
        2, 0,       // size == 2, i.e. only the kind field
        0x06, 0x00, // S_END
    ];
    let mut i = SymIter::new(data);
    let s = i.next().unwrap();
    assert_eq!(s.kind, SymKind::S_END);
    assert!(s.data.is_empty());
    assert!(i.next().is_none());
}

impl<'a> SymIterMut<'a> {
    /// Creates a new symbol iterator.
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// The remaining unparsed bytes in the symbol stream.
    pub fn rest(&self) -> &[u8] {
        self.data
    }

    /// The remaining unparsed bytes in the symbol stream, with mutable access.
    pub fn rest_mut(&mut self) -> &mut [u8] {
        self.data
    }

    /// Converts this iterator into a mutable reference to the unparsed bytes in the symbol
    /// stream.
    pub fn into_rest(self) -> &'a mut [u8] {
        self.data
    }
}

impl<'a> Iterator for SymIterMut<'a> {
    type Item = SymMut<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < 4 {
            return None;
        }

        // We steal self.data because it is the only way that split_at_mut() can work.
        let d = core::mem::take(&mut self.data);

        let mut p = Parser::new(d);
        let record_len = p.u16().ok()?;
        if record_len < 2 {
            debug!(record_len, iterator_len = d.len(), "symbol record has invalid len");
            self.data = d;
            return None;
        }

        let kind = SymKind(p.u16().ok()?);

        let consumed = 2 + record_len as usize;
        let padded = round_up_4(consumed).min(d.len());

        let (entire_record_data, hi) = d.split_at_mut(padded);
        self.data = hi;

        let record_data = &mut entire_record_data[4..2 + record_len as usize];

        Some(SymMut {
            kind,
            data: record_data,
        })
    }
}
