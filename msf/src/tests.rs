//! Scenario tests S1-S4 from the core's testable-properties list, plus the directory
//! contiguity and direct/coalesced round-trip invariants.

use crate::superblock::MAGIC;
use crate::{CoalescedStream, DirectStream, ErrorCode, RawFile};

const BLOCK_SIZE: u32 = 0x1000;

/// Builds a minimal synthetic MSF blob with a single non-directory stream (stream 0) whose
/// block indices are `indices` and whose size is `size`. `block_count` is the total number of
/// blocks in the file (must be large enough to cover every index used, plus the directory's own
/// block).
fn build_blob(indices: &[u32], size: u32, block_count: u32, free_block_map_index: u32) -> Vec<u8> {
    let mut blob = vec![0u8; (block_count * BLOCK_SIZE) as usize];

    // Directory content: streamCount(1), sizes[0]=size, blockIndices[0..] = indices.
    let mut directory = Vec::new();
    directory.extend_from_slice(&1u32.to_le_bytes());
    directory.extend_from_slice(&size.to_le_bytes());
    for &i in indices {
        directory.extend_from_slice(&i.to_le_bytes());
    }
    let directory_size = directory.len() as u32;

    // Place the directory at block 5, contiguous, one block is enough for these tests.
    const DIRECTORY_BLOCK: u32 = 5;
    let dir_start = (DIRECTORY_BLOCK * BLOCK_SIZE) as usize;
    blob[dir_start..dir_start + directory.len()].copy_from_slice(&directory);

    // Superblock header.
    blob[0..30].copy_from_slice(&MAGIC);
    blob[32..36].copy_from_slice(&BLOCK_SIZE.to_le_bytes());
    blob[36..40].copy_from_slice(&free_block_map_index.to_le_bytes());
    blob[40..44].copy_from_slice(&block_count.to_le_bytes());
    blob[44..48].copy_from_slice(&directory_size.to_le_bytes());
    // blob[48..52] is the unused word, left zero.

    // Trailing directory-block-map array: one entry, pointing at DIRECTORY_BLOCK.
    blob[52..56].copy_from_slice(&DIRECTORY_BLOCK.to_le_bytes());

    // Fill the stream's blocks with recognizable content so tests can check exact bytes.
    for (n, &block) in indices.iter().enumerate() {
        let start = (block * BLOCK_SIZE) as usize;
        for (i, byte) in blob[start..start + BLOCK_SIZE as usize].iter_mut().enumerate() {
            *byte = (n * 0x10 + (i % 251)) as u8;
        }
    }

    blob
}

#[test]
fn s1_superblock_rejection() {
    let blob = vec![0u8; 4096];
    assert_eq!(
        RawFile::validate(&blob, blob.len()),
        Err(ErrorCode::InvalidSuperBlock)
    );
}

#[test]
fn s2_free_block_map_rejection() {
    let blob = build_blob(&[10, 11, 12], 0x3000, 13, 3);
    assert_eq!(
        RawFile::validate(&blob, blob.len()),
        Err(ErrorCode::InvalidFreeBlockMap)
    );
}

#[test]
fn s3_contiguous_stream_fast_path() {
    let blob = build_blob(&[10, 11, 12], 0x3000, 13, 1);
    RawFile::validate(&blob, blob.len()).unwrap();
    let raw = RawFile::open(&blob, blob.len()).unwrap();

    assert_eq!(raw.stream_count(), 1);
    assert_eq!(raw.stream_size(0), Some(0x3000));

    let coalesced = raw.create_coalesced_stream(0, None);
    assert!(coalesced.is_borrowed(), "contiguous stream must not allocate");
    assert_eq!(coalesced.size(), 0x3000);

    let expected_start = (10 * BLOCK_SIZE) as usize;
    assert_eq!(
        coalesced.as_slice(),
        &blob[expected_start..expected_start + 0x3000]
    );
}

#[test]
fn s4_scattered_stream_slow_path() {
    let indices = [10u32, 12, 11];
    let size = 0x2A00;
    let blob = build_blob(&indices, size, 13, 1);
    let raw = RawFile::open(&blob, blob.len()).unwrap();

    let coalesced = raw.create_coalesced_stream(0, None);
    assert!(!coalesced.is_borrowed(), "scattered stream must allocate");
    assert_eq!(coalesced.size(), size);

    let mut expected = Vec::new();
    expected.extend_from_slice(&blob[(10 * BLOCK_SIZE) as usize..(11 * BLOCK_SIZE) as usize]);
    expected.extend_from_slice(&blob[(12 * BLOCK_SIZE) as usize..(13 * BLOCK_SIZE) as usize]);
    expected.extend_from_slice(
        &blob[(11 * BLOCK_SIZE) as usize..(11 * BLOCK_SIZE) as usize + 0xA00],
    );

    assert_eq!(coalesced.as_slice(), expected.as_slice());
}

#[test]
fn direct_stream_round_trips_through_coalesced() {
    let indices = [10u32, 12, 11];
    let size = 0x2A00;
    let blob = build_blob(&indices, size, 13, 1);
    let raw = RawFile::open(&blob, blob.len()).unwrap();

    let direct = raw.create_direct_stream(0);
    let coalesced = raw.create_coalesced_stream(0, None);

    // Property 3: for every offset range within the stream, `DirectStream::read_at` must agree
    // byte-for-byte with the corresponding slice of the coalesced view.
    for &(offset, len) in &[(0u32, 16u32), (4096, 4096), (8192, 0xA00), (0, size)] {
        let mut buf = vec![0u8; len as usize];
        direct.read_at(&mut buf, offset).unwrap();
        assert_eq!(
            buf.as_slice(),
            &coalesced.as_slice()[offset as usize..offset as usize + len as usize],
            "mismatch at offset {offset}, len {len}"
        );
    }
}

#[test]
fn coalesced_stream_bounds_check() {
    let blob = build_blob(&[10, 11, 12], 0x3000, 13, 1);
    let raw = RawFile::open(&blob, blob.len()).unwrap();
    let coalesced = raw.create_coalesced_stream(0, None);

    assert!(coalesced.can_read(0x2ffc, 4));
    assert!(!coalesced.can_read(0x2ffd, 4));
    assert_eq!(
        coalesced.data_at::<zerocopy::byteorder::U32<zerocopy::byteorder::LE>>(0x2ffd),
        None
    );
}

#[test]
fn limited_size_truncates_coalesced_view() {
    let blob = build_blob(&[10, 11, 12], 0x3000, 13, 1);
    let raw = RawFile::open(&blob, blob.len()).unwrap();
    let coalesced = raw.create_coalesced_stream(0, Some(10));
    assert_eq!(coalesced.size(), 10);
    assert_eq!(coalesced.as_slice().len(), 10);
}

#[test]
fn direct_stream_from_slice_matches_coalesced() {
    let indices = [10u32, 12, 11];
    let size = 0x2A00;
    let blob = build_blob(&indices, size, 13, 1);
    let raw = RawFile::open(&blob, blob.len()).unwrap();
    let direct = raw.create_direct_stream(0);

    let slice = CoalescedStream::from_direct_stream(&direct, 4096, 4096).unwrap();
    let whole = raw.create_coalesced_stream(0, None);
    assert_eq!(slice.as_slice(), &whole.as_slice()[4096..8192]);
}

// Tests below exercise `DirectStream` directly, without going through `RawFile`, covering the
// empty/single-block/exact-multiple boundary behaviors called out in the testable properties.

#[test]
fn direct_stream_empty() {
    let blob = vec![0u8; BLOCK_SIZE as usize];
    let ds = DirectStream::new(&blob, &[], BLOCK_SIZE, 0);
    assert_eq!(ds.size(), 0);
    let mut buf = [0u8; 0];
    assert_eq!(ds.read_at(&mut buf, 0), Some(()));
}

#[test]
fn direct_stream_exact_block_multiple() {
    let blob = build_blob(&[10, 11], BLOCK_SIZE * 2, 12, 1);
    let raw = RawFile::open(&blob, blob.len()).unwrap();
    let ds = raw.create_direct_stream(0);
    assert_eq!(ds.size(), BLOCK_SIZE * 2);
    let mut buf = vec![0u8; BLOCK_SIZE as usize];
    assert!(ds.read_at(&mut buf, BLOCK_SIZE).is_some());
    assert!(ds.read_at(&mut buf, BLOCK_SIZE + 1).is_none());
}
