/// Integration tests: write seekable streams, reopen them, and prove that
/// arbitrary decompressed ranges come back byte-exact while only the frames
/// a range touches are fetched and decompressed.
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use zseek_codecs::{Lz4Codec, PassThroughCodec, ZstdCodec};
use zseek_core::{
    Decoder, Encoder, Error, FrameCodec, FrameSink, FrameSource, IoSource, Reader, Writer,
};

/// Generate `len` deterministic bytes using a simple LCG.
fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

// ── helpers ───────────────────────────────────────────────────────────────

fn write_stream(chunks: &[Vec<u8>], codec: Box<dyn FrameCodec>) -> Vec<u8> {
    let mut w = Writer::new(Vec::new(), codec);
    for chunk in chunks {
        assert_eq!(w.write(chunk).unwrap(), chunk.len());
    }
    w.close().unwrap();
    w.into_sink().into_inner()
}

/// Chunks of uneven sizes so frame boundaries do not line up with anything.
fn uneven_chunks(seed: u64) -> Vec<Vec<u8>> {
    [1usize, 4096, 17, 65536, 300, 2, 9999]
        .iter()
        .enumerate()
        .map(|(i, &len)| pseudo_random_bytes(len, seed + i as u64))
        .collect()
}

fn open(buf: Vec<u8>, codec: Arc<dyn FrameCodec>) -> Reader<IoSource<Cursor<Vec<u8>>>> {
    Reader::new(Cursor::new(buf), codec).unwrap()
}

/// Source that counts how many frames are fetched from the stream.
struct CountingSource {
    inner: IoSource<Cursor<Vec<u8>>>,
    fetches: Arc<AtomicUsize>,
}

impl FrameSource for CountingSource {
    fn read_footer(&mut self) -> zseek_core::Result<Vec<u8>> {
        self.inner.read_footer()
    }

    fn read_frame_range(
        &mut self,
        comp_offset: u64,
        comp_size: u32,
    ) -> zseek_core::Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.read_frame_range(comp_offset, comp_size)
    }
}

/// Sink recording every call, with switchable failure modes.
#[derive(Default)]
struct RecordingSink {
    data: Vec<u8>,
    footer_writes: usize,
    short_frames: bool,
    fail_footer: bool,
}

impl FrameSink for RecordingSink {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<usize> {
        let n = if self.short_frames { frame.len() / 2 } else { frame.len() };
        self.data.extend_from_slice(&frame[..n]);
        Ok(n)
    }

    fn write_footer(&mut self, footer: &[u8]) -> io::Result<usize> {
        self.footer_writes += 1;
        if self.fail_footer {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink gone"));
        }
        self.data.extend_from_slice(footer);
        Ok(footer.len())
    }
}

/// Codec whose teardown always fails.
struct LeakyCodec;

impl FrameCodec for LeakyCodec {
    fn name(&self) -> &'static str {
        "leaky"
    }

    fn compress(&mut self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, compressed: &[u8], _decompressed_size: usize) -> anyhow::Result<Vec<u8>> {
        Ok(compressed.to_vec())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        anyhow::bail!("encoder teardown failed")
    }
}

// ── writer layout ──────────────────────────────────────────────────────────

#[test]
fn test_writer_footer_layout() {
    let chunks = vec![b"test1".to_vec(), b"test2".to_vec()];
    let buf = write_stream(&chunks, Box::new(ZstdCodec::default()));

    // magic footer
    assert_eq!(&buf[buf.len() - 4..], &[0xb1, 0xea, 0x92, 0x8f]);
    // frame count
    let n = u32::from_le_bytes(buf[buf.len() - 9..buf.len() - 5].try_into().unwrap());
    assert_eq!(n, 2);
    // descriptor: checksum flag only
    assert_eq!(buf[buf.len() - 5], 0x80);

    // first entry
    let entry = buf.len() - 4 - 1 - 4 - 2 * 12;
    let decompressed = u32::from_le_bytes(buf[entry + 4..entry + 8].try_into().unwrap());
    assert_eq!(decompressed, 5);
    let checksum = u32::from_le_bytes(buf[entry + 8..entry + 12].try_into().unwrap());
    assert_eq!(checksum, zseek_core::format::frame_checksum(b"test1"));

    // skippable frame header
    let header = entry - 8;
    assert_eq!(&buf[header..header + 4], &[0x5e, 0x2a, 0x4d, 0x18]);
    let size = u32::from_le_bytes(buf[header + 4..header + 8].try_into().unwrap());
    assert_eq!(size, 0x21);

    // the compressed frames fill everything before the seek table
    let compressed = u32::from_le_bytes(buf[entry..entry + 4].try_into().unwrap()) as usize;
    let second = entry + 12;
    let compressed2 = u32::from_le_bytes(buf[second..second + 4].try_into().unwrap()) as usize;
    assert_eq!(compressed + compressed2, header);
}

#[test]
fn test_empty_chunk_emits_no_frame() {
    let mut w = Writer::new(Vec::new(), Box::new(PassThroughCodec));
    assert_eq!(w.write(b"").unwrap(), 0);
    assert_eq!(w.num_frames(), 0);
    w.write(b"abc").unwrap();
    assert_eq!(w.num_frames(), 1);
    w.close().unwrap();

    let buf = w.into_sink().into_inner();
    let r = open(buf, Arc::new(PassThroughCodec));
    assert_eq!(r.num_frames(), 1);
    assert_eq!(r.size(), 3);
}

#[test]
fn test_stream_without_frames_is_readable() {
    let buf = write_stream(&[], Box::new(ZstdCodec::default()));
    assert_eq!(buf.len(), 8 + 9);

    let mut r = open(buf, Arc::new(ZstdCodec::default()));
    assert_eq!(r.size(), 0);
    assert_eq!(r.num_frames(), 0);
    assert!(r.index_by_decomp_offset(0).is_none());
    let mut out = Vec::new();
    assert_eq!(r.read_to_end(&mut out).unwrap(), 0);
}

#[test]
fn test_io_write_maps_each_call_to_a_frame() {
    use std::io::Write as _;

    let mut w = Writer::new(Vec::new(), Box::new(Lz4Codec));
    w.write_all(b"first chunk").unwrap();
    w.write_all(b"second").unwrap();
    w.flush().unwrap();
    assert_eq!(w.num_frames(), 2);
    w.close().unwrap();

    let r = open(w.into_sink().into_inner(), Arc::new(Lz4Codec));
    assert_eq!(r.index_by_id(1).unwrap().decomp_size, 6);
}

// ── writer lifecycle ──────────────────────────────────────────────────────

#[test]
fn test_close_is_idempotent() {
    let mut w = Writer::with_sink(RecordingSink::default(), Box::new(PassThroughCodec));
    w.write(b"payload").unwrap();
    w.close().unwrap();
    let len_after_first = w.get_ref().data.len();
    w.close().unwrap();

    assert!(w.is_closed());
    assert_eq!(w.get_ref().footer_writes, 1);
    assert_eq!(w.get_ref().data.len(), len_after_first);
}

#[test]
fn test_write_after_close_fails() {
    let mut w = Writer::new(Vec::new(), Box::new(PassThroughCodec));
    w.close().unwrap();
    assert!(matches!(w.write(b"late"), Err(Error::StreamClosed)));
    assert!(matches!(w.write(b""), Err(Error::StreamClosed)));
}

#[test]
fn test_close_aggregates_failures() {
    let sink = RecordingSink {
        fail_footer: true,
        ..Default::default()
    };
    let mut w = Writer::with_sink(sink, Box::new(LeakyCodec));
    w.write(b"data").unwrap();

    let first = w.close().unwrap_err();
    match &first {
        Error::Close(failures) => {
            assert_eq!(failures.len(), 2);
            assert!(matches!(failures[0], Error::Io(_)));
            assert!(matches!(failures[1], Error::Codec(_)));
        }
        other => panic!("expected aggregated close error, got {other:?}"),
    }
    let message = first.to_string();
    assert!(message.contains("sink gone"), "{message}");
    assert!(message.contains("encoder teardown failed"), "{message}");

    // Same status again, without touching the sink a second time.
    let second = w.close().unwrap_err();
    assert_eq!(second.to_string(), message);
    assert_eq!(w.get_ref().footer_writes, 1);
}

#[test]
fn test_partial_write_is_reported_after_indexing() {
    let sink = RecordingSink {
        short_frames: true,
        ..Default::default()
    };
    let mut w = Writer::with_sink(sink, Box::new(PassThroughCodec));
    match w.write(b"0123456789") {
        Err(Error::PartialWrite { written, expected }) => {
            assert_eq!(written, 5);
            assert_eq!(expected, 10);
        }
        other => panic!("expected partial write, got {other:?}"),
    }
    // The frame is already in the seek table; the stream is now corrupt.
    assert_eq!(w.num_frames(), 1);
}

// ── round trips ───────────────────────────────────────────────────────────

#[test]
fn test_roundtrip_passthrough() {
    roundtrip(Box::new(PassThroughCodec), Arc::new(PassThroughCodec));
}

#[test]
fn test_roundtrip_zstd() {
    roundtrip(Box::new(ZstdCodec::default()), Arc::new(ZstdCodec::default()));
}

#[test]
fn test_roundtrip_lz4() {
    roundtrip(Box::new(Lz4Codec), Arc::new(Lz4Codec));
}

fn roundtrip(writer_codec: Box<dyn FrameCodec>, reader_codec: Arc<dyn FrameCodec>) {
    let chunks = uneven_chunks(0xDEAD_BEEF);
    let expected: Vec<u8> = chunks.concat();

    let mut r = open(write_stream(&chunks, writer_codec), reader_codec);
    assert_eq!(r.size(), expected.len() as u64);
    assert_eq!(r.num_frames(), chunks.len());

    let mut reconstructed = Vec::new();
    r.read_to_end(&mut reconstructed).unwrap();
    assert_eq!(reconstructed, expected, "round-trip should be byte-exact");
}

#[test]
fn test_zstd_compresses_compressible_chunks() {
    let chunks: Vec<Vec<u8>> = (0..4).map(|_| compressible_bytes(64 * 1024)).collect();
    let r = open(
        write_stream(&chunks, Box::new(ZstdCodec::default())),
        Arc::new(ZstdCodec::default()),
    );
    let compressed_size = r.compressed_size();
    let raw_size = r.size();
    assert!(
        compressed_size < raw_size,
        "zstd should compress compressible data: compressed={compressed_size} raw={raw_size}"
    );
    assert!(r.ratio() > 1.0);
}

// ── lookups ───────────────────────────────────────────────────────────────

#[test]
fn test_offset_lookup_covers_every_byte() {
    let chunks = vec![vec![1u8; 10], vec![2u8; 1], vec![3u8; 25], vec![4u8; 7]];
    let r = open(
        write_stream(&chunks, Box::new(PassThroughCodec)),
        Arc::new(PassThroughCodec),
    );

    for off in 0..r.size() {
        let e = r.index_by_decomp_offset(off).unwrap();
        assert!(
            e.decomp_offset <= off && off < e.decomp_offset + e.decomp_size as u64,
            "offset {off} resolved to frame {} at {}+{}",
            e.id,
            e.decomp_offset,
            e.decomp_size
        );
    }
    assert!(r.index_by_decomp_offset(r.size()).is_none());
    assert!(r.index_by_decomp_offset(r.size() + 1000).is_none());
}

#[test]
fn test_id_lookup_follows_write_order() {
    let chunks = uneven_chunks(7);
    let r = open(
        write_stream(&chunks, Box::new(ZstdCodec::default())),
        Arc::new(ZstdCodec::default()),
    );

    let mut comp_offset = 0u64;
    let mut decomp_offset = 0u64;
    for (i, chunk) in chunks.iter().enumerate() {
        let e = r.index_by_id(i as i64).unwrap();
        assert_eq!(e.id, i as i64);
        assert_eq!(e.decomp_size as usize, chunk.len());
        assert_eq!(e.decomp_offset, decomp_offset);
        assert_eq!(e.comp_offset, comp_offset);
        comp_offset += e.comp_size as u64;
        decomp_offset += e.decomp_size as u64;
    }
    assert!(r.index_by_id(-1).is_none());
    assert!(r.index_by_id(chunks.len() as i64).is_none());
}

#[test]
fn test_lookups_from_many_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Reader<IoSource<Cursor<Vec<u8>>>>>();
    assert_send_sync::<Decoder>();

    let chunks = uneven_chunks(99);
    let r = open(
        write_stream(&chunks, Box::new(PassThroughCodec)),
        Arc::new(PassThroughCodec),
    );
    let size = r.size();

    std::thread::scope(|s| {
        for t in 0..4u64 {
            let r = &r;
            s.spawn(move || {
                for off in (t..size).step_by(97) {
                    assert!(r.index_by_decomp_offset(off).unwrap().contains(off));
                }
                for id in 0..r.num_frames() as i64 {
                    assert_eq!(r.index_by_id(id).unwrap().id, id);
                }
            });
        }
    });
}

// ── random access ─────────────────────────────────────────────────────────

#[test]
fn test_read_range_crosses_frame_boundaries() {
    let chunks = uneven_chunks(42);
    let expected: Vec<u8> = chunks.concat();
    let mut r = open(
        write_stream(&chunks, Box::new(ZstdCodec::default())),
        Arc::new(ZstdCodec::default()),
    );

    // Straddles the 4096-byte frame into the 17-byte one and beyond.
    let start = 4000u64;
    let result = r.read_range(start, 200).unwrap();
    assert_eq!(result.len(), 200);
    assert_eq!(result.as_slice(), &expected[4000..4200]);

    // Clamped to the end of the stream.
    let tail = r.read_range(expected.len() as u64 - 10, 1000).unwrap();
    assert_eq!(tail.as_slice(), &expected[expected.len() - 10..]);

    // Entirely past the end.
    assert!(r.read_range(expected.len() as u64 + 5, 10).unwrap().is_empty());
}

#[test]
fn test_single_frame_cache() {
    let chunks: Vec<Vec<u8>> = (0..3).map(|i| pseudo_random_bytes(100, i)).collect();
    let expected = chunks.concat();
    let buf = write_stream(&chunks, Box::new(ZstdCodec::default()));

    let fetches = Arc::new(AtomicUsize::new(0));
    let source = CountingSource {
        inner: IoSource::new(Cursor::new(buf)),
        fetches: Arc::clone(&fetches),
    };
    let mut r = Reader::with_source(source, Arc::new(ZstdCodec::default())).unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 0);

    // Sequential reads inside frame 0: one fetch.
    let mut small = [0u8; 10];
    for i in 0..5 {
        r.read_exact(&mut small).unwrap();
        assert_eq!(&small[..], &expected[i * 10..i * 10 + 10]);
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // Jump to frame 2, then back to frame 0.
    let mut one = [0u8; 1];
    r.read_at(&mut one, 250).unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    r.read_at(&mut one, 20).unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 3);

    // Full range: frame 0 is cached, frames 1 and 2 are fetched.
    let all = r.read_range(0, 300).unwrap();
    assert_eq!(all, expected);
    assert_eq!(fetches.load(Ordering::SeqCst), 5);
}

#[test]
fn test_seek_semantics() {
    let chunks = vec![b"hello ".to_vec(), b"seekable ".to_vec(), b"world".to_vec()];
    let mut r = open(
        write_stream(&chunks, Box::new(ZstdCodec::default())),
        Arc::new(ZstdCodec::default()),
    );

    let pos = r.seek(SeekFrom::Start(6)).unwrap();
    assert_eq!(pos, 6);
    let mut word = [0u8; 8];
    r.read_exact(&mut word).unwrap();
    assert_eq!(&word, b"seekable");

    r.seek(SeekFrom::End(-5)).unwrap();
    let mut rest = String::new();
    r.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "world");

    // Past the end is legal and reads as EOF.
    assert_eq!(r.seek(SeekFrom::End(10)).unwrap(), r.size() + 10);
    let mut buf = [0u8; 4];
    assert_eq!(r.read(&mut buf).unwrap(), 0);

    // Negative resulting positions are rejected and leave the cursor alone.
    let err = r.seek(SeekFrom::Current(-1000)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(matches!(
        r.seek_to(SeekFrom::End(-21)),
        Err(Error::InvalidOffset(-1))
    ));
    assert_eq!(r.position(), r.size() + 10);
}

#[test]
fn test_fork_shares_index_with_own_cursor() {
    let chunks = uneven_chunks(5);
    let expected = chunks.concat();
    let buf = write_stream(&chunks, Box::new(ZstdCodec::default()));

    let mut a = open(buf.clone(), Arc::new(ZstdCodec::default()));
    let mut b = a.fork(IoSource::new(Cursor::new(buf)));
    assert!(Arc::ptr_eq(&a.frame_index(), &b.frame_index()));

    a.seek(SeekFrom::Start(100)).unwrap();
    let mut from_b = vec![0u8; 50];
    b.read_exact(&mut from_b).unwrap();
    let mut from_a = vec![0u8; 50];
    a.read_exact(&mut from_a).unwrap();

    assert_eq!(from_b.as_slice(), &expected[..50]);
    assert_eq!(from_a.as_slice(), &expected[100..150]);
}

// ── integrity ─────────────────────────────────────────────────────────────

#[test]
fn test_corrupted_frame_fails_checksum() {
    let chunks = vec![b"first frame".to_vec(), b"second frame".to_vec()];
    let mut buf = write_stream(&chunks, Box::new(PassThroughCodec));
    // Passthrough frames are stored verbatim: flip a byte inside frame 0.
    buf[3] ^= 0x20;

    let mut r = open(buf, Arc::new(PassThroughCodec));
    match r.read_range(0, 5) {
        Err(Error::ChecksumMismatch { frame, expected, actual }) => {
            assert_eq!(frame, 0);
            assert_ne!(expected, actual);
        }
        other => panic!("expected checksum mismatch, got {other:?}"),
    }

    // Untouched frames still read fine.
    assert_eq!(r.read_range(11, 12).unwrap(), b"second frame");
}

#[test]
fn test_short_frame_from_source_is_reported() {
    struct TruncatingSource(IoSource<Cursor<Vec<u8>>>);

    impl FrameSource for TruncatingSource {
        fn read_footer(&mut self) -> zseek_core::Result<Vec<u8>> {
            self.0.read_footer()
        }

        fn read_frame_range(&mut self, off: u64, size: u32) -> zseek_core::Result<Vec<u8>> {
            let mut frame = self.0.read_frame_range(off, size)?;
            frame.pop();
            Ok(frame)
        }
    }

    let buf = write_stream(&[b"abcdef".to_vec()], Box::new(PassThroughCodec));
    let source = TruncatingSource(IoSource::new(Cursor::new(buf)));
    let mut r = Reader::with_source(source, Arc::new(PassThroughCodec)).unwrap();
    assert!(matches!(
        r.read_range(0, 6),
        Err(Error::FrameSizeMismatch {
            frame: 0,
            what: "compressed",
            expected: 6,
            actual: 5
        })
    ));
}

#[test]
fn test_frame_decompressing_to_wrong_length_is_reported() {
    /// Passthrough that inflates every frame by one byte.
    struct PaddingCodec;

    impl FrameCodec for PaddingCodec {
        fn name(&self) -> &'static str {
            "padding"
        }

        fn compress(&mut self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
            Ok(raw.to_vec())
        }

        fn decompress(&self, compressed: &[u8], _size: usize) -> anyhow::Result<Vec<u8>> {
            let mut raw = compressed.to_vec();
            raw.push(0);
            Ok(raw)
        }
    }

    let buf = write_stream(&[b"abc".to_vec()], Box::new(PassThroughCodec));
    let mut r = open(buf, Arc::new(PaddingCodec));
    assert!(matches!(
        r.read_range(0, 3),
        Err(Error::FrameSizeMismatch {
            frame: 0,
            what: "decompressed",
            expected: 3,
            actual: 4
        })
    ));
}

#[test]
fn test_missing_footer() {
    let not_seekable = Cursor::new(b"not a seekable stream".to_vec());
    let err = Reader::new(not_seekable, Arc::new(PassThroughCodec))
        .err()
        .unwrap();
    assert!(matches!(err, Error::FooterNotFound(_)), "{err}");

    let err = Reader::new(Cursor::new(vec![1, 2, 3]), Arc::new(PassThroughCodec))
        .err()
        .unwrap();
    assert!(matches!(err, Error::FooterNotFound(_)), "{err}");
}

#[test]
fn test_footer_larger_than_stream() {
    let mut buf = 1000u32.to_le_bytes().to_vec();
    buf.push(0x80);
    buf.extend_from_slice(&zseek_core::SEEKABLE_MAGIC_NUMBER.to_le_bytes());
    let err = Reader::new(Cursor::new(buf), Arc::new(PassThroughCodec))
        .err()
        .unwrap();
    assert!(matches!(err, Error::MalformedFooter(_)), "{err}");
}

#[test]
fn test_reserved_descriptor_bits_are_preserved() {
    let mut buf = write_stream(&[b"abc".to_vec()], Box::new(PassThroughCodec));
    let descriptor_at = buf.len() - 5;
    buf[descriptor_at] |= 0x01;
    let table = buf[buf.len() - (8 + 12 + 9)..].to_vec();

    let r = open(buf, Arc::new(PassThroughCodec));
    assert!(r.descriptor().checksum_flag());
    assert_eq!(r.descriptor().reserved_bits(), 0x01);
    assert_eq!(r.seek_table().unwrap(), table);
}

// ── footer-only decoder ───────────────────────────────────────────────────

#[test]
fn test_encoder_output_matches_writer() {
    let chunks = uneven_chunks(11);

    let mut enc = Encoder::new(Box::new(ZstdCodec::default()));
    let mut stream = Vec::new();
    for chunk in &chunks {
        stream.extend(enc.encode(chunk).unwrap());
    }
    assert!(enc.encode(b"").unwrap().is_empty());
    assert_eq!(enc.index().len(), chunks.len());
    stream.extend(enc.end_stream().unwrap());

    assert_eq!(stream, write_stream(&chunks, Box::new(ZstdCodec::default())));
}

#[test]
fn test_decoder_from_seek_table() {
    let chunks = uneven_chunks(3);
    let mut enc = Encoder::new(Box::new(PassThroughCodec));
    for chunk in &chunks {
        enc.encode(chunk).unwrap();
    }
    let table = enc.end_stream().unwrap();

    let mut dec = Decoder::from_seek_table(&table).unwrap();
    assert_eq!(dec.num_frames(), chunks.len());
    assert_eq!(dec.size(), chunks.iter().map(|c| c.len() as u64).sum::<u64>());
    assert_eq!(dec.index_by_id(3).unwrap().decomp_size, 65536);
    assert_eq!(dec.index_by_decomp_offset(0).unwrap().id, 0);
    assert_eq!(dec.index_by_decomp_offset(1).unwrap().id, 1);
    assert!(dec.index_by_id(-5).is_none());

    // Lookups only: there is no compressed stream to read from.
    assert!(matches!(dec.read_range(0, 1), Err(Error::NoDataSource)));
    let mut buf = [0u8; 4];
    assert!(dec.read(&mut buf).is_err());
    assert_eq!(dec.seek_table().unwrap(), table);
}

#[test]
fn test_reader_close_releases_everything() {
    let mut r = open(
        write_stream(&[b"abc".to_vec()], Box::new(PassThroughCodec)),
        Arc::new(PassThroughCodec),
    );
    assert_eq!(r.read_range(0, 3).unwrap(), b"abc");

    r.close().unwrap();
    r.close().unwrap();
    assert!(matches!(r.read_range(0, 3), Err(Error::StreamClosed)));
    assert_eq!(r.size(), 0);
    assert!(r.index_by_id(0).is_none());
}
