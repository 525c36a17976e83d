//! End-to-end pipeline tests: container round-trips, ordering under forced
//! out-of-order completion, the concurrency bound, and framing failures.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use sbc_codecs::{GzipCodec, Lz4Codec, StoreCodec, ZstdCodec};
use sbc_core::chunk::FrameBlocks;
use sbc_core::frame::LEN_FIELD_WIDTH;
use sbc_core::{
    compress, compress_file, decompress, decompress_file, BlockCodec, CodecError, Error,
    FramingError, PipelineConfig,
};

// ── helpers ────────────────────────────────────────────────────────────────

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

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("sbc_test_{}_{}", std::process::id(), name))
}

fn config(block_size: usize, workers: usize) -> PipelineConfig {
    PipelineConfig {
        block_size,
        workers,
    }
}

/// Compress `data` into an in-memory container, then decompress it back.
fn round_trip(data: &[u8], codec: &dyn BlockCodec, cfg: &PipelineConfig) -> (Vec<u8>, Vec<u8>) {
    let mut container = Vec::new();
    compress(Cursor::new(data), &mut container, codec, cfg).unwrap();

    let mut restored = Vec::new();
    decompress(Cursor::new(&container), &mut restored, codec, cfg).unwrap();
    (container, restored)
}

fn frame_payloads(container: &[u8]) -> Vec<Vec<u8>> {
    FrameBlocks::new(Cursor::new(container))
        .map(|b| b.unwrap().data)
        .collect()
}

// ── round-trip tests ───────────────────────────────────────────────────────

#[test]
fn test_roundtrip_gzip() {
    let data = compressible_bytes(4 * 8192 + 1234);
    let (container, restored) = round_trip(&data, &GzipCodec::default(), &config(8192, 4));

    assert_eq!(restored, data, "gzip round-trip should be byte-exact");
    assert!(
        container.len() < data.len(),
        "gzip should shrink compressible data: container={} raw={}",
        container.len(),
        data.len()
    );
}

#[test]
fn test_roundtrip_all_codecs() {
    let data = compressible_bytes(3 * 4096 + 77);
    let codecs: Vec<Box<dyn BlockCodec>> = vec![
        Box::new(GzipCodec::default()),
        Box::new(ZstdCodec::default()),
        Box::new(Lz4Codec),
        Box::new(StoreCodec),
    ];

    for codec in &codecs {
        let (_, restored) = round_trip(&data, codec.as_ref(), &config(4096, 3));
        assert_eq!(restored, data, "{} round-trip failed", codec.name());
    }
}

#[test]
fn test_roundtrip_incompressible_data() {
    // High-entropy blocks expand under gzip; frames must still round-trip.
    let data = pseudo_random_bytes(5 * 4096, 0xDEAD_BEEF);
    let (_, restored) = round_trip(&data, &GzipCodec::default(), &config(4096, 4));
    assert_eq!(restored, data);
}

#[test]
fn test_exact_multiple_produces_no_trailing_empty_block() {
    let data = compressible_bytes(4 * 1024);
    let (container, restored) = round_trip(&data, &GzipCodec::default(), &config(1024, 2));

    let frame_count = frame_payloads(&container).len();
    assert_eq!(frame_count, 4, "4 KiB of 1 KiB blocks is exactly 4 frames");
    assert_eq!(restored, data);
}

#[test]
fn test_empty_input_yields_empty_container() {
    let (container, restored) = round_trip(b"", &GzipCodec::default(), &config(1024, 4));
    assert!(container.is_empty(), "empty input must produce zero frames");
    assert!(restored.is_empty());
}

#[test]
fn test_block_split_scenario() {
    // With the store codec, frame payloads equal the raw blocks, so the
    // container layout is fully predictable.
    let mut container = Vec::new();
    compress(
        Cursor::new(b"ABCDEFGHIJ"),
        &mut container,
        &StoreCodec,
        &config(4, 2),
    )
    .unwrap();

    let mut expected = Vec::new();
    for payload in [&b"ABCD"[..], b"EFGH", b"IJ"] {
        expected.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        expected.extend_from_slice(payload);
    }
    assert_eq!(container, expected);

    let mut restored = Vec::new();
    decompress(Cursor::new(&container), &mut restored, &StoreCodec, &config(4, 2)).unwrap();
    assert_eq!(restored, b"ABCDEFGHIJ");
}

// ── ordering under concurrency ─────────────────────────────────────────────

/// Store codec whose compress sleeps proportionally to the block's first
/// byte, so early blocks can be made to finish last.
struct DelayCodec;

impl BlockCodec for DelayCodec {
    fn name(&self) -> &'static str {
        "delay"
    }

    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        let ms = raw.first().copied().unwrap_or(0) as u64 / 4;
        thread::sleep(Duration::from_millis(ms));
        Ok(raw.to_vec())
    }

    fn decompress_block(&self, encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(encoded.to_vec())
    }
}

#[test]
fn test_output_order_matches_input_order_despite_completion_order() {
    // Block i is filled with the value (8 - i) * 10, so block 0 sleeps
    // 20 ms, block 7 sleeps 2 ms: with 4 workers the completions arrive
    // roughly reversed.
    let mut data = Vec::new();
    for i in 0..8u8 {
        data.extend_from_slice(&[(8 - i) * 10; 32]);
    }

    let mut parallel = Vec::new();
    compress(Cursor::new(&data), &mut parallel, &DelayCodec, &config(32, 4)).unwrap();

    let mut sequential = Vec::new();
    compress(Cursor::new(&data), &mut sequential, &DelayCodec, &config(32, 1)).unwrap();

    assert_eq!(
        parallel, sequential,
        "parallel completion order must not leak into the container"
    );

    let payloads = frame_payloads(&parallel);
    assert_eq!(payloads.len(), 8);
    for (i, payload) in payloads.iter().enumerate() {
        assert_eq!(*payload, vec![(8 - i as u8) * 10; 32]);
    }
}

// ── concurrency bound ──────────────────────────────────────────────────────

/// Store codec that records how many invocations run simultaneously.
struct CountingCodec {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl CountingCodec {
    fn new() -> Self {
        Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

impl BlockCodec for CountingCodec {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.enter();
        let out = raw.to_vec();
        self.exit();
        Ok(out)
    }

    fn decompress_block(&self, encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.enter();
        let out = encoded.to_vec();
        self.exit();
        Ok(out)
    }
}

#[test]
fn test_concurrency_bound_is_respected() {
    let codec = CountingCodec::new();
    let data = compressible_bytes(10 * 256);

    let mut container = Vec::new();
    compress(Cursor::new(&data), &mut container, &codec, &config(256, 2)).unwrap();

    let peak = codec.peak.load(Ordering::SeqCst);
    assert!(peak >= 1, "at least one codec call must have run");
    assert!(
        peak <= 2,
        "10 blocks with 2 workers must never exceed 2 simultaneous codec calls, saw {}",
        peak
    );
}

// ── failure paths ──────────────────────────────────────────────────────────

#[test]
fn test_truncated_payload_fails_decompress() {
    let data = compressible_bytes(3 * 1024);
    let mut container = Vec::new();
    compress(
        Cursor::new(&data),
        &mut container,
        &GzipCodec::default(),
        &config(1024, 2),
    )
    .unwrap();

    // Cut the container mid-payload of the final frame.
    container.truncate(container.len() - 5);

    let mut out = Vec::new();
    let err = decompress(
        Cursor::new(&container),
        &mut out,
        &GzipCodec::default(),
        &config(1024, 2),
    )
    .unwrap_err();

    assert!(
        matches!(
            err,
            Error::Framing(FramingError::TruncatedPayload { .. })
        ),
        "expected TruncatedPayload, got: {err}"
    );
}

#[test]
fn test_truncated_length_field_fails_decompress() {
    let data = compressible_bytes(2 * 1024);
    let mut container = Vec::new();
    compress(
        Cursor::new(&data),
        &mut container,
        &GzipCodec::default(),
        &config(1024, 2),
    )
    .unwrap();

    // Keep frame 0 intact plus two stray bytes of frame 1's length field.
    let first_len =
        u32::from_be_bytes(container[..LEN_FIELD_WIDTH].try_into().unwrap()) as usize;
    container.truncate(LEN_FIELD_WIDTH + first_len + 2);

    let mut out = Vec::new();
    let err = decompress(
        Cursor::new(&container),
        &mut out,
        &GzipCodec::default(),
        &config(1024, 2),
    )
    .unwrap_err();

    assert!(
        matches!(err, Error::Framing(FramingError::TruncatedLength(2))),
        "expected TruncatedLength, got: {err}"
    );
}

#[test]
fn test_zero_length_field_is_rejected() {
    let container = vec![0u8; LEN_FIELD_WIDTH];
    let mut out = Vec::new();
    let err = decompress(
        Cursor::new(&container),
        &mut out,
        &GzipCodec::default(),
        &config(1024, 1),
    )
    .unwrap_err();

    assert!(
        matches!(err, Error::Framing(FramingError::ImplausibleLength(0))),
        "expected ImplausibleLength, got: {err}"
    );
}

#[test]
fn test_corrupt_payload_surfaces_codec_error() {
    let data = compressible_bytes(2 * 1024);
    let mut container = Vec::new();
    compress(
        Cursor::new(&data),
        &mut container,
        &GzipCodec::default(),
        &config(1024, 2),
    )
    .unwrap();

    // Scramble bytes inside the first frame's payload; framing stays valid.
    for b in &mut container[LEN_FIELD_WIDTH + 12..LEN_FIELD_WIDTH + 20] {
        *b ^= 0xFF;
    }

    let mut out = Vec::new();
    let err = decompress(
        Cursor::new(&container),
        &mut out,
        &GzipCodec::default(),
        &config(1024, 2),
    )
    .unwrap_err();

    assert!(
        matches!(err, Error::Codec(_)),
        "expected a codec error, got: {err}"
    );
}

// ── file wrappers ──────────────────────────────────────────────────────────

#[test]
fn test_file_round_trip() {
    let data = compressible_bytes(6 * 4096 + 321);
    let source = temp_path("file_rt_source");
    let container = temp_path("file_rt_container.sbc");
    let restored = temp_path("file_rt_restored");

    std::fs::write(&source, &data).unwrap();

    let cfg = config(4096, 4);
    let codec = GzipCodec::default();
    let summary = compress_file(&source, &container, &codec, &cfg).unwrap();
    assert_eq!(summary.blocks, 7);
    assert_eq!(summary.bytes_in, data.len() as u64);

    decompress_file(&container, &restored, &codec, &cfg).unwrap();
    assert_eq!(std::fs::read(&restored).unwrap(), data);

    for p in [&source, &container, &restored] {
        let _ = std::fs::remove_file(p);
    }
}

#[test]
fn test_failed_run_leaves_no_target_file() {
    let source = temp_path("delete_on_failure_source.sbc");
    let target = temp_path("delete_on_failure_target");

    // A length field promising 50 bytes that never arrive.
    let mut bogus = Vec::new();
    bogus.extend_from_slice(&50u32.to_be_bytes());
    bogus.extend_from_slice(&[1, 2, 3]);
    std::fs::write(&source, &bogus).unwrap();

    let err = decompress_file(&source, &target, &GzipCodec::default(), &config(1024, 2))
        .unwrap_err();
    assert!(matches!(err, Error::Framing(_)));
    assert!(
        !target.exists(),
        "a failed run must not leave a partial target behind"
    );

    let _ = std::fs::remove_file(&source);
}

#[test]
fn test_missing_source_is_terminal() {
    let err = compress_file(
        temp_path("does_not_exist"),
        temp_path("never_created"),
        &GzipCodec::default(),
        &config(1024, 2),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!temp_path("never_created").exists());
}
