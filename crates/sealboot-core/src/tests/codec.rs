use crate::codec::{
    MAX_CHUNK_CHARS, chunk_count, decode, decode_file, encode, gunzip, gunzip_file, gzip,
    reassemble, split_chunks,
};
use crate::error::SealbootError;
use crate::testutil::noisy_payload;

#[test]
fn round_trip_through_chunks() {
    let document = noisy_payload(20_000);
    let encoded = encode(&gzip(&document).unwrap());
    let chunks = split_chunks(&encoded, MAX_CHUNK_CHARS);
    assert!(chunks.len() > 1);

    let rebuilt = gunzip(&decode(&reassemble(&chunks)).unwrap()).unwrap();
    assert_eq!(rebuilt, document);
}

#[test]
fn chunks_respect_limit_and_count_formula() {
    let encoded = encode(&gzip(&noisy_payload(30_000)).unwrap());
    let chunks = split_chunks(&encoded, MAX_CHUNK_CHARS);

    assert_eq!(chunks.len(), chunk_count(encoded.len(), MAX_CHUNK_CHARS));
    assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_CHARS));
    let (last, full) = chunks.split_last().unwrap();
    assert!(full.iter().all(|c| c.len() == MAX_CHUNK_CHARS));
    assert!(!last.is_empty());
}

#[test]
fn split_12001_chars_into_four_chunks() {
    let encoded = "A".repeat(12_001);
    let lengths: Vec<usize> = split_chunks(&encoded, 4000).iter().map(|c| c.len()).collect();
    assert_eq!(lengths, vec![4000, 4000, 4000, 1]);
    assert_eq!(chunk_count(12_001, 4000), 4);
}

#[test]
fn exact_multiple_has_no_trailing_empty_chunk() {
    let encoded = "B".repeat(8000);
    assert_eq!(split_chunks(&encoded, 4000).len(), 2);
    assert!(split_chunks("", 4000).is_empty());
}

#[test]
fn decode_rejects_invalid_base64() {
    assert!(matches!(decode("not base64!!"), Err(SealbootError::Encoding(_))));
}

#[test]
fn gunzip_rejects_garbage() {
    assert!(matches!(
        gunzip(b"definitely not gzip"),
        Err(SealbootError::Decompression(_))
    ));
}

#[test]
fn streaming_decoders_match_in_memory_ones() {
    let tmp = tempfile::tempdir().unwrap();
    let document = b"#cloud-config\nruncmd:\n  - echo hello\n".repeat(200);
    let encoded = encode(&gzip(&document).unwrap());

    let b64 = tmp.path().join("doc.b64.gz");
    let gz = tmp.path().join("doc.gz");
    let out = tmp.path().join("doc");
    std::fs::write(&b64, &encoded).unwrap();

    decode_file(&b64, &gz).unwrap();
    gunzip_file(&gz, &out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), document);
}

#[test]
fn decode_file_reports_encoding_error() {
    let tmp = tempfile::tempdir().unwrap();
    let b64 = tmp.path().join("bad.b64.gz");
    std::fs::write(&b64, "@@@@").unwrap();
    let err = decode_file(&b64, &tmp.path().join("bad.gz")).unwrap_err();
    assert!(matches!(err, SealbootError::Encoding(_)), "got: {err}");
}

#[test]
fn gunzip_file_reports_decompression_error() {
    let tmp = tempfile::tempdir().unwrap();
    let gz = tmp.path().join("bad.gz");
    std::fs::write(&gz, b"plain text, not gzip").unwrap();
    let err = gunzip_file(&gz, &tmp.path().join("bad")).unwrap_err();
    assert!(matches!(err, SealbootError::Decompression(_)), "got: {err}");
}
