//! Payload wire format: `gzip(document)` → standard base64 → fixed-size
//! text chunks. The node side reverses it with streaming readers so large
//! documents never have to sit in memory as one string.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{Result, SealbootError};
use crate::platform::fs::create_private;

/// Largest chunk text the parameter store accepts for a standard-tier entry.
pub const MAX_CHUNK_CHARS: usize = 4000;

/// Gzip-compress a bootstrap document.
pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| SealbootError::Decompression(e.to_string()))?;
    Ok(out)
}

pub fn encode(payload: &[u8]) -> String {
    STANDARD.encode(payload)
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| SealbootError::Encoding(e.to_string()))
}

/// `ceil(encoded_len / max_chars)`.
pub fn chunk_count(encoded_len: usize, max_chars: usize) -> usize {
    encoded_len.div_ceil(max_chars.max(1))
}

/// Partition encoded text into ordered chunks of at most `max_chars`.
/// Every chunk but the last is exactly `max_chars` long.
pub fn split_chunks(encoded: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::with_capacity(chunk_count(encoded.len(), max_chars));
    let mut rest = encoded;
    while !rest.is_empty() {
        let mut cut = max_chars.min(rest.len());
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Concatenate chunks in ascending index order.
pub fn reassemble<S: AsRef<str>>(chunks: &[S]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(chunk.as_ref());
    }
    out
}

/// Stream-decode base64 text in `src` into `dst`.
pub fn decode_file(src: &Path, dst: &Path) -> Result<()> {
    let input = BufReader::new(File::open(src)?);
    let mut decoder = base64::read::DecoderReader::new(input, &STANDARD);
    let mut output = BufWriter::new(create_private(dst, false)?);
    copy_with(&mut decoder, &mut output, SealbootError::Encoding)?;
    output.flush()?;
    Ok(())
}

/// Stream-decompress gzip data in `src` into `dst`.
pub fn gunzip_file(src: &Path, dst: &Path) -> Result<()> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(src)?));
    let mut output = BufWriter::new(create_private(dst, false)?);
    copy_with(&mut decoder, &mut output, SealbootError::Decompression)?;
    output.flush()?;
    Ok(())
}

/// Copy a decoding reader to a writer, attributing read-side failures to the
/// decoder and write-side failures to plain I/O.
fn copy_with(
    reader: &mut impl Read,
    writer: &mut impl Write,
    decode_err: fn(String) -> SealbootError,
) -> Result<u64> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(decode_err(e.to_string())),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
}
