//! `.tiktoken` vocabulary loader.
//!
//! Format: `<base64(token)><space|tab><rank>` per line. Ranks are skipped;
//! only token bytes matter for counting.

use std::fs;
use std::path::Path;
use std::time::Instant;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use rayon::prelude::*;
use tracing::info;

use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

/// Standard alphabet, padding optional, trailing bits tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

/// Decodes the token segment, stopping at the first non-alphabet byte.
/// A lone trailing sextet carries no full byte and is dropped.
fn decode_token(segment: &[u8]) -> Option<Vec<u8>> {
    let end = segment
        .iter()
        .position(|&b| !is_base64_byte(b))
        .unwrap_or(segment.len());
    let mut segment = &segment[..end];
    if segment.len() % 4 == 1 {
        segment = &segment[..segment.len() - 1];
    }
    LENIENT.decode(segment).ok().filter(|t| !t.is_empty())
}

fn decode_line(line: &[u8]) -> std::result::Result<Vec<u8>, &'static str> {
    let split = line
        .iter()
        .position(|&b| b == b' ' || b == b'\t')
        .ok_or("missing separator")?;
    decode_token(&line[..split]).ok_or("empty token")
}

/// Parses vocabulary text. `source` only labels errors.
pub fn parse(data: &[u8], source: &str) -> Result<Encoding> {
    let body = data.strip_suffix(b"\n").unwrap_or(data);
    let lines: Vec<&[u8]> = if body.is_empty() {
        Vec::new()
    } else {
        body.split(|&b| b == b'\n').collect()
    };

    let decoded: Vec<_> = lines.par_iter().map(|line| decode_line(line)).collect();

    let mut vocab = Vocabulary::with_capacity(decoded.len());
    for (i, token) in decoded.into_iter().enumerate() {
        let token = token.map_err(|reason| Error::InvalidVocabularyFile {
            path: source.to_string(),
            line: i + 1,
            reason,
        })?;
        vocab.insert(&token);
    }

    Ok(Encoding::new(vocab))
}

pub fn load(path: &Path) -> Result<Encoding> {
    let start = Instant::now();
    let data = fs::read(path).map_err(|source| Error::EncodingNotFound {
        path: path.display().to_string(),
        source,
    })?;
    let encoding = parse(&data, &path.display().to_string())?;
    info!(
        path = %path.display(),
        tokens = encoding.vocab().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded encoding"
    );
    Ok(encoding)
}
