//! Line codec for stored text files.
//!
//! The stored unit is an opaque stream of base64 fragments, not line-oriented
//! text. Writes accept chunks that the producer already cut from a single
//! base64 blob and store each one verbatim as a row. Reads concatenate every
//! row in line order and base64-decode the result exactly once. `encode` and
//! `decode` are therefore inverses over chunk sequences:
//!
//! ```text
//! decode(encode(chunks)) == base64_decode(concat(chunks))
//! ```
//!
//! Existing producers depend on this contract, so chunks are never re-encoded
//! or split on write.

use std::string::FromUtf8Error;

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use thiserror::Error;

use crate::ids::{ComponentId, FileType};

/// One persisted row of a text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub component_id: ComponentId,
    pub file_type: FileType,
    /// 1-based, contiguous per `(component_id, file_type)`.
    pub line_number: i64,
    pub encoded_line: String,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("stored content is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("stored content is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Turns submitted chunks into rows numbered `1..=chunks.len()` in input order.
pub fn encode<I, S>(chunks: I, component_id: ComponentId, file_type: &FileType) -> Vec<LineRecord>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    chunks
        .into_iter()
        .zip(1_i64..)
        .map(|(chunk, line_number)| LineRecord {
            component_id,
            file_type: file_type.clone(),
            line_number,
            encoded_line: chunk.into(),
        })
        .collect()
}

/// Reassembles a document from rows already ordered by `line_number`.
///
/// An empty slice decodes to an empty string.
pub fn decode(records: &[LineRecord]) -> Result<String, DecodeError> {
    let joined: String = records
        .iter()
        .map(|record| record.encoded_line.as_str())
        .collect();
    let bytes = decode_base64(&joined)?;
    Ok(String::from_utf8(bytes)?)
}

/// Padding is located by hand, so the engine only ever sees alphabet bytes
/// and tolerates non-zero bits in the final symbol.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes base64 the way the existing producers expect:
///
/// - bytes outside the standard alphabet are skipped;
/// - `=` only counts once a quantum has two or more symbols, and decoding
///   ends as soon as padding completes that quantum;
/// - stray `=` elsewhere is ignored;
/// - an unpadded partial quantum at the end is an error.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut symbols = Vec::with_capacity(input.len());
    let mut quad_pos = 0_usize;
    let mut pads = 0_usize;
    let mut terminated = false;

    for byte in input.bytes() {
        if byte == b'=' {
            if quad_pos >= 2 {
                pads += 1;
                if quad_pos + pads >= 4 {
                    terminated = true;
                    break;
                }
            }
            continue;
        }
        if byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'/') {
            symbols.push(byte);
            quad_pos = (quad_pos + 1) % 4;
        }
    }

    if !terminated && quad_pos >= 2 {
        return Err(base64::DecodeError::InvalidPadding);
    }
    LENIENT.decode(&symbols)
}
