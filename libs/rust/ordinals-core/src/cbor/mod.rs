//! Restricted CBOR profile (RFC 8949) for inscription metadata.
//!
//! The `metadata` tag of an inscription carries one CBOR item. This module
//! implements the profile the envelope format relies on:
//!
//! - **Encode** is canonical: minimal-width integer and length heads, no
//!   indefinite-length items, no tagged values, and a fixed float policy
//!   (half precision only for NaN, ±Inf, and -0; single precision when the
//!   value survives an `f32` round trip; double otherwise).
//! - **Decode** is liberal: any argument width, indefinite strings, arrays,
//!   and maps, and tagged values surfaced as [`Value::Tag`].
//!
//! Both directions are pure functions over byte slices; nothing here touches
//! the script layer.

mod decode;
mod encode;
mod value;

use thiserror::Error;

pub use value::Value;

/// Errors from the CBOR codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CborError {
    /// Input ended in the middle of an item.
    #[error("input ended before the value was complete")]
    UnexpectedEnd,

    /// Reserved additional-information value in a head.
    #[error("unknown additional information {0}")]
    UnknownAdditionalInfo(u8),

    /// Break code outside an indefinite-length item.
    #[error("break outside an indefinite-length item")]
    UnexpectedBreak,

    /// Chunk of an indefinite-length string with the wrong type.
    #[error("indefinite-length chunk head {0:#04x} does not match the enclosing string type")]
    InvalidIndefiniteChunk(u8),

    /// Simple value outside false/true/null/undefined.
    #[error("unsupported simple value {0}")]
    UnsupportedSimple(u8),

    /// Declared length does not fit in memory.
    #[error("length {0} exceeds addressable memory")]
    LengthOverflow(u64),

    /// Integer outside the wire range `[-2^64, 2^64-1]`.
    #[error("integer {0} is outside the encodable range")]
    IntegerOverflow(i128),

    /// Tagged values cannot be encoded, only decoded.
    #[error("tagged value {0} cannot be encoded")]
    TagEncode(u64),

    /// Text string with invalid UTF-8.
    #[error("text string is not valid utf-8")]
    InvalidUtf8,

    /// Input continued after a complete item.
    #[error("{0} bytes of trailing input after the value")]
    TrailingBytes(usize),

    /// Nesting deeper than the decoder is willing to follow.
    #[error("nesting exceeds the supported depth")]
    DepthLimit,
}

/// Encode a value to canonical CBOR bytes.
pub fn encode(value: &Value) -> Result<Vec<u8>, CborError> {
    let mut out = Vec::new();
    encode::encode_value(value, &mut out)?;
    Ok(out)
}

/// Decode a single CBOR item, consuming the whole input.
pub fn decode(input: &[u8]) -> Result<Value, CborError> {
    let mut decoder = decode::Decoder::new(input);
    let value = decoder.decode_value()?;
    if decoder.remaining() != 0 {
        return Err(CborError::TrailingBytes(decoder.remaining()));
    }
    Ok(value)
}
