//! Error types for inscription encoding and parsing.

use thiserror::Error;

use crate::cbor::CborError;
use crate::tag::Tag;

/// Errors from the inscription id codecs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InscriptionIdError {
    /// The text form has no `i` separator.
    #[error("missing `i` separator")]
    MissingSeparator,

    /// The part before the separator is not a txid.
    #[error("invalid txid `{0}`")]
    InvalidTxid(String),

    /// The part after the separator is not a canonical base-10 index.
    #[error("invalid index `{0}`")]
    InvalidIndex(String),

    /// The binary form is shorter than a txid or longer than txid + 4.
    #[error("binary form has invalid length {0}")]
    InvalidLength(usize),

    /// The binary index suffix carries trailing zero padding but is not the
    /// legacy fixed 4-byte encoding.
    #[error("binary index has trailing zero padding")]
    PaddedIndex,
}

/// Errors from encoding or decoding tag values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    /// A string-typed tag value is not valid UTF-8.
    #[error("{tag} value is not valid utf-8")]
    InvalidUtf8 { tag: Tag },

    /// A fixed-width tag value has the wrong length.
    #[error("{tag} value has invalid length {length}")]
    InvalidLength { tag: Tag, length: usize },

    /// The metadata value is not well-formed CBOR.
    #[error("metadata: {0}")]
    Metadata(#[from] CborError),

    /// A parent or delegate value is not a valid inscription id.
    #[error(transparent)]
    InscriptionId(#[from] InscriptionIdError),
}

/// Errors from envelope and witness parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// A reveal witness is `[signature, script, control block]`.
    #[error("witness has {0} elements, expected 3")]
    WrongWitnessShape(usize),

    /// An envelope header ended with a tag push that has no data push.
    #[error("tag without data in envelope header")]
    IncompleteTagPair,

    /// A tag stream inside an envelope did not decode.
    #[error(transparent)]
    Tag(#[from] TagError),
}
