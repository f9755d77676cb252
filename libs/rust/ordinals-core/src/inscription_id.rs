//! Inscription ids.
//!
//! The text form is `<txid>i<index>` with the txid in display hex and the
//! index in base-10. The binary form carried by `parent` and `delegate` tags
//! is the txid in consensus byte order followed by the little-endian index
//! with trailing zero bytes removed, so index 0 is a bare 32-byte txid and
//! the longest form is 36 bytes.

use std::fmt;
use std::str::FromStr;

use bitcoin::hashes::Hash;
use bitcoin::Txid;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::InscriptionIdError;

/// Reference to an inscription: the reveal transaction and the position of
/// the inscription among that transaction's envelopes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct InscriptionId {
    pub txid: Txid,
    pub index: u32,
}

impl InscriptionId {
    /// Binary form: consensus txid bytes plus the trimmed little-endian
    /// index. The suffix is always the shortest encoding of the index.
    pub fn to_bytes(&self) -> Vec<u8> {
        let index = self.index.to_le_bytes();
        let mut suffix: &[u8] = &index;
        while suffix.last() == Some(&0) {
            suffix = &suffix[..suffix.len() - 1];
        }
        let mut bytes = self.txid.to_byte_array().to_vec();
        bytes.extend_from_slice(suffix);
        bytes
    }

    /// Parse the binary form. The index suffix must be either the canonical
    /// trimmed encoding or the legacy fixed 4-byte encoding; any other
    /// zero-padded suffix is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InscriptionIdError> {
        if bytes.len() < Txid::LEN || bytes.len() > Txid::LEN + 4 {
            return Err(InscriptionIdError::InvalidLength(bytes.len()));
        }

        let (txid, suffix) = bytes.split_at(Txid::LEN);

        if suffix.len() != 4 && suffix.last() == Some(&0) {
            return Err(InscriptionIdError::PaddedIndex);
        }

        let mut index = [0u8; 4];
        index[..suffix.len()].copy_from_slice(suffix);

        Ok(Self {
            txid: Txid::from_slice(txid).expect("txid slice is 32 bytes"),
            index: u32::from_le_bytes(index),
        })
    }
}

impl fmt::Display for InscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}i{}", self.txid, self.index)
    }
}

impl FromStr for InscriptionId {
    type Err = InscriptionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, index) = s
            .split_once('i')
            .ok_or(InscriptionIdError::MissingSeparator)?;

        let txid = txid
            .parse::<Txid>()
            .map_err(|_| InscriptionIdError::InvalidTxid(txid.into()))?;

        let value: u32 = index
            .parse()
            .map_err(|_| InscriptionIdError::InvalidIndex(index.into()))?;

        // The index must round-trip through base-10, so "01", "+1", and
        // other aliases of the same number are rejected.
        if value.to_string() != index {
            return Err(InscriptionIdError::InvalidIndex(index.into()));
        }

        Ok(Self { txid, index: value })
    }
}
