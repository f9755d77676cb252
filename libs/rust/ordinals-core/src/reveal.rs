//! Taproot reveal scripts.
//!
//! A reveal output commits to a leaf script of the form
//!
//! ```text
//! <pubkey> OP_CHECKSIG
//! <envelope 1>
//! <envelope 2>
//! ...
//! ```
//!
//! The envelopes are pure data (`OP_0 OP_IF ... OP_ENDIF` never executes),
//! so the script is an ordinary key-spend check with the inscriptions along
//! for the ride. [`OrdinalReveal`] recognizes exactly this shape, emits it,
//! and finalizes the script-path witness for it; on anything else it returns
//! `None` so other recognizers in a dispatch table can have a turn.

use bitcoin::opcodes::all::{OP_CHECKSIG, OP_ENDIF, OP_IF};
use bitcoin::script::{Builder, Instruction, PushBytesBuf};
use bitcoin::taproot::Signature;
use bitcoin::{Script, ScriptBuf, XOnlyPublicKey};

use crate::envelope::{extract_inscription, instruction_list, raw_envelopes, Inscription};
use crate::error::TagError;
use crate::tag::encode_tags;
use crate::{MAX_PUSH_SIZE, PROTOCOL_ID};

/// Build the reveal leaf script for a key and a batch of inscriptions.
///
/// Zero inscriptions produce exactly `<pubkey> OP_CHECKSIG`.
pub fn p2tr_ord_reveal(
    pubkey: &XOnlyPublicKey,
    inscriptions: &[Inscription],
) -> Result<ScriptBuf, TagError> {
    let mut builder = Builder::new()
        .push_slice(pubkey.serialize())
        .push_opcode(OP_CHECKSIG);
    for inscription in inscriptions {
        builder = append_envelope(builder, inscription)?;
    }
    Ok(builder.into_script())
}

fn append_envelope(mut builder: Builder, inscription: &Inscription) -> Result<Builder, TagError> {
    builder = builder
        .push_slice([])
        .push_opcode(OP_IF)
        .push_slice(PROTOCOL_ID);
    for (tag, data) in encode_tags(&inscription.tags)? {
        builder = builder.push_slice(push_buf(tag)).push_slice(push_buf(data));
    }
    // The body separator is always emitted, even for an empty body.
    builder = builder.push_slice([]);
    for chunk in inscription.body.chunks(MAX_PUSH_SIZE) {
        builder = builder.push_slice(push_buf(chunk.to_vec()));
    }
    Ok(builder.push_opcode(OP_ENDIF))
}

fn push_buf(data: Vec<u8>) -> PushBytesBuf {
    PushBytesBuf::try_from(data).expect("push data length fits in u32")
}

/// A recognized reveal leaf script: the key that can spend it and the
/// inscriptions it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalReveal {
    pub pubkey: XOnlyPublicKey,
    pub inscriptions: Vec<Inscription>,
}

impl OrdinalReveal {
    pub fn new(pubkey: XOnlyPublicKey, inscriptions: Vec<Inscription>) -> Self {
        Self {
            pubkey,
            inscriptions,
        }
    }

    /// Recognize a reveal leaf script.
    ///
    /// The script must be `<32-byte key> OP_CHECKSIG` followed by nothing
    /// but well-formed envelopes, back to back, ending at the last
    /// `OP_ENDIF`, with no pushnum or stuttered envelopes. Any deviation is
    /// `None`, never an error.
    pub fn recognize(script: &Script) -> Option<Self> {
        let instructions = instruction_list(script)?;

        let pubkey = match instructions.first()? {
            Instruction::PushBytes(push) if push.len() == 32 => {
                XOnlyPublicKey::from_slice(push.as_bytes()).ok()?
            }
            _ => return None,
        };
        if instructions.get(1) != Some(&Instruction::Op(OP_CHECKSIG)) {
            return None;
        }

        let envelopes = raw_envelopes(&instructions);
        if envelopes.is_empty() {
            return (instructions.len() == 2).then(|| Self::new(pubkey, Vec::new()));
        }

        let mut expected_start = 2;
        for envelope in &envelopes {
            if envelope.start != expected_start || envelope.pushnum || envelope.stutter {
                return None;
            }
            expected_start = envelope.end + 1;
        }
        if expected_start != instructions.len() {
            return None;
        }

        let inscriptions = envelopes
            .iter()
            .map(extract_inscription)
            .collect::<Result<Vec<_>, _>>()
            .ok()?;

        Some(Self::new(pubkey, inscriptions))
    }

    /// Emit the leaf script this descriptor recognizes.
    pub fn emit(&self) -> Result<ScriptBuf, TagError> {
        p2tr_ord_reveal(&self.pubkey, &self.inscriptions)
    }

    /// Finalize a taproot script-path spend of this leaf.
    ///
    /// Expects exactly one signature whose key matches the descriptor, and
    /// returns the two-element witness stack `[signature, leaf script]`;
    /// the control block is appended by the caller's taproot machinery.
    pub fn finalize_taproot(
        &self,
        leaf_script: &Script,
        signatures: &[(XOnlyPublicKey, Signature)],
    ) -> Option<Vec<Vec<u8>>> {
        match signatures {
            [(pubkey, signature)] if *pubkey == self.pubkey => {
                Some(vec![signature.to_vec(), leaf_script.to_bytes()])
            }
            _ => None,
        }
    }
}
