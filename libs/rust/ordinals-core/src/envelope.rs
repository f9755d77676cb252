//! Inscription envelopes.
//!
//! An envelope is the framing that carries one inscription inside a
//! tapscript:
//!
//! ```text
//! OP_0
//! OP_IF
//!   OP_PUSH "ord"        // protocol id
//!   OP_PUSH <tag>        // (tag, data) pairs
//!   OP_PUSH <data>
//!   ...
//!   OP_0                 // body separator
//!   OP_PUSH <chunk_1>    // body in 520-byte chunks
//!   OP_PUSH <chunk_2>
//!   ...
//! OP_ENDIF
//! ```
//!
//! The scanner accepts more than the builder emits: small-integer opcodes
//! inside the payload are re-materialized as data pushes (`pushnum`), and a
//! doubled `OP_0` around the envelope opening is tolerated (`stutter`).
//! Either marks the resulting inscription as cursed. Any other opcode inside
//! the payload abandons the envelope without emitting it.

use bitcoin::opcodes::all::{OP_ENDIF, OP_IF, OP_PUSHNUM_1, OP_PUSHNUM_16, OP_PUSHNUM_NEG1};
use bitcoin::opcodes::Opcode;
use bitcoin::script::Instruction;
use bitcoin::{Script, Transaction};

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;
use crate::reveal::OrdinalReveal;
use crate::tag::{decode_tags, Tags};
use crate::PROTOCOL_ID;

/// One inscription: its typed tags, its body, and whether recovering it
/// required non-canonical script (pushnum opcodes or a stuttered opening).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Inscription {
    pub tags: Tags,
    pub body: Vec<u8>,
    pub cursed: bool,
}

impl Inscription {
    /// Convenience constructor for the common content-type-plus-body case.
    pub fn new(content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            tags: Tags {
                content_type,
                ..Default::default()
            },
            body,
            cursed: false,
        }
    }
}

/// One envelope located in a script, before tag decoding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawEnvelope {
    /// Pushes between the protocol id and `OP_ENDIF`, with pushnum opcodes
    /// re-materialized as single-byte pushes.
    pub(crate) payload: Vec<Vec<u8>>,
    pub(crate) pushnum: bool,
    pub(crate) stutter: bool,
    /// Instruction index of the opening `OP_0`.
    pub(crate) start: usize,
    /// Instruction index of the closing `OP_ENDIF`.
    pub(crate) end: usize,
}

/// Parse every inscription in a script.
///
/// Non-strict parsing recovers whatever it can: envelopes that fail tag
/// extraction are skipped and the rest are still returned, so the result is
/// `None` only when the script's instruction stream itself does not decode.
/// Strict parsing recognizes the reveal-script shape (see
/// [`OrdinalReveal::recognize`]) and returns `None` on any deviation.
pub fn parse_inscriptions(script: &Script, strict: bool) -> Option<Vec<Inscription>> {
    if strict {
        return OrdinalReveal::recognize(script).map(|reveal| reveal.inscriptions);
    }

    let instructions = instruction_list(script)?;
    Some(
        raw_envelopes(&instructions)
            .iter()
            .filter_map(|envelope| extract_inscription(envelope).ok())
            .collect(),
    )
}

/// Parse the inscriptions revealed by a taproot script-path witness.
///
/// The witness must be the three-element reveal shape `[signature, script,
/// control block]`; the script element is parsed non-strictly.
pub fn parse_witness(witness: &[Vec<u8>]) -> Result<Option<Vec<Inscription>>, EnvelopeError> {
    if witness.len() != 3 {
        return Err(EnvelopeError::WrongWitnessShape(witness.len()));
    }
    Ok(parse_inscriptions(Script::from_bytes(&witness[1]), false))
}

/// Parse every inscription revealed by a transaction, in input order.
pub fn parse_transaction(transaction: &Transaction) -> Vec<Inscription> {
    transaction
        .input
        .iter()
        .filter_map(|input| input.witness.tapscript())
        .filter_map(|tapscript| parse_inscriptions(tapscript, false))
        .flatten()
        .collect()
}

/// Decode a script into instructions, or `None` if it is malformed.
pub(crate) fn instruction_list(script: &Script) -> Option<Vec<Instruction>> {
    script.instructions().collect::<Result<Vec<_>, _>>().ok()
}

fn is_empty_push(instruction: &Instruction) -> bool {
    matches!(instruction, Instruction::PushBytes(push) if push.is_empty())
}

fn is_empty_push_at(instructions: &[Instruction], index: usize) -> bool {
    instructions.get(index).is_some_and(is_empty_push)
}

/// The byte a small-integer opcode pushes, if it is one.
fn pushnum_byte(opcode: Opcode) -> Option<u8> {
    if opcode == OP_PUSHNUM_NEG1 {
        return Some(0x81);
    }
    let code = opcode.to_u8();
    if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&code) {
        Some(code - OP_PUSHNUM_1.to_u8() + 1)
    } else {
        None
    }
}

enum Scan {
    Found(RawEnvelope),
    Abort {
        /// Instruction index where the outer scan continues.
        resume: usize,
        /// Whether the failure leaves a stutter hint for the next attempt.
        stutter: bool,
    },
}

/// Locate every envelope in an instruction stream.
pub(crate) fn raw_envelopes(instructions: &[Instruction]) -> Vec<RawEnvelope> {
    let mut envelopes = Vec::new();
    let mut stuttered = false;
    let mut cursor = 0;

    while cursor < instructions.len() {
        if !is_empty_push(&instructions[cursor]) {
            cursor += 1;
            continue;
        }
        match envelope_at(instructions, cursor, stuttered) {
            Scan::Found(envelope) => {
                cursor = envelope.end + 1;
                stuttered = false;
                envelopes.push(envelope);
            }
            Scan::Abort { resume, stutter } => {
                cursor = resume;
                stuttered = stutter;
            }
        }
    }

    envelopes
}

/// Try to read one envelope whose opening `OP_0` sits at `start`.
fn envelope_at(instructions: &[Instruction], start: usize, stutter: bool) -> Scan {
    if instructions.get(start + 1) != Some(&Instruction::Op(OP_IF)) {
        return Scan::Abort {
            resume: start + 1,
            stutter: is_empty_push_at(instructions, start + 1),
        };
    }

    let protocol = matches!(
        instructions.get(start + 2),
        Some(Instruction::PushBytes(push)) if push.as_bytes() == PROTOCOL_ID.as_slice()
    );
    if !protocol {
        return Scan::Abort {
            resume: start + 2,
            stutter: is_empty_push_at(instructions, start + 2),
        };
    }

    let mut pushnum = false;
    let mut payload = Vec::new();

    for (index, instruction) in instructions.iter().enumerate().skip(start + 3) {
        match instruction {
            Instruction::Op(opcode) if *opcode == OP_ENDIF => {
                return Scan::Found(RawEnvelope {
                    payload,
                    pushnum,
                    stutter,
                    start,
                    end: index,
                });
            }
            Instruction::Op(opcode) => match pushnum_byte(*opcode) {
                Some(byte) => {
                    pushnum = true;
                    payload.push(vec![byte]);
                }
                None => {
                    return Scan::Abort {
                        resume: index + 1,
                        stutter: false,
                    }
                }
            },
            Instruction::PushBytes(push) => payload.push(push.as_bytes().to_vec()),
        }
    }

    // Ran off the end without OP_ENDIF.
    Scan::Abort {
        resume: instructions.len(),
        stutter: false,
    }
}

/// Split an envelope payload into tag pairs and body, and decode the tags.
pub(crate) fn extract_inscription(envelope: &RawEnvelope) -> Result<Inscription, EnvelopeError> {
    let payload = &envelope.payload;

    // The body separator is an empty push in tag position.
    let separator = payload
        .iter()
        .enumerate()
        .position(|(index, push)| index % 2 == 0 && push.is_empty());

    let header = &payload[..separator.unwrap_or(payload.len())];
    let mut chunks = header.chunks_exact(2);
    let mut pairs = Vec::with_capacity(header.len() / 2);
    for pair in &mut chunks {
        pairs.push((pair[0].clone(), pair[1].clone()));
    }
    if !chunks.remainder().is_empty() {
        return Err(EnvelopeError::IncompleteTagPair);
    }

    let tags = decode_tags(&pairs)?;
    let body = separator
        .map(|index| payload[index + 1..].concat())
        .unwrap_or_default();

    Ok(Inscription {
        tags,
        body,
        cursed: envelope.pushnum || envelope.stutter,
    })
}
