//! Ordinals Inscription Core Library
//!
//! This crate provides the codecs at the heart of Bitcoin Ordinals
//! inscriptions: arbitrary payloads embedded in a taproot leaf script and
//! revealed on-chain by spending the committed output.
//!
//! # Features
//!
//! - **Envelope codec**: parse and produce the `OP_0 OP_IF "ord" ... OP_ENDIF`
//!   framing, including chunked bodies, multi-envelope scripts, and cursed
//!   detection (pushnum opcodes, stuttered openings)
//! - **Tag codec**: typed tag fields (content type, pointer, parents,
//!   metadata, delegate, rune, ...) with unknown tags preserved verbatim
//! - **CBOR codec**: the restricted RFC 8949 profile used for inscription
//!   metadata
//! - **Reveal scripts**: build the `<pubkey> OP_CHECKSIG` reveal leaf,
//!   recognize it during spending, and finalize its script-path witness
//!
//! # Example
//!
//! ```
//! use ordinals_core::{p2tr_ord_reveal, parse_inscriptions, Inscription};
//!
//! let pubkey = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
//!     .parse()
//!     .unwrap();
//!
//! let inscription = Inscription::new(
//!     Some("text/plain;charset=utf-8".into()),
//!     b"Hello, world!".to_vec(),
//! );
//!
//! let script = p2tr_ord_reveal(&pubkey, &[inscription.clone()]).unwrap();
//! assert_eq!(parse_inscriptions(&script, true), Some(vec![inscription]));
//! ```
//!
//! The crate is purely computational: no I/O, no global state, and every
//! operation is a deterministic function of its inputs. Wallet concerns
//! (key handling, fee estimation, UTXO selection, transports) live in the
//! layers above.

pub mod cbor;
mod envelope;
mod error;
mod inscription_id;
mod reveal;
mod tag;

pub use envelope::*;
pub use error::*;
pub use inscription_id::*;
pub use reveal::*;
pub use tag::*;

/// Protocol marker pushed right after `OP_IF` in every envelope: `"ord"`.
pub const PROTOCOL_ID: [u8; 3] = *b"ord";

/// Maximum size of a tapscript element; tag values and bodies longer than
/// this are split into chunks.
pub const MAX_PUSH_SIZE: usize = 520;
