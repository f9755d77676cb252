//! Tag numbers and the typed tag codec.
//!
//! An envelope header is a stream of `(tag, data)` push pairs. Each known
//! tag number has a typed field and a wire codec; everything else is kept
//! verbatim. Odd unknown tags are ignorable and even ones are reserved, but
//! both are preserved so re-encoding reproduces the original stream.
//!
//! # Wire codecs
//!
//! | Tag | # | Encoding |
//! |-----|---|----------|
//! | content_type, metaprotocol, content_encoding, note | 1, 7, 9, 15 | UTF-8 bytes |
//! | pointer | 2 | 8-byte little-endian |
//! | parent (repeatable), delegate | 3, 11 | inscription id binary form |
//! | metadata | 5 | CBOR |
//! | rune | 13 | 16-byte little-endian |
//!
//! Values longer than [`MAX_PUSH_SIZE`](crate::MAX_PUSH_SIZE) are split into
//! chunks, one pair per chunk; on decode every occurrence of a tag is
//! concatenated before the value is decoded. `parent` is the exception in
//! both directions: one pair per parent, so an inscription can reference
//! several parents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cbor::{self, Value};
use crate::error::TagError;
use crate::inscription_id::InscriptionId;
use crate::MAX_PUSH_SIZE;

/// Known tag numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tag {
    ContentType = 1,
    Pointer = 2,
    Parent = 3,
    Metadata = 5,
    Metaprotocol = 7,
    ContentEncoding = 9,
    Delegate = 11,
    Rune = 13,
    Note = 15,
}

impl Tag {
    /// The single-byte push that carries this tag on the wire.
    pub fn bytes(self) -> [u8; 1] {
        [self as u8]
    }

    /// Match a tag push against the known numbers.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [1] => Some(Self::ContentType),
            [2] => Some(Self::Pointer),
            [3] => Some(Self::Parent),
            [5] => Some(Self::Metadata),
            [7] => Some(Self::Metaprotocol),
            [9] => Some(Self::ContentEncoding),
            [11] => Some(Self::Delegate),
            [13] => Some(Self::Rune),
            [15] => Some(Self::Note),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ContentType => "content_type",
            Self::Pointer => "pointer",
            Self::Parent => "parent",
            Self::Metadata => "metadata",
            Self::Metaprotocol => "metaprotocol",
            Self::ContentEncoding => "content_encoding",
            Self::Delegate => "delegate",
            Self::Rune => "rune",
            Self::Note => "note",
        };
        write!(f, "{name}")
    }
}

/// Typed view of an envelope header.
///
/// `unknown` holds every unrecognized `(tag, data)` pair verbatim, in the
/// order it appeared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tags {
    pub content_type: Option<String>,
    pub pointer: Option<u64>,
    pub parents: Vec<InscriptionId>,
    pub metadata: Option<Value>,
    pub metaprotocol: Option<String>,
    pub content_encoding: Option<String>,
    pub delegate: Option<InscriptionId>,
    pub rune: Option<u128>,
    pub note: Option<String>,
    pub unknown: Vec<(Vec<u8>, Vec<u8>)>,
}

/// Encode tags as an ordered `(tag, data)` pair stream.
///
/// Field order is part of the wire format: content type, pointer, parents,
/// metadata, metaprotocol, content encoding, delegate, rune, note, then the
/// unknown pairs in their original order.
pub fn encode_tags(tags: &Tags) -> Result<Vec<(Vec<u8>, Vec<u8>)>, TagError> {
    let mut pairs = Vec::new();

    append_chunked(
        &mut pairs,
        Tag::ContentType.bytes().to_vec(),
        tags.content_type.as_ref().map(|s| s.as_bytes().to_vec()),
    );
    append_chunked(
        &mut pairs,
        Tag::Pointer.bytes().to_vec(),
        tags.pointer.map(|pointer| pointer.to_le_bytes().to_vec()),
    );
    for parent in &tags.parents {
        append_chunked(&mut pairs, Tag::Parent.bytes().to_vec(), Some(parent.to_bytes()));
    }
    if let Some(metadata) = &tags.metadata {
        append_chunked(
            &mut pairs,
            Tag::Metadata.bytes().to_vec(),
            Some(cbor::encode(metadata)?),
        );
    }
    append_chunked(
        &mut pairs,
        Tag::Metaprotocol.bytes().to_vec(),
        tags.metaprotocol.as_ref().map(|s| s.as_bytes().to_vec()),
    );
    append_chunked(
        &mut pairs,
        Tag::ContentEncoding.bytes().to_vec(),
        tags.content_encoding.as_ref().map(|s| s.as_bytes().to_vec()),
    );
    append_chunked(
        &mut pairs,
        Tag::Delegate.bytes().to_vec(),
        tags.delegate.as_ref().map(InscriptionId::to_bytes),
    );
    append_chunked(
        &mut pairs,
        Tag::Rune.bytes().to_vec(),
        tags.rune.map(|rune| rune.to_le_bytes().to_vec()),
    );
    append_chunked(
        &mut pairs,
        Tag::Note.bytes().to_vec(),
        tags.note.as_ref().map(|s| s.as_bytes().to_vec()),
    );
    for (tag, data) in &tags.unknown {
        append_chunked(&mut pairs, tag.clone(), Some(data.clone()));
    }

    Ok(pairs)
}

fn append_chunked(pairs: &mut Vec<(Vec<u8>, Vec<u8>)>, tag: Vec<u8>, value: Option<Vec<u8>>) {
    let Some(value) = value else {
        return;
    };
    if value.is_empty() {
        pairs.push((tag, Vec::new()));
        return;
    }
    for chunk in value.chunks(MAX_PUSH_SIZE) {
        pairs.push((tag.clone(), chunk.to_vec()));
    }
}

/// Decode an ordered `(tag, data)` pair stream into typed tags.
///
/// Every occurrence of a known tag is concatenated in stream order before
/// its value is decoded, except `parent`, where each occurrence is one id.
pub fn decode_tags(pairs: &[(Vec<u8>, Vec<u8>)]) -> Result<Tags, TagError> {
    let mut tags = Tags::default();

    let mut content_type = Accumulator::default();
    let mut pointer = Accumulator::default();
    let mut metadata = Accumulator::default();
    let mut metaprotocol = Accumulator::default();
    let mut content_encoding = Accumulator::default();
    let mut delegate = Accumulator::default();
    let mut rune = Accumulator::default();
    let mut note = Accumulator::default();

    for (tag, data) in pairs {
        match Tag::from_bytes(tag) {
            Some(Tag::ContentType) => content_type.extend(data),
            Some(Tag::Pointer) => pointer.extend(data),
            Some(Tag::Parent) => tags.parents.push(InscriptionId::from_bytes(data)?),
            Some(Tag::Metadata) => metadata.extend(data),
            Some(Tag::Metaprotocol) => metaprotocol.extend(data),
            Some(Tag::ContentEncoding) => content_encoding.extend(data),
            Some(Tag::Delegate) => delegate.extend(data),
            Some(Tag::Rune) => rune.extend(data),
            Some(Tag::Note) => note.extend(data),
            None => tags.unknown.push((tag.clone(), data.clone())),
        }
    }

    tags.content_type = content_type.into_string(Tag::ContentType)?;
    tags.pointer = pointer.into_u64(Tag::Pointer)?;
    tags.metadata = metadata.into_metadata()?;
    tags.metaprotocol = metaprotocol.into_string(Tag::Metaprotocol)?;
    tags.content_encoding = content_encoding.into_string(Tag::ContentEncoding)?;
    tags.delegate = delegate.into_inscription_id()?;
    tags.rune = rune.into_u128(Tag::Rune)?;
    tags.note = note.into_string(Tag::Note)?;

    Ok(tags)
}

/// Concatenated data of one tag's occurrences, in stream order.
#[derive(Default)]
struct Accumulator(Option<Vec<u8>>);

impl Accumulator {
    fn extend(&mut self, data: &[u8]) {
        self.0.get_or_insert_with(Vec::new).extend_from_slice(data);
    }

    fn into_string(self, tag: Tag) -> Result<Option<String>, TagError> {
        self.0
            .map(|data| String::from_utf8(data).map_err(|_| TagError::InvalidUtf8 { tag }))
            .transpose()
    }

    fn into_u64(self, tag: Tag) -> Result<Option<u64>, TagError> {
        self.0
            .map(|data| {
                let bytes: [u8; 8] = data
                    .as_slice()
                    .try_into()
                    .map_err(|_| TagError::InvalidLength { tag, length: data.len() })?;
                Ok(u64::from_le_bytes(bytes))
            })
            .transpose()
    }

    fn into_u128(self, tag: Tag) -> Result<Option<u128>, TagError> {
        self.0
            .map(|data| {
                let bytes: [u8; 16] = data
                    .as_slice()
                    .try_into()
                    .map_err(|_| TagError::InvalidLength { tag, length: data.len() })?;
                Ok(u128::from_le_bytes(bytes))
            })
            .transpose()
    }

    fn into_metadata(self) -> Result<Option<Value>, TagError> {
        self.0
            .map(|data| cbor::decode(&data).map_err(TagError::from))
            .transpose()
    }

    fn into_inscription_id(self) -> Result<Option<InscriptionId>, TagError> {
        self.0
            .map(|data| InscriptionId::from_bytes(&data).map_err(TagError::from))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;
    use bitcoin::Txid;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cbor::Value;
    use crate::error::InscriptionIdError;

    fn parent(byte: u8) -> InscriptionId {
        InscriptionId {
            txid: Txid::from_byte_array([byte; 32]),
            index: 1,
        }
    }

    #[test]
    fn test_field_order_is_canonical() {
        let tags = Tags {
            content_type: Some("text/plain".into()),
            pointer: Some(1),
            parents: vec![parent(1), parent(2)],
            metadata: Some(Value::Null),
            metaprotocol: Some("brc-20".into()),
            content_encoding: Some("br".into()),
            delegate: Some(parent(3)),
            rune: Some(1),
            note: Some("gift".into()),
            unknown: vec![(vec![17], vec![0xab]), (vec![19], vec![0xcd])],
        };

        let numbers: Vec<Vec<u8>> = encode_tags(&tags)
            .unwrap()
            .into_iter()
            .map(|(tag, _)| tag)
            .collect();

        assert_eq!(
            numbers,
            vec![
                vec![1],
                vec![2],
                vec![3],
                vec![3],
                vec![5],
                vec![7],
                vec![9],
                vec![11],
                vec![13],
                vec![15],
                vec![17],
                vec![19],
            ]
        );
    }

    #[test]
    fn test_round_trip() {
        let tags = Tags {
            content_type: Some("application/json".into()),
            pointer: Some(513),
            parents: vec![parent(1), parent(2)],
            metadata: Some(Value::Map(vec![("n".into(), Value::Integer(1))])),
            metaprotocol: None,
            content_encoding: Some("br".into()),
            delegate: Some(parent(9)),
            rune: Some(u128::MAX),
            note: None,
            unknown: vec![(vec![255], vec![1, 2, 3]), (vec![255], vec![4])],
        };

        assert_eq!(decode_tags(&encode_tags(&tags).unwrap()).unwrap(), tags);
    }

    #[test]
    fn test_pointer_and_rune_are_fixed_width() {
        let pairs = encode_tags(&Tags {
            pointer: Some(1),
            rune: Some(1),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(pairs[0], (vec![2], vec![1, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(
            pairs[1],
            (vec![13], [1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0].to_vec())
        );

        assert_eq!(
            decode_tags(&[(vec![2], vec![1, 2, 3])]),
            Err(TagError::InvalidLength {
                tag: Tag::Pointer,
                length: 3,
            })
        );
    }

    #[test]
    fn test_long_values_are_chunked() {
        let metadata = Value::Bytes(vec![0xee; 700]);
        let encoded = cbor::encode(&metadata).unwrap();
        assert!(encoded.len() > MAX_PUSH_SIZE);

        let tags = Tags {
            metadata: Some(metadata),
            ..Default::default()
        };
        let pairs = encode_tags(&tags).unwrap();

        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|(tag, _)| tag == &[5]));
        assert!(pairs.iter().all(|(_, data)| data.len() <= MAX_PUSH_SIZE));
        assert_eq!([&pairs[0].1[..], &pairs[1].1[..]].concat(), encoded);

        // Reassembly concatenates the chunks before decoding.
        assert_eq!(decode_tags(&pairs).unwrap(), tags);
    }

    #[test]
    fn test_each_parent_pair_is_one_id() {
        let pairs = vec![
            (vec![3], parent(1).to_bytes()),
            (vec![3], parent(2).to_bytes()),
        ];

        assert_eq!(
            decode_tags(&pairs).unwrap().parents,
            vec![parent(1), parent(2)]
        );

        assert_eq!(
            decode_tags(&[(vec![3], vec![1, 2, 3])]),
            Err(TagError::InscriptionId(InscriptionIdError::InvalidLength(3)))
        );
    }

    #[test]
    fn test_unknown_tags_survive_verbatim() {
        let pairs = vec![
            (vec![99], vec![1]),
            (vec![4], vec![2]),
            (vec![99], vec![3]),
        ];

        let tags = decode_tags(&pairs).unwrap();
        assert_eq!(tags.unknown, pairs);
        assert_eq!(encode_tags(&tags).unwrap(), pairs);
    }

    #[test]
    fn test_split_known_tag_is_concatenated() {
        let pairs = vec![
            (vec![1], b"text/".to_vec()),
            (vec![9], b"b".to_vec()),
            (vec![1], b"plain".to_vec()),
            (vec![9], b"r".to_vec()),
        ];

        let tags = decode_tags(&pairs).unwrap();
        assert_eq!(tags.content_type.as_deref(), Some("text/plain"));
        assert_eq!(tags.content_encoding.as_deref(), Some("br"));
    }

    #[test]
    fn test_empty_value_is_one_empty_pair() {
        let tags = Tags {
            content_type: Some(String::new()),
            ..Default::default()
        };
        let pairs = encode_tags(&tags).unwrap();
        assert_eq!(pairs, vec![(vec![1], Vec::new())]);
        assert_eq!(decode_tags(&pairs).unwrap(), tags);
    }

    #[test]
    fn test_invalid_utf8_content_type() {
        assert_eq!(
            decode_tags(&[(vec![1], vec![0xff])]),
            Err(TagError::InvalidUtf8 {
                tag: Tag::ContentType,
            })
        );
    }
}
