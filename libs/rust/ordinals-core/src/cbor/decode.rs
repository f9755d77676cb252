//! CBOR decoder.
//!
//! Accepts any argument width plus the indefinite-length forms the canonical
//! encoder never emits: chunked byte/text strings and indefinite arrays and
//! maps. Tags surface as [`Value::Tag`]; simple values outside 20..=23 and
//! the reserved additional-info values are rejected.

use super::{CborError, Value};

/// Nesting bound so hostile input cannot exhaust the stack.
const MAX_DEPTH: usize = 128;

pub(super) struct Decoder<'a> {
    input: &'a [u8],
    position: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub(super) fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            depth: 0,
        }
    }

    pub(super) fn remaining(&self) -> usize {
        self.input.len() - self.position
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn read_byte(&mut self) -> Result<u8, CborError> {
        let byte = self.peek().ok_or(CborError::UnexpectedEnd)?;
        self.position += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, length: usize) -> Result<&'a [u8], CborError> {
        let end = self
            .position
            .checked_add(length)
            .filter(|end| *end <= self.input.len())
            .ok_or(CborError::UnexpectedEnd)?;
        let slice = &self.input[self.position..end];
        self.position = end;
        Ok(slice)
    }

    /// Read the argument for a head with the given additional info.
    fn read_argument(&mut self, info: u8) -> Result<u64, CborError> {
        match info {
            0..=23 => Ok(u64::from(info)),
            24 => Ok(u64::from(self.read_byte()?)),
            25 => {
                let bytes = self.read_slice(2)?;
                Ok(u64::from(u16::from_be_bytes([bytes[0], bytes[1]])))
            }
            26 => {
                let bytes: [u8; 4] = self.read_slice(4)?.try_into().expect("4-byte slice");
                Ok(u64::from(u32::from_be_bytes(bytes)))
            }
            27 => {
                let bytes: [u8; 8] = self.read_slice(8)?.try_into().expect("8-byte slice");
                Ok(u64::from_be_bytes(bytes))
            }
            _ => Err(CborError::UnknownAdditionalInfo(info)),
        }
    }

    fn read_length(&mut self, info: u8) -> Result<usize, CborError> {
        let argument = self.read_argument(info)?;
        usize::try_from(argument).map_err(|_| CborError::LengthOverflow(argument))
    }

    pub(super) fn decode_value(&mut self) -> Result<Value, CborError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CborError::DepthLimit);
        }
        let value = self.decode_item();
        self.depth -= 1;
        value
    }

    fn decode_item(&mut self) -> Result<Value, CborError> {
        let head = self.read_byte()?;
        let major = head >> 5;
        let info = head & 0x1f;
        match major {
            0 => Ok(Value::Integer(i128::from(self.read_argument(info)?))),
            1 => Ok(Value::Integer(-1 - i128::from(self.read_argument(info)?))),
            2 => self.decode_string(2, info).map(Value::Bytes),
            3 => String::from_utf8(self.decode_string(3, info)?)
                .map(Value::Text)
                .map_err(|_| CborError::InvalidUtf8),
            4 => self.decode_array(info),
            5 => self.decode_map(info),
            6 => {
                let number = self.read_argument(info)?;
                let inner = self.decode_value()?;
                Ok(Value::Tag(number, Box::new(inner)))
            }
            _ => self.decode_simple(info),
        }
    }

    fn decode_string(&mut self, major: u8, info: u8) -> Result<Vec<u8>, CborError> {
        if info != 31 {
            let length = self.read_length(info)?;
            return Ok(self.read_slice(length)?.to_vec());
        }

        // Indefinite string: definite-length chunks of the same major type
        // up to the break code.
        let mut data = Vec::new();
        loop {
            let head = self.read_byte()?;
            if head == 0xff {
                return Ok(data);
            }
            if head >> 5 != major || head & 0x1f == 31 {
                return Err(CborError::InvalidIndefiniteChunk(head));
            }
            let length = self.read_length(head & 0x1f)?;
            data.extend_from_slice(self.read_slice(length)?);
        }
    }

    fn decode_array(&mut self, info: u8) -> Result<Value, CborError> {
        let mut items = Vec::new();
        if info == 31 {
            while self.peek() != Some(0xff) {
                items.push(self.decode_value()?);
            }
            self.read_byte()?;
        } else {
            for _ in 0..self.read_length(info)? {
                items.push(self.decode_value()?);
            }
        }
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self, info: u8) -> Result<Value, CborError> {
        let mut entries = Vec::new();
        if info == 31 {
            while self.peek() != Some(0xff) {
                let key = self.decode_value()?;
                let value = self.decode_value()?;
                entries.push((key, value));
            }
            self.read_byte()?;
        } else {
            for _ in 0..self.read_length(info)? {
                let key = self.decode_value()?;
                let value = self.decode_value()?;
                entries.push((key, value));
            }
        }
        Ok(Value::Map(entries))
    }

    fn decode_simple(&mut self, info: u8) -> Result<Value, CborError> {
        match info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            23 => Ok(Value::Undefined),
            24 => Err(CborError::UnsupportedSimple(self.read_byte()?)),
            25 => {
                let bytes = self.read_slice(2)?;
                Ok(Value::Float(decode_half(u16::from_be_bytes([
                    bytes[0], bytes[1],
                ]))))
            }
            26 => {
                let bytes: [u8; 4] = self.read_slice(4)?.try_into().expect("4-byte slice");
                Ok(Value::Float(f64::from(f32::from_be_bytes(bytes))))
            }
            27 => {
                let bytes: [u8; 8] = self.read_slice(8)?.try_into().expect("8-byte slice");
                Ok(Value::Float(f64::from_be_bytes(bytes)))
            }
            28..=30 => Err(CborError::UnknownAdditionalInfo(info)),
            31 => Err(CborError::UnexpectedBreak),
            other => Err(CborError::UnsupportedSimple(other)),
        }
    }
}

/// RFC 8949 half-precision decoding: 5-bit exponent, 10-bit mantissa;
/// exponent 0 is subnormal, 31 is infinity or NaN.
fn decode_half(bits: u16) -> f64 {
    let exponent = i32::from(bits >> 10) & 0x1f;
    let mantissa = f64::from(bits & 0x3ff);
    let magnitude = match exponent {
        0 => mantissa / 1024.0 * 2f64.powi(-14),
        31 => {
            if mantissa == 0.0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => (1.0 + mantissa / 1024.0) * 2f64.powi(exponent - 15),
    };
    if bits & 0x8000 == 0 {
        magnitude
    } else {
        -magnitude
    }
}
