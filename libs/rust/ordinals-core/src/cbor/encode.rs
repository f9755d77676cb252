//! Canonical CBOR encoder.
//!
//! Every head uses the smallest width that fits its argument, strings and
//! collections are always definite-length, and finite floats use single
//! precision exactly when the value survives an `f32` round trip. The four
//! non-finite/signed-zero cases use the fixed half-precision patterns
//! `0x7E00` (NaN), `0x7C00` (+Inf), `0xFC00` (-Inf), and `0x8000` (-0).

use super::{CborError, Value};

pub(super) fn encode_value(value: &Value, out: &mut Vec<u8>) -> Result<(), CborError> {
    match value {
        Value::Integer(n) => encode_integer(*n, out),
        Value::Bytes(bytes) => {
            encode_head(2, bytes.len() as u64, out);
            out.extend_from_slice(bytes);
            Ok(())
        }
        Value::Text(text) => {
            encode_head(3, text.len() as u64, out);
            out.extend_from_slice(text.as_bytes());
            Ok(())
        }
        Value::Array(items) => {
            encode_head(4, items.len() as u64, out);
            for item in items {
                encode_value(item, out)?;
            }
            Ok(())
        }
        Value::Map(entries) => {
            encode_head(5, entries.len() as u64, out);
            for (key, entry) in entries {
                encode_value(key, out)?;
                encode_value(entry, out)?;
            }
            Ok(())
        }
        Value::Tag(number, _) => Err(CborError::TagEncode(*number)),
        Value::Bool(false) => {
            out.push(0xf4);
            Ok(())
        }
        Value::Bool(true) => {
            out.push(0xf5);
            Ok(())
        }
        Value::Null => {
            out.push(0xf6);
            Ok(())
        }
        Value::Undefined => {
            out.push(0xf7);
            Ok(())
        }
        Value::Float(x) => {
            encode_float(*x, out);
            Ok(())
        }
    }
}

fn encode_integer(n: i128, out: &mut Vec<u8>) -> Result<(), CborError> {
    if n >= 0 {
        let argument = u64::try_from(n).map_err(|_| CborError::IntegerOverflow(n))?;
        encode_head(0, argument, out);
    } else {
        // Negative integers encode as -(n+1).
        let argument = u64::try_from(-1 - n).map_err(|_| CborError::IntegerOverflow(n))?;
        encode_head(1, argument, out);
    }
    Ok(())
}

/// Write a head byte plus the minimal-width argument.
fn encode_head(major: u8, argument: u64, out: &mut Vec<u8>) {
    let major = major << 5;
    if argument < 24 {
        out.push(major | argument as u8);
    } else if argument <= u64::from(u8::MAX) {
        out.push(major | 24);
        out.push(argument as u8);
    } else if argument <= u64::from(u16::MAX) {
        out.push(major | 25);
        out.extend_from_slice(&(argument as u16).to_be_bytes());
    } else if argument <= u64::from(u32::MAX) {
        out.push(major | 26);
        out.extend_from_slice(&(argument as u32).to_be_bytes());
    } else {
        out.push(major | 27);
        out.extend_from_slice(&argument.to_be_bytes());
    }
}

fn encode_float(x: f64, out: &mut Vec<u8>) {
    let special_half = if x.is_nan() {
        Some(0x7e00u16)
    } else if x == f64::INFINITY {
        Some(0x7c00)
    } else if x == f64::NEG_INFINITY {
        Some(0xfc00)
    } else if x == 0.0 && x.is_sign_negative() {
        Some(0x8000)
    } else {
        None
    };

    if let Some(bits) = special_half {
        out.push(0xf9);
        out.extend_from_slice(&bits.to_be_bytes());
    } else if f64::from(x as f32) == x {
        out.push(0xfa);
        out.extend_from_slice(&(x as f32).to_be_bytes());
    } else {
        out.push(0xfb);
        out.extend_from_slice(&x.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::encode;
    use super::*;

    fn encoded_hex(value: &Value) -> String {
        hex::encode(encode(value).unwrap())
    }

    #[test]
    fn test_integer_widths_are_minimal() {
        assert_eq!(encoded_hex(&Value::Integer(0)), "00");
        assert_eq!(encoded_hex(&Value::Integer(10)), "0a");
        assert_eq!(encoded_hex(&Value::Integer(23)), "17");
        assert_eq!(encoded_hex(&Value::Integer(24)), "1818");
        assert_eq!(encoded_hex(&Value::Integer(255)), "18ff");
        assert_eq!(encoded_hex(&Value::Integer(256)), "190100");
        assert_eq!(encoded_hex(&Value::Integer(65535)), "19ffff");
        assert_eq!(encoded_hex(&Value::Integer(65536)), "1a00010000");
        assert_eq!(encoded_hex(&Value::Integer(1 << 32)), "1b0000000100000000");
        assert_eq!(
            encoded_hex(&Value::Integer(u64::MAX.into())),
            "1bffffffffffffffff"
        );
    }

    #[test]
    fn test_negative_integers() {
        assert_eq!(encoded_hex(&Value::Integer(-1)), "20");
        assert_eq!(encoded_hex(&Value::Integer(-24)), "37");
        assert_eq!(encoded_hex(&Value::Integer(-25)), "3818");
        assert_eq!(encoded_hex(&Value::Integer(-256)), "38ff");
        assert_eq!(encoded_hex(&Value::Integer(-(1i128 << 64))), "3bffffffffffffffff");
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(
            encode(&Value::Integer((1i128 << 64) + 1)),
            Err(CborError::IntegerOverflow((1i128 << 64) + 1))
        );
        assert_eq!(
            encode(&Value::Integer(-(1i128 << 64) - 1)),
            Err(CborError::IntegerOverflow(-(1i128 << 64) - 1))
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(encoded_hex(&Value::Text(String::new())), "60");
        assert_eq!(encoded_hex(&Value::from("IETF")), "6449455446");
        assert_eq!(encoded_hex(&Value::Bytes(vec![1, 2, 3, 4])), "4401020304");
    }

    #[test]
    fn test_collections() {
        assert_eq!(encoded_hex(&Value::Array(Vec::new())), "80");
        assert_eq!(
            encoded_hex(&Value::Array(vec![1.into(), 2.into(), 3.into()])),
            "83010203"
        );
        assert_eq!(encoded_hex(&Value::Map(Vec::new())), "a0");
        assert_eq!(
            encoded_hex(&Value::Map(vec![
                ("a".into(), 1.into()),
                ("b".into(), Value::Array(vec![2.into(), 3.into()])),
            ])),
            "a26161016162820203"
        );
    }

    #[test]
    fn test_map_order_is_preserved() {
        // No canonical key sorting: insertion order is the wire order.
        assert_eq!(
            encoded_hex(&Value::Map(vec![
                ("b".into(), 1.into()),
                ("a".into(), 2.into()),
            ])),
            "a2616201616102"
        );
    }

    #[test]
    fn test_simple_values() {
        assert_eq!(encoded_hex(&Value::Bool(false)), "f4");
        assert_eq!(encoded_hex(&Value::Bool(true)), "f5");
        assert_eq!(encoded_hex(&Value::Null), "f6");
        assert_eq!(encoded_hex(&Value::Undefined), "f7");
    }

    #[test]
    fn test_float_policy() {
        // Non-finite and -0 use the fixed half-precision patterns.
        assert_eq!(encoded_hex(&Value::Float(f64::NAN)), "f97e00");
        assert_eq!(encoded_hex(&Value::Float(f64::INFINITY)), "f97c00");
        assert_eq!(encoded_hex(&Value::Float(f64::NEG_INFINITY)), "f9fc00");
        assert_eq!(encoded_hex(&Value::Float(-0.0)), "f98000");

        // Finite values that survive an f32 round trip go single.
        assert_eq!(encoded_hex(&Value::Float(0.0)), "fa00000000");
        assert_eq!(encoded_hex(&Value::Float(1.5)), "fa3fc00000");
        assert_eq!(encoded_hex(&Value::Float(100000.0)), "fa47c35000");
        assert_eq!(
            encoded_hex(&Value::Float(3.4028234663852886e38)),
            "fa7f7fffff"
        );

        // Everything else goes double.
        assert_eq!(encoded_hex(&Value::Float(0.1)), "fb3fb999999999999a");
        assert_eq!(encoded_hex(&Value::Float(1.1)), "fb3ff199999999999a");
        assert_eq!(encoded_hex(&Value::Float(1.0e300)), "fb7e37e43c8800759c");
    }

    #[test]
    fn test_tag_encode_is_rejected() {
        assert_eq!(
            encode(&Value::Tag(2, Box::new(Value::Bytes(vec![1])))),
            Err(CborError::TagEncode(2))
        );
    }
}
