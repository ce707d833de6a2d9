//! The streaming tokenizer and typed dispatch (spec.md §4.6–§4.8).

use crate::bignum::{BigFloatView, BigIntView, Sign};
use crate::cursor::{memsep, Reader};
use crate::error::Error;
use crate::loader::{call_bigfloat, call_bigint, call_float, call_inf, call_int, call_string, Loader};
use crate::pack::StringEncoding;
use crate::tag::{
    tag_is_negative, ENC_RAW, ENC_UTF8, TAG_NEG_BIG, TAG_NEG_INF, TAG_NEG_INT_MAX, TAG_NEG_INT_MIN,
    TAG_POS_BIG, TAG_POS_INF, TAG_POS_INT_MAX, TAG_POS_INT_MIN, TAG_STRING,
};

const EXPONENT_BIAS: i32 = 16383;
/// Largest `f64`-exact integer, `2^53 - 1`.
const MAX_SAFE_U64: u64 = (1u64 << 53) - 1;

/// Tokenize `record`, dispatching each field to the matching handler on
/// `loader` (spec.md §4.6). Returns `Ok(())` once every field has been
/// consumed, or the first error raised by a structural check or a handler
/// (the tokenizer makes no partial-progress commitment past that point).
pub fn tokenize(record: &[u8], loader: &mut Loader<'_>) -> Result<(), Error> {
    let mut cursor = 0usize;
    loop {
        let remaining = &record[cursor..];
        let sep_offset = match memsep(remaining) {
            Some(off) => off,
            None => return Ok(()),
        };
        if sep_offset == 0 {
            return Err(Error::Length);
        }
        let tag = remaining[0];
        let payload = &remaining[1..sep_offset];
        cursor += sep_offset + 1;

        match tag {
            TAG_STRING => load_string(payload, loader)?,
            TAG_NEG_INF => call_inf(loader, Sign::Negative)?,
            TAG_POS_INF => call_inf(loader, Sign::Positive)?,
            TAG_NEG_BIG | TAG_POS_BIG => load_bignum(tag, payload, loader)?,
            TAG_NEG_INT_MIN..=TAG_NEG_INT_MAX | TAG_POS_INT_MIN..=TAG_POS_INT_MAX => {
                load_number(tag, payload, loader)?
            }
            _ => return Err(Error::Tag),
        }
    }
}

fn decode_bytes(hex: &[u8], mask: u8) -> Result<Vec<u8>, Error> {
    if hex.len() % 2 != 0 {
        return Err(Error::Length);
    }
    let mut reader = Reader::new(hex);
    let mut out = Vec::with_capacity(hex.len() / 2);
    for _ in 0..hex.len() / 2 {
        out.push(reader.read_uint8(mask).ok_or(Error::Length)?);
    }
    Ok(out)
}

/// `load_string` (spec.md §4.7): pop the trailing encoding byte, require an
/// even hex-char count for the rest, hand the decoded bytes + encoding to
/// the string handler.
fn load_string(payload: &[u8], loader: &mut Loader<'_>) -> Result<(), Error> {
    if payload.is_empty() {
        return Err(Error::Length);
    }
    let (hex, enc_byte) = payload.split_at(payload.len() - 1);
    let enc = match enc_byte[0] {
        ENC_RAW => StringEncoding::Raw,
        ENC_UTF8 => StringEncoding::Utf8,
        _ => return Err(Error::Enc),
    };
    let bytes = decode_bytes(hex, 0)?;
    call_string(loader, &bytes, enc)
}

/// `load_number` (spec.md §4.8) for tags `E`..`T`: derive the integer-part
/// byte count and sign mask from the tag, then decode a pure integer or a
/// float depending on whether payload residue follows the integer part.
fn load_number(tag: u8, payload: &[u8], loader: &mut Loader<'_>) -> Result<(), Error> {
    let negative = tag_is_negative(tag);
    let mask = if negative { 0xFF } else { 0x00 };
    let nbytes_int = if negative {
        TAG_NEG_INT_MAX - tag + 1
    } else {
        tag - TAG_POS_INT_MIN + 1
    };
    let int_hex_len = 2 * nbytes_int as usize;
    if payload.len() < int_hex_len {
        return Err(Error::Length);
    }
    let (int_hex, residue) = payload.split_at(int_hex_len);

    if residue.is_empty() {
        let mut reader = Reader::new(int_hex);
        let u = reader.read_uint64n(nbytes_int, mask).ok_or(Error::Length)?;
        return load_pure_integer(u, negative, loader);
    }

    if residue.len() < 4 || residue.len() % 2 != 0 {
        return Err(Error::Length);
    }
    let (exp_hex, mant_hex) = residue.split_at(4);
    let mut exp_reader = Reader::new(exp_hex);
    let biased = exp_reader.read_uint16(mask).ok_or(Error::Length)?;
    let exponent = biased as i32 - EXPONENT_BIAS;
    let nbytes_frac = (mant_hex.len() / 2) as u8;

    let sign = if negative { Sign::Negative } else { Sign::Positive };
    let out_of_window = nbytes_int > 7 || nbytes_frac > 7 || !(-1073..=0).contains(&exponent);
    if out_of_window {
        return route_to_bigfloat(int_hex, mant_hex, mask, sign, exponent, loader);
    }

    let mut int_reader = Reader::new(int_hex);
    let integral = int_reader.read_uint64n(nbytes_int, mask).ok_or(Error::Length)?;

    // An integer part too large for an exact f64 isn't a decode failure —
    // per the big-number escape's own contract, it routes to the
    // structured bigfloat view instead (original_source/lre.h's
    // `lrex_load_number_float` does a plain `goto handle_bigfloat` here,
    // never an error).
    if integral > MAX_SAFE_U64 {
        return route_to_bigfloat(int_hex, mant_hex, mask, sign, exponent, loader);
    }

    // An elided (zero-length) mantissa means no fractional contribution at
    // all; deliver the integer part as-is rather than treating it as a
    // malformed residue.
    if nbytes_frac == 0 {
        let value = integral as f64;
        return call_float(loader, if negative { -value } else { value });
    }

    let mut mant_reader = Reader::new(mant_hex);
    let frac = mant_reader.read_uint64n(nbytes_frac, mask).ok_or(Error::Length)?;

    if frac > MAX_SAFE_U64 {
        return route_to_bigfloat(int_hex, mant_hex, mask, sign, exponent, loader);
    }
    if frac == 0 {
        let value = integral as f64;
        return call_float(loader, if negative { -value } else { value });
    }

    let bitlen = (64 - frac.leading_zeros()) as i32;
    let frac_val = (frac as f64) * 2f64.powi(exponent - bitlen);
    let value = integral as f64 + frac_val;
    if value - (integral as f64) != frac_val {
        // Precision loss: the f64 addition silently dropped (part of) the
        // fraction. Don't report a wrong value — fall back to the
        // structured big-float view (spec.md §4.8).
        return route_to_bigfloat(int_hex, mant_hex, mask, sign, exponent, loader);
    }

    let signed_value = if negative { -value } else { value };
    call_float(loader, signed_value)
}

fn route_to_bigfloat(
    int_hex: &[u8],
    mant_hex: &[u8],
    mask: u8,
    sign: Sign,
    exponent: i32,
    loader: &mut Loader<'_>,
) -> Result<(), Error> {
    let integer = decode_bytes(int_hex, mask)?;
    let mantissa = decode_bytes(mant_hex, mask)?;
    let view = BigFloatView {
        sign,
        integer: &integer,
        exponent: exponent as i16,
        mantissa: &mantissa,
    };
    call_bigfloat(loader, view)
}

fn load_pure_integer(u: u64, negative: bool, loader: &mut Loader<'_>) -> Result<(), Error> {
    const SIGN_BIT: u64 = 1u64 << 63;
    if negative {
        if u > SIGN_BIT {
            return Err(Error::Range);
        }
        let v = if u == SIGN_BIT { i64::MIN } else { -(u as i64) };
        call_int(loader, v)
    } else {
        if u > SIGN_BIT - 1 {
            return Err(Error::Range);
        }
        call_int(loader, u as i64)
    }
}

/// `load_number`'s big-number branch (spec.md §4.8 "D, U: big-number
/// path"): read a 16-bit integer-part byte count, split the remaining
/// payload into the integer part and an optional float suffix, and hand a
/// structured view to `handler_bigint`/`handler_bigfloat`.
///
/// Enforces the stricter length check spec.md §9 calls for: the payload
/// must be at least `4 + 2*nbytes_int` bytes before the declared byte
/// count is trusted, not merely `>= 4`.
fn load_bignum(tag: u8, payload: &[u8], loader: &mut Loader<'_>) -> Result<(), Error> {
    let negative = tag == TAG_NEG_BIG;
    let mask = if negative { 0xFF } else { 0x00 };
    let sign = if negative { Sign::Negative } else { Sign::Positive };

    if payload.len() < 4 {
        return Err(Error::Length);
    }
    let mut reader = Reader::new(&payload[..4]);
    let nbytes_int = reader.read_uint16(mask).ok_or(Error::Length)? as usize;
    let int_hex_len = 2 * nbytes_int;
    if payload.len() < 4 + int_hex_len {
        return Err(Error::Length);
    }
    let rest = &payload[4..];
    let (int_hex, residue) = rest.split_at(int_hex_len);
    let integer = decode_bytes(int_hex, mask)?;

    if residue.is_empty() {
        let view = BigIntView { sign, integer: &integer };
        return call_bigint(loader, view);
    }

    if residue.len() < 4 || residue.len() % 2 != 0 {
        return Err(Error::Length);
    }
    let (exp_hex, mant_hex) = residue.split_at(4);
    let mut exp_reader = Reader::new(exp_hex);
    let biased = exp_reader.read_uint16(mask).ok_or(Error::Length)?;
    let exponent = biased as i32 - EXPONENT_BIAS;
    let mantissa = decode_bytes(mant_hex, mask)?;
    let view = BigFloatView {
        sign,
        integer: &integer,
        exponent: exponent as i16,
        mantissa: &mantissa,
    };
    call_bigfloat(loader, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use crate::cursor::write_uint64n;
    use crate::pack::{pack_float, pack_int, pack_string};
    use crate::tag::pos_int_tag;

    fn collect_ints(record: &[u8]) -> Vec<i64> {
        let mut out = Vec::new();
        let mut loader = Loader::new().on_int(|v| {
            out.push(v);
            Ok(())
        });
        tokenize(record, &mut loader).unwrap();
        out
    }

    #[test]
    fn round_trips_a_handful_of_ints() {
        let mut buf = Buffer::new(64);
        for v in [0i64, -1, 1, i64::MIN, i64::MAX, -255, 1_000_000] {
            pack_int(&mut buf, v).unwrap();
        }
        let values = [0i64, -1, 1, i64::MIN, i64::MAX, -255, 1_000_000];
        assert_eq!(collect_ints(buf.as_bytes()), values);
    }

    #[test]
    fn round_trips_floats() {
        let mut buf = Buffer::new(64);
        let values = [0.5f64, -0.5, 3.25, -3.25, 1.0, -1.0, 123456.125, -0.001];
        for v in values {
            pack_float(&mut buf, v).unwrap();
        }
        let mut out = Vec::new();
        let mut loader = Loader::new().on_float(|v| {
            out.push(v);
            Ok(())
        });
        tokenize(buf.as_bytes(), &mut loader).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn round_trips_infinities_via_default_delegation() {
        let mut buf = Buffer::new(16);
        pack_float(&mut buf, f64::NEG_INFINITY).unwrap();
        pack_float(&mut buf, f64::INFINITY).unwrap();
        let mut out = Vec::new();
        let mut loader = Loader::new().on_float(|v| {
            out.push(v);
            Ok(())
        });
        tokenize(buf.as_bytes(), &mut loader).unwrap();
        assert_eq!(out, vec![f64::NEG_INFINITY, f64::INFINITY]);
    }

    #[test]
    fn round_trips_strings() {
        let mut buf = Buffer::new(64);
        pack_string(&mut buf, b"hello", StringEncoding::Utf8).unwrap();
        pack_string(&mut buf, &[0xDE, 0xAD, 0xBE, 0xEF], StringEncoding::Raw).unwrap();
        let mut out = Vec::new();
        let mut loader = Loader::new().on_string(|bytes, enc| {
            out.push((bytes.to_vec(), enc));
            Ok(())
        });
        tokenize(buf.as_bytes(), &mut loader).unwrap();
        assert_eq!(out[0], (b"hello".to_vec(), StringEncoding::Utf8));
        assert_eq!(out[1], (vec![0xDE, 0xAD, 0xBE, 0xEF], StringEncoding::Raw));
    }

    #[test]
    fn unrecognized_tag_is_an_error() {
        let mut loader = Loader::new();
        assert_eq!(tokenize(b"Zfoo+", &mut loader), Err(Error::Tag));
    }

    #[test]
    fn bad_string_encoding_byte_is_an_error() {
        let mut loader = Loader::new().on_string(|_, _| Ok(()));
        assert_eq!(tokenize(b"XaaZ+", &mut loader), Err(Error::Enc));
    }

    #[test]
    fn handler_refusal_surfaces_as_handler_error() {
        let mut buf = Buffer::new(16);
        pack_int(&mut buf, 5).unwrap();
        let mut loader = Loader::new().on_int(|_| Err(Error::Range));
        assert_eq!(tokenize(buf.as_bytes(), &mut loader), Err(Error::Handler));
    }

    #[test]
    fn missing_handler_refuses() {
        let mut buf = Buffer::new(16);
        pack_int(&mut buf, 5).unwrap();
        let mut loader = Loader::new();
        assert_eq!(tokenize(buf.as_bytes(), &mut loader), Err(Error::Handler));
    }

    #[test]
    fn out_of_window_float_routes_to_bigfloat_handler() {
        // Tag M (nbytes_int = 1) with an exponent outside [-1073, 0] can't
        // come from this crate's own pack_float, but a spec-conformant
        // producer could emit it; it must still decode via the bigfloat
        // handler rather than erroring.
        let mut record = vec![b'M'];
        record.extend_from_slice(b"aa"); // integer part = 0
        record.extend_from_slice(b"aaaa"); // biased exponent = 0 -> unbiased -16383
        record.extend_from_slice(b"aaaaaaaaaaaaaa"); // 7-byte mantissa = 0
        record.push(b'+');
        let mut seen = false;
        let mut loader = Loader::new().on_bigfloat(|_| {
            seen = true;
            Ok(())
        });
        tokenize(&record, &mut loader).unwrap();
        assert!(seen);
    }

    #[test]
    fn elided_mantissa_delivers_the_integer_part_as_a_float() {
        // Tag M, integral 0, biased exponent for e=0, no mantissa bytes at
        // all (the residue ends right after the 4-char exponent).
        let mut record = vec![b'M'];
        write_uint64n(&mut record, 0, 1, 0);
        write_uint64n(&mut record, EXPONENT_BIAS as u64, 2, 0);
        record.push(b'+');
        assert_eq!(record, b"Maadppp+".to_vec());

        let mut seen = None;
        let mut loader = Loader::new().on_float(|v| {
            seen = Some(v);
            Ok(())
        });
        tokenize(&record, &mut loader).unwrap();
        assert_eq!(seen, Some(0.0));
    }

    #[test]
    fn explicit_zero_mantissa_also_skips_fractional_contribution() {
        let mut record = vec![b'M'];
        write_uint64n(&mut record, 0, 1, 0);
        write_uint64n(&mut record, EXPONENT_BIAS as u64, 2, 0);
        write_uint64n(&mut record, 0, 7, 0);
        record.push(b'+');

        let mut seen = None;
        let mut loader = Loader::new().on_float(|v| {
            seen = Some(v);
            Ok(())
        });
        tokenize(&record, &mut loader).unwrap();
        assert_eq!(seen, Some(0.0));
    }

    #[test]
    fn oversized_in_window_mantissa_routes_to_bigfloat_instead_of_erroring() {
        // nbytes_frac = 7 and e = 0 are both in-window, but the decoded
        // mantissa magnitude exceeds 2^53 - 1, so this must still reach
        // handler_bigfloat rather than ERROR_RANGE.
        let mut record = vec![b'M'];
        write_uint64n(&mut record, 0, 1, 0);
        write_uint64n(&mut record, EXPONENT_BIAS as u64, 2, 0);
        write_uint64n(&mut record, (1u64 << 56) - 1, 7, 0);
        record.push(b'+');

        let mut seen = false;
        let mut loader = Loader::new().on_bigfloat(|_| {
            seen = true;
            Ok(())
        });
        tokenize(&record, &mut loader).unwrap();
        assert!(seen);
    }

    #[test]
    fn oversized_in_window_integer_part_routes_to_bigfloat_instead_of_erroring() {
        // nbytes_int = 7 is in-window, but an integral magnitude above
        // 2^53 - 1 still can't round-trip exactly through f64; must route
        // to handler_bigfloat, not ERROR_RANGE.
        let mut record = vec![pos_int_tag(7)];
        write_uint64n(&mut record, (1u64 << 56) - 1, 7, 0);
        write_uint64n(&mut record, EXPONENT_BIAS as u64, 2, 0);
        record.push(b'+');

        let mut seen = false;
        let mut loader = Loader::new().on_bigfloat(|_| {
            seen = true;
            Ok(())
        });
        tokenize(&record, &mut loader).unwrap();
        assert!(seen);
    }

    #[test]
    fn positive_bignum_escape_reaches_bigint_handler() {
        let mut record = vec![b'U'];
        write_uint64n(&mut record, 3, 2, 0);
        for &b in &[0x01u8, 0x02, 0x03] {
            write_uint64n(&mut record, b as u64, 1, 0);
        }
        record.push(b'+');

        let mut seen = None;
        let mut loader = Loader::new().on_bigint(|view| {
            seen = Some((view.sign, view.integer.to_vec()));
            Ok(())
        });
        tokenize(&record, &mut loader).unwrap();
        assert_eq!(seen, Some((Sign::Positive, vec![0x01, 0x02, 0x03])));
    }

    #[test]
    fn negative_bignum_escape_reaches_bigint_handler_unmasked() {
        let mut record = vec![b'D'];
        write_uint64n(&mut record, 1, 2, 0xFF);
        write_uint64n(&mut record, 0x10, 1, 0xFF);
        record.push(b'~');

        let mut seen = None;
        let mut loader = Loader::new().on_bigint(|view| {
            seen = Some((view.sign, view.integer.to_vec()));
            Ok(())
        });
        tokenize(&record, &mut loader).unwrap();
        assert_eq!(seen, Some((Sign::Negative, vec![0x10])));
    }

    #[test]
    fn bignum_escape_with_float_suffix_reaches_bigfloat_handler() {
        let mut record = vec![b'U'];
        write_uint64n(&mut record, 1, 2, 0); // nbytes_int = 1
        write_uint64n(&mut record, 0x7F, 1, 0); // integer part
        write_uint64n(&mut record, EXPONENT_BIAS as u64 + 5, 2, 0); // exponent
        write_uint64n(&mut record, 0x01, 1, 0); // 1-byte mantissa
        record.push(b'+');

        let mut seen = None;
        let mut loader = Loader::new().on_bigfloat(|view| {
            seen = Some((view.sign, view.integer.to_vec(), view.exponent, view.mantissa.to_vec()));
            Ok(())
        });
        tokenize(&record, &mut loader).unwrap();
        assert_eq!(seen, Some((Sign::Positive, vec![0x7F], 5, vec![0x01])));
    }
}
