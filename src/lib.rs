// -*- mode: rust; bidi-display-reordering: nil -*-

/*! # ordpack - an order-preserving binary-to-text codec.

This crate packs a small set of primitive values — signed integers, finite
(or infinite) floats, and byte strings — into a printable-ASCII encoding
whose lexicographic byte order always matches the semantic order of the
original values. Pack several fields one after another into the same
[`Buffer`] and the concatenation still orders correctly against another
such concatenation, field by field, the way a composite database key
should.

This is not a general serialization format: there is no schema, no nested
structure, and no support for maps, sequences, or user types beyond what
[`Value`] offers for testing. It is a building block for systems that need
to turn typed values into sortable keys (and back), not a complete
encoding solution.

## Usage summary

Pack values onto a growable [`Buffer`] with [`pack_int`], [`pack_float`],
or [`pack_string`]:

```
use ordpack::{Buffer, StringEncoding, pack_int, pack_string};

let mut buf = Buffer::new(64);
pack_int(&mut buf, -42).unwrap();
pack_string(&mut buf, b"key", StringEncoding::Utf8).unwrap();
```

Read them back with [`tokenize`], which walks a packed record and calls
back into a [`Loader`] you've wired up with the handlers you care about:

```
use ordpack::{tokenize, Loader};

# use ordpack::{Buffer, pack_int};
# let mut buf = Buffer::new(16);
# pack_int(&mut buf, -42).unwrap();
let mut seen = None;
let mut loader = Loader::new().on_int(|v| {
    seen = Some(v);
    Ok(())
});
tokenize(buf.as_bytes(), &mut loader).unwrap();
assert_eq!(seen, Some(-42));
```

## Encoding

Every packed field is `tag + payload + terminator`. The tag byte alone
orders fields by kind and (for numbers) by magnitude class; ties within a
kind are broken by the payload, which is always a byte-for-byte
hex-encoded, optionally sign-inverted, big-endian representation. See
`SPEC_FULL.md` in the repository for the full per-field layout; the
module-level docs on [`pack`], [`tokenize`], and [`tag`] cover the same
ground closer to the code.

## Out of scope

`ordpack` does not interpret arbitrary-precision integers or floats whose
magnitude or exponent outranges what an `i64`/`f64` can represent exactly
— those escape to the [`bignum`] module's structured views, which a
caller-supplied handler is free to hand off to an actual bignum library.
It also carries no schema or container types beyond [`Value`], which
exists to support round-trip and ordering tests, not as a recommended
public data model.
*/

mod bignum;
mod buffer;
mod cursor;
mod error;
mod loader;
mod pack;
mod tag;
mod tokenize;

pub use bignum::{BigFloatView, BigIntView, Sign};
pub use buffer::Buffer;
pub use error::{Error, Result};
pub use loader::Loader;
pub use pack::{pack_float, pack_int, pack_string, StringEncoding};
pub use tokenize::tokenize;

use arbitrary::{Arbitrary, Unstructured};

/// An owned value of one of the three kinds `ordpack` packs, for
/// round-trip and ordering tests via `arbitrary` (`SPEC_FULL.md` F.4).
#[derive(Debug, Clone, PartialEq, Arbitrary)]
pub enum Value {
    Int(i64),
    Float(FiniteFloat),
    Str(Vec<u8>, StringTag),
}

/// A string field's encoding, as a standalone `Arbitrary` type (kept
/// distinct from [`StringEncoding`] so `pack`'s public API isn't forced to
/// derive `arbitrary::Arbitrary` itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum StringTag {
    Raw,
    Utf8,
}

impl From<StringTag> for StringEncoding {
    fn from(tag: StringTag) -> Self {
        match tag {
            StringTag::Raw => StringEncoding::Raw,
            StringTag::Utf8 => StringEncoding::Utf8,
        }
    }
}

/// A finite `f64` wrapper for `arbitrary`-driven testing: `pack_float`
/// rejects NaN, so `Arbitrary` maps any generated NaN bit pattern to
/// `0.0` rather than producing values this crate can never round-trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteFloat(pub f64);

impl<'a> Arbitrary<'a> for FiniteFloat {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let bits = u64::arbitrary(u)?;
        let v = f64::from_bits(bits);
        Ok(FiniteFloat(if v.is_nan() { 0.0 } else { v }))
    }
}

/// Pack a [`Value`] onto `buf` using the matching `pack_*` function.
pub fn pack_value(buf: &mut Buffer, value: &Value) -> Result<()> {
    match value {
        Value::Int(v) => pack_int(buf, *v),
        Value::Float(FiniteFloat(v)) => pack_float(buf, *v),
        Value::Str(bytes, tag) => pack_string(buf, bytes, (*tag).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_value_dispatches_by_variant() {
        let mut buf = Buffer::new(32);
        pack_value(&mut buf, &Value::Int(7)).unwrap();
        pack_value(&mut buf, &Value::Str(b"hi".to_vec(), StringTag::Utf8)).unwrap();
        assert!(!buf.is_empty());
    }

    #[test]
    fn finite_float_arbitrary_never_produces_nan() {
        let bits = f64::NAN.to_bits().to_le_bytes();
        let mut u = Unstructured::new(&bits);
        let f = FiniteFloat::arbitrary(&mut u).unwrap();
        assert!(!f.0.is_nan());
    }
}
