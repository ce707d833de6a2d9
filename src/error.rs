//! Ambient error handling (spec.md §6 "Error codes", §7 "Error handling
//! design"; see `SPEC_FULL.md` F.1).
//!
//! Mirrors the teacher's own error style (`sixbit::EncodeError`: a flat,
//! derive-heavy enum) rather than pulling in `thiserror`. The three codes
//! from spec.md's enumeration that were bookkeeping artifacts of the C
//! original's manual pointers and allocator (`NOTHING`, `NULLPTR`,
//! `ALLOCATION_SMALL`) have no counterpart here.

use std::fmt;

/// An error raised while packing or unpacking an `ordpack` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The output buffer could not grow to hold the next field.
    Allocation,
    /// A decoded pure integer did not fit the range its tag promised, or
    /// `pack_float` was given a magnitude exceeding `2^53 - 1`. A decoded
    /// float whose integer or mantissa part overflows that range is not an
    /// error: it routes to the bigfloat handler instead (spec.md §4.8).
    Range,
    /// `pack_float` was given `f64::NAN`.
    Nan,
    /// A field's payload length was inconsistent with its tag.
    Length,
    /// An unrecognized tag byte was encountered.
    Tag,
    /// An unrecognized sign/tag combination was encountered.
    Sign,
    /// A string field's trailing encoding byte was not `H` or `L`.
    Enc,
    /// A loader handler refused the value or failed.
    Handler,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::Allocation => "buffer allocation failed",
            Error::Range => "value out of representable range",
            Error::Nan => "NaN is not an admissible float",
            Error::Length => "field payload length inconsistent with its tag",
            Error::Tag => "unrecognized tag byte",
            Error::Sign => "unrecognized sign/tag combination",
            Error::Enc => "invalid string encoding byte",
            Error::Handler => "loader handler refused or failed",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}

/// Shorthand for `Result<T, ordpack::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_message() {
        for e in [
            Error::Allocation,
            Error::Range,
            Error::Nan,
            Error::Length,
            Error::Tag,
            Error::Sign,
            Error::Enc,
            Error::Handler,
        ] {
            assert!(!e.to_string().is_empty());
        }
    }
}
