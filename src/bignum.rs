//! Structured views handed to the big-number escape handlers (spec.md §4.8,
//! §9 "Big-number escape"; see `SPEC_FULL.md` F.5).
//!
//! `ordpack` deliberately does not interpret these arithmetically — per
//! spec.md §1, arbitrary-precision bigint/bigfloat handling is an external
//! collaborator's job. The original C header (`original_source/lre.h`)
//! hands its big-number callback a pointer to the integer bytes, a byte
//! count, a pointer to the fractional bytes, and the biased exponent;
//! `BigIntView`/`BigFloatView` give that same four-field handoff borrowed,
//! already sign-unmasked, slice fields instead of raw pointers.

/// Sign of a decoded numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Negative,
    Positive,
}

/// A big-integer escape (`D`/`U` tag, no fractional suffix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigIntView<'a> {
    pub sign: Sign,
    /// Big-endian magnitude bytes, already XOR-unmasked.
    pub integer: &'a [u8],
}

/// A big-float escape (`D`/`U` tag with a fractional suffix), or an
/// in-window numeric field (`E`..`T` tag) whose exponent or byte counts
/// fell outside the range `pack_float`/`load_number` can round-trip
/// exactly through `f64` (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigFloatView<'a> {
    pub sign: Sign,
    /// Big-endian integer-part magnitude bytes, already XOR-unmasked.
    pub integer: &'a [u8],
    /// Unbiased exponent (`biased - 16383`).
    pub exponent: i16,
    /// Big-endian mantissa bytes, already XOR-unmasked.
    pub mantissa: &'a [u8],
}
