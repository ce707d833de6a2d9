//! The handler dispatch record (spec.md §4.9, §9 "Handler callbacks").
//!
//! Modeled as a record of boxed closures rather than a trait object
//! hierarchy or subclass polymorphism, per spec.md's own design note: each
//! handler closes over whatever state it needs, replacing the C original's
//! `void *app` pointer plus bare function pointer with Rust's native
//! capture-by-closure.

use crate::bignum::{BigFloatView, BigIntView, Sign};
use crate::error::Error;
use crate::pack::StringEncoding;

type IntHandler<'a> = Box<dyn FnMut(i64) -> Result<(), Error> + 'a>;
type FloatHandler<'a> = Box<dyn FnMut(f64) -> Result<(), Error> + 'a>;
type InfHandler<'a> = Box<dyn FnMut(Sign) -> Result<(), Error> + 'a>;
type StringHandler<'a> = Box<dyn FnMut(&[u8], StringEncoding) -> Result<(), Error> + 'a>;
type BigIntHandler<'a> = Box<dyn FnMut(BigIntView<'_>) -> Result<(), Error> + 'a>;
type BigFloatHandler<'a> = Box<dyn FnMut(BigFloatView<'_>) -> Result<(), Error> + 'a>;

/// The tokenizer's six typed callbacks. A handler left unset refuses
/// (`ERROR_HANDLER`) when its field type is encountered, except `on_inf`,
/// whose unset default delegates to `on_float` with `±INFINITY`
/// (spec.md §4.9).
#[derive(Default)]
pub struct Loader<'a> {
    pub(crate) on_int: Option<IntHandler<'a>>,
    pub(crate) on_float: Option<FloatHandler<'a>>,
    pub(crate) on_inf: Option<InfHandler<'a>>,
    pub(crate) on_string: Option<StringHandler<'a>>,
    pub(crate) on_bigint: Option<BigIntHandler<'a>>,
    pub(crate) on_bigfloat: Option<BigFloatHandler<'a>>,
}

impl<'a> Loader<'a> {
    /// A loader with every handler unset (all refuse, except `on_inf`
    /// which delegates to `on_float`).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_int(mut self, f: impl FnMut(i64) -> Result<(), Error> + 'a) -> Self {
        self.on_int = Some(Box::new(f));
        self
    }

    pub fn on_float(mut self, f: impl FnMut(f64) -> Result<(), Error> + 'a) -> Self {
        self.on_float = Some(Box::new(f));
        self
    }

    pub fn on_inf(mut self, f: impl FnMut(Sign) -> Result<(), Error> + 'a) -> Self {
        self.on_inf = Some(Box::new(f));
        self
    }

    pub fn on_string(mut self, f: impl FnMut(&[u8], StringEncoding) -> Result<(), Error> + 'a) -> Self {
        self.on_string = Some(Box::new(f));
        self
    }

    pub fn on_bigint(mut self, f: impl FnMut(BigIntView<'_>) -> Result<(), Error> + 'a) -> Self {
        self.on_bigint = Some(Box::new(f));
        self
    }

    pub fn on_bigfloat(mut self, f: impl FnMut(BigFloatView<'_>) -> Result<(), Error> + 'a) -> Self {
        self.on_bigfloat = Some(Box::new(f));
        self
    }
}

pub(crate) fn call_int(loader: &mut Loader<'_>, v: i64) -> Result<(), Error> {
    match &mut loader.on_int {
        Some(f) => f(v).map_err(|_| Error::Handler),
        None => Err(Error::Handler),
    }
}

pub(crate) fn call_float(loader: &mut Loader<'_>, v: f64) -> Result<(), Error> {
    match &mut loader.on_float {
        Some(f) => f(v).map_err(|_| Error::Handler),
        None => Err(Error::Handler),
    }
}

pub(crate) fn call_inf(loader: &mut Loader<'_>, sign: Sign) -> Result<(), Error> {
    match &mut loader.on_inf {
        Some(f) => f(sign).map_err(|_| Error::Handler),
        None => {
            let v = match sign {
                Sign::Negative => f64::NEG_INFINITY,
                Sign::Positive => f64::INFINITY,
            };
            call_float(loader, v)
        }
    }
}

pub(crate) fn call_string(
    loader: &mut Loader<'_>,
    bytes: &[u8],
    enc: StringEncoding,
) -> Result<(), Error> {
    match &mut loader.on_string {
        Some(f) => f(bytes, enc).map_err(|_| Error::Handler),
        None => Err(Error::Handler),
    }
}

pub(crate) fn call_bigint(loader: &mut Loader<'_>, view: BigIntView<'_>) -> Result<(), Error> {
    match &mut loader.on_bigint {
        Some(f) => f(view).map_err(|_| Error::Handler),
        None => Err(Error::Handler),
    }
}

pub(crate) fn call_bigfloat(loader: &mut Loader<'_>, view: BigFloatView<'_>) -> Result<(), Error> {
    match &mut loader.on_bigfloat {
        Some(f) => f(view).map_err(|_| Error::Handler),
        None => Err(Error::Handler),
    }
}
