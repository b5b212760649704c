//! Digest facade
//!
//! Unifies the power-sum digest and the three strawmen behind one enum so a
//! connection can be configured by `(kind, backend, threshold)` and the
//! caller never needs to know which concrete type backs it (spec §6.2). This
//! is the type CLI binaries and any future transport-layer integration
//! should hold onto; the individual modules ([`crate::psa`],
//! [`crate::strawman`]) stay usable directly for anyone who already knows
//! which one they want.

use std::sync::Arc;

use thiserror::Error;

use crate::decode::{self, DecodeError, RootFinder};
use crate::ma::{FieldOps, MaError, B32, M63, P16};
use crate::psa::{FieldTables, PowerSumDigest, PsaError};
use crate::strawman::{CircularBuffer, CounterMap, SlidingDistinctSet, StrawmanError};
use crate::wire::{self, WireError};

/// Unified error type for the digest facade; every submodule's error
/// converts into this one `#[from]`, so callers can propagate with `?`
/// without matching on which digest kind produced the failure.
#[derive(Debug, Error)]
pub enum QuackError {
    #[error(transparent)]
    Ma(#[from] MaError),
    #[error(transparent)]
    Psa(#[from] PsaError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Strawman(#[from] StrawmanError),
    /// `merge_subtract`/`insert` called across mismatched digest kinds or
    /// backends (e.g. a power-sum digest and a STR-A set).
    #[error("digest kind/backend mismatch: {0}")]
    KindMismatch(&'static str),
}

/// Modular-arithmetic backend selector, one per supported identifier width.
/// Names match the `--backend` CLI flag and the wire format's width byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `b = 16`, precomputed-reciprocal reduction.
    P16,
    /// `b = 32`, Barrett reduction.
    B32,
    /// `b = 64` (63-bit prime), Montgomery form.
    M63,
}

impl Backend {
    fn width_bits(self) -> u8 {
        match self {
            Backend::P16 => 16,
            Backend::B32 => 32,
            Backend::M63 => 64,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Backend::P16 => P16::NAME,
            Backend::B32 => B32::NAME,
            Backend::M63 => M63::NAME,
        }
    }

    /// Parse the `--backend` flag's value (also accepts the width in bits,
    /// for convenience from benchmark scripts that iterate over widths).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "precompute" | "16" | "p16" => Some(Backend::P16),
            "barrett" | "32" | "b32" => Some(Backend::B32),
            "montgomery" | "64" | "63" | "m63" => Some(Backend::M63),
            _ => None,
        }
    }
}

/// Digest kind selector: the power-sum digest, or one of the three
/// strawmen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    PowerSum,
    StrA,
    StrB,
    StrC,
}

impl Kind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "power-sum" | "psa" => Some(Kind::PowerSum),
            "str-a" | "stra" => Some(Kind::StrA),
            "str-b" | "strb" => Some(Kind::StrB),
            "str-c" | "strc" => Some(Kind::StrC),
            _ => None,
        }
    }
}

/// Single source of truth for constructing a [`Digest`]: the one place a CLI
/// flag set or an embedding application assembles `kind` + `backend` +
/// `threshold` + root-finding strategy before building the digest itself.
#[derive(Debug, Clone, Copy)]
pub struct DigestConfig {
    pub kind: Kind,
    pub backend: Backend,
    /// Threshold `t` for a power-sum digest, or sliding window `w` for a
    /// strawman.
    pub threshold: usize,
    /// Only consulted by [`Digest::decode`] on a power-sum digest; ignored
    /// by the strawmen.
    pub root_finder: RootFinder,
}

impl DigestConfig {
    pub fn new(kind: Kind, backend: Backend, threshold: usize) -> Self {
        Self {
            kind,
            backend,
            threshold,
            root_finder: RootFinder::Auto,
        }
    }
}

/// The unified digest. `t` doubles as the power-sum digest's threshold and
/// the strawmen's sliding window `w`, so every kind is constructed from the
/// same `(kind, backend, t)` triple.
///
/// Variant naming here follows the backend marker types (`P16`/`B32`/`M63`)
/// rather than bit widths; `PowerSumP16` ~ "PowerSum16", `PowerSumB32` ~
/// "PowerSum32", `PowerSumM63` ~ "PowerSum63" in the language-neutral digest
/// API surface.
pub enum Digest {
    PowerSumP16(PowerSumDigest<P16>),
    PowerSumB32(PowerSumDigest<B32>),
    PowerSumM63(PowerSumDigest<M63>),
    StrA(SlidingDistinctSet, Backend),
    StrB(CircularBuffer, Backend),
    StrC(CounterMap, Backend),
}

impl Digest {
    pub fn new(kind: Kind, backend: Backend, t: usize) -> Self {
        match kind {
            Kind::PowerSum => match backend {
                Backend::P16 => Digest::PowerSumP16(PowerSumDigest::new(t)),
                Backend::B32 => Digest::PowerSumB32(PowerSumDigest::new(t)),
                Backend::M63 => Digest::PowerSumM63(PowerSumDigest::new(t)),
            },
            Kind::StrA => Digest::StrA(SlidingDistinctSet::new(t), backend),
            Kind::StrB => Digest::StrB(CircularBuffer::new(t), backend),
            Kind::StrC => Digest::StrC(CounterMap::new(t), backend),
        }
    }

    /// Construct a power-sum digest sharing a precomputed `1/k mod p` table,
    /// the intended path for many concurrent flows at the same `(backend, t)`
    /// (spec §5, shared resources).
    pub fn new_power_sum_p16(tables: Arc<FieldTables<P16>>) -> Self {
        Digest::PowerSumP16(PowerSumDigest::with_tables(tables))
    }
    pub fn new_power_sum_b32(tables: Arc<FieldTables<B32>>) -> Self {
        Digest::PowerSumB32(PowerSumDigest::with_tables(tables))
    }
    pub fn new_power_sum_m63(tables: Arc<FieldTables<M63>>) -> Self {
        Digest::PowerSumM63(PowerSumDigest::with_tables(tables))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Digest::PowerSumP16(_) | Digest::PowerSumB32(_) | Digest::PowerSumM63(_) => {
                Kind::PowerSum
            }
            Digest::StrA(..) => Kind::StrA,
            Digest::StrB(..) => Kind::StrB,
            Digest::StrC(..) => Kind::StrC,
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Digest::PowerSumP16(_) => Backend::P16,
            Digest::PowerSumB32(_) => Backend::B32,
            Digest::PowerSumM63(_) => Backend::M63,
            Digest::StrA(_, b) | Digest::StrB(_, b) | Digest::StrC(_, b) => *b,
        }
    }

    pub fn insert(&mut self, x: u64) -> Result<(), QuackError> {
        match self {
            Digest::PowerSumP16(d) => d.insert(x).map_err(Into::into),
            Digest::PowerSumB32(d) => d.insert(x).map_err(Into::into),
            Digest::PowerSumM63(d) => d.insert(x).map_err(Into::into),
            Digest::StrA(d, _) => d.insert(x).map_err(Into::into),
            Digest::StrB(d, _) => d.insert(x).map_err(Into::into),
            Digest::StrC(d, _) => d.insert(x).map_err(Into::into),
        }
    }

    pub fn remove(&mut self, x: u64) -> Result<(), QuackError> {
        match self {
            Digest::PowerSumP16(d) => d.remove(x).map_err(Into::into),
            Digest::PowerSumB32(d) => d.remove(x).map_err(Into::into),
            Digest::PowerSumM63(d) => d.remove(x).map_err(Into::into),
            Digest::StrA(d, _) => d.remove(x).map_err(Into::into),
            Digest::StrB(d, _) => d.remove(x).map_err(Into::into),
            Digest::StrC(d, _) => d.remove(x).map_err(Into::into),
        }
    }

    /// `self -= other`. Both operands must share kind and backend.
    pub fn merge_subtract(&mut self, other: &Digest) -> Result<(), QuackError> {
        match (self, other) {
            (Digest::PowerSumP16(a), Digest::PowerSumP16(b)) => a.merge_subtract(b).map_err(Into::into),
            (Digest::PowerSumB32(a), Digest::PowerSumB32(b)) => a.merge_subtract(b).map_err(Into::into),
            (Digest::PowerSumM63(a), Digest::PowerSumM63(b)) => a.merge_subtract(b).map_err(Into::into),
            (Digest::StrA(a, wa), Digest::StrA(b, wb)) if wa == wb => {
                a.merge_subtract(b).map_err(Into::into)
            }
            (Digest::StrB(a, wa), Digest::StrB(b, wb)) if wa == wb => {
                a.merge_subtract(b).map_err(Into::into)
            }
            (Digest::StrC(a, wa), Digest::StrC(b, wb)) if wa == wb => {
                a.merge_subtract(b).map_err(Into::into)
            }
            _ => Err(QuackError::KindMismatch(
                "merge_subtract requires matching kind and backend",
            )),
        }
    }

    pub fn count(&self) -> i64 {
        match self {
            Digest::PowerSumP16(d) => d.count(),
            Digest::PowerSumB32(d) => d.count(),
            Digest::PowerSumM63(d) => d.count(),
            Digest::StrA(d, _) => d.count(),
            Digest::StrB(d, _) => d.count(),
            Digest::StrC(d, _) => d.count(),
        }
    }

    /// Recover the set difference. `finder` only affects the power-sum
    /// digest's degree-`>=3` path; the strawmen already resolved their
    /// difference at `merge_subtract` time and ignore it.
    pub fn decode(&self, finder: RootFinder) -> Result<Vec<u64>, QuackError> {
        match self {
            Digest::PowerSumP16(d) => decode::decode(d, finder).map_err(Into::into),
            Digest::PowerSumB32(d) => decode::decode(d, finder).map_err(Into::into),
            Digest::PowerSumM63(d) => decode::decode(d, finder).map_err(Into::into),
            Digest::StrA(d, _) => Ok(d.decode()),
            Digest::StrB(d, _) => Ok(d.decode()),
            Digest::StrC(d, _) => Ok(d.decode()),
        }
    }

    /// Frame this digest per the wire format (spec §6.1). Strawmen reuse the
    /// same header shape with their window as `t` and their raw elements (or
    /// counter-map entries, doubled into (id as both "power sum" slot is not
    /// meaningful) encoded positionally) in place of power sums; callers that
    /// need the strawman payload back should prefer
    /// [`Digest::count`]/[`Digest::decode`] plus their own transport framing,
    /// since the wire module's binding byte contract (spec §6.1) only
    /// specifies the power-sum layout precisely.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Digest::PowerSumP16(d) => wire::serialize_power_sum(
                16,
                d.threshold() as u16,
                d.count() as i32,
                d.last_value(),
                &d.power_sums_external(),
            ),
            Digest::PowerSumB32(d) => wire::serialize_power_sum(
                32,
                d.threshold() as u16,
                d.count() as i32,
                d.last_value(),
                &d.power_sums_external(),
            ),
            Digest::PowerSumM63(d) => wire::serialize_power_sum(
                64,
                d.threshold() as u16,
                d.count() as i32,
                d.last_value(),
                &d.power_sums_external(),
            ),
            Digest::StrA(d, b) => wire::serialize_kind(
                wire::KIND_STR_A,
                b.width_bits(),
                d.window() as u16,
                d.count() as i32,
                d.last_value(),
                &d.elements().collect::<Vec<_>>(),
            ),
            Digest::StrB(d, b) => wire::serialize_kind(
                wire::KIND_STR_B,
                b.width_bits(),
                d.window() as u16,
                d.count() as i32,
                d.last_value(),
                &d.elements().collect::<Vec<_>>(),
            ),
            Digest::StrC(d, b) => wire::serialize_kind(
                wire::KIND_STR_C,
                b.width_bits(),
                d.window() as u16,
                d.count() as i32,
                d.last_value(),
                &d.entries().map(|(id, _)| id).collect::<Vec<_>>(),
            ),
        }
    }

    /// Parse a power-sum digest (the only kind spec §6.1 fully specifies on
    /// the wire) back into a [`Digest`], sharing `tables` if provided.
    pub fn deserialize_power_sum(bytes: &[u8]) -> Result<Digest, QuackError> {
        let (header, payload) = wire::parse_header(bytes)?;
        if header.kind != wire::KIND_POWER_SUM {
            return Err(QuackError::Wire(WireError::UnsupportedDigest {
                kind: header.kind,
                width: header.width_bits,
            }));
        }
        let ps = wire::parse_power_sums(payload, header.width_bits, header.t)?;
        match header.width_bits {
            16 => {
                let tables = FieldTables::<P16>::new(header.t as usize);
                Ok(Digest::PowerSumP16(PowerSumDigest::from_parts(
                    tables,
                    &ps,
                    header.count as i64,
                    header.last_value,
                )))
            }
            32 => {
                let tables = FieldTables::<B32>::new(header.t as usize);
                Ok(Digest::PowerSumB32(PowerSumDigest::from_parts(
                    tables,
                    &ps,
                    header.count as i64,
                    header.last_value,
                )))
            }
            64 => {
                let tables = FieldTables::<M63>::new(header.t as usize);
                Ok(Digest::PowerSumM63(PowerSumDigest::from_parts(
                    tables,
                    &ps,
                    header.count as i64,
                    header.last_value,
                )))
            }
            w => Err(QuackError::Wire(WireError::UnsupportedDigest {
                kind: header.kind,
                width: w,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_insert_merge_decode_roundtrip() {
        let mut a = Digest::new(Kind::PowerSum, Backend::B32, 8);
        let mut b = Digest::new(Kind::PowerSum, Backend::B32, 8);
        for x in [1u64, 2, 3, 4, 5] {
            a.insert(x).unwrap();
        }
        for x in [1u64, 2, 4] {
            b.insert(x).unwrap();
        }
        a.merge_subtract(&b).unwrap();
        let mut got = a.decode(RootFinder::Auto).unwrap();
        got.sort_unstable();
        assert_eq!(got, vec![3, 5]);
    }

    #[test]
    fn facade_kind_mismatch_rejected() {
        let mut a = Digest::new(Kind::PowerSum, Backend::B32, 8);
        let b = Digest::new(Kind::StrA, Backend::B32, 8);
        assert!(matches!(
            a.merge_subtract(&b),
            Err(QuackError::KindMismatch(_))
        ));
    }

    #[test]
    fn facade_backend_mismatch_rejected() {
        let mut a = Digest::new(Kind::PowerSum, Backend::B32, 8);
        let b = Digest::new(Kind::PowerSum, Backend::P16, 8);
        assert!(matches!(
            a.merge_subtract(&b),
            Err(QuackError::KindMismatch(_))
        ));
    }

    #[test]
    fn facade_serialize_deserialize_power_sum() {
        let mut a = Digest::new(Kind::PowerSum, Backend::P16, 4);
        for x in [11u64, 22, 33] {
            a.insert(x).unwrap();
        }
        let bytes = a.serialize();
        let b = Digest::deserialize_power_sum(&bytes).unwrap();
        assert_eq!(a.count(), b.count());
        assert_eq!(
            match &a {
                Digest::PowerSumP16(d) => d.power_sums_external(),
                _ => unreachable!(),
            },
            match &b {
                Digest::PowerSumP16(d) => d.power_sums_external(),
                _ => unreachable!(),
            }
        );
    }
}
