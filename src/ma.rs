//! Modular arithmetic kernel (MA)
//!
//! Three interchangeable backends share one contract — [`FieldOps`] — for
//! addition, subtraction, multiplication, exponentiation, and inversion in
//! the prime field `GF(p)` at a fixed bit width `b ∈ {16, 32, 64}`. Backend
//! choice is per-connection, not per-op (the whole [`crate::psa::PowerSumDigest`]
//! is generic over one backend), so the dispatch below is a compile-time
//! generic rather than a runtime tag — virtual-call overhead would be
//! wasted on a choice made once per flow.
//!
//! - [`P16`] — `p = 65521`, widening 32×32→64 multiply with a precomputed
//!   reciprocal reduction.
//! - [`B32`] — `p = 2^32 − 5`, widening 64×64→128 multiply with Barrett
//!   reduction.
//! - [`M63`] — `p = 2^63 − 25`, Montgomery form with `R = 2^63`; the field
//!   is deliberately 63 bits (not 64) so the final conditional subtraction
//!   in REDC always has a spare top bit to work with.

#![allow(clippy::many_single_char_names)]

use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised by the modular-arithmetic kernel.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MaError {
    /// `inv(0)` was requested. Zero has no multiplicative inverse; this is a
    /// programming error in the caller, not a runtime fact about the field.
    #[error("invalid inverse: 0 has no multiplicative inverse mod p")]
    InvalidInverse,
}

/// Shared contract implemented by each field backend.
///
/// `Repr` is the backend's internal representation of a field element: for
/// [`P16`] and [`B32`] it is the canonical residue in `[0, P)`; for [`M63`]
/// it is the Montgomery-encoded value `x * R mod p`. Callers that only use
/// [`FieldOps::from_external`] / [`FieldOps::to_external`] at the boundary
/// never need to know which.
pub trait FieldOps: Copy + Clone + 'static {
    /// The field modulus (the largest prime below `2^b`, per backend).
    const P: u64;
    /// Bit width of the identifier this backend accepts (16, 32, or 64).
    const WIDTH_BITS: u32;
    /// Backend name as used by the `--backend` CLI flag and benchmark output.
    const NAME: &'static str;
    /// Internal representation of a field element.
    type Repr: Copy + Clone + Eq + std::fmt::Debug + Send + Sync + 'static;

    /// The additive identity.
    fn zero() -> Self::Repr;
    /// The multiplicative identity (Montgomery-encoded for [`M63`]).
    fn one() -> Self::Repr;
    /// `(x + y) mod p`.
    fn add(x: Self::Repr, y: Self::Repr) -> Self::Repr;
    /// `(x - y) mod p`.
    fn sub(x: Self::Repr, y: Self::Repr) -> Self::Repr;
    /// `(x * y) mod p`.
    fn mul(x: Self::Repr, y: Self::Repr) -> Self::Repr;
    /// `-x mod p`.
    fn neg(x: Self::Repr) -> Self::Repr {
        Self::sub(Self::zero(), x)
    }
    /// `x^k mod p` via square-and-multiply. `pow(x, 0)` is the multiplicative
    /// identity regardless of `x` (including `x = 0`).
    fn pow(x: Self::Repr, mut k: u64) -> Self::Repr {
        let mut base = x;
        let mut acc = Self::one();
        while k > 0 {
            if k & 1 == 1 {
                acc = Self::mul(acc, base);
            }
            base = Self::mul(base, base);
            k >>= 1;
        }
        acc
    }
    /// `x^-1 mod p` via Fermat's little theorem (`x^(p-2)`). Fails on `x = 0`.
    fn inv(x: Self::Repr) -> Result<Self::Repr, MaError> {
        if x == Self::zero() {
            return Err(MaError::InvalidInverse);
        }
        Ok(Self::pow(x, Self::P - 2))
    }
    /// Canonicalize (and encode, for Montgomery backends) a raw external
    /// integer into the backend's internal representation. `u` is reduced
    /// mod `p` first; callers are responsible for rejecting `u == 0` at the
    /// identifier layer (see [`crate::psa`]) since 0 is a forbidden identifier,
    /// not an invalid field element.
    fn from_external(u: u64) -> Self::Repr;
    /// Decode the internal representation back to the canonical residue in
    /// `[0, P)`. This is always the wire form, even under Montgomery.
    fn to_external(x: Self::Repr) -> u64;
}

// ============================================================================
// Backend P16 — precomputed-reciprocal reduction, p = 65521
// ============================================================================

/// 16-bit backend: `p = 65521`, the largest prime below `2^16`.
///
/// Multiplication widens both operands to `u64` (a 32×32→64 multiply is all
/// that's ever needed since both operands are < 2^16), then reduces with a
/// precomputed reciprocal of `p` instead of a hardware divide.
#[derive(Copy, Clone, Debug)]
pub struct P16;

const P16_P: u64 = 65521;
// floor(2^32 / p): one 64-bit reciprocal, computed once.
const P16_RECIP: u64 = (1u64 << 32) / P16_P;

#[inline]
fn p16_reduce(x: u64) -> u64 {
    // x < p^2 < 2^32, so a single reciprocal-multiply estimate plus at most
    // two conditional subtracts suffices.
    let q = (x * P16_RECIP) >> 32;
    let mut r = x - q * P16_P;
    if r >= P16_P {
        r -= P16_P;
    }
    if r >= P16_P {
        r -= P16_P;
    }
    r
}

impl FieldOps for P16 {
    const P: u64 = P16_P;
    const WIDTH_BITS: u32 = 16;
    const NAME: &'static str = "precompute";
    type Repr = u64;

    #[inline]
    fn zero() -> u64 {
        0
    }
    #[inline]
    fn one() -> u64 {
        1
    }
    #[inline]
    fn add(x: u64, y: u64) -> u64 {
        let s = x + y;
        if s >= P16_P {
            s - P16_P
        } else {
            s
        }
    }
    #[inline]
    fn sub(x: u64, y: u64) -> u64 {
        if x >= y {
            x - y
        } else {
            x + P16_P - y
        }
    }
    #[inline]
    fn mul(x: u64, y: u64) -> u64 {
        if x == 0 || y == 0 {
            return 0;
        }
        p16_reduce(x * y)
    }
    #[inline]
    fn from_external(u: u64) -> u64 {
        u % P16_P
    }
    #[inline]
    fn to_external(x: u64) -> u64 {
        x
    }
}

// ============================================================================
// Backend B32 — Barrett reduction, p = 2^32 - 5
// ============================================================================

/// 32-bit backend: `p = 2^32 − 5`.
///
/// Multiplication widens both operands to `u64` (product fits in 64 bits
/// since both operands are < 2^32), then reduces with Barrett's method using
/// a precomputed `μ = floor(2^64 / p)`.
#[derive(Copy, Clone, Debug)]
pub struct B32;

const B32_P: u64 = (1u64 << 32) - 5;
// floor(2^64 / p), needs 128-bit arithmetic to compute once.
static B32_MU: OnceLock<u64> = OnceLock::new();

#[inline]
fn b32_mu() -> u64 {
    *B32_MU.get_or_init(|| ((1u128 << 64) / (B32_P as u128)) as u64)
}

#[inline]
fn b32_reduce(product: u64) -> u64 {
    // q_hat = floor(product * mu / 2^64)
    let q_hat = ((product as u128 * b32_mu() as u128) >> 64) as u64;
    let mut r = product.wrapping_sub(q_hat.wrapping_mul(B32_P));
    // r may be off by a small constant; at most two conditional subtracts.
    if r >= B32_P {
        r -= B32_P;
    }
    if r >= B32_P {
        r -= B32_P;
    }
    r
}

impl FieldOps for B32 {
    const P: u64 = B32_P;
    const WIDTH_BITS: u32 = 32;
    const NAME: &'static str = "barrett";
    type Repr = u64;

    #[inline]
    fn zero() -> u64 {
        0
    }
    #[inline]
    fn one() -> u64 {
        1
    }
    #[inline]
    fn add(x: u64, y: u64) -> u64 {
        let s = x + y;
        if s >= B32_P {
            s - B32_P
        } else {
            s
        }
    }
    #[inline]
    fn sub(x: u64, y: u64) -> u64 {
        if x >= y {
            x - y
        } else {
            x + B32_P - y
        }
    }
    #[inline]
    fn mul(x: u64, y: u64) -> u64 {
        if x == 0 || y == 0 {
            return 0;
        }
        b32_reduce(x * y)
    }
    #[inline]
    fn from_external(u: u64) -> u64 {
        u % B32_P
    }
    #[inline]
    fn to_external(x: u64) -> u64 {
        x
    }
}

// ============================================================================
// Backend M63 — Montgomery form, p = 2^63 - 25, R = 2^63
// ============================================================================

/// 64-bit-identifier backend: `p = 2^63 − 25`, a 63-bit prime.
///
/// Internally represents elements in Montgomery form `x * R mod p` with
/// `R = 2^63` (chosen one bit shy of the machine word so REDC's final
/// conditional subtraction always has a spare guard bit). Multiplication is
/// Montgomery-reduce of the 126-bit product of two Montgomery forms.
#[derive(Copy, Clone, Debug)]
pub struct M63;

const M63_P: u64 = (1u64 << 63) - 25;
const M63_R_BITS: u32 = 63;
const M63_R_MASK: u128 = (1u128 << M63_R_BITS) - 1;

static M63_NEG_P_INV: OnceLock<u64> = OnceLock::new();
static M63_R2_MOD_P: OnceLock<u64> = OnceLock::new();
static M63_R_MOD_P: OnceLock<u64> = OnceLock::new();

/// `-p^-1 mod R` via Hensel/Newton lifting: the inverse of an odd `p` mod a
/// power of two doubles in precision each iteration, starting from the
/// trivial 1-bit inverse (`p` is odd, so `p * 1 ≡ 1 mod 2`).
fn compute_neg_p_inv() -> u64 {
    let p = M63_P as u128;
    let mut inv: u128 = 1; // p * inv ≡ 1 (mod 2)
    for _ in 0..7 {
        // doubles the number of correct bits each round; 7 rounds covers 2^64
        inv = (inv.wrapping_mul(2u128.wrapping_sub(p.wrapping_mul(inv)))) & ((1u128 << 64) - 1);
    }
    // inv is p^-1 mod 2^64; negate and mask to R = 2^63.
    let neg = (0u128.wrapping_sub(inv)) & ((1u128 << 64) - 1);
    (neg & M63_R_MASK) as u64
}

#[inline]
fn m63_neg_p_inv() -> u64 {
    *M63_NEG_P_INV.get_or_init(compute_neg_p_inv)
}

#[inline]
fn m63_redc(t: u128) -> u64 {
    // REDC(T) for R = 2^63: m = (T mod R) * p' mod R; t' = (T + m*p) / R;
    // conditional subtract.
    let p = M63_P as u128;
    let p_inv = m63_neg_p_inv() as u128;
    let m = ((t & M63_R_MASK).wrapping_mul(p_inv)) & M63_R_MASK;
    let t2 = (t + m * p) >> M63_R_BITS;
    let t2 = t2 as u64;
    if t2 >= M63_P {
        t2 - M63_P
    } else {
        t2
    }
}

#[inline]
fn m63_r_mod_p() -> u64 {
    *M63_R_MOD_P.get_or_init(|| ((1u128 << M63_R_BITS) % (M63_P as u128)) as u64)
}

#[inline]
fn m63_r2_mod_p() -> u64 {
    *M63_R2_MOD_P.get_or_init(|| {
        let r_mod_p = m63_r_mod_p() as u128;
        ((r_mod_p * r_mod_p) % (M63_P as u128)) as u64
    })
}

impl FieldOps for M63 {
    const P: u64 = M63_P;
    const WIDTH_BITS: u32 = 64;
    const NAME: &'static str = "montgomery";
    type Repr = u64;

    #[inline]
    fn zero() -> u64 {
        0
    }
    #[inline]
    fn one() -> u64 {
        // Montgomery-encoded 1 is R mod p.
        m63_r_mod_p()
    }
    #[inline]
    fn add(x: u64, y: u64) -> u64 {
        let s = x + y;
        if s >= M63_P {
            s - M63_P
        } else {
            s
        }
    }
    #[inline]
    fn sub(x: u64, y: u64) -> u64 {
        if x >= y {
            x - y
        } else {
            x + M63_P - y
        }
    }
    #[inline]
    fn mul(x: u64, y: u64) -> u64 {
        if x == 0 || y == 0 {
            return 0;
        }
        m63_redc((x as u128) * (y as u128))
    }
    #[inline]
    fn from_external(u: u64) -> u64 {
        let canon = u % M63_P;
        // Encode: u * R mod p = REDC(u * R^2).
        m63_redc((canon as u128) * (m63_r2_mod_p() as u128))
    }
    #[inline]
    fn to_external(x: u64) -> u64 {
        // Decode: REDC(x * 1) = x * R^-1 mod p.
        m63_redc(x as u128)
    }
}
