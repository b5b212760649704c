//! Power-sum accumulator (PSA)
//!
//! A fixed-length vector of `t` field elements maintaining the first `t`
//! power sums `Σ xᵢᵏ` of a multiset of inserted identifiers, plus a signed
//! insert/remove counter. This is the digest the sidekick and the sender
//! each maintain per flow; two PSAs of the same `(backend, t)` subtract
//! (`merge_subtract`) into a third PSA whose [`crate::decode`] recovers the
//! set difference whenever it is no larger than `t`.
//!
//! `insert` is commutative on the accumulated state — the final power sums
//! depend only on the multiset of inserts, not their order (spec §5,
//! Property 1) — which is what lets an observer sniff packets out of order
//! and still produce a digest the sender can subtract from.

use std::sync::Arc;
use thiserror::Error;

use crate::ma::FieldOps;

/// Errors raised by the power-sum accumulator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PsaError {
    /// Insert/remove of identifier 0 (or a multiple of `p`), reserved.
    #[error("forbidden identifier: 0 (or a multiple of the field modulus) was inserted")]
    ForbiddenIdentifier,
    /// `merge_subtract` between PSAs with different thresholds.
    #[error("threshold mismatch: self.t = {self_t}, other.t = {other_t}")]
    ThresholdMismatch { self_t: usize, other_t: usize },
}

/// Precomputed `1/k mod p` for `k = 1..=t`, shared read-only across every
/// PSA of the same `(backend, t)` (spec §5, "Shared resources"; Design
/// Notes, "the `1/k mod p` precomputation table ... is shared by all PSAs
/// of the same `(b, t)`").
///
/// `inv_k[0]` is unused filler (zero); `inv_k[k]` holds `1/k mod p` for
/// `k = 1..=t`, indexed directly by `k` to avoid off-by-one arithmetic at
/// every call site.
pub struct FieldTables<B: FieldOps> {
    pub(crate) t: usize,
    pub(crate) inv_k: Box<[B::Repr]>,
}

impl<B: FieldOps> FieldTables<B> {
    /// Build the table for threshold `t`. `t` must be in `1..=1024` per the
    /// wire format's threshold field width (spec §6.1); this is enforced by
    /// [`crate::digest::Digest::new`], not here, so the table itself stays a
    /// simple, panic-free building block.
    pub fn new(t: usize) -> Arc<Self> {
        let mut inv_k = vec![B::zero(); t + 1];
        for k in 1..=t {
            let kf = B::from_external(k as u64);
            // k < p for every supported (b, t) pair, so inv always succeeds.
            inv_k[k] = B::inv(kf).expect("k < p is never zero in GF(p)");
        }
        Arc::new(Self {
            t,
            inv_k: inv_k.into_boxed_slice(),
        })
    }
}

/// The power-sum digest itself.
#[derive(Clone)]
pub struct PowerSumDigest<B: FieldOps> {
    tables: Arc<FieldTables<B>>,
    power_sums: Box<[B::Repr]>,
    count: i64,
    last_value: u64,
}

impl<B: FieldOps> PowerSumDigest<B> {
    /// Construct an empty digest with threshold `t` (all power sums zero).
    pub fn new(t: usize) -> Self {
        Self::with_tables(FieldTables::new(t))
    }

    /// Construct an empty digest sharing an existing, already-built table
    /// (the intended path when many flows share one `(backend, t)`).
    pub fn with_tables(tables: Arc<FieldTables<B>>) -> Self {
        let t = tables.t;
        Self {
            tables,
            power_sums: vec![B::zero(); t].into_boxed_slice(),
            count: 0,
            last_value: 0,
        }
    }

    /// Threshold `t`: the maximum decodable set-difference size.
    pub fn threshold(&self) -> usize {
        self.power_sums.len()
    }

    /// Net insert/remove count. May be negative after a merge-subtract.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// The most recently inserted identifier (0 if never inserted).
    pub fn last_value(&self) -> u64 {
        self.last_value
    }

    /// Canonical power sums `p_1..p_t`, in the wire's external representation.
    pub fn power_sums_external(&self) -> Vec<u64> {
        self.power_sums.iter().map(|&x| B::to_external(x)).collect()
    }

    /// Rebuild a digest directly from externally-represented power sums
    /// (used by [`crate::wire::deserialize`]; encodes into the backend's
    /// internal representation, which is a no-op except under Montgomery).
    pub(crate) fn from_parts(
        tables: Arc<FieldTables<B>>,
        power_sums_external: &[u64],
        count: i64,
        last_value: u64,
    ) -> Self {
        let power_sums = power_sums_external
            .iter()
            .map(|&u| B::from_external(u))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            tables,
            power_sums,
            count,
            last_value,
        }
    }

    pub(crate) fn tables(&self) -> &Arc<FieldTables<B>> {
        &self.tables
    }

    /// Insert identifier `x`. Cost: `t` field multiplications plus `t`
    /// additions, done incrementally (`prev *= x`) rather than repeated
    /// `pow`. Fails without mutating state if `x` is a forbidden identifier.
    pub fn insert(&mut self, x: u64) -> Result<(), PsaError> {
        let xf = B::from_external(x);
        if xf == B::zero() {
            return Err(PsaError::ForbiddenIdentifier);
        }
        let mut power = xf;
        for slot in self.power_sums.iter_mut() {
            *slot = B::add(*slot, power);
            power = B::mul(power, xf);
        }
        self.count += 1;
        self.last_value = x;
        tracing::trace!(width = B::WIDTH_BITS, count = self.count, "psa insert");
        Ok(())
    }

    /// Remove identifier `x` (the symmetric inverse of `insert`). Used by
    /// STR-C-like flows and tests; the main sidekick flow uses only `insert`
    /// plus [`PowerSumDigest::merge_subtract`].
    pub fn remove(&mut self, x: u64) -> Result<(), PsaError> {
        let xf = B::from_external(x);
        if xf == B::zero() {
            return Err(PsaError::ForbiddenIdentifier);
        }
        let mut power = xf;
        for slot in self.power_sums.iter_mut() {
            *slot = B::sub(*slot, power);
            power = B::mul(power, xf);
        }
        self.count -= 1;
        tracing::trace!(width = B::WIDTH_BITS, count = self.count, "psa remove");
        Ok(())
    }

    /// Elementwise subtract `other` from `self`: `self.power_sums[k] -=
    /// other.power_sums[k]`, `self.count -= other.count`. Requires equal
    /// thresholds. Commutes with insert/remove on the underlying multiset.
    pub fn merge_subtract(&mut self, other: &Self) -> Result<(), PsaError> {
        if self.threshold() != other.threshold() {
            return Err(PsaError::ThresholdMismatch {
                self_t: self.threshold(),
                other_t: other.threshold(),
            });
        }
        for (a, b) in self.power_sums.iter_mut().zip(other.power_sums.iter()) {
            *a = B::sub(*a, *b);
        }
        self.count -= other.count;
        tracing::debug!(
            width = B::WIDTH_BITS,
            resulting_count = self.count,
            "psa merge_subtract"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ma::{B32, P16};

    #[test]
    fn insert_is_order_independent() {
        let mut a = PowerSumDigest::<B32>::new(8);
        let mut b = PowerSumDigest::<B32>::new(8);
        for x in [5u64, 11, 5, 9001, 3] {
            a.insert(x).unwrap();
        }
        for x in [9001u64, 3, 5, 5, 11] {
            b.insert(x).unwrap();
        }
        assert_eq!(a.power_sums_external(), b.power_sums_external());
        assert_eq!(a.count(), b.count());
    }

    #[test]
    fn insert_zero_is_forbidden_and_leaves_state_unchanged() {
        let mut d = PowerSumDigest::<P16>::new(4);
        d.insert(7).unwrap();
        let before = d.power_sums_external();
        let before_count = d.count();
        assert_eq!(d.insert(0), Err(PsaError::ForbiddenIdentifier));
        assert_eq!(d.power_sums_external(), before);
        assert_eq!(d.count(), before_count);
    }

    #[test]
    fn merge_subtract_threshold_mismatch() {
        let a = PowerSumDigest::<P16>::new(4);
        let b = PowerSumDigest::<P16>::new(5);
        let mut a2 = a.clone();
        assert_eq!(
            a2.merge_subtract(&b),
            Err(PsaError::ThresholdMismatch {
                self_t: 4,
                other_t: 5
            })
        );
    }

    #[test]
    fn merge_subtract_recovers_difference_power_sums() {
        let mut a = PowerSumDigest::<P16>::new(10);
        let mut b = PowerSumDigest::<P16>::new(10);
        for x in 1..=100u64 {
            a.insert(x).unwrap();
        }
        for x in (1..=100u64).filter(|&x| x != 7 && x != 42) {
            b.insert(x).unwrap();
        }
        let mut c = a.clone();
        c.merge_subtract(&b).unwrap();
        assert_eq!(c.count(), 2);
        // p_1 of {7, 42} is 49; spot-check power_sums[0] (k=1).
        assert_eq!(c.power_sums_external()[0], 49 % P16::P);
    }
}
