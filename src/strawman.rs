//! Strawman digests (STR)
//!
//! Three baseline variants used for comparison against the power-sum digest
//! (and occasionally as production fallbacks). All three expose the same
//! insert/merge-subtract/decode triple as [`crate::psa::PowerSumDigest`], so
//! a connection can be reconfigured to any of them without touching the
//! caller (spec §4.4, §6.2).
//!
//! Unlike the power-sum digest, these store raw identifiers rather than a
//! compressed algebraic summary, so `merge_subtract` computes the
//! difference eagerly (there is no "subtracted digest" to decode later —
//! `decode` just returns what `merge_subtract` already resolved).

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

/// Errors raised by the strawman digests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StrawmanError {
    /// Insert/remove of identifier 0, reserved (mirrors the power-sum digest
    /// so callers can swap digest kinds without changing error handling).
    #[error("forbidden identifier: 0 is reserved")]
    ForbiddenIdentifier,
    /// `merge_subtract` between strawmen with different window/capacity.
    #[error("window mismatch: self.w = {self_w}, other.w = {other_w}")]
    WindowMismatch { self_w: usize, other_w: usize },
}

/// STR-A: a sliding window of the last `w` *distinct* identifiers.
/// Insert evicts the least-recently-seen entry once the window is full.
#[derive(Clone, Debug)]
pub struct SlidingDistinctSet {
    w: usize,
    order: VecDeque<u64>,
    last_value: u64,
}

impl SlidingDistinctSet {
    pub fn new(w: usize) -> Self {
        Self {
            w,
            order: VecDeque::with_capacity(w),
            last_value: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.w
    }

    /// The most recently inserted identifier, for diagnostics (0 if never
    /// inserted, or after a comparison reset it — see
    /// [`SlidingDistinctSet::merge_subtract`]).
    pub fn last_value(&self) -> u64 {
        self.last_value
    }

    pub fn insert(&mut self, x: u64) -> Result<(), StrawmanError> {
        if x == 0 {
            return Err(StrawmanError::ForbiddenIdentifier);
        }
        if let Some(pos) = self.order.iter().position(|&v| v == x) {
            self.order.remove(pos);
        } else if self.order.len() >= self.w {
            self.order.pop_front();
        }
        self.order.push_back(x);
        self.last_value = x;
        Ok(())
    }

    pub fn remove(&mut self, x: u64) -> Result<(), StrawmanError> {
        if x == 0 {
            return Err(StrawmanError::ForbiddenIdentifier);
        }
        if let Some(pos) = self.order.iter().position(|&v| v == x) {
            self.order.remove(pos);
        }
        Ok(())
    }

    /// Elements present in `self` but not in `other`; `self` becomes that
    /// difference set. A comparison against a peer digest is a diagnostic
    /// boundary: `last_value` resets to 0 here (mirroring the original
    /// implementation's "last value" reset through the strawman comparison
    /// path), since the most-recently-inserted identifier is no longer
    /// meaningful once the window has been replaced by a difference.
    pub fn merge_subtract(&mut self, other: &Self) -> Result<(), StrawmanError> {
        if self.w != other.w {
            return Err(StrawmanError::WindowMismatch {
                self_w: self.w,
                other_w: other.w,
            });
        }
        self.order.retain(|v| !other.order.contains(v));
        self.last_value = 0;
        Ok(())
    }

    pub fn count(&self) -> i64 {
        self.order.len() as i64
    }

    /// Current contents, oldest first.
    pub fn decode(&self) -> Vec<u64> {
        self.order.iter().copied().collect()
    }

    pub fn elements(&self) -> impl Iterator<Item = u64> + '_ {
        self.order.iter().copied()
    }
}

/// STR-B: a fixed-capacity circular buffer of the last `w` identifiers,
/// duplicates preserved.
#[derive(Clone, Debug)]
pub struct CircularBuffer {
    w: usize,
    buf: VecDeque<u64>,
    last_value: u64,
}

impl CircularBuffer {
    pub fn new(w: usize) -> Self {
        Self {
            w,
            buf: VecDeque::with_capacity(w),
            last_value: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.w
    }

    /// The most recently inserted identifier, for diagnostics (0 if never
    /// inserted, or after a comparison reset it).
    pub fn last_value(&self) -> u64 {
        self.last_value
    }

    pub fn insert(&mut self, x: u64) -> Result<(), StrawmanError> {
        if x == 0 {
            return Err(StrawmanError::ForbiddenIdentifier);
        }
        if self.buf.len() >= self.w {
            self.buf.pop_front();
        }
        self.buf.push_back(x);
        self.last_value = x;
        Ok(())
    }

    pub fn remove(&mut self, x: u64) -> Result<(), StrawmanError> {
        if x == 0 {
            return Err(StrawmanError::ForbiddenIdentifier);
        }
        if let Some(pos) = self.buf.iter().position(|&v| v == x) {
            self.buf.remove(pos);
        }
        Ok(())
    }

    /// Set difference counting multiplicity: `self` becomes the multiset of
    /// entries whose count in `self` exceeds their count in `other`.
    /// Resets `last_value` to 0, the same diagnostic reset as
    /// [`SlidingDistinctSet::merge_subtract`].
    pub fn merge_subtract(&mut self, other: &Self) -> Result<(), StrawmanError> {
        if self.w != other.w {
            return Err(StrawmanError::WindowMismatch {
                self_w: self.w,
                other_w: other.w,
            });
        }
        let mut other_counts: HashMap<u64, usize> = HashMap::new();
        for &v in &other.buf {
            *other_counts.entry(v).or_insert(0) += 1;
        }
        let mut out = VecDeque::new();
        for &v in &self.buf {
            let slot = other_counts.entry(v).or_insert(0);
            if *slot > 0 {
                *slot -= 1;
            } else {
                out.push_back(v);
            }
        }
        self.buf = out;
        self.last_value = 0;
        Ok(())
    }

    pub fn count(&self) -> i64 {
        self.buf.len() as i64
    }

    pub fn decode(&self) -> Vec<u64> {
        self.buf.iter().copied().collect()
    }

    pub fn elements(&self) -> impl Iterator<Item = u64> + '_ {
        self.buf.iter().copied()
    }
}

/// STR-C: identifier -> running count, capped at a sliding window (here, a
/// window over insert *operations*: once `w` inserts have been recorded,
/// the oldest insert's contribution is retired).
#[derive(Clone, Debug)]
pub struct CounterMap {
    w: usize,
    counts: HashMap<u64, i64>,
    order: VecDeque<u64>,
    last_value: u64,
}

impl CounterMap {
    pub fn new(w: usize) -> Self {
        Self {
            w,
            counts: HashMap::new(),
            order: VecDeque::with_capacity(w),
            last_value: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.w
    }

    /// The most recently inserted identifier, for diagnostics (0 if never
    /// inserted, or after a comparison reset it).
    pub fn last_value(&self) -> u64 {
        self.last_value
    }

    pub fn insert(&mut self, x: u64) -> Result<(), StrawmanError> {
        if x == 0 {
            return Err(StrawmanError::ForbiddenIdentifier);
        }
        if self.order.len() >= self.w {
            if let Some(oldest) = self.order.pop_front() {
                self.decrement(oldest);
            }
        }
        *self.counts.entry(x).or_insert(0) += 1;
        self.order.push_back(x);
        self.last_value = x;
        Ok(())
    }

    pub fn remove(&mut self, x: u64) -> Result<(), StrawmanError> {
        if x == 0 {
            return Err(StrawmanError::ForbiddenIdentifier);
        }
        self.decrement(x);
        Ok(())
    }

    fn decrement(&mut self, x: u64) {
        if let Some(c) = self.counts.get_mut(&x) {
            *c -= 1;
            if *c == 0 {
                self.counts.remove(&x);
            }
        }
    }

    /// Pairwise subtract counters; `self` keeps only identifiers with
    /// positive residual count. Resets `last_value` to 0, the same
    /// diagnostic reset as [`SlidingDistinctSet::merge_subtract`].
    pub fn merge_subtract(&mut self, other: &Self) -> Result<(), StrawmanError> {
        if self.w != other.w {
            return Err(StrawmanError::WindowMismatch {
                self_w: self.w,
                other_w: other.w,
            });
        }
        for (&id, &c) in other.counts.iter() {
            *self.counts.entry(id).or_insert(0) -= c;
        }
        self.counts.retain(|_, &mut c| c > 0);
        self.last_value = 0;
        Ok(())
    }

    pub fn count(&self) -> i64 {
        self.counts.values().sum()
    }

    /// Identifiers with positive residual count, expanded to their count.
    pub fn decode(&self) -> Vec<u64> {
        let mut out = Vec::new();
        for (&id, &c) in self.counts.iter() {
            for _ in 0..c {
                out.push(id);
            }
        }
        out
    }

    pub fn entries(&self) -> impl Iterator<Item = (u64, i64)> + '_ {
        self.counts.iter().map(|(&k, &v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_a_evicts_oldest_beyond_window() {
        let mut s = SlidingDistinctSet::new(3);
        for x in [1, 2, 3, 4] {
            s.insert(x).unwrap();
        }
        assert_eq!(s.decode(), vec![2, 3, 4]);
    }

    #[test]
    fn str_a_decode_against_other() {
        let mut a = SlidingDistinctSet::new(10);
        let mut b = SlidingDistinctSet::new(10);
        for x in [1, 2, 3, 4, 5] {
            a.insert(x).unwrap();
        }
        for x in [2, 4] {
            b.insert(x).unwrap();
        }
        a.merge_subtract(&b).unwrap();
        let mut got = a.decode();
        got.sort_unstable();
        assert_eq!(got, vec![1, 3, 5]);
    }

    #[test]
    fn str_b_preserves_duplicates_and_counts_them() {
        let mut a = CircularBuffer::new(10);
        let mut b = CircularBuffer::new(10);
        for x in [5, 5, 11] {
            a.insert(x).unwrap();
        }
        for x in [5] {
            b.insert(x).unwrap();
        }
        a.merge_subtract(&b).unwrap();
        let mut got = a.decode();
        got.sort_unstable();
        assert_eq!(got, vec![5, 11]);
    }

    #[test]
    fn str_c_tracks_residual_positive_counts() {
        let mut a = CounterMap::new(100);
        let mut b = CounterMap::new(100);
        for x in [1, 1, 1, 2] {
            a.insert(x).unwrap();
        }
        for x in [1] {
            b.insert(x).unwrap();
        }
        a.merge_subtract(&b).unwrap();
        let mut got = a.decode();
        got.sort_unstable();
        assert_eq!(got, vec![1, 1, 2]);
    }

    #[test]
    fn last_value_tracks_most_recent_insert_and_resets_on_comparison() {
        let mut a = SlidingDistinctSet::new(4);
        let b = SlidingDistinctSet::new(4);
        assert_eq!(a.last_value(), 0);
        a.insert(5).unwrap();
        a.insert(9).unwrap();
        assert_eq!(a.last_value(), 9);
        a.merge_subtract(&b).unwrap();
        assert_eq!(a.last_value(), 0);

        let mut c = CircularBuffer::new(4);
        let d = CircularBuffer::new(4);
        c.insert(7).unwrap();
        assert_eq!(c.last_value(), 7);
        c.merge_subtract(&d).unwrap();
        assert_eq!(c.last_value(), 0);

        let mut e = CounterMap::new(4);
        let f = CounterMap::new(4);
        e.insert(3).unwrap();
        assert_eq!(e.last_value(), 3);
        e.merge_subtract(&f).unwrap();
        assert_eq!(e.last_value(), 0);
    }

    #[test]
    fn window_mismatch_rejected() {
        let a = SlidingDistinctSet::new(4);
        let b = SlidingDistinctSet::new(5);
        let mut a2 = a.clone();
        assert_eq!(
            a2.merge_subtract(&b),
            Err(StrawmanError::WindowMismatch {
                self_w: 4,
                other_w: 5
            })
        );
    }
}
