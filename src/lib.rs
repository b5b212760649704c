//! quACK: approximate/selective set-difference digests over small prime
//! fields.
//!
//! A sender and an observer each maintain a small, fixed-size digest over
//! the identifiers (packet sequence numbers, log offsets, ...) they have
//! seen. Subtracting one digest from another recovers the multiset of
//! identifiers the two streams disagree on, as long as that set is no
//! larger than the digest's threshold `t` — without either side ever
//! exchanging the full stream.
//!
//! ## Modules
//!
//! - [`ma`] — the modular-arithmetic kernel: three interchangeable `GF(p)`
//!   backends (`P16`, `B32`, `M63`) behind one [`ma::FieldOps`] trait.
//! - [`psa`] — the power-sum accumulator, the digest this crate is built
//!   around: `t` field elements, `O(t)` insert/remove, `O(t)`
//!   merge-subtract.
//! - [`decode`] — recovers the set difference from a subtracted power-sum
//!   digest via Newton's identities and `GF(p)` root-finding.
//! - [`strawman`] — three baseline digests (sliding distinct set, circular
//!   buffer, counter map) with the same insert/merge-subtract/decode shape,
//!   used for comparison.
//! - [`wire`] — the binding byte-level framing shared by every digest kind.
//! - [`digest`] — a [`digest::Digest`] facade unifying all of the above
//!   behind one enum, for callers that pick a digest kind at runtime.
//!
//! ## Invariants
//!
//! - Identifier `0` is reserved and rejected by every digest's `insert`/
//!   `remove` (it is the field's additive identity, indistinguishable from
//!   "never inserted" in a power-sum digest).
//! - Backend choice is per-connection: a [`psa::PowerSumDigest<B>`] is
//!   generic over exactly one [`ma::FieldOps`] backend for its whole
//!   lifetime, not re-chosen per operation.
//! - The wire format always carries canonical (non-Montgomery) residues,
//!   regardless of which backend produced them.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Modular-arithmetic kernel: `GF(p)` backends `P16`/`B32`/`M63`.
pub mod ma;
/// Power-sum accumulator: the digest's core data structure.
pub mod psa;
/// Decoder: Newton's identities plus `GF(p)` root-finding.
pub mod decode;
/// Strawman digests: sliding distinct set, circular buffer, counter map.
pub mod strawman;
/// Binding wire format shared by every digest kind.
pub mod wire;
/// Digest facade unifying every kind/backend behind one enum.
pub mod digest;

pub use decode::{DecodeError, RootFinder};
pub use digest::{Backend, Digest, Kind, QuackError};
pub use ma::{FieldOps, MaError, B32, M63, P16};
pub use psa::{FieldTables, PowerSumDigest, PsaError};
pub use strawman::StrawmanError;
pub use wire::WireError;
