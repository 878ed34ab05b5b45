//! Crate root: public surface and shared aliases.
//!
//! This crate implements a functional-encryption (FE) engine: single- and
//! multi-input inner-product FE (IPE) over several hardness assumptions
//! (DDH, Damgård, Paillier, LWE, Ring-LWE, pairings), their decentralized
//! (no-trusted-dealer) counterparts, and quadratic FE (`x^T F y`) built on
//! top of a pairing-based, function-hiding IPE.
//!
//! ## Layout
//!
//! - [`bigint`] — arbitrary-precision signed integers, the common currency
//!   every component above it speaks.
//! - [`sampler`] — the distributions (uniform, discrete Gaussian, Bernoulli,
//!   deterministic) every scheme's `Setup`/`Encrypt` draws randomness from.
//! - [`linalg`] — dense integer vectors/matrices.
//! - [`group`] — `G1`/`G2`/`GT` group vectors/matrices over the BN254
//!   pairing, for the pairing-based schemes.
//! - [`dlog`] — baby-step/giant-step discrete-log recovery in `Z_p^*` and
//!   `GT`, the final step of every scheme whose decryption leaves the
//!   answer in an exponent.
//! - [`numtheory`] — safe-prime/generator search and Paillier modulus
//!   generation, feeding the discrete-log-based schemes' `Setup`.
//! - [`error`] — the [`error::FeError`] taxonomy every public operation
//!   returns.
//! - [`schemes`] — the FE constructions themselves.
//!
//! No API in this crate panics on malformed input; every fallible operation
//! returns [`error::FeResult`].

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Component A: arbitrary-precision signed-integer facade.
pub mod bigint;
/// Shared error taxonomy.
pub mod error;
/// Component D: `G1`/`G2`/`GT` group vectors and matrices over BN254.
pub mod group;
/// Component E: discrete-log recovery in `Z_p^*` and `GT`.
pub mod dlog;
/// Component C: dense integer linear algebra.
pub mod linalg;
/// Component F: safe-prime/generator search, Paillier modulus generation.
pub mod numtheory;
/// Component B: samplers (uniform, discrete Gaussian, Bernoulli, deterministic).
pub mod sampler;
/// Components G, H, I: the FE schemes themselves.
pub mod schemes;

pub use bigint::Integer;
pub use error::{FeError, FeResult};
