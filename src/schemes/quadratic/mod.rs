//! Component J: quadratic FE, `Enc(x)`/`Enc(y)` paired against a key
//! for `F in Z^{n x m}` to reveal `x^T F y`.
//!
//! [`sgp`] is secret-key (`Encrypt` needs `MSK`); [`quad`] is public-key
//! (`Encrypt` needs only `MPK`), reusing the same pairing-cancellation
//! shape as [`crate::schemes::fhipe`]'s `(B, B*)` matrix pair but
//! applying it through public lifted-matrix multiplication rather than
//! in the clear.

pub mod quad;
pub mod sgp;
