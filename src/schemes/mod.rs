//! Components G, H, I, J: the functional-encryption schemes themselves.
//!
//! Every scheme follows the same six-stage contract from `Setup`
//! through `Decrypt` (see each submodule), built entirely on top of
//! `bigint`, `linalg`, `group`, `dlog`, and `numtheory`. A scheme is a
//! stateless strategy over its own `Params`/`Msk`/`Mpk`/`FunctionalKey`/
//! `Ciphertext` types; nothing here holds a back-reference to another
//! scheme's state.

pub mod damgard;
pub mod fh_multi_ipe;
pub mod fhipe;
pub mod lwe;
pub mod paillier;
pub mod partial_fhipe;
pub mod ring_lwe;
pub mod simple_ddh;

pub mod decentralized;
pub mod multi;
pub mod quadratic;
