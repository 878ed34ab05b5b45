//! Components H: central-authority multi-input IPE. A single trusted
//! authority runs `Setup` for all `n` clients and holds the full
//! `MSK`; each client only ever sees its own encryption key. Unlike
//! the function-hiding multi-input scheme in
//! [`crate::schemes::fh_multi_ipe`] (no pairing, no function-hiding),
//! cross-client masking here is a plain one-time pad `u_i` embedded
//! directly into each client's plaintext exponent at encryption time;
//! the authority publishes the *exact* (unbounded, un-reduced)
//! aggregate `Z = sum_i <u_i, y_i>` as part of the functional key so
//! `Decrypt` can subtract it before the final small-bound discrete-log
//! search.

pub mod damgard_multi;
pub mod ddh_multi;
pub mod paillier_multi;
