//! Component I: decentralized (no-trusted-dealer) multi-client IPE.
//!
//! Unlike [`crate::schemes::multi`], no single authority ever holds
//! every client's secret material. Setup proceeds in two ordered
//! phases per client: Phase 1 publishes a public contribution (derived
//! from that client's own secret share) that every other client needs
//! before Phase 2 can run; Phase 2 folds the other clients' Phase-1
//! publications into a private key share. `DeriveKey` for a label
//! collects one key-share message per client and sums them; `Decrypt`
//! needs every client's ciphertext for that same label plus the
//! combined key.

pub mod dmcfe;
pub mod damgard_dec_multi;
