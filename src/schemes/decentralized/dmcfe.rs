//! Decentralized multi-client IPE (DMCFE): `n` clients, each
//! contributing one scalar `x_i` per label, jointly support functional
//! keys for `y = (y_1, .., y_n)` that decrypt to `sum_i y_i * x_i` —
//! without any single party ever holding every client's secret.
//!
//! Two-phase setup per client, mirroring an actual multi-party
//! protocol's message order:
//!
//! - **Phase 1** ([`client_phase1`]): client `i` samples a private
//!   pairwise-DH secret pair `t_i = (t_i0, t_i1)` and publishes
//!   `t_pub_i = (g^{t_i0}, g^{t_i1})`. Every client's Phase 1 message
//!   must be collected before any client's Phase 2 can run.
//! - **Phase 2** ([`client_phase2`]): given every client's Phase-1
//!   public share, client `i` derives a noise term `T_i = (T_i0,
//!   T_i1)` from the pairwise Diffie-Hellman secret it shares with
//!   every other client, hashed down to a scalar and telescoped with a
//!   sign fixed by client index (`i < i'` contributes `+`, `i > i'`
//!   contributes `-`), so `sum_i T_i = 0 mod (p-1)` exactly. Client `i`
//!   also samples its own encryption mask `s_i = (s_i0, s_i1)` here.
//!
//! Per-label encryption masks `x_i` by `s_i` scaled by a hash of the
//! label (`H(label)`, two scalars via SHA-256/SHA-512); `T_i` only
//! enters at key-share derivation time, where it cancels across all
//! clients regardless of the requested `y`.
//!
//! This implementation runs the DH exchange directly (every client's
//! secret is reachable in-process, since there is no network layer in
//! this crate) rather than over a transport — a real deployment would
//! replace [`client_phase2`]'s internals with an authenticated
//! exchange, without changing the public shape of `ClientKey` or
//! anything downstream.

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_zp, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::numtheory::{find_full_order_generator, generate_safe_prime};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

/// Public parameters: prime `p`, generator `g`, client count `n`,
/// per-coordinate bounds on `x_i`/`y_i`.
#[derive(Clone, Debug)]
pub struct Params {
    pub p: Integer,
    pub g: Integer,
    pub n: usize,
    pub bound_x: Integer,
    pub bound_y: Integer,
}

/// Client `i`'s Phase-1 secret: its pairwise-DH exponent pair.
#[derive(Clone, Debug)]
pub struct Phase1Secret {
    pub idx: usize,
    pub t_sec: (Integer, Integer),
}

/// Client `i`'s Phase-1 public message, broadcast to every other
/// client before Phase 2 may run.
#[derive(Clone, Debug)]
pub struct PublicShare {
    pub idx: usize,
    pub t_pub: (Integer, Integer),
}

/// Client `i`'s completed key material after Phase 2: its encryption
/// mask `s_i` and noise term `T_i`.
#[derive(Clone, Debug)]
pub struct ClientKey {
    pub idx: usize,
    pub s: (Integer, Integer),
    pub big_t: (Integer, Integer),
}

/// One client's per-label ciphertext.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c: Integer,
}

/// A single client's contribution to a functional key for `y`.
#[derive(Clone, Debug)]
pub struct KeyShare {
    pub d: (Integer, Integer),
}

/// The combined functional key for `y = (y_1, .., y_n)`: `sum_i
/// KeyShare_i`.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub d: (Integer, Integer),
}

/// `H(bytes) = (SHA256(bytes) mod m, SHA512(bytes) mod m)`.
fn hash_to_field(bytes: &[u8], m: &Integer) -> (Integer, Integer) {
    let h0 = Sha256::digest(bytes);
    let h1 = Sha512::digest(bytes);
    (Integer::from_bytes_be(&h0).modulo(m), Integer::from_bytes_be(&h1).modulo(m))
}

/// Generate shared parameters for `n` clients.
pub fn setup(n: usize, bound_x: Integer, bound_y: Integer, bits: u64, rng: &mut dyn RngCore) -> FeResult<Params> {
    let sp = generate_safe_prime(bits, rng)?;
    let n_big = Integer::from_u64(n as u64);
    if n_big.mul(&bound_x).mul(&bound_y) >= sp.p {
        return Err(FeError::setup("dmcfe::Setup", "n * bound_x * bound_y must be < p"));
    }
    let g = find_full_order_generator(&sp.p, &sp.q, rng)?;
    Ok(Params { p: sp.p, g, n, bound_x, bound_y })
}

/// Phase 1: client `idx` samples its pairwise-DH secret and publishes
/// the corresponding public share.
pub fn client_phase1(params: &Params, idx: usize, rng: &mut dyn RngCore) -> FeResult<(Phase1Secret, PublicShare)> {
    if idx >= params.n {
        return Err(FeError::dim_mismatch("dmcfe::ClientPhase1", params.n, idx + 1));
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let t0 = Integer::sample_uniform(&p_minus_one, rng);
    let t1 = Integer::sample_uniform(&p_minus_one, rng);
    let pub0 = params.g.mod_exp(&t0, &params.p).expect("g invertible mod prime p");
    let pub1 = params.g.mod_exp(&t1, &params.p).expect("g invertible mod prime p");
    Ok((
        Phase1Secret { idx, t_sec: (t0, t1) },
        PublicShare { idx, t_pub: (pub0, pub1) },
    ))
}

/// Phase 2: given every client's Phase-1 public share (including its
/// own), client `idx` derives its noise term `T_i` and samples its
/// fresh encryption mask `s_i`.
pub fn client_phase2(
    params: &Params,
    secret: &Phase1Secret,
    shares: &[PublicShare],
    rng: &mut dyn RngCore,
) -> FeResult<ClientKey> {
    if shares.len() != params.n {
        return Err(FeError::dim_mismatch("dmcfe::ClientPhase2", params.n, shares.len()));
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let mut big_t0 = Integer::zero();
    let mut big_t1 = Integer::zero();
    for other in shares {
        if other.idx == secret.idx {
            continue;
        }
        let dh0 = other.t_pub.0.mod_exp(&secret.t_sec.0, &params.p).expect("t_pub invertible mod prime p");
        let dh1 = other.t_pub.1.mod_exp(&secret.t_sec.1, &params.p).expect("t_pub invertible mod prime p");
        let (h_dh0, _) = hash_to_field(&dh0.to_bytes_be(), &p_minus_one);
        let (_, h_dh1) = hash_to_field(&dh1.to_bytes_be(), &p_minus_one);
        let sign_positive = secret.idx < other.idx;
        if sign_positive {
            big_t0 = big_t0.add(&h_dh0).modulo(&p_minus_one);
            big_t1 = big_t1.add(&h_dh1).modulo(&p_minus_one);
        } else {
            big_t0 = big_t0.sub(&h_dh0).modulo(&p_minus_one);
            big_t1 = big_t1.sub(&h_dh1).modulo(&p_minus_one);
        }
    }
    let s0 = Integer::sample_uniform(&p_minus_one, rng);
    let s1 = Integer::sample_uniform(&p_minus_one, rng);
    Ok(ClientKey { idx: secret.idx, s: (s0, s1), big_t: (big_t0, big_t1) })
}

/// Encrypt client `idx`'s scalar `x_i` under `label`.
pub fn encrypt(params: &Params, key: &ClientKey, label: &[u8], x_i: &Integer) -> FeResult<Ciphertext> {
    if !x_i.lt_abs(&params.bound_x) {
        return Err(FeError::bound_violation("dmcfe::Encrypt", params.bound_x.clone(), x_i.clone()));
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let (h0, h1) = hash_to_field(label, &p_minus_one);
    let mask = h0.mul(&key.s.0).add(&h1.mul(&key.s.1)).modulo(&p_minus_one);
    let exponent = x_i.add(&mask).modulo(&p_minus_one);
    let c = params.g.mod_exp(&exponent, &params.p).expect("g invertible mod prime p");
    Ok(Ciphertext { c })
}

/// Derive client `idx`'s key share for weight `y_i`.
pub fn derive_key_share(params: &Params, key: &ClientKey, y_i: &Integer) -> FeResult<KeyShare> {
    if !y_i.lt_abs(&params.bound_y) {
        return Err(FeError::bound_violation("dmcfe::DeriveKeyShare", params.bound_y.clone(), y_i.clone()));
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let d0 = y_i.mul(&key.s.0).add(&key.big_t.0).modulo(&p_minus_one);
    let d1 = y_i.mul(&key.s.1).add(&key.big_t.1).modulo(&p_minus_one);
    Ok(KeyShare { d: (d0, d1) })
}

/// Combine every client's key share into the final functional key.
pub fn combine_key_shares(params: &Params, shares: &[KeyShare]) -> FeResult<FunctionalKey> {
    if shares.len() != params.n {
        return Err(FeError::dim_mismatch("dmcfe::CombineKeyShares", params.n, shares.len()));
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let mut d0 = Integer::zero();
    let mut d1 = Integer::zero();
    for share in shares {
        d0 = d0.add(&share.d.0).modulo(&p_minus_one);
        d1 = d1.add(&share.d.1).modulo(&p_minus_one);
    }
    Ok(FunctionalKey { d: (d0, d1) })
}

/// Decrypt: recover `sum_i y_i * x_i` for the same `label` every
/// ciphertext in `cts` was encrypted under, with `ys[i]` the weight the
/// functional key in `fk` was derived for.
pub fn decrypt(
    params: &Params,
    cts: &[Ciphertext],
    ys: &[Integer],
    label: &[u8],
    fk: &FunctionalKey,
) -> FeResult<Integer> {
    if cts.len() != params.n || ys.len() != params.n {
        return Err(FeError::dim_mismatch("dmcfe::Decrypt", params.n, cts.len()));
    }
    let mut product = Integer::one();
    for (ct, y_i) in cts.iter().zip(ys.iter()) {
        let term = ct.c.mod_exp(y_i, &params.p).expect("ciphertext entry invertible mod p");
        product = product.mul(&term).modulo(&params.p);
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let (h0, h1) = hash_to_field(label, &p_minus_one);
    let mask_exp = h0.mul(&fk.d.0).add(&h1.mul(&fk.d.1)).modulo(&p_minus_one);
    let mask = params.g.mod_exp(&mask_exp, &params.p).expect("g invertible mod prime p");
    let mask_inv = mask.mod_inverse(&params.p).expect("mask invertible mod p");
    let target = product.mul(&mask_inv).modulo(&params.p);
    let n_big = Integer::from_u64(params.n as u64);
    let search_bound = n_big
        .mul(&params.bound_x)
        .mul(&params.bound_y)
        .to_i64()
        .unwrap_or(MAX_BOUND)
        .min(MAX_BOUND);
    signed_bsgs_zp(&params.g, &target, &params.p, search_bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    fn full_setup(n: usize, rng: &mut dyn RngCore) -> (Params, Vec<ClientKey>) {
        let bound = Integer::from_i64(12);
        let params = setup(n, bound.clone(), bound, 48, rng).unwrap();
        let mut secrets = Vec::with_capacity(n);
        let mut shares = Vec::with_capacity(n);
        for i in 0..n {
            let (secret, share) = client_phase1(&params, i, rng).unwrap();
            secrets.push(secret);
            shares.push(share);
        }
        let keys = secrets
            .iter()
            .map(|secret| client_phase2(&params, secret, &shares, rng).unwrap())
            .collect();
        (params, keys)
    }

    #[test]
    fn noise_terms_cancel_across_clients() {
        let mut rng = thread_rng();
        let (params, keys) = full_setup(4, &mut rng);
        let p_minus_one = params.p.sub(&Integer::one());
        let sum0 = keys.iter().fold(Integer::zero(), |acc, k| acc.add(&k.big_t.0)).modulo(&p_minus_one);
        let sum1 = keys.iter().fold(Integer::zero(), |acc, k| acc.add(&k.big_t.1)).modulo(&p_minus_one);
        assert_eq!(sum0, Integer::zero());
        assert_eq!(sum1, Integer::zero());
    }

    #[test]
    fn round_trips_weighted_sum() {
        let mut rng = thread_rng();
        let (params, keys) = full_setup(3, &mut rng);
        let label = b"round-1";

        let xs = vec![Integer::from_i64(3), Integer::from_i64(-2), Integer::from_i64(5)];
        let ys = vec![Integer::from_i64(2), Integer::from_i64(1), Integer::from_i64(-1)];

        let cts: Vec<Ciphertext> = keys
            .iter()
            .zip(xs.iter())
            .map(|(key, x_i)| encrypt(&params, key, label, x_i).unwrap())
            .collect();
        let shares: Vec<KeyShare> = keys
            .iter()
            .zip(ys.iter())
            .map(|(key, y_i)| derive_key_share(&params, key, y_i).unwrap())
            .collect();
        let fk = combine_key_shares(&params, &shares).unwrap();
        let result = decrypt(&params, &cts, &ys, label, &fk).unwrap();

        let expected = xs
            .iter()
            .zip(ys.iter())
            .fold(Integer::zero(), |acc, (x_i, y_i)| acc.add(&x_i.mul(y_i)));
        assert_eq!(result, expected);
    }
}
