//! Decentralized multi-client IPE over Damgard's DDH-variant template:
//! [`crate::schemes::decentralized::dmcfe`]'s two-phase no-trusted-dealer
//! setup, generalized coordinate-wise from a per-client scalar to a
//! per-client length-`l` vector `x_i` (the same generalization
//! [`crate::schemes::multi::damgard_multi`] performs on
//! [`crate::schemes::multi::ddh_multi`]'s scalar-per-client template).
//!
//! Each of the `l` coordinates runs an independent copy of DMCFE's
//! masking/cancellation pair `(s_i, T_i)`, derived from the same
//! pairwise Diffie-Hellman secret so a single Phase-1/Phase-2 exchange
//! suffices for the whole vector: coordinate `j`'s noise term is
//! `H(dh-value || j)`, still telescoping to zero across clients for
//! every `j` independently. Decryption exploits that the target group
//! is written multiplicatively: multiplying every coordinate's
//! unmasked ratio together before the final discrete log collapses
//! `sum_j g^{x_i[j] y_i[j]}`'s products into the single exponent
//! `sum_i <x_i, y_i>`, so only one BSGS call is needed regardless of
//! `l`.

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_zp, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::linalg::IntegerVector;
use crate::numtheory::{find_full_order_generator, generate_safe_prime};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

/// Public parameters: prime `p`, generator `g`, client count `n`,
/// per-client vector length `l`, per-coordinate bounds.
#[derive(Clone, Debug)]
pub struct Params {
    pub p: Integer,
    pub g: Integer,
    pub n: usize,
    pub l: usize,
    pub bound_x: Integer,
    pub bound_y: Integer,
}

/// Client `i`'s Phase-1 secret: one pairwise-DH exponent pair, shared
/// across all `l` coordinates.
#[derive(Clone, Debug)]
pub struct Phase1Secret {
    pub idx: usize,
    pub t_sec: (Integer, Integer),
}

/// Client `i`'s Phase-1 public message.
#[derive(Clone, Debug)]
pub struct PublicShare {
    pub idx: usize,
    pub t_pub: (Integer, Integer),
}

/// Client `i`'s completed key material: one `(s, T)` mask pair per
/// coordinate.
#[derive(Clone, Debug)]
pub struct ClientKey {
    pub idx: usize,
    pub s: Vec<(Integer, Integer)>,
    pub big_t: Vec<(Integer, Integer)>,
}

/// One client's per-label ciphertext: one masked group element per
/// coordinate.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c: IntegerVector,
}

/// A single client's contribution to a functional key for
/// `y = (y_1, .., y_n)`: one `(d0, d1)` pair per coordinate.
#[derive(Clone, Debug)]
pub struct KeyShare {
    pub d: Vec<(Integer, Integer)>,
}

/// The combined functional key: `sum_i KeyShare_i`, coordinate-wise.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub d: Vec<(Integer, Integer)>,
}

/// `H(bytes) = (SHA256(bytes) mod m, SHA512(bytes) mod m)`.
fn hash_to_field(bytes: &[u8], m: &Integer) -> (Integer, Integer) {
    let h0 = Sha256::digest(bytes);
    let h1 = Sha512::digest(bytes);
    (Integer::from_bytes_be(&h0).modulo(m), Integer::from_bytes_be(&h1).modulo(m))
}

fn coordinate_tag(base: &[u8], j: usize) -> Vec<u8> {
    let mut tagged = base.to_vec();
    tagged.extend_from_slice(&(j as u64).to_be_bytes());
    tagged
}

fn check_precondition(n: usize, l: usize, bound_x: &Integer, bound_y: &Integer, p: &Integer) -> FeResult<()> {
    let nl = Integer::from_u64((n * l) as u64);
    if nl.mul(bound_x).mul(bound_y) >= *p {
        return Err(FeError::setup("damgard_dec_multi::Setup", "n * l * bound_x * bound_y must be < p"));
    }
    Ok(())
}

/// Generate shared parameters for `n` clients, each holding a
/// length-`l` vector.
pub fn setup(
    n: usize,
    l: usize,
    bound_x: Integer,
    bound_y: Integer,
    bits: u64,
    rng: &mut dyn RngCore,
) -> FeResult<Params> {
    let sp = generate_safe_prime(bits, rng)?;
    check_precondition(n, l, &bound_x, &bound_y, &sp.p)?;
    let g = find_full_order_generator(&sp.p, &sp.q, rng)?;
    Ok(Params { p: sp.p, g, n, l, bound_x, bound_y })
}

/// Phase 1: client `idx` samples its pairwise-DH secret and publishes
/// the corresponding public share.
pub fn client_phase1(params: &Params, idx: usize, rng: &mut dyn RngCore) -> FeResult<(Phase1Secret, PublicShare)> {
    if idx >= params.n {
        return Err(FeError::dim_mismatch("damgard_dec_multi::ClientPhase1", params.n, idx + 1));
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
/// own), client `idx` derives its per-coordinate noise terms and
/// samples its per-coordinate encryption masks.
pub fn client_phase2(
    params: &Params,
    secret: &Phase1Secret,
    shares: &[PublicShare],
    rng: &mut dyn RngCore,
) -> FeResult<ClientKey> {
    if shares.len() != params.n {
        return Err(FeError::dim_mismatch("damgard_dec_multi::ClientPhase2", params.n, shares.len()));
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let mut big_t = vec![(Integer::zero(), Integer::zero()); params.l];
    for other in shares {
        if other.idx == secret.idx {
            continue;
        }
        let dh0 = other.t_pub.0.mod_exp(&secret.t_sec.0, &params.p).expect("t_pub invertible mod prime p");
        let dh1 = other.t_pub.1.mod_exp(&secret.t_sec.1, &params.p).expect("t_pub invertible mod prime p");
        let dh0_bytes = dh0.to_bytes_be();
        let dh1_bytes = dh1.to_bytes_be();
        let sign_positive = secret.idx < other.idx;
        for j in 0..params.l {
            let (h_dh0, _) = hash_to_field(&coordinate_tag(&dh0_bytes, j), &p_minus_one);
            let (_, h_dh1) = hash_to_field(&coordinate_tag(&dh1_bytes, j), &p_minus_one);
            if sign_positive {
                big_t[j].0 = big_t[j].0.add(&h_dh0).modulo(&p_minus_one);
                big_t[j].1 = big_t[j].1.add(&h_dh1).modulo(&p_minus_one);
            } else {
                big_t[j].0 = big_t[j].0.sub(&h_dh0).modulo(&p_minus_one);
                big_t[j].1 = big_t[j].1.sub(&h_dh1).modulo(&p_minus_one);
            }
        }
    }
    let s = (0..params.l)
        .map(|_| (Integer::sample_uniform(&p_minus_one, rng), Integer::sample_uniform(&p_minus_one, rng)))
        .collect();
    Ok(ClientKey { idx: secret.idx, s, big_t })
}

/// Encrypt client `idx`'s length-`l` vector `x_i` under `label`.
pub fn encrypt(params: &Params, key: &ClientKey, label: &[u8], x_i: &IntegerVector) -> FeResult<Ciphertext> {
    if x_i.len() != params.l {
        return Err(FeError::dim_mismatch("damgard_dec_multi::Encrypt", params.l, x_i.len()));
    }
    x_i.check_bound(&params.bound_x)?;
    let p_minus_one = params.p.sub(&Integer::one());
    let mut c = Vec::with_capacity(params.l);
    for j in 0..params.l {
        let (h0, h1) = hash_to_field(&coordinate_tag(label, j), &p_minus_one);
        let mask = h0.mul(&key.s[j].0).add(&h1.mul(&key.s[j].1)).modulo(&p_minus_one);
        let exponent = x_i.get(j).add(&mask).modulo(&p_minus_one);
        c.push(params.g.mod_exp(&exponent, &params.p).expect("g invertible mod prime p"));
    }
    Ok(Ciphertext { c: IntegerVector::from_vec(c) })
}

/// Derive client `idx`'s key share for weight vector `y_i`.
pub fn derive_key_share(params: &Params, key: &ClientKey, y_i: &IntegerVector) -> FeResult<KeyShare> {
    if y_i.len() != params.l {
        return Err(FeError::dim_mismatch("damgard_dec_multi::DeriveKeyShare", params.l, y_i.len()));
    }
    y_i.check_bound(&params.bound_y)?;
    let p_minus_one = params.p.sub(&Integer::one());
    let d = (0..params.l)
        .map(|j| {
            let d0 = y_i.get(j).mul(&key.s[j].0).add(&key.big_t[j].0).modulo(&p_minus_one);
            let d1 = y_i.get(j).mul(&key.s[j].1).add(&key.big_t[j].1).modulo(&p_minus_one);
            (d0, d1)
        })
        .collect();
    Ok(KeyShare { d })
}

/// Combine every client's key share into the final functional key.
pub fn combine_key_shares(params: &Params, shares: &[KeyShare]) -> FeResult<FunctionalKey> {
    if shares.len() != params.n {
        return Err(FeError::dim_mismatch("damgard_dec_multi::CombineKeyShares", params.n, shares.len()));
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let mut d = vec![(Integer::zero(), Integer::zero()); params.l];
    for share in shares {
        if share.d.len() != params.l {
            return Err(FeError::dim_mismatch("damgard_dec_multi::CombineKeyShares", params.l, share.d.len()));
        }
        for j in 0..params.l {
            d[j].0 = d[j].0.add(&share.d[j].0).modulo(&p_minus_one);
            d[j].1 = d[j].1.add(&share.d[j].1).modulo(&p_minus_one);
        }
    }
    Ok(FunctionalKey { d })
}

/// Decrypt: recover `sum_i <x_i, y_i>` for the same `label` every
/// ciphertext in `cts` was encrypted under, with `ys[i]` the weight
/// vector the combined functional key in `fk` was derived for.
pub fn decrypt(
    params: &Params,
    cts: &[Ciphertext],
    ys: &[IntegerVector],
    label: &[u8],
    fk: &FunctionalKey,
) -> FeResult<Integer> {
    if cts.len() != params.n || ys.len() != params.n {
        return Err(FeError::dim_mismatch("damgard_dec_multi::Decrypt", params.n, cts.len()));
    }
    if fk.d.len() != params.l {
        return Err(FeError::dim_mismatch("damgard_dec_multi::Decrypt", params.l, fk.d.len()));
    }
    let p_minus_one = params.p.sub(&Integer::one());
    let mut total_target = Integer::one();
    for j in 0..params.l {
        let mut numerator = Integer::one();
        for (ct, y_i) in cts.iter().zip(ys.iter()) {
            if ct.c.len() != params.l || y_i.len() != params.l {
                return Err(FeError::dim_mismatch("damgard_dec_multi::Decrypt", params.l, ct.c.len()));
            }
            let term = ct.c.get(j).mod_exp(y_i.get(j), &params.p).expect("ciphertext entry invertible mod p");
            numerator = numerator.mul(&term).modulo(&params.p);
        }
        let (h0, h1) = hash_to_field(&coordinate_tag(label, j), &p_minus_one);
        let mask_exp = h0.mul(&fk.d[j].0).add(&h1.mul(&fk.d[j].1)).modulo(&p_minus_one);
        let mask = params.g.mod_exp(&mask_exp, &params.p).expect("g invertible mod prime p");
        let mask_inv = mask.mod_inverse(&params.p).expect("mask invertible mod p");
        let target_j = numerator.mul(&mask_inv).modulo(&params.p);
        total_target = total_target.mul(&target_j).modulo(&params.p);
    }
    let nl_big = Integer::from_u64((params.n * params.l) as u64);
    let search_bound = nl_big
        .mul(&params.bound_x)
        .mul(&params.bound_y)
        .to_i64()
        .unwrap_or(MAX_BOUND)
        .min(MAX_BOUND);
    signed_bsgs_zp(&params.g, &total_target, &params.p, search_bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    fn full_setup(n: usize, l: usize, rng: &mut dyn RngCore) -> (Params, Vec<ClientKey>) {
        let bound = Integer::from_i64(10);
        let params = setup(n, l, bound.clone(), bound, 48, rng).unwrap();
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
    fn noise_terms_cancel_per_coordinate() {
        let mut rng = thread_rng();
        let (params, keys) = full_setup(4, 3, &mut rng);
        let p_minus_one = params.p.sub(&Integer::one());
        for j in 0..params.l {
            let sum0 = keys.iter().fold(Integer::zero(), |acc, k| acc.add(&k.big_t[j].0)).modulo(&p_minus_one);
            let sum1 = keys.iter().fold(Integer::zero(), |acc, k| acc.add(&k.big_t[j].1)).modulo(&p_minus_one);
            assert_eq!(sum0, Integer::zero());
            assert_eq!(sum1, Integer::zero());
        }
    }

    #[test]
    fn round_trips_sum_of_inner_products() {
        let mut rng = thread_rng();
        let (params, keys) = full_setup(3, 2, &mut rng);
        let label = b"round-1";

        let xs = vec![
            IntegerVector::from_vec(vec![Integer::from_i64(3), Integer::from_i64(-1)]),
            IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(4)]),
            IntegerVector::from_vec(vec![Integer::from_i64(-2), Integer::from_i64(1)]),
        ];
        let ys = vec![
            IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(2)]),
            IntegerVector::from_vec(vec![Integer::from_i64(3), Integer::from_i64(1)]),
            IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(-1)]),
        ];

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

        let expected: Integer = xs
            .iter()
            .zip(ys.iter())
            .map(|(x_i, y_i)| x_i.dot(y_i).unwrap())
            .fold(Integer::zero(), |acc, v| acc.add(&v));
        assert_eq!(result, expected);
    }
}
