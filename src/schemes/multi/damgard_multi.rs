//! Central-authority multi-input IPE over Damgard's DDH-variant: the
//! same one-time-pad masking and `Z`-subtraction as
//! [`crate::schemes::multi::ddh_multi`], but each client's ciphertext
//! carries the extra `h^r` term [`crate::schemes::damgard`] adds for
//! active-adversary resistance.

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_zp, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::linalg::IntegerVector;
use crate::numtheory::{find_full_order_generator, generate_safe_prime};
use rand::RngCore;

/// Public parameters shared by every client: prime `p`, generators
/// `g, h`, client count `n`, per-client length `l`, bound.
#[derive(Clone, Debug)]
pub struct Params {
    pub p: Integer,
    pub g: Integer,
    pub h: Integer,
    pub n: usize,
    pub l: usize,
    pub bound: Integer,
}

/// Client `i`'s encryption key: `(s_i, t_i, u_i)`, all length `l`.
#[derive(Clone, Debug)]
pub struct EncryptionKey {
    pub s: IntegerVector,
    pub t: IntegerVector,
    pub u: IntegerVector,
}

/// `MSK = {EncryptionKey_i}`, held only by the central authority.
#[derive(Clone, Debug)]
pub struct Msk {
    pub clients: Vec<EncryptionKey>,
}

/// `MPK_i = g^{s_i} h^{t_i} mod p`, one vector per client.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub values: Vec<IntegerVector>,
}

/// `FK = ({(<s_i,y_i>, <t_i,y_i>) mod (p-1)}, Z = sum_i <u_i,y_i>)`.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub sk_y: Vec<Integer>,
    pub tk_y: Vec<Integer>,
    pub z: Integer,
}

/// Client `i`'s ciphertext, identical in shape to
/// [`crate::schemes::damgard::Ciphertext`] but encrypting `x_i + u_i`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c: Integer,
    pub d: Integer,
    pub e: IntegerVector,
}

fn check_precondition(n: usize, l: usize, bound: &Integer, q: &Integer) -> FeResult<()> {
    let nl = Integer::from_u64((n * l) as u64);
    if nl.mul(&bound.mul(bound)) >= *q {
        return Err(FeError::setup("damgard_multi::Setup", "n * l * bound^2 must be < p-1"));
    }
    Ok(())
}

/// Generate shared parameters and per-client master keys.
pub fn setup(n: usize, l: usize, bound: Integer, bits: u64, rng: &mut dyn RngCore) -> FeResult<(Params, Msk, Mpk)> {
    let sp = generate_safe_prime(bits, rng)?;
    let q = sp.p.sub(&Integer::one());
    check_precondition(n, l, &bound, &q)?;
    let g = find_full_order_generator(&sp.p, &sp.q, rng)?;
    let h = find_full_order_generator(&sp.p, &sp.q, rng)?;

    let mut clients = Vec::with_capacity(n);
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        let s = IntegerVector::from_vec((0..l).map(|_| Integer::sample_uniform(&q, rng)).collect());
        let t = IntegerVector::from_vec((0..l).map(|_| Integer::sample_uniform(&q, rng)).collect());
        let u = IntegerVector::from_vec((0..l).map(|_| Integer::sample_uniform(&q, rng)).collect());
        let values_i = IntegerVector::from_vec(
            (0..l)
                .map(|j| {
                    let gs = g.mod_exp(s.get(j), &sp.p).expect("g invertible mod prime p");
                    let ht = h.mod_exp(t.get(j), &sp.p).expect("h invertible mod prime p");
                    gs.mul(&ht).modulo(&sp.p)
                })
                .collect(),
        );
        clients.push(EncryptionKey { s, t, u });
        values.push(values_i);
    }
    let params = Params { p: sp.p, g, h, n, l, bound };
    Ok((params, Msk { clients }, Mpk { values }))
}

/// Encrypt client `idx`'s vector `x_i`, masked by its one-time pad.
pub fn encrypt(
    params: &Params,
    mpk: &Mpk,
    ek: &EncryptionKey,
    idx: usize,
    x_i: &IntegerVector,
    rng: &mut dyn RngCore,
) -> FeResult<Ciphertext> {
    if idx >= params.n {
        return Err(FeError::dim_mismatch("damgard_multi::Encrypt", params.n, idx + 1));
    }
    if x_i.len() != params.l {
        return Err(FeError::dim_mismatch("damgard_multi::Encrypt", params.l, x_i.len()));
    }
    x_i.check_bound(&params.bound)?;
    let masked = x_i.add(&ek.u)?;
    let q = params.p.sub(&Integer::one());
    let r = Integer::sample_uniform(&q, rng);
    let c = params.g.mod_exp(&r, &params.p).expect("g invertible mod prime p");
    let d = params.h.mod_exp(&r, &params.p).expect("h invertible mod prime p");
    let mut e_entries = Vec::with_capacity(params.l);
    for j in 0..params.l {
        let mpk_r = mpk.values[idx].get(j).mod_exp(&r, &params.p).expect("mpk entry invertible mod p");
        let gx = params.g.mod_exp(masked.get(j), &params.p).expect("g invertible mod prime p");
        e_entries.push(mpk_r.mul(&gx).modulo(&params.p));
    }
    Ok(Ciphertext { c, d, e: IntegerVector::from_vec(e_entries) })
}

/// Derive the functional key for `(y_1, .., y_n)`.
pub fn derive_key(params: &Params, msk: &Msk, ys: &[IntegerVector]) -> FeResult<FunctionalKey> {
    if ys.len() != params.n {
        return Err(FeError::dim_mismatch("damgard_multi::DeriveKey", params.n, ys.len()));
    }
    let q = params.p.sub(&Integer::one());
    let mut sk_y = Vec::with_capacity(params.n);
    let mut tk_y = Vec::with_capacity(params.n);
    let mut z = Integer::zero();
    for (i, y_i) in ys.iter().enumerate() {
        if y_i.len() != params.l {
            return Err(FeError::dim_mismatch("damgard_multi::DeriveKey", params.l, y_i.len()));
        }
        y_i.check_bound(&params.bound)?;
        let client = &msk.clients[i];
        sk_y.push(client.s.dot(y_i)?.modulo(&q));
        tk_y.push(client.t.dot(y_i)?.modulo(&q));
        z = z.add(&client.u.dot(y_i)?);
    }
    Ok(FunctionalKey { sk_y, tk_y, z })
}

/// Decrypt: recover `sum_i <x_i, y_i>` after cancelling the masks.
pub fn decrypt(params: &Params, cts: &[Ciphertext], fk: &FunctionalKey, ys: &[IntegerVector]) -> FeResult<Integer> {
    if cts.len() != params.n || ys.len() != params.n || fk.sk_y.len() != params.n {
        return Err(FeError::dim_mismatch("damgard_multi::Decrypt", params.n, cts.len()));
    }
    let mut product = Integer::one();
    for i in 0..params.n {
        let ct = &cts[i];
        let y_i = &ys[i];
        if ct.e.len() != params.l || y_i.len() != params.l {
            return Err(FeError::dim_mismatch("damgard_multi::Decrypt", params.l, ct.e.len()));
        }
        let mut numerator = Integer::one();
        for j in 0..params.l {
            let term = ct.e.get(j).mod_exp(y_i.get(j), &params.p).expect("ciphertext entry invertible mod p");
            numerator = numerator.mul(&term).modulo(&params.p);
        }
        let c_pow = ct.c.mod_exp(&fk.sk_y[i], &params.p).expect("c invertible mod p");
        let d_pow = ct.d.mod_exp(&fk.tk_y[i], &params.p).expect("d invertible mod p");
        let denom = c_pow.mul(&d_pow).modulo(&params.p);
        let denom_inv = denom.mod_inverse(&params.p).expect("denominator invertible mod p");
        product = product.mul(&numerator).mul(&denom_inv).modulo(&params.p);
    }
    let mask_total = params.g.mod_exp(&fk.z, &params.p).expect("g invertible mod prime p");
    let mask_inv = mask_total.mod_inverse(&params.p).expect("mask total invertible mod p");
    let target = product.mul(&mask_inv).modulo(&params.p);
    let nl_big = Integer::from_u64((params.n * params.l) as u64);
    let bound_sq = params.bound.mul(&params.bound);
    let search_bound = nl_big.mul(&bound_sq).to_i64().unwrap_or(MAX_BOUND).min(MAX_BOUND);
    signed_bsgs_zp(&params.g, &target, &params.p, search_bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_sum_of_inner_products() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(10);
        let (params, msk, mpk) = setup(2, 2, bound, 64, &mut rng).unwrap();

        let xs = vec![
            IntegerVector::from_vec(vec![Integer::from_i64(3), Integer::from_i64(-1)]),
            IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(4)]),
        ];
        let ys = vec![
            IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(2)]),
            IntegerVector::from_vec(vec![Integer::from_i64(3), Integer::from_i64(1)]),
        ];

        let cts: Vec<Ciphertext> = xs
            .iter()
            .enumerate()
            .map(|(i, x_i)| encrypt(&params, &mpk, &msk.clients[i], i, x_i, &mut rng).unwrap())
            .collect();
        let fk = derive_key(&params, &msk, &ys).unwrap();
        let result = decrypt(&params, &cts, &fk, &ys).unwrap();

        let expected: Integer = xs
            .iter()
            .zip(ys.iter())
            .map(|(x_i, y_i)| x_i.dot(y_i).unwrap())
            .fold(Integer::zero(), |acc, v| acc.add(&v));
        assert_eq!(result, expected);
    }
}
