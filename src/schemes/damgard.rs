//! Damgard's DDH-variant IPE: adds a second generator `h` to
//! Simple-DDH for security against active adversaries (CCA-style key
//! derivation is still out of scope here — this is the IND-CPA
//! single-input scheme the corpus calls "Damgard").

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_zp, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::linalg::IntegerVector;
use crate::numtheory::{find_full_order_generator, generate_safe_prime};
use rand::RngCore;

/// Public parameters: prime `p`, generators `g, h`, length `l`, bound `B`.
/// Precondition `l * B^2 < q` where `q = p - 1`.
#[derive(Clone, Debug)]
pub struct Params {
    pub p: Integer,
    pub g: Integer,
    pub h: Integer,
    pub l: usize,
    pub bound: Integer,
}

/// `MSK = (s, t) in (Z_{p-1}^l)^2`.
#[derive(Clone, Debug)]
pub struct Msk {
    pub s: IntegerVector,
    pub t: IntegerVector,
}

/// `MPK_i = g^{s_i} h^{t_i} mod p`.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub values: IntegerVector,
}

/// `FK = (<s,y>, <t,y>) mod (p-1)`.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub sk_y: Integer,
    pub tk_y: Integer,
}

/// `(c, d, e_1..e_l) = (g^r, h^r, MPK_i^r g^{x_i})`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c: Integer,
    pub d: Integer,
    pub e: IntegerVector,
}

/// Generate fresh parameters and master keys.
pub fn setup(l: usize, bound: Integer, bits: u64, rng: &mut dyn RngCore) -> FeResult<(Params, Msk, Mpk)> {
    let sp = generate_safe_prime(bits, rng)?;
    let q = sp.p.sub(&Integer::one());
    let l_big = Integer::from_u64(l as u64);
    if l_big.mul(&bound.mul(&bound)) >= q {
        return Err(FeError::setup("damgard::Setup", "l * bound^2 must be < p-1"));
    }
    let g = find_full_order_generator(&sp.p, &sp.q, rng)?;
    let h = find_full_order_generator(&sp.p, &sp.q, rng)?;
    let s = IntegerVector::from_vec((0..l).map(|_| Integer::sample_uniform(&q, rng)).collect());
    let t = IntegerVector::from_vec((0..l).map(|_| Integer::sample_uniform(&q, rng)).collect());
    let values = IntegerVector::from_vec(
        (0..l)
            .map(|i| {
                let gs = g.mod_exp(s.get(i), &sp.p).expect("g invertible mod prime p");
                let ht = h.mod_exp(t.get(i), &sp.p).expect("h invertible mod prime p");
                gs.mul(&ht).modulo(&sp.p)
            })
            .collect(),
    );
    let params = Params { p: sp.p, g, h, l, bound };
    Ok((params, Msk { s, t }, Mpk { values }))
}

/// Encrypt `x`.
pub fn encrypt(
    params: &Params,
    mpk: &Mpk,
    x: &IntegerVector,
    rng: &mut dyn RngCore,
) -> FeResult<Ciphertext> {
    if x.len() != params.l {
        return Err(FeError::dim_mismatch("damgard::Encrypt", params.l, x.len()));
    }
    x.check_bound(&params.bound)?;
    let q = params.p.sub(&Integer::one());
    let r = Integer::sample_uniform(&q, rng);
    let c = params.g.mod_exp(&r, &params.p).expect("g invertible mod prime p");
    let d = params.h.mod_exp(&r, &params.p).expect("h invertible mod prime p");
    let mut e_entries = Vec::with_capacity(params.l);
    for i in 0..params.l {
        let mpk_r = mpk.values.get(i).mod_exp(&r, &params.p).expect("mpk entry invertible mod p");
        let gx = params.g.mod_exp(x.get(i), &params.p).expect("g invertible mod prime p");
        e_entries.push(mpk_r.mul(&gx).modulo(&params.p));
    }
    Ok(Ciphertext { c, d, e: IntegerVector::from_vec(e_entries) })
}

/// Derive the functional key for `y`.
pub fn derive_key(params: &Params, msk: &Msk, y: &IntegerVector) -> FeResult<FunctionalKey> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("damgard::DeriveKey", params.l, y.len()));
    }
    y.check_bound(&params.bound)?;
    let q = params.p.sub(&Integer::one());
    Ok(FunctionalKey {
        sk_y: msk.s.dot(y)?.modulo(&q),
        tk_y: msk.t.dot(y)?.modulo(&q),
    })
}

/// Decrypt: recover `<x, y>`.
pub fn decrypt(
    params: &Params,
    ct: &Ciphertext,
    fk: &FunctionalKey,
    y: &IntegerVector,
) -> FeResult<Integer> {
    if y.len() != params.l || ct.e.len() != params.l {
        return Err(FeError::dim_mismatch("damgard::Decrypt", params.l, y.len()));
    }
    let mut numerator = Integer::one();
    for i in 0..params.l {
        let term = ct.e.get(i).mod_exp(y.get(i), &params.p).expect("ciphertext entry invertible mod p");
        numerator = numerator.mul(&term).modulo(&params.p);
    }
    let c_pow = ct.c.mod_exp(&fk.sk_y, &params.p).expect("c invertible mod p");
    let d_pow = ct.d.mod_exp(&fk.tk_y, &params.p).expect("d invertible mod p");
    let denom = c_pow.mul(&d_pow).modulo(&params.p);
    let denom_inv = denom.mod_inverse(&params.p).expect("denominator invertible mod p");
    let target = numerator.mul(&denom_inv).modulo(&params.p);
    let l_big = Integer::from_u64(params.l as u64);
    let bound_sq = params.bound.mul(&params.bound);
    let search_bound = l_big.mul(&bound_sq).to_i64().unwrap_or(MAX_BOUND).min(MAX_BOUND);
    signed_bsgs_zp(&params.g, &target, &params.p, search_bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_inner_product() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(50);
        let (params, msk, mpk) = setup(3, bound, 64, &mut rng).unwrap();
        let x = IntegerVector::from_vec(vec![
            Integer::from_i64(4),
            Integer::from_i64(-2),
            Integer::from_i64(9),
        ]);
        let y = IntegerVector::from_vec(vec![
            Integer::from_i64(1),
            Integer::from_i64(3),
            Integer::from_i64(-1),
        ]);
        let ct = encrypt(&params, &mpk, &x, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &y).unwrap();
        let result = decrypt(&params, &ct, &fk, &y).unwrap();
        assert_eq!(result, x.dot(&y).unwrap());
    }
}
