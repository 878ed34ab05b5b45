//! Simple-DDH inner-product FE: the baseline single-input scheme every
//! other discrete-log-based scheme in this crate generalizes.
//!
//! `Setup -> Encrypt -> DeriveKey -> Decrypt`, all arithmetic in
//! `Z_p^*`/`Z_{p-1}` via [`crate::bigint::Integer`]; no pairing.

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_zp, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::linalg::IntegerVector;
use crate::numtheory::{find_full_order_generator, generate_safe_prime};
use rand::RngCore;

/// Public parameters: prime `p`, generator `g`, vector length `l`,
/// per-coordinate bound `B`. Precondition `l * B^2 < p`.
#[derive(Clone, Debug)]
pub struct Params {
    pub p: Integer,
    pub g: Integer,
    pub l: usize,
    pub bound: Integer,
}

/// `MSK = s in Z_{p-1}^l`.
#[derive(Clone, Debug)]
pub struct Msk {
    pub s: IntegerVector,
}

/// `MPK_i = g^{s_i} mod p`.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub h: IntegerVector,
}

/// `FK = <s, y> mod (p-1)`.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub sk_y: Integer,
}

/// `(c_0, c_1, ..., c_l) = (g^r, g^{x_i} MPK_i^r)`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c0: Integer,
    pub c: IntegerVector,
}

fn check_precondition(l: usize, bound: &Integer, p: &Integer) -> FeResult<()> {
    let l_big = Integer::from_u64(l as u64);
    let lb2 = l_big.mul(&bound.mul(bound));
    if lb2 < *p {
        Ok(())
    } else {
        Err(FeError::setup("simple_ddh::Setup", "l * bound^2 must be < p"))
    }
}

/// Generate fresh parameters and master keys for vectors of length `l`
/// bounded by `bound`, using a `bits`-bit safe prime `p`.
pub fn setup(l: usize, bound: Integer, bits: u64, rng: &mut dyn RngCore) -> FeResult<(Params, Msk, Mpk)> {
    let sp = generate_safe_prime(bits, rng)?;
    check_precondition(l, &bound, &sp.p)?;
    let g = find_full_order_generator(&sp.p, &sp.q, rng)?;
    let p_minus_one = sp.p.sub(&Integer::one());
    let s = IntegerVector::from_vec(
        (0..l).map(|_| Integer::sample_uniform(&p_minus_one, rng)).collect(),
    );
    let h = s.apply(|si| g.mod_exp(si, &sp.p).expect("g invertible mod prime p"));
    let params = Params { p: sp.p, g, l, bound };
    Ok((params, Msk { s }, Mpk { h }))
}

/// Encrypt `x` (length `l`, each entry `|x_i| < bound`) under `MPK`.
pub fn encrypt(
    params: &Params,
    mpk: &Mpk,
    x: &IntegerVector,
    rng: &mut dyn RngCore,
) -> FeResult<Ciphertext> {
    if x.len() != params.l {
        return Err(FeError::dim_mismatch("simple_ddh::Encrypt", params.l, x.len()));
    }
    x.check_bound(&params.bound)?;
    let p_minus_one = params.p.sub(&Integer::one());
    let r = Integer::sample_uniform(&p_minus_one, rng);
    let c0 = params.g.mod_exp(&r, &params.p).expect("g invertible mod prime p");
    let mut c_entries = Vec::with_capacity(params.l);
    for i in 0..params.l {
        let gx = params.g.mod_exp(x.get(i), &params.p).expect("g invertible mod prime p");
        let mpk_r = mpk.h.get(i).mod_exp(&r, &params.p).expect("mpk entry invertible mod prime p");
        c_entries.push(gx.mul(&mpk_r).modulo(&params.p));
    }
    Ok(Ciphertext { c0, c: IntegerVector::from_vec(c_entries) })
}

/// Derive the functional key for `y`: `<s, y> mod (p-1)`.
pub fn derive_key(params: &Params, msk: &Msk, y: &IntegerVector) -> FeResult<FunctionalKey> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("simple_ddh::DeriveKey", params.l, y.len()));
    }
    y.check_bound(&params.bound)?;
    let p_minus_one = params.p.sub(&Integer::one());
    let sk_y = msk.s.dot(y)?.modulo(&p_minus_one);
    Ok(FunctionalKey { sk_y })
}

/// Decrypt: recover `<x, y>` in `[-l*bound^2, l*bound^2]`.
pub fn decrypt(
    params: &Params,
    ct: &Ciphertext,
    fk: &FunctionalKey,
    y: &IntegerVector,
) -> FeResult<Integer> {
    if y.len() != params.l || ct.c.len() != params.l {
        return Err(FeError::dim_mismatch("simple_ddh::Decrypt", params.l, y.len()));
    }
    let mut numerator = Integer::one();
    for i in 0..params.l {
        let term = ct.c.get(i).mod_exp(y.get(i), &params.p).expect("ciphertext entry invertible mod p");
        numerator = numerator.mul(&term).modulo(&params.p);
    }
    let denom = ct.c0.mod_exp(&fk.sk_y, &params.p).expect("c0 invertible mod p");
    let denom_inv = denom.mod_inverse(&params.p).expect("c0 invertible mod p");
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
        let bound = Integer::from_i64(100);
        let (params, msk, mpk) = setup(3, bound, 64, &mut rng).unwrap();
        let x = IntegerVector::from_vec(vec![
            Integer::from_i64(3),
            Integer::from_i64(-5),
            Integer::from_i64(7),
        ]);
        let y = IntegerVector::from_vec(vec![
            Integer::from_i64(2),
            Integer::from_i64(1),
            Integer::from_i64(-4),
        ]);
        let ct = encrypt(&params, &mpk, &x, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &y).unwrap();
        let result = decrypt(&params, &ct, &fk, &y).unwrap();
        let expected = x.dot(&y).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn encrypt_rejects_out_of_bound_input() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(10);
        let (params, _msk, mpk) = setup(2, bound, 64, &mut rng).unwrap();
        let x = IntegerVector::from_vec(vec![Integer::from_i64(100), Integer::from_i64(1)]);
        assert!(encrypt(&params, &mpk, &x, &mut rng).is_err());
    }

    #[test]
    fn dimension_mismatch_detected() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(10);
        let (params, msk, _mpk) = setup(3, bound, 64, &mut rng).unwrap();
        let y = IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(1)]);
        assert!(derive_key(&params, &msk, &y).is_err());
    }
}
