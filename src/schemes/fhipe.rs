//! Function-hiding IPE (pairing-based): unlike the discrete-log schemes,
//! both the ciphertext's `x` and the functional key's `y` stay hidden
//! from anyone holding only `FK` and `CT` — the curve's pairing, not a
//! shared exponent, collapses `<x,y>` into `GT`. Secret-key throughout
//! (`MSK` folds in what would otherwise be a public key, since
//! function-hiding requires the encryptor to hold secret material).
//!
//! `Decrypt`'s two pairing terms are combined as a discrete-log
//! base/target pair rather than summed directly: `e(k1, c1)` alone
//! already equals `alpha*beta*det(B)*e(g1,g2)` (a value the decryptor
//! can compute outright), and `sum_i e(k2_i, c2_i)` equals
//! `alpha*beta*det(B)*<x,y>*e(g1,g2)`. Recovering `<x,y>` is then a
//! single `GT` discrete log of the second against the first, rather
//! than an addition — this is the reading recorded for this scheme's
//! Open Question decision.

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_gt, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::group::{
    g1_generator, g2_generator, group_order, lift_g1, lift_g2, pair, pairing_inner_product,
    scalar_mul_g1, scalar_mul_g2, G1Affine, G1Vector, G2Affine, G2Vector,
};
use crate::linalg::{IntegerMatrix, IntegerVector};
use crate::sampler::{Sampler, Uniform};
use rand::RngCore;

/// Public parameters: vector length `l`, per-coordinate bounds `bound_x`,
/// `bound_y`. Precondition `2*l*bound_x*bound_y < ord`.
#[derive(Clone, Debug)]
pub struct Params {
    pub l: usize,
    pub bound_x: Integer,
    pub bound_y: Integer,
}

/// `MSK = (g1, g2, B, B*)`: `B` is an invertible `l x l` matrix mod `ord`,
/// `B* = det(B) * (B^-1)^T mod ord`.
#[derive(Clone, Debug)]
pub struct Msk {
    pub b: IntegerMatrix,
    pub b_star: IntegerMatrix,
    pub det: Integer,
}

/// `(c1, c2) = (beta*g2, beta*(B* x)*g2)`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c1: G2Affine,
    pub c2: G2Vector,
}

/// `(k1, k2) = (alpha*det(B)*g1, alpha*(B y)*g1)`.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub k1: G1Affine,
    pub k2: G1Vector,
}

fn check_precondition(l: usize, bound_x: &Integer, bound_y: &Integer, ord: &Integer) -> FeResult<()> {
    let two_l = Integer::from_u64(2 * l as u64);
    if two_l.mul(bound_x).mul(bound_y) >= *ord {
        return Err(FeError::setup("fhipe::Setup", "2*l*bound_x*bound_y must be < ord"));
    }
    Ok(())
}

/// Generate master keys for vectors of length `l`. Retries the random
/// `B` draw until it is invertible mod `ord` (expected in one try, since
/// `ord` is prime and `l` is small relative to it).
pub fn setup(l: usize, bound_x: Integer, bound_y: Integer, rng: &mut dyn RngCore) -> FeResult<(Params, Msk)> {
    let ord = group_order();
    check_precondition(l, &bound_x, &bound_y, &ord)?;
    const MAX_ATTEMPTS: usize = 100;
    let uniform = Uniform::new(ord.clone());
    for _ in 0..MAX_ATTEMPTS {
        let b = uniform.sample_matrix(l, l, rng);
        let Ok((b_inv, det)) = b.inverse_mod_gauss(&ord) else { continue };
        if det.is_zero() {
            continue;
        }
        let b_star = b_inv.transpose().mul_scalar(&det).modulo(&ord);
        let params = Params { l, bound_x, bound_y };
        return Ok((params, Msk { b, b_star, det }));
    }
    Err(FeError::setup("fhipe::Setup", "no invertible B found within the attempt budget"))
}

/// Encrypt `x`.
pub fn encrypt(params: &Params, msk: &Msk, x: &IntegerVector, rng: &mut dyn RngCore) -> FeResult<Ciphertext> {
    if x.len() != params.l {
        return Err(FeError::dim_mismatch("fhipe::Encrypt", params.l, x.len()));
    }
    x.check_bound(&params.bound_x)?;
    let ord = group_order();
    let beta = Integer::sample_range(&Integer::one(), &ord, rng);
    let c1 = scalar_mul_g2(&g2_generator(), &beta);
    let bx = msk.b_star.mul_vec(x)?;
    let c2 = lift_g2(&bx.mul_scalar(&beta).modulo(&ord));
    Ok(Ciphertext { c1, c2 })
}

/// Derive the functional key for `y`.
pub fn derive_key(params: &Params, msk: &Msk, y: &IntegerVector, rng: &mut dyn RngCore) -> FeResult<FunctionalKey> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("fhipe::DeriveKey", params.l, y.len()));
    }
    y.check_bound(&params.bound_y)?;
    let ord = group_order();
    let alpha = Integer::sample_range(&Integer::one(), &ord, rng);
    let k1 = scalar_mul_g1(&g1_generator(), &alpha.mul(&msk.det).modulo(&ord));
    let by = msk.b.mul_vec(y)?;
    let k2 = lift_g1(&by.mul_scalar(&alpha).modulo(&ord));
    Ok(FunctionalKey { k1, k2 })
}

/// Decrypt: recover `<x, y>` as the discrete log of
/// `sum_i e(k2_i, c2_i)` relative to the base `e(k1, c1)`.
pub fn decrypt(params: &Params, ct: &Ciphertext, fk: &FunctionalKey) -> FeResult<Integer> {
    if ct.c2.len() != params.l || fk.k2.len() != params.l {
        return Err(FeError::dim_mismatch("fhipe::Decrypt", params.l, ct.c2.len()));
    }
    let base = pair(&fk.k1, &ct.c1);
    let target = pairing_inner_product(&fk.k2, &ct.c2)?;
    let l_big = Integer::from_u64(params.l as u64);
    let search_bound = l_big
        .mul(&params.bound_x)
        .mul(&params.bound_y)
        .to_i64()
        .unwrap_or(MAX_BOUND)
        .min(MAX_BOUND);
    signed_bsgs_gt(&base, &target, search_bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_inner_product() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(20);
        let (params, msk) = setup(3, bound.clone(), bound, &mut rng).unwrap();
        let x = IntegerVector::from_vec(vec![
            Integer::from_i64(2),
            Integer::from_i64(-3),
            Integer::from_i64(5),
        ]);
        let y = IntegerVector::from_vec(vec![
            Integer::from_i64(1),
            Integer::from_i64(4),
            Integer::from_i64(-2),
        ]);
        let ct = encrypt(&params, &msk, &x, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &y, &mut rng).unwrap();
        let result = decrypt(&params, &ct, &fk).unwrap();
        assert_eq!(result, x.dot(&y).unwrap());
    }

    #[test]
    fn dimension_mismatch_detected() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(10);
        let (params, msk) = setup(3, bound.clone(), bound, &mut rng).unwrap();
        let y = IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(1)]);
        assert!(derive_key(&params, &msk, &y, &mut rng).is_err());
    }
}
