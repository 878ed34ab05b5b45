//! Partial (public-key) function-hiding IPE: the FHIPE construction
//! restricted so a holder of only the public key can encrypt vectors
//! drawn from a fixed subspace `x = M w` (an `l x k` matrix `M`, `w` the
//! caller's length-`k` coefficients), while `SecEncrypt` lets a holder
//! of the master secret key encrypt an arbitrary length-`l` vector
//! directly, bypassing the subspace restriction. Used as-is by
//! [`crate::schemes::fhipe`]'s construction and, with its
//! `Ciphertext`/`FunctionalKey` shape reused unchanged, as the IPE core
//! [`crate::schemes::quadratic::quad`] augments to realize quadratic FE.
//!
//! Engineering simplification (recorded as this scheme's Open Question
//! decision): rather than introducing two independent base-field
//! matrices `U`/`V` alongside `B`, the public encoding reuses FHIPE's
//! own `(B, B*)` pair — `MPK`'s lifted matrix is `B* . M` in `G2` — so
//! `Encrypt`'s output is exactly what `SecEncrypt` would produce for
//! `x = M w`, and the two entry points stay trivially consistent.

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_gt, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::group::{
    g1_generator, g2_generator, group_order, lift_g1, pair, pairing_inner_product, scalar_mul_g1,
    scalar_mul_g2, G1Affine, G2Affine, G2Matrix, G2Vector,
};
use crate::linalg::{IntegerMatrix, IntegerVector};
use crate::sampler::{Sampler, Uniform};
use rand::RngCore;

/// Public parameters: ambient dimension `l`, subspace dimension `k`,
/// per-coordinate bounds. Precondition `2*l*bound_x*bound_y < ord`.
#[derive(Clone, Debug)]
pub struct Params {
    pub l: usize,
    pub k: usize,
    pub bound_x: Integer,
    pub bound_y: Integer,
}

/// `MSK = (B, B*)`, as in [`crate::schemes::fhipe`].
#[derive(Clone, Debug)]
pub struct Msk {
    pub b: IntegerMatrix,
    pub b_star: IntegerMatrix,
    pub det: Integer,
}

/// `MPK = (M, lift_g2(B* . M))`.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub m: IntegerMatrix,
    pub lifted: G2Matrix,
}

/// Identical shape to [`crate::schemes::fhipe::Ciphertext`].
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c1: G2Affine,
    pub c2: G2Vector,
}

/// Identical shape to [`crate::schemes::fhipe::FunctionalKey`].
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub k1: G1Affine,
    pub k2: crate::group::G1Vector,
}

fn check_precondition(l: usize, bound_x: &Integer, bound_y: &Integer, ord: &Integer) -> FeResult<()> {
    let two_l = Integer::from_u64(2 * l as u64);
    if two_l.mul(bound_x).mul(bound_y) >= *ord {
        return Err(FeError::setup("partial_fhipe::Setup", "2*l*bound_x*bound_y must be < ord"));
    }
    Ok(())
}

/// Generate master/public keys restricted to the subspace spanned by
/// the columns of `m` (`l x k`).
pub fn setup(
    bound_x: Integer,
    bound_y: Integer,
    m: IntegerMatrix,
    rng: &mut dyn RngCore,
) -> FeResult<(Params, Msk, Mpk)> {
    let l = m.rows();
    let k = m.cols();
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
        let mpk_matrix = b_star.mul_mat(&m)?.modulo(&ord);
        let lifted = G2Matrix::lift(&mpk_matrix, g2_generator());
        let params = Params { l, k, bound_x, bound_y };
        return Ok((params, Msk { b, b_star, det }, Mpk { m, lifted }));
    }
    Err(FeError::setup("partial_fhipe::Setup", "no invertible B found within the attempt budget"))
}

/// Encrypt `w` (length `k`): the ciphertext carries `x = M w` without
/// the encryptor ever learning `B*` directly.
pub fn encrypt(params: &Params, mpk: &Mpk, w: &IntegerVector, rng: &mut dyn RngCore) -> FeResult<Ciphertext> {
    if w.len() != params.k {
        return Err(FeError::dim_mismatch("partial_fhipe::Encrypt", params.k, w.len()));
    }
    w.check_bound(&params.bound_x)?;
    let ord = group_order();
    let beta = Integer::sample_range(&Integer::one(), &ord, rng);
    let c1 = scalar_mul_g2(&g2_generator(), &beta);
    let raw = mpk.lifted.mul_int_vec(w)?;
    let c2 = G2Vector::from_vec(raw.iter().map(|p| scalar_mul_g2(p, &beta)).collect());
    Ok(Ciphertext { c1, c2 })
}

/// Encrypt an arbitrary length-`l` `x`, bypassing the subspace
/// restriction; requires the master secret key.
pub fn sec_encrypt(params: &Params, msk: &Msk, x: &IntegerVector, rng: &mut dyn RngCore) -> FeResult<Ciphertext> {
    if x.len() != params.l {
        return Err(FeError::dim_mismatch("partial_fhipe::SecEncrypt", params.l, x.len()));
    }
    x.check_bound(&params.bound_x)?;
    let ord = group_order();
    let beta = Integer::sample_range(&Integer::one(), &ord, rng);
    let c1 = scalar_mul_g2(&g2_generator(), &beta);
    let bx = msk.b_star.mul_vec(x)?;
    let c2 = crate::group::lift_g2(&bx.mul_scalar(&beta).modulo(&ord));
    Ok(Ciphertext { c1, c2 })
}

/// Derive the functional key for a length-`l` `y`.
pub fn derive_key(params: &Params, msk: &Msk, y: &IntegerVector, rng: &mut dyn RngCore) -> FeResult<FunctionalKey> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("partial_fhipe::DeriveKey", params.l, y.len()));
    }
    y.check_bound(&params.bound_y)?;
    let ord = group_order();
    let alpha = Integer::sample_range(&Integer::one(), &ord, rng);
    let k1 = scalar_mul_g1(&g1_generator(), &alpha.mul(&msk.det).modulo(&ord));
    let by = msk.b.mul_vec(y)?;
    let k2 = lift_g1(&by.mul_scalar(&alpha).modulo(&ord));
    Ok(FunctionalKey { k1, k2 })
}

/// `e(k1, c1)`, the discrete-log base `Decrypt` solves against.
pub fn base_element(ct: &Ciphertext, fk: &FunctionalKey) -> crate::group::Gt {
    pair(&fk.k1, &ct.c1)
}

/// `sum_i e(k2_i, c2_i)`, the raw (not-yet-discrete-logged) `GT`
/// element [`crate::schemes::quadratic::quad`] combines further before
/// its own single final `Decrypt`.
pub fn part_decrypt(ct: &Ciphertext, fk: &FunctionalKey) -> FeResult<crate::group::Gt> {
    if ct.c2.len() != fk.k2.len() {
        return Err(FeError::dim_mismatch("partial_fhipe::PartDecrypt", fk.k2.len(), ct.c2.len()));
    }
    pairing_inner_product(&fk.k2, &ct.c2)
}

/// Standalone decryption: recover `<x, y>`.
pub fn decrypt(params: &Params, ct: &Ciphertext, fk: &FunctionalKey) -> FeResult<Integer> {
    let base = base_element(ct, fk);
    let target = part_decrypt(ct, fk)?;
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

    fn m(rows: &[&[i64]]) -> IntegerMatrix {
        IntegerMatrix::from_rows(
            rows.iter()
                .map(|r| IntegerVector::from_vec(r.iter().map(|x| Integer::from_i64(*x)).collect()))
                .collect(),
        )
    }

    #[test]
    fn subspace_encrypt_round_trips_inner_product() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(15);
        let subspace = m(&[&[1, 0], &[0, 1], &[1, 1]]);
        let (params, msk, mpk) = setup(bound.clone(), bound, subspace.clone(), &mut rng).unwrap();
        let w = IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(-3)]);
        let y = IntegerVector::from_vec(vec![
            Integer::from_i64(1),
            Integer::from_i64(4),
            Integer::from_i64(-2),
        ]);
        let ct = encrypt(&params, &mpk, &w, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &y, &mut rng).unwrap();
        let result = decrypt(&params, &ct, &fk).unwrap();
        let x = subspace.mul_vec(&w).unwrap();
        assert_eq!(result, x.dot(&y).unwrap());
    }

    #[test]
    fn sec_encrypt_matches_plain_encrypt_for_subspace_vector() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(15);
        let subspace = m(&[&[1, 0], &[0, 1], &[1, 1]]);
        let (params, msk, mpk) = setup(bound.clone(), bound, subspace.clone(), &mut rng).unwrap();
        let w = IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(2)]);
        let x = subspace.mul_vec(&w).unwrap();
        let y = IntegerVector::from_vec(vec![
            Integer::from_i64(2),
            Integer::from_i64(1),
            Integer::from_i64(-1),
        ]);
        let ct = sec_encrypt(&params, &msk, &x, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &y, &mut rng).unwrap();
        let result = decrypt(&params, &ct, &fk).unwrap();
        assert_eq!(result, x.dot(&y).unwrap());
    }
}
