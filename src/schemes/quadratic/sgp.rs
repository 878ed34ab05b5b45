//! Sans-Gay-Pointcheval secret-key quadratic FE: given ciphertexts of
//! `x in Z^n` and `y in Z^m`, a functional key for `F in Z^{n x m}`
//! reveals `x^T F y` and nothing else.
//!
//! `Encrypt` needs the master secret `(s, t)` directly (this is why the
//! scheme is secret-key, unlike [`crate::schemes::quadratic::quad`]).
//! It samples a fresh blinding scalar `gamma` and an invertible 2x2
//! matrix `W`, and lifts, per coordinate, `a_i = W^{-T}.(x_i, gamma
//! s_i)` into `G1` and `b_j = W.(y_j, -t_j)` into `G2`. The pairing
//! inner product of any `a_i` against any `b_j` then works out to
//! `<a_i,b_j> = x_i y_j - gamma s_i t_j` (the `W`/`W^{-T}` pair cancels
//! exactly, `<(x_i,gamma s_i), (y_j,-t_j)> = x_i y_j - gamma s_i t_j`),
//! so weighting by `F` and summing gives `x^T F y - gamma (s^T F t)`.
//! The functional key supplies `(s^T F t).g2`; pairing it against the
//! ciphertext's `gamma.g1` adds back exactly the subtracted term,
//! leaving `x^T F y` in the exponent for the final `GT` discrete log.

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_gt, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::group::{
    g1_generator, g2_generator, group_order, lift_g1, lift_g2, pair, pairing_inner_product,
    scalar_mul_g1, scalar_mul_g2, G1Affine, G1Vector, G2Vector,
};
use crate::linalg::{IntegerMatrix, IntegerVector};
use crate::sampler::{Sampler, Uniform};
use rand::RngCore;

/// Public parameters: `x` length `n`, `y` length `m`, shared bound `B`.
#[derive(Clone, Debug)]
pub struct Params {
    pub n: usize,
    pub m: usize,
    pub bound: Integer,
}

/// `MSK = (s, t)`: `s` length `n`, `t` length `m`, both mod `ord`.
#[derive(Clone, Debug)]
pub struct Msk {
    pub s: IntegerVector,
    pub t: IntegerVector,
}

/// `(gamma.g1, {a_i.g1}, {b_j.g2})`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub gamma_g1: G1Affine,
    pub a: Vec<G1Vector>,
    pub b: Vec<G2Vector>,
}

/// `f(s,t).g2` where `f(s,t) = sum_ij F_ij s_i t_j`.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub key: crate::group::G2Affine,
}

/// Generate the master secret key for `x in Z^n`, `y in Z^m`.
pub fn setup(n: usize, m: usize, bound: Integer, rng: &mut dyn RngCore) -> FeResult<(Params, Msk)> {
    let ord = group_order();
    let uniform = Uniform::new(ord);
    let s = uniform.sample_vec(n, rng);
    let t = uniform.sample_vec(m, rng);
    Ok((Params { n, m, bound }, Msk { s, t }))
}

fn sample_invertible_2x2(ord: &Integer, rng: &mut dyn RngCore) -> FeResult<(IntegerMatrix, IntegerMatrix)> {
    let uniform = Uniform::new(ord.clone());
    const MAX_ATTEMPTS: usize = 100;
    for _ in 0..MAX_ATTEMPTS {
        let w = uniform.sample_matrix(2, 2, rng);
        if let Ok((w_inv, det)) = w.inverse_mod_gauss(ord) {
            if !det.is_zero() {
                return Ok((w, w_inv));
            }
        }
    }
    Err(FeError::setup("sgp::Encrypt", "no invertible W found within the attempt budget"))
}

/// Encrypt `(x, y)` under the master secret key.
pub fn encrypt(
    params: &Params,
    msk: &Msk,
    x: &IntegerVector,
    y: &IntegerVector,
    rng: &mut dyn RngCore,
) -> FeResult<Ciphertext> {
    if x.len() != params.n {
        return Err(FeError::dim_mismatch("sgp::Encrypt", params.n, x.len()));
    }
    if y.len() != params.m {
        return Err(FeError::dim_mismatch("sgp::Encrypt", params.m, y.len()));
    }
    x.check_bound(&params.bound)?;
    y.check_bound(&params.bound)?;
    let ord = group_order();
    let gamma = Integer::sample_range(&Integer::one(), &ord, rng);
    let (_w, w_inv) = sample_invertible_2x2(&ord, rng)?;
    let w_inv_t = w_inv.transpose();

    let mut a = Vec::with_capacity(params.n);
    for i in 0..params.n {
        let pair_vec = IntegerVector::from_vec(vec![x.get(i).clone(), gamma.mul(msk.s.get(i)).modulo(&ord)]);
        let lifted = w_inv_t.mul_vec(&pair_vec)?.modulo(&ord);
        a.push(lift_g1(&lifted));
    }
    let mut b = Vec::with_capacity(params.m);
    for j in 0..params.m {
        let pair_vec = IntegerVector::from_vec(vec![y.get(j).clone(), msk.t.get(j).neg().modulo(&ord)]);
        let lifted = _w.mul_vec(&pair_vec)?.modulo(&ord);
        b.push(lift_g2(&lifted));
    }
    let gamma_g1 = scalar_mul_g1(&g1_generator(), &gamma);
    Ok(Ciphertext { gamma_g1, a, b })
}

/// Derive the functional key for `F in Z^{n x m}`.
pub fn derive_key(params: &Params, msk: &Msk, f: &IntegerMatrix) -> FeResult<FunctionalKey> {
    if f.rows() != params.n || f.cols() != params.m {
        return Err(FeError::dim_mismatch("sgp::DeriveKey", format!("{}x{}", params.n, params.m), format!("{}x{}", f.rows(), f.cols())));
    }
    let ord = group_order();
    let f_t = f.mul_vec(&msk.t)?;
    let f_st = msk.s.dot(&f_t)?.modulo(&ord);
    let key = scalar_mul_g2(&g2_generator(), &f_st);
    Ok(FunctionalKey { key })
}

/// Decrypt: recover `x^T F y` by summing the pairings selected by `F`'s
/// nonzero entries, correcting with the functional key, then solving
/// the final `GT` discrete log.
pub fn decrypt(params: &Params, ct: &Ciphertext, fk: &FunctionalKey, f: &IntegerMatrix) -> FeResult<Integer> {
    if f.rows() != params.n || f.cols() != params.m {
        return Err(FeError::dim_mismatch("sgp::Decrypt", format!("{}x{}", params.n, params.m), format!("{}x{}", f.rows(), f.cols())));
    }
    if ct.a.len() != params.n || ct.b.len() != params.m {
        return Err(FeError::dim_mismatch("sgp::Decrypt", params.n, ct.a.len()));
    }
    let mut target = crate::group::Gt::default();
    for i in 0..params.n {
        for j in 0..params.m {
            let weight = f.at(i, j);
            if weight.is_zero() {
                continue;
            }
            let cross = pairing_inner_product(&ct.a[i], &ct.b[j])?;
            target = target + crate::group::scalar_mul_gt(&cross, weight);
        }
    }
    target = target + pair(&ct.gamma_g1, &fk.key);

    let n_big = Integer::from_u64(params.n as u64);
    let m_big = Integer::from_u64(params.m as u64);
    let bound_cubed = params.bound.mul(&params.bound).mul(&params.bound);
    let search_bound = n_big.mul(&m_big).mul(&bound_cubed).to_i64().unwrap_or(MAX_BOUND).min(MAX_BOUND);
    signed_bsgs_gt(&pair(&g1_generator(), &g2_generator()), &target, search_bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    fn vec_i64(values: &[i64]) -> IntegerVector {
        IntegerVector::from_vec(values.iter().map(|v| Integer::from_i64(*v)).collect())
    }

    fn mat_i64(rows: &[&[i64]]) -> IntegerMatrix {
        IntegerMatrix::from_rows(rows.iter().map(|r| vec_i64(r)).collect())
    }

    #[test]
    fn round_trips_quadratic_form() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(8);
        let (params, msk) = setup(2, 3, bound, &mut rng).unwrap();
        let x = vec_i64(&[3, -2]);
        let y = vec_i64(&[1, 4, -1]);
        let f = mat_i64(&[&[1, 0, 2], &[-1, 3, 1]]);

        let ct = encrypt(&params, &msk, &x, &y, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &f).unwrap();
        let result = decrypt(&params, &ct, &fk, &f).unwrap();

        let fy = f.mul_vec(&y).unwrap();
        let expected = x.dot(&fy).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn dimension_mismatch_detected() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(8);
        let (params, msk) = setup(2, 3, bound, &mut rng).unwrap();
        let x = vec_i64(&[1, 1, 1]);
        let y = vec_i64(&[1, 1, 1]);
        assert!(encrypt(&params, &msk, &x, &y, &mut rng).is_err());
    }
}
