//! Fully-secure LWE-based IPE.
//!
//! The functional-key cancellation is the same as the pairing-free
//! schemes: `MPK = Z A` lets `<y, U r>` and `<Z^T y, A r>` cancel in
//! `Decrypt`, leaving `floor(q/K) <x,y>` plus bounded LWE noise.

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};
use crate::linalg::{IntegerMatrix, IntegerVector};
use crate::sampler::{NormalNegative, Sampler, Uniform};
use rand::RngCore;

/// Public parameters. `a` is the `m x n` public LWE matrix; `k` is the
/// inner-product modulus `K` the plaintext/result live modulo.
#[derive(Clone, Debug)]
pub struct Params {
    pub n: usize,
    pub m: usize,
    pub q: Integer,
    pub k: Integer,
    pub a: IntegerMatrix,
    pub sigma1: f64,
    pub sigma2: f64,
    pub l: usize,
    pub bound: Integer,
}

/// `MSK = Z in Z_q^{l x m}`: first `m/2` columns of each row are drawn
/// from a discrete Gaussian of width `sigma1`, the rest from `sigma2`
/// with an identity shift on the second-half diagonal.
#[derive(Clone, Debug)]
pub struct Msk {
    pub z: IntegerMatrix,
}

/// `MPK = Z . A mod q`, an `l x n` matrix.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub u: IntegerMatrix,
}

/// `FK = z_y = Z^T . y mod q`, an `m`-vector.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub z_y: IntegerVector,
}

/// `(c0, c1) = (A r + e0, U r + e1 + floor(q/K) x)`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c0: IntegerVector,
    pub c1: IntegerVector,
}

/// Iterate candidate `(q, nBitsQ)` pairs until the self-consistency
/// inequalities from the parameter-selection constraints are
/// satisfied, per this scheme's Open Question decision: a bounded
/// search that reports `SetupError` on non-convergence rather than
/// looping forever.
fn derive_parameters(n: u64, m: u64, k_modulus: &Integer, rng: &mut dyn RngCore) -> FeResult<(Integer, f64, f64)> {
    let n_f = n as f64;
    let m_f = m as f64;
    let k_f = k_modulus.to_i64().unwrap_or(i64::MAX) as f64;
    let sigma1 = (n_f * m_f.ln()).sqrt() * k_f.powi(2).max(m_f).sqrt();
    let sigma2 = n_f.sqrt() * n_f.powi(3) * m_f.ln().powf(2.5) * m_f.sqrt() * k_f.powi(2).max(m_f);
    let sigma_bound = (n_f * (sigma1 * sigma1 + sigma2 * sigma2)).sqrt();
    let sigma = 1.0 / (k_f * k_f * sigma_bound * n_f.ln().max(1.0));

    const MAX_ITERATIONS: u32 = 64;
    let mut n_bits_q: u32 = 16;
    for _ in 0..MAX_ITERATIONS {
        let sigma_prime = sigma / k_f / (n_f.powi(6) * (n_bits_q as f64).powi(2) * n_f.ln().powf(2.5));
        if sigma_prime > 0.0 && sigma_prime.is_finite() {
            let q_min = n_f.ln().sqrt() / sigma_prime;
            if q_min.is_finite() && q_min > 0.0 {
                let q = Integer::random_prime(n_bits_q as u64, rng);
                let q_f = q.bit_len() as f64;
                if q_f >= n_bits_q as f64 - 1.0 && (q.to_i64().map(|v| v as f64).unwrap_or(f64::MAX)) > q_min {
                    return Ok((q, sigma1, sigma2));
                }
            }
        }
        n_bits_q += 4;
    }
    Err(FeError::setup("lwe::Setup", "parameter search did not converge within the iteration budget"))
}

/// Generate fresh parameters and master keys for vectors of length `l`
/// bounded by `bound`, dimension `n`, sample count `m`, inner-product
/// modulus `k`.
pub fn setup(
    l: usize,
    bound: Integer,
    n: usize,
    m: usize,
    k: Integer,
    rng: &mut dyn RngCore,
) -> FeResult<(Params, Msk, Mpk)> {
    let (q, sigma1, sigma2) = derive_parameters(n as u64, m as u64, &k, rng)?;
    setup_with_params(l, bound, n, m, q, k, sigma1, sigma2, rng)
}

/// Generate master keys against an explicitly supplied `(q, sigma1,
/// sigma2)` triple, bypassing [`derive_parameters`]. The fully-secure
/// derivation picks noise widths sized for cryptographic security
/// (hundred-bit-plus `q`); callers working a toy-sized modulus for
/// testing supply their own consistent triple here instead.
pub fn setup_with_params(
    l: usize,
    bound: Integer,
    n: usize,
    m: usize,
    q: Integer,
    k: Integer,
    sigma1: f64,
    sigma2: f64,
    rng: &mut dyn RngCore,
) -> FeResult<(Params, Msk, Mpk)> {
    let a = Uniform::new(q.clone()).sample_matrix(m, n, rng);

    let half = m / 2;
    let gauss1 = NormalNegative::new(sigma1, n as u64);
    let gauss2 = NormalNegative::new(sigma2, n as u64);
    let mut rows = Vec::with_capacity(l);
    for i in 0..l {
        let mut row = Vec::with_capacity(m);
        for j in 0..half {
            row.push(gauss1.sample(rng).modulo(&q));
            let _ = j;
        }
        for j in half..m {
            let mut v = gauss2.sample(rng);
            if j - half == i % (m - half).max(1) {
                v = v.add(&Integer::one());
            }
            row.push(v.modulo(&q));
        }
        rows.push(IntegerVector::from_vec(row));
    }
    let z = IntegerMatrix::from_rows(rows);
    let u = z.mul_mat(&a)?.modulo(&q);
    let params = Params { n, m, q, k, a, sigma1, sigma2, l, bound };
    Ok((params, Msk { z }, Mpk { u }))
}

/// Encrypt `x`.
pub fn encrypt(
    params: &Params,
    mpk: &Mpk,
    x: &IntegerVector,
    rng: &mut dyn RngCore,
) -> FeResult<Ciphertext> {
    if x.len() != params.l {
        return Err(FeError::dim_mismatch("lwe::Encrypt", params.l, x.len()));
    }
    x.check_bound(&params.bound)?;
    let r = Uniform::new(params.q.clone()).sample_vec(params.n, rng);
    let e0 = NormalNegative::new(params.sigma1, params.n as u64).sample_vec(params.m, rng);
    let e1 = NormalNegative::new(params.sigma2, params.n as u64).sample_vec(params.l, rng);
    let c0 = params.a.mul_vec(&r)?.add(&e0)?.modulo(&params.q);
    let scale = params.q.div(&params.k);
    let scaled_x = x.apply(|xi| scale.mul(xi));
    let u_r = mpk.u.mul_vec(&r)?;
    let c1 = u_r.add(&e1)?.add(&scaled_x)?.modulo(&params.q);
    Ok(Ciphertext { c0, c1 })
}

/// Derive the functional key for `y`.
pub fn derive_key(params: &Params, msk: &Msk, y: &IntegerVector) -> FeResult<FunctionalKey> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("lwe::DeriveKey", params.l, y.len()));
    }
    y.check_bound(&params.bound)?;
    let z_y = msk.z.transpose().mul_vec(y)?.modulo(&params.q);
    Ok(FunctionalKey { z_y })
}

/// Decrypt: recover `<x, y>` by rounding `<y,c1> - <z_y,c0> mod q` to
/// the nearest multiple of `floor(q/K)`.
pub fn decrypt(
    params: &Params,
    ct: &Ciphertext,
    fk: &FunctionalKey,
    y: &IntegerVector,
) -> FeResult<Integer> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("lwe::Decrypt", params.l, y.len()));
    }
    let lhs = y.dot(&ct.c1)?;
    let rhs = fk.z_y.dot(&ct.c0)?;
    let raw = lhs.sub(&rhs).modulo(&params.q).center(&params.q);
    let scale = params.q.div(&params.k);
    let half_scale = params.q.div(&params.k.mul(&Integer::from_i64(2)));
    let shifted = raw.add(&half_scale);
    let rounded = shifted.div(&scale);
    Ok(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_small_inner_product() {
        // A toy-sized (q, sigma1, sigma2) triple well inside the noise
        // budget `floor(q/K)` leaves for the scaled inner product, rather
        // than the fully-secure derivation's cryptographic-scale sigmas.
        let mut rng = thread_rng();
        let bound = Integer::from_i64(3);
        let k = Integer::from_i64(64);
        let q = Integer::random_prime(40, &mut rng);
        let (params, msk, mpk) =
            setup_with_params(2, bound, 8, 40, q, k, 1.0, 1.0, &mut rng).unwrap();
        let x = IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(2)]);
        let y = IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(1)]);
        let ct = encrypt(&params, &mpk, &x, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &y).unwrap();
        let result = decrypt(&params, &ct, &fk, &y).unwrap();
        assert_eq!(result, x.dot(&y).unwrap());
    }
}
