//! Ring-LWE IPE: the same `Z`/`A`/`MPK` template as [`crate::schemes::lwe`]
//! but every element is a ring element — an [`IntegerVector`] of length
//! `n` (a power of two) multiplied via negacyclic convolution in
//! `R_q = Z_q[X]/(X^n+1)` rather than plain scalar multiplication.

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};
use crate::linalg::IntegerVector;
use crate::sampler::{NormalNegative, Sampler, Uniform};
use rand::RngCore;

/// A single ring element: an [`IntegerVector`] of length `n`
/// interpreted as a polynomial coefficient list, reduced modulo `q`.
pub type RingElement = IntegerVector;

fn ring_mul(a: &RingElement, b: &RingElement, q: &Integer) -> FeResult<RingElement> {
    Ok(a.mul_as_poly_in_ring(b)?.modulo(q))
}

fn ring_add(a: &RingElement, b: &RingElement, q: &Integer) -> FeResult<RingElement> {
    Ok(a.add(b)?.modulo(q))
}

/// Public parameters: ring degree `n` (a power of two), modulus `q`,
/// public ring element `a`, inner-product modulus `k`, vector length
/// `l`, per-coordinate bound.
#[derive(Clone, Debug)]
pub struct Params {
    pub n: usize,
    pub q: Integer,
    pub k: Integer,
    pub a: RingElement,
    pub l: usize,
    pub bound: Integer,
    pub sigma1: f64,
    pub sigma2: f64,
    pub sigma3: f64,
}

/// `MSK = z`, one ring element per output coordinate.
#[derive(Clone, Debug)]
pub struct Msk {
    pub z: Vec<RingElement>,
}

/// `MPK_i = z_i * a mod q`.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub u: Vec<RingElement>,
}

/// `FK = sum_i y_i * z_i` (a single ring element).
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub z_y: RingElement,
}

/// `(c0, c1_1..c1_l) = (a*r + e0, u_i*r + e1_i + floor(q/K)*x_i)`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c0: RingElement,
    pub c1: Vec<RingElement>,
}

/// Pick a `(q, sigma1, sigma2, sigma3)` tuple for ring degree `n` that
/// satisfies the lattice-attack safety bound for every `b in
/// [50, lambda/0.265]`, `m in [max(1, b-n), 3n)` — iterating `n = 2^pow`
/// and increasing block size when the current degree can't be made
/// safe, per this scheme's Open Question decision. Bounded, reports
/// `SetupError` on non-convergence.
pub fn derive_fully_secure_parameters(
    lambda: f64,
    starting_pow: u32,
    rng: &mut dyn RngCore,
) -> FeResult<(usize, Integer, f64, f64, f64)> {
    const MAX_POW_STEPS: u32 = 8;
    let mut pow = starting_pow.max(3);
    for _ in 0..MAX_POW_STEPS {
        let n = 1usize << pow;
        let n_f = n as f64;
        let q_bits = (pow as u64 + 20).min(120);
        let q = Integer::random_prime(q_bits, rng);
        let sigma1 = n_f.sqrt();
        let sigma2 = n_f.sqrt() * 2.0;
        let sigma3 = n_f.sqrt() * 4.0;
        let sigma_prime = sigma3 / n_f.sqrt();

        let b_max = (lambda / 0.265).floor() as i64;
        let mut safe = true;
        let mut b = 50i64;
        while b <= b_max.max(50) {
            let m_lo = (b - n as i64).max(1);
            let m_hi = 3 * n as i64;
            let mut m = m_lo;
            while m < m_hi {
                let d = n as i64 + m;
                let b_f = b as f64;
                let delta = (std::f64::consts::PI * b_f).powf(1.0 / b_f) * b_f
                    / (2.0 * std::f64::consts::PI * std::f64::consts::E).powf(1.0 / (2.0 * b_f - 2.0));
                let lhs = sigma_prime * (b_f).sqrt();
                let rhs = delta.powf((2 * b - d - 1) as f64)
                    * (q.bit_len() as f64 * std::f64::consts::LN_2)
                        .exp()
                        .powf(m as f64 / d as f64);
                if lhs < rhs {
                    safe = false;
                    break;
                }
                m += (n as i64 / 4).max(1);
            }
            if !safe {
                break;
            }
            b += (b_max / 8).max(1);
        }
        if safe {
            return Ok((n, q, sigma1, sigma2, sigma3));
        }
        pow += 1;
    }
    Err(FeError::setup(
        "ring_lwe::derive_fully_secure_parameters",
        "no (n, q) pair satisfied the lattice-attack bound within the search budget",
    ))
}

/// Generate master keys against an explicit `(n, q, sigma1, sigma2)`
/// pair (the `simple` parameter family, or a pair already produced by
/// [`derive_fully_secure_parameters`]).
pub fn setup(
    l: usize,
    bound: Integer,
    n: usize,
    q: Integer,
    k: Integer,
    sigma1: f64,
    sigma2: f64,
    rng: &mut dyn RngCore,
) -> FeResult<(Params, Msk, Mpk)> {
    if !n.is_power_of_two() {
        return Err(FeError::setup("ring_lwe::Setup", "ring degree n must be a power of two"));
    }
    let a = Uniform::new(q.clone()).sample_vec(n, rng);
    let gauss1 = NormalNegative::new(sigma1, n as u64);
    let mut z = Vec::with_capacity(l);
    let mut u = Vec::with_capacity(l);
    for _ in 0..l {
        let zi = gauss1.sample_vec(n, rng).modulo(&q);
        let ui = ring_mul(&zi, &a, &q)?;
        z.push(zi);
        u.push(ui);
    }
    let params = Params { n, q, k, a, l, bound, sigma1, sigma2, sigma3: sigma2 };
    Ok((params, Msk { z }, Mpk { u }))
}

/// Encrypt `x` (one coefficient per ring-element slot, treated as a
/// length-`l` vector of scalar plaintexts embedded in the constant
/// term of each ring element).
pub fn encrypt(
    params: &Params,
    mpk: &Mpk,
    x: &IntegerVector,
    rng: &mut dyn RngCore,
) -> FeResult<Ciphertext> {
    if x.len() != params.l {
        return Err(FeError::dim_mismatch("ring_lwe::Encrypt", params.l, x.len()));
    }
    x.check_bound(&params.bound)?;
    let r = Uniform::new(params.q.clone()).sample_vec(params.n, rng);
    let e0 = NormalNegative::new(params.sigma1, params.n as u64).sample_vec(params.n, rng);
    let c0 = ring_add(&ring_mul(&params.a, &r, &params.q)?, &e0, &params.q)?;
    let scale = params.q.div(&params.k);
    let mut c1 = Vec::with_capacity(params.l);
    for i in 0..params.l {
        let e1 = NormalNegative::new(params.sigma2, params.n as u64).sample_vec(params.n, rng);
        let ui_r = ring_mul(&mpk.u[i], &r, &params.q)?;
        let mut coeffs = vec![Integer::zero(); params.n];
        coeffs[0] = scale.mul(x.get(i));
        let scaled_x = RingElement::from_vec(coeffs);
        let ci = ring_add(&ring_add(&ui_r, &e1, &params.q)?, &scaled_x, &params.q)?;
        c1.push(ci);
    }
    Ok(Ciphertext { c0, c1 })
}

/// Derive the functional key for `y`: `sum_i y_i * z_i`.
pub fn derive_key(params: &Params, msk: &Msk, y: &IntegerVector) -> FeResult<FunctionalKey> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("ring_lwe::DeriveKey", params.l, y.len()));
    }
    y.check_bound(&params.bound)?;
    let mut acc = RingElement::zero(params.n);
    for i in 0..params.l {
        let term = msk.z[i].mul_scalar(y.get(i));
        acc = acc.add(&term)?;
    }
    Ok(FunctionalKey { z_y: acc.modulo(&params.q) })
}

/// Decrypt: recover `<x, y>` from the constant term of
/// `sum_i y_i*c1_i - z_y*c0 mod q`, rounded to the nearest multiple of
/// `floor(q/K)`.
pub fn decrypt(
    params: &Params,
    ct: &Ciphertext,
    fk: &FunctionalKey,
    y: &IntegerVector,
) -> FeResult<Integer> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("ring_lwe::Decrypt", params.l, y.len()));
    }
    let mut acc = RingElement::zero(params.n);
    for i in 0..params.l {
        let term = ct.c1[i].mul_scalar(y.get(i));
        acc = acc.add(&term)?;
    }
    let z_y_c0 = ring_mul(&fk.z_y, &ct.c0, &params.q)?;
    let diff = acc.sub(&z_y_c0)?.modulo(&params.q);
    let constant_term = diff.get(0).center(&params.q);
    let scale = params.q.div(&params.k);
    let half_scale = params.q.div(&params.k.mul(&Integer::from_i64(2)));
    let rounded = constant_term.add(&half_scale).div(&scale);
    Ok(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_small_inner_product() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(3);
        let k = Integer::from_i64(64);
        let q = Integer::random_prime(40, &mut rng);
        let (params, msk, mpk) = setup(2, bound, 8, q, k, 1.0, 1.0, &mut rng).unwrap();
        let x = IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(1)]);
        let y = IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(3)]);
        let ct = encrypt(&params, &mpk, &x, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &y).unwrap();
        let result = decrypt(&params, &ct, &fk, &y).unwrap();
        assert_eq!(result, x.dot(&y).unwrap());
    }
}
