//! Paillier-based IPE: the discrete-log step from Simple-DDH is
//! replaced by Paillier's `L`-function, which recovers the exponent
//! exactly instead of needing BSGS, since the generator `g = n+1`
//! satisfies `g^k mod n^2 = 1 + k n mod n^2`.

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};
use crate::linalg::IntegerVector;
use crate::numtheory::generate_paillier_modulus;
use crate::sampler::{NormalNegative, Sampler};
use rand::RngCore;

/// Public parameters: Paillier modulus `n`, `n^2`, generator `g = n+1`,
/// vector length `l`, per-coordinate bounds `bound_x`, `bound_y`.
/// Precondition `2*l*bound_x^2 < n` and `2*l*bound_y^2 < n`.
#[derive(Clone, Debug)]
pub struct Params {
    pub n: Integer,
    pub n_squared: Integer,
    pub g: Integer,
    pub l: usize,
    pub bound_x: Integer,
    pub bound_y: Integer,
}

/// `MSK = s`, entries drawn from a discrete Gaussian over `Z`.
#[derive(Clone, Debug)]
pub struct Msk {
    pub s: IntegerVector,
}

/// `MPK_i = g^{s_i} mod n^2`.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub h: IntegerVector,
}

/// `FK = <s, y>` (kept as a plain integer, not reduced — the decryptor
/// needs the exact value to subtract it from the plaintext exponent).
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub sk_y: Integer,
}

/// `(c_0, c_1, ..., c_l) = (g^r, MPK_i^r g^{x_i})`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c0: Integer,
    pub c: IntegerVector,
}

fn check_precondition(l: usize, bound_x: &Integer, bound_y: &Integer, n: &Integer) -> FeResult<()> {
    let two_l = Integer::from_u64(2 * l as u64);
    if two_l.mul(&bound_x.mul(bound_x)) >= *n || two_l.mul(&bound_y.mul(bound_y)) >= *n {
        return Err(FeError::setup("paillier::Setup", "2*l*bound^2 must be < n for both bounds"));
    }
    Ok(())
}

/// Generate fresh parameters and master keys. `security_lambda` feeds
/// the discrete-Gaussian width for the secret key, per the scheme's
/// `sigma` depending on `n`'s bit length and the security parameter.
pub fn setup(
    l: usize,
    bound_x: Integer,
    bound_y: Integer,
    modulus_bits: u64,
    security_lambda: u64,
    rng: &mut dyn RngCore,
) -> FeResult<(Params, Msk, Mpk)> {
    let modulus = generate_paillier_modulus(modulus_bits, rng)?;
    check_precondition(l, &bound_x, &bound_y, &modulus.n)?;
    let sigma = (modulus.n.bit_len() as f64).sqrt() * (security_lambda.max(1) as f64);
    let gaussian = NormalNegative::new(sigma, security_lambda.max(1));
    let s = gaussian.sample_vec(l, rng);
    let h = s.apply(|si| modulus.g.mod_exp(si, &modulus.n_squared).expect("g invertible mod n^2"));
    let params = Params {
        n: modulus.n,
        n_squared: modulus.n_squared,
        g: modulus.g,
        l,
        bound_x,
        bound_y,
    };
    Ok((params, Msk { s }, Mpk { h }))
}

/// Encrypt `x`, using Paillier randomness `r in [0, n/4)`.
pub fn encrypt(
    params: &Params,
    mpk: &Mpk,
    x: &IntegerVector,
    rng: &mut dyn RngCore,
) -> FeResult<Ciphertext> {
    if x.len() != params.l {
        return Err(FeError::dim_mismatch("paillier::Encrypt", params.l, x.len()));
    }
    x.check_bound(&params.bound_x)?;
    let n_over_4 = params.n.div(&Integer::from_i64(4));
    let r = Integer::sample_uniform(&n_over_4, rng);
    let c0 = params.g.mod_exp(&r, &params.n_squared).expect("g invertible mod n^2");
    let mut c_entries = Vec::with_capacity(params.l);
    for i in 0..params.l {
        let mpk_r = mpk.h.get(i).mod_exp(&r, &params.n_squared).expect("mpk entry invertible mod n^2");
        let gx = params.g.mod_exp(x.get(i), &params.n_squared).expect("g invertible mod n^2");
        c_entries.push(mpk_r.mul(&gx).modulo(&params.n_squared));
    }
    Ok(Ciphertext { c0, c: IntegerVector::from_vec(c_entries) })
}

/// Derive the functional key for `y`: `<s, y>` kept exact (no modular
/// reduction, since the decryptor must subtract the precise value).
pub fn derive_key(params: &Params, msk: &Msk, y: &IntegerVector) -> FeResult<FunctionalKey> {
    if y.len() != params.l {
        return Err(FeError::dim_mismatch("paillier::DeriveKey", params.l, y.len()));
    }
    y.check_bound(&params.bound_y)?;
    Ok(FunctionalKey { sk_y: msk.s.dot(y)? })
}

/// Paillier's `L(x) = (x - 1) / n` (exact integer division).
fn l_function(x: &Integer, n: &Integer) -> Integer {
    x.sub(&Integer::one()).div(n)
}

/// Decrypt: recover `<x, y>` via the `L`-function, centered into
/// `(-n/2, n/2]`.
pub fn decrypt(
    params: &Params,
    ct: &Ciphertext,
    fk: &FunctionalKey,
    y: &IntegerVector,
) -> FeResult<Integer> {
    if y.len() != params.l || ct.c.len() != params.l {
        return Err(FeError::dim_mismatch("paillier::Decrypt", params.l, y.len()));
    }
    let mut numerator = Integer::one();
    for i in 0..params.l {
        let term = ct.c.get(i).mod_exp(y.get(i), &params.n_squared).expect("ciphertext entry invertible mod n^2");
        numerator = numerator.mul(&term).modulo(&params.n_squared);
    }
    let denom = ct.c0.mod_exp(&fk.sk_y, &params.n_squared).expect("c0 invertible mod n^2");
    let denom_inv = denom.mod_inverse(&params.n_squared).expect("c0 invertible mod n^2");
    let target = numerator.mul(&denom_inv).modulo(&params.n_squared);
    let raw = l_function(&target, &params.n).modulo(&params.n);
    Ok(raw.center(&params.n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_inner_product() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(20);
        let (params, msk, mpk) = setup(3, bound.clone(), bound, 64, 16, &mut rng).unwrap();
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
        let ct = encrypt(&params, &mpk, &x, &mut rng).unwrap();
        let fk = derive_key(&params, &msk, &y).unwrap();
        let result = decrypt(&params, &ct, &fk, &y).unwrap();
        assert_eq!(result, x.dot(&y).unwrap());
    }
}
