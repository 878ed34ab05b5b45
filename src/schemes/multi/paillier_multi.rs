//! Central-authority multi-input IPE over Paillier: the same
//! one-time-pad masking as [`crate::schemes::multi::ddh_multi`], but
//! `Decrypt` recovers the masked sum exactly via the `L`-function
//! (as in [`crate::schemes::paillier`]) before subtracting `Z` —
//! no discrete-log search at all.

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};
use crate::linalg::IntegerVector;
use crate::numtheory::generate_paillier_modulus;
use crate::sampler::{NormalNegative, Sampler};
use rand::RngCore;

/// Public parameters shared by every client: Paillier modulus `n`,
/// `n^2`, generator `g = n+1`, client count `n_clients`, per-client
/// length `l`, per-coordinate bounds. Precondition
/// `2*n_clients*l*bound_x^2 < n` and `2*n_clients*l*bound_y^2 < n`.
#[derive(Clone, Debug)]
pub struct Params {
    pub n: Integer,
    pub n_squared: Integer,
    pub g: Integer,
    pub n_clients: usize,
    pub l: usize,
    pub bound_x: Integer,
    pub bound_y: Integer,
}

/// Client `i`'s encryption key: `(s_i, u_i)`.
#[derive(Clone, Debug)]
pub struct EncryptionKey {
    pub s: IntegerVector,
    pub u: IntegerVector,
}

/// `MSK = {EncryptionKey_i}`, held only by the central authority.
#[derive(Clone, Debug)]
pub struct Msk {
    pub clients: Vec<EncryptionKey>,
}

/// `MPK_i = g^{s_i} mod n^2`, one vector per client.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub h: Vec<IntegerVector>,
}

/// `FK = ({<s_i,y_i>}, Z = sum_i <u_i,y_i>)`, both kept exact.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub sk_y: Vec<Integer>,
    pub z: Integer,
}

/// Client `i`'s ciphertext, identical in shape to
/// [`crate::schemes::paillier::Ciphertext`] but encrypting `x_i + u_i`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c0: Integer,
    pub c: IntegerVector,
}

fn check_precondition(n_clients: usize, l: usize, bound_x: &Integer, bound_y: &Integer, n: &Integer) -> FeResult<()> {
    let two_nl = Integer::from_u64(2 * (n_clients * l) as u64);
    if two_nl.mul(&bound_x.mul(bound_x)) >= *n || two_nl.mul(&bound_y.mul(bound_y)) >= *n {
        return Err(FeError::setup(
            "paillier_multi::Setup",
            "2*n_clients*l*bound^2 must be < n for both bounds",
        ));
    }
    Ok(())
}

/// Generate a shared Paillier modulus and per-client master keys.
pub fn setup(
    n_clients: usize,
    l: usize,
    bound_x: Integer,
    bound_y: Integer,
    modulus_bits: u64,
    security_lambda: u64,
    rng: &mut dyn RngCore,
) -> FeResult<(Params, Msk, Mpk)> {
    let modulus = generate_paillier_modulus(modulus_bits, rng)?;
    check_precondition(n_clients, l, &bound_x, &bound_y, &modulus.n)?;
    let sigma = (modulus.n.bit_len() as f64).sqrt() * (security_lambda.max(1) as f64);
    let gaussian = NormalNegative::new(sigma, security_lambda.max(1));

    let mut clients = Vec::with_capacity(n_clients);
    let mut h = Vec::with_capacity(n_clients);
    for _ in 0..n_clients {
        let s = gaussian.sample_vec(l, rng);
        // Drawn from the same unbounded-over-Z shape as s, since Decrypt
        // cancels it exactly via Z rather than requiring a bound on it.
        let u = gaussian.sample_vec(l, rng);
        let h_i = s.apply(|si| modulus.g.mod_exp(si, &modulus.n_squared).expect("g invertible mod n^2"));
        clients.push(EncryptionKey { s, u });
        h.push(h_i);
    }
    let params = Params {
        n: modulus.n,
        n_squared: modulus.n_squared,
        g: modulus.g,
        n_clients,
        l,
        bound_x,
        bound_y,
    };
    Ok((params, Msk { clients }, Mpk { h }))
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
    if idx >= params.n_clients {
        return Err(FeError::dim_mismatch("paillier_multi::Encrypt", params.n_clients, idx + 1));
    }
    if x_i.len() != params.l {
        return Err(FeError::dim_mismatch("paillier_multi::Encrypt", params.l, x_i.len()));
    }
    x_i.check_bound(&params.bound_x)?;
    let masked = x_i.add(&ek.u)?;
    let n_over_4 = params.n.div(&Integer::from_i64(4));
    let r = Integer::sample_uniform(&n_over_4, rng);
    let c0 = params.g.mod_exp(&r, &params.n_squared).expect("g invertible mod n^2");
    let mut c_entries = Vec::with_capacity(params.l);
    for j in 0..params.l {
        let mpk_r = mpk.h[idx].get(j).mod_exp(&r, &params.n_squared).expect("mpk entry invertible mod n^2");
        let gx = params.g.mod_exp(masked.get(j), &params.n_squared).expect("g invertible mod n^2");
        c_entries.push(mpk_r.mul(&gx).modulo(&params.n_squared));
    }
    Ok(Ciphertext { c0, c: IntegerVector::from_vec(c_entries) })
}

/// Derive the functional key for `(y_1, .., y_n)`.
pub fn derive_key(params: &Params, msk: &Msk, ys: &[IntegerVector]) -> FeResult<FunctionalKey> {
    if ys.len() != params.n_clients {
        return Err(FeError::dim_mismatch("paillier_multi::DeriveKey", params.n_clients, ys.len()));
    }
    let mut sk_y = Vec::with_capacity(params.n_clients);
    let mut z = Integer::zero();
    for (i, y_i) in ys.iter().enumerate() {
        if y_i.len() != params.l {
            return Err(FeError::dim_mismatch("paillier_multi::DeriveKey", params.l, y_i.len()));
        }
        y_i.check_bound(&params.bound_y)?;
        let client = &msk.clients[i];
        sk_y.push(client.s.dot(y_i)?);
        z = z.add(&client.u.dot(y_i)?);
    }
    Ok(FunctionalKey { sk_y, z })
}

fn l_function(x: &Integer, n: &Integer) -> Integer {
    x.sub(&Integer::one()).div(n)
}

/// Decrypt: recover `sum_i <x_i, y_i>` via the `L`-function, after
/// subtracting the exact mask total `Z`.
pub fn decrypt(params: &Params, cts: &[Ciphertext], fk: &FunctionalKey, ys: &[IntegerVector]) -> FeResult<Integer> {
    if cts.len() != params.n_clients || ys.len() != params.n_clients || fk.sk_y.len() != params.n_clients {
        return Err(FeError::dim_mismatch("paillier_multi::Decrypt", params.n_clients, cts.len()));
    }
    let mut product = Integer::one();
    for i in 0..params.n_clients {
        let ct = &cts[i];
        let y_i = &ys[i];
        if ct.c.len() != params.l || y_i.len() != params.l {
            return Err(FeError::dim_mismatch("paillier_multi::Decrypt", params.l, ct.c.len()));
        }
        let mut numerator = Integer::one();
        for j in 0..params.l {
            let term = ct.c.get(j).mod_exp(y_i.get(j), &params.n_squared).expect("ciphertext entry invertible mod n^2");
            numerator = numerator.mul(&term).modulo(&params.n_squared);
        }
        let denom = ct.c0.mod_exp(&fk.sk_y[i], &params.n_squared).expect("c0 invertible mod n^2");
        let denom_inv = denom.mod_inverse(&params.n_squared).expect("c0 invertible mod n^2");
        product = product.mul(&numerator).mul(&denom_inv).modulo(&params.n_squared);
    }
    let raw = l_function(&product, &params.n).modulo(&params.n);
    let unmasked = raw.sub(&fk.z).modulo(&params.n);
    Ok(unmasked.center(&params.n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_sum_of_inner_products() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(15);
        let (params, msk, mpk) = setup(2, 2, bound.clone(), bound, 64, 16, &mut rng).unwrap();

        let xs = vec![
            IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(-1)]),
            IntegerVector::from_vec(vec![Integer::from_i64(4), Integer::from_i64(3)]),
        ];
        let ys = vec![
            IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(2)]),
            IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(1)]),
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
