//! Function-hiding multi-input IPE: `n` clients each hold their own
//! `(B_i, B*_i)` pair over a shared scalar `mu` satisfying
//! `B_i^T . B*_i = mu . I`, so cross terms between different clients'
//! ciphertexts and a single functional key cancel exactly the way a
//! single FHIPE pair does for one client. Each client's plaintext
//! vector is zero-padded with one extra "noise" coordinate so a
//! per-client noise matrix `gamma` (whose rows sum to zero across
//! clients) can be folded into the ciphertext without perturbing
//! `sum_i <x_i, y_i>`.
//!
//! Unlike single-client FHIPE, `Encrypt`/`DeriveKey` do not sample a
//! fresh per-client blinding scalar: a client-`i`-only `beta_i`/`alpha_i`
//! pair would multiply that client's contribution to `Decrypt`'s `GT`
//! target by `alpha_i*beta_i`, a factor that differs client to client
//! and so cannot be divided back out by a single shared base — the
//! zero-summing `gamma` noise would then be weighted by that same factor
//! and stop cancelling. `Decrypt` instead sums the raw `B_i`/`B*_i`
//! pairings directly and recovers `sum_i <x_i, y_i>` as the discrete log
//! relative to the published base `mpk.gt_mu = mu . e(g1, g2)`, so
//! `Decrypt` never needs `mu` itself in the clear.

use crate::bigint::Integer;
use crate::dlog::{signed_bsgs_gt, MAX_BOUND};
use crate::error::{FeError, FeResult};
use crate::group::{
    g1_generator, g2_generator, group_order, lift_g1, lift_g2, pairing_inner_product,
    scalar_mul_gt, pair, Gt, G1Vector, G2Vector,
};
use crate::linalg::{IntegerMatrix, IntegerVector};
use crate::sampler::{Sampler, Uniform};
use rand::RngCore;

/// Public parameters: number of clients `n`, per-client vector length
/// `l`, per-coordinate bounds.
#[derive(Clone, Debug)]
pub struct Params {
    pub n: usize,
    pub l: usize,
    pub bound_x: Integer,
    pub bound_y: Integer,
}

/// Per-client master key: `(B_i, B*_i)` over the padded dimension
/// `l+1`, sharing the scheme-wide `mu`.
#[derive(Clone, Debug)]
pub struct ClientMsk {
    pub b: IntegerMatrix,
    pub b_star: IntegerMatrix,
    /// Row `i` of the zero-summing noise matrix: `gamma_i`, length `n`.
    pub gamma_row: IntegerVector,
}

/// `MSK = (mu, client keys)`.
#[derive(Clone, Debug)]
pub struct Msk {
    pub mu: Integer,
    pub clients: Vec<ClientMsk>,
}

/// `MPK = mu . e(g1, g2)`, public but never reveals `mu` itself.
#[derive(Clone, Debug)]
pub struct Mpk {
    pub gt_mu: Gt,
}

/// One client's ciphertext: `B*_i . x_i_padded` lifted into `G2`, over
/// the padded dimension `l+1`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c2: G2Vector,
}

/// The functional key for `(y_1, .., y_n)`: one `B_i . y_i_padded`
/// (lifted into `G1`) per client.
#[derive(Clone, Debug)]
pub struct FunctionalKey {
    pub k2: Vec<G1Vector>,
}

fn check_precondition(n: usize, l: usize, bound_x: &Integer, bound_y: &Integer, ord: &Integer) -> FeResult<()> {
    let bound = Integer::from_u64(2 * (n * l) as u64).mul(bound_x).mul(bound_y);
    if bound >= *ord {
        return Err(FeError::setup("fh_multi_ipe::Setup", "2*n*l*bound_x*bound_y must be < ord"));
    }
    Ok(())
}

/// Generate master/public keys for `n` clients each encrypting
/// length-`l` vectors.
pub fn setup(n: usize, l: usize, bound_x: Integer, bound_y: Integer, rng: &mut dyn RngCore) -> FeResult<(Params, Msk, Mpk)> {
    let ord = group_order();
    check_precondition(n, l, &bound_x, &bound_y, &ord)?;
    let uniform = Uniform::new(ord.clone());
    let mu = Integer::sample_range(&Integer::one(), &ord, rng);

    // A zero-summing noise matrix: row i holds client i's additive
    // share gamma_i, drawn so that sum_i gamma_i == 0 mod ord (the last
    // client's row is fixed to cancel the rest).
    let padded = l + 1;
    let mut gamma_rows: Vec<IntegerVector> = Vec::with_capacity(n);
    let mut running = IntegerVector::zero(n);
    for _ in 0..n.saturating_sub(1) {
        let row = uniform.sample_vec(n, rng);
        running = running.add(&row)?.modulo(&ord);
        gamma_rows.push(row);
    }
    if n > 0 {
        let last = running.apply(|v| v.neg().modulo(&ord));
        gamma_rows.push(last);
    }

    const MAX_ATTEMPTS: usize = 100;
    let mut clients = Vec::with_capacity(n);
    for i in 0..n {
        let mut found = None;
        for _ in 0..MAX_ATTEMPTS {
            let b = uniform.sample_matrix(padded, padded, rng);
            let Ok((b_inv, det)) = b.inverse_mod_gauss(&ord) else { continue };
            if det.is_zero() {
                continue;
            }
            // B*_i := mu . (B_i^-1)^T, giving B_i^T . B*_i = mu . I.
            let b_star = b_inv.transpose().mul_scalar(&mu).modulo(&ord);
            found = Some((b, b_star));
            break;
        }
        let (b, b_star) = found.ok_or_else(|| {
            FeError::setup("fh_multi_ipe::Setup", "no invertible client B found within the attempt budget")
        })?;
        clients.push(ClientMsk { b, b_star, gamma_row: gamma_rows[i].clone() });
    }

    let gt_mu = scalar_mul_gt(&pair(&g1_generator(), &g2_generator()), &mu);
    let params = Params { n, l, bound_x, bound_y };
    Ok((params, Msk { mu, clients }, Mpk { gt_mu }))
}

/// Encrypt client `idx`'s vector `x_i` (length `l`); the padded
/// coordinate carries that client's noise share.
pub fn encrypt(
    params: &Params,
    msk: &Msk,
    idx: usize,
    x_i: &IntegerVector,
    _rng: &mut dyn RngCore,
) -> FeResult<Ciphertext> {
    if idx >= params.n {
        return Err(FeError::dim_mismatch("fh_multi_ipe::Encrypt", params.n, idx + 1));
    }
    if x_i.len() != params.l {
        return Err(FeError::dim_mismatch("fh_multi_ipe::Encrypt", params.l, x_i.len()));
    }
    x_i.check_bound(&params.bound_x)?;
    let ord = group_order();
    let client = &msk.clients[idx];
    let noise = client.gamma_row.as_slice().iter().fold(Integer::zero(), |acc, v| acc.add(v)).modulo(&ord);
    let mut padded = x_i.as_slice().to_vec();
    padded.push(noise);
    let padded = IntegerVector::from_vec(padded);

    let bx = client.b_star.mul_vec(&padded)?;
    let c2 = lift_g2(&bx);
    Ok(Ciphertext { c2 })
}

/// Derive the functional key for `(y_1, .., y_n)`, one client key per
/// entry; the padded coordinate is fixed to `1` so each client's noise
/// share is added in unchanged, to be cancelled by the others'.
pub fn derive_key(params: &Params, msk: &Msk, ys: &[IntegerVector], _rng: &mut dyn RngCore) -> FeResult<FunctionalKey> {
    if ys.len() != params.n {
        return Err(FeError::dim_mismatch("fh_multi_ipe::DeriveKey", params.n, ys.len()));
    }
    let mut k2 = Vec::with_capacity(params.n);
    for (i, y_i) in ys.iter().enumerate() {
        if y_i.len() != params.l {
            return Err(FeError::dim_mismatch("fh_multi_ipe::DeriveKey", params.l, y_i.len()));
        }
        y_i.check_bound(&params.bound_y)?;
        let mut padded = y_i.as_slice().to_vec();
        padded.push(Integer::one());
        let padded = IntegerVector::from_vec(padded);
        let by = msk.clients[i].b.mul_vec(&padded)?;
        k2.push(lift_g1(&by));
    }
    Ok(FunctionalKey { k2 })
}

/// Decrypt: recover `sum_i <x_i, y_i>` as the discrete log of
/// `sum_i sum_j e(k2_i_j, c2_i_j)` relative to the published base
/// `mpk.gt_mu`.
pub fn decrypt(params: &Params, mpk: &Mpk, cts: &[Ciphertext], fk: &FunctionalKey) -> FeResult<Integer> {
    if cts.len() != params.n || fk.k2.len() != params.n {
        return Err(FeError::dim_mismatch("fh_multi_ipe::Decrypt", params.n, cts.len()));
    }
    let mut target = Gt::default();
    for i in 0..params.n {
        target = target + pairing_inner_product(&fk.k2[i], &cts[i].c2)?;
    }
    let n_l_big = Integer::from_u64((params.n * params.l) as u64);
    let search_bound = n_l_big
        .mul(&params.bound_x)
        .mul(&params.bound_y)
        .to_i64()
        .unwrap_or(MAX_BOUND)
        .min(MAX_BOUND);
    signed_bsgs_gt(&mpk.gt_mu, &target, search_bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_sum_of_inner_products() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(8);
        let (params, msk, mpk) = setup(3, 2, bound.clone(), bound, &mut rng).unwrap();

        let xs = vec![
            IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(2)]),
            IntegerVector::from_vec(vec![Integer::from_i64(-1), Integer::from_i64(3)]),
            IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(-2)]),
        ];
        let ys = vec![
            IntegerVector::from_vec(vec![Integer::from_i64(3), Integer::from_i64(1)]),
            IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(2)]),
            IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(1)]),
        ];

        let cts: Vec<Ciphertext> = xs
            .iter()
            .enumerate()
            .map(|(i, x_i)| encrypt(&params, &msk, i, x_i, &mut rng).unwrap())
            .collect();
        let fk = derive_key(&params, &msk, &ys, &mut rng).unwrap();
        let result = decrypt(&params, &mpk, &cts, &fk).unwrap();

        let expected: Integer = xs
            .iter()
            .zip(ys.iter())
            .map(|(x_i, y_i)| x_i.dot(y_i).unwrap())
            .fold(Integer::zero(), |acc, v| acc.add(&v));
        assert_eq!(result, expected);
    }

    #[test]
    fn client_count_mismatch_detected() {
        let mut rng = thread_rng();
        let bound = Integer::from_i64(5);
        let (params, msk, _mpk) = setup(2, 2, bound.clone(), bound, &mut rng).unwrap();
        let ys = vec![IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(1)])];
        assert!(derive_key(&params, &msk, &ys, &mut rng).is_err());
    }
}
