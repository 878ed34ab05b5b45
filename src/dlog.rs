//! Component E: discrete logarithm recovery in `Z_p^*` and in `GT`.
//!
//! Every scheme that leaves its decryption result in the exponent calls
//! into here. `MAX_BOUND` mirrors the teacher's process-wide `OnceLock`
//! cache pattern (`pcs.rs`'s `srs_g1`/`srs_g2`), generalized to cache
//! baby-step tables for a `GT` base across repeated `Decrypt` calls that
//! share a functional key.

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};
use crate::group::{scalar_mul_gt, Gt};
use ark_serialize::CanonicalSerialize;
use std::collections::HashMap;
use std::sync::{mpsc, Mutex, OnceLock};
use std::thread;

/// Hard upper cap on the search space a single invocation may explore,
/// matching spec's `1.5e10` default. Any requested bound above this is
/// silently clamped.
pub const MAX_BOUND: i64 = 15_000_000_000;

fn clamp_bound(bound: i64) -> i64 {
    bound.min(MAX_BOUND).max(0)
}

fn isqrt(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    let mut x = (n as f64).sqrt() as i64;
    while x > 0 && x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}

/// Baby-step/giant-step in `Z_p^*`: find `0 <= x <= bound` with
/// `h = g^x mod p`. Grows the giant step as powers of two, so small
/// answers are found in near-logarithmic time without ever building
/// the full `sqrt(bound)`-sized table.
pub fn bsgs_zp(g: &Integer, h: &Integer, p: &Integer, bound: i64) -> FeResult<i64> {
    let bound = clamp_bound(bound);
    let max_m = isqrt(bound) + 1;
    let mut table: HashMap<Integer, i64> = HashMap::new();
    let mut cur = Integer::one();
    let mut filled: i64 = 0;
    let mut m: i64 = 1.min(max_m).max(1);
    loop {
        while filled < m {
            table.insert(cur.clone(), filled);
            cur = cur.mul(g).modulo(p);
            filled += 1;
        }
        let giant_factor = g
            .mod_exp(&Integer::from_i64(-m), p)
            .ok_or_else(|| FeError::setup("bsgs_zp", "base is not invertible modulo p"))?;
        let mut probe = h.modulo(p);
        let steps = bound / m + 2;
        for j in 0..steps {
            if let Some(&i) = table.get(&probe) {
                let candidate = i + j * m;
                if candidate <= bound {
                    return Ok(candidate);
                }
            }
            probe = probe.mul(&giant_factor).modulo(p);
        }
        if m >= max_m {
            break;
        }
        m = (m * 2).min(max_m);
    }
    Err(FeError::DlogNotFound { context: "bsgs_zp", bound: bound.to_string() })
}

/// Signed discrete log in `Z_p^*`: runs the positive-base and
/// inverted-base searches concurrently and returns whichever succeeds,
/// disambiguated by a single verification `g^x =? h`.
pub fn signed_bsgs_zp(g: &Integer, h: &Integer, p: &Integer, bound: i64) -> FeResult<Integer> {
    let bound = clamp_bound(bound);
    let g_inv = g
        .mod_inverse(p)
        .ok_or_else(|| FeError::setup("signed_bsgs_zp", "base is not invertible modulo p"))?;

    let (tx, rx) = mpsc::channel::<Option<(i64, bool)>>();
    thread::scope(|scope| {
        let tx_pos = tx.clone();
        scope.spawn(|| {
            let result = bsgs_zp(g, h, p, bound).ok().map(|x| (x, false));
            let _ = tx_pos.send(result);
        });
        let tx_neg = tx.clone();
        scope.spawn(|| {
            let result = bsgs_zp(&g_inv, h, p, bound).ok().map(|x| (x, true));
            let _ = tx_neg.send(result);
        });
    });
    drop(tx);

    let mut candidate = None;
    while let Ok(msg) = rx.recv() {
        if let Some((x, negated)) = msg {
            candidate = Some(if negated { -x } else { x });
            break;
        }
    }
    let x = candidate.ok_or_else(|| FeError::DlogNotFound {
        context: "signed_bsgs_zp",
        bound: bound.to_string(),
    })?;
    let exp = Integer::from_i64(x);
    let check = g
        .mod_exp(&exp, p)
        .ok_or_else(|| FeError::setup("signed_bsgs_zp", "verification exponentiation failed"))?;
    if check == h.modulo(p) {
        Ok(exp)
    } else {
        Err(FeError::DlogNotFound { context: "signed_bsgs_zp", bound: bound.to_string() })
    }
}

fn gt_bytes(g: &Gt) -> Vec<u8> {
    let mut buf = Vec::new();
    g.serialize_compressed(&mut buf).expect("GT serialization is infallible");
    buf
}

/// Baby-step/giant-step in `GT`: find `0 <= x <= bound` with `h = x.g`
/// (additive notation).
pub fn bsgs_gt(g: &Gt, h: &Gt, bound: i64) -> FeResult<i64> {
    let bound = clamp_bound(bound);
    let max_m = isqrt(bound) + 1;
    let mut table: HashMap<Vec<u8>, i64> = HashMap::new();
    let mut cur = Gt::default();
    let mut filled: i64 = 0;
    let mut m: i64 = 1.min(max_m).max(1);
    loop {
        while filled < m {
            table.insert(gt_bytes(&cur), filled);
            cur = cur + *g;
            filled += 1;
        }
        let giant_factor = scalar_mul_gt(g, &Integer::from_i64(-m));
        let mut probe = *h;
        let steps = bound / m + 2;
        for j in 0..steps {
            if let Some(&i) = table.get(&gt_bytes(&probe)) {
                let candidate = i + j * m;
                if candidate <= bound {
                    return Ok(candidate);
                }
            }
            probe = probe + giant_factor;
        }
        if m >= max_m {
            break;
        }
        m = (m * 2).min(max_m);
    }
    Err(FeError::DlogNotFound { context: "bsgs_gt", bound: bound.to_string() })
}

/// Signed discrete log in `GT`.
pub fn signed_bsgs_gt(g: &Gt, h: &Gt, bound: i64) -> FeResult<Integer> {
    let bound = clamp_bound(bound);
    let g_inv = -*g;

    let (tx, rx) = mpsc::channel::<Option<(i64, bool)>>();
    thread::scope(|scope| {
        let tx_pos = tx.clone();
        scope.spawn(|| {
            let result = bsgs_gt(g, h, bound).ok().map(|x| (x, false));
            let _ = tx_pos.send(result);
        });
        let tx_neg = tx.clone();
        scope.spawn(|| {
            let result = bsgs_gt(&g_inv, h, bound).ok().map(|x| (x, true));
            let _ = tx_neg.send(result);
        });
    });
    drop(tx);

    let mut candidate = None;
    while let Ok(msg) = rx.recv() {
        if let Some((x, negated)) = msg {
            candidate = Some(if negated { -x } else { x });
            break;
        }
    }
    let x = candidate.ok_or_else(|| FeError::DlogNotFound {
        context: "signed_bsgs_gt",
        bound: bound.to_string(),
    })?;
    let check = scalar_mul_gt(g, &Integer::from_i64(x));
    if check == *h {
        Ok(Integer::from_i64(x))
    } else {
        Err(FeError::DlogNotFound { context: "signed_bsgs_gt", bound: bound.to_string() })
    }
}

/// A `GT` baby-step table retained across calls against the same base,
/// so repeated decryptions under one functional key don't rebuild it.
pub struct GtSolver {
    bound: i64,
    m: i64,
    giant_factor: Gt,
    table: HashMap<Vec<u8>, i64>,
}

impl GtSolver {
    /// Build the baby-step table for `base`, capped at `bound`.
    pub fn new(base: &Gt, bound: i64) -> Self {
        let bound = clamp_bound(bound);
        let m = isqrt(bound) + 1;
        let mut table = HashMap::with_capacity(m as usize);
        let mut cur = Gt::default();
        for i in 0..m {
            table.insert(gt_bytes(&cur), i);
            cur = cur + *base;
        }
        let giant_factor = scalar_mul_gt(base, &Integer::from_i64(-m));
        Self { bound, m, giant_factor, table }
    }

    /// Recover `x` with `h = x.base`, reusing this instance's table.
    pub fn solve(&self, h: &Gt) -> FeResult<i64> {
        let mut probe = *h;
        let steps = self.bound / self.m + 2;
        for j in 0..steps {
            if let Some(&i) = self.table.get(&gt_bytes(&probe)) {
                let candidate = i + j * self.m;
                if candidate <= self.bound {
                    return Ok(candidate);
                }
            }
            probe = probe + self.giant_factor;
        }
        Err(FeError::DlogNotFound { context: "GtSolver::solve", bound: self.bound.to_string() })
    }
}

fn gt_solver_cache() -> &'static Mutex<HashMap<(Vec<u8>, i64), GtSolver>> {
    static CACHE: OnceLock<Mutex<HashMap<(Vec<u8>, i64), GtSolver>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Cached variant of [`bsgs_gt`]: the baby-step table for `(base, bound)`
/// is built once per process and reused by every later call.
pub fn bsgs_gt_cached(base: &Gt, h: &Gt, bound: i64) -> FeResult<i64> {
    let bound = clamp_bound(bound);
    let key = (gt_bytes(base), bound);
    let mut cache = gt_solver_cache().lock().expect("dlog cache mutex poisoned");
    let solver = cache.entry(key).or_insert_with(|| GtSolver::new(base, bound));
    solver.solve(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{g1_generator, g2_generator, pair};

    #[test]
    fn bsgs_zp_recovers_small_positive_exponent() {
        let p = Integer::from_i64(1_000_003);
        let g = Integer::from_i64(5);
        let x = 1234i64;
        let h = g.mod_exp(&Integer::from_i64(x), &p).unwrap();
        let recovered = bsgs_zp(&g, &h, &p, 10_000).unwrap();
        assert_eq!(recovered, x);
    }

    #[test]
    fn signed_bsgs_zp_recovers_negative_exponent() {
        let p = Integer::from_i64(1_000_003);
        let g = Integer::from_i64(5);
        let x = -777i64;
        let h = g.mod_exp(&Integer::from_i64(x), &p).unwrap();
        let recovered = signed_bsgs_zp(&g, &h, &p, 10_000).unwrap();
        assert_eq!(recovered, Integer::from_i64(x));
    }

    #[test]
    fn bsgs_gt_recovers_small_exponent() {
        let base = pair(&g1_generator(), &g2_generator());
        let x = 314i64;
        let h = scalar_mul_gt(&base, &Integer::from_i64(x));
        let recovered = bsgs_gt(&base, &h, 10_000).unwrap();
        assert_eq!(recovered, x);
    }

    #[test]
    fn cached_solver_matches_fresh_computation() {
        let base = pair(&g1_generator(), &g2_generator());
        let x = 42i64;
        let h = scalar_mul_gt(&base, &Integer::from_i64(x));
        let fresh = bsgs_gt(&base, &h, 5_000).unwrap();
        let cached = bsgs_gt_cached(&base, &h, 5_000).unwrap();
        assert_eq!(fresh, cached);
    }

    #[test]
    fn signed_bsgs_gt_recovers_negative_exponent() {
        let base = pair(&g1_generator(), &g2_generator());
        let x = -9i64;
        let h = scalar_mul_gt(&base, &Integer::from_i64(x));
        let recovered = signed_bsgs_gt(&base, &h, 1_000).unwrap();
        assert_eq!(recovered, Integer::from_i64(x));
    }
}
