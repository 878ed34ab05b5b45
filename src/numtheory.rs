//! Component F: number-theory helpers feeding every scheme's `Setup`.
//!
//! Safe-prime generation and generator search, factored out of the
//! individual schemes since Simple-DDH/Damgård/Paillier/DMCFE all need
//! the same "find a prime `p = 2q + 1` with `q` also prime, then find a
//! generator of the order-`q` subgroup" shape.

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};
use rand::RngCore;

/// Number of Miller-Rabin rounds used for every primality check in this
/// module; matches the witness count the corpus uses for RSA/Paillier
/// key generation.
const MR_ROUNDS: usize = 20;

/// A safe prime `p = 2q + 1` with both `p` and `q` prime.
pub struct SafePrime {
    /// The safe prime itself.
    pub p: Integer,
    /// The Sophie Germain prime `q = (p - 1) / 2`.
    pub q: Integer,
}

/// Generate a random safe prime with `bits` bits, retrying until both
/// `p` and `q = (p-1)/2` pass `ProbablyPrime`.
pub fn generate_safe_prime(bits: u64, rng: &mut dyn RngCore) -> FeResult<SafePrime> {
    let two = Integer::from_i64(2);
    let one = Integer::one();
    const MAX_ATTEMPTS: usize = 10_000;
    for _ in 0..MAX_ATTEMPTS {
        let q = Integer::random_prime(bits - 1, rng);
        let p = q.mul(&two).add(&one);
        if p.probably_prime(MR_ROUNDS) {
            return Ok(SafePrime { p, q });
        }
    }
    Err(FeError::sampler("generate_safe_prime", "exhausted attempt budget"))
}

/// Find a generator of the order-`q` subgroup of `Z_p^*`, for `p = 2q+1`
/// safe-prime groups (the Simple-DDH / Damgård / DMCFE parameter shape):
/// draw random `h in [2, p-1)`, set `g = h^2 mod p`, accept unless `g`
/// is the identity.
pub fn find_subgroup_generator(p: &Integer, rng: &mut dyn RngCore) -> FeResult<Integer> {
    let two = Integer::from_i64(2);
    let p_minus_one = p.sub(&Integer::one());
    const MAX_ATTEMPTS: usize = 10_000;
    for _ in 0..MAX_ATTEMPTS {
        let h = Integer::sample_range(&two, &p_minus_one, rng);
        let g = h.mod_exp(&two, p).expect("h is nonzero mod a prime p, hence invertible");
        if !g.is_zero() && g != Integer::one() {
            return Ok(g);
        }
    }
    Err(FeError::sampler("find_subgroup_generator", "exhausted attempt budget"))
}

/// Find a generator of the full multiplicative group `Z_p^*` (order
/// `p-1 = 2q`), for safe-prime schemes whose key derivation reduces
/// exponents modulo `p-1` (Simple-DDH, Damgard): draw random
/// `h in [2, p-1)` and accept unless `h^2 = 1` or `h^q = 1` mod `p`,
/// the standard safe-prime primitive-root test.
pub fn find_full_order_generator(p: &Integer, q: &Integer, rng: &mut dyn RngCore) -> FeResult<Integer> {
    let two = Integer::from_i64(2);
    let one = Integer::one();
    let p_minus_one = p.sub(&one);
    const MAX_ATTEMPTS: usize = 10_000;
    for _ in 0..MAX_ATTEMPTS {
        let h = Integer::sample_range(&two, &p_minus_one, rng);
        let sq = h.mod_exp(&two, p).expect("h nonzero mod prime p");
        if sq == one {
            continue;
        }
        let pq = h.mod_exp(q, p).expect("h nonzero mod prime p");
        if pq == one {
            continue;
        }
        return Ok(h);
    }
    Err(FeError::sampler("find_full_order_generator", "exhausted attempt budget"))
}

/// Paillier-style modulus generation: two distinct safe primes `p`, `q`
/// with `n = p*q`, `lambda = lcm(p-1, q-1)`, generator `g = n + 1`
/// (the standard simplified Paillier generator, valid whenever
/// `gcd(n, (p-1)(q-1)) = 1`).
pub struct PaillierModulus {
    /// The modulus `n = p q`.
    pub n: Integer,
    /// `n^2`, the ciphertext-space modulus.
    pub n_squared: Integer,
    /// The fixed generator `n + 1`.
    pub g: Integer,
    /// `lcm(p-1, q-1)`.
    pub lambda: Integer,
    /// `L(g^lambda mod n^2)^{-1} mod n`.
    pub mu: Integer,
}

fn gcd(a: &Integer, b: &Integer) -> Integer {
    let mut a = a.clone();
    let mut b = b.clone();
    while !b.is_zero() {
        let r = a.rem_floor(&b);
        a = b;
        b = r;
    }
    a.abs()
}

fn lcm(a: &Integer, b: &Integer) -> Integer {
    let g = gcd(a, b);
    a.div(&g).mul(b).abs()
}

/// Paillier's `L(x) = (x - 1) / n`.
fn l_function(x: &Integer, n: &Integer) -> Integer {
    x.sub(&Integer::one()).div(n)
}

/// Generate a fresh Paillier modulus with `bits`-bit safe primes.
pub fn generate_paillier_modulus(bits: u64, rng: &mut dyn RngCore) -> FeResult<PaillierModulus> {
    let one = Integer::one();
    let sp1 = generate_safe_prime(bits, rng)?;
    let mut sp2 = generate_safe_prime(bits, rng)?;
    while sp2.p == sp1.p {
        sp2 = generate_safe_prime(bits, rng)?;
    }
    let n = sp1.p.mul(&sp2.p);
    let n_squared = n.mul(&n);
    let p_minus_1 = sp1.p.sub(&one);
    let q_minus_1 = sp2.p.sub(&one);
    let phi_n = p_minus_1.mul(&q_minus_1);
    if gcd(&n, &phi_n) != one {
        return Err(FeError::setup(
            "generate_paillier_modulus",
            "gcd(n, phi(n)) != 1, retry Setup",
        ));
    }
    let lambda = lcm(&p_minus_1, &q_minus_1);
    let g = n.add(&one);
    let g_lambda = one.add(&lambda.mul(&n)).modulo(&n_squared);
    let l_g_lambda = l_function(&g_lambda, &n);
    let mu = l_g_lambda
        .mod_inverse(&n)
        .ok_or_else(|| FeError::setup("generate_paillier_modulus", "L(g^lambda) not invertible mod n"))?;
    Ok(PaillierModulus { n, n_squared, g, lambda, mu })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn generate_safe_prime_produces_safe_prime() {
        let mut rng = thread_rng();
        let sp = generate_safe_prime(32, &mut rng).unwrap();
        assert!(sp.p.probably_prime(20));
        assert!(sp.q.probably_prime(20));
        let reconstructed = sp.q.mul(&Integer::from_i64(2)).add(&Integer::one());
        assert_eq!(reconstructed, sp.p);
    }

    #[test]
    fn subgroup_generator_has_correct_order() {
        let mut rng = thread_rng();
        let sp = generate_safe_prime(32, &mut rng).unwrap();
        let g = find_subgroup_generator(&sp.p, &mut rng).unwrap();
        let order_q = g.mod_exp(&sp.q, &sp.p).unwrap();
        assert_eq!(order_q, Integer::one());
    }

    #[test]
    fn full_order_generator_has_order_p_minus_one() {
        let mut rng = thread_rng();
        let sp = generate_safe_prime(32, &mut rng).unwrap();
        let g = find_full_order_generator(&sp.p, &sp.q, &mut rng).unwrap();
        assert_ne!(g.mod_exp(&Integer::from_i64(2), &sp.p).unwrap(), Integer::one());
        assert_ne!(g.mod_exp(&sp.q, &sp.p).unwrap(), Integer::one());
    }

    #[test]
    fn paillier_modulus_round_trips_one_message() {
        let mut rng = thread_rng();
        let modulus = generate_paillier_modulus(24, &mut rng).unwrap();
        let m = Integer::from_i64(7).modulo(&modulus.n);
        let r = Integer::from_i64(12345).modulo(&modulus.n);
        let c = modulus
            .g
            .mod_exp(&m, &modulus.n_squared)
            .unwrap()
            .mul(&r.mod_exp(&modulus.n, &modulus.n_squared).unwrap())
            .modulo(&modulus.n_squared);
        let decrypted = l_function(
            &c.mod_exp(&modulus.lambda, &modulus.n_squared).unwrap(),
            &modulus.n,
        )
        .mul(&modulus.mu)
        .modulo(&modulus.n);
        assert_eq!(decrypted, m);
    }
}
