//! Component A: arbitrary-precision signed-integer facade.
//!
//! Everything upstream (`linalg`, `group`, `dlog`, every scheme) speaks
//! in terms of [`Integer`] rather than `num_bigint::BigInt` directly, so
//! the signed-exponent `mod_exp` convention from spec §4.A
//! (`ModExp(g, x, m) = ((g^{-x})^{-1} mod m)` when `x < 0`) lives in
//! exactly one place.

use num_bigint::{BigInt, RandBigInt, Sign};
use num_integer::Integer as _;
use num_prime::{PrimalityTestConfig, RandPrime};
use num_traits::{One, Signed, ToPrimitive, Zero};
use rand::RngCore;

/// Arbitrary-precision signed integer, value-semantic throughout.
///
/// A thin newtype over `num_bigint::BigInt`. We do not re-export
/// `BigInt` itself so that the handful of conventions this crate needs
/// (canonical-representative reduction, signed `ModExp`) stay in one
/// place and can't be bypassed by reaching for the underlying type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Integer(pub(crate) BigInt);

impl Integer {
    /// The integer zero.
    pub fn zero() -> Self {
        Integer(BigInt::zero())
    }

    /// The integer one.
    pub fn one() -> Self {
        Integer(BigInt::one())
    }

    /// Wrap a plain `i64`.
    pub fn from_i64(v: i64) -> Self {
        Integer(BigInt::from(v))
    }

    /// Wrap a plain `u64`.
    pub fn from_u64(v: u64) -> Self {
        Integer(BigInt::from(v))
    }

    /// Big-endian byte reconstruction of a non-negative integer,
    /// matching Go's `new(big.Int).SetBytes`.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Integer(BigInt::from_bytes_be(Sign::Plus, bytes))
    }

    /// Big-endian bytes of `|self|`, matching Go's `big.Int.Bytes()`.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be().1
    }

    /// `self.is_zero()`.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Sign: `-1`, `0`, or `1`.
    pub fn sign(&self) -> i32 {
        if self.0.is_negative() {
            -1
        } else if self.0.is_zero() {
            0
        } else {
            1
        }
    }

    /// Number of bits needed to represent `|self|` (0 for zero).
    pub fn bit_len(&self) -> u64 {
        self.0.magnitude().bits()
    }

    /// `self mod m`, reduced to the canonical representative `[0, m)`.
    pub fn modulo(&self, m: &Integer) -> Integer {
        Integer(self.0.mod_floor(&m.0))
    }

    /// Modular exponentiation allowing a signed exponent:
    /// `x >= 0 => g^x mod m`; `x < 0 => ((g^{-x}) mod m)^{-1} mod m`.
    ///
    /// All later code in this crate (dlog, every scheme's `Setup`) relies
    /// on this exact behavior per spec §4.A.
    pub fn mod_exp(&self, exp: &Integer, m: &Integer) -> Option<Integer> {
        if exp.sign() >= 0 {
            Some(Integer(self.0.modpow(&exp.0, &m.0)))
        } else {
            let pos = Integer(-&exp.0);
            let base_pow = Integer(self.0.modpow(&pos.0, &m.0));
            base_pow.mod_inverse(m)
        }
    }

    /// Modular inverse, or `None` if `self` is not invertible mod `m`.
    pub fn mod_inverse(&self, m: &Integer) -> Option<Integer> {
        let (g, x, _) = extended_gcd(&self.0.mod_floor(&m.0), &m.0);
        if g != BigInt::one() && g != -BigInt::one() {
            return None;
        }
        Some(Integer(x.mod_floor(&m.0)))
    }

    /// Miller-Rabin probable-primality test with the given number of
    /// independent random witnesses (spec's `ProbablyPrime`).
    pub fn probably_prime(&self, rounds: usize) -> bool {
        if self.0.sign() != Sign::Plus {
            return false;
        }
        miller_rabin(&self.0, rounds.max(1))
    }

    /// Jacobi symbol `(self / m)` for odd positive `m`, used by safe
    /// prime / generator search in `numtheory`.
    pub fn jacobi(&self, m: &Integer) -> i32 {
        jacobi_symbol(&self.0, &m.0)
    }

    /// Uniform integer in `[0, max)`.
    pub fn sample_uniform(max: &Integer, rng: &mut dyn RngCore) -> Integer {
        let mut shim = RngShim(rng);
        Integer(shim.gen_bigint_range(&BigInt::zero(), &max.0))
    }

    /// Uniform integer in `[min, max)`.
    pub fn sample_range(min: &Integer, max: &Integer, rng: &mut dyn RngCore) -> Integer {
        let mut shim = RngShim(rng);
        Integer(shim.gen_bigint_range(&min.0, &max.0))
    }

    /// A uniformly random prime with exactly `bits` bits.
    pub fn random_prime(bits: u64, rng: &mut dyn RngCore) -> Integer {
        let mut shim = RngShim(rng);
        let config = PrimalityTestConfig::default();
        let big: num_bigint::BigUint = shim.gen_prime(bits as usize, Some(config));
        Integer(BigInt::from_biguint(Sign::Plus, big))
    }

    /// `-self`.
    pub fn neg(&self) -> Integer {
        Integer(-&self.0)
    }

    /// `self + rhs`.
    pub fn add(&self, rhs: &Integer) -> Integer {
        Integer(&self.0 + &rhs.0)
    }

    /// `self - rhs`.
    pub fn sub(&self, rhs: &Integer) -> Integer {
        Integer(&self.0 - &rhs.0)
    }

    /// `self * rhs`.
    pub fn mul(&self, rhs: &Integer) -> Integer {
        Integer(&self.0 * &rhs.0)
    }

    /// Truncating integer division (`self / rhs`).
    pub fn div(&self, rhs: &Integer) -> Integer {
        Integer(&self.0 / &rhs.0)
    }

    /// Floor-mod remainder against an arbitrary-sign divisor.
    pub fn rem_floor(&self, rhs: &Integer) -> Integer {
        Integer(self.0.mod_floor(&rhs.0))
    }

    /// Absolute value.
    pub fn abs(&self) -> Integer {
        Integer(self.0.abs())
    }

    /// Comparison helper for bound checks: `|self| < bound`.
    pub fn lt_abs(&self, bound: &Integer) -> bool {
        self.0.abs() < bound.0.abs()
    }

    /// Centers a canonical representative `self in [0, m)` into the
    /// signed range `(-m/2, m/2]`.
    pub fn center(&self, m: &Integer) -> Integer {
        let half = &m.0 >> 1u32;
        if self.0 > half {
            Integer(&self.0 - &m.0)
        } else {
            self.clone()
        }
    }

    /// `self.to_string()` equivalent used by error messages.
    pub fn to_decimal_string(&self) -> String {
        self.0.to_string()
    }

    /// Attempt a lossless conversion to `i64` (used only for small,
    /// public-parameter-sized values, never for secrets).
    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }
}

impl std::fmt::Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Integer {
    fn from(v: i64) -> Self {
        Integer::from_i64(v)
    }
}

impl From<u64> for Integer {
    fn from(v: u64) -> Self {
        Integer::from_u64(v)
    }
}

/// Thin adapter so `dyn RngCore` satisfies `rand::Rng` for the
/// `num-bigint` `rand` feature's extension traits.
struct RngShim<'a>(&'a mut dyn RngCore);

impl<'a> RngCore for RngShim<'a> {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}

/// Extended Euclid: returns `(g, x, y)` with `a*x + b*y = g = gcd(a, b)`.
fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if b.is_zero() {
        return (a.clone(), BigInt::one(), BigInt::zero());
    }
    let (q, r) = a.div_rem(b);
    let (g, x1, y1) = extended_gcd(b, &r);
    (g, y1.clone(), x1 - q * y1)
}

/// Jacobi symbol `(a / n)` for odd positive `n`.
fn jacobi_symbol(a: &BigInt, n: &BigInt) -> i32 {
    let two = BigInt::from(2);
    let eight = BigInt::from(8);
    let four = BigInt::from(4);
    let mut a = a.mod_floor(n);
    let mut n = n.clone();
    let mut result = 1i32;
    while !a.is_zero() {
        while a.is_even() {
            a = &a / &two;
            let r = n.mod_floor(&eight).to_i64().unwrap_or(0);
            if r == 3 || r == 5 {
                result = -result;
            }
        }
        std::mem::swap(&mut a, &mut n);
        if a.mod_floor(&four) == BigInt::from(3) && n.mod_floor(&four) == BigInt::from(3) {
            result = -result;
        }
        a = a.mod_floor(&n);
    }
    if n == BigInt::one() {
        result
    } else {
        0
    }
}

/// Deterministic-witness-count Miller-Rabin over `num-bigint`.
fn miller_rabin(n: &BigInt, rounds: usize) -> bool {
    let zero = BigInt::zero();
    let one = BigInt::one();
    let two = BigInt::from(2);
    let three = BigInt::from(3);
    if *n < two {
        return false;
    }
    if *n == two || *n == three {
        return true;
    }
    if n.is_even() {
        return false;
    }
    // n - 1 = d * 2^r, d odd.
    let n_minus_one = n - &one;
    let mut d = n_minus_one.clone();
    let mut r = 0u64;
    while d.is_even() {
        d = &d / &two;
        r += 1;
    }
    let mut rng = rand::thread_rng();
    'witness: for _ in 0..rounds {
        let a = rng.gen_bigint_range(&two, &(n - &two));
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 0..r.saturating_sub(1) {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    let _ = zero;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_exp_negative_exponent_matches_inverse_of_positive() {
        let g = Integer::from_i64(4);
        let m = Integer::from_i64(7);
        let pos = g.mod_exp(&Integer::from_i64(3), &m).unwrap();
        let neg = g.mod_exp(&Integer::from_i64(-3), &m).unwrap();
        let back = pos.mul(&neg).modulo(&m);
        assert_eq!(back, Integer::from_i64(1));
    }

    #[test]
    fn mod_inverse_round_trips() {
        let a = Integer::from_i64(17);
        let m = Integer::from_i64(3120);
        let inv = a.mod_inverse(&m).unwrap();
        assert_eq!(a.mul(&inv).modulo(&m), Integer::from_i64(1));
    }

    #[test]
    fn probably_prime_small_values() {
        assert!(Integer::from_i64(7919).probably_prime(20));
        assert!(!Integer::from_i64(7920).probably_prime(20));
    }

    #[test]
    fn center_wraps_upper_half_negative() {
        let m = Integer::from_i64(11);
        assert_eq!(Integer::from_i64(7).center(&m), Integer::from_i64(-4));
        assert_eq!(Integer::from_i64(5).center(&m), Integer::from_i64(5));
    }
}
