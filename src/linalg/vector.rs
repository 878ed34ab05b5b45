//! `IntegerVector`: ordered finite sequence of [`Integer`], dimension
//! preserved by every operation (`DimensionMismatch` otherwise).

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};

/// Ordered finite sequence of arbitrary-precision integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegerVector {
    data: Vec<Integer>,
}

impl IntegerVector {
    /// Build from an owned `Vec`.
    pub fn from_vec(data: Vec<Integer>) -> Self {
        Self { data }
    }

    /// The all-zero vector of length `n`.
    pub fn zero(n: usize) -> Self {
        Self { data: vec![Integer::zero(); n] }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the vector has no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the entries.
    pub fn as_slice(&self) -> &[Integer] {
        &self.data
    }

    /// Entry at `i`.
    pub fn get(&self, i: usize) -> &Integer {
        &self.data[i]
    }

    fn check_same_len(&self, other: &IntegerVector, context: &'static str) -> FeResult<()> {
        if self.len() != other.len() {
            return Err(FeError::dim_mismatch(context, self.len(), other.len()));
        }
        Ok(())
    }

    /// Element-wise addition.
    pub fn add(&self, other: &IntegerVector) -> FeResult<IntegerVector> {
        self.check_same_len(other, "IntegerVector::add")?;
        Ok(IntegerVector::from_vec(
            self.data.iter().zip(&other.data).map(|(a, b)| a.add(b)).collect(),
        ))
    }

    /// Element-wise subtraction.
    pub fn sub(&self, other: &IntegerVector) -> FeResult<IntegerVector> {
        self.check_same_len(other, "IntegerVector::sub")?;
        Ok(IntegerVector::from_vec(
            self.data.iter().zip(&other.data).map(|(a, b)| a.sub(b)).collect(),
        ))
    }

    /// Scalar multiplication.
    pub fn mul_scalar(&self, k: &Integer) -> IntegerVector {
        IntegerVector::from_vec(self.data.iter().map(|a| a.mul(k)).collect())
    }

    /// Element-wise reduction modulo `m`.
    pub fn modulo(&self, m: &Integer) -> IntegerVector {
        IntegerVector::from_vec(self.data.iter().map(|a| a.modulo(m)).collect())
    }

    /// Element-wise map.
    pub fn apply(&self, f: impl Fn(&Integer) -> Integer) -> IntegerVector {
        IntegerVector::from_vec(self.data.iter().map(f).collect())
    }

    /// Dot product `<self, other>`.
    pub fn dot(&self, other: &IntegerVector) -> FeResult<Integer> {
        self.check_same_len(other, "IntegerVector::dot")?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .fold(Integer::zero(), |acc, (a, b)| acc.add(&a.mul(b))))
    }

    /// Tensor (outer-flattened) product `self ⊗ other`, length
    /// `self.len() * other.len()`, row-major in `self`'s index.
    pub fn tensor(&self, other: &IntegerVector) -> IntegerVector {
        let mut out = Vec::with_capacity(self.len() * other.len());
        for a in &self.data {
            for b in &other.data {
                out.push(a.mul(b));
            }
        }
        IntegerVector::from_vec(out)
    }

    /// Concatenation `self || other`.
    pub fn concat(&self, other: &IntegerVector) -> IntegerVector {
        let mut out = self.data.clone();
        out.extend(other.data.iter().cloned());
        IntegerVector::from_vec(out)
    }

    /// Check every entry satisfies `|v_i| < b`.
    pub fn check_bound(&self, b: &Integer) -> FeResult<()> {
        for v in &self.data {
            if !v.lt_abs(b) {
                return Err(FeError::bound_violation("IntegerVector::check_bound", b, v));
            }
        }
        Ok(())
    }

    /// Negacyclic convolution in `R = Z[X]/(X^n+1)`: for length-`n`
    /// vectors interpreted as polynomial coefficients, `c_i =
    /// sum_{j<=i} a_{i-j} b_j - sum_{j>i} a_{n+i-j} b_j`.
    pub fn mul_as_poly_in_ring(&self, other: &IntegerVector) -> FeResult<IntegerVector> {
        self.check_same_len(other, "IntegerVector::mul_as_poly_in_ring")?;
        let n = self.len();
        let mut out = vec![Integer::zero(); n];
        for i in 0..n {
            let mut acc = Integer::zero();
            for j in 0..=i {
                acc = acc.add(&self.data[i - j].mul(&other.data[j]));
            }
            for j in (i + 1)..n {
                acc = acc.sub(&self.data[n + i - j].mul(&other.data[j]));
            }
            out[i] = acc;
        }
        Ok(IntegerVector::from_vec(out))
    }
}

impl IntoIterator for IntegerVector {
    type Item = Integer;
    type IntoIter = std::vec::IntoIter<Integer>;
    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(xs: &[i64]) -> IntegerVector {
        IntegerVector::from_vec(xs.iter().map(|x| Integer::from_i64(*x)).collect())
    }

    #[test]
    fn dot_product() {
        assert_eq!(v(&[1, 2, 3]).dot(&v(&[4, 5, 6])).unwrap(), Integer::from_i64(32));
    }

    #[test]
    fn dimension_mismatch_on_add() {
        assert!(v(&[1, 2]).add(&v(&[1, 2, 3])).is_err());
    }

    #[test]
    fn s2_ring_product() {
        // a = [0,1,2], b = [2,1,0] in Z[X]/(X^3+1); expected [-2, 2, 5].
        let a = v(&[0, 1, 2]);
        let b = v(&[2, 1, 0]);
        let c = a.mul_as_poly_in_ring(&b).unwrap();
        assert_eq!(c, v(&[-2, 2, 5]));
    }

    #[test]
    fn check_bound_rejects_out_of_range() {
        let bound = Integer::from_i64(10);
        assert!(v(&[1, 2, 3]).check_bound(&bound).is_ok());
        assert!(v(&[1, 20, 3]).check_bound(&bound).is_err());
    }
}
