//! `IntegerMatrix`: row-major dense integer matrix with an explicit
//! `(rows, cols)` header. Inversion and Gaussian elimination work on an
//! in-place scratch copy rather than allocating nested structures.

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};
use crate::linalg::vector::IntegerVector;

/// Row-major dense matrix of arbitrary-precision integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegerMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Integer>,
}

impl IntegerMatrix {
    /// Build from a row-major flat buffer.
    pub fn from_flat(rows: usize, cols: usize, data: Vec<Integer>) -> Self {
        assert_eq!(data.len(), rows * cols, "row-major buffer length mismatch");
        Self { rows, cols, data }
    }

    /// Build from a list of equal-length rows.
    pub fn from_rows(rows: Vec<IntegerVector>) -> Self {
        let r = rows.len();
        let c = rows.first().map(|row| row.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(r * c);
        for row in &rows {
            assert_eq!(row.len(), c, "IntegerMatrix::from_rows requires equal-length rows");
            data.extend(row.as_slice().iter().cloned());
        }
        Self { rows: r, cols: c, data }
    }

    /// All-zero `rows x cols` matrix.
    pub fn zero(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![Integer::zero(); rows * cols] }
    }

    /// `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zero(n, n);
        for i in 0..n {
            *m.at_mut(i, i) = Integer::one();
        }
        m
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Entry at `(i, j)`.
    pub fn at(&self, i: usize, j: usize) -> &Integer {
        &self.data[i * self.cols + j]
    }

    fn at_mut(&mut self, i: usize, j: usize) -> &mut Integer {
        &mut self.data[i * self.cols + j]
    }

    /// Borrow row `i` as a vector (clones entries into a fresh `IntegerVector`).
    pub fn row(&self, i: usize) -> IntegerVector {
        IntegerVector::from_vec(self.data[i * self.cols..(i + 1) * self.cols].to_vec())
    }

    /// Extract column `j`.
    pub fn column(&self, j: usize) -> IntegerVector {
        IntegerVector::from_vec((0..self.rows).map(|i| self.at(i, j).clone()).collect())
    }

    fn check_same_shape(&self, other: &IntegerMatrix, context: &'static str) -> FeResult<()> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(FeError::dim_mismatch(
                context,
                format!("{}x{}", self.rows, self.cols),
                format!("{}x{}", other.rows, other.cols),
            ));
        }
        Ok(())
    }

    /// Element-wise addition.
    pub fn add(&self, other: &IntegerMatrix) -> FeResult<IntegerMatrix> {
        self.check_same_shape(other, "IntegerMatrix::add")?;
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a.add(b)).collect();
        Ok(IntegerMatrix { rows: self.rows, cols: self.cols, data })
    }

    /// Element-wise subtraction.
    pub fn sub(&self, other: &IntegerMatrix) -> FeResult<IntegerMatrix> {
        self.check_same_shape(other, "IntegerMatrix::sub")?;
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a.sub(b)).collect();
        Ok(IntegerMatrix { rows: self.rows, cols: self.cols, data })
    }

    /// Scalar multiplication.
    pub fn mul_scalar(&self, k: &Integer) -> IntegerMatrix {
        IntegerMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|a| a.mul(k)).collect(),
        }
    }

    /// Element-wise reduction modulo `m`.
    pub fn modulo(&self, m: &Integer) -> IntegerMatrix {
        IntegerMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|a| a.modulo(m)).collect(),
        }
    }

    /// Element-wise map.
    pub fn apply(&self, f: impl Fn(&Integer) -> Integer) -> IntegerMatrix {
        IntegerMatrix { rows: self.rows, cols: self.cols, data: self.data.iter().map(f).collect() }
    }

    /// Check every entry satisfies `|v_i| < b`.
    pub fn check_bound(&self, b: &Integer) -> FeResult<()> {
        for v in &self.data {
            if !v.lt_abs(b) {
                return Err(FeError::bound_violation("IntegerMatrix::check_bound", b, v));
            }
        }
        Ok(())
    }

    /// Transpose.
    pub fn transpose(&self) -> IntegerMatrix {
        let mut out = IntegerMatrix::zero(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                *out.at_mut(j, i) = self.at(i, j).clone();
            }
        }
        out
    }

    /// Remove row `ri` and column `cj`, producing the `(n-1) x (m-1)` minor.
    pub fn minor(&self, ri: usize, cj: usize) -> IntegerMatrix {
        let mut data = Vec::with_capacity((self.rows - 1) * (self.cols - 1));
        for i in 0..self.rows {
            if i == ri {
                continue;
            }
            for j in 0..self.cols {
                if j == cj {
                    continue;
                }
                data.push(self.at(i, j).clone());
            }
        }
        IntegerMatrix { rows: self.rows - 1, cols: self.cols - 1, data }
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, v: &IntegerVector) -> FeResult<IntegerVector> {
        if self.cols != v.len() {
            return Err(FeError::dim_mismatch("IntegerMatrix::mul_vec", self.cols, v.len()));
        }
        let mut out = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            out.push(self.row(i).dot(v).expect("row length matches by construction"));
        }
        Ok(IntegerVector::from_vec(out))
    }

    /// Matrix-matrix product.
    pub fn mul_mat(&self, other: &IntegerMatrix) -> FeResult<IntegerMatrix> {
        if self.cols != other.rows {
            return Err(FeError::dim_mismatch("IntegerMatrix::mul_mat", self.cols, other.rows));
        }
        let mut out = IntegerMatrix::zero(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut acc = Integer::zero();
                for k in 0..self.cols {
                    acc = acc.add(&self.at(i, k).mul(other.at(k, j)));
                }
                *out.at_mut(i, j) = acc;
            }
        }
        Ok(out)
    }

    /// Tensor product of two matrices (Kronecker product).
    pub fn tensor(&self, other: &IntegerMatrix) -> IntegerMatrix {
        let rows = self.rows * other.rows;
        let cols = self.cols * other.cols;
        let mut out = IntegerMatrix::zero(rows, cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                let a = self.at(i, j);
                for p in 0..other.rows {
                    for q in 0..other.cols {
                        let oi = i * other.rows + p;
                        let oj = j * other.cols + q;
                        *out.at_mut(oi, oj) = a.mul(other.at(p, q));
                    }
                }
            }
        }
        out
    }

    /// Row-wise dot product: `sum_i <row_i(self), row_i(other)>`. Both
    /// matrices must have equal row counts and equal column counts.
    pub fn row_wise_dot(&self, other: &IntegerMatrix) -> FeResult<Integer> {
        self.check_same_shape(other, "IntegerMatrix::row_wise_dot")?;
        let mut acc = Integer::zero();
        for i in 0..self.rows {
            acc = acc.add(&self.row(i).dot(&other.row(i))?);
        }
        Ok(acc)
    }

    /// Recursive cofactor-expansion determinant modulo `m`.
    pub fn determinant(&self, m: &Integer) -> FeResult<Integer> {
        if self.rows != self.cols {
            return Err(FeError::dim_mismatch("IntegerMatrix::determinant", self.rows, self.cols));
        }
        Ok(self.det_recursive(m))
    }

    fn det_recursive(&self, m: &Integer) -> Integer {
        let n = self.rows;
        if n == 1 {
            return self.at(0, 0).modulo(m);
        }
        if n == 2 {
            let a = self.at(0, 0).mul(self.at(1, 1));
            let b = self.at(0, 1).mul(self.at(1, 0));
            return a.sub(&b).modulo(m);
        }
        let mut acc = Integer::zero();
        for j in 0..n {
            let cofactor_sign = if j % 2 == 0 { Integer::one() } else { Integer::from_i64(-1) };
            let term = self.at(0, j).mul(&cofactor_sign).mul(&self.minor(0, j).det_recursive(m));
            acc = acc.add(&term);
        }
        acc.modulo(m)
    }

    /// Adjugate-based modular inverse: `A^{-1} = det(A)^{-1} * adj(A) mod m`.
    /// Fails with `NotInvertible` when `det(A) = 0 mod m`.
    pub fn inverse_mod(&self, m: &Integer) -> FeResult<IntegerMatrix> {
        if self.rows != self.cols {
            return Err(FeError::dim_mismatch("IntegerMatrix::inverse_mod", self.rows, self.cols));
        }
        let n = self.rows;
        let det = self.det_recursive(m);
        let det_inv = det.mod_inverse(m).ok_or_else(|| FeError::NotInvertible {
            context: "IntegerMatrix::inverse_mod",
            modulus: m.to_decimal_string(),
        })?;
        let mut adj = IntegerMatrix::zero(n, n);
        for i in 0..n {
            for j in 0..n {
                let sign = if (i + j) % 2 == 0 { Integer::one() } else { Integer::from_i64(-1) };
                let cof = sign.mul(&self.minor(i, j).det_recursive(m));
                // Adjugate is the transpose of the cofactor matrix.
                *adj.at_mut(j, i) = cof;
            }
        }
        Ok(adj.mul_scalar(&det_inv).modulo(m))
    }

    /// Gaussian elimination to upper-triangular form over `Z_m`, with
    /// partial pivoting (first nonzero row below the current one becomes
    /// the pivot). Returns the triangular form.
    pub fn gaussian_elimination(&self, m: &Integer) -> FeResult<IntegerMatrix> {
        let mut work = self.clone();
        gaussian_eliminate_in_place(&mut work, m)?;
        Ok(work)
    }

    /// `(A^{-1}, det(A))` via Gaussian elimination on the augmented
    /// `[A | I]` matrix, back-substituted column by column. The
    /// determinant is the product of pivots modulo `m`.
    pub fn inverse_mod_gauss(&self, m: &Integer) -> FeResult<(IntegerMatrix, Integer)> {
        if self.rows != self.cols {
            return Err(FeError::dim_mismatch(
                "IntegerMatrix::inverse_mod_gauss",
                self.rows,
                self.cols,
            ));
        }
        let n = self.rows;
        let mut aug = IntegerMatrix::zero(n, 2 * n);
        for i in 0..n {
            for j in 0..n {
                *aug.at_mut(i, j) = self.at(i, j).modulo(m);
            }
            *aug.at_mut(i, n + i) = Integer::one();
        }
        let det = gaussian_eliminate_in_place(&mut aug, m)?;
        // Normalize each pivot row to 1, then eliminate upward.
        for i in 0..n {
            let pivot = aug.at(i, i).clone();
            let pivot_inv = pivot.mod_inverse(m).ok_or_else(|| FeError::NotInvertible {
                context: "IntegerMatrix::inverse_mod_gauss",
                modulus: m.to_decimal_string(),
            })?;
            for j in 0..2 * n {
                let v = aug.at(i, j).mul(&pivot_inv).modulo(m);
                *aug.at_mut(i, j) = v;
            }
            for r in 0..n {
                if r == i {
                    continue;
                }
                let factor = aug.at(r, i).clone();
                if factor.is_zero() {
                    continue;
                }
                for c in 0..2 * n {
                    let sub = factor.mul(aug.at(i, c)).modulo(m);
                    let v = aug.at(r, c).sub(&sub).modulo(m);
                    *aug.at_mut(r, c) = v;
                }
            }
        }
        let mut inv = IntegerMatrix::zero(n, n);
        for i in 0..n {
            for j in 0..n {
                *inv.at_mut(i, j) = aug.at(i, n + j).clone();
            }
        }
        Ok((inv, det))
    }

    /// Solve `A x = v (mod m)` via Gaussian elimination on `[A | v]`.
    /// Detects `NoSolution` when a contradictory row remains after
    /// elimination.
    pub fn gaussian_elimination_solver(
        a: &IntegerMatrix,
        v: &IntegerVector,
        m: &Integer,
    ) -> FeResult<IntegerVector> {
        if a.rows != v.len() {
            return Err(FeError::dim_mismatch(
                "IntegerMatrix::gaussian_elimination_solver",
                a.rows,
                v.len(),
            ));
        }
        let n = a.rows;
        let cols = a.cols;
        let mut aug = IntegerMatrix::zero(n, cols + 1);
        for i in 0..n {
            for j in 0..cols {
                *aug.at_mut(i, j) = a.at(i, j).modulo(m);
            }
            *aug.at_mut(i, cols) = v.get(i).modulo(m);
        }
        gaussian_eliminate_in_place(&mut aug, m)?;
        // Contradiction: an all-zero coefficient row with a nonzero RHS.
        for i in 0..n {
            let coeffs_zero = (0..cols).all(|j| aug.at(i, j).is_zero());
            if coeffs_zero && !aug.at(i, cols).is_zero() {
                return Err(FeError::NoSolution {
                    context: "IntegerMatrix::gaussian_elimination_solver",
                });
            }
        }
        // Back-substitute assuming a square, full-rank coefficient block.
        if cols != n {
            return Err(FeError::dim_mismatch(
                "IntegerMatrix::gaussian_elimination_solver",
                n,
                cols,
            ));
        }
        let mut x = vec![Integer::zero(); n];
        for i in (0..n).rev() {
            let mut rhs = aug.at(i, cols).clone();
            for j in (i + 1)..n {
                rhs = rhs.sub(&aug.at(i, j).mul(&x[j]));
            }
            let pivot = aug.at(i, i).clone();
            let pivot_inv = pivot.mod_inverse(m).ok_or_else(|| FeError::NotInvertible {
                context: "IntegerMatrix::gaussian_elimination_solver",
                modulus: m.to_decimal_string(),
            })?;
            x[i] = rhs.mul(&pivot_inv).modulo(m);
        }
        Ok(IntegerVector::from_vec(x))
    }
}

/// In-place forward elimination with partial pivoting; returns the
/// product of pivots modulo `m` (the determinant when the matrix is
/// square, meaningless-but-harmless otherwise).
fn gaussian_eliminate_in_place(work: &mut IntegerMatrix, m: &Integer) -> FeResult<Integer> {
    let rows = work.rows;
    let cols = work.cols;
    let mut det = Integer::one();
    let mut pivot_row = 0usize;
    for col in 0..cols.min(rows) {
        if pivot_row >= rows {
            break;
        }
        // Find the first nonzero entry at/below pivot_row in this column.
        let mut found = None;
        for r in pivot_row..rows {
            if !work.at(r, col).modulo(m).is_zero() {
                found = Some(r);
                break;
            }
        }
        let Some(r) = found else { continue };
        if r != pivot_row {
            for c in 0..cols {
                let tmp = work.at(pivot_row, c).clone();
                *work.at_mut(pivot_row, c) = work.at(r, c).clone();
                *work.at_mut(r, c) = tmp;
            }
            det = det.neg();
        }
        let pivot = work.at(pivot_row, col).modulo(m);
        det = det.mul(&pivot).modulo(m);
        let pivot_inv = pivot.mod_inverse(m);
        if let Some(pivot_inv) = pivot_inv {
            for r in (pivot_row + 1)..rows {
                let factor = work.at(r, col).mul(&pivot_inv).modulo(m);
                if factor.is_zero() {
                    continue;
                }
                for c in col..cols {
                    let sub = factor.mul(work.at(pivot_row, c)).modulo(m);
                    let v = work.at(r, c).sub(&sub).modulo(m);
                    *work.at_mut(r, c) = v;
                }
            }
        }
        pivot_row += 1;
    }
    Ok(det)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[i64]]) -> IntegerMatrix {
        IntegerMatrix::from_rows(
            rows.iter()
                .map(|r| IntegerVector::from_vec(r.iter().map(|x| Integer::from_i64(*x)).collect()))
                .collect(),
        )
    }

    #[test]
    fn s1_integer_matrix_inverse() {
        let a = m(&[&[1, 2], &[3, 4]]);
        let p = Integer::from_i64(7);
        let det = a.determinant(&p).unwrap();
        assert_eq!(det, Integer::from_i64(5));
        let inv = a.inverse_mod(&p).unwrap();
        let expected = m(&[&[5, 1], &[5, 3]]);
        assert_eq!(inv, expected);
    }

    #[test]
    fn gaussian_elimination_determinant_matches_cofactor() {
        let a = m(&[&[2, 1, 1], &[1, 3, 2], &[1, 0, 0]]);
        let p = Integer::from_i64(101);
        let cof_det = a.determinant(&p).unwrap();
        let mut work = a.clone();
        let gauss_det = gaussian_eliminate_in_place(&mut work, &p).unwrap();
        assert_eq!(cof_det, gauss_det);
    }

    #[test]
    fn inverse_mod_gauss_matches_adjugate() {
        let a = m(&[&[1, 2], &[3, 4]]);
        let p = Integer::from_i64(7);
        let adj_inv = a.inverse_mod(&p).unwrap();
        let (gauss_inv, _det) = a.inverse_mod_gauss(&p).unwrap();
        assert_eq!(adj_inv, gauss_inv);
    }

    #[test]
    fn solver_recovers_consistent_system() {
        let a = m(&[&[1, 2], &[3, 4]]);
        let p = Integer::from_i64(101);
        let x_expected = IntegerVector::from_vec(vec![Integer::from_i64(5), Integer::from_i64(9)]);
        let v = a.mul_vec(&x_expected).unwrap().modulo(&p);
        let x = IntegerMatrix::gaussian_elimination_solver(&a, &v, &p).unwrap();
        assert_eq!(x, x_expected.modulo(&p));
    }

    #[test]
    fn not_invertible_detected() {
        let a = m(&[&[1, 2], &[2, 4]]);
        let p = Integer::from_i64(7);
        assert!(a.inverse_mod(&p).is_err());
    }
}
