//! Component D: group vectors/matrices lifted into `G1`/`G2`/`GT`.
//!
//! The pairing is instantiated concretely as `ark_bn254::Bn254`
//! (`e: G1 x G2 -> GT`). Every coordinate-wise lift handles signed
//! scalars per the convention fixed here once: for `k < 0`, scalar
//! multiplication is computed as `(-k)-(-P)` so a negative exponent
//! never needs a signed-exponent group representation.

use crate::bigint::Integer;
use crate::error::{FeError, FeResult};
use crate::linalg::{IntegerMatrix, IntegerVector};
use ark_bn254::{Bn254, Fr, G1Projective};
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, PrimeField};

pub use ark_bn254::{G1Affine, G2Affine};

/// `GT`, the target group of the BN254 pairing.
pub type Gt = PairingOutput<Bn254>;

/// The scalar field order `ord` fixed by the spec as a "compile-time
/// constant of the library (the order of the chosen curve, ~256 bits)":
/// `ark_bn254::Fr::MODULUS`. Every scheme that works with exponents
/// "mod ord" (FHIPE's `B`/`B*`, DMCFE's Diffie-Hellman-style setup,
/// SGP/Quad's blinding matrices) reduces against this value.
pub fn group_order() -> Integer {
    let modulus_bits = Fr::MODULUS.to_bytes_be();
    Integer::from_bytes_be(&modulus_bits)
}

/// `e(g1, g2)`, the fixed generator of `GT` induced by the curve's own
/// generators. Several schemes (FHIPE, FH-Multi-IPE, DMCFE, SGP, Quad)
/// phrase their decryption target as a discrete log relative to a
/// scalar multiple of this element.
pub fn gt_generator() -> Gt {
    pair(&g1_generator(), &g2_generator())
}

/// `Σ_i e(a_i, b_i)`, the pairing-based inner product of two equal-length
/// group vectors. This is the core "collapse a lifted vector pair to one
/// `GT` element" step every pairing-based scheme's `Decrypt` performs.
pub fn pairing_inner_product(a: &G1Vector, b: &G2Vector) -> FeResult<Gt> {
    if a.len() != b.len() {
        return Err(FeError::dim_mismatch("pairing_inner_product", a.len(), b.len()));
    }
    let mut acc = Gt::default();
    for i in 0..a.len() {
        acc = acc + pair(a.get(i), b.get(i));
    }
    Ok(acc)
}

fn fr_from_integer(k: &Integer) -> (Fr, bool) {
    let negative = k.sign() < 0;
    let mag = if negative { k.neg() } else { k.clone() };
    let bytes = mag.to_bytes_be();
    (Fr::from_be_bytes_mod_order(&bytes), negative)
}

/// Scalar-multiply a `G1` point by a signed [`Integer`]: `k < 0` negates
/// the point and flips the sign of the exponent before multiplying.
pub fn scalar_mul_g1(p: &G1Affine, k: &Integer) -> G1Affine {
    let (fr, negative) = fr_from_integer(k);
    let base = if negative { -p.into_group() } else { p.into_group() };
    (base * fr).into_affine()
}

/// Scalar-multiply a `G2` point by a signed [`Integer`].
pub fn scalar_mul_g2(p: &G2Affine, k: &Integer) -> G2Affine {
    let (fr, negative) = fr_from_integer(k);
    let base = if negative { -p.into_group() } else { p.into_group() };
    (base * fr).into_affine()
}

/// Scalar-multiply a `GT` element by a signed [`Integer`].
pub fn scalar_mul_gt(p: &Gt, k: &Integer) -> Gt {
    let (fr, negative) = fr_from_integer(k);
    let base = if negative { -*p } else { *p };
    let bits = fr.into_bigint().to_bits_be();
    let mut acc = Gt::default();
    for bit in bits {
        acc = acc + acc;
        if bit {
            acc = acc + base;
        }
    }
    acc
}

/// Evaluate the BN254 pairing `e(p, q)`.
pub fn pair(p: &G1Affine, q: &G2Affine) -> Gt {
    Bn254::pairing(*p, *q)
}

/// Fixed canonical generator of `G1`.
pub fn g1_generator() -> G1Affine {
    G1Affine::generator()
}

/// Fixed canonical generator of `G2`.
pub fn g2_generator() -> G2Affine {
    G2Affine::generator()
}

/// Coordinate-wise vector of `G1` elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G1Vector(Vec<G1Affine>);

/// Coordinate-wise vector of `G2` elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G2Vector(Vec<G2Affine>);

/// Coordinate-wise vector of `GT` elements.
#[derive(Clone, Debug, PartialEq)]
pub struct GtVector(Vec<Gt>);

macro_rules! group_vector_impl {
    ($name:ident, $elem:ty, $mul:path, $add:expr, $neg:expr) => {
        impl $name {
            /// Build from an owned `Vec`.
            pub fn from_vec(data: Vec<$elem>) -> Self {
                Self(data)
            }

            /// Number of entries.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Whether the vector has no entries.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Borrow the entries.
            pub fn as_slice(&self) -> &[$elem] {
                &self.0
            }

            /// Entry at `i`.
            pub fn get(&self, i: usize) -> &$elem {
                &self.0[i]
            }

            /// Coordinate-wise group sum, element `i` is `self[i] + other[i]`.
            pub fn add(&self, other: &$name) -> FeResult<$name> {
                if self.len() != other.len() {
                    return Err(FeError::dim_mismatch("GroupVector::add", self.len(), other.len()));
                }
                Ok($name(self.0.iter().zip(&other.0).map(|(a, b)| $add(a, b)).collect()))
            }

            /// Negate every entry.
            pub fn neg(&self) -> $name {
                $name(self.0.iter().map($neg).collect())
            }

            /// Sum of all entries (the additive reduction used by
            /// `Decrypt` steps that collapse a GroupVector to one element).
            pub fn sum(&self) -> $elem {
                self.0.iter().skip(1).fold(self.0[0], |acc, p| $add(&acc, p))
            }

            /// Coordinate-wise scalar multiplication by an [`IntegerVector`].
            pub fn mul_int_vec(&self, scalars: &IntegerVector) -> FeResult<$name> {
                if self.len() != scalars.len() {
                    return Err(FeError::dim_mismatch(
                        "GroupVector::mul_int_vec",
                        self.len(),
                        scalars.len(),
                    ));
                }
                Ok($name(
                    self.0.iter().zip(scalars.as_slice()).map(|(p, k)| $mul(p, k)).collect(),
                ))
            }

            /// Inner product `<self, scalars>` collapsed into a single
            /// group element: `sum_i scalars[i] . self[i]`.
            pub fn dot_int_vec(&self, scalars: &IntegerVector) -> FeResult<$elem> {
                Ok(self.mul_int_vec(scalars)?.sum())
            }
        }
    };
}

group_vector_impl!(
    G1Vector,
    G1Affine,
    scalar_mul_g1,
    |a: &G1Affine, b: &G1Affine| (a.into_group() + b.into_group()).into_affine(),
    |a: &G1Affine| (-a.into_group()).into_affine()
);
group_vector_impl!(
    G2Vector,
    G2Affine,
    scalar_mul_g2,
    |a: &G2Affine, b: &G2Affine| (a.into_group() + b.into_group()).into_affine(),
    |a: &G2Affine| (-a.into_group()).into_affine()
);
group_vector_impl!(
    GtVector,
    Gt,
    scalar_mul_gt,
    |a: &Gt, b: &Gt| *a + *b,
    |a: &Gt| -*a
);

/// Lift every coordinate of an [`IntegerVector`] into `G1` via the
/// fixed generator: `MulG1`.
pub fn lift_g1(scalars: &IntegerVector) -> G1Vector {
    let gen = g1_generator();
    G1Vector::from_vec(scalars.as_slice().iter().map(|k| scalar_mul_g1(&gen, k)).collect())
}

/// Lift every coordinate of an [`IntegerVector`] into `G2` via the
/// fixed generator: `MulG2`.
pub fn lift_g2(scalars: &IntegerVector) -> G2Vector {
    let gen = g2_generator();
    G2Vector::from_vec(scalars.as_slice().iter().map(|k| scalar_mul_g2(&gen, k)).collect())
}

/// Row-major matrix of `G1` elements, coordinate-wise lifted from an
/// [`IntegerMatrix`] via `MulG1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G1Matrix {
    rows: usize,
    cols: usize,
    data: Vec<G1Affine>,
}

/// Row-major matrix of `G2` elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G2Matrix {
    rows: usize,
    cols: usize,
    data: Vec<G2Affine>,
}

macro_rules! group_matrix_impl {
    ($name:ident, $elem:ty, $mul:path, $add:expr) => {
        impl $name {
            /// Lift `m` into the group via the fixed generator (`MulG1`/
            /// `MulG2`).
            pub fn lift(m: &IntegerMatrix, generator: $elem) -> Self {
                let data = (0..m.rows())
                    .flat_map(|i| (0..m.cols()).map(move |j| (i, j)))
                    .map(|(i, j)| $mul(&generator, m.at(i, j)))
                    .collect();
                Self { rows: m.rows(), cols: m.cols(), data }
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
            pub fn at(&self, i: usize, j: usize) -> &$elem {
                &self.data[i * self.cols + j]
            }

            /// `self * v`: a GroupMatrix times an IntegerVector yields a
            /// GroupVector, one entry per row.
            pub fn mul_int_vec(&self, v: &IntegerVector) -> FeResult<Vec<$elem>> {
                if self.cols != v.len() {
                    return Err(FeError::dim_mismatch(
                        concat!(stringify!($name), "::mul_int_vec"),
                        self.cols,
                        v.len(),
                    ));
                }
                let mut out = Vec::with_capacity(self.rows);
                for i in 0..self.rows {
                    let mut acc = $mul(self.at(i, 0), v.get(0));
                    for j in 1..self.cols {
                        let term = $mul(self.at(i, j), v.get(j));
                        acc = $add(&acc, &term);
                    }
                    out.push(acc);
                }
                Ok(out)
            }
        }
    };
}

group_matrix_impl!(
    G1Matrix,
    G1Affine,
    scalar_mul_g1,
    |a: &G1Affine, b: &G1Affine| (a.into_group() + b.into_group()).into_affine()
);
group_matrix_impl!(
    G2Matrix,
    G2Affine,
    scalar_mul_g2,
    |a: &G2Affine, b: &G2Affine| (a.into_group() + b.into_group()).into_affine()
);

/// `IntegerMatrix x GroupVector -> GroupVector`: row `i`'s output is
/// `sum_j A[i][j] . v[j]`, used by decentralized-IPE key derivation
/// where scalar coefficients multiply group-valued shares.
pub fn int_matrix_mul_g1_vector(a: &IntegerMatrix, v: &G1Vector) -> FeResult<G1Vector> {
    if a.cols() != v.len() {
        return Err(FeError::dim_mismatch("int_matrix_mul_g1_vector", a.cols(), v.len()));
    }
    let mut out = Vec::with_capacity(a.rows());
    for i in 0..a.rows() {
        let mut acc: Option<G1Projective> = None;
        for j in 0..a.cols() {
            let term = scalar_mul_g1(v.get(j), a.at(i, j)).into_group();
            acc = Some(match acc {
                Some(prev) => prev + term,
                None => term,
            });
        }
        out.push(acc.unwrap_or(G1Projective::from(G1Affine::identity())).into_affine());
    }
    Ok(G1Vector::from_vec(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_scalar_matches_negated_point() {
        let g = g1_generator();
        let k = Integer::from_i64(-5);
        let lhs = scalar_mul_g1(&g, &k);
        let rhs = scalar_mul_g1(&(-g.into_group()).into_affine(), &Integer::from_i64(5));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn pairing_bilinear_in_first_argument() {
        let g1 = g1_generator();
        let g2 = g2_generator();
        let a = Integer::from_i64(3);
        let b = Integer::from_i64(4);
        let lhs = pair(&scalar_mul_g1(&g1, &a), &g2);
        let combined = scalar_mul_gt(&pair(&g1, &g2), &a);
        assert_eq!(lhs, combined);
        let _ = b;
    }

    #[test]
    fn lift_g1_matches_manual_generator_multiplication() {
        let v = IntegerVector::from_vec(vec![Integer::from_i64(2), Integer::from_i64(-3)]);
        let lifted = lift_g1(&v);
        let gen = g1_generator();
        assert_eq!(*lifted.get(0), scalar_mul_g1(&gen, &Integer::from_i64(2)));
        assert_eq!(*lifted.get(1), scalar_mul_g1(&gen, &Integer::from_i64(-3)));
    }

    #[test]
    fn g1_vector_dot_matches_pairing_inner_product() {
        let x = IntegerVector::from_vec(vec![Integer::from_i64(1), Integer::from_i64(2)]);
        let y = IntegerVector::from_vec(vec![Integer::from_i64(3), Integer::from_i64(4)]);
        let gx = lift_g1(&x);
        let gy = lift_g2(&y);
        let mut acc = Gt::default();
        for i in 0..2 {
            acc = acc + pair(gx.get(i), gy.get(i));
        }
        let expected = scalar_mul_gt(&pair(&g1_generator(), &g2_generator()), &x.dot(&y).unwrap());
        assert_eq!(acc, expected);
    }
}
