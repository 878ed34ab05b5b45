//! Error taxonomy shared by every component and scheme.
//!
//! One root enum, `FeError`, covers the eight kinds the specification
//! fixes as stable across schemes. Each variant carries enough context
//! (scheme name, step, shapes) to make a failing call self-explanatory
//! without a backtrace. No operation in this crate returns a partial
//! result: a call either succeeds completely or returns exactly one of
//! these.

use thiserror::Error;

/// Stable error kinds surfaced by every public operation in this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeError {
    /// Operand shapes were incompatible (vector/matrix dimensions, or a
    /// scheme's declared `l`/`k`/`m` not matching an input's length).
    #[error("{context}: dimension mismatch (expected {expected}, got {got})")]
    DimensionMismatch {
        /// Scheme/step that detected the mismatch.
        context: &'static str,
        /// Human-readable expected shape.
        expected: String,
        /// Human-readable observed shape.
        got: String,
    },

    /// A vector/matrix entry violated a declared bound (`CheckBound`).
    #[error("{context}: entry {value} violates bound {bound}")]
    BoundViolation {
        /// Scheme/step that detected the violation.
        context: &'static str,
        /// The bound that was violated (as a decimal string).
        bound: String,
        /// The offending value (as a decimal string).
        value: String,
    },

    /// A matrix inverse was requested but the determinant vanished
    /// modulo the operative prime.
    #[error("{context}: matrix is not invertible modulo {modulus}")]
    NotInvertible {
        /// Scheme/step that requested the inverse.
        context: &'static str,
        /// The modulus the determinant vanished under.
        modulus: String,
    },

    /// Gaussian elimination detected an infeasible system.
    #[error("{context}: no solution to the linear system")]
    NoSolution {
        /// Scheme/step that ran the solver.
        context: &'static str,
    },

    /// RNG read failed, or a parameter-generation search (prime, safe
    /// prime, generator) exhausted its attempt budget.
    #[error("{context}: sampler failure ({detail})")]
    SamplerFailure {
        /// Scheme/step that was sampling.
        context: &'static str,
        /// What was being sampled / why it failed.
        detail: String,
    },

    /// A scheme's `Setup` preconditions were violated, or a
    /// parameter-search loop (LWE/Ring-LWE) did not converge.
    #[error("{context}: setup failed ({detail})")]
    SetupError {
        /// Scheme whose setup failed.
        context: &'static str,
        /// Which precondition failed / why the search didn't converge.
        detail: String,
    },

    /// Baby-step/giant-step exhausted its bound without finding the
    /// discrete log.
    #[error("{context}: discrete log not found within bound {bound}")]
    DlogNotFound {
        /// Scheme/step that ran the solver.
        context: &'static str,
        /// The bound the search was confined to.
        bound: String,
    },

    /// The final decrypted value fell outside the range the scheme's
    /// decoding step expects.
    #[error("{context}: decoded value out of expected range")]
    Decoding {
        /// Scheme/step that decoded the value.
        context: &'static str,
    },
}

impl FeError {
    /// Build a `DimensionMismatch` from two `Display`-able shapes.
    pub fn dim_mismatch(
        context: &'static str,
        expected: impl std::fmt::Display,
        got: impl std::fmt::Display,
    ) -> Self {
        FeError::DimensionMismatch {
            context,
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Build a `BoundViolation` from a bound and offending value.
    pub fn bound_violation(
        context: &'static str,
        bound: impl std::fmt::Display,
        value: impl std::fmt::Display,
    ) -> Self {
        FeError::BoundViolation {
            context,
            bound: bound.to_string(),
            value: value.to_string(),
        }
    }

    /// Build a `SetupError` with a free-form detail string.
    pub fn setup(context: &'static str, detail: impl Into<String>) -> Self {
        FeError::SetupError { context, detail: detail.into() }
    }

    /// Build a `SamplerFailure` with a free-form detail string.
    pub fn sampler(context: &'static str, detail: impl Into<String>) -> Self {
        FeError::SamplerFailure { context, detail: detail.into() }
    }
}

/// Convenience alias used throughout the crate's public API.
pub type FeResult<T> = Result<T, FeError>;
