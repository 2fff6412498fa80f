//! Matrix types shared by extractors, the builder and the model backends.
//!
//! `FeatureMatrix` wraps either an `ndarray` dense array or an `sprs` CSR
//! matrix so that n-gram blocks can stay sparse while small statistic
//! blocks stay dense.
pub mod matrix;

pub use matrix::{hstack, FeatureMatrix};
