//! cbdt-features: feature composition and model evaluation for clickbait detection.
//!
//! Raw dataset fields go through fit-then-transform extractors
//! ([`features`]); a [`builder::FeatureBuilder`] binds extractors to fields
//! and concatenates their blocks into one design matrix, dense or sparse.
//! The [`harness::ModelHarness`] trains a backend chosen from an injectable
//! [`models::ModelRegistry`] on that matrix, evaluates it on a seeded
//! train/test split and predicts. Fitted builders and trained models are
//! persisted as named artifacts through [`persist::ArtifactStore`].
pub mod builder;
pub mod config;
pub mod data_handling;
pub mod dataset;
pub mod error;
pub mod features;
pub mod harness;
pub mod io;
pub mod math;
pub mod models;
pub mod persist;
pub mod report;
pub mod stats;

pub use builder::FeatureBuilder;
pub use dataset::{Dataset, FieldValue, InMemoryDataset};
pub use error::{CbdtError, Result};
pub use harness::{Backend, ModelHarness};
pub use math::FeatureMatrix;
