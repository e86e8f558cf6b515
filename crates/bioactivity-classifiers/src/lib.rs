//! bioactivity-classifiers: train, evaluate and apply binary bioactivity classifiers.
//!
//! The crate fits a shared feature standardizer, trains one model per
//! classifier family (random forest, gradient boosting, logistic regression,
//! SVM) either by cross-validated grid search or with fixed parameters,
//! evaluates each model on a held-out split and scores external compound
//! sets. Table I/O and the HTML report are thin layers on top of the core.
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod registry;
pub mod report;
pub mod scoring;
pub mod search;

pub use config::{ModelFamily, PipelineConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineRun};
