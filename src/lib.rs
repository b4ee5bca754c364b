//! Bioactivity prediction against the RET V804M kinase mutation from SMILES.
//!
//! The crate hands SMILES to RDKit for the full battery of [descriptors],
//! aligns them into a [table::FeatureTable] with the columns a trained
//! [model::Model] expects, and exports the predictions as CSV.

pub mod descriptors;
pub mod export;
pub mod input;
pub mod matrix;
pub mod model;
pub mod pipeline;
pub mod table;

mod error;

pub use error::Error;
pub use model::{Model, ModelArtifact};
pub use pipeline::{predict, Batch, Prediction};
