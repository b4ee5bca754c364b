use log::{debug, warn};
use rayon::prelude::*;

use crate::{
    descriptors::{self, DescriptorError},
    matrix::Matrix,
    Error,
};

/// An input row that could not be turned into descriptors.
#[derive(Clone, Debug, PartialEq)]
pub struct Skipped {
    /// zero-based position in the submitted list
    pub row: usize,
    pub smiles: String,
    pub reason: DescriptorError,
}

/// Descriptor values for every valid molecule of a request, one row per
/// molecule in submission order, with the SMILES kept alongside.
#[derive(Clone, Debug)]
pub struct FeatureTable {
    smiles: Vec<String>,
    columns: Vec<String>,
    matrix: Matrix<f64>,
}

impl FeatureTable {
    /// compute the full descriptor battery for each entry of `smiles`.
    /// entries that fail to parse are left out of the table and returned
    /// separately. a failure of the engine itself fails the whole build
    pub fn build(smiles: &[String]) -> Result<(Self, Vec<Skipped>), Error> {
        let columns = descriptors::names()?;
        let results: Vec<_> = smiles
            .par_iter()
            .map(|s| descriptors::calculate(s))
            .collect();

        let mut kept = Vec::with_capacity(smiles.len());
        let mut rows = Vec::with_capacity(smiles.len());
        let mut skipped = Vec::new();
        for (row, (s, res)) in smiles.iter().zip(results).enumerate() {
            match res {
                Ok(d) => {
                    kept.push(s.clone());
                    rows.push(d.into_values());
                }
                Err(e @ DescriptorError::Engine(_)) => return Err(e.into()),
                Err(e) => {
                    warn!("failed to parse SMILES {s:?} on row {row}: {e}");
                    skipped.push(Skipped {
                        row,
                        smiles: s.clone(),
                        reason: e,
                    });
                }
            }
        }
        debug!("built {} descriptor rows, skipped {}", rows.len(), skipped.len());
        let table = Self {
            smiles: kept,
            columns: columns.to_vec(),
            matrix: Matrix::from_rows(rows),
        };
        Ok((table, skipped))
    }

    /// a table with exactly the columns in `features`, in that order
    pub fn align(&self, features: &[String]) -> Result<Self, Error> {
        let idx = features
            .iter()
            .map(|f| {
                self.columns
                    .iter()
                    .position(|c| c == f)
                    .ok_or_else(|| Error::MissingFeature(f.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            smiles: self.smiles.clone(),
            columns: features.to_vec(),
            matrix: self.matrix.select_columns(&idx),
        })
    }

    pub fn smiles(&self) -> &[String] {
        &self.smiles
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn matrix(&self) -> &Matrix<f64> {
        &self.matrix
    }

    pub fn row(&self, i: usize) -> &[f64] {
        self.matrix.row(i)
    }

    pub fn len(&self) -> usize {
        self.smiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smiles.is_empty()
    }
}
