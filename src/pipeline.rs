use log::{info, trace};

use crate::{
    model::Model,
    table::{FeatureTable, Skipped},
    Error,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub smiles: String,
    pub value: f64,
}

/// The outcome of one prediction request.
#[derive(Clone, Debug)]
pub struct Batch {
    pub predictions: Vec<Prediction>,
    pub skipped: Vec<Skipped>,
}

/// featurize `smiles`, align the descriptors to what `model` expects, and
/// predict each valid molecule. invalid SMILES are reported in
/// [Batch::skipped], but if none are valid the whole request fails
pub fn predict<M: Model + ?Sized>(
    model: &M,
    smiles: &[String],
) -> Result<Batch, Error> {
    info!("predicting {} SMILES", smiles.len());
    let (table, skipped) = FeatureTable::build(smiles)?;
    if table.is_empty() {
        return Err(Error::NoValidMolecules);
    }
    let aligned = table.align(model.features())?;
    trace!("aligned features {:?}:\n{}", aligned.columns(), aligned.matrix());
    let values = model.predict_table(&aligned);
    let predictions = aligned
        .smiles()
        .iter()
        .zip(values)
        .map(|(s, value)| Prediction {
            smiles: s.clone(),
            value,
        })
        .collect();
    Ok(Batch {
        predictions,
        skipped,
    })
}
